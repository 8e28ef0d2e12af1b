//! Bring-on action - puts a bench player straight into an empty position

use tracing::info;

use super::{notify, LineupError};
use crate::common::GameEventId;
use crate::domains::commit::{BringOnRequest, CommitKind, CommitSummary};
use crate::kernel::LineupDeps;

/// Single request, never queued. On failure nothing is retried or kept.
pub async fn bring_on(deps: &LineupDeps, request: &BringOnRequest) -> Result<GameEventId, LineupError> {
    let event_id = deps
        .store
        .commit_bring_on(request)
        .await
        .map_err(|source| LineupError::BringOnFailed {
            player: request.player.clone(),
            source,
        })?;

    info!(
        aggregate = %request.aggregate,
        player = %request.player,
        position = ?request.position,
        event_id = %event_id,
        "player brought on"
    );
    notify(
        deps,
        request.aggregate,
        CommitSummary::single(CommitKind::BringOn, request.at.clone(), event_id),
    )
    .await;

    Ok(event_id)
}
