//! Confirm action - commits the pending queue

use tracing::{info, warn};

use super::{notify, LineupError};
use crate::common::{AggregateRef, GameEventId};
use crate::domains::commit::{BatchReceipt, CommitKind, CommitSummary};
use crate::domains::game_events::GameTime;
use crate::domains::lineup::compiler::compile;
use crate::domains::lineup::models::PendingOperation;
use crate::kernel::LineupDeps;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmReceipt {
    pub batch: Option<BatchReceipt>,
    pub removal_event_ids: Vec<GameEventId>,
}

/// Commit `queue` at `at`, draining it as requests succeed.
///
/// The batch of substitutions and swaps is all-or-nothing: on failure the
/// queue is left exactly as it was. Removals follow one at a time; the first
/// failure stops the rest and leaves that removal and every later one queued.
/// Removals already sent are not undone.
pub async fn confirm_batch(
    deps: &LineupDeps,
    aggregate: AggregateRef,
    at: &GameTime,
    queue: &mut Vec<PendingOperation>,
) -> Result<ConfirmReceipt, LineupError> {
    let mut receipt = ConfirmReceipt::default();
    if queue.is_empty() {
        return Ok(receipt);
    }

    let compiled = compile(aggregate, at, queue)?;

    if !compiled.batch.is_empty() {
        let batch = deps
            .store
            .commit_batch(&compiled.batch)
            .await
            .map_err(|e| {
                warn!(aggregate = %aggregate, error = %e, queued = queue.len(), "lineup batch rejected");
                LineupError::CommitFailed(e)
            })?;

        queue.retain(PendingOperation::is_removal);
        info!(
            aggregate = %aggregate,
            at = %at,
            substitutions = batch.substitution_event_ids.len(),
            swaps = batch.swap_event_ids.len(),
            "lineup batch confirmed"
        );
        notify(deps, aggregate, CommitSummary::batch(at.clone(), &batch)).await;
        receipt.batch = Some(batch);
    }

    // queue now holds exactly the removals, in the order they were compiled
    for removal in compiled.removals {
        let player = match queue.first() {
            Some(PendingOperation::Removal { out, .. }) => out.player.clone(),
            _ => break,
        };

        match deps.store.commit_removal(&removal).await {
            Ok(event_id) => {
                queue.remove(0);
                info!(aggregate = %aggregate, player = %player, event_id = %event_id, "removal confirmed");
                notify(
                    deps,
                    aggregate,
                    CommitSummary::single(CommitKind::Removal, removal.at.clone(), event_id),
                )
                .await;
                receipt.removal_event_ids.push(event_id);
            }
            Err(source) => {
                warn!(
                    aggregate = %aggregate,
                    player = %player,
                    error = %source,
                    still_queued = queue.len(),
                    "removal failed, stopping"
                );
                return Err(LineupError::RemovalFailed { player, source });
            }
        }
    }

    Ok(receipt)
}
