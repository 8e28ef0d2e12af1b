//! Lineup domain actions
//!
//! The only lineup operations that cross the I/O boundary. Each sends one or
//! more requests through the event store and then tells the notifier.
//! Notifier failures are logged and never change the outcome.

mod bring_on;
mod confirm;

pub use bring_on::bring_on;
pub use confirm::{confirm_batch, ConfirmReceipt};

use thiserror::Error;
use tracing::warn;

use super::compiler::CompileError;
use crate::common::{AggregateRef, PlayerRef};
use crate::domains::commit::CommitSummary;
use crate::kernel::LineupDeps;

#[derive(Error, Debug)]
pub enum LineupError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error("Lineup commit failed: {0}")]
    CommitFailed(#[source] anyhow::Error),

    #[error("Removing {player} failed: {source}")]
    RemovalFailed {
        player: PlayerRef,
        #[source]
        source: anyhow::Error,
    },

    #[error("Bringing on {player} failed: {source}")]
    BringOnFailed {
        player: PlayerRef,
        #[source]
        source: anyhow::Error,
    },
}

async fn notify(deps: &LineupDeps, aggregate: AggregateRef, summary: CommitSummary) {
    if let Err(e) = deps.notifier.lineup_committed(aggregate, &summary).await {
        warn!(aggregate = %aggregate, kind = ?summary.kind, error = %e, "lineup notification failed");
    }
}
