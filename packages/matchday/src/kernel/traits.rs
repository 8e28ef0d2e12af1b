// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no lineup logic.
// Planning, compiling and reconstruction are domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseGameEventStore, BaseCommitNotifier)

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::{AggregateRef, GameEventId, PlayerRef};
use crate::domains::commit::{
    BatchReceipt, BringOnRequest, CommitBatchRequest, CommitSummary, RemovalRequest,
};
use crate::domains::game_events::{GameEvent, NewGameEvent};

// =============================================================================
// Event Store Trait (Infrastructure - append-only match log)
// =============================================================================

#[async_trait]
pub trait BaseGameEventStore: Send + Sync {
    /// All events of one aggregate in insertion order
    async fn fetch_events(&self, aggregate: AggregateRef) -> Result<Vec<GameEvent>>;

    /// Apply substitutions then swaps atomically; nothing is written on error
    async fn commit_batch(&self, request: &CommitBatchRequest) -> Result<BatchReceipt>;

    async fn commit_removal(&self, request: &RemovalRequest) -> Result<GameEventId>;

    async fn commit_bring_on(&self, request: &BringOnRequest) -> Result<GameEventId>;

    /// Append pre-built events (starting lineups, period and status markers)
    async fn append(&self, events: &[NewGameEvent]) -> Result<()>;
}

// =============================================================================
// Roster Directory Trait (Infrastructure - player identity)
// =============================================================================

/// A player available to a team for one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadMember {
    pub player: PlayerRef,
    pub display_name: String,
    pub shirt_number: Option<i32>,
}

#[async_trait]
pub trait BaseRosterDirectory: Send + Sync {
    /// Everyone eligible to play for this team in this match
    async fn squad(&self, aggregate: AggregateRef) -> Result<Vec<SquadMember>>;

    async fn display_name(&self, player: &PlayerRef) -> Result<String>;
}

// =============================================================================
// Commit Notifier Trait (Infrastructure - fan-out to other devices)
// =============================================================================

#[async_trait]
pub trait BaseCommitNotifier: Send + Sync {
    /// Called after every successful commit. Failures are never fatal to the caller.
    async fn lineup_committed(&self, aggregate: AggregateRef, summary: &CommitSummary)
        -> Result<()>;
}
