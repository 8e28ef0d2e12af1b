use serde::Serialize;
use std::collections::HashSet;

use crate::common::PlayerRef;
use crate::domains::game_events::GameTime;
use crate::domains::timeline::RosterPlayer;

/// A lineup change waiting in the client-side queue.
///
/// Never persisted. Field players are held as [`RosterPlayer`] so the
/// presence they were selected under travels with the operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingOperation {
    Substitution {
        out: RosterPlayer,
        incoming: PlayerRef,
        queued_at: GameTime,
    },
    PositionSwap {
        first: RosterPlayer,
        second: RosterPlayer,
        queued_at: GameTime,
    },
    Removal {
        out: RosterPlayer,
        queued_at: GameTime,
    },
}

impl PendingOperation {
    pub fn players(&self) -> Vec<&PlayerRef> {
        match self {
            Self::Substitution { out, incoming, .. } => vec![&out.player, incoming],
            Self::PositionSwap { first, second, .. } => vec![&first.player, &second.player],
            Self::Removal { out, .. } => vec![&out.player],
        }
    }

    pub fn involves(&self, player: &PlayerRef) -> bool {
        self.players().into_iter().any(|p| p == player)
    }

    pub fn queued_at(&self) -> &GameTime {
        match self {
            Self::Substitution { queued_at, .. }
            | Self::PositionSwap { queued_at, .. }
            | Self::Removal { queued_at, .. } => queued_at,
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self, Self::Removal { .. })
    }
}

/// Every player referenced by the queue. A player may sit in at most one
/// pending operation, so this is what selection filters against.
pub fn engaged_players(queue: &[PendingOperation]) -> HashSet<PlayerRef> {
    queue
        .iter()
        .flat_map(|op| op.players().into_iter().cloned())
        .collect()
}
