use serde::Serialize;

use crate::common::{GameEventId, PlayerRef};
use crate::domains::game_events::{GameTime, Signal, SignalKind};

/// What keeps a player on the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Presence {
    /// The committed event that put this player on the field. Replacements
    /// and removals address "this instance" of presence through it.
    Established(GameEventId),
    /// Projected incoming substitute whose substitution is still queued.
    Pending,
}

impl Presence {
    pub fn event_id(&self) -> Option<GameEventId> {
        match self {
            Self::Established(id) => Some(*id),
            Self::Pending => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterPlayer {
    pub player: PlayerRef,
    pub presence: Presence,
    pub position: Option<String>,
    pub since: GameTime,
}

impl RosterPlayer {
    pub fn is_same_player(&self, other: &RosterPlayer) -> bool {
        self.player == other.player
    }
}

/// On-field players as of `cursor`, in order of arrival.
pub fn roster_from_signals(signals: &[Signal], cursor: u64) -> Vec<RosterPlayer> {
    let mut ordered: Vec<&Signal> = signals.iter().filter(|s| s.absolute <= cursor).collect();
    ordered.sort_by_key(|s| (s.absolute, s.sequence));

    let mut roster: Vec<RosterPlayer> = Vec::new();

    for signal in ordered {
        match &signal.kind {
            SignalKind::Enter => {
                if roster.iter().any(|r| r.player == signal.player) {
                    continue;
                }
                roster.push(RosterPlayer {
                    player: signal.player.clone(),
                    presence: Presence::Established(signal.event_id),
                    position: signal.position.clone(),
                    since: signal.at.clone(),
                });
            }
            SignalKind::Exit => {
                roster.retain(|r| r.player != signal.player);
            }
            SignalKind::Swap { other } => {
                let first = roster.iter().position(|r| r.player == signal.player);
                let second = roster.iter().position(|r| &r.player == other);
                if let (Some(first), Some(second)) = (first, second) {
                    let moved = roster[first].position.take();
                    roster[first].position = roster[second].position.take();
                    roster[second].position = moved;
                }
            }
        }
    }

    roster
}
