//! Play-time reconstruction.
//!
//! Everything here is a pure function of (signals, cursor): no clocks, no IO,
//! no shared state. Re-running with the same input gives the same output,
//! and independent players can be computed concurrently.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::common::{PlayerKey, PlayerRef};
use crate::domains::game_events::{GameTime, PeriodScheme, Signal, SignalKind};

/// A continuous interval on the field, in absolute match seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stint {
    pub on: u64,
    pub off: Option<u64>,
}

impl Stint {
    /// `max(0, (off ?? cursor) - on)`
    pub fn seconds_until(&self, cursor: u64) -> u64 {
        self.off.unwrap_or(cursor).saturating_sub(self.on)
    }

    pub fn is_open(&self) -> bool {
        self.off.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayTimeResult {
    pub player: PlayerRef,
    /// Whole minutes played, rounded down.
    pub minutes: u64,
    pub seconds: u64,
    pub on_field: bool,
    pub stints: Vec<Stint>,
}

impl PlayTimeResult {
    pub fn empty(player: PlayerRef) -> Self {
        Self {
            player,
            minutes: 0,
            seconds: 0,
            on_field: false,
            stints: Vec::new(),
        }
    }
}

/// Resolve the cursor to absolute seconds.
///
/// A cursor whose period label is not in the scheme falls back to the latest
/// signal time so a usable value is still produced mid-match.
pub fn resolve_cursor(cursor: &GameTime, signals: &[Signal], periods: &PeriodScheme) -> u64 {
    match periods.absolute_seconds(cursor) {
        Ok(absolute) => absolute,
        Err(e) => {
            let fallback = signals.iter().map(|s| s.absolute).max().unwrap_or(0);
            warn!(cursor = %cursor, error = %e, fallback, "unresolvable cursor, using latest event time");
            fallback
        }
    }
}

/// Play time of one player from pre-normalised signals.
///
/// Signals after the cursor are ignored. An entry while a stint is already
/// open keeps the open stint; an exit with nothing open is dropped.
pub fn play_time_from_signals(player: &PlayerRef, signals: &[Signal], cursor: u64) -> PlayTimeResult {
    let mut ordered: Vec<&Signal> = signals
        .iter()
        .filter(|s| s.absolute <= cursor && involves(s, player))
        .collect();
    // defensive: callers may hand over unsorted signals
    ordered.sort_by_key(|s| (s.absolute, s.sequence));

    let mut stints: Vec<Stint> = Vec::new();
    let mut on_field = false;

    for signal in ordered {
        match &signal.kind {
            SignalKind::Enter if &signal.player == player => {
                if stints.last().is_some_and(Stint::is_open) {
                    debug!(player = %player, event_id = %signal.event_id, "entry while already on field ignored");
                    continue;
                }
                stints.push(Stint {
                    on: signal.absolute,
                    off: None,
                });
                on_field = true;
            }
            SignalKind::Exit if &signal.player == player => {
                match stints.last_mut() {
                    Some(stint) if stint.is_open() => {
                        stint.off = Some(signal.absolute);
                        on_field = false;
                    }
                    _ => {
                        debug!(player = %player, event_id = %signal.event_id, "orphan exit ignored");
                    }
                }
            }
            _ => {}
        }
    }

    let seconds: u64 = stints.iter().map(|s| s.seconds_until(cursor)).sum();

    PlayTimeResult {
        player: player.clone(),
        minutes: seconds / 60,
        seconds,
        on_field,
        stints,
    }
}

fn involves(signal: &Signal, player: &PlayerRef) -> bool {
    matches!(signal.kind, SignalKind::Enter | SignalKind::Exit) && &signal.player == player
}

/// Every player that ever entered, keyed for stable output order.
pub fn players_in(signals: &[Signal]) -> Vec<PlayerRef> {
    let mut seen: BTreeMap<PlayerKey, PlayerRef> = BTreeMap::new();
    for signal in signals {
        if signal.kind == SignalKind::Enter {
            seen.entry(signal.player.key())
                .or_insert_with(|| signal.player.clone());
        }
    }
    seen.into_values().collect()
}
