//! Timeline domain - "who was on the field, and for how long" at any cursor
//!
//! [`Timeline`] normalises an event list once and answers play-time and
//! roster questions for arbitrary cursors. It holds no clock and does no IO.

pub mod play_time;
pub mod roster;

pub use play_time::{play_time_from_signals, players_in, resolve_cursor, PlayTimeResult, Stint};
pub use roster::{roster_from_signals, Presence, RosterPlayer};

use crate::common::PlayerRef;
use crate::domains::game_events::{
    signals_from_events, CategoryTable, GameEvent, GameTime, PeriodScheme, Signal,
};

#[derive(Debug, Clone)]
pub struct Timeline {
    signals: Vec<Signal>,
    periods: PeriodScheme,
}

impl Timeline {
    pub fn new(events: &[GameEvent], categories: &CategoryTable, periods: &PeriodScheme) -> Self {
        Self {
            signals: signals_from_events(events, categories, periods),
            periods: periods.clone(),
        }
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn periods(&self) -> &PeriodScheme {
        &self.periods
    }

    pub fn cursor_seconds(&self, cursor: &GameTime) -> u64 {
        resolve_cursor(cursor, &self.signals, &self.periods)
    }

    pub fn play_time(&self, player: &PlayerRef, cursor: &GameTime) -> PlayTimeResult {
        play_time_from_signals(player, &self.signals, self.cursor_seconds(cursor))
    }

    /// Results for every player that ever entered the field.
    pub fn play_time_for_all(&self, cursor: &GameTime) -> Vec<PlayTimeResult> {
        let cursor = self.cursor_seconds(cursor);
        players_in(&self.signals)
            .iter()
            .map(|player| play_time_from_signals(player, &self.signals, cursor))
            .collect()
    }

    pub fn roster_at(&self, cursor: &GameTime) -> Vec<RosterPlayer> {
        roster_from_signals(&self.signals, self.cursor_seconds(cursor))
    }

    /// Roster after every logged event, regardless of time.
    pub fn latest_roster(&self) -> Vec<RosterPlayer> {
        roster_from_signals(&self.signals, u64::MAX)
    }
}

/// One-shot play time for a single player.
pub fn play_time(
    player: &PlayerRef,
    events: &[GameEvent],
    cursor: &GameTime,
    categories: &CategoryTable,
    periods: &PeriodScheme,
) -> PlayTimeResult {
    Timeline::new(events, categories, periods).play_time(player, cursor)
}
