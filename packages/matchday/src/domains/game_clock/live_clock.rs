//! Locally ticking clock between authoritative refreshes.
//!
//! Observers show live play time as "value at last refresh + seconds counted
//! locally since". A period transition moves the elapsed clock onto the next
//! period's base offset, which shows up as one huge tick; applying it would
//! add minutes nobody played. Deltas above the jump threshold (and any
//! backwards delta) reset the local counter instead of being applied.

use tracing::debug;

use crate::domains::timeline::PlayTimeResult;

pub const DEFAULT_JUMP_THRESHOLD_SECONDS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Delta applied to the local counter.
    Advanced(u64),
    /// Delta discarded; counter reset to zero.
    Jumped { delta: i64 },
    /// First observation, nothing to compare against.
    Initial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveClock {
    jump_threshold: u64,
    last_elapsed: Option<u64>,
    seconds_since_refresh: u64,
}

impl LiveClock {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_JUMP_THRESHOLD_SECONDS)
    }

    pub fn with_threshold(jump_threshold: u64) -> Self {
        Self {
            jump_threshold,
            last_elapsed: None,
            seconds_since_refresh: 0,
        }
    }

    pub fn seconds_since_refresh(&self) -> u64 {
        self.seconds_since_refresh
    }

    /// Feed the current absolute elapsed match seconds.
    pub fn observe(&mut self, elapsed: u64) -> Tick {
        let previous = self.last_elapsed.replace(elapsed);
        let Some(previous) = previous else {
            return Tick::Initial;
        };

        let delta = elapsed as i64 - previous as i64;
        if delta < 0 || delta as u64 > self.jump_threshold {
            debug!(previous, elapsed, delta, "clock jump, resetting local counter");
            self.seconds_since_refresh = 0;
            return Tick::Jumped { delta };
        }

        self.seconds_since_refresh += delta as u64;
        Tick::Advanced(delta as u64)
    }

    /// An authoritative reload happened; locally counted time is now inside it.
    pub fn refresh(&mut self) {
        self.seconds_since_refresh = 0;
    }

    /// Live seconds for a player: base value plus local time while on field.
    ///
    /// After a jump the reading can fall below the one shown just before it.
    /// Callers reload the authoritative play time and [`refresh`](Self::refresh)
    /// at the period boundary, which brings the reading back up.
    pub fn live_seconds(&self, base: &PlayTimeResult) -> u64 {
        if base.on_field {
            base.seconds + self.seconds_since_refresh
        } else {
            base.seconds
        }
    }
}

impl Default for LiveClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PlayerId, PlayerRef};

    fn on_field(seconds: u64) -> PlayTimeResult {
        PlayTimeResult {
            player: PlayerRef::internal(PlayerId::new()),
            minutes: seconds / 60,
            seconds,
            on_field: true,
            stints: Vec::new(),
        }
    }

    #[test]
    fn test_regular_ticks_accumulate() {
        let mut clock = LiveClock::new();
        assert_eq!(clock.observe(100), Tick::Initial);
        assert_eq!(clock.observe(101), Tick::Advanced(1));
        assert_eq!(clock.observe(103), Tick::Advanced(2));
        assert_eq!(clock.seconds_since_refresh(), 3);
        assert_eq!(clock.live_seconds(&on_field(100)), 103);
    }

    #[test]
    fn test_period_transition_jump_is_not_applied() {
        let base = on_field(1380);
        let mut clock = LiveClock::new();
        clock.observe(1380);
        for elapsed in 1381..=1384 {
            clock.observe(elapsed);
        }
        let before = clock.live_seconds(&base);

        // period 2 begins at offset 1500
        assert_eq!(clock.observe(1500), Tick::Jumped { delta: 116 });
        assert_eq!(clock.seconds_since_refresh(), 0);
        clock.observe(1501);
        clock.observe(1502);

        let after = clock.live_seconds(&base);
        assert!(after <= before + 2, "jumped from {} to {}", before, after);
    }

    #[test]
    fn test_refresh_at_period_boundary_catches_up() {
        let mut clock = LiveClock::new();
        clock.observe(1380);
        clock.observe(1384);
        let before = clock.live_seconds(&on_field(1380));
        assert_eq!(before, 1384);

        assert!(matches!(clock.observe(1500), Tick::Jumped { .. }));
        assert!(clock.live_seconds(&on_field(1380)) < before);

        // reloaded play time covers the whole first period
        clock.refresh();
        clock.observe(1501);
        assert_eq!(clock.live_seconds(&on_field(1500)), 1501);
    }

    #[test]
    fn test_backwards_delta_resets() {
        let mut clock = LiveClock::new();
        clock.observe(50);
        clock.observe(55);
        assert_eq!(clock.observe(40), Tick::Jumped { delta: -15 });
        assert_eq!(clock.seconds_since_refresh(), 0);
    }

    #[test]
    fn test_refresh_and_off_field() {
        let mut clock = LiveClock::with_threshold(10);
        clock.observe(0);
        clock.observe(8);
        assert_eq!(clock.observe(30), Tick::Jumped { delta: 22 });
        clock.observe(35);
        clock.refresh();
        assert_eq!(clock.seconds_since_refresh(), 0);

        let mut benched = on_field(40);
        benched.on_field = false;
        clock.observe(38);
        assert_eq!(clock.live_seconds(&benched), 40);
    }
}
