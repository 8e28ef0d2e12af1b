//! Game clock domain - match status, period boundaries and the local tick guard

pub mod actions;
pub mod live_clock;
pub mod machines;
pub mod periods;

pub use actions::{change_status, end_period, start_period};
pub use live_clock::{LiveClock, Tick, DEFAULT_JUMP_THRESHOLD_SECONDS};
pub use machines::{ClockCommand, ClockError, GameClockMachine, MatchStatus};
pub use periods::{active_period, period_end_event, period_start_event};
