pub mod category;
pub mod game_event;
pub mod period;

pub use category::{category_tags, event_types, CategoryTable, EventCategory};
pub use game_event::{GameEvent, NewGameEvent};
pub use period::{GameTime, PeriodError, PeriodScheme, DEFAULT_PERIOD_LENGTH_SECONDS};
