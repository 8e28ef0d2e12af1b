pub mod commit;
pub mod game_clock;
pub mod game_events;
pub mod lineup;
pub mod timeline;
