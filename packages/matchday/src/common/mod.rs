// Common types shared across the match domains

pub mod entity_ids;
pub mod id;
pub mod player_ref;

pub use entity_ids::*;
pub use id::Id;
pub use player_ref::{AggregateRef, PlayerKey, PlayerRef};
