//! Game event domain - the append-only match log and its two linkage shapes
//!
//! Stored rows are classified through a versioned [`CategoryTable`], placed
//! on one absolute timeline through a [`PeriodScheme`], and flattened into
//! [`Signal`]s for reconstruction.

pub mod linkage;
pub mod models;
pub mod store;

pub use linkage::{link_events, normalize, signals_from_events, EventShape, LinkedEvent, Signal, SignalKind};
pub use models::*;
pub use store::PostgresGameEventStore;
