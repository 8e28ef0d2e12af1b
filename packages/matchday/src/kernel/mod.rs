//! Kernel module - collaborator seams and dependencies.

pub mod deps;
pub mod nats;
pub mod test_dependencies;
pub mod traits;

pub use deps::{LineupDeps, LogOnlyNotifier};
pub use nats::{
    lineup_subject, NatsClientPublisher, NatsCommitNotifier, NatsPublisher, PublishedMessage,
    TestNats,
};
pub use test_dependencies::{
    InMemoryGameEventStore, MockRosterDirectory, RecordingNotifier, StoreCall, TestDependencies,
};
pub use traits::*;
