//! Commit domain - the wire shape of lineup commits and how a store turns
//! them into appended events.

pub mod apply;
pub mod models;

pub use apply::{plan_batch, plan_bring_on, plan_removal, BatchPlan, CommitRejection};
pub use models::*;
