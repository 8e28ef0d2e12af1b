//! Lineup commands.
//!
//! Everything the selection machine emits goes through one type. Queued
//! operations wait for the operator to confirm the batch; a bring-on into an
//! empty position bypasses the queue and is sent right away.

use serde::Serialize;

use super::models::PendingOperation;
use crate::domains::commit::BringOnRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Immediacy {
    /// Held in the queue until the batch is confirmed
    Deferred,
    /// Sent as its own request straight away
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LineupCommand {
    Queue(PendingOperation),
    BringOn(BringOnRequest),
}

impl LineupCommand {
    pub fn immediacy(&self) -> Immediacy {
        match self {
            Self::Queue(_) => Immediacy::Deferred,
            Self::BringOn(_) => Immediacy::Immediate,
        }
    }
}
