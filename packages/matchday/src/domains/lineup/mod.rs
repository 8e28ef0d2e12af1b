//! Lineup domain - composing substitutions, swaps and removals and
//! committing them as one change.

pub mod actions;
pub mod commands;
pub mod compiler;
pub mod machines;
pub mod models;
pub mod session;

pub use actions::{bring_on, confirm_batch, ConfirmReceipt, LineupError};
pub use commands::{Immediacy, LineupCommand};
pub use compiler::{compile, CompileError, CompiledBatch};
pub use machines::{SelectionContext, SelectionMachine, Transition};
pub use models::*;
pub use session::LineupSession;
