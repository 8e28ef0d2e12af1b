// Matchday - lineup and timeline core
//
// Reconstructs who was on the field, and for how long, from an append-only
// match log, and turns an operator's queued lineup changes into one atomic
// commit against that log.
//
// Domains live in domains/*; collaborator traits and their adapters in kernel/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
