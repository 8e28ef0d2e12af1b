//! Turns the pending queue into wire requests.
//!
//! Substitutions and swaps go into one all-or-nothing batch, each kept in
//! queue order. A swap side whose player is only on the field through a
//! queued substitution has no presence event yet; it is sent as the index
//! of that substitution within the batch. Removals become separate
//! requests that run after the batch.

use thiserror::Error;

use super::models::PendingOperation;
use crate::common::{AggregateRef, GameEventId, PlayerRef};
use crate::domains::commit::{
    CommitBatchRequest, RemovalRequest, SubstitutionRequest, SwapRequest, SwapSide,
};
use crate::domains::game_events::GameTime;
use crate::domains::timeline::{Presence, RosterPlayer};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Swap target {0} is neither on the field nor a queued substitute")]
    UnresolvedSwapTarget(PlayerRef),

    #[error("{0} has no committed presence to replace or remove")]
    NotOnField(PlayerRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledBatch {
    /// May be empty when the queue only holds removals
    pub batch: CommitBatchRequest,
    /// In queue order
    pub removals: Vec<RemovalRequest>,
}

pub fn compile(
    aggregate: AggregateRef,
    at: &GameTime,
    queue: &[PendingOperation],
) -> Result<CompiledBatch, CompileError> {
    let mut substitutions = Vec::new();
    let mut swaps = Vec::new();
    let mut removals = Vec::new();

    for op in queue {
        match op {
            PendingOperation::Substitution {
                out,
                incoming,
                queued_at,
            } => substitutions.push(SubstitutionRequest {
                out_event_id: committed(out)?,
                incoming: incoming.clone(),
                exited_at: Some(queued_at.clone()),
            }),
            PendingOperation::PositionSwap { first, second, .. } => swaps.push((first, second)),
            PendingOperation::Removal { out, queued_at } => removals.push(RemovalRequest {
                aggregate,
                at: queued_at.clone(),
                out_event_id: committed(out)?,
            }),
        }
    }

    let swaps = swaps
        .into_iter()
        .map(|(first, second)| {
            Ok(SwapRequest {
                first: swap_side(first, &substitutions)?,
                second: swap_side(second, &substitutions)?,
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    Ok(CompiledBatch {
        batch: CommitBatchRequest {
            aggregate,
            period: at.period.clone(),
            period_second: at.period_second,
            substitutions,
            swaps,
        },
        removals,
    })
}

fn committed(player: &RosterPlayer) -> Result<GameEventId, CompileError> {
    player
        .presence
        .event_id()
        .ok_or_else(|| CompileError::NotOnField(player.player.clone()))
}

fn swap_side(
    player: &RosterPlayer,
    substitutions: &[SubstitutionRequest],
) -> Result<SwapSide, CompileError> {
    match player.presence {
        Presence::Established(id) => Ok(SwapSide::EventId(id)),
        Presence::Pending => substitutions
            .iter()
            .position(|s| s.incoming == player.player)
            .map(|substitution_index| SwapSide::SubstitutionIndex { substitution_index })
            .ok_or_else(|| CompileError::UnresolvedSwapTarget(player.player.clone())),
    }
}
