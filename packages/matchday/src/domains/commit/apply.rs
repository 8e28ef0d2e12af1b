//! Server-side planning of lineup commits.
//!
//! Stores call these inside their transaction: read the aggregate's log,
//! plan, append every planned event or none. Planning is pure and either
//! produces the full set of new events or a [`CommitRejection`].

use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

use super::models::{
    BatchReceipt, BringOnRequest, CommitBatchRequest, RemovalRequest, SwapRequest, SwapSide,
};
use crate::common::{AggregateRef, GameEventId, PlayerRef};
use crate::domains::game_events::{
    category_tags, event_types, CategoryTable, GameEvent, GameTime, NewGameEvent, PeriodError,
    PeriodScheme, Signal, SignalKind,
};
use crate::domains::timeline::{Presence, RosterPlayer, Timeline};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitRejection {
    #[error("Event {0} is not a current on-field presence")]
    StalePresence(GameEventId),

    #[error("Player {0} is already on the field")]
    AlreadyOnField(PlayerRef),

    #[error("Player {0} appears in more than one substitution")]
    DuplicatePlayer(PlayerRef),

    #[error("Swap references substitution #{0}, which is not in this batch")]
    UnknownSubstitutionIndex(usize),

    #[error("A swap needs two different players")]
    SelfSwap,

    #[error(transparent)]
    Period(#[from] PeriodError),
}

/// Events to append for one batch, plus the ids reported back.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub events: Vec<NewGameEvent>,
    pub receipt: BatchReceipt,
}

/// Substitutions first (new presence ids), then swaps resolved against
/// existing or just-created presences.
pub fn plan_batch(
    request: &CommitBatchRequest,
    existing: &[GameEvent],
    categories: &CategoryTable,
    periods: &PeriodScheme,
) -> Result<BatchPlan, CommitRejection> {
    let at = request.at();
    let batch_seconds = periods.absolute_seconds(&at)?;
    let timeline = Timeline::new(existing, categories, periods);
    let mut working = timeline.latest_roster();

    let mut events = Vec::new();
    let mut receipt = BatchReceipt::default();
    let mut used: HashSet<PlayerRef> = HashSet::new();

    for substitution in &request.substitutions {
        let slot = presence_index(&working, substitution.out_event_id)
            .ok_or(CommitRejection::StalePresence(substitution.out_event_id))?;
        let outgoing = working[slot].clone();

        if working.iter().any(|r| r.player == substitution.incoming) {
            return Err(CommitRejection::AlreadyOnField(substitution.incoming.clone()));
        }
        for player in [&outgoing.player, &substitution.incoming] {
            if !used.insert(player.clone()) {
                return Err(CommitRejection::DuplicatePlayer(player.clone()));
            }
        }

        let exited_at = exit_time(
            substitution.exited_at.as_ref(),
            stint_floor(timeline.signals(), &outgoing, periods),
            (batch_seconds, &at),
            periods,
        );

        let parent = NewGameEvent::builder()
            .aggregate(request.aggregate)
            .category(category_tags::LINEUP_CHANGE)
            .type_name(event_types::SUBSTITUTION)
            .player(substitution.incoming.clone())
            .position(outgoing.position.clone())
            .at(at.clone())
            .build();
        let parent_id = parent.id;

        let child = NewGameEvent::builder()
            .aggregate(request.aggregate)
            .category(category_tags::LINEUP_CHANGE)
            .type_name(event_types::OFF_FIELD)
            .player(outgoing.player.clone())
            .position(outgoing.position.clone())
            .parent_event_id(parent_id)
            .at(exited_at)
            .build();

        events.push(parent);
        events.push(child);
        receipt.substitution_event_ids.push(parent_id);

        working[slot] = RosterPlayer {
            player: substitution.incoming.clone(),
            presence: Presence::Established(parent_id),
            position: outgoing.position,
            since: at.clone(),
        };
    }

    for swap in &request.swaps {
        let (first, second) = resolve_swap(swap, &working, &receipt)?;
        let event = NewGameEvent::builder()
            .aggregate(request.aggregate)
            .category(category_tags::LINEUP_CHANGE)
            .type_name(event_types::POSITION_SWAP)
            .player(working[first].player.clone())
            .second_player(working[second].player.clone())
            .position(working[first].position.clone())
            .at(at.clone())
            .build();
        receipt.swap_event_ids.push(event.id);
        events.push(event);

        let moved = working[first].position.take();
        working[first].position = working[second].position.take();
        working[second].position = moved;
    }

    debug!(
        aggregate = %request.aggregate,
        substitutions = request.substitutions.len(),
        swaps = request.swaps.len(),
        events = events.len(),
        "batch planned"
    );

    Ok(BatchPlan { events, receipt })
}

pub fn plan_removal(
    request: &RemovalRequest,
    existing: &[GameEvent],
    categories: &CategoryTable,
    periods: &PeriodScheme,
) -> Result<NewGameEvent, CommitRejection> {
    let requested = periods.absolute_seconds(&request.at)?;
    let timeline = Timeline::new(existing, categories, periods);
    let roster = timeline.latest_roster();
    let slot = presence_index(&roster, request.out_event_id)
        .ok_or(CommitRejection::StalePresence(request.out_event_id))?;
    let outgoing = &roster[slot];

    // a removal never lands before the last committed change to the player
    let (floor_seconds, floor_at) = stint_floor(timeline.signals(), outgoing, periods);
    let at = if requested < floor_seconds {
        floor_at
    } else {
        request.at.clone()
    };

    Ok(lineup_event(
        request.aggregate,
        event_types::REMOVED_FROM_FIELD,
        outgoing.player.clone(),
        outgoing.position.clone(),
        at,
    ))
}

pub fn plan_bring_on(
    request: &BringOnRequest,
    existing: &[GameEvent],
    categories: &CategoryTable,
    periods: &PeriodScheme,
) -> Result<NewGameEvent, CommitRejection> {
    periods.absolute_seconds(&request.at)?;
    let roster = Timeline::new(existing, categories, periods).latest_roster();
    if roster.iter().any(|r| r.player == request.player) {
        return Err(CommitRejection::AlreadyOnField(request.player.clone()));
    }

    Ok(lineup_event(
        request.aggregate,
        event_types::BROUGHT_ON,
        request.player.clone(),
        request.position.clone(),
        request.at.clone(),
    ))
}

fn lineup_event(
    aggregate: AggregateRef,
    type_name: &str,
    player: PlayerRef,
    position: Option<String>,
    at: GameTime,
) -> NewGameEvent {
    NewGameEvent::builder()
        .aggregate(aggregate)
        .category(category_tags::LINEUP_CHANGE)
        .type_name(type_name)
        .player(player)
        .position(position)
        .at(at)
        .build()
}

fn presence_index(roster: &[RosterPlayer], event_id: GameEventId) -> Option<usize> {
    roster
        .iter()
        .position(|r| r.presence == Presence::Established(event_id))
}

fn resolve_side(
    side: &SwapSide,
    working: &[RosterPlayer],
    receipt: &BatchReceipt,
) -> Result<usize, CommitRejection> {
    let event_id = match side {
        SwapSide::EventId(id) => *id,
        SwapSide::SubstitutionIndex { substitution_index } => *receipt
            .substitution_event_ids
            .get(*substitution_index)
            .ok_or(CommitRejection::UnknownSubstitutionIndex(*substitution_index))?,
    };
    presence_index(working, event_id).ok_or(CommitRejection::StalePresence(event_id))
}

fn resolve_swap(
    swap: &SwapRequest,
    working: &[RosterPlayer],
    receipt: &BatchReceipt,
) -> Result<(usize, usize), CommitRejection> {
    let first = resolve_side(&swap.first, working, receipt)?;
    let second = resolve_side(&swap.second, working, receipt)?;
    if first == second {
        return Err(CommitRejection::SelfSwap);
    }
    Ok((first, second))
}

/// Latest committed signal naming the player, as mover or swap partner.
/// Nothing may close their stint before it.
fn stint_floor(
    signals: &[Signal],
    outgoing: &RosterPlayer,
    periods: &PeriodScheme,
) -> (u64, GameTime) {
    signals
        .iter()
        .rev()
        .find(|s| {
            s.player == outgoing.player
                || matches!(&s.kind, SignalKind::Swap { other } if *other == outgoing.player)
        })
        .map(|s| (s.absolute, s.at.clone()))
        .unwrap_or_else(|| {
            (
                periods.absolute_seconds(&outgoing.since).unwrap_or(0),
                outgoing.since.clone(),
            )
        })
}

/// The outgoing stint closes when the player left, bounded below by the
/// stint floor and above by the batch time.
fn exit_time(
    requested: Option<&GameTime>,
    (floor_seconds, floor_at): (u64, GameTime),
    (batch_seconds, batch_at): (u64, &GameTime),
    periods: &PeriodScheme,
) -> GameTime {
    if floor_seconds > batch_seconds {
        return floor_at;
    }
    let Some(requested) = requested else {
        return batch_at.clone();
    };
    match periods.absolute_seconds(requested) {
        Ok(seconds) if seconds < floor_seconds => floor_at,
        Ok(seconds) if seconds <= batch_seconds => requested.clone(),
        _ => batch_at.clone(),
    }
}
