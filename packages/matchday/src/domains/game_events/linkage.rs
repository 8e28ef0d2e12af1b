//! Event linkage shapes and their normalisation into flat signals.
//!
//! A player action reaches the log in one of two shapes:
//!
//! - **Standalone**: the event itself names the acting player(s), e.g. a
//!   `SUBSTITUTION` row with the incoming `player` and outgoing
//!   `second_player`.
//! - **Compound**: a parent event (a period-boundary marker, a paired
//!   substitution) whose child rows carry the secondary actions.
//!
//! Both shapes are valid forever. [`link_events`] tags each top-level event
//! with its shape, and [`normalize`] turns either shape into the same
//! [`Signal`] stream so reconstruction never looks at shapes.

use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use super::models::category::{CategoryTable, EventCategory};
use super::models::game_event::GameEvent;
use super::models::period::{GameTime, PeriodScheme};
use crate::common::{GameEventId, PlayerRef};

#[derive(Debug, Clone, PartialEq)]
pub enum EventShape<'a> {
    Standalone,
    Compound(Vec<&'a GameEvent>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkedEvent<'a> {
    pub event: &'a GameEvent,
    pub shape: EventShape<'a>,
}

/// Group stored rows into top-level events with their children.
///
/// Children whose parent is not in `events` are treated as standalone.
/// Only one level of nesting exists; rows hanging off a child are dropped.
pub fn link_events(events: &[GameEvent]) -> Vec<LinkedEvent<'_>> {
    let ids: HashSet<GameEventId> = events.iter().map(|e| e.id).collect();
    let parents: HashMap<GameEventId, Option<GameEventId>> =
        events.iter().map(|e| (e.id, e.parent_event_id)).collect();

    let mut children: HashMap<GameEventId, Vec<&GameEvent>> = HashMap::new();
    let mut top_level = Vec::new();

    for event in events {
        match event.parent_event_id {
            Some(parent_id) if ids.contains(&parent_id) => {
                let parent_is_child = matches!(
                    parents.get(&parent_id),
                    Some(Some(grandparent)) if ids.contains(grandparent)
                );
                if parent_is_child {
                    debug!(event_id = %event.id, "ignoring event nested below a child");
                    continue;
                }
                children.entry(parent_id).or_default().push(event);
            }
            Some(parent_id) => {
                debug!(event_id = %event.id, parent_id = %parent_id, "orphan child read as standalone");
                top_level.push(event);
            }
            None => top_level.push(event),
        }
    }

    top_level
        .into_iter()
        .map(|event| {
            let shape = match children.remove(&event.id) {
                Some(mut kids) => {
                    kids.sort_by_key(|k| k.sequence);
                    EventShape::Compound(kids)
                }
                None => EventShape::Standalone,
            };
            LinkedEvent { event, shape }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalKind {
    Enter,
    Exit,
    Swap { other: PlayerRef },
}

/// One flat lineup signal: what happened, to whom, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub player: PlayerRef,
    pub at: GameTime,
    pub absolute: u64,
    /// The row that carried the signal; for entries this is the presence id.
    pub event_id: GameEventId,
    pub position: Option<String>,
    pub sequence: i64,
}

/// Flatten linked events into signals sorted by absolute time, then
/// insertion order. Rows with an unknown period label are skipped.
pub fn normalize(
    linked: &[LinkedEvent<'_>],
    categories: &CategoryTable,
    periods: &PeriodScheme,
) -> Vec<Signal> {
    let mut signals = Vec::new();

    for item in linked {
        let parent = item.event;
        own_signals(parent, None, categories, periods, &mut signals);

        if let EventShape::Compound(children) = &item.shape {
            for child in children {
                own_signals(child, Some(parent), categories, periods, &mut signals);
            }
        }
    }

    // stable: ties keep emission order (exit before entry inside one row)
    signals.sort_by_key(|s| (s.absolute, s.sequence));
    signals
}

/// Shortcut for `normalize(&link_events(events), ..)`.
pub fn signals_from_events(
    events: &[GameEvent],
    categories: &CategoryTable,
    periods: &PeriodScheme,
) -> Vec<Signal> {
    normalize(&link_events(events), categories, periods)
}

fn own_signals(
    event: &GameEvent,
    parent: Option<&GameEvent>,
    categories: &CategoryTable,
    periods: &PeriodScheme,
    out: &mut Vec<Signal>,
) {
    let category = categories.classify(event);
    if matches!(
        category,
        EventCategory::PeriodStart
            | EventCategory::PeriodEnd
            | EventCategory::StatusMarker
            | EventCategory::Other
    ) {
        return;
    }

    let at = event.at();
    let absolute = match periods.absolute_seconds(&at) {
        Ok(absolute) => absolute,
        Err(e) => {
            warn!(event_id = %event.id, error = %e, "skipping event with unresolvable period");
            return;
        }
    };

    let position = event
        .position
        .clone()
        .or_else(|| parent.and_then(|p| p.position.clone()));

    let mut push = |kind: SignalKind, player: PlayerRef| {
        out.push(Signal {
            kind,
            player,
            at: at.clone(),
            absolute,
            event_id: event.id,
            position: position.clone(),
            sequence: event.sequence,
        });
    };

    match category {
        EventCategory::Entry => {
            if let Some(player) = event.player() {
                push(SignalKind::Enter, player);
            }
        }
        EventCategory::Exit => {
            if let Some(player) = event.player() {
                push(SignalKind::Exit, player);
            }
        }
        EventCategory::Substitution => {
            if let Some(outgoing) = event.second_player() {
                push(SignalKind::Exit, outgoing);
            }
            if let Some(incoming) = event.player() {
                push(SignalKind::Enter, incoming);
            }
        }
        EventCategory::PositionSwap => {
            if let (Some(first), Some(second)) = (event.player(), event.second_player()) {
                push(SignalKind::Swap { other: second }, first);
            }
        }
        _ => {}
    }
}
