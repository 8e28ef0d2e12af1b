//! Period boundaries on the match log.

use std::collections::BTreeMap;

use crate::common::AggregateRef;
use crate::domains::game_events::{
    category_tags, event_types, CategoryTable, EventCategory, GameEvent, GameTime, NewGameEvent,
    PeriodScheme,
};
use crate::domains::timeline::RosterPlayer;

/// Highest period that has a start marker and no end marker after it.
pub fn active_period(
    events: &[GameEvent],
    categories: &CategoryTable,
    periods: &PeriodScheme,
) -> Option<String> {
    // ordinal -> (label, last start sequence, last end sequence)
    let mut seen: BTreeMap<u32, (String, Option<i64>, Option<i64>)> = BTreeMap::new();

    for event in events.iter().filter(|e| e.parent_event_id.is_none()) {
        let category = categories.classify(event);
        if !matches!(category, EventCategory::PeriodStart | EventCategory::PeriodEnd) {
            continue;
        }
        let Ok(ordinal) = periods.ordinal(&event.period) else {
            continue;
        };

        let entry = seen
            .entry(ordinal)
            .or_insert_with(|| (event.period.clone(), None, None));
        let slot = if category == EventCategory::PeriodStart {
            &mut entry.1
        } else {
            &mut entry.2
        };
        *slot = Some(slot.map_or(event.sequence, |s| s.max(event.sequence)));
    }

    seen.into_iter()
        .rev()
        .find(|(_, (_, start, end))| match (start, end) {
            (Some(start), Some(end)) => end < start,
            (Some(_), None) => true,
            _ => false,
        })
        .map(|(_, (label, _, _))| label)
}

/// Compound period-start marker whose children put `lineup` on the field.
pub fn period_start_event(
    aggregate: AggregateRef,
    period: &str,
    lineup: &[RosterPlayer],
) -> Vec<NewGameEvent> {
    let at = GameTime::period_start(period);
    let marker = NewGameEvent::builder()
        .aggregate(aggregate)
        .category(category_tags::GAME_FLOW)
        .type_name(event_types::PERIOD_START)
        .at(at.clone())
        .build();
    let parent = marker.id;

    let mut batch = vec![marker];
    batch.extend(lineup.iter().map(|player| {
        NewGameEvent::builder()
            .aggregate(aggregate)
            .category(category_tags::GAME_FLOW)
            .type_name(event_types::ON_FIELD)
            .player(player.player.clone())
            .position(player.position.clone())
            .parent_event_id(parent)
            .at(at.clone())
            .build()
    }));
    batch
}

/// Compound period-end marker whose children take everyone off the field.
pub fn period_end_event(
    aggregate: AggregateRef,
    at: GameTime,
    on_field: &[RosterPlayer],
) -> Vec<NewGameEvent> {
    let marker = NewGameEvent::builder()
        .aggregate(aggregate)
        .category(category_tags::GAME_FLOW)
        .type_name(event_types::PERIOD_END)
        .at(at.clone())
        .build();
    let parent = marker.id;

    let mut batch = vec![marker];
    batch.extend(on_field.iter().map(|player| {
        NewGameEvent::builder()
            .aggregate(aggregate)
            .category(category_tags::GAME_FLOW)
            .type_name(event_types::OFF_FIELD)
            .player(player.player.clone())
            .parent_event_id(parent)
            .at(at.clone())
            .build()
    }));
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{MatchId, PlayerId, PlayerRef, TeamInMatchId};
    use crate::domains::timeline::Timeline;
    use chrono::Utc;

    fn materialise(log: &mut Vec<GameEvent>, batch: Vec<NewGameEvent>) {
        for new in batch {
            let sequence = log.len() as i64 + 1;
            log.push(new.into_event(sequence, Utc::now()));
        }
    }

    #[test]
    fn test_active_period_tracks_markers() {
        let aggregate = AggregateRef::new(MatchId::new(), TeamInMatchId::new());
        let categories = CategoryTable::current();
        let periods = PeriodScheme::default();
        let mut log = Vec::new();

        assert_eq!(active_period(&log, &categories, &periods), None);

        materialise(&mut log, period_start_event(aggregate, "1", &[]));
        assert_eq!(active_period(&log, &categories, &periods).as_deref(), Some("1"));

        materialise(&mut log, period_end_event(aggregate, GameTime::new("1", 1500), &[]));
        assert_eq!(active_period(&log, &categories, &periods), None);

        materialise(&mut log, period_start_event(aggregate, "2", &[]));
        materialise(&mut log, period_end_event(aggregate, GameTime::new("2", 1500), &[]));
        materialise(&mut log, period_start_event(aggregate, "OT1", &[]));
        assert_eq!(active_period(&log, &categories, &periods).as_deref(), Some("OT1"));
    }

    #[test]
    fn test_boundary_markers_close_and_reopen_stints() {
        let aggregate = AggregateRef::new(MatchId::new(), TeamInMatchId::new());
        let categories = CategoryTable::current();
        let periods = PeriodScheme::default();
        let keeper = RosterPlayer {
            player: PlayerRef::internal(PlayerId::new()),
            presence: crate::domains::timeline::Presence::Pending,
            position: Some("GK".to_string()),
            since: GameTime::period_start("1"),
        };

        let mut log = Vec::new();
        materialise(&mut log, period_start_event(aggregate, "1", std::slice::from_ref(&keeper)));
        materialise(
            &mut log,
            period_end_event(aggregate, GameTime::new("1", 1380), std::slice::from_ref(&keeper)),
        );

        let timeline = Timeline::new(&log, &categories, &periods);
        let at_break = timeline.play_time(&keeper.player, &GameTime::new("2", 0));
        assert_eq!(at_break.seconds, 1380);
        assert!(!at_break.on_field);

        materialise(&mut log, period_start_event(aggregate, "2", std::slice::from_ref(&keeper)));
        let timeline = Timeline::new(&log, &categories, &periods);
        let later = timeline.play_time(&keeper.player, &GameTime::new("2", 60));
        assert_eq!(later.seconds, 1440);
        assert!(later.on_field);
        assert_eq!(timeline.roster_at(&GameTime::new("2", 60))[0].position.as_deref(), Some("GK"));
    }
}
