//! Game clock actions - write period and status markers to the log

use anyhow::{bail, Result};
use tracing::info;

use super::machines::{ClockCommand, GameClockMachine, MatchStatus};
use super::periods::{active_period, period_end_event, period_start_event};
use crate::common::AggregateRef;
use crate::domains::game_events::{category_tags, GameTime, NewGameEvent};
use crate::domains::timeline::{RosterPlayer, Timeline};
use crate::kernel::LineupDeps;

/// Open `period` with `lineup` on the field. Starts the match if needed.
pub async fn start_period(
    deps: &LineupDeps,
    aggregate: AggregateRef,
    period: &str,
    lineup: &[RosterPlayer],
) -> Result<()> {
    deps.periods.ordinal(period)?;
    let events = deps.store.fetch_events(aggregate).await?;

    let status = GameClockMachine::from_events(&events, &deps.categories).status();
    if status.is_terminal() {
        bail!("Cannot start period {} of a match that is {:?}", period, status);
    }
    if let Some(open) = active_period(&events, &deps.categories, &deps.periods) {
        bail!("Period {} is still open", open);
    }

    deps.store
        .append(&period_start_event(aggregate, period, lineup))
        .await?;
    info!(aggregate = %aggregate, period, players = lineup.len(), "period started");
    Ok(())
}

/// Close the active period, taking everyone on the field off at `at`.
pub async fn end_period(deps: &LineupDeps, aggregate: AggregateRef, at: GameTime) -> Result<()> {
    let events = deps.store.fetch_events(aggregate).await?;
    match active_period(&events, &deps.categories, &deps.periods) {
        Some(open) if open == at.period => {}
        Some(open) => bail!("Period {} is open, not {}", open, at.period),
        None => bail!("No period is open"),
    }

    let on_field = Timeline::new(&events, &deps.categories, &deps.periods).roster_at(&at);
    deps.store
        .append(&period_end_event(aggregate, at.clone(), &on_field))
        .await?;
    info!(aggregate = %aggregate, at = %at, players = on_field.len(), "period ended");
    Ok(())
}

/// Validate `command` against the replayed status and record its marker.
pub async fn change_status(
    deps: &LineupDeps,
    aggregate: AggregateRef,
    command: ClockCommand,
    at: GameTime,
) -> Result<MatchStatus> {
    let events = deps.store.fetch_events(aggregate).await?;
    let mut machine = GameClockMachine::from_events(&events, &deps.categories);
    let status = machine.apply(command)?;

    let marker = NewGameEvent::builder()
        .aggregate(aggregate)
        .category(category_tags::GAME_FLOW)
        .type_name(command.event_type())
        .at(at)
        .build();
    deps.store.append(&[marker]).await?;

    info!(aggregate = %aggregate, command = ?command, status = ?status, "match status changed");
    Ok(status)
}
