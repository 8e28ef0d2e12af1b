use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::domains::game_events::{event_types, CategoryTable, EventCategory, GameEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    Paused,
    Finished,
    Cancelled,
}

impl MatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockCommand {
    Start,
    Pause,
    Resume,
    Finish,
    Cancel,
}

impl ClockCommand {
    /// Status marker type name written for this command.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => event_types::MATCH_STARTED,
            Self::Pause => event_types::MATCH_PAUSED,
            Self::Resume => event_types::MATCH_RESUMED,
            Self::Finish => event_types::MATCH_FINISHED,
            Self::Cancel => event_types::MATCH_CANCELLED,
        }
    }

    pub fn from_event_type(type_name: &str) -> Option<Self> {
        match type_name.trim().to_ascii_uppercase().as_str() {
            event_types::MATCH_STARTED => Some(Self::Start),
            event_types::MATCH_PAUSED => Some(Self::Pause),
            event_types::MATCH_RESUMED => Some(Self::Resume),
            event_types::MATCH_FINISHED | "FULL_TIME" => Some(Self::Finish),
            event_types::MATCH_CANCELLED => Some(Self::Cancel),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Cannot {command:?} a match that is {from:?}")]
    InvalidTransition {
        from: MatchStatus,
        command: ClockCommand,
    },
}

/// Match status state machine - pure transition logic
///
/// NOT_STARTED -> IN_PROGRESS <-> PAUSED -> FINISHED, and CANCELLED from any
/// non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameClockMachine {
    status: MatchStatus,
}

impl GameClockMachine {
    pub fn new() -> Self {
        Self {
            status: MatchStatus::NotStarted,
        }
    }

    pub fn with_status(status: MatchStatus) -> Self {
        Self { status }
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn next_status(
        from: MatchStatus,
        command: ClockCommand,
    ) -> Result<MatchStatus, ClockError> {
        use ClockCommand::*;
        use MatchStatus::*;

        match (from, command) {
            (NotStarted, Start) => Ok(InProgress),
            (InProgress, Pause) => Ok(Paused),
            (Paused, Resume) => Ok(InProgress),
            (InProgress | Paused, Finish) => Ok(Finished),
            (NotStarted | InProgress | Paused, Cancel) => Ok(Cancelled),
            _ => Err(ClockError::InvalidTransition { from, command }),
        }
    }

    pub fn apply(&mut self, command: ClockCommand) -> Result<MatchStatus, ClockError> {
        self.status = Self::next_status(self.status, command)?;
        Ok(self.status)
    }

    /// Replay status markers from the log. Markers that would be invalid
    /// transitions are skipped; a period start implies the match started.
    pub fn from_events(events: &[GameEvent], categories: &CategoryTable) -> Self {
        let mut ordered: Vec<&GameEvent> = events
            .iter()
            .filter(|e| e.parent_event_id.is_none())
            .collect();
        ordered.sort_by_key(|e| e.sequence);

        let mut machine = Self::new();
        for event in ordered {
            let command = match categories.classify(event) {
                EventCategory::StatusMarker => ClockCommand::from_event_type(&event.type_name),
                EventCategory::PeriodStart if machine.status == MatchStatus::NotStarted => {
                    Some(ClockCommand::Start)
                }
                _ => None,
            };

            if let Some(command) = command {
                if let Err(e) = machine.apply(command) {
                    debug!(event_id = %event.id, error = %e, "status marker ignored");
                }
            }
        }
        machine
    }
}

impl Default for GameClockMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{AggregateRef, MatchId, TeamInMatchId};
    use crate::domains::game_events::{category_tags, GameTime, NewGameEvent};
    use chrono::Utc;

    #[test]
    fn test_happy_path() {
        let mut clock = GameClockMachine::new();
        assert_eq!(clock.apply(ClockCommand::Start), Ok(MatchStatus::InProgress));
        assert_eq!(clock.apply(ClockCommand::Pause), Ok(MatchStatus::Paused));
        assert_eq!(clock.apply(ClockCommand::Resume), Ok(MatchStatus::InProgress));
        assert_eq!(clock.apply(ClockCommand::Finish), Ok(MatchStatus::Finished));
        assert!(clock.status().is_terminal());
    }

    #[test]
    fn test_cancel_from_any_non_terminal_state() {
        for status in [MatchStatus::NotStarted, MatchStatus::InProgress, MatchStatus::Paused] {
            let mut clock = GameClockMachine::with_status(status);
            assert_eq!(clock.apply(ClockCommand::Cancel), Ok(MatchStatus::Cancelled));
        }
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for status in [MatchStatus::Finished, MatchStatus::Cancelled] {
            for command in [
                ClockCommand::Start,
                ClockCommand::Pause,
                ClockCommand::Resume,
                ClockCommand::Finish,
                ClockCommand::Cancel,
            ] {
                let mut clock = GameClockMachine::with_status(status);
                assert_eq!(
                    clock.apply(command),
                    Err(ClockError::InvalidTransition { from: status, command })
                );
                assert_eq!(clock.status(), status);
            }
        }
    }

    #[test]
    fn test_resume_requires_pause() {
        let mut clock = GameClockMachine::with_status(MatchStatus::InProgress);
        assert!(clock.apply(ClockCommand::Resume).is_err());
        assert!(GameClockMachine::new().apply(ClockCommand::Pause).is_err());
    }

    #[test]
    fn test_status_replayed_from_markers() {
        let aggregate = AggregateRef::new(MatchId::new(), TeamInMatchId::new());
        let marker = |type_name: &str, sequence: i64| {
            NewGameEvent::builder()
                .aggregate(aggregate)
                .category(category_tags::GAME_FLOW)
                .type_name(type_name)
                .at(GameTime::new("1", 0))
                .build()
                .into_event(sequence, Utc::now())
        };

        let events = vec![
            marker(event_types::PERIOD_START, 1),
            marker(event_types::MATCH_PAUSED, 2),
            marker(event_types::MATCH_PAUSED, 3),
        ];

        let clock = GameClockMachine::from_events(&events, &CategoryTable::current());
        assert_eq!(clock.status(), MatchStatus::Paused);
    }
}
