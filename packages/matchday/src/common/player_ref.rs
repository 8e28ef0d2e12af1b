use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::entity_ids::{MatchId, PlayerId, TeamInMatchId};

/// The (match, team-in-match) scope that event ordering and commit
/// atomicity are defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateRef {
    pub match_id: MatchId,
    pub team_in_match_id: TeamInMatchId,
}

impl AggregateRef {
    pub fn new(match_id: MatchId, team_in_match_id: TeamInMatchId) -> Self {
        Self {
            match_id,
            team_in_match_id,
        }
    }
}

impl fmt::Display for AggregateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.match_id, self.team_in_match_id)
    }
}

/// Who an event is about.
///
/// Registered players are addressed by id. Guests and opponents that have no
/// player record are addressed by name and shirt number.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerRef {
    Internal { id: PlayerId },
    External { name: String, number: Option<i32> },
}

/// Normalised equality key for a [`PlayerRef`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlayerKey {
    Internal(uuid::Uuid),
    External(String, Option<i32>),
}

impl PlayerRef {
    pub fn internal(id: PlayerId) -> Self {
        Self::Internal { id }
    }

    pub fn external(name: impl Into<String>, number: Option<i32>) -> Self {
        Self::External {
            name: name.into(),
            number,
        }
    }

    /// Builds a reference from the nullable columns a stored event carries.
    /// An internal id wins over an external name when both are present.
    pub fn from_columns(
        id: Option<PlayerId>,
        name: Option<&str>,
        number: Option<i32>,
    ) -> Option<Self> {
        match (id, name) {
            (Some(id), _) => Some(Self::internal(id)),
            (None, Some(name)) if !name.trim().is_empty() => Some(Self::external(name, number)),
            _ => None,
        }
    }

    /// Splits back into (player_id, external_name, external_number) columns.
    pub fn to_columns(&self) -> (Option<PlayerId>, Option<String>, Option<i32>) {
        match self {
            Self::Internal { id } => (Some(*id), None, None),
            Self::External { name, number } => (None, Some(name.clone()), *number),
        }
    }

    /// External names compare trimmed and case-insensitively.
    pub fn key(&self) -> PlayerKey {
        match self {
            Self::Internal { id } => PlayerKey::Internal(id.into_uuid()),
            Self::External { name, number } => {
                PlayerKey::External(name.trim().to_lowercase(), *number)
            }
        }
    }
}

impl PartialEq for PlayerRef {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PlayerRef {}

impl Hash for PlayerRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl From<PlayerId> for PlayerRef {
    fn from(id: PlayerId) -> Self {
        Self::internal(id)
    }
}

impl fmt::Display for PlayerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Internal { id } => write!(f, "{}", id),
            Self::External {
                name,
                number: Some(number),
            } => write!(f, "{} #{}", name, number),
            Self::External { name, number: None } => write!(f, "{}", name),
        }
    }
}
