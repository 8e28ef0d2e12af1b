//! Event category vocabulary.
//!
//! Stored events carry an open `category` tag and a `type_name`. The values
//! have changed across data migrations, so the meaning of a tag lives in a
//! versioned lookup table rather than in the reconstruction code. Historical
//! names stay in the table forever.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::game_event::GameEvent;

/// What an event means for the lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// The named player steps onto the field.
    Entry,
    /// The named player leaves the field.
    Exit,
    /// Incoming player is `player`; outgoing is `second_player` or a child exit.
    Substitution,
    /// `player` and `second_player` exchange positions.
    PositionSwap,
    PeriodStart,
    PeriodEnd,
    /// Pause/resume/finish/cancel markers.
    StatusMarker,
    Other,
}

/// Canonical type names written by this crate.
pub mod event_types {
    pub const STARTER: &str = "STARTER";
    pub const ON_FIELD: &str = "ON_FIELD";
    pub const BROUGHT_ON: &str = "BROUGHT_ON";
    pub const OFF_FIELD: &str = "OFF_FIELD";
    pub const REMOVED_FROM_FIELD: &str = "REMOVED_FROM_FIELD";
    pub const SUBSTITUTION: &str = "SUBSTITUTION";
    pub const POSITION_SWAP: &str = "POSITION_SWAP";
    pub const PERIOD_START: &str = "PERIOD_START";
    pub const PERIOD_END: &str = "PERIOD_END";
    pub const MATCH_STARTED: &str = "MATCH_STARTED";
    pub const MATCH_PAUSED: &str = "MATCH_PAUSED";
    pub const MATCH_RESUMED: &str = "MATCH_RESUMED";
    pub const MATCH_FINISHED: &str = "MATCH_FINISHED";
    pub const MATCH_CANCELLED: &str = "MATCH_CANCELLED";
}

/// Canonical category tags written by this crate.
pub mod category_tags {
    pub const ROSTER: &str = "ROSTER";
    pub const LINEUP_CHANGE: &str = "LINEUP_CHANGE";
    pub const GAME_FLOW: &str = "GAME_FLOW";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub version: u32,
    /// Keyed by upper-cased type name. Checked first.
    #[serde(default)]
    pub type_names: HashMap<String, EventCategory>,
    /// Keyed by upper-cased category tag. Fallback when the type is unknown.
    #[serde(default)]
    pub categories: HashMap<String, EventCategory>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::current()
    }
}

impl CategoryTable {
    /// Mapping in force since the lineup-change rework (version 3).
    ///
    /// v1 wrote `LINEUP`/`SUB`/`PLAYER_OFF`, v2 wrote `STARTING_LINEUP` and
    /// `HALF_START`/`HALF_END`.
    pub fn current() -> Self {
        use event_types::*;
        use EventCategory::*;

        let type_names = [
            (STARTER, Entry),
            (ON_FIELD, Entry),
            (BROUGHT_ON, Entry),
            ("LINEUP", Entry),
            ("STARTING_LINEUP", Entry),
            ("PLAYER_ON", Entry),
            (OFF_FIELD, Exit),
            (REMOVED_FROM_FIELD, Exit),
            ("PLAYER_OFF", Exit),
            (SUBSTITUTION, Substitution),
            ("SUB", Substitution),
            (POSITION_SWAP, PositionSwap),
            ("SWAP", PositionSwap),
            (PERIOD_START, PeriodStart),
            ("HALF_START", PeriodStart),
            (PERIOD_END, PeriodEnd),
            ("HALF_END", PeriodEnd),
            (MATCH_STARTED, StatusMarker),
            (MATCH_PAUSED, StatusMarker),
            (MATCH_RESUMED, StatusMarker),
            (MATCH_FINISHED, StatusMarker),
            ("FULL_TIME", StatusMarker),
            (MATCH_CANCELLED, StatusMarker),
        ];

        let categories = [("SUBSTITUTION", Substitution), ("PERIOD", PeriodStart)];

        Self {
            version: 3,
            type_names: type_names
                .into_iter()
                .map(|(name, category)| (name.to_string(), category))
                .collect(),
            categories: categories
                .into_iter()
                .map(|(name, category)| (name.to_string(), category))
                .collect(),
        }
    }

    /// Parses a JSON mapping. Keys are normalised to upper case.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: Self = serde_json::from_str(json).context("Invalid category table JSON")?;
        Ok(table.normalized())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read category table {}", path.display()))?;
        Self::from_json(&raw)
    }

    fn normalized(self) -> Self {
        Self {
            version: self.version,
            type_names: self
                .type_names
                .into_iter()
                .map(|(k, v)| (normalize_tag(&k), v))
                .collect(),
            categories: self
                .categories
                .into_iter()
                .map(|(k, v)| (normalize_tag(&k), v))
                .collect(),
        }
    }

    pub fn classify_tags(&self, category: &str, type_name: &str) -> EventCategory {
        self.type_names
            .get(&normalize_tag(type_name))
            .or_else(|| self.categories.get(&normalize_tag(category)))
            .copied()
            .unwrap_or(EventCategory::Other)
    }

    pub fn classify(&self, event: &GameEvent) -> EventCategory {
        self.classify_tags(&event.category, &event.type_name)
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().to_ascii_uppercase()
}
