use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use typed_builder::TypedBuilder;

use super::period::GameTime;
use crate::common::{AggregateRef, GameEventId, MatchId, PlayerId, PlayerRef, TeamInMatchId};

/// GameEvent model - one row of the append-only match log.
///
/// Rows are never updated by application code. Player references are stored
/// as nullable columns (internal id, or external name + number) and exposed as
/// [`PlayerRef`] through accessors.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: GameEventId,
    pub match_id: MatchId,
    pub team_in_match_id: TeamInMatchId,
    /// Store-assigned insertion order.
    pub sequence: i64,

    pub category: String,
    pub type_name: String,

    pub player_id: Option<PlayerId>,
    pub external_player_name: Option<String>,
    pub external_player_number: Option<i32>,

    pub second_player_id: Option<PlayerId>,
    pub second_external_player_name: Option<String>,
    pub second_external_player_number: Option<i32>,

    pub period: String,
    pub period_second: i32,
    pub position: Option<String>,

    /// Set on the child signals of a compound event.
    pub parent_event_id: Option<GameEventId>,

    pub recorded_at: DateTime<Utc>,
}

impl GameEvent {
    pub fn aggregate(&self) -> AggregateRef {
        AggregateRef::new(self.match_id, self.team_in_match_id)
    }

    pub fn player(&self) -> Option<PlayerRef> {
        PlayerRef::from_columns(
            self.player_id,
            self.external_player_name.as_deref(),
            self.external_player_number,
        )
    }

    pub fn second_player(&self) -> Option<PlayerRef> {
        PlayerRef::from_columns(
            self.second_player_id,
            self.second_external_player_name.as_deref(),
            self.second_external_player_number,
        )
    }

    pub fn at(&self) -> GameTime {
        GameTime::new(self.period.clone(), self.period_second.max(0) as u32)
    }

    /// Find all events of one aggregate in insertion order
    pub async fn find_by_aggregate(aggregate: AggregateRef, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM game_events
             WHERE match_id = $1 AND team_in_match_id = $2
             ORDER BY sequence ASC",
        )
        .bind(aggregate.match_id)
        .bind(aggregate.team_in_match_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Same as [`find_by_aggregate`](Self::find_by_aggregate), inside an open transaction
    pub async fn find_by_aggregate_in(
        aggregate: AggregateRef,
        conn: &mut PgConnection,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM game_events
             WHERE match_id = $1 AND team_in_match_id = $2
             ORDER BY sequence ASC",
        )
        .bind(aggregate.match_id)
        .bind(aggregate.team_in_match_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    /// Find every event naming a registered player, as actor or second actor
    pub async fn find_by_player(player_id: PlayerId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM game_events
             WHERE player_id = $1 OR second_player_id = $1
             ORDER BY sequence ASC",
        )
        .bind(player_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Append a new event (the only write this table ever sees)
    pub async fn insert(new: &NewGameEvent, conn: &mut PgConnection) -> Result<Self> {
        let (player_id, external_name, external_number) = columns(new.player.as_ref());
        let (second_id, second_name, second_number) = columns(new.second_player.as_ref());
        let period_second = period_second_column(&new.at)?;

        sqlx::query_as::<_, Self>(
            "INSERT INTO game_events (
                id,
                match_id,
                team_in_match_id,
                category,
                type_name,
                player_id,
                external_player_name,
                external_player_number,
                second_player_id,
                second_external_player_name,
                second_external_player_number,
                period,
                period_second,
                position,
                parent_event_id
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
             RETURNING *",
        )
        .bind(new.id)
        .bind(new.aggregate.match_id)
        .bind(new.aggregate.team_in_match_id)
        .bind(&new.category)
        .bind(&new.type_name)
        .bind(player_id)
        .bind(external_name)
        .bind(external_number)
        .bind(second_id)
        .bind(second_name)
        .bind(second_number)
        .bind(&new.at.period)
        .bind(period_second)
        .bind(&new.position)
        .bind(new.parent_event_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }
}

fn period_second_column(at: &GameTime) -> Result<i32> {
    i32::try_from(at.period_second)
        .with_context(|| format!("period_second {} out of range for period {}", at.period_second, at.period))
}

fn columns(player: Option<&PlayerRef>) -> (Option<PlayerId>, Option<String>, Option<i32>) {
    player.map(PlayerRef::to_columns).unwrap_or((None, None, None))
}

/// An event that has not been appended yet.
///
/// Ids are assigned up front so that a batch can link children to parents
/// and report new ids before the store has written anything.
#[derive(Debug, Clone, PartialEq, TypedBuilder)]
pub struct NewGameEvent {
    #[builder(default = GameEventId::new())]
    pub id: GameEventId,
    pub aggregate: AggregateRef,
    #[builder(setter(into))]
    pub category: String,
    #[builder(setter(into))]
    pub type_name: String,
    #[builder(default, setter(strip_option))]
    pub player: Option<PlayerRef>,
    #[builder(default, setter(strip_option))]
    pub second_player: Option<PlayerRef>,
    pub at: GameTime,
    #[builder(default)]
    pub position: Option<String>,
    #[builder(default, setter(strip_option))]
    pub parent_event_id: Option<GameEventId>,
}

impl NewGameEvent {
    /// Materialise the row a store would return after appending.
    pub fn into_event(self, sequence: i64, recorded_at: DateTime<Utc>) -> GameEvent {
        let (player_id, external_player_name, external_player_number) =
            columns(self.player.as_ref());
        let (second_player_id, second_external_player_name, second_external_player_number) =
            columns(self.second_player.as_ref());

        GameEvent {
            id: self.id,
            match_id: self.aggregate.match_id,
            team_in_match_id: self.aggregate.team_in_match_id,
            sequence,
            category: self.category,
            type_name: self.type_name,
            player_id,
            external_player_name,
            external_player_number,
            second_player_id,
            second_external_player_name,
            second_external_player_number,
            period: self.at.period,
            period_second: i32::try_from(self.at.period_second).unwrap_or(i32::MAX),
            position: self.position,
            parent_event_id: self.parent_event_id,
            recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::game_events::models::category::{category_tags, event_types};

    #[test]
    fn test_into_event_splits_player_columns() {
        let aggregate = AggregateRef::new(MatchId::new(), TeamInMatchId::new());
        let starter = PlayerId::new();

        let event = NewGameEvent::builder()
            .aggregate(aggregate)
            .category(category_tags::LINEUP_CHANGE)
            .type_name(event_types::SUBSTITUTION)
            .player(PlayerRef::internal(starter))
            .second_player(PlayerRef::external("Visiting Guest", Some(21)))
            .at(GameTime::new("2", 75))
            .position(Some("LW".to_string()))
            .build()
            .into_event(7, Utc::now());

        assert_eq!(event.sequence, 7);
        assert_eq!(event.aggregate(), aggregate);
        assert_eq!(event.player(), Some(PlayerRef::internal(starter)));
        assert_eq!(event.second_player_id, None);
        assert_eq!(event.second_external_player_number, Some(21));
        assert_eq!(event.at(), GameTime::new("2", 75));
        assert!(event.parent_event_id.is_none());
    }

    #[test]
    fn test_period_second_beyond_column_range_is_rejected() {
        assert_eq!(period_second_column(&GameTime::new("2", 75)).unwrap(), 75);

        let err = period_second_column(&GameTime::new("2", u32::MAX)).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_negative_period_second_reads_as_zero() {
        let aggregate = AggregateRef::new(MatchId::new(), TeamInMatchId::new());
        let mut event = NewGameEvent::builder()
            .aggregate(aggregate)
            .category(category_tags::ROSTER)
            .type_name(event_types::STARTER)
            .at(GameTime::new("1", 0))
            .build()
            .into_event(1, Utc::now());
        event.period_second = -4;

        assert_eq!(event.at(), GameTime::new("1", 0));
    }
}
