//! Lineup dependencies (using traits for testability)
//!
//! The container every lineup action receives. All collaborators are trait
//! objects so tests can swap in the in-memory versions.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

use super::nats::{NatsClientPublisher, NatsCommitNotifier};
use super::traits::{BaseCommitNotifier, BaseGameEventStore, BaseRosterDirectory};
use crate::common::AggregateRef;
use crate::config::Config;
use crate::domains::commit::CommitSummary;
use crate::domains::game_events::{CategoryTable, PeriodScheme, PostgresGameEventStore};

/// Notifier used when no NATS server is configured.
pub struct LogOnlyNotifier;

#[async_trait]
impl BaseCommitNotifier for LogOnlyNotifier {
    async fn lineup_committed(
        &self,
        aggregate: AggregateRef,
        summary: &CommitSummary,
    ) -> Result<()> {
        info!(aggregate = %aggregate, kind = ?summary.kind, events = summary.event_ids.len(), "lineup committed");
        Ok(())
    }
}

#[derive(Clone)]
pub struct LineupDeps {
    pub store: Arc<dyn BaseGameEventStore>,
    pub roster: Arc<dyn BaseRosterDirectory>,
    pub notifier: Arc<dyn BaseCommitNotifier>,
    pub categories: Arc<CategoryTable>,
    pub periods: PeriodScheme,
}

impl LineupDeps {
    pub fn new(
        store: Arc<dyn BaseGameEventStore>,
        roster: Arc<dyn BaseRosterDirectory>,
        notifier: Arc<dyn BaseCommitNotifier>,
        categories: Arc<CategoryTable>,
        periods: PeriodScheme,
    ) -> Self {
        Self {
            store,
            roster,
            notifier,
            categories,
            periods,
        }
    }

    /// Postgres store plus NATS fan-out (or log-only when `NATS_URL` is unset).
    /// The roster directory belongs to the host application.
    pub async fn connect(config: &Config, roster: Arc<dyn BaseRosterDirectory>) -> Result<Self> {
        let categories = Arc::new(config.category_table()?);
        let periods = config.period_scheme();

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(config.require_database_url()?)
            .await
            .context("Failed to connect to database")?;
        let store = PostgresGameEventStore::new(pool, categories.clone(), periods.clone());

        let notifier: Arc<dyn BaseCommitNotifier> = match &config.nats_url {
            Some(url) => {
                let publisher = NatsClientPublisher::connect(url).await?;
                Arc::new(NatsCommitNotifier::new(Arc::new(publisher)))
            }
            None => Arc::new(LogOnlyNotifier),
        };

        info!(
            category_table_version = categories.version,
            period_length_seconds = periods.period_length_seconds,
            "lineup dependencies ready"
        );

        Ok(Self::new(Arc::new(store), roster, notifier, categories, periods))
    }
}
