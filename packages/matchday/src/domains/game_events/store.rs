//! Postgres-backed event store.
//!
//! Every write reads the aggregate's log, plans against it and appends
//! inside one transaction. A transaction-scoped advisory lock per aggregate
//! serialises concurrent operators, so the plan always sees the log it is
//! appended to.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::info;

use super::models::{CategoryTable, GameEvent, NewGameEvent, PeriodScheme};
use crate::common::{AggregateRef, GameEventId};
use crate::domains::commit::{
    plan_batch, plan_bring_on, plan_removal, BatchReceipt, BringOnRequest, CommitBatchRequest,
    RemovalRequest,
};
use crate::kernel::BaseGameEventStore;

#[derive(Clone)]
pub struct PostgresGameEventStore {
    pool: PgPool,
    categories: Arc<CategoryTable>,
    periods: PeriodScheme,
}

impl PostgresGameEventStore {
    pub fn new(pool: PgPool, categories: Arc<CategoryTable>, periods: PeriodScheme) -> Self {
        Self {
            pool,
            categories,
            periods,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Held until the surrounding transaction ends.
    async fn lock_aggregate(aggregate: AggregateRef, conn: &mut PgConnection) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(aggregate.to_string())
            .execute(conn)
            .await?;
        Ok(())
    }

    async fn append_all(events: &[NewGameEvent], conn: &mut PgConnection) -> Result<()> {
        for event in events {
            GameEvent::insert(event, &mut *conn).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl BaseGameEventStore for PostgresGameEventStore {
    async fn fetch_events(&self, aggregate: AggregateRef) -> Result<Vec<GameEvent>> {
        GameEvent::find_by_aggregate(aggregate, &self.pool).await
    }

    async fn commit_batch(&self, request: &CommitBatchRequest) -> Result<BatchReceipt> {
        let mut tx = self.pool.begin().await?;
        Self::lock_aggregate(request.aggregate, &mut *tx).await?;

        let existing = GameEvent::find_by_aggregate_in(request.aggregate, &mut *tx).await?;
        let plan = plan_batch(request, &existing, &self.categories, &self.periods)?;
        Self::append_all(&plan.events, &mut *tx).await?;

        tx.commit().await?;

        info!(
            aggregate = %request.aggregate,
            substitutions = plan.receipt.substitution_event_ids.len(),
            swaps = plan.receipt.swap_event_ids.len(),
            "lineup batch committed"
        );
        Ok(plan.receipt)
    }

    async fn commit_removal(&self, request: &RemovalRequest) -> Result<GameEventId> {
        let mut tx = self.pool.begin().await?;
        Self::lock_aggregate(request.aggregate, &mut *tx).await?;

        let existing = GameEvent::find_by_aggregate_in(request.aggregate, &mut *tx).await?;
        let event = plan_removal(request, &existing, &self.categories, &self.periods)?;
        GameEvent::insert(&event, &mut *tx).await?;

        tx.commit().await?;

        info!(aggregate = %request.aggregate, event_id = %event.id, "removal committed");
        Ok(event.id)
    }

    async fn commit_bring_on(&self, request: &BringOnRequest) -> Result<GameEventId> {
        let mut tx = self.pool.begin().await?;
        Self::lock_aggregate(request.aggregate, &mut *tx).await?;

        let existing = GameEvent::find_by_aggregate_in(request.aggregate, &mut *tx).await?;
        let event = plan_bring_on(request, &existing, &self.categories, &self.periods)?;
        GameEvent::insert(&event, &mut *tx).await?;

        tx.commit().await?;

        info!(
            aggregate = %request.aggregate,
            event_id = %event.id,
            player = %request.player,
            "bring-on committed"
        );
        Ok(event.id)
    }

    async fn append(&self, events: &[NewGameEvent]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        if let Some(first) = events.first() {
            Self::lock_aggregate(first.aggregate, &mut *tx).await?;
        }
        Self::append_all(events, &mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
