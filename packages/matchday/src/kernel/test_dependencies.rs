// TestDependencies - in-memory implementations for testing
//
// Provides an event store, roster directory and notifier that can be injected
// into LineupDeps for tests. Each records its calls and can be told to fail.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};

use super::traits::{BaseCommitNotifier, BaseGameEventStore, BaseRosterDirectory, SquadMember};
use super::LineupDeps;
use crate::common::{AggregateRef, GameEventId, PlayerRef};
use crate::domains::commit::{
    plan_batch, plan_bring_on, plan_removal, BatchReceipt, BringOnRequest, CommitBatchRequest,
    CommitSummary, RemovalRequest,
};
use crate::domains::game_events::{CategoryTable, GameEvent, NewGameEvent, PeriodScheme};

// =============================================================================
// In-memory Event Store
// =============================================================================

/// A call made against the store, in call order
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Fetch(AggregateRef),
    Batch(CommitBatchRequest),
    Removal(RemovalRequest),
    BringOn(BringOnRequest),
    Append(usize),
}

/// Which upcoming calls should fail
#[derive(Debug, Clone, Default)]
struct FailurePlan {
    batches: usize,
    fetches: usize,
    bring_ons: usize,
    /// Removals that still succeed before every later one fails
    removals_before_failure: Option<usize>,
}

pub struct InMemoryGameEventStore {
    events: Arc<Mutex<Vec<GameEvent>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    failures: Arc<Mutex<FailurePlan>>,
    categories: Arc<CategoryTable>,
    periods: PeriodScheme,
}

impl InMemoryGameEventStore {
    pub fn new() -> Self {
        Self::with_tables(Arc::new(CategoryTable::current()), PeriodScheme::default())
    }

    pub fn with_tables(categories: Arc<CategoryTable>, periods: PeriodScheme) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(FailurePlan::default())),
            categories,
            periods,
        }
    }

    /// Append events directly, bypassing validation and call recording
    pub fn seed(&self, events: Vec<NewGameEvent>) -> Vec<GameEventId> {
        let mut log = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events
            .into_iter()
            .map(|event| push(&mut log, event))
            .collect()
    }

    pub fn fail_next_batches(&self, count: usize) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).batches = count;
    }

    pub fn fail_next_fetches(&self, count: usize) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).fetches = count;
    }

    pub fn fail_next_bring_ons(&self, count: usize) {
        self.failures.lock().unwrap_or_else(|e| e.into_inner()).bring_ons = count;
    }

    /// Let `successes` more removals through, then fail every removal after
    pub fn fail_removals_after(&self, successes: usize) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .removals_before_failure = Some(successes);
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Count of write calls (batch, removal, bring-on, append)
    pub fn write_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, StoreCall::Fetch(_)))
            .count()
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn take_failure(&self, pick: impl FnOnce(&mut FailurePlan) -> bool) -> bool {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        pick(&mut failures)
    }
}

impl Default for InMemoryGameEventStore {
    fn default() -> Self {
        Self::new()
    }
}

fn push(log: &mut Vec<GameEvent>, event: NewGameEvent) -> GameEventId {
    let id = event.id;
    let sequence = log.len() as i64 + 1;
    log.push(event.into_event(sequence, Utc::now()));
    id
}

fn countdown(counter: &mut usize) -> bool {
    if *counter > 0 {
        *counter -= 1;
        true
    } else {
        false
    }
}

#[async_trait]
impl BaseGameEventStore for InMemoryGameEventStore {
    async fn fetch_events(&self, aggregate: AggregateRef) -> Result<Vec<GameEvent>> {
        self.record(StoreCall::Fetch(aggregate));
        if self.take_failure(|f| countdown(&mut f.fetches)) {
            return Err(anyhow!("injected fetch failure"));
        }

        Ok(self
            .events()
            .into_iter()
            .filter(|e| e.aggregate() == aggregate)
            .collect())
    }

    async fn commit_batch(&self, request: &CommitBatchRequest) -> Result<BatchReceipt> {
        self.record(StoreCall::Batch(request.clone()));
        if self.take_failure(|f| countdown(&mut f.batches)) {
            return Err(anyhow!("injected commit failure"));
        }

        let mut log = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let existing: Vec<GameEvent> = log
            .iter()
            .filter(|e| e.aggregate() == request.aggregate)
            .cloned()
            .collect();
        let plan = plan_batch(request, &existing, &self.categories, &self.periods)?;
        for event in plan.events {
            push(&mut log, event);
        }
        Ok(plan.receipt)
    }

    async fn commit_removal(&self, request: &RemovalRequest) -> Result<GameEventId> {
        self.record(StoreCall::Removal(request.clone()));
        let fail = self.take_failure(|f| match f.removals_before_failure.as_mut() {
            Some(remaining) => !countdown(remaining),
            None => false,
        });
        if fail {
            return Err(anyhow!("injected removal failure"));
        }

        let mut log = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let existing: Vec<GameEvent> = log
            .iter()
            .filter(|e| e.aggregate() == request.aggregate)
            .cloned()
            .collect();
        let event = plan_removal(request, &existing, &self.categories, &self.periods)?;
        Ok(push(&mut log, event))
    }

    async fn commit_bring_on(&self, request: &BringOnRequest) -> Result<GameEventId> {
        self.record(StoreCall::BringOn(request.clone()));
        if self.take_failure(|f| countdown(&mut f.bring_ons)) {
            return Err(anyhow!("injected bring-on failure"));
        }

        let mut log = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let existing: Vec<GameEvent> = log
            .iter()
            .filter(|e| e.aggregate() == request.aggregate)
            .cloned()
            .collect();
        let event = plan_bring_on(request, &existing, &self.categories, &self.periods)?;
        Ok(push(&mut log, event))
    }

    async fn append(&self, events: &[NewGameEvent]) -> Result<()> {
        self.record(StoreCall::Append(events.len()));
        let mut log = self.events.lock().unwrap_or_else(|e| e.into_inner());
        for event in events {
            push(&mut log, event.clone());
        }
        Ok(())
    }
}

// =============================================================================
// Mock Roster Directory
// =============================================================================

#[derive(Default)]
pub struct MockRosterDirectory {
    members: Arc<Mutex<Vec<SquadMember>>>,
}

impl MockRosterDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_member(self, player: PlayerRef, display_name: &str, shirt_number: Option<i32>) -> Self {
        self.members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(SquadMember {
                player,
                display_name: display_name.to_string(),
                shirt_number,
            });
        self
    }
}

#[async_trait]
impl BaseRosterDirectory for MockRosterDirectory {
    async fn squad(&self, _aggregate: AggregateRef) -> Result<Vec<SquadMember>> {
        Ok(self
            .members
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone())
    }

    async fn display_name(&self, player: &PlayerRef) -> Result<String> {
        let members = self.members.lock().unwrap_or_else(|e| e.into_inner());
        Ok(members
            .iter()
            .find(|m| &m.player == player)
            .map(|m| m.display_name.clone())
            .unwrap_or_else(|| player.to_string()))
    }
}

// =============================================================================
// Recording Notifier
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    notifications: Arc<Mutex<Vec<(AggregateRef, CommitSummary)>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every call but reports failure
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn notifications(&self) -> Vec<(AggregateRef, CommitSummary)> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl BaseCommitNotifier for RecordingNotifier {
    async fn lineup_committed(
        &self,
        aggregate: AggregateRef,
        summary: &CommitSummary,
    ) -> Result<()> {
        self.notifications
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((aggregate, summary.clone()));
        if self.failing {
            return Err(anyhow!("injected notifier failure"));
        }
        Ok(())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Handles on the in-memory collaborators behind a [`LineupDeps`]
pub struct TestDependencies {
    pub store: Arc<InMemoryGameEventStore>,
    pub roster: Arc<MockRosterDirectory>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestDependencies {
    pub fn new(roster: MockRosterDirectory) -> Self {
        Self::with_notifier(roster, RecordingNotifier::new())
    }

    pub fn with_notifier(roster: MockRosterDirectory, notifier: RecordingNotifier) -> Self {
        Self {
            store: Arc::new(InMemoryGameEventStore::new()),
            roster: Arc::new(roster),
            notifier: Arc::new(notifier),
        }
    }

    pub fn deps(&self) -> LineupDeps {
        LineupDeps::new(
            self.store.clone(),
            self.roster.clone(),
            self.notifier.clone(),
            Arc::new(CategoryTable::current()),
            PeriodScheme::default(),
        )
    }
}
