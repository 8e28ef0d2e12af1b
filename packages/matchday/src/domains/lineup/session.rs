//! Lineup session - the state a sideline device works against.
//!
//! Holds the committed log for one aggregate, the pending queue and the
//! current selection. Views (field, bench, projected field, play times) are
//! derived on demand from the log and the cursor. Errors from commits are
//! kept in `last_error` for display; selection problems never are.

use anyhow::Result;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::actions::{bring_on, confirm_batch, ConfirmReceipt, LineupError};
use super::commands::LineupCommand;
use super::machines::{SelectionContext, SelectionMachine};
use super::models::{engaged_players, PendingOperation, Selection, SelectionAction};
use crate::common::{AggregateRef, PlayerRef};
use crate::domains::game_events::{GameEvent, GameTime};
use crate::domains::timeline::{players_in, PlayTimeResult, Presence, RosterPlayer, Timeline};
use crate::kernel::{LineupDeps, SquadMember};

pub struct LineupSession {
    deps: LineupDeps,
    aggregate: AggregateRef,
    cursor: GameTime,
    timeline: Timeline,
    squad: Vec<SquadMember>,
    queue: Vec<PendingOperation>,
    machine: SelectionMachine,
    engaged: HashSet<PlayerRef>,
    last_error: Option<String>,
}

impl LineupSession {
    /// Load the log and the squad for `aggregate`.
    pub async fn open(deps: LineupDeps, aggregate: AggregateRef, cursor: GameTime) -> Result<Self> {
        let events = deps.store.fetch_events(aggregate).await?;
        let squad = deps.roster.squad(aggregate).await?;
        Ok(Self::from_parts(deps, aggregate, cursor, &events, squad))
    }

    pub fn from_parts(
        deps: LineupDeps,
        aggregate: AggregateRef,
        cursor: GameTime,
        events: &[GameEvent],
        squad: Vec<SquadMember>,
    ) -> Self {
        let timeline = Timeline::new(events, &deps.categories, &deps.periods);
        Self {
            deps,
            aggregate,
            cursor,
            timeline,
            squad,
            queue: Vec::new(),
            machine: SelectionMachine::new(),
            engaged: HashSet::new(),
            last_error: None,
        }
    }

    /// Reload the committed log.
    pub async fn refresh(&mut self) -> Result<()> {
        let events = self.deps.store.fetch_events(self.aggregate).await?;
        self.timeline = Timeline::new(&events, &self.deps.categories, &self.deps.periods);
        Ok(())
    }

    pub fn aggregate(&self) -> AggregateRef {
        self.aggregate
    }

    pub fn cursor(&self) -> &GameTime {
        &self.cursor
    }

    pub fn set_cursor(&mut self, cursor: GameTime) {
        self.cursor = cursor;
    }

    pub fn queue(&self) -> &[PendingOperation] {
        &self.queue
    }

    pub fn selection(&self) -> &Selection {
        self.machine.selection()
    }

    pub fn engaged(&self) -> &HashSet<PlayerRef> {
        &self.engaged
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Committed on-field players at the cursor.
    pub fn field(&self) -> Vec<RosterPlayer> {
        self.timeline.roster_at(&self.cursor)
    }

    /// The field as it will look once the queue is committed.
    pub fn projected_field(&self) -> Vec<RosterPlayer> {
        let mut field = self.field();

        for op in &self.queue {
            match op {
                PendingOperation::Substitution {
                    out,
                    incoming,
                    queued_at,
                } => {
                    if let Some(slot) = field.iter_mut().find(|r| r.is_same_player(out)) {
                        *slot = RosterPlayer {
                            player: incoming.clone(),
                            presence: Presence::Pending,
                            position: slot.position.clone(),
                            since: queued_at.clone(),
                        };
                    }
                }
                PendingOperation::PositionSwap { first, second, .. } => {
                    let a = field.iter().position(|r| r.is_same_player(first));
                    let b = field.iter().position(|r| r.is_same_player(second));
                    if let (Some(a), Some(b)) = (a, b) {
                        let moved = field[a].position.take();
                        field[a].position = field[b].position.take();
                        field[b].position = moved;
                    }
                }
                PendingOperation::Removal { out, .. } => {
                    field.retain(|r| !r.is_same_player(out));
                }
            }
        }

        field
    }

    /// Squad members not on the committed field.
    pub fn bench(&self) -> Vec<SquadMember> {
        let field: HashSet<PlayerRef> = self.field().into_iter().map(|r| r.player).collect();
        self.squad
            .iter()
            .filter(|m| !field.contains(&m.player))
            .cloned()
            .collect()
    }

    pub fn selectable_field(&self) -> Vec<RosterPlayer> {
        self.field()
            .into_iter()
            .filter(|r| !self.engaged.contains(&r.player))
            .collect()
    }

    pub fn selectable_bench(&self) -> Vec<SquadMember> {
        self.bench()
            .into_iter()
            .filter(|m| !self.engaged.contains(&m.player))
            .collect()
    }

    pub fn play_time(&self, player: &PlayerRef) -> PlayTimeResult {
        self.timeline.play_time(player, &self.cursor)
    }

    /// Squad members first, then anyone else the log mentions.
    pub fn play_times(&self) -> Vec<PlayTimeResult> {
        let mut players: Vec<PlayerRef> = self.squad.iter().map(|m| m.player.clone()).collect();
        for player in players_in(self.timeline.signals()) {
            if !players.contains(&player) {
                players.push(player);
            }
        }
        players.iter().map(|p| self.play_time(p)).collect()
    }

    /// Feed one operator input through the selection machine.
    pub async fn handle(&mut self, action: SelectionAction) {
        let ctx = SelectionContext {
            aggregate: self.aggregate,
            at: &self.cursor,
            engaged: &self.engaged,
        };
        let Some(command) = self.machine.decide(&action, &ctx) else {
            return;
        };
        debug!(immediacy = ?command.immediacy(), "selection produced command");

        match command {
            LineupCommand::Queue(op) => {
                self.queue.push(op);
                self.recompute_engaged();
            }
            LineupCommand::BringOn(request) => match bring_on(&self.deps, &request).await {
                Ok(_) => {
                    self.last_error = None;
                    self.refresh_best_effort().await;
                }
                Err(e) => self.last_error = Some(self.describe(&e).await),
            },
        }
    }

    pub fn remove_queue_entry(&mut self, index: usize) -> Option<PendingOperation> {
        if index >= self.queue.len() {
            return None;
        }
        let removed = self.queue.remove(index);
        self.recompute_engaged();
        Some(removed)
    }

    /// Discard the queue and the selection.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.machine.reset();
        self.engaged.clear();
        self.last_error = None;
    }

    /// Commit the queue at the cursor.
    pub async fn confirm(&mut self) -> Result<ConfirmReceipt, LineupError> {
        let queued_before = self.queue.len();
        let result = confirm_batch(&self.deps, self.aggregate, &self.cursor, &mut self.queue).await;
        self.machine.reset();
        self.recompute_engaged();

        self.last_error = match &result {
            Ok(_) => None,
            Err(e) => Some(self.describe(e).await),
        };

        if self.queue.len() != queued_before {
            self.refresh_best_effort().await;
        }
        result
    }

    /// Operator-facing text for a failed commit, naming players the way the
    /// roster directory does.
    async fn describe(&self, error: &LineupError) -> String {
        let (action, player, source) = match error {
            LineupError::RemovalFailed { player, source } => ("Removing", player, source),
            LineupError::BringOnFailed { player, source } => ("Bringing on", player, source),
            other => return other.to_string(),
        };
        let name = match self.deps.roster.display_name(player).await {
            Ok(name) => name,
            Err(e) => {
                warn!(player = %player, error = %e, "display name lookup failed");
                player.to_string()
            }
        };
        format!("{} {} failed: {}", action, name, source)
    }

    fn recompute_engaged(&mut self) {
        self.engaged = engaged_players(&self.queue);
    }

    async fn refresh_best_effort(&mut self) {
        if let Err(e) = self.refresh().await {
            warn!(aggregate = %self.aggregate, error = %e, "refresh after commit failed");
        }
    }
}
