//! Lineup selection machine.
//!
//! Pure decision maker: converts operator taps into lineup commands.
//! NO IO, NO async, just synchronous state transitions.
//!
//! ```text
//! Idle --tap field--> FieldFirst --tap other field--> PositionSwap  -> Idle
//!                                --tap bench------> Substitution  -> Idle
//!                                --remove---------> Removal       -> Idle
//! Idle --tap bench--> BenchFirst --tap field------> Substitution  -> Idle
//!                                --tap empty slot-> BringOn (now) -> Idle
//! ```
//!
//! Taps on engaged players and combinations not listed above are ignored
//! without an error.

use std::collections::HashSet;
use tracing::debug;

use super::commands::LineupCommand;
use super::models::{PendingOperation, Selection, SelectionAction};
use crate::common::{AggregateRef, PlayerRef};
use crate::domains::commit::BringOnRequest;
use crate::domains::game_events::GameTime;

/// Inputs a transition reads besides the current selection.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub aggregate: AggregateRef,
    pub at: &'a GameTime,
    pub engaged: &'a HashSet<PlayerRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub selection: Selection,
    pub command: Option<LineupCommand>,
}

impl Transition {
    fn to(selection: Selection) -> Self {
        Self {
            selection,
            command: None,
        }
    }

    fn emit(command: LineupCommand) -> Self {
        Self {
            selection: Selection::Idle,
            command: Some(command),
        }
    }
}

impl Selection {
    pub fn next(&self, action: &SelectionAction, ctx: &SelectionContext<'_>) -> Transition {
        use SelectionAction::*;

        if let Some(player) = tapped_player(action) {
            if ctx.engaged.contains(player) {
                debug!(player = %player, "engaged player ignored");
                return Transition::to(self.clone());
            }
        }

        let queued_at = ctx.at.clone();
        match (self, action) {
            (Selection::Idle, TapFieldPlayer(field)) => {
                Transition::to(Selection::FieldFirst(field.clone()))
            }
            (Selection::Idle, TapBenchPlayer(bench)) => {
                Transition::to(Selection::BenchFirst(bench.clone()))
            }

            (Selection::FieldFirst(held), TapFieldPlayer(field)) => {
                if held.is_same_player(field) {
                    Transition::to(Selection::Idle)
                } else {
                    Transition::emit(LineupCommand::Queue(PendingOperation::PositionSwap {
                        first: held.clone(),
                        second: field.clone(),
                        queued_at,
                    }))
                }
            }
            (Selection::FieldFirst(held), TapBenchPlayer(bench)) => {
                Transition::emit(LineupCommand::Queue(PendingOperation::Substitution {
                    out: held.clone(),
                    incoming: bench.clone(),
                    queued_at,
                }))
            }
            (Selection::FieldFirst(held), RequestRemoval) => {
                Transition::emit(LineupCommand::Queue(PendingOperation::Removal {
                    out: held.clone(),
                    queued_at,
                }))
            }

            (Selection::BenchFirst(held), TapBenchPlayer(bench)) => {
                if held == bench {
                    Transition::to(Selection::Idle)
                } else {
                    Transition::to(Selection::BenchFirst(bench.clone()))
                }
            }
            (Selection::BenchFirst(held), TapFieldPlayer(field)) => {
                Transition::emit(LineupCommand::Queue(PendingOperation::Substitution {
                    out: field.clone(),
                    incoming: held.clone(),
                    queued_at,
                }))
            }
            (Selection::BenchFirst(held), TapEmptyPosition { position }) => {
                Transition::emit(LineupCommand::BringOn(BringOnRequest {
                    aggregate: ctx.aggregate,
                    at: queued_at,
                    player: held.clone(),
                    position: Some(position.clone()),
                }))
            }

            (current, action) => {
                debug!(selection = ?current, action = ?action, "selection ignored");
                Transition::to(current.clone())
            }
        }
    }
}

fn tapped_player(action: &SelectionAction) -> Option<&PlayerRef> {
    match action {
        SelectionAction::TapFieldPlayer(field) => Some(&field.player),
        SelectionAction::TapBenchPlayer(bench) => Some(bench),
        SelectionAction::RequestRemoval | SelectionAction::TapEmptyPosition { .. } => None,
    }
}

/// Holds the current [`Selection`] and replaces it on every decision.
#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    selection: Selection,
}

impl SelectionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn reset(&mut self) {
        self.selection = Selection::Idle;
    }

    pub fn decide(
        &mut self,
        action: &SelectionAction,
        ctx: &SelectionContext<'_>,
    ) -> Option<LineupCommand> {
        let Transition { selection, command } = self.selection.next(action, ctx);
        self.selection = selection;
        command
    }
}
