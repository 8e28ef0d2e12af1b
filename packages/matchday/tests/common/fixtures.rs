//! Match fixtures for lineup tests.

use matchday_core::common::{AggregateRef, MatchId, PlayerId, PlayerRef, TeamInMatchId};
use matchday_core::domains::game_events::{category_tags, event_types, GameTime, NewGameEvent};
use matchday_core::domains::lineup::{LineupSession, SelectionAction};
use matchday_core::domains::timeline::RosterPlayer;
use matchday_core::kernel::{MockRosterDirectory, RecordingNotifier, TestDependencies};

/// One team in one match: starters P1..Pn on the field from kickoff in
/// positions "P1".."Pn", plus a bench.
pub struct MatchFixture {
    pub aggregate: AggregateRef,
    pub starters: Vec<PlayerRef>,
    pub bench: Vec<PlayerRef>,
    pub deps: TestDependencies,
}

impl MatchFixture {
    pub fn new(starters: usize, bench: usize) -> Self {
        Self::with_notifier(starters, bench, RecordingNotifier::new())
    }

    pub fn with_notifier(starters: usize, bench: usize, notifier: RecordingNotifier) -> Self {
        let aggregate = AggregateRef::new(MatchId::new(), TeamInMatchId::new());
        let starters: Vec<PlayerRef> = (0..starters).map(|_| PlayerRef::internal(PlayerId::new())).collect();
        let bench: Vec<PlayerRef> = (0..bench).map(|_| PlayerRef::internal(PlayerId::new())).collect();

        let mut roster = MockRosterDirectory::new();
        for (i, player) in starters.iter().enumerate() {
            roster = roster.with_member(player.clone(), &format!("Starter {}", i + 1), Some(i as i32 + 1));
        }
        for (i, player) in bench.iter().enumerate() {
            roster = roster.with_member(player.clone(), &format!("Bench {}", i + 1), Some(i as i32 + 12));
        }

        let deps = TestDependencies::with_notifier(roster, notifier);
        deps.store.seed(
            starters
                .iter()
                .enumerate()
                .map(|(i, player)| {
                    NewGameEvent::builder()
                        .aggregate(aggregate)
                        .category(category_tags::ROSTER)
                        .type_name(event_types::STARTER)
                        .player(player.clone())
                        .position(Some(format!("P{}", i + 1)))
                        .at(GameTime::period_start("1"))
                        .build()
                })
                .collect(),
        );

        Self {
            aggregate,
            starters,
            bench,
            deps,
        }
    }

    pub async fn session(&self, cursor: GameTime) -> LineupSession {
        LineupSession::open(self.deps.deps(), self.aggregate, cursor)
            .await
            .expect("session should open")
    }
}

/// The committed field entry for `player`.
pub fn on_field(session: &LineupSession, player: &PlayerRef) -> RosterPlayer {
    session
        .field()
        .into_iter()
        .find(|r| &r.player == player)
        .expect("player should be on the field")
}

pub async fn tap_field(session: &mut LineupSession, player: &PlayerRef) {
    let target = on_field(session, player);
    session.handle(SelectionAction::TapFieldPlayer(target)).await;
}

pub async fn tap_bench(session: &mut LineupSession, player: &PlayerRef) {
    session
        .handle(SelectionAction::TapBenchPlayer(player.clone()))
        .await;
}
