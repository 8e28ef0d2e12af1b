//! Lineup session flow tests
//!
//! Drive a [`LineupSession`] the way the sideline UI does: taps go through the
//! selection machine, confirm commits through the in-memory store, and play
//! time is read back from the reloaded timeline.

mod common;

use crate::common::{on_field, tap_bench, tap_field, MatchFixture};
use matchday_core::domains::commit::{CommitKind, CommitRejection};
use matchday_core::domains::game_clock::Tick;
use matchday_core::domains::game_events::{event_types, GameTime};
use matchday_core::domains::lineup::{LineupError, PendingOperation, Selection, SelectionAction};
use matchday_core::kernel::{RecordingNotifier, StoreCall};
use matchday_core::Config;
use tokio_test::{assert_err, assert_ok};

// ============================================================================
// Batch commit
// ============================================================================

#[tokio::test]
async fn test_substitution_and_swap_commit_together() {
    let fixture = MatchFixture::new(5, 1);
    let [p1, p2, p3, ..] = &fixture.starters[..] else {
        unreachable!()
    };
    let p6 = &fixture.bench[0];

    let mut session = fixture.session(GameTime::new("1", 300)).await;
    tap_field(&mut session, p3).await;
    tap_bench(&mut session, p6).await;
    assert_eq!(session.queue().len(), 1);

    session.set_cursor(GameTime::new("1", 305));
    tap_field(&mut session, p1).await;
    tap_field(&mut session, p2).await;
    assert_eq!(session.queue().len(), 2);

    let receipt = assert_ok!(session.confirm().await);
    let batch = receipt.batch.expect("batch should be committed");
    assert_eq!(batch.substitution_event_ids.len(), 1);
    assert_eq!(batch.swap_event_ids.len(), 1);
    assert!(session.queue().is_empty());
    assert_eq!(session.last_error(), None);

    session.set_cursor(GameTime::new("1", 310));

    let out = session.play_time(p3);
    assert_eq!(out.seconds, 300);
    assert!(!out.on_field);

    let incoming = session.play_time(p6);
    assert_eq!(incoming.seconds, 5);
    assert!(incoming.on_field);

    assert_eq!(session.play_time(p1).seconds, 310);
    assert_eq!(session.play_time(p2).seconds, 310);

    assert_eq!(on_field(&session, p1).position.as_deref(), Some("P2"));
    assert_eq!(on_field(&session, p2).position.as_deref(), Some("P1"));
    assert_eq!(on_field(&session, p6).position.as_deref(), Some("P3"));

    let notifications = fixture.deps.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].1.kind, CommitKind::Batch);
}

#[tokio::test]
async fn test_failed_batch_keeps_every_queued_operation() {
    let fixture = MatchFixture::new(4, 2);
    let [p1, p2, p3, p4] = &fixture.starters[..] else {
        unreachable!()
    };
    let [b1, b2] = &fixture.bench[..] else {
        unreachable!()
    };

    let mut session = fixture.session(GameTime::new("1", 600)).await;
    tap_field(&mut session, p1).await;
    tap_bench(&mut session, b1).await;
    tap_field(&mut session, p2).await;
    tap_bench(&mut session, b2).await;
    tap_field(&mut session, p3).await;
    tap_field(&mut session, p4).await;
    assert_eq!(session.queue().len(), 3);

    let events_before = fixture.deps.store.events().len();
    fixture.deps.store.fail_next_batches(1);

    let err = assert_err!(session.confirm().await);
    assert!(matches!(err, LineupError::CommitFailed(_)));
    assert_eq!(session.queue().len(), 3);
    assert!(session.last_error().is_some());
    assert_eq!(fixture.deps.store.events().len(), events_before);
    assert!(fixture.deps.notifier.notifications().is_empty());

    // Retry succeeds even though the reload afterwards fails
    fixture.deps.store.fail_next_fetches(1);
    assert_ok!(session.confirm().await);
    assert!(session.queue().is_empty());
    assert_eq!(session.last_error(), None);
    // two substitutions (parent + child each) and one swap
    assert_eq!(fixture.deps.store.events().len(), events_before + 5);
}

#[tokio::test]
async fn test_stale_presence_from_another_device_is_rejected() {
    let fixture = MatchFixture::new(2, 2);
    let p1 = &fixture.starters[0];
    let [b1, b2] = &fixture.bench[..] else {
        unreachable!()
    };

    let mut first = fixture.session(GameTime::new("1", 100)).await;
    let mut second = fixture.session(GameTime::new("1", 100)).await;

    tap_field(&mut first, p1).await;
    tap_bench(&mut first, b1).await;
    assert_ok!(first.confirm().await);

    // `second` still holds the presence p1 had before the first commit
    tap_field(&mut second, p1).await;
    tap_bench(&mut second, b2).await;
    let err = assert_err!(second.confirm().await);

    let LineupError::CommitFailed(source) = err else {
        panic!("expected a commit failure");
    };
    assert!(matches!(
        source.downcast_ref::<CommitRejection>(),
        Some(CommitRejection::StalePresence(_))
    ));
    assert_eq!(second.queue().len(), 1);

    assert_ok!(second.refresh().await);
    assert!(second.field().iter().any(|r| &r.player == b1));
}

#[tokio::test]
async fn test_queued_substitution_after_swap_from_another_device() {
    let fixture = MatchFixture::new(2, 1);
    let [p1, p2] = &fixture.starters[..] else {
        unreachable!()
    };
    let b1 = &fixture.bench[0];

    let mut first = fixture.session(GameTime::new("1", 300)).await;
    let mut second = fixture.session(GameTime::new("1", 300)).await;

    tap_field(&mut first, p1).await;
    tap_bench(&mut first, b1).await;

    // the swap keeps p1's presence, so the queued substitution is not stale
    second.set_cursor(GameTime::new("1", 302));
    tap_field(&mut second, p1).await;
    tap_field(&mut second, p2).await;
    assert_ok!(second.confirm().await);

    first.set_cursor(GameTime::new("1", 305));
    assert_ok!(first.confirm().await);

    first.set_cursor(GameTime::new("1", 310));
    assert_eq!(on_field(&first, b1).position.as_deref(), Some("P2"));
    assert_eq!(on_field(&first, p2).position.as_deref(), Some("P1"));
    assert_eq!(first.field().len(), 2);

    let out = first.play_time(p1);
    assert_eq!(out.seconds, 302);
    assert!(!out.on_field);
    assert_eq!(first.play_time(b1).seconds, 5);
}

// ============================================================================
// Exclusivity
// ============================================================================

#[tokio::test]
async fn test_player_sits_in_at_most_one_pending_operation() {
    let fixture = MatchFixture::new(3, 1);
    let [p1, p2, ..] = &fixture.starters[..] else {
        unreachable!()
    };
    let b1 = &fixture.bench[0];

    let mut session = fixture.session(GameTime::new("1", 60)).await;
    tap_field(&mut session, p1).await;
    tap_bench(&mut session, b1).await;

    assert!(session.engaged().contains(p1));
    assert!(session.engaged().contains(b1));
    assert!(!session.selectable_field().iter().any(|r| &r.player == p1));
    assert!(!session.selectable_bench().iter().any(|m| &m.player == b1));

    // Engaged taps are ignored, selection stays idle
    tap_field(&mut session, p1).await;
    assert_eq!(session.selection(), &Selection::Idle);
    tap_bench(&mut session, b1).await;
    assert_eq!(session.selection(), &Selection::Idle);

    // p2 can still be picked, but not paired with the engaged p1
    tap_field(&mut session, p2).await;
    let engaged_p1 = on_field(&session, p1);
    session
        .handle(SelectionAction::TapFieldPlayer(engaged_p1))
        .await;
    assert!(matches!(session.selection(), Selection::FieldFirst(r) if &r.player == p2));
    assert_eq!(session.queue().len(), 1);

    // Projected view shows the queued substitute in p1's position
    let projected = session.projected_field();
    let pending = projected
        .iter()
        .find(|r| &r.player == b1)
        .expect("substitute should be projected");
    assert_eq!(pending.position.as_deref(), Some("P1"));

    let removed = session.remove_queue_entry(0);
    assert!(matches!(removed, Some(PendingOperation::Substitution { .. })));
    assert!(session.selectable_field().iter().any(|r| &r.player == p1));
    assert!(session.selectable_bench().iter().any(|m| &m.player == b1));
}

// ============================================================================
// Removals
// ============================================================================

#[tokio::test]
async fn test_removals_stop_at_first_failure() {
    let fixture = MatchFixture::new(4, 1);
    let [p1, p2, p3, p4] = &fixture.starters[..] else {
        unreachable!()
    };
    let b1 = &fixture.bench[0];

    let mut session = fixture.session(GameTime::new("2", 120)).await;
    for player in [p1, p2, p3] {
        tap_field(&mut session, player).await;
        session.handle(SelectionAction::RequestRemoval).await;
    }
    tap_field(&mut session, p4).await;
    tap_bench(&mut session, b1).await;
    assert_eq!(session.queue().len(), 4);

    fixture.deps.store.fail_removals_after(1);
    let err = assert_err!(session.confirm().await);
    assert!(matches!(&err, LineupError::RemovalFailed { player, .. } if player == p2));

    // batch first, then removals in queue order until the failure
    let writes: Vec<StoreCall> = fixture
        .deps
        .store
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, StoreCall::Fetch(_)))
        .collect();
    assert_eq!(writes.len(), 3);
    assert_eq!(fixture.deps.store.write_count(), writes.len());
    assert!(matches!(writes[0], StoreCall::Batch(_)));
    assert!(matches!(&writes[1], StoreCall::Removal(r) if r.at == GameTime::new("2", 120)));
    assert!(matches!(writes[2], StoreCall::Removal(_)));

    let remaining: Vec<_> = session.queue().iter().flat_map(|op| op.players()).collect();
    assert_eq!(remaining, vec![p2, p3]);
    let message = session.last_error().expect("removal failure surfaced");
    assert!(message.starts_with("Removing Starter 2 failed"), "{}", message);

    let kinds: Vec<CommitKind> = fixture
        .deps
        .notifier
        .notifications()
        .into_iter()
        .map(|(_, summary)| summary.kind)
        .collect();
    assert_eq!(kinds, vec![CommitKind::Batch, CommitKind::Removal]);

    assert!(!session.field().iter().any(|r| &r.player == p1));
    assert!(session.field().iter().any(|r| &r.player == b1));
}

// ============================================================================
// Bring on
// ============================================================================

#[tokio::test]
async fn test_bring_on_commits_immediately() {
    let fixture = MatchFixture::new(2, 1);
    let b1 = &fixture.bench[0];

    let mut session = fixture.session(GameTime::new("1", 900)).await;
    tap_bench(&mut session, b1).await;
    session
        .handle(SelectionAction::TapEmptyPosition {
            position: "GK".to_string(),
        })
        .await;

    assert!(session.queue().is_empty());
    assert_eq!(session.last_error(), None);
    assert_eq!(on_field(&session, b1).position.as_deref(), Some("GK"));
    assert_eq!(session.field().len(), 3);

    let last = fixture.deps.store.events().pop().expect("event appended");
    assert_eq!(last.type_name, event_types::BROUGHT_ON);
}

#[tokio::test]
async fn test_failed_bring_on_surfaces_error() {
    let fixture = MatchFixture::new(2, 1);
    let b1 = &fixture.bench[0];
    fixture.deps.store.fail_next_bring_ons(1);

    let mut session = fixture.session(GameTime::new("1", 900)).await;
    tap_bench(&mut session, b1).await;
    session
        .handle(SelectionAction::TapEmptyPosition {
            position: "GK".to_string(),
        })
        .await;

    let message = session.last_error().expect("bring-on failure surfaced");
    assert!(message.starts_with("Bringing on Bench 1 failed"), "{}", message);
    assert!(session.queue().is_empty());
    assert_eq!(session.selection(), &Selection::Idle);
    assert_eq!(session.field().len(), 2);
    assert_eq!(fixture.deps.store.write_count(), 1);
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn test_notifier_failure_does_not_fail_commit() {
    let fixture = MatchFixture::with_notifier(2, 1, RecordingNotifier::failing());
    let p1 = &fixture.starters[0];
    let b1 = &fixture.bench[0];

    let mut session = fixture.session(GameTime::new("1", 30)).await;
    tap_field(&mut session, p1).await;
    tap_bench(&mut session, b1).await;

    assert_ok!(session.confirm().await);
    assert!(session.queue().is_empty());
    assert_eq!(session.last_error(), None);
}

// ============================================================================
// Live clock
// ============================================================================

#[tokio::test]
async fn test_live_clock_ignores_period_transition_jump() {
    let fixture = MatchFixture::new(1, 0);
    let p1 = &fixture.starters[0];
    let session = fixture.session(GameTime::new("1", 1490)).await;
    let base = session.play_time(p1);
    assert_eq!(base.seconds, 1490);

    let mut clock = Config::default().live_clock();
    assert_eq!(clock.observe(1490), Tick::Initial);
    assert_eq!(clock.observe(1495), Tick::Advanced(5));
    assert_eq!(clock.live_seconds(&base), 1495);

    // Elapsed moves onto the next period's base offset
    assert!(matches!(clock.observe(3000), Tick::Jumped { .. }));
    assert_eq!(clock.live_seconds(&base), 1490);
    assert_eq!(clock.observe(3001), Tick::Advanced(1));
    assert_eq!(clock.live_seconds(&base), 1491);
}
