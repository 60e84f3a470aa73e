//! End-to-end floor timing through the scheduler.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::TimeDelta;

use rostrum_core::FloorError;
use rostrum_types::{PhaseKind, TurnEnding};

use crate::common::{epoch, pid, scheduler, sid};

#[test]
fn countdown_never_increases_while_active() {
    let (scheduler, clock) = scheduler(60);
    let session = sid("plenary");
    scheduler.grant_floor(&session, pid("alice")).unwrap();

    let mut last = u64::MAX;
    for step in [250, 0, 1_000, 3, 4_000, 0, 750] {
        clock.advance_millis(step);
        let snapshot = scheduler.refresh_remaining(&session).unwrap();
        assert!(snapshot.remaining_millis <= last);
        last = snapshot.remaining_millis;
    }
    assert_eq!(last, 60_000 - 6_003);
}

#[test]
fn paused_interval_is_not_charged() {
    let (scheduler, clock) = scheduler(120);
    let session = sid("plenary");
    scheduler.grant_floor(&session, pid("alice")).unwrap();

    clock.advance(Duration::from_secs(10));
    scheduler.pause(&session).unwrap();
    clock.advance(Duration::from_secs(45));
    let paused = scheduler.refresh_remaining(&session).unwrap();
    assert_eq!(paused.phase(), PhaseKind::Paused);
    assert_eq!(paused.remaining_seconds, 110);
    assert!(paused.turn_started_at.is_none());

    scheduler.resume(&session).unwrap();
    clock.advance(Duration::from_secs(10));
    let snapshot = scheduler.finalize_turn(&session).unwrap();

    let turn = snapshot.last_turn.unwrap();
    assert_eq!(turn.seconds_used(), 20);
    assert_eq!(turn.ending(), TurnEnding::Finalized);
}

#[test]
fn override_records_exactly_one_turn_for_previous_holder() {
    let (scheduler, clock) = scheduler(90);
    let session = sid("plenary");
    scheduler.grant_floor(&session, pid("alice")).unwrap();
    clock.advance(Duration::from_secs(30));

    let snapshot = scheduler.grant_floor(&session, pid("bob")).unwrap();
    assert_eq!(snapshot.holder_id, Some(pid("bob")));
    assert_eq!(snapshot.remaining_seconds, 90);

    let turns = scheduler.list_turns(&session).unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].participant_id(), &pid("alice"));
    assert_eq!(turns[0].seconds_used(), 30);
    assert_eq!(turns[0].ending(), TurnEnding::Overridden);
}

#[test]
fn regranting_the_holder_keeps_the_clock_running() {
    let (scheduler, clock) = scheduler(90);
    let session = sid("plenary");
    scheduler.grant_floor(&session, pid("alice")).unwrap();
    clock.advance(Duration::from_secs(15));

    let snapshot = scheduler.grant_floor(&session, pid("alice")).unwrap();
    assert_eq!(snapshot.turns_recorded, 0);
    let snapshot = scheduler.refresh_remaining(&session).unwrap();
    assert_eq!(snapshot.remaining_seconds, 75);
}

#[test]
fn queue_order_follows_sequence_not_request_time() {
    let (scheduler, clock) = scheduler(60);
    let session = sid("plenary");

    clock.advance(Duration::from_secs(5));
    scheduler.admit(&session, pid("first")).unwrap();
    // A clock stepped backwards must not let a later admission jump the line.
    clock.set(epoch() - TimeDelta::seconds(60));
    scheduler.admit(&session, pid("second")).unwrap();
    clock.set(epoch() + TimeDelta::seconds(120));
    scheduler.admit(&session, pid("third")).unwrap();

    let queued = scheduler.list_pending(&session).unwrap();
    let order: Vec<(String, u64)> = queued
        .iter()
        .map(|entry| (entry.participant_id.to_string(), entry.sequence))
        .collect();
    assert_eq!(
        order,
        [
            ("first".to_owned(), 1),
            ("second".to_owned(), 2),
            ("third".to_owned(), 3)
        ]
    );

    let snapshot = scheduler.grant_next(&session).unwrap();
    assert_eq!(snapshot.holder_id, Some(pid("first")));
    assert_eq!(snapshot.pending.len(), 2);
    clock.advance(Duration::from_secs(3));
    scheduler.finalize_turn(&session).unwrap();

    let snapshot = scheduler.grant_next(&session).unwrap();
    assert_eq!(snapshot.holder_id, Some(pid("second")));
    assert_eq!(snapshot.pending.len(), 1);
    assert_eq!(snapshot.pending[0].sequence, 3);
    clock.advance(Duration::from_secs(3));

    // Overrides the running turn rather than waiting for it to end.
    let snapshot = scheduler.grant_next(&session).unwrap();
    assert_eq!(snapshot.holder_id, Some(pid("third")));
    assert!(snapshot.pending.is_empty());

    let speakers: Vec<String> = scheduler
        .list_turns(&session)
        .unwrap()
        .iter()
        .map(|turn| turn.participant_id().to_string())
        .collect();
    assert_eq!(speakers, ["first", "second"]);
    assert!(matches!(
        scheduler.grant_next(&session),
        Err(FloorError::NothingPending)
    ));
}

#[test]
fn grant_next_on_empty_queue_is_rejected() {
    let (scheduler, _clock) = scheduler(60);
    let err = scheduler.grant_next(&sid("plenary")).unwrap_err();
    assert!(matches!(err, FloorError::NothingPending));
}

#[test]
fn redundant_polls_agree() {
    let (scheduler, clock) = scheduler(60);
    let session = sid("plenary");
    scheduler.grant_floor(&session, pid("alice")).unwrap();
    clock.advance_millis(2_500);

    let first = scheduler.refresh_remaining(&session).unwrap();
    let second = scheduler.refresh_remaining(&session).unwrap();
    let third = scheduler.snapshot(&session).unwrap();
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(first.remaining_millis, 57_500);
    assert_eq!(first.remaining_seconds, 58);
}

#[test]
fn concurrent_pollers_charge_elapsed_time_once() {
    let (scheduler, clock) = scheduler(60);
    let scheduler = Arc::new(scheduler);
    let session = sid("plenary");
    scheduler.grant_floor(&session, pid("alice")).unwrap();
    clock.advance(Duration::from_secs(7));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let scheduler = Arc::clone(&scheduler);
            let session = session.clone();
            thread::spawn(move || scheduler.refresh_remaining(&session).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().remaining_seconds, 53);
    }
}

#[test]
fn turn_expires_on_the_poll_that_reaches_zero() {
    let (scheduler, clock) = scheduler(30);
    let session = sid("plenary");
    scheduler.admit(&session, pid("bob")).unwrap();
    scheduler.grant_floor(&session, pid("alice")).unwrap();

    clock.advance(Duration::from_secs(29));
    let snapshot = scheduler.refresh_remaining(&session).unwrap();
    assert_eq!(snapshot.remaining_seconds, 1);

    clock.advance(Duration::from_secs(5));
    let snapshot = scheduler.refresh_remaining(&session).unwrap();
    assert_eq!(snapshot.phase(), PhaseKind::Vacant);
    assert_eq!(snapshot.remaining_seconds, 30);
    assert_eq!(snapshot.pending.len(), 1);

    let turn = snapshot.last_turn.unwrap();
    assert_eq!(turn.ending(), TurnEnding::Expired);
    assert_eq!(turn.seconds_used(), 30);
}

#[test]
fn budget_changes_wait_for_a_vacant_floor() {
    let (scheduler, _clock) = scheduler(60);
    let session = sid("plenary");
    scheduler.grant_floor(&session, pid("alice")).unwrap();

    let err = scheduler.configure_budget(&session, 90).unwrap_err();
    assert!(err.is_invalid_state());
    scheduler.pause(&session).unwrap();
    assert!(scheduler.configure_budget(&session, 90).unwrap_err().is_invalid_state());

    scheduler.finalize_turn(&session).unwrap();
    let snapshot = scheduler.configure_budget(&session, 90).unwrap();
    assert_eq!(snapshot.total_budget_seconds, 90);
    assert_eq!(snapshot.remaining_seconds, 90);
    assert!(matches!(
        scheduler.configure_budget(&session, 0),
        Err(FloorError::InvalidBudget)
    ));
}

#[test]
fn sessions_are_independent() {
    let (scheduler, clock) = scheduler(60);
    let east = sid("east");
    let west = sid("west");
    scheduler.grant_floor(&east, pid("alice")).unwrap();
    scheduler.close_admission(&west).unwrap();
    clock.advance(Duration::from_secs(20));

    assert_eq!(scheduler.refresh_remaining(&east).unwrap().remaining_seconds, 40);
    let west_snapshot = scheduler.refresh_remaining(&west).unwrap();
    assert_eq!(west_snapshot.remaining_seconds, 60);
    assert!(west_snapshot.holder_id.is_none());
    assert!(!west_snapshot.admission_open);
    assert!(scheduler.snapshot(&east).unwrap().admission_open);
    assert_eq!(scheduler.sessions(), vec![east, west]);
}
