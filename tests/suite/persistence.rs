//! Floor state surviving a scheduler restart on each durable backend.

use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use rostrum_core::{FloorError, FloorStore, ManualClock, SessionFloor, StoreError};
use rostrum_store::{FileStore, SqliteStore};
use rostrum_types::{PhaseKind, SessionId, TurnEnding};

use crate::common::{clock, epoch, pid, scheduler_with, sid};

/// Run a short meeting against `open()`, restart, and check what came back.
fn survives_restart(open: impl Fn() -> Arc<dyn FloorStore>) {
    let clock = clock();
    let session = sid("plenary");
    {
        let scheduler = scheduler_with(&clock, open(), 60);
        scheduler.configure_budget(&session, 45).unwrap();
        scheduler.admit(&session, pid("bob")).unwrap();
        scheduler.admit(&session, pid("carol")).unwrap();
        scheduler.grant_floor(&session, pid("alice")).unwrap();
        clock.advance(Duration::from_secs(20));
        scheduler.finalize_turn(&session).unwrap();
        scheduler.grant_next(&session).unwrap();
        clock.advance(Duration::from_secs(5));
        scheduler.pause(&session).unwrap();
    }

    // Downtime while paused must not be charged.
    clock.advance(Duration::from_secs(300));
    let scheduler = scheduler_with(&clock, open(), 60);
    let snapshot = scheduler.refresh_remaining(&session).unwrap();
    assert_eq!(snapshot.phase(), PhaseKind::Paused);
    assert_eq!(snapshot.holder_id, Some(pid("bob")));
    assert_eq!(snapshot.total_budget_seconds, 45);
    assert_eq!(snapshot.remaining_seconds, 40);
    assert_eq!(snapshot.pending.len(), 1);
    assert_eq!(snapshot.pending[0].participant_id, pid("carol"));

    let turns = scheduler.list_turns(&session).unwrap();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].participant_id(), &pid("alice"));
    assert_eq!(turns[0].seconds_used(), 20);
    assert_eq!(turns[0].ending(), TurnEnding::Finalized);

    // Sequence numbers keep growing after the restart.
    scheduler.admit(&session, pid("dana")).unwrap();
    let pending = scheduler.list_pending(&session).unwrap();
    assert!(pending[1].sequence > pending[0].sequence);
}

#[test]
fn sqlite_store_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("floor.db");
    survives_restart(|| Arc::new(SqliteStore::open(&path).unwrap()) as Arc<dyn FloorStore>);
}

#[test]
fn file_store_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sessions");
    survives_restart(|| Arc::new(FileStore::open(&path).unwrap()) as Arc<dyn FloorStore>);
}

#[test]
fn running_turn_is_charged_for_downtime() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("floor.db");
    let clock = clock();
    let session = sid("committee");
    {
        let scheduler = scheduler_with(&clock, Arc::new(SqliteStore::open(&path).unwrap()), 60);
        scheduler.grant_floor(&session, pid("alice")).unwrap();
    }

    clock.advance(Duration::from_secs(90));
    let scheduler = scheduler_with(&clock, Arc::new(SqliteStore::open(&path).unwrap()), 60);
    let snapshot = scheduler.refresh_remaining(&session).unwrap();
    assert_eq!(snapshot.phase(), PhaseKind::Vacant);
    let turn = snapshot.last_turn.unwrap();
    assert_eq!(turn.ending(), TurnEnding::Expired);
    assert_eq!(turn.seconds_used(), 60);
}

#[test]
fn every_mutation_is_written_through() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    let clock = clock();
    let scheduler = scheduler_with(&clock, store.clone(), 60);
    let session = sid("plenary");

    scheduler.admit(&session, pid("bob")).unwrap();
    let stored = store.load(&session).unwrap().unwrap();
    assert_eq!(stored.list_pending().len(), 1);

    scheduler.grant_floor(&session, pid("bob")).unwrap();
    clock.advance(Duration::from_secs(12));
    scheduler.refresh_remaining(&session).unwrap();
    let stored = store.load(&session).unwrap().unwrap();
    assert_eq!(stored.snapshot().remaining_seconds, 48);
    assert!(stored.list_pending().is_empty());
}

#[test]
fn stored_defaults_win_over_new_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("floor.db");
    let clock = clock();
    let session = sid("plenary");
    {
        let scheduler = scheduler_with(&clock, Arc::new(SqliteStore::open(&path).unwrap()), 60);
        scheduler.snapshot(&session).unwrap();
        // Binding alone is not a mutation; force a write.
        scheduler.close_admission(&session).unwrap();
    }

    let scheduler = scheduler_with(&clock, Arc::new(SqliteStore::open(&path).unwrap()), 600);
    let snapshot = scheduler.snapshot(&session).unwrap();
    assert_eq!(snapshot.total_budget_seconds, 60);
    assert!(!snapshot.admission_open);
}

/// Accepts loads, rejects every save.
struct ReadOnlyStore;

impl FloorStore for ReadOnlyStore {
    fn load(&self, _session: &SessionId) -> Result<Option<SessionFloor>, StoreError> {
        Ok(None)
    }

    fn save(&self, _session: &SessionId, _record: &SessionFloor) -> Result<(), StoreError> {
        Err(StoreError::Backend("read-only".into()))
    }
}

#[test]
fn failed_save_surfaces_but_keeps_the_mutation() {
    let clock = ManualClock::new(epoch());
    let scheduler = scheduler_with(&clock, Arc::new(ReadOnlyStore), 60);
    let session = sid("plenary");

    let err = scheduler.grant_floor(&session, pid("alice")).unwrap_err();
    assert!(matches!(err, FloorError::Store(_)));
    assert_eq!(
        scheduler.snapshot(&session).unwrap().holder_id,
        Some(pid("alice"))
    );
}
