//! Operator command lines applied through `execute`, as `rostrum exec` does.

use std::sync::Arc;
use std::time::Duration;

use rostrum_config::RostrumConfig;
use rostrum_core::{
    Command, CommandError, CommandOutput, FloorError, FloorScheduler, MemoryStore, execute,
};
use rostrum_types::{FloorSnapshot, PhaseKind, SessionId, TurnEnding};

use crate::common::{clock, pid, scheduler, sid};

fn run(scheduler: &FloorScheduler, session: &SessionId, line: &str) -> CommandOutput {
    execute(scheduler, session, &Command::parse(line)).unwrap()
}

fn expect_snapshot(output: CommandOutput) -> FloorSnapshot {
    match output {
        CommandOutput::Snapshot(snapshot) => snapshot,
        other => panic!("expected a snapshot, got {other:?}"),
    }
}

#[test]
fn a_short_meeting() {
    let (scheduler, clock) = scheduler(120);
    let session = sid("plenary");

    run(&scheduler, &session, "budget 60");
    run(&scheduler, &session, "admit bob");
    run(&scheduler, &session, "/a carol");
    let first = expect_snapshot(run(&scheduler, &session, "next"));
    assert_eq!(first.holder_id, Some(pid("bob")));
    assert_eq!(first.total_budget_seconds, 60);

    clock.advance(Duration::from_secs(15));
    let paused = expect_snapshot(run(&scheduler, &session, "p"));
    assert_eq!(paused.phase(), PhaseKind::Paused);
    clock.advance(Duration::from_secs(30));
    run(&scheduler, &session, "resume");
    clock.advance(Duration::from_secs(5));
    run(&scheduler, &session, "finish");

    let CommandOutput::Pending(pending) = run(&scheduler, &session, "pending") else {
        panic!("expected pending entries");
    };
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].participant_id, pid("carol"));

    let CommandOutput::Turns(turns) = run(&scheduler, &session, "ledger") else {
        panic!("expected turns");
    };
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].seconds_used(), 20);
    assert_eq!(turns[0].ending(), TurnEnding::Finalized);
}

#[test]
fn next_serves_a_holder_who_also_queued() {
    let (scheduler, clock) = scheduler(60);
    let session = sid("plenary");

    run(&scheduler, &session, "grant ana");
    run(&scheduler, &session, "admit ana");
    run(&scheduler, &session, "admit bruno");
    clock.advance(Duration::from_secs(10));

    let snapshot = expect_snapshot(run(&scheduler, &session, "next"));
    assert_eq!(snapshot.holder_id, Some(pid("ana")));
    assert_eq!(snapshot.pending.len(), 1);
    assert_eq!(snapshot.pending[0].participant_id, pid("bruno"));
    let refreshed = expect_snapshot(run(&scheduler, &session, "refresh"));
    assert_eq!(refreshed.remaining_seconds, 50);
    assert_eq!(refreshed.turns_recorded, 0);

    let snapshot = expect_snapshot(run(&scheduler, &session, "next"));
    assert_eq!(snapshot.holder_id, Some(pid("bruno")));
    assert!(snapshot.pending.is_empty());
    let turn = snapshot.last_turn.unwrap();
    assert_eq!(turn.participant_id(), &pid("ana"));
    assert_eq!(turn.ending(), TurnEnding::Overridden);
}

#[test]
fn closed_admission_ignores_new_entries() {
    let (scheduler, _clock) = scheduler(60);
    let session = sid("plenary");
    run(&scheduler, &session, "close");
    let snapshot = expect_snapshot(run(&scheduler, &session, "admit bob"));
    assert!(snapshot.pending.is_empty());

    run(&scheduler, &session, "open");
    run(&scheduler, &session, "admit bob");
    run(&scheduler, &session, "admit bob");
    let snapshot = expect_snapshot(run(&scheduler, &session, "status"));
    assert_eq!(snapshot.pending.len(), 1);

    run(&scheduler, &session, "withdraw bob");
    run(&scheduler, &session, "admit carol");
    let snapshot = expect_snapshot(run(&scheduler, &session, "clear"));
    assert!(snapshot.pending.is_empty());
}

#[test]
fn reset_vacates_without_recording() {
    let (scheduler, clock) = scheduler(60);
    let session = sid("plenary");
    run(&scheduler, &session, "grant alice");
    clock.advance(Duration::from_secs(10));

    let snapshot = expect_snapshot(run(&scheduler, &session, "reset"));
    assert_eq!(snapshot.phase(), PhaseKind::Vacant);
    assert_eq!(snapshot.remaining_seconds, 60);
    assert_eq!(snapshot.turns_recorded, 0);
}

#[test]
fn bad_command_lines_are_rejected() {
    let (scheduler, _clock) = scheduler(60);
    let session = sid("plenary");
    let exec = |line: &str| execute(&scheduler, &session, &Command::parse(line));

    assert!(matches!(
        exec("grant"),
        Err(CommandError::MissingArgument { command: "grant", .. })
    ));
    assert!(matches!(exec("budget -5"), Err(CommandError::InvalidSeconds(_))));
    assert!(matches!(exec("dance"), Err(CommandError::Unknown(name)) if name == "dance"));
    assert!(matches!(exec("quit"), Err(CommandError::NotAnOperation(_))));
    assert!(matches!(
        exec("resume"),
        Err(CommandError::Floor(FloorError::InvalidState { .. }))
    ));
    assert!(matches!(
        exec("budget 0"),
        Err(CommandError::Floor(FloorError::InvalidBudget))
    ));
    assert!(matches!(
        exec("next"),
        Err(CommandError::Floor(FloorError::NothingPending))
    ));
}

#[test]
fn config_defaults_seed_new_sessions() {
    let config = RostrumConfig::parse(
        r#"
[floor]
default_budget_seconds = 90
admission_open = false

[store]
backend = "memory"
"#,
    )
    .unwrap();
    assert!(config.store.resolved_path().is_none());

    let clock = clock();
    let scheduler = FloorScheduler::new(
        Arc::new(clock),
        Arc::new(MemoryStore::new()),
        config.floor.defaults(),
    );
    let snapshot = expect_snapshot(run(&scheduler, &sid("fresh"), "status"));
    assert_eq!(snapshot.total_budget_seconds, 90);
    assert!(!snapshot.admission_open);
}
