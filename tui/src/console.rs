//! Operator console state: the latest snapshot plus the command line.

use std::sync::Arc;

use rostrum_core::{
    Command, CommandError, CommandOutput, FloorScheduler, command_help_summary, execute,
};
use rostrum_types::{FloorSnapshot, SessionId, TurnEnding, TurnRecord};

use crate::theme::UiOptions;

/// Most recent ledger entries kept for the history panel.
const RECENT_TURNS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Warning,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

pub struct Console {
    scheduler: Arc<FloorScheduler>,
    session: SessionId,
    snapshot: FloorSnapshot,
    turns: Vec<TurnRecord>,
    input: String,
    status: Option<StatusLine>,
    options: UiOptions,
    should_quit: bool,
}

impl Console {
    /// Bind the console to `session`, loading or creating it.
    pub fn new(
        scheduler: Arc<FloorScheduler>,
        session: SessionId,
        options: UiOptions,
    ) -> Result<Self, CommandError> {
        let snapshot = scheduler.refresh_remaining(&session)?;
        let turns = scheduler.list_turns(&session)?;
        Ok(Self {
            scheduler,
            session,
            snapshot,
            turns,
            input: String::new(),
            status: None,
            options,
            should_quit: false,
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    #[must_use]
    pub fn snapshot(&self) -> &FloorSnapshot {
        &self.snapshot
    }

    /// Recorded turns, newest first, capped for display.
    pub fn recent_turns(&self) -> impl Iterator<Item = &TurnRecord> {
        self.turns.iter().rev().take(RECENT_TURNS)
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn status(&self) -> Option<&StatusLine> {
        self.status.as_ref()
    }

    #[must_use]
    pub fn options(&self) -> UiOptions {
        self.options
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    /// Poll the floor. Announces a turn that ran out since the last tick.
    pub fn tick(&mut self) {
        match self.scheduler.refresh_remaining(&self.session) {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(err) => {
                tracing::warn!(session = %self.session, "Floor refresh failed: {err}");
                self.status = Some(StatusLine::error(err.to_string()));
            }
        }
    }

    pub fn insert_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    /// Run the command line and clear it.
    pub fn submit(&mut self) {
        let line = std::mem::take(&mut self.input);
        let command = Command::parse(&line);
        match command {
            Command::Empty => {}
            Command::Quit => self.should_quit = true,
            Command::Help => {
                self.status = Some(StatusLine::info(command_help_summary()));
            }
            _ => self.run(&command),
        }
    }

    fn run(&mut self, command: &Command<'_>) {
        match execute(&self.scheduler, &self.session, command) {
            Ok(CommandOutput::Snapshot(snapshot)) => {
                self.status = Some(StatusLine::info(describe(&snapshot)));
                self.apply_snapshot(snapshot);
            }
            Ok(CommandOutput::Pending(entries)) => {
                let ids: Vec<&str> = entries.iter().map(|e| e.participant_id.as_str()).collect();
                let text = if ids.is_empty() {
                    "Queue is empty".to_string()
                } else {
                    format!("Pending: {}", ids.join(", "))
                };
                self.status = Some(StatusLine::info(text));
            }
            Ok(CommandOutput::Turns(turns)) => {
                self.status = Some(StatusLine::info(format!("{} turns recorded", turns.len())));
                self.turns = turns;
            }
            Err(err) => {
                tracing::debug!(session = %self.session, "Command rejected: {err}");
                self.status = Some(StatusLine::error(err.to_string()));
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: FloorSnapshot) {
        if snapshot.turns_recorded != self.snapshot.turns_recorded {
            if let Some(last) = &snapshot.last_turn
                && snapshot.turns_recorded > self.snapshot.turns_recorded
                && last.ending() == TurnEnding::Expired
            {
                self.status = Some(StatusLine::warning(format!(
                    "Time expired for {}",
                    last.participant_id()
                )));
            }
            match self.scheduler.list_turns(&self.session) {
                Ok(turns) => self.turns = turns,
                Err(err) => tracing::warn!("Failed to reload turn ledger: {err}"),
            }
        }
        self.snapshot = snapshot;
    }
}

fn describe(snapshot: &FloorSnapshot) -> String {
    match &snapshot.holder_id {
        Some(holder) if snapshot.paused => format!("{holder} paused"),
        Some(holder) => format!("{holder} has the floor"),
        None => "Floor is vacant".to_string(),
    }
}
