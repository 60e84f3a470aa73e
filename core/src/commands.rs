//! Operator command vocabulary shared by the console and the one-shot CLI.

use thiserror::Error;

use rostrum_types::{EmptyIdError, FloorSnapshot, ParticipantId, QueueEntry, SessionId, TurnRecord};

use crate::error::FloorError;
use crate::scheduler::FloorScheduler;

#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub palette_label: &'static str,
    pub help_label: &'static str,
    pub description: &'static str,
}

const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec {
        palette_label: "budget <seconds>",
        help_label: "budget",
        description: "Set the per-turn allotment (floor must be vacant)",
    },
    CommandSpec {
        palette_label: "g, grant <participant>",
        help_label: "g(rant)",
        description: "Give the floor to a participant",
    },
    CommandSpec {
        palette_label: "n, next",
        help_label: "n(ext)",
        description: "Give the floor to the head of the queue",
    },
    CommandSpec {
        palette_label: "p, pause",
        help_label: "p(ause)",
        description: "Stop the countdown",
    },
    CommandSpec {
        palette_label: "r, resume",
        help_label: "r(esume)",
        description: "Continue the countdown",
    },
    CommandSpec {
        palette_label: "f, finish",
        help_label: "f(inish)",
        description: "Close the current turn and record it",
    },
    CommandSpec {
        palette_label: "reset",
        help_label: "reset",
        description: "Vacate the floor without recording",
    },
    CommandSpec {
        palette_label: "open | close",
        help_label: "open/close",
        description: "Open or close admission to the queue",
    },
    CommandSpec {
        palette_label: "a, admit <participant>",
        help_label: "a(dmit)",
        description: "Add a participant to the queue",
    },
    CommandSpec {
        palette_label: "w, withdraw <participant>",
        help_label: "w(ithdraw)",
        description: "Remove a waiting participant",
    },
    CommandSpec {
        palette_label: "clear",
        help_label: "clear",
        description: "Empty the queue, including served history",
    },
    CommandSpec {
        palette_label: "q, quit",
        help_label: "q(uit)",
        description: "Exit the console",
    },
];

#[must_use]
pub fn command_specs() -> &'static [CommandSpec] {
    COMMAND_SPECS
}

#[must_use]
pub fn command_help_summary() -> String {
    let labels: Vec<&str> = COMMAND_SPECS.iter().map(|spec| spec.help_label).collect();
    format!("Commands: {}", labels.join(", "))
}

/// Parsed command with raw arguments.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Budget(Option<&'a str>),
    Grant(Option<&'a str>),
    Next,
    Pause,
    Resume,
    Finish,
    Refresh,
    Reset,
    Open,
    Close,
    Admit(Option<&'a str>),
    Withdraw(Option<&'a str>),
    Clear,
    Status,
    Pending,
    Ledger,
    Help,
    Quit,
    Unknown(&'a str),
    Empty,
}

impl<'a> Command<'a> {
    /// Parse a raw command line into a typed Command.
    #[must_use]
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.trim();
        let raw = raw.strip_prefix('/').unwrap_or(raw);
        let (name, rest) = match raw.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, Some(rest.trim()).filter(|rest| !rest.is_empty())),
            None => (raw, None),
        };

        match name {
            "budget" | "b" => Command::Budget(rest),
            "grant" | "g" => Command::Grant(rest),
            "next" | "n" => Command::Next,
            "pause" | "p" => Command::Pause,
            "resume" | "r" => Command::Resume,
            "finish" | "f" | "finalize" => Command::Finish,
            "refresh" => Command::Refresh,
            "reset" => Command::Reset,
            "open" => Command::Open,
            "close" => Command::Close,
            "admit" | "a" => Command::Admit(rest),
            "withdraw" | "w" => Command::Withdraw(rest),
            "clear" => Command::Clear,
            "status" | "s" => Command::Status,
            "pending" => Command::Pending,
            "ledger" | "turns" => Command::Ledger,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "" => Command::Empty,
            other => Command::Unknown(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("`{command}` needs a {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("`{0}` is not a whole number of seconds")]
    InvalidSeconds(String),
    #[error(transparent)]
    InvalidId(#[from] EmptyIdError),
    #[error("unknown command `{0}`")]
    Unknown(String),
    #[error("`{0}` is not a floor operation")]
    NotAnOperation(&'static str),
    #[error(transparent)]
    Floor(#[from] FloorError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    Snapshot(FloorSnapshot),
    Pending(Vec<QueueEntry>),
    Turns(Vec<TurnRecord>),
}

/// Apply one floor command to `session`.
pub fn execute(
    scheduler: &FloorScheduler,
    session: &SessionId,
    command: &Command<'_>,
) -> Result<CommandOutput, CommandError> {
    let snapshot = match *command {
        Command::Budget(arg) => {
            let raw = arg.ok_or(CommandError::MissingArgument {
                command: "budget",
                argument: "number of seconds",
            })?;
            let seconds = raw
                .parse::<u32>()
                .map_err(|_| CommandError::InvalidSeconds(raw.to_string()))?;
            scheduler.configure_budget(session, seconds)?
        }
        Command::Grant(arg) => {
            scheduler.grant_floor(session, participant_arg("grant", arg)?)?
        }
        Command::Next => scheduler.grant_next(session)?,
        Command::Pause => scheduler.pause(session)?,
        Command::Resume => scheduler.resume(session)?,
        Command::Finish => scheduler.finalize_turn(session)?,
        Command::Refresh => scheduler.refresh_remaining(session)?,
        Command::Reset => scheduler.reset(session)?,
        Command::Open => scheduler.open_admission(session)?,
        Command::Close => scheduler.close_admission(session)?,
        Command::Admit(arg) => scheduler.admit(session, participant_arg("admit", arg)?)?,
        Command::Withdraw(arg) => {
            scheduler.withdraw(session, &participant_arg("withdraw", arg)?)?
        }
        Command::Clear => scheduler.clear_all(session)?,
        Command::Status => scheduler.snapshot(session)?,
        Command::Pending => return Ok(CommandOutput::Pending(scheduler.list_pending(session)?)),
        Command::Ledger => return Ok(CommandOutput::Turns(scheduler.list_turns(session)?)),
        Command::Help => return Err(CommandError::NotAnOperation("help")),
        Command::Quit => return Err(CommandError::NotAnOperation("quit")),
        Command::Empty => return Err(CommandError::NotAnOperation("")),
        Command::Unknown(name) => return Err(CommandError::Unknown(name.to_string())),
    };
    Ok(CommandOutput::Snapshot(snapshot))
}

fn participant_arg(
    command: &'static str,
    arg: Option<&str>,
) -> Result<ParticipantId, CommandError> {
    let raw = arg.ok_or(CommandError::MissingArgument {
        command,
        argument: "participant id",
    })?;
    Ok(ParticipantId::new(raw)?)
}
