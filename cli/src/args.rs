//! Command-line surface.

use clap::{Parser, Subcommand};

const COMMANDS_HELP: &str = "\
Console and exec commands:
  budget N, grant P, next, pause, resume, finish, refresh, reset,
  open, close, admit P, withdraw P, clear, status, pending, ledger";

#[derive(Debug, Parser)]
#[command(name = "rostrum", version)]
#[command(about = "Floor-time allocation for moderated debates and meetings")]
#[command(after_help = COMMANDS_HELP)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Session to open in the console when no subcommand is given
    pub session: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Open the operator console
    Console {
        /// Session to moderate
        session: Option<String>,
    },
    /// Apply one command to a session and print the result as JSON
    Exec {
        /// Session to act on
        session: String,
        /// Console command and its argument, e.g. `grant alice`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Save the default per-turn budget to the config file
    SetBudget {
        /// Budget in seconds
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        seconds: u32,
    },
}
