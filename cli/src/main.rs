//! Rostrum CLI - binary entry point and terminal session management.
//!
//! # Architecture
//!
//! The CLI wires [`rostrum_config`] and [`rostrum_store`] into a
//! [`rostrum_core::FloorScheduler`], then either hands it to the
//! [`rostrum_tui`] console or applies a single command.
//!
//! ```text
//! main() -> Cli::parse()
//!              |-- [SESSION] / console -> TerminalSession::new() -> run_console() -> Console + draw
//!              |-- exec                -> execute() -> JSON on stdout
//!              `-- set-budget          -> RostrumConfig::persist_default_budget()
//! ```
//!
//! # Event Loop
//!
//! The console renders on a fixed 16ms cadence and refreshes the floor on the
//! configured poll interval:
//!
//! 1. Wait for whichever tick fires first
//! 2. Drain input queue (non-blocking via [`rostrum_tui::InputPump`])
//! 3. On a poll tick, refresh the floor (`console.tick()`)
//! 4. Render frame

mod args;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use std::{
    env,
    fs::{self, OpenOptions},
    io::{Stdout, stdout},
    path::PathBuf,
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use rostrum_config::{RostrumConfig, StoreBackend};
use rostrum_core::{Command, CommandOutput, FloorScheduler, FloorStore, MemoryStore, SystemClock};
use rostrum_store::{FileStore, SqliteStore};
use rostrum_tui::{Console, InputPump, UiOptions, draw, handle_events};
use rostrum_types::SessionId;

use args::{Cli, Commands};

const SESSION_ENV: &str = "ROSTRUM_SESSION";
const FALLBACK_SESSION: &str = "default";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than write over the console.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.rostrum/logs/rostrum.log
    if let Some(data_dir) = rostrum_config::data_dir() {
        candidates.push(data_dir.join("logs").join("rostrum.log"));
    }

    // Fallback: ./.rostrum/logs/rostrum.log
    candidates.push(PathBuf::from(".rostrum").join("logs").join("rostrum.log"));

    candidates
}

/// Open the configured floor store.
fn open_store(config: &RostrumConfig) -> Result<Arc<dyn FloorStore>> {
    let backend = config.store.backend;
    if backend == StoreBackend::Memory {
        tracing::info!("Using in-memory floor store");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let path = config
        .store
        .resolved_path()
        .ok_or_else(|| anyhow!("Could not determine a store path; set [store] path"))?;
    tracing::info!(backend = ?backend, path = %path.display(), "Opening floor store");
    let store: Arc<dyn FloorStore> = match backend {
        StoreBackend::Sqlite => Arc::new(SqliteStore::open(&path)?),
        StoreBackend::File => Arc::new(FileStore::open(&path)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}

/// Explicit argument, then `ROSTRUM_SESSION`, then `[floor] default_session`.
fn resolve_session(explicit: Option<String>, config: &RostrumConfig) -> Result<SessionId> {
    let raw = explicit
        .or_else(|| env::var(SESSION_ENV).ok().filter(|v| !v.trim().is_empty()))
        .or_else(|| config.floor.default_session.clone())
        .unwrap_or_else(|| FALLBACK_SESSION.to_string());
    SessionId::new(raw).context("Invalid session id")
}

fn build_scheduler(config: &RostrumConfig) -> Result<Arc<FloorScheduler>> {
    let store = open_store(config)?;
    Ok(Arc::new(FloorScheduler::new(
        Arc::new(SystemClock),
        store,
        config.floor.defaults(),
    )))
}

/// RAII wrapper for terminal state with guaranteed cleanup on drop.
///
/// Enables raw mode, bracketed paste and the alternate screen; all of it is
/// restored on drop, including after panics or early returns.
struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    fn new() -> Result<Self> {
        enable_raw_mode()?;

        let mut out = stdout();
        if let Err(err) = execute!(out, EnableBracketedPaste) {
            let _ = disable_raw_mode();
            return Err(err.into());
        }
        if let Err(err) = execute!(out, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            let _ = execute!(out, DisableBracketedPaste);
            return Err(err.into());
        }

        let terminal = match Terminal::new(CrosstermBackend::new(out)) {
            Ok(t) => t,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen, DisableBracketedPaste);
                return Err(err.into());
            }
        };

        Ok(Self { terminal })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        );
        let _ = self.terminal.show_cursor();
    }
}

const FRAME_DURATION: Duration = Duration::from_millis(16);

async fn run_console<B>(
    terminal: &mut Terminal<B>,
    console: &mut Console,
    poll_interval: Duration,
) -> Result<()>
where
    B: Backend,
    B::Error: Send + Sync + 'static,
{
    let mut input = InputPump::new();
    let mut frames = tokio::time::interval(FRAME_DURATION);
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut polls = tokio::time::interval(poll_interval);
    polls.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let result: Result<()> = loop {
        let poll_due = tokio::select! {
            _ = frames.tick() => false,
            _ = polls.tick() => true,
        };

        let quit_now = match handle_events(console, &mut input) {
            Ok(q) => q,
            Err(e) => break Err(e),
        };
        if quit_now {
            break Ok(());
        }

        if poll_due {
            console.tick();
        }

        if let Err(e) = terminal.draw(|frame| draw(frame, console)) {
            break Err(e.into());
        }
    };

    input.shutdown().await;
    result
}

async fn console_main(config: &RostrumConfig, session: Option<String>) -> Result<()> {
    let scheduler = build_scheduler(config)?;
    let session = resolve_session(session, config)?;
    let options = UiOptions {
        ascii_only: config.display.ascii_only,
        high_contrast: config.display.high_contrast,
    };
    let mut console = Console::new(scheduler, session.clone(), options)
        .with_context(|| format!("Failed to open session {session}"))?;
    tracing::info!(session = %session, "Console started");

    let result = {
        let mut terminal = TerminalSession::new()?;
        run_console(
            &mut terminal.terminal,
            &mut console,
            config.display.poll_interval(),
        )
        .await
    };
    tracing::info!(session = %session, "Console closed");
    result
}

fn exec_main(config: &RostrumConfig, session: String, line: &str) -> Result<()> {
    let scheduler = build_scheduler(config)?;
    let session = resolve_session(Some(session), config)?;
    let command = Command::parse(line);
    let output = rostrum_core::execute(&scheduler, &session, &command)?;
    let json = match output {
        CommandOutput::Snapshot(snapshot) => serde_json::to_string_pretty(&snapshot)?,
        CommandOutput::Pending(entries) => serde_json::to_string_pretty(&entries)?,
        CommandOutput::Turns(turns) => serde_json::to_string_pretty(&turns)?,
    };
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let config = match RostrumConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            eprintln!("Ignoring config: {err}");
            RostrumConfig::default()
        }
    };

    match cli.command {
        None => console_main(&config, cli.session).await,
        Some(Commands::Console { session }) => console_main(&config, session).await,
        Some(Commands::Exec { session, command }) => {
            exec_main(&config, session, &command.join(" "))
        }
        Some(Commands::SetBudget { seconds }) => {
            RostrumConfig::persist_default_budget(seconds)
                .context("Failed to save default budget")?;
            println!("Default budget set to {seconds} seconds");
            Ok(())
        }
    }
}
