//! Keyboard input for the console.

use anyhow::{Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::console::Console;

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(25); // shutdown responsiveness
const INPUT_CHANNEL_CAPACITY: usize = 1024; // bounded: no OOM
const MAX_EVENTS_PER_FRAME: usize = 64; // never starve rendering

enum InputMsg {
    Event(Event),
    Error(String),
}

/// Reads terminal events on a blocking thread and hands them to the render loop.
pub struct InputPump {
    rx: mpsc::Receiver<InputMsg>,
    stop: Arc<AtomicBool>,
    join: Option<tokio::task::JoinHandle<()>>,
}

impl InputPump {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let stop2 = stop.clone();

        let join = tokio::task::spawn_blocking(move || input_loop(&stop2, &tx));
        Self {
            rx,
            stop,
            join: Some(join),
        }
    }

    pub async fn shutdown(&mut self) {
        // Unblock a sender waiting on capacity before joining.
        self.rx.close();

        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), join).await;
        }
    }
}

impl Default for InputPump {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InputPump {
    fn drop(&mut self) {
        // Do not block in Drop.
        self.rx.close();
        self.stop.store(true, Ordering::Release);
    }
}

fn input_loop(stop: &AtomicBool, tx: &mpsc::Sender<InputMsg>) {
    while !stop.load(Ordering::Acquire) {
        match event::poll(INPUT_POLL_TIMEOUT) {
            Ok(true) => match event::read() {
                Ok(ev) => {
                    if tx.blocking_send(InputMsg::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                    break;
                }
            },
            Ok(false) => {}
            Err(e) => {
                let _ = tx.blocking_send(InputMsg::Error(e.to_string()));
                break;
            }
        }
    }
}

/// Drain pending events into the console. Returns `true` when the console should exit.
pub fn handle_events(console: &mut Console, input: &mut InputPump) -> Result<bool> {
    let mut processed = 0;
    while processed < MAX_EVENTS_PER_FRAME {
        let ev = match input.rx.try_recv() {
            Ok(InputMsg::Event(ev)) => ev,
            Ok(InputMsg::Error(msg)) => return Err(anyhow!("input error: {msg}")),
            Err(mpsc::error::TryRecvError::Empty) => break,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                return Err(anyhow!("input pump disconnected"));
            }
        };
        processed += 1;

        match ev {
            Event::Key(key) => apply_key(console, key),
            Event::Paste(text) => {
                // Command lines are single-line; a pasted newline would submit.
                for c in text.chars().filter(|c| !c.is_control()) {
                    console.insert_char(c);
                }
            }
            Event::Resize(width, height) => debug!(width, height, "terminal resized"),
            _ => {}
        }

        if console.should_quit() {
            return Ok(true);
        }
    }
    Ok(console.should_quit())
}

/// Apply a single key press to the console.
pub fn apply_key(console: &mut Console, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c' | 'd') => console.request_quit(),
            KeyCode::Char('u') => console.clear_input(),
            _ => {}
        }
        return;
    }
    match key.code {
        KeyCode::Char(c) => console.insert_char(c),
        KeyCode::Backspace => console.backspace(),
        KeyCode::Enter => console.submit(),
        KeyCode::Esc => console.clear_input(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::UiOptions;
    use rostrum_core::FloorScheduler;
    use rostrum_types::SessionId;

    fn console() -> Console {
        Console::new(
            Arc::new(FloorScheduler::in_memory()),
            SessionId::new("keys").unwrap(),
            UiOptions::default(),
        )
        .unwrap()
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_and_enter_run_a_command() {
        let mut console = console();
        for c in "admit carol".chars() {
            apply_key(&mut console, press(KeyCode::Char(c)));
        }
        apply_key(&mut console, press(KeyCode::Enter));
        assert_eq!(console.snapshot().pending.len(), 1);
        assert!(console.input().is_empty());
    }

    #[test]
    fn editing_keys() {
        let mut console = console();
        apply_key(&mut console, press(KeyCode::Char('x')));
        apply_key(&mut console, press(KeyCode::Char('y')));
        apply_key(&mut console, press(KeyCode::Backspace));
        assert_eq!(console.input(), "x");
        apply_key(&mut console, press(KeyCode::Esc));
        assert_eq!(console.input(), "");
    }

    #[test]
    fn release_events_are_ignored_and_ctrl_c_quits() {
        let mut console = console();
        let mut release = press(KeyCode::Char('z'));
        release.kind = KeyEventKind::Release;
        apply_key(&mut console, release);
        assert_eq!(console.input(), "");

        apply_key(
            &mut console,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(console.should_quit());
    }
}
