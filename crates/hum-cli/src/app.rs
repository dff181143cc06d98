//! Terminal interaction helpers.

use std::io::Write;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Session controls mapped from keypresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Record,
    Play,
    Submit,
    Quit,
}

/// Restores the terminal when the session loop exits.
pub struct RawModeGuard;

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Read single keypresses on a background thread, mapped to session controls.
///
/// Raw mode stays enabled for the lifetime of the returned guard.
pub fn key_events() -> Result<(RawModeGuard, UnboundedReceiver<Key>)> {
    enable_raw_mode()?;
    let (tx, rx) = unbounded_channel();

    std::thread::spawn(move || {
        loop {
            let Ok(ev) = event::read() else { break };
            let Event::Key(key_event) = ev else { continue };
            if key_event.kind != KeyEventKind::Press {
                continue;
            }

            let key = match (key_event.code, key_event.modifiers) {
                (KeyCode::Char('c'), KeyModifiers::CONTROL) => Key::Quit,
                (KeyCode::Char('r' | 'R'), _) => Key::Record,
                (KeyCode::Char('p' | 'P'), _) => Key::Play,
                (KeyCode::Char('u' | 'U'), _) => Key::Submit,
                (KeyCode::Char('q' | 'Q') | KeyCode::Esc, _) => Key::Quit,
                _ => continue,
            };

            if tx.send(key).is_err() || key == Key::Quit {
                break;
            }
        }
    });

    Ok((RawModeGuard, rx))
}

/// Print a line, keeping the cursor at column 0 under raw mode.
pub fn say(text: impl AsRef<str>) {
    let mut stdout = std::io::stdout();
    let _ = write!(stdout, "{}\r\n", text.as_ref());
    let _ = stdout.flush();
}
