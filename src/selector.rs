//! The interactive track selector.
//!
//! A blocking, single-shot prompt: it renders a titled list of options,
//! moves a highlighted cursor with the arrow keys, and resolves to the
//! chosen option's index on enter. Esc or Ctrl-C terminates the whole
//! process, that is the deliberate user-escape path, not an error.

use crate::error::Result;
use crossterm::cursor::MoveUp;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use futures_util::StreamExt;
use log::debug;
use std::io::{Stdout, Write, stdout};

const MARKER: &str = " ---> ";
const PADDING: &str = "      ";

/// A keypress, reduced to what the selector cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKey {
    Up,
    Down,
    Confirm,
    Interrupt,
    Other,
}

/// The outcome of feeding one keypress to the selector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    /// The cursor moved, the list must be redrawn.
    Moved,
    /// Nothing changed, no redraw.
    Ignored,
    /// The selection was confirmed with the given index.
    Done(usize),
    /// The user asked to abandon the whole process.
    Exit,
}

fn classify(event: &KeyEvent) -> SelectorKey {
    if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
        return SelectorKey::Interrupt;
    }
    match event.code {
        KeyCode::Up => SelectorKey::Up,
        KeyCode::Down => SelectorKey::Down,
        KeyCode::Enter => SelectorKey::Confirm,
        KeyCode::Esc => SelectorKey::Interrupt,
        _ => SelectorKey::Other,
    }
}

/// Restores the normal terminal input mode when dropped, so the prompt can
/// never leave the terminal in raw mode behind it.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// A single-shot interactive list prompt.
pub struct TrackSelector {
    title: String,
    options: Vec<String>,
    cursor: usize,
}

impl TrackSelector {
    /// Creates a selector over the given options. Callers always supply at
    /// least one entry (the `0: None` sentinel).
    pub fn new(title: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            title: title.into(),
            options,
            cursor: 0,
        }
    }

    fn apply(&mut self, key: SelectorKey) -> Transition {
        match key {
            SelectorKey::Down => {
                if self.cursor + 1 < self.options.len() {
                    self.cursor += 1;
                    Transition::Moved
                } else {
                    Transition::Ignored
                }
            }
            SelectorKey::Up => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    Transition::Moved
                } else {
                    Transition::Ignored
                }
            }
            SelectorKey::Confirm => Transition::Done(self.cursor),
            SelectorKey::Interrupt => Transition::Exit,
            SelectorKey::Other => Transition::Ignored,
        }
    }

    fn render(&self, out: &mut Stdout) -> std::io::Result<()> {
        // Raw mode needs explicit carriage returns.
        write!(out, "{}\r\n", self.title)?;
        for (index, option) in self.options.iter().enumerate() {
            let prefix = if index == self.cursor { MARKER } else { PADDING };
            write!(out, "{}{}\r\n", prefix, option)?;
        }
        out.flush()
    }

    fn redraw(&self, out: &mut Stdout) -> std::io::Result<()> {
        execute!(
            out,
            MoveUp(self.options.len() as u16 + 1),
            Clear(ClearType::FromCursorDown)
        )?;
        self.render(out)
    }

    /// Runs the selection session and resolves to the chosen index.
    ///
    /// Switches the terminal into raw mode for the duration of the call and
    /// restores it before returning. One session per construction.
    ///
    /// # Errors
    ///
    /// This function will return an error if the terminal mode could not be
    /// switched or the input event stream fails.
    pub async fn run(&mut self) -> Result<usize> {
        debug_assert!(!self.options.is_empty());

        let guard = RawModeGuard::enable()?;
        let mut out = stdout();
        self.render(&mut out)?;

        let mut events = EventStream::new();
        while let Some(event) = events.next().await {
            let Event::Key(key) = event? else { continue };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match self.apply(classify(&key)) {
                Transition::Moved => self.redraw(&mut out)?,
                Transition::Ignored => {}
                Transition::Done(index) => {
                    debug!("selection confirmed at index {}", index);
                    drop(guard);
                    return Ok(index);
                }
                Transition::Exit => {
                    drop(guard);
                    println!("exiting...");
                    std::process::exit(0);
                }
            }
        }

        // The event stream only ends if stdin is gone.
        drop(guard);
        Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "input closed").into())
    }
}
