//! [`Host`] implementation for a plain terminal.
//!
//! Menus, candidate lists and status messages go to stderr. Text that
//! replaces a selection is the only thing printed to stdout, so
//! `bookfind find --selection ...` can sit in an editor filter pipeline.

use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;

use bookfind_core::action::ActionEntry;
use bookfind_core::launch;
use bookfind_core::{Host, LibraryError, Window};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::terminal;

use crate::output::{self, ColorMode};

pub struct TerminalHost {
    editor: Vec<String>,
    selection: Option<String>,
    color: ColorMode,
}

impl TerminalHost {
    pub fn new(editor: Vec<String>, selection: Option<String>, color: ColorMode) -> Self {
        Self {
            editor,
            selection,
            color,
        }
    }

    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line),
        }
    }
}

impl Host for TerminalHost {
    fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    fn insert_text(&mut self, text: &str) {
        let mut out = std::io::stdout();
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
        self.selection = None;
    }

    fn copy_to_clipboard(&mut self, text: &str) {
        // Write directly to the terminal; most emulators (and tmux with
        // set-clipboard on) pick this up. A piped stdout must stay clean.
        let stdout = std::io::stdout();
        let to_stdout = stdout.is_terminal();
        send_osc52(&mut stdout.lock(), &mut std::io::stderr(), to_stdout, text);
    }

    fn open_file(&mut self, path: &Path, window: Window) -> Result<(), LibraryError> {
        match window {
            Window::Current => launch::run_foreground(&self.editor, path),
            Window::Other if std::env::var_os("TMUX").is_some() => {
                launch::run_foreground(&tmux_split_command(&self.editor), path)
            }
            Window::Other => {
                tracing::debug!("not inside tmux, opening in the current window");
                launch::run_foreground(&self.editor, path)
            }
        }
    }

    fn launch_viewer(&mut self, opener: Option<&[String]>, path: &Path) -> Result<(), LibraryError> {
        launch::view(opener, path)
    }

    fn choose(&mut self, prompt: &str, candidates: &[String]) -> Option<usize> {
        let mut err = std::io::stderr();
        let _ = output::print_candidates(&mut err, prompt, candidates, self.color);
        let _ = write!(err, "number (empty to cancel): ");
        let _ = err.flush();

        let line = self.read_line()?;
        parse_choice(&line, candidates.len())
    }

    fn read_key(&mut self, prompt: &str, entries: &[ActionEntry]) -> Option<char> {
        let mut err = std::io::stderr();
        let _ = output::print_menu(&mut err, prompt, entries, self.color);
        let _ = err.flush();

        if std::io::stdin().is_terminal() {
            read_raw_key()
        } else {
            self.read_line().and_then(|line| first_key(&line))
        }
    }

    fn message(&mut self, text: &str) {
        let _ = output::print_message(&mut std::io::stderr(), text, self.color);
    }
}

/// Read one key press without waiting for Enter. Esc and Ctrl-C cancel.
fn read_raw_key() -> Option<char> {
    if let Err(e) = terminal::enable_raw_mode() {
        tracing::warn!(error = %e, "could not enter raw mode");
        return None;
    }

    let key = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break None,
                KeyCode::Char(c) => break Some(c),
                _ => break None,
            },
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!(error = %e, "reading key failed");
                break None;
            }
        }
    };

    let _ = terminal::disable_raw_mode();
    key
}

/// Emit the clipboard sequence on stdout only when it is a terminal.
fn send_osc52(out: &mut dyn Write, err: &mut dyn Write, to_stdout: bool, text: &str) {
    let sequence = osc52_sequence(text);
    if to_stdout {
        write_flushed(out, &sequence);
    } else {
        write_flushed(err, &sequence);
    }
}

fn write_flushed(w: &mut dyn Write, text: &str) {
    let _ = w.write_all(text.as_bytes());
    let _ = w.flush();
}

/// OSC 52 "set clipboard" escape sequence.
pub fn osc52_sequence(text: &str) -> String {
    use base64::Engine;
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}

/// 1-based menu number to a 0-based index.
pub fn parse_choice(line: &str, count: usize) -> Option<usize> {
    let n: usize = line.trim().parse().ok()?;
    (1..=count).contains(&n).then(|| n - 1)
}

/// First non-blank character of a line-mode answer.
pub fn first_key(line: &str) -> Option<char> {
    line.trim().chars().next()
}

/// Editor command wrapped so tmux opens it in a new pane.
pub fn tmux_split_command(editor: &[String]) -> Vec<String> {
    let mut command = vec!["tmux".to_string(), "split-window".to_string()];
    command.extend(editor.iter().cloned());
    command
}
