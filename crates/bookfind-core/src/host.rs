//! The UI the dispatcher drives: an editor integration or a terminal.

use std::path::Path;

use crate::LibraryError;
use crate::action::ActionEntry;

/// Where an opened file should appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Current,
    Other,
}

/// UI primitives supplied by whoever embeds the dispatcher.
pub trait Host {
    /// Whether the user has an active text selection. Text actions replace
    /// the selection when there is one and copy to the clipboard otherwise.
    fn has_selection(&self) -> bool;

    /// Insert text at the cursor, replacing the active selection.
    fn insert_text(&mut self, text: &str);

    fn copy_to_clipboard(&mut self, text: &str);

    /// Open a file for editing/reading inside the host.
    fn open_file(&mut self, path: &Path, window: Window) -> Result<(), LibraryError>;

    /// Hand a file to an external viewer, without waiting for it. `None`
    /// means the platform's default application.
    fn launch_viewer(&mut self, opener: Option<&[String]>, path: &Path)
    -> Result<(), LibraryError>;

    /// Let the user pick one of several candidates. `None` means cancelled.
    fn choose(&mut self, prompt: &str, candidates: &[String]) -> Option<usize>;

    /// Show a hotkey menu and read a single key. `None` means cancelled.
    fn read_key(&mut self, prompt: &str, entries: &[ActionEntry]) -> Option<char>;

    /// A short status message for the user.
    fn message(&mut self, text: &str);
}
