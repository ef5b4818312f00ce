//! Search, query and action dispatch over a local Calibre ebook library.
//!
//! Search strings are parsed into a typed [`SearchCommand`], turned into a
//! [`BookQuery`] and run against the library's `metadata.db` through a
//! [`BookSource`]: either the embedded SQLite engine or an external
//! `sqlite3`-compatible executor whose tab-separated output is parsed back
//! into [`BookRecord`]s. The [`Dispatcher`] then drives the selection list and
//! hotkey menu through a [`Host`], the editor or terminal that owns the UI.

pub mod action;
pub mod citekey;
pub mod config;
pub mod config_file;
pub mod db;
pub mod dispatch;
pub mod host;
pub mod launch;
pub mod link;
pub mod query;
pub mod record;
pub mod search;

use std::path::PathBuf;

use thiserror::Error;

// Re-export for convenience
pub use action::{ActionEntry, ActionId, INFO_MENU, MAIN_MENU};
pub use citekey::citekey;
pub use config::{BackendKind, ConfigOverrides, LibraryConfig};
pub use db::{BookSource, CommandSource, LibraryDatabase, open_source};
pub use dispatch::{Dispatcher, Outcome};
pub use host::{Host, Window};
pub use query::{BookQuery, WhereClause};
pub use record::BookRecord;
pub use search::{SearchCommand, SearchField};

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("nothing found for \"{search}\"")]
    NotFound { search: String },
    #[error("bad search syntax: unknown command '{command}:' in \"{input}\" (use a: or t:)")]
    BadSearchSyntax { command: char, input: String },
    #[error("file does not exist: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("malformed result row: expected {expected} columns, found {found}: {line:?}")]
    MalformedRow {
        expected: usize,
        found: usize,
        line: String,
    },
    #[error("no usable title word for a citation key in \"{title}\"")]
    NoUsableTitleWord { title: String },
    #[error("not a {scheme}: link: {uri}")]
    BadLink { scheme: &'static str, uri: String },
    #[error("library database not found at {}", .0.display())]
    MissingDatabase(PathBuf),
    #[error("query command failed ({status}): {stderr}")]
    QueryCommand { status: String, stderr: String },
    #[error("config error: {0}")]
    Config(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
