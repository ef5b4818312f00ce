//! Resolved, immutable runtime configuration.
//!
//! Built once at startup from CLI overrides, the TOML config file and
//! library discovery, then passed by reference to everything that needs a
//! path or a command.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::LibraryError;
use crate::config_file::ConfigFile;
use crate::record::BookRecord;

/// Calibre's metadata database, relative to the library root.
pub const DATABASE_FILE_NAME: &str = "metadata.db";

pub const DEFAULT_SQL_COMMAND: &str = "sqlite3";

/// How lookups reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// In-process SQLite with bound parameters.
    #[default]
    Embedded,
    /// An external `sqlite3`-compatible executor, one process per query.
    Command,
}

impl FromStr for BackendKind {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedded" | "sqlite" => Ok(BackendKind::Embedded),
            "command" | "sqlite3" | "subprocess" => Ok(BackendKind::Command),
            other => Err(LibraryError::Config(format!(
                "unknown backend \"{other}\" (expected embedded or command)"
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Embedded => f.write_str("embedded"),
            BackendKind::Command => f.write_str("command"),
        }
    }
}

/// Values given on the command line or through the environment.
/// They take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub library_root: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub opener: Option<String>,
    pub editor: Option<String>,
    pub sql_command: Option<String>,
    pub backend: Option<String>,
    pub result_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub library_root: PathBuf,
    pub database_path: PathBuf,
    /// Viewer program plus leading arguments; the file path is appended.
    /// `None` uses the platform's default application.
    pub opener: Option<Vec<String>>,
    /// Program plus leading arguments; the file path is appended.
    pub editor: Vec<String>,
    pub sql_command: String,
    pub backend: BackendKind,
    pub result_limit: Option<u32>,
}

impl LibraryConfig {
    /// Defaults for a library rooted at `library_root`.
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        let library_root = library_root.into();
        Self {
            database_path: library_root.join(DATABASE_FILE_NAME),
            library_root,
            opener: None,
            editor: vec!["vi".to_string()],
            sql_command: DEFAULT_SQL_COMMAND.to_string(),
            backend: BackendKind::Embedded,
            result_limit: None,
        }
    }

    /// Resolve the final configuration: overrides > config file > discovery.
    pub fn resolve(overrides: ConfigOverrides, file: &ConfigFile) -> Result<Self, LibraryError> {
        let library = file.library.clone().unwrap_or_default();
        let commands = file.commands.clone().unwrap_or_default();

        let library_root = overrides
            .library_root
            .or_else(|| library.root.as_deref().map(expand_home))
            .or_else(discover_library_root)
            .ok_or_else(|| {
                LibraryError::Config(
                    "no Calibre library found; pass --library or set BOOKFIND_LIBRARY".to_string(),
                )
            })?;

        let mut config = Self::new(library_root);

        if let Some(path) = overrides
            .database_path
            .or_else(|| library.database.as_deref().map(expand_home))
        {
            config.database_path = path;
        }
        if let Some(opener) = overrides.opener.or(commands.opener) {
            config.opener = Some(split_command(&opener)?);
        }
        if let Some(editor) = overrides.editor.or(commands.editor) {
            config.editor = split_command(&editor)?;
        }
        if let Some(sql_command) = overrides.sql_command.or(commands.sql_command) {
            config.sql_command = sql_command;
        }
        if let Some(backend) = overrides.backend.or(library.backend) {
            config.backend = backend.parse()?;
        }
        config.result_limit = overrides.result_limit.or(library.result_limit);

        tracing::debug!(
            root = %config.library_root.display(),
            database = %config.database_path.display(),
            backend = %config.backend,
            "resolved library config"
        );
        Ok(config)
    }

    /// On-disk location of a record's file under this library.
    pub fn file_path(&self, record: &BookRecord) -> PathBuf {
        record.file_path(&self.library_root)
    }
}

/// Split a configured command line on whitespace.
pub fn split_command(command: &str) -> Result<Vec<String>, LibraryError> {
    let parts: Vec<String> = command.split_whitespace().map(String::from).collect();
    if parts.is_empty() {
        return Err(LibraryError::Config("empty command".to_string()));
    }
    Ok(parts)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}

/// Find the library root: Calibre's own `global.py`, then the usual
/// home-directory locations. The first existing directory wins.
pub fn discover_library_root() -> Option<PathBuf> {
    let from_calibre = dirs::config_dir()
        .map(|d| d.join("calibre").join("global.py"))
        .and_then(|p| std::fs::read_to_string(p).ok())
        .and_then(|content| library_path_from_global_py(&content));

    let found = first_existing_dir(from_calibre.into_iter().chain(candidate_library_roots()));
    if found.is_none() {
        tracing::warn!("no Calibre library found in the default locations");
    }
    found
}

/// Home-directory locations Calibre uses by default across platforms.
pub fn candidate_library_roots() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    vec![
        home.join("Calibre Library"),
        home.join("Documents").join("Calibre Library"),
        home.join("calibre"),
    ]
}

/// Extract `library_path = '...'` from Calibre's `global.py`.
pub fn library_path_from_global_py(content: &str) -> Option<PathBuf> {
    static LIBRARY_PATH: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r#"(?m)^\s*library_path\s*=\s*u?['"]([^'"]+)['"]"#).unwrap()
    });
    LIBRARY_PATH
        .captures(content)
        .map(|caps| PathBuf::from(&caps[1]))
}

fn first_existing_dir(candidates: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    candidates.into_iter().find(|p| Path::new(p).is_dir())
}
