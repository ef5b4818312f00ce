use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub library: Option<LibrarySection>,
    pub commands: Option<CommandsSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibrarySection {
    pub root: Option<String>,
    pub database: Option<String>,
    /// `embedded` or `command`.
    pub backend: Option<String>,
    pub result_limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandsSection {
    pub opener: Option<String>,
    pub editor: Option<String>,
    pub sql_command: Option<String>,
}

/// Platform config directory path: `<config_dir>/bookfind/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("bookfind").join("config.toml"))
}

/// Load config by cascading CWD `.bookfind.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".bookfind.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        library: Some(LibrarySection {
            root: overlay
                .library
                .as_ref()
                .and_then(|l| l.root.clone())
                .or_else(|| base.library.as_ref().and_then(|l| l.root.clone())),
            database: overlay
                .library
                .as_ref()
                .and_then(|l| l.database.clone())
                .or_else(|| base.library.as_ref().and_then(|l| l.database.clone())),
            backend: overlay
                .library
                .as_ref()
                .and_then(|l| l.backend.clone())
                .or_else(|| base.library.as_ref().and_then(|l| l.backend.clone())),
            result_limit: overlay
                .library
                .as_ref()
                .and_then(|l| l.result_limit)
                .or_else(|| base.library.as_ref().and_then(|l| l.result_limit)),
        }),
        commands: Some(CommandsSection {
            opener: overlay
                .commands
                .as_ref()
                .and_then(|c| c.opener.clone())
                .or_else(|| base.commands.as_ref().and_then(|c| c.opener.clone())),
            editor: overlay
                .commands
                .as_ref()
                .and_then(|c| c.editor.clone())
                .or_else(|| base.commands.as_ref().and_then(|c| c.editor.clone())),
            sql_command: overlay
                .commands
                .as_ref()
                .and_then(|c| c.sql_command.clone())
                .or_else(|| {
                    base.commands
                        .as_ref()
                        .and_then(|c| c.sql_command.clone())
                }),
        }),
    }
}
