use std::io::Write;
use std::path::PathBuf;

use bookfind_core::action::menu_text;
use bookfind_core::{ActionEntry, LibraryConfig, LibraryError};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print one matching file path per line.
pub fn print_paths(w: &mut dyn Write, paths: &[PathBuf]) -> std::io::Result<()> {
    for path in paths {
        writeln!(w, "{}", path.display())?;
    }
    Ok(())
}

/// Print a hotkey menu under its heading.
pub fn print_menu(
    w: &mut dyn Write,
    heading: &str,
    entries: &[ActionEntry],
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", heading.bold())?;
        for line in menu_text(entries).lines() {
            writeln!(w, "  {}", line.cyan())?;
        }
    } else {
        writeln!(w, "{heading}")?;
        for line in menu_text(entries).lines() {
            writeln!(w, "  {line}")?;
        }
    }
    Ok(())
}

/// Print numbered candidates, starting at 1.
pub fn print_candidates(
    w: &mut dyn Write,
    prompt: &str,
    candidates: &[String],
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", prompt.bold())?;
    } else {
        writeln!(w, "{prompt}")?;
    }
    let width = candidates.len().to_string().len();
    for (i, candidate) in candidates.iter().enumerate() {
        if color.enabled() {
            writeln!(w, "  {:>width$}  {}", (i + 1).yellow(), candidate)?;
        } else {
            writeln!(w, "  {:>width$}  {}", i + 1, candidate)?;
        }
    }
    Ok(())
}

pub fn print_message(w: &mut dyn Write, text: &str, color: ColorMode) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{}", text.dimmed())
    } else {
        writeln!(w, "{text}")
    }
}

/// Report a failed operation. "Nothing found" is a warning, not an error.
pub fn print_error(w: &mut dyn Write, error: &anyhow::Error, color: ColorMode) -> std::io::Result<()> {
    let not_found = matches!(
        error.downcast_ref::<LibraryError>(),
        Some(LibraryError::NotFound { .. })
    );
    let label = if not_found { "not found:" } else { "error:" };
    let text = if not_found {
        error.to_string()
    } else {
        format!("{error:#}")
    };

    if color.enabled() {
        if not_found {
            writeln!(w, "{} {}", label.yellow().bold(), text)
        } else {
            writeln!(w, "{} {}", label.red().bold(), text)
        }
    } else {
        writeln!(w, "{label} {text}")
    }
}

/// Print the resolved configuration.
pub fn print_config(w: &mut dyn Write, config: &LibraryConfig, color: ColorMode) -> std::io::Result<()> {
    let rows = [
        ("library", config.library_root.display().to_string()),
        ("database", config.database_path.display().to_string()),
        ("backend", config.backend.to_string()),
        ("sql command", config.sql_command.clone()),
        (
            "opener",
            config
                .opener
                .as_ref()
                .map_or_else(|| "system default".to_string(), |o| o.join(" ")),
        ),
        ("editor", config.editor.join(" ")),
        (
            "limit",
            config
                .result_limit
                .map_or_else(|| "none".to_string(), |l| l.to_string()),
        ),
    ];
    for (key, value) in rows {
        if color.enabled() {
            writeln!(w, "{:<12} {}", key.bold(), value)?;
        } else {
            writeln!(w, "{key:<12} {value}")?;
        }
    }
    let db_state = if config.database_path.is_file() {
        "present"
    } else {
        "missing"
    };
    writeln!(w, "{:<12} {}", "db file", db_state)?;
    Ok(())
}
