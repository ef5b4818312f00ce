use std::path::Path;
use std::process::{Command, Stdio};

use crate::LibraryError;

/// Show `path` in a viewer without waiting: the configured opener when there
/// is one, otherwise the platform's default application.
pub fn view(opener: Option<&[String]>, path: &Path) -> Result<(), LibraryError> {
    match opener {
        Some(command) => spawn_detached(command, path),
        None => {
            open::that_detached(path)?;
            tracing::info!(path = %path.display(), "opened with the default application");
            Ok(())
        }
    }
}

/// Spawn `command path` detached from our stdio and return immediately.
///
/// The child is not waited on.
pub fn spawn_detached(command: &[String], path: &Path) -> Result<(), LibraryError> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| LibraryError::Config("empty opener command".to_string()))?;

    let child = Command::new(program)
        .args(args)
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    tracing::info!(program = %program, pid = child.id(), path = %path.display(), "launched viewer");
    Ok(())
}

/// Run `command path` in the foreground and wait for it to exit.
pub fn run_foreground(command: &[String], path: &Path) -> Result<(), LibraryError> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| LibraryError::Config("empty editor command".to_string()))?;

    let status = Command::new(program).args(args).arg(path).status()?;
    if !status.success() {
        tracing::warn!(program = %program, %status, "editor exited unsuccessfully");
    }
    Ok(())
}
