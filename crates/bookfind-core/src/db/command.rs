//! Queries through an external `sqlite3`-compatible executor.
//!
//! The statement is passed as a single argument (no shell involved) and the
//! tab-separated output is handed to the row parser. Rows are then filtered
//! again with Unicode case folding, which the executor lacks.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::BookSource;
use crate::LibraryError;
use crate::query::BookQuery;
use crate::record::{BookRecord, parse_rows};

pub struct CommandSource {
    program: String,
    database: PathBuf,
}

impl CommandSource {
    pub fn new(program: &str, database: &Path) -> Result<Self, LibraryError> {
        if program.trim().is_empty() {
            return Err(LibraryError::Config("empty SQL command".to_string()));
        }
        if !database.is_file() {
            return Err(LibraryError::MissingDatabase(database.to_path_buf()));
        }
        Ok(Self {
            program: program.trim().to_string(),
            database: database.to_path_buf(),
        })
    }

    /// Argument vector for one query, without the program name.
    pub fn args(&self, query: &BookQuery) -> Vec<String> {
        vec![
            "-readonly".to_string(),
            "-noheader".to_string(),
            "-separator".to_string(),
            "\t".to_string(),
            self.database.display().to_string(),
            query.literal_sql(),
        ]
    }
}

impl BookSource for CommandSource {
    fn name(&self) -> &str {
        &self.program
    }

    fn fetch(&self, query: &BookQuery) -> Result<Vec<BookRecord>, LibraryError> {
        let args = self.args(query);
        let sql = args.last().map(String::as_str).unwrap_or_default();
        tracing::debug!(program = %self.program, %sql, "running query command");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()?;

        if !output.status.success() {
            return Err(LibraryError::QueryCommand {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let mut records = parse_rows(&String::from_utf8_lossy(&output.stdout))?;
        records.retain(|record| query.matches(record));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchCommand;

    #[test]
    fn test_args_carry_literal_statement() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("metadata.db");
        std::fs::write(&db, b"").unwrap();

        let source = CommandSource::new("sqlite3", &db).unwrap();
        let query = BookQuery::for_search(&SearchCommand::parse("a:orwell").unwrap());
        let args = source.args(&query);

        assert_eq!(args[0], "-readonly");
        assert_eq!(args[1], "-noheader");
        assert_eq!(args[2], "-separator");
        assert_eq!(args[3], "\t");
        assert_eq!(args[4], db.display().to_string());
        assert!(args[5].ends_with("WHERE lower(author_sort) LIKE '%orwell%'"));
    }

    #[test]
    fn test_missing_database_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CommandSource::new("sqlite3", &dir.path().join("nope.db")),
            Err(LibraryError::MissingDatabase(_))
        ));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("metadata.db");
        std::fs::write(&db, b"").unwrap();

        let source = CommandSource::new("bookfind-no-such-sqlite3-binary", &db).unwrap();
        let query = BookQuery::for_search(&SearchCommand::parse("x").unwrap());
        assert!(matches!(source.fetch(&query), Err(LibraryError::Io(_))));
    }
}
