//! In-process SQLite access to Calibre's `metadata.db`.

use std::path::Path;

use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row, params_from_iter};

use super::BookSource;
use crate::LibraryError;
use crate::query::{BookQuery, COLUMN_COUNT};
use crate::record::BookRecord;

/// Handle to an opened library database.
pub struct LibraryDatabase {
    conn: Connection,
}

impl LibraryDatabase {
    /// Open an existing library database read-only.
    ///
    /// Verifies that the `books` and `data` tables exist.
    pub fn open(path: &Path) -> Result<Self, LibraryError> {
        if !path.is_file() {
            return Err(LibraryError::MissingDatabase(path.to_path_buf()));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        tracing::debug!(path = %path.display(), "opened library database");
        Self::from_connection(conn, path)
    }

    /// Wrap an already opened connection (tests, in-memory fixtures).
    ///
    /// Replaces SQLite's ASCII-only `lower()` with full Unicode lowercasing
    /// so searches on accented names match.
    pub fn from_connection(conn: Connection, path: &Path) -> Result<Self, LibraryError> {
        let tables: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('books', 'data')",
            [],
            |row| row.get(0),
        )?;

        if tables != 2 {
            return Err(LibraryError::Config(format!(
                "{} is not a Calibre library database (missing books/data tables)",
                path.display()
            )));
        }

        register_unicode_lower(&conn)?;
        Ok(Self { conn })
    }
}

fn register_unicode_lower(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            Ok(match ctx.get_raw(0) {
                ValueRef::Null => None,
                value => Some(value_text(value).to_lowercase()),
            })
        },
    )
}

impl BookSource for LibraryDatabase {
    fn name(&self) -> &str {
        "embedded"
    }

    fn fetch(&self, query: &BookQuery) -> Result<Vec<BookRecord>, LibraryError> {
        let sql = query.sql();
        tracing::debug!(%sql, params = ?query.params(), "running embedded query");

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(query.params()), read_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<BookRecord> {
    let mut columns: [String; COLUMN_COUNT] = Default::default();
    for (index, column) in columns.iter_mut().enumerate() {
        *column = column_text(row, index)?;
    }
    Ok(BookRecord::from_columns(columns))
}

/// Render any column as text, the way the `sqlite3` shell prints it.
fn column_text(row: &Row<'_>, index: usize) -> rusqlite::Result<String> {
    Ok(value_text(row.get_ref(index)?))
}

fn value_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    }
}
