//! Book records and the tab-separated row parser.

use std::path::{Path, PathBuf};

use crate::LibraryError;
use crate::query::COLUMN_COUNT;

/// One book file as returned by a lookup.
///
/// A book with several formats yields one record per format. The on-disk
/// location is never stored; see [`BookRecord::file_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookRecord {
    pub id: String,
    /// "Last, First", several authors joined by `&`.
    pub author_sort: String,
    /// Directory relative to the library root.
    pub book_dir: String,
    /// File name without extension.
    pub book_name: String,
    /// Lowercase file extension.
    pub book_format: String,
    pub pub_date: String,
    pub title: String,
}

impl BookRecord {
    /// Build a record from the seven selected columns, in query order.
    pub fn from_columns(columns: [String; COLUMN_COUNT]) -> Self {
        let [id, author_sort, book_dir, book_name, book_format, pub_date, title] = columns;
        Self {
            id,
            author_sort,
            book_dir,
            book_name,
            book_format: book_format.to_lowercase(),
            pub_date,
            title,
        }
    }

    /// Parse one tab-separated result line.
    ///
    /// Fails with [`LibraryError::MalformedRow`] unless the line has exactly
    /// seven fields.
    pub fn parse_row(line: &str) -> Result<Self, LibraryError> {
        let line = line.trim_end_matches(['\r', '\n']);
        let fields: Vec<&str> = line.split('\t').collect();

        let columns: [&str; COLUMN_COUNT] =
            fields
                .as_slice()
                .try_into()
                .map_err(|_| LibraryError::MalformedRow {
                    expected: COLUMN_COUNT,
                    found: fields.len(),
                    line: line.to_string(),
                })?;

        Ok(Self::from_columns(columns.map(str::to_string)))
    }

    /// Absolute path of the book file under `root`.
    pub fn file_path(&self, root: &Path) -> PathBuf {
        root.join(&self.book_dir)
            .join(format!("{}.{}", self.book_name, self.book_format))
    }

    /// Individual authors in sort form, in library order.
    pub fn authors(&self) -> Vec<&str> {
        self.author_sort
            .split('&')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .collect()
    }

    /// Candidate line for the selection list: `(id) [format] author -- title`.
    pub fn display_line(&self) -> String {
        format!(
            "({}) [{}] {} -- {}",
            self.id, self.book_format, self.author_sort, self.title
        )
    }

    /// A search string that finds this book again by title.
    pub fn search_string(&self) -> String {
        format!("t:{}", self.title)
    }
}

/// Parse multi-line executor output, skipping blank lines.
pub fn parse_rows(output: &str) -> Result<Vec<BookRecord>, LibraryError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(BookRecord::parse_row)
        .collect()
}
