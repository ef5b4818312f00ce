//! Query backends: the embedded SQLite engine and an external executor.

mod command;
mod sqlite;

pub use command::CommandSource;
pub use sqlite::LibraryDatabase;

use crate::LibraryError;
use crate::config::{BackendKind, LibraryConfig};
use crate::query::BookQuery;
use crate::record::BookRecord;

/// Something that can run a [`BookQuery`] against the library database.
pub trait BookSource {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Run the query and return one record per matching book file.
    fn fetch(&self, query: &BookQuery) -> Result<Vec<BookRecord>, LibraryError>;
}

/// Open the backend selected by `config`.
pub fn open_source(config: &LibraryConfig) -> Result<Box<dyn BookSource>, LibraryError> {
    match config.backend {
        BackendKind::Embedded => Ok(Box::new(LibraryDatabase::open(&config.database_path)?)),
        BackendKind::Command => Ok(Box::new(CommandSource::new(
            &config.sql_command,
            &config.database_path,
        )?)),
    }
}
