//! `calibre:<title>` links, as stored in notes and resolved back to a book.

use crate::LibraryError;
use crate::record::BookRecord;
use crate::search::SearchCommand;

pub const LINK_SCHEME: &str = "calibre";

/// The link text for a record.
pub fn link_for(record: &BookRecord) -> String {
    format!("{LINK_SCHEME}:{}", record.title)
}

/// Turn a `calibre:<title>` link into a title search.
pub fn parse_link(uri: &str) -> Result<SearchCommand, LibraryError> {
    let uri = uri.trim();
    let title = uri
        .strip_prefix(LINK_SCHEME)
        .and_then(|rest| rest.strip_prefix(':'))
        .ok_or_else(|| LibraryError::BadLink {
            scheme: LINK_SCHEME,
            uri: uri.to_string(),
        })?;
    Ok(SearchCommand::ByTitle(title.trim().to_lowercase()))
}

/// Plain-text rendering of a link for export. Only the description (or the
/// title when there is none) is kept.
pub fn export_link(title: &str, description: Option<&str>) -> String {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{description} (calibre: {title})"),
        None => format!("calibre: {title}"),
    }
}
