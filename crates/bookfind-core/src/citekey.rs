//! BibTeX-style citation keys: `<lastname>[etal]<year><titleword>`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::LibraryError;
use crate::record::BookRecord;

/// Title words never used as the key's title component (case-insensitive).
const STOP_WORDS: [&str; 3] = ["the", "on", "a"];

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W").unwrap());
static NON_WORD_TAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\W.*$").unwrap());

/// Build the citation key for a record.
///
/// `Smith, John` / `1999-05-01` / `The Great Escape` gives `smith1999great`;
/// more than one author appends `etal` after the last name.
pub fn citekey(record: &BookRecord) -> Result<String, LibraryError> {
    let authors = record.authors();

    let last_name = authors
        .first()
        .and_then(|first| first.split(',').next())
        .map(|name| NON_WORD.replace_all(name, "").to_lowercase())
        .unwrap_or_default();
    let etal = if authors.len() > 1 { "etal" } else { "" };

    let year: String = record.pub_date.chars().take(4).collect();

    let title_word = first_title_word(&record.title).ok_or_else(|| {
        LibraryError::NoUsableTitleWord {
            title: record.title.clone(),
        }
    })?;
    let title_word = NON_WORD_TAIL.replace(title_word, "").to_lowercase();

    Ok(format!("{last_name}{etal}{year}{title_word}"))
}

fn first_title_word(title: &str) -> Option<&str> {
    title
        .split(' ')
        .filter(|word| !word.is_empty())
        .find(|word| !STOP_WORDS.iter().any(|stop| word.eq_ignore_ascii_case(stop)))
}
