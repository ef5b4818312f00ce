//! Compact search grammar: `a:<author>`, `t:<title>` or a bare pattern.

use std::fmt;
use std::str::FromStr;

use crate::LibraryError;

/// A column a search pattern can be matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Author,
    Title,
}

impl SearchField {
    /// Column name in the `books` table.
    pub fn column(self) -> &'static str {
        match self {
            SearchField::Author => "author_sort",
            SearchField::Title => "title",
        }
    }
}

/// A parsed search string. Patterns are stored lowercased and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCommand {
    ByAuthor(String),
    ByTitle(String),
    /// Matched against author and title, either one may hit.
    Combined(String),
}

impl SearchCommand {
    /// Parse a search string.
    ///
    /// The input is split on its first `:`. When the part before it is a
    /// single character it names the field to search (`a` for author, `t`
    /// for title, case-insensitive); any other letter is rejected with
    /// [`LibraryError::BadSearchSyntax`]. Everything else, including the
    /// empty string, becomes a [`SearchCommand::Combined`] pattern.
    pub fn parse(input: &str) -> Result<Self, LibraryError> {
        let input = input.trim();

        if let Some((head, rest)) = input.split_once(':') {
            let mut chars = head.chars();
            if let (Some(command), None) = (chars.next(), chars.next()) {
                let pattern = normalize_pattern(rest);
                return match command.to_ascii_lowercase() {
                    'a' => Ok(SearchCommand::ByAuthor(pattern)),
                    't' => Ok(SearchCommand::ByTitle(pattern)),
                    _ => Err(LibraryError::BadSearchSyntax {
                        command,
                        input: input.to_string(),
                    }),
                };
            }
        }

        Ok(SearchCommand::Combined(normalize_pattern(input)))
    }

    pub fn pattern(&self) -> &str {
        match self {
            SearchCommand::ByAuthor(p) | SearchCommand::ByTitle(p) | SearchCommand::Combined(p) => p,
        }
    }

    /// Fields the pattern is tested against, in clause order.
    pub fn fields(&self) -> &'static [SearchField] {
        match self {
            SearchCommand::ByAuthor(_) => &[SearchField::Author],
            SearchCommand::ByTitle(_) => &[SearchField::Title],
            SearchCommand::Combined(_) => &[SearchField::Author, SearchField::Title],
        }
    }
}

impl FromStr for SearchCommand {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchCommand::parse(s)
    }
}

impl fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCommand::ByAuthor(p) => write!(f, "a:{p}"),
            SearchCommand::ByTitle(p) => write!(f, "t:{p}"),
            SearchCommand::Combined(p) => f.write_str(p),
        }
    }
}

fn normalize_pattern(raw: &str) -> String {
    raw.trim().to_lowercase()
}
