//! SQL construction for book lookups.
//!
//! The selected columns are position-addressed by [`crate::record`]; keep
//! [`SELECT_COLUMNS`] and [`COLUMN_COUNT`] in step with `BookRecord::from_columns`.

use crate::record::BookRecord;
use crate::search::{SearchCommand, SearchField};

/// Columns selected for every lookup, in the order the row parser expects.
///
/// `id` is qualified because both `data` and `books` carry an `id` column.
pub const SELECT_COLUMNS: &str = "books.id, author_sort, path, name, format, pubdate, title";

/// Number of columns in [`SELECT_COLUMNS`].
pub const COLUMN_COUNT: usize = 7;

const FROM_CLAUSE: &str = "FROM data LEFT OUTER JOIN books ON data.book = books.id";

/// A WHERE clause with `?N` placeholders and the values bound to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    sql: String,
    params: Vec<String>,
}

impl WhereClause {
    /// Build the clause for a parsed search.
    ///
    /// Every field of the command is tested with `lower(<column>) LIKE ?1`,
    /// ORed together, against `%<pattern>%`. The pattern is already
    /// lowercased by the parser, so the match is case-insensitive.
    pub fn for_search(command: &SearchCommand) -> Self {
        let tests: Vec<String> = command
            .fields()
            .iter()
            .map(|field| format!("lower({}) LIKE ?1", field.column()))
            .collect();

        Self {
            sql: format!("WHERE {}", tests.join(" OR ")),
            params: vec![format!("%{}%", command.pattern())],
        }
    }

    /// A caller-supplied condition, passed through verbatim.
    ///
    /// A leading `WHERE` keyword is optional.
    pub fn raw(condition: &str) -> Self {
        let condition = condition.trim();
        let sql = if condition.is_empty() {
            String::new()
        } else if starts_with_where(condition) {
            condition.to_string()
        } else {
            format!("WHERE {condition}")
        };
        Self {
            sql,
            params: Vec::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// `WHERE` keyword followed by whitespace or an opening parenthesis.
fn starts_with_where(condition: &str) -> bool {
    condition
        .get(..5)
        .is_some_and(|head| head.eq_ignore_ascii_case("where"))
        && condition[5..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace() || c == '(')
}

/// A complete lookup: WHERE clause plus an optional row limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    where_clause: WhereClause,
    limit: Option<u32>,
    search: Option<SearchCommand>,
}

impl BookQuery {
    pub fn new(where_clause: WhereClause) -> Self {
        Self {
            where_clause,
            limit: None,
            search: None,
        }
    }

    pub fn for_search(command: &SearchCommand) -> Self {
        Self {
            search: Some(command.clone()),
            ..Self::new(WhereClause::for_search(command))
        }
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn where_clause(&self) -> &WhereClause {
        &self.where_clause
    }

    pub fn params(&self) -> &[String] {
        self.where_clause.params()
    }

    /// Parameterized statement text for the embedded engine.
    pub fn sql(&self) -> String {
        build_default_query(self.where_clause.sql(), self.limit)
    }

    /// Statement text with every parameter inlined as a quoted SQL literal.
    ///
    /// Used when the statement has to cross a process boundary as a single
    /// argument. Single quotes inside values are doubled. An external engine
    /// only folds ASCII case, so every non-ASCII character of a value
    /// becomes the `_` wildcard; [`BookQuery::matches`] narrows the rows
    /// back down afterwards.
    pub fn literal_sql(&self) -> String {
        let mut where_sql = self.where_clause.sql().to_string();
        // Highest index first so `?1` never clobbers the prefix of `?10`.
        for (index, value) in self.where_clause.params().iter().enumerate().rev() {
            let placeholder = format!("?{}", index + 1);
            where_sql = where_sql.replace(&placeholder, &quote_literal(&ascii_pattern(value)));
        }
        build_default_query(&where_sql, self.limit)
    }

    /// Whether a fetched record satisfies the search with full Unicode case
    /// folding. Always true for raw WHERE conditions.
    pub fn matches(&self, record: &BookRecord) -> bool {
        let Some(command) = &self.search else {
            return true;
        };
        let pattern = format!("%{}%", command.pattern());
        command.fields().iter().any(|field| {
            let value = match field {
                SearchField::Author => &record.author_sort,
                SearchField::Title => &record.title,
            };
            like_matches(&pattern, &value.to_lowercase())
        })
    }
}

fn ascii_pattern(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect()
}

/// SQL `LIKE` semantics over characters: `%` is any run, `_` any one.
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    like_chars(&pattern, &text)
}

fn like_chars(pattern: &[char], text: &[char]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some(('%', rest)) => (0..=text.len()).any(|skip| like_chars(rest, &text[skip..])),
        Some(('_', rest)) => !text.is_empty() && like_chars(rest, &text[1..]),
        Some((c, rest)) => text.first() == Some(c) && like_chars(rest, &text[1..]),
    }
}

/// Assemble the full SELECT around a WHERE clause.
pub fn build_default_query(where_clause: &str, limit: Option<u32>) -> String {
    let mut sql = format!("SELECT {SELECT_COLUMNS} {FROM_CLAUSE}");
    if !where_clause.is_empty() {
        sql.push(' ');
        sql.push_str(where_clause);
    }
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    sql
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_clause_tests_only_author_sort() {
        let clause = WhereClause::for_search(&SearchCommand::parse("a:Asimov").unwrap());
        assert_eq!(clause.sql(), "WHERE lower(author_sort) LIKE ?1");
        assert_eq!(clause.params(), &["%asimov%".to_string()]);
    }

    #[test]
    fn test_title_clause_tests_only_title() {
        let clause = WhereClause::for_search(&SearchCommand::parse("t:Foundation").unwrap());
        assert_eq!(clause.sql(), "WHERE lower(title) LIKE ?1");
        assert_eq!(clause.params(), &["%foundation%".to_string()]);
    }

    #[test]
    fn test_combined_clause_ors_both_fields() {
        let clause = WhereClause::for_search(&SearchCommand::parse("Robot").unwrap());
        assert_eq!(
            clause.sql(),
            "WHERE lower(author_sort) LIKE ?1 OR lower(title) LIKE ?1"
        );
        assert_eq!(clause.params(), &["%robot%".to_string()]);
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let clause = WhereClause::for_search(&SearchCommand::parse("").unwrap());
        assert_eq!(clause.params(), &["%%".to_string()]);
    }

    #[test]
    fn test_full_query_shape() {
        let query = BookQuery::for_search(&SearchCommand::parse("t:dune").unwrap())
            .with_limit(Some(5));
        assert_eq!(
            query.sql(),
            "SELECT books.id, author_sort, path, name, format, pubdate, title \
             FROM data LEFT OUTER JOIN books ON data.book = books.id \
             WHERE lower(title) LIKE ?1 LIMIT 5"
        );
    }

    #[test]
    fn test_literal_sql_quotes_and_escapes() {
        let query = BookQuery::for_search(&SearchCommand::parse("t:Hitchhiker's").unwrap());
        assert!(
            query
                .literal_sql()
                .ends_with("WHERE lower(title) LIKE '%hitchhiker''s%'")
        );
    }

    #[test]
    fn test_literal_sql_replaces_repeated_placeholder() {
        let query = BookQuery::for_search(&SearchCommand::parse("wells").unwrap());
        let sql = query.literal_sql();
        assert!(!sql.contains("?1"));
        assert_eq!(sql.matches("'%wells%'").count(), 2);
    }

    #[test]
    fn test_raw_clause_adds_where_keyword() {
        assert_eq!(WhereClause::raw("books.id = 3").sql(), "WHERE books.id = 3");
        assert_eq!(WhereClause::raw("where books.id = 3").sql(), "where books.id = 3");
        assert_eq!(WhereClause::raw("   ").sql(), "");
    }

    #[test]
    fn test_raw_clause_keyword_followed_by_newline_or_paren() {
        assert_eq!(WhereClause::raw("WHERE\nbooks.id = 3").sql(), "WHERE\nbooks.id = 3");
        assert_eq!(WhereClause::raw("where(books.id = 3)").sql(), "where(books.id = 3)");
        assert_eq!(WhereClause::raw("whereabouts = 1").sql(), "WHERE whereabouts = 1");
    }

    #[test]
    fn test_literal_sql_widens_non_ascii() {
        let query = BookQuery::for_search(&SearchCommand::parse("a:Émile").unwrap());
        assert!(query.literal_sql().ends_with("LIKE '%_mile%'"));
    }

    #[test]
    fn test_matches_folds_unicode_case() {
        let record = BookRecord {
            id: "1".into(),
            author_sort: "Zola, Émile".into(),
            book_dir: "d".into(),
            book_name: "n".into(),
            book_format: "epub".into(),
            pub_date: "1885".into(),
            title: "Germinal".into(),
        };
        let by_author = BookQuery::for_search(&SearchCommand::parse("a:ÉMILE").unwrap());
        assert!(by_author.matches(&record));
        let wrong = BookQuery::for_search(&SearchCommand::parse("a:amile").unwrap());
        assert!(!wrong.matches(&record));
        assert!(BookQuery::new(WhereClause::raw("books.id = 9")).matches(&record));
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like_matches("%é_ile%", "zola, émile"));
        assert!(like_matches("%%", ""));
        assert!(!like_matches("%x%", "zola"));
        assert!(like_matches("a%c", "abbbc"));
    }

    #[test]
    fn test_query_without_where() {
        let query = BookQuery::new(WhereClause::raw(""));
        assert_eq!(
            query.sql(),
            "SELECT books.id, author_sort, path, name, format, pubdate, title \
             FROM data LEFT OUTER JOIN books ON data.book = books.id"
        );
    }
}
