//! Query → selection → hotkey menu → effect.
//!
//! A lookup with no hits is reported as [`LibraryError::NotFound`]; a single
//! hit goes straight to the menu; several hits are offered through
//! [`Host::choose`] first. Every menu action is a terminal effect on the host.

use std::path::{Path, PathBuf};

use crate::LibraryError;
use crate::action::{self, ActionId, INFO_MENU, MAIN_MENU};
use crate::citekey::citekey;
use crate::config::LibraryConfig;
use crate::db::BookSource;
use crate::host::{Host, Window};
use crate::link;
use crate::query::{BookQuery, WhereClause};
use crate::record::BookRecord;
use crate::search::SearchCommand;

/// What happened to a lookup once the user was done with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Dispatched { record_id: String, action: ActionId },
    Cancelled,
}

pub struct Dispatcher<'a> {
    config: &'a LibraryConfig,
    source: &'a dyn BookSource,
    host: &'a mut dyn Host,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        config: &'a LibraryConfig,
        source: &'a dyn BookSource,
        host: &'a mut dyn Host,
    ) -> Self {
        Self {
            config,
            source,
            host,
        }
    }

    /// Search with the compact grammar and run the menu on the result.
    pub fn find(&mut self, search: &str) -> Result<Outcome, LibraryError> {
        let command = SearchCommand::parse(search)?;
        let query = BookQuery::for_search(&command).with_limit(self.config.result_limit);
        self.dispatch_query(&query, search)
    }

    /// Run the menu on the result of a caller-written WHERE condition.
    pub fn find_where(&mut self, condition: &str) -> Result<Outcome, LibraryError> {
        let query = BookQuery::new(WhereClause::raw(condition)).with_limit(self.config.result_limit);
        self.dispatch_query(&query, condition)
    }

    /// Resolve a `calibre:<title>` link and run the menu on it.
    pub fn open_link(&mut self, uri: &str) -> Result<Outcome, LibraryError> {
        let command = link::parse_link(uri)?;
        let query = BookQuery::for_search(&command).with_limit(self.config.result_limit);
        self.dispatch_query(&query, uri)
    }

    fn dispatch_query(&mut self, query: &BookQuery, label: &str) -> Result<Outcome, LibraryError> {
        let records = self.source.fetch(query)?;
        tracing::debug!(backend = self.source.name(), hits = records.len(), label, "lookup done");

        match self.select(records, label)? {
            Some(record) => self.run_menu(&record),
            None => Ok(Outcome::Cancelled),
        }
    }

    /// Narrow a result set down to one record. `Ok(None)` means the user
    /// cancelled the selection list.
    pub fn select(
        &mut self,
        mut records: Vec<BookRecord>,
        label: &str,
    ) -> Result<Option<BookRecord>, LibraryError> {
        match records.len() {
            0 => Err(LibraryError::NotFound {
                search: label.to_string(),
            }),
            1 => Ok(records.pop()),
            count => {
                let candidates: Vec<String> = records.iter().map(BookRecord::display_line).collect();
                let prompt = format!("{count} books match \"{label}\"");
                Ok(self
                    .host
                    .choose(&prompt, &candidates)
                    .filter(|&index| index < count)
                    .map(|index| records.swap_remove(index)))
            }
        }
    }

    /// Show the hotkey menu for one record and perform the chosen action.
    pub fn run_menu(&mut self, record: &BookRecord) -> Result<Outcome, LibraryError> {
        let path = self.config.file_path(record);
        if !path.exists() {
            return Err(LibraryError::MissingFile(path));
        }

        let key = self.host.read_key(&record.display_line(), MAIN_MENU);
        let mut action = action::lookup(MAIN_MENU, key);
        if action == ActionId::BookInfo {
            let key = self.host.read_key("insert book information", INFO_MENU);
            action = action::lookup(INFO_MENU, key);
        }

        if action == ActionId::Cancel {
            tracing::debug!(id = %record.id, "menu cancelled");
            return Ok(Outcome::Cancelled);
        }

        tracing::info!(id = %record.id, ?action, "dispatching");
        self.perform(record, &path, action)?;
        Ok(Outcome::Dispatched {
            record_id: record.id.clone(),
            action,
        })
    }

    fn perform(&mut self, record: &BookRecord, path: &Path, action: ActionId) -> Result<(), LibraryError> {
        match action {
            ActionId::OpenOtherWindow => self.host.open_file(path, Window::Other),
            ActionId::OpenHere => self.host.open_file(path, Window::Current),
            ActionId::OpenViewer => self.host.launch_viewer(self.config.opener.as_deref(), path),
            ActionId::InsertSearchString => self.emit_text(&record.search_string()),
            ActionId::InsertCitekey => self.emit_text(&citekey(record)?),
            ActionId::InsertPath => self.emit_text(&path.display().to_string()),
            ActionId::InsertTitle => self.emit_text(&record.title),
            ActionId::InsertLink => self.emit_text(&link::link_for(record)),
            ActionId::InsertId => self.emit_text(&record.id),
            ActionId::InsertPubDate => self.emit_text(&record.pub_date),
            ActionId::InsertAuthors => self.emit_text(&record.authors().join(" and ")),
            ActionId::BookInfo | ActionId::Cancel => Ok(()),
        }
    }

    fn emit_text(&mut self, text: &str) -> Result<(), LibraryError> {
        if self.host.has_selection() {
            self.host.insert_text(text);
        } else {
            self.host.copy_to_clipboard(text);
            self.host.message(&format!("copied: {text}"));
        }
        Ok(())
    }
}

/// File paths of every book matching `search`, in query order.
pub fn list_paths(
    config: &LibraryConfig,
    source: &dyn BookSource,
    search: &str,
) -> Result<Vec<PathBuf>, LibraryError> {
    let command = SearchCommand::parse(search)?;
    let query = BookQuery::for_search(&command).with_limit(config.result_limit);
    Ok(source
        .fetch(&query)?
        .iter()
        .map(|record| config.file_path(record))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::action::ActionEntry;

    /// Returns the same records for every query and remembers the queries.
    struct FixedSource {
        records: Vec<BookRecord>,
        seen: RefCell<Vec<BookQuery>>,
    }

    impl BookSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        fn fetch(&self, query: &BookQuery) -> Result<Vec<BookRecord>, LibraryError> {
            self.seen.borrow_mut().push(query.clone());
            Ok(self.records.clone())
        }
    }

    #[derive(Default)]
    struct ScriptedHost {
        selection: bool,
        keys: VecDeque<Option<char>>,
        choice: Option<usize>,
        chose_from: Vec<String>,
        inserted: Vec<String>,
        copied: Vec<String>,
        opened: Vec<(PathBuf, Window)>,
        viewed: Vec<PathBuf>,
        viewer: Option<Vec<String>>,
    }

    impl Host for ScriptedHost {
        fn has_selection(&self) -> bool {
            self.selection
        }
        fn insert_text(&mut self, text: &str) {
            self.inserted.push(text.to_string());
        }
        fn copy_to_clipboard(&mut self, text: &str) {
            self.copied.push(text.to_string());
        }
        fn open_file(&mut self, path: &Path, window: Window) -> Result<(), LibraryError> {
            self.opened.push((path.to_path_buf(), window));
            Ok(())
        }
        fn launch_viewer(
            &mut self,
            opener: Option<&[String]>,
            path: &Path,
        ) -> Result<(), LibraryError> {
            self.viewer = opener.map(<[String]>::to_vec);
            self.viewed.push(path.to_path_buf());
            Ok(())
        }
        fn choose(&mut self, _prompt: &str, candidates: &[String]) -> Option<usize> {
            self.chose_from = candidates.to_vec();
            self.choice
        }
        fn read_key(&mut self, _prompt: &str, _entries: &[ActionEntry]) -> Option<char> {
            self.keys.pop_front().flatten()
        }
        fn message(&mut self, _text: &str) {}
    }

    fn record(id: &str, title: &str) -> BookRecord {
        BookRecord {
            id: id.into(),
            author_sort: "Smith, John".into(),
            book_dir: format!("John Smith/{title} ({id})"),
            book_name: title.into(),
            book_format: "pdf".into(),
            pub_date: "1999-05-01".into(),
            title: title.into(),
        }
    }

    /// A library root with the files for `records` present on disk.
    fn library(records: &[BookRecord]) -> (tempfile::TempDir, LibraryConfig) {
        let dir = tempfile::tempdir().unwrap();
        let config = LibraryConfig::new(dir.path());
        for r in records {
            let path = config.file_path(r);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, b"%PDF").unwrap();
        }
        (dir, config)
    }

    fn source(records: Vec<BookRecord>) -> FixedSource {
        FixedSource {
            records,
            seen: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn zero_results_is_not_found_and_no_action() {
        let (_dir, config) = library(&[]);
        let src = source(vec![]);
        let mut host = ScriptedHost::default();
        let result = Dispatcher::new(&config, &src, &mut host).find("nothing");
        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
        assert!(host.opened.is_empty());
        assert!(host.viewed.is_empty());
        assert!(host.copied.is_empty());
    }

    #[test]
    fn single_result_goes_straight_to_menu() {
        let books = vec![record("1", "Escape")];
        let (_dir, config) = library(&books);
        let src = source(books.clone());
        let mut host = ScriptedHost {
            keys: VecDeque::from([Some('o')]),
            ..Default::default()
        };
        let outcome = Dispatcher::new(&config, &src, &mut host).find("t:escape").unwrap();
        assert_eq!(
            outcome,
            Outcome::Dispatched {
                record_id: "1".into(),
                action: ActionId::OpenOtherWindow
            }
        );
        assert!(host.chose_from.is_empty());
        assert_eq!(host.opened, vec![(config.file_path(&books[0]), Window::Other)]);
    }

    #[test]
    fn several_results_select_then_dispatch_on_selected_only() {
        let books = vec![record("1", "First"), record("2", "Second"), record("3", "Third")];
        let (_dir, config) = library(&books);
        let src = source(books.clone());
        let mut host = ScriptedHost {
            keys: VecDeque::from([Some('t')]),
            choice: Some(1),
            ..Default::default()
        };
        let outcome = Dispatcher::new(&config, &src, &mut host).find("smith").unwrap();
        assert_eq!(host.chose_from.len(), 3);
        assert_eq!(host.chose_from[1], "(2) [pdf] Smith, John -- Second");
        assert_eq!(host.copied, vec!["Second".to_string()]);
        assert_eq!(
            outcome,
            Outcome::Dispatched {
                record_id: "2".into(),
                action: ActionId::InsertTitle
            }
        );
    }

    #[test]
    fn cancelled_selection_does_nothing() {
        let books = vec![record("1", "First"), record("2", "Second")];
        let (_dir, config) = library(&books);
        let src = source(books);
        let mut host = ScriptedHost::default();
        let outcome = Dispatcher::new(&config, &src, &mut host).find("smith").unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(host.copied.is_empty());
    }

    #[test]
    fn unknown_key_cancels() {
        let books = vec![record("1", "Escape")];
        let (_dir, config) = library(&books);
        let src = source(books);
        let mut host = ScriptedHost {
            keys: VecDeque::from([Some('Z')]),
            ..Default::default()
        };
        let outcome = Dispatcher::new(&config, &src, &mut host).find("escape").unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert!(host.opened.is_empty() && host.copied.is_empty() && host.inserted.is_empty());
    }

    #[test]
    fn missing_file_skips_menu() {
        let books = vec![record("1", "Escape")];
        let (_dir, config) = library(&[]);
        let src = source(books);
        let mut host = ScriptedHost {
            keys: VecDeque::from([Some('o')]),
            ..Default::default()
        };
        let result = Dispatcher::new(&config, &src, &mut host).find("escape");
        assert!(matches!(result, Err(LibraryError::MissingFile(_))));
        assert_eq!(host.keys.len(), 1, "menu must not have read a key");
    }

    #[test]
    fn text_inserted_when_selection_active() {
        let books = vec![record("1", "The Great Escape")];
        let (_dir, config) = library(&books);
        let src = source(books);
        let mut host = ScriptedHost {
            selection: true,
            keys: VecDeque::from([Some('c')]),
            ..Default::default()
        };
        Dispatcher::new(&config, &src, &mut host).find("escape").unwrap();
        assert_eq!(host.inserted, vec!["smith1999great".to_string()]);
        assert!(host.copied.is_empty());
    }

    #[test]
    fn info_submenu_inserts_pubdate() {
        let books = vec![record("7", "Escape")];
        let (_dir, config) = library(&books);
        let src = source(books);
        let mut host = ScriptedHost {
            keys: VecDeque::from([Some('i'), Some('p')]),
            ..Default::default()
        };
        let outcome = Dispatcher::new(&config, &src, &mut host).find("escape").unwrap();
        assert_eq!(host.copied, vec!["1999-05-01".to_string()]);
        assert_eq!(
            outcome,
            Outcome::Dispatched {
                record_id: "7".into(),
                action: ActionId::InsertPubDate
            }
        );
    }

    #[test]
    fn viewer_gets_configured_opener_path() {
        let books = vec![record("1", "Escape")];
        let (_dir, config) = library(&books);
        let src = source(books.clone());
        let mut host = ScriptedHost {
            keys: VecDeque::from([Some('v')]),
            ..Default::default()
        };
        Dispatcher::new(&config, &src, &mut host).find("escape").unwrap();
        assert_eq!(host.viewed, vec![config.file_path(&books[0])]);
        assert_eq!(host.viewer, None, "no opener configured means system default");

        let config = LibraryConfig {
            opener: Some(vec!["zathura".to_string()]),
            ..config
        };
        host.keys = VecDeque::from([Some('v')]);
        Dispatcher::new(&config, &src, &mut host).find("escape").unwrap();
        assert_eq!(host.viewer, Some(vec!["zathura".to_string()]));
    }

    #[test]
    fn bad_search_syntax_never_queries() {
        let (_dir, config) = library(&[]);
        let src = source(vec![]);
        let mut host = ScriptedHost::default();
        let result = Dispatcher::new(&config, &src, &mut host).find("z:foo");
        assert!(matches!(result, Err(LibraryError::BadSearchSyntax { .. })));
        assert!(src.seen.borrow().is_empty());
    }

    #[test]
    fn link_resolves_through_title_search() {
        let books = vec![record("1", "Escape")];
        let (_dir, config) = library(&books);
        let src = source(books);
        let mut host = ScriptedHost {
            keys: VecDeque::from([Some('q')]),
            ..Default::default()
        };
        Dispatcher::new(&config, &src, &mut host)
            .open_link("calibre:Escape")
            .unwrap();
        let seen = src.seen.borrow();
        assert_eq!(seen[0].where_clause().sql(), "WHERE lower(title) LIKE ?1");
        assert_eq!(seen[0].params(), &["%escape%".to_string()]);
    }

    #[test]
    fn list_paths_maps_every_record() {
        let books = vec![record("1", "First"), record("2", "Second")];
        let (_dir, config) = library(&[]);
        let src = source(books.clone());
        let paths = list_paths(&config, &src, "smith").unwrap();
        assert_eq!(paths, books.iter().map(|b| config.file_path(b)).collect::<Vec<_>>());
    }
}
