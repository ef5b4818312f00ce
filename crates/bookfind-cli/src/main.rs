use std::collections::HashSet;
use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use bookfind_core::config_file;
use bookfind_core::dispatch::list_paths;
use bookfind_core::{
    BookQuery, BookRecord, ConfigOverrides, Dispatcher, LibraryConfig, LibraryError, Outcome,
    SearchCommand, citekey, open_source,
};
use clap::{Parser, Subcommand};

mod logging;
mod output;
mod terminal;

use output::ColorMode;
use terminal::TerminalHost;

/// Search a local Calibre library and act on the books it finds
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Calibre library root (the directory holding metadata.db)
    #[arg(long, global = true)]
    library: Option<PathBuf>,

    /// Path to metadata.db, if it is not under the library root
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Query backend: embedded or command
    #[arg(long, global = true)]
    backend: Option<String>,

    /// sqlite3-compatible executor used by the command backend
    #[arg(long, global = true)]
    sql_command: Option<String>,

    /// Command used to open books in an external viewer
    #[arg(long, global = true)]
    opener: Option<String>,

    /// Command used to open books in the terminal
    #[arg(long, global = true)]
    editor: Option<String>,

    /// Maximum number of rows a lookup returns
    #[arg(long, global = true)]
    limit: Option<u32>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the file path of every matching book
    List {
        /// `a:<author>`, `t:<title>` or free text matched against both
        search: Vec<String>,
    },

    /// Pick a matching book and choose what to do with it
    Find {
        /// `a:<author>`, `t:<title>` or free text matched against both
        search: Vec<String>,

        /// Raw SQL condition used instead of a search string
        #[arg(long = "where", conflicts_with = "search")]
        where_clause: Option<String>,

        /// Selected text to replace; also the search when none is given
        #[arg(long)]
        selection: Option<String>,
    },

    /// Resolve a calibre:<title> link
    OpenLink {
        uri: String,

        /// Selected text to replace with the chosen value
        #[arg(long)]
        selection: Option<String>,
    },

    /// Print the citation key of every matching book
    Citekey {
        search: Vec<String>,
    },

    /// Show the resolved library configuration
    Info,
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init();

    let color = ColorMode(!cli.no_color && std::io::stderr().is_terminal());
    if let Err(e) = run(cli, color) {
        tracing::warn!(error = %e, "command failed");
        let _ = output::print_error(&mut std::io::stderr(), &e, color);
        std::process::exit(1);
    }
}

fn run(cli: Cli, color: ColorMode) -> anyhow::Result<()> {
    // Resolve configuration: CLI flags > env vars > config file > discovery
    let overrides = ConfigOverrides {
        library_root: cli
            .library
            .or_else(|| std::env::var("BOOKFIND_LIBRARY").ok().map(PathBuf::from)),
        database_path: cli
            .db
            .or_else(|| std::env::var("BOOKFIND_DB").ok().map(PathBuf::from)),
        opener: cli.opener.or_else(|| std::env::var("BOOKFIND_OPENER").ok()),
        editor: cli.editor.or_else(|| std::env::var("EDITOR").ok()),
        sql_command: cli
            .sql_command
            .or_else(|| std::env::var("BOOKFIND_SQL_COMMAND").ok()),
        backend: cli.backend,
        result_limit: cli.limit,
    };
    let config = LibraryConfig::resolve(overrides, &config_file::load_config())?;

    match cli.command {
        Command::Info => {
            output::print_config(&mut std::io::stdout(), &config, color)?;
            Ok(())
        }
        Command::List { search } => list(&config, &search.join(" ")),
        Command::Citekey { search } => print_citekeys(&config, &search.join(" "), color),
        Command::Find {
            search,
            where_clause,
            selection,
        } => find(&config, search.join(" "), where_clause, selection, color),
        Command::OpenLink { uri, selection } => {
            let source = open_source(&config)?;
            let mut host = TerminalHost::new(config.editor.clone(), selection, color);
            let outcome = Dispatcher::new(&config, source.as_ref(), &mut host).open_link(&uri)?;
            report(outcome);
            Ok(())
        }
    }
}

fn list(config: &LibraryConfig, search: &str) -> anyhow::Result<()> {
    let source = open_source(config)?;
    let paths = list_paths(config, source.as_ref(), search)?;
    let mut out = std::io::stdout().lock();
    output::print_paths(&mut out, &paths)?;
    out.flush()?;
    Ok(())
}

fn find(
    config: &LibraryConfig,
    search: String,
    where_clause: Option<String>,
    selection: Option<String>,
    color: ColorMode,
) -> anyhow::Result<()> {
    let search = if search.trim().is_empty() {
        selection.clone().unwrap_or_default()
    } else {
        search
    };

    let source = open_source(config)?;
    let mut host = TerminalHost::new(config.editor.clone(), selection, color);
    let mut dispatcher = Dispatcher::new(config, source.as_ref(), &mut host);
    let outcome = match where_clause {
        Some(condition) => dispatcher.find_where(&condition)?,
        None => dispatcher.find(&search)?,
    };
    report(outcome);
    Ok(())
}

fn print_citekeys(config: &LibraryConfig, search: &str, color: ColorMode) -> anyhow::Result<()> {
    let command = SearchCommand::parse(search)?;
    let query = BookQuery::for_search(&command).with_limit(config.result_limit);
    let records = open_source(config)?.fetch(&query)?;
    if records.is_empty() {
        return Err(LibraryError::NotFound {
            search: search.to_string(),
        }
        .into());
    }

    let mut out = std::io::stdout().lock();
    write_citekeys(&mut out, &mut std::io::stderr(), &records, search, color)?;
    out.flush()?;
    Ok(())
}

/// One `key<TAB>title` line per book, not per stored format. Books without
/// a key are reported on `err`; it is an error when no key was written.
fn write_citekeys(
    out: &mut dyn Write,
    err: &mut dyn Write,
    records: &[BookRecord],
    search: &str,
    color: ColorMode,
) -> anyhow::Result<()> {
    let mut seen = HashSet::new();
    let mut written = 0;
    for record in records.iter().filter(|r| seen.insert(r.id.clone())) {
        match citekey(record) {
            Ok(key) => {
                writeln!(out, "{key}\t{}", record.title)?;
                written += 1;
            }
            Err(e) => {
                tracing::warn!(id = %record.id, error = %e, "no citation key");
                output::print_error(err, &anyhow::Error::new(e), color)?;
            }
        }
    }
    if written == 0 {
        anyhow::bail!("no citation key could be built for \"{search}\"");
    }
    Ok(())
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Dispatched { record_id, action } => {
            tracing::debug!(%record_id, ?action, "done");
        }
        Outcome::Cancelled => tracing::debug!("cancelled"),
    }
}
