use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BOOKFIND_LOG";
const LOG_FILE_NAME: &str = "bookfind.log";

/// Send tracing output to `<data_dir>/bookfind/bookfind.log`.
///
/// The terminal is reserved for menus and results, so nothing is logged to
/// stderr. Verbosity comes from `BOOKFIND_LOG` (default `warn`). Logging is
/// optional: any failure here leaves the default no-op subscriber in place.
pub fn init() {
    let Some(dir) = dirs::data_dir().map(|d| d.join("bookfind")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let appender = tracing_appender::rolling::never(&dir, LOG_FILE_NAME);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(appender)
        .with_ansi(false)
        .try_init();
}
