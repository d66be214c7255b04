use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Env var read for the log filter, e.g. `QPACE_LOG=qpace=debug`
pub const LOG_ENV: &str = "QPACE_LOG";

/// Send logs to a daily file under `dir`; the terminal belongs to the TUI.
/// Keep the returned guard alive until exit so buffered lines are flushed.
pub fn init_file_logging(dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("qpace: logging disabled, cannot create {}: {e}", dir.display());
        return None;
    }
    let appender = tracing_appender::rolling::daily(dir, "qpace.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .try_init();

    match installed {
        Ok(()) => Some(guard),
        Err(_) => None,
    }
}
