use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::io::paths;

/// Environment variable overriding the log filter, e.g. `HANGAR_LOG=debug`.
pub const LOG_ENV: &str = "HANGAR_LOG";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Log to stderr. Used by the CLI, where warnings should be seen.
pub fn init_stderr(default_level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

/// Log to `<root>/.hangar/hangar.log`. Used by the TUI, which owns the
/// terminal. Keep the guard alive until exit so buffered lines are flushed.
pub fn init_file(root: &Path, default_level: &str) -> Option<WorkerGuard> {
    let dir = paths::reserved_dir(root);
    if let Err(e) = std::fs::create_dir_all(&dir) {
        eprintln!("warning: could not create {}: {}", dir.display(), e);
        return None;
    }
    let appender = tracing_appender::rolling::never(&dir, paths::LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let installed = tracing_subscriber::registry()
        .with(filter(default_level))
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init();
    installed.ok().map(|()| guard)
}
