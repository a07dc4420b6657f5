use std::io;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// Installs the global subscriber: stdout always, plus a daily-rolling file
/// writer when `config.log_dir` is set. The returned guard flushes buffered
/// file output on drop, so the caller must hold it for the process lifetime.
pub fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match config.log_dir.as_deref().map(rolling_writer) {
        Some(Ok((writer, guard))) => {
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Some(Err(err)) => {
            // Subscriber is not up yet, so this cannot go through tracing.
            eprintln!("file logging disabled: {err}");
            (None, None)
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    guard
}

fn rolling_writer(dir: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, "mindgraph.log");
    Ok(tracing_appender::non_blocking(appender))
}
