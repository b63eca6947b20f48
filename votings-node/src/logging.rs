use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// Installs the console subscriber (stderr) and the ledger audit file.
///
/// `RUST_LOG` wins over `filter`. The audit file only receives records from
/// the ledger crate. Keep the returned guard alive until exit or buffered
/// audit lines are lost.
pub fn init(filter: &str, audit_log: &Path) -> WorkerGuard {
    let dir = audit_log.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = audit_log
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "audit.log".into());

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let audit_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target().starts_with("votings_ledger")
        }));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        );

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(audit_layer)
        .with(console_layer)
        .try_init();

    guard
}
