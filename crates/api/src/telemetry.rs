//! Logging and metrics bootstrap

use std::path::Path;

use anyhow::{anyhow, Context};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

/// File name prefix of the rolling log under `--log`
pub const LOG_FILE_NAME: &str = "alertpusher.log";

pub const ALERTS_RECEIVED: &str = "alertpusher_alerts_received_total";
pub const ALERTS_SKIPPED: &str = "alertpusher_alerts_skipped_total";
pub const EVENTS_PUBLISHED: &str = "alertpusher_events_published_total";
pub const EVENTS_FAILED: &str = "alertpusher_events_failed_total";
pub const BATCHES_REJECTED: &str = "alertpusher_batches_rejected_total";

/// Filter used when `RUST_LOG` is not set
pub fn default_directives(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "info,alertpusher=debug,api=debug,alerting=debug,event_publisher=debug",
        _ => "info,alertpusher=trace,api=trace,alerting=trace,event_publisher=trace,tower_http=debug",
    }
}

/// Initialize the tracing subscriber.
///
/// With a log directory, records go to a daily rolling file through a
/// non-blocking writer; the returned guard must be held until exit.
pub fn init_logging(verbosity: u8, log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbosity)));
    let with_location = verbosity > 0;

    let (writer, guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(log_dir.is_none())
        .with_target(true)
        .with_file(with_location)
        .with_line_number(with_location)
        .try_init()
        .map_err(|e| anyhow!("Failed to set tracing subscriber: {e}"))?;

    Ok(guard)
}

/// Install the Prometheus recorder backing `GET /metrics`
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("install prometheus recorder")?;

    metrics::describe_counter!(ALERTS_RECEIVED, "Alerts decoded from webhook batches");
    metrics::describe_counter!(ALERTS_SKIPPED, "Alerts dropped by filter rules");
    metrics::describe_counter!(EVENTS_PUBLISHED, "Events accepted by the broker");
    metrics::describe_counter!(EVENTS_FAILED, "Events lost to serialization or publish errors");
    metrics::describe_counter!(BATCHES_REJECTED, "Webhook requests answered with 400");

    Ok(handle)
}
