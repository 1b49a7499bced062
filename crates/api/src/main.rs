//! Alertpusher - Main Entry Point

use std::sync::Arc;

use alerting::Normalizer;
use anyhow::{bail, Context};
use api::{
    cli::{BuildInfo, Cli},
    forwarder::AlertForwarder,
    run_server,
    telemetry::{init_logging, install_metrics},
    AppState,
};
use clap::Parser;
use event_publisher::KafkaPublisher;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", BuildInfo::current());
        return Ok(());
    }

    let _log_guard = init_logging(cli.debug, cli.log_dir.as_deref())?;
    info!("=== Alertpusher v{} ===", env!("CARGO_PKG_VERSION"));

    let kafka_config = cli.kafka_config();
    if kafka_config.hosts.is_empty() {
        error!("kafka hosts missing");
        bail!("kafka hosts missing");
    }

    debug!("Dialing kafka...");
    let publisher = tokio::task::spawn_blocking(move || KafkaPublisher::connect(&kafka_config))
        .await?
        .inspect_err(|e| error!("kafka dial: {}", e))
        .context("kafka dial")?;

    let metrics = install_metrics()?;
    let forwarder = AlertForwarder::new(Normalizer::new(cli.pipeline_config()), Arc::new(publisher));
    let state = Arc::new(AppState::new(forwarder).with_metrics(metrics));

    run_server(cli.listen_addr(), state)
        .await
        .inspect_err(|e| error!("HTTP server stopped: {}", e))
        .context("http server")
}
