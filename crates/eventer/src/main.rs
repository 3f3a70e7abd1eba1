//! Eventer - exports Kubernetes events to pluggable sinks.
//!
//! Lists cluster events every `--frequency` seconds and hands each batch of
//! new events to every configured sink.
//!
//! ```text
//! eventer --sink log \
//!     --sink 'alertmanager:http://alertmanager:9093/api/v1/alerts?cluster=prod&level=Warning'
//! ```

mod source;

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use sinks::{SinkFactory, SinkManager, SinkUri};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::source::{EventSource, KubernetesSource};

#[derive(Parser, Debug)]
#[command(name = "eventer")]
#[command(about = "Export Kubernetes events to pluggable sinks", long_about = None)]
#[command(version)]
struct Cli {
    /// Sink specification, e.g. `log` or `alertmanager:host:9093?cluster=prod`
    /// (repeatable; the environment variable takes space-separated specs)
    #[arg(long = "sink", env = "EVENTER_SINKS", value_delimiter = ' ', required = true)]
    sinks: Vec<String>,

    /// Seconds between event collections
    #[arg(long, env = "EVENTER_FREQUENCY", default_value_t = 30)]
    frequency: u64,

    /// Upper bound in seconds on a single sink export
    #[arg(long, env = "EVENTER_EXPORT_TIMEOUT", default_value_t = 20)]
    export_timeout: u64,

    /// Only watch events in this namespace (all namespaces if unset)
    #[arg(long, env = "EVENTER_NAMESPACE")]
    namespace: Option<String>,

    /// Export events that already exist at startup
    #[arg(long, env = "EVENTER_INCLUDE_EXISTING")]
    include_existing: bool,

    /// Log output format
    #[arg(long, env = "EVENTER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }
}

/// Parse sink specifications, logging and skipping the malformed ones.
fn parse_sink_specs(specs: &[String]) -> Vec<SinkUri> {
    specs
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|spec| match SinkUri::parse(spec) {
            Ok(uri) => Some(uri),
            Err(e) => {
                error!(spec = %spec, error = %e, "Failed to parse sink specification");
                None
            }
        })
        .collect()
}

/// Collect and export batches until `shutdown` resolves.
async fn run<S, F>(source: &mut S, manager: &SinkManager, frequency: Duration, shutdown: F)
where
    S: EventSource,
    F: Future<Output = ()>,
{
    let mut ticker = tokio::time::interval(frequency);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                match source.next_batch().await {
                    Ok(batch) => {
                        info!(source = source.name(), count = batch.len(), "Collected events");
                        manager.export(&batch).await;
                    }
                    Err(e) => {
                        error!(
                            source = source.name(),
                            error = %format!("{e:#}"),
                            "Failed to collect events"
                        );
                    }
                }
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting eventer");

    let uris = parse_sink_specs(&cli.sinks);
    let sinks = SinkFactory::new().build_all(&uris);
    if sinks.is_empty() {
        bail!("No sink could be created from {:?}", cli.sinks);
    }

    let manager = SinkManager::new(sinks, Duration::from_secs(cli.export_timeout));
    info!(sinks = ?manager.sink_names(), "Sinks ready");

    let mut source = KubernetesSource::new(cli.namespace.as_deref(), cli.include_existing).await?;

    run(
        &mut source,
        &manager,
        Duration::from_secs(cli.frequency.max(1)),
        shutdown_signal(),
    )
    .await;

    manager.stop();
    info!("Eventer stopped");
    Ok(())
}
