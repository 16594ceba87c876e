mod cli;
mod collector;
mod config;
mod dispatcher;
mod prober;
mod report;
mod util;
mod wire;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tracing::info;

use cli::CommandLine;
use prober::ProbingService;
use prober::udp::{ProbeServiceConfig, UdpProbeService};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    let args = CommandLine::parse_args();

    // diagnostics go to stderr, measurements to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("peer_ping=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let targets = args.resolve_targets().await?;

    let service = UdpProbeService::bind(ProbeServiceConfig {
        bind_addr: args.bind,
        ..ProbeServiceConfig::default()
    })
    .await?;
    info!("probe service on {}", service.local_addr()?);

    // the deadline covers the whole batch, dispatch throttling included
    let deadline = args
        .timeout_ms
        .map(|ms| Instant::now() + Duration::from_millis(ms));

    let (results_tx, results_rx) = mpsc::unbounded_channel();
    dispatcher::dispatch(&targets, &service, results_tx).await?;
    let report = collector::collect(results_rx, deadline, targets.len()).await;
    println!("{report}");

    Ok(())
}
