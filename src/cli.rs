use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Result, ensure};
use clap::Parser;

use crate::config;

#[derive(Parser, Debug)]
#[command(name = "peer-ping")]
#[command(about = "Measure reachability and round-trip latency of UDP peers.")]
pub struct CommandLine {
    /// Overall time to wait for replies, in milliseconds. Waits for every
    /// reply when absent.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Local address to bind the probe socket on.
    #[arg(long, default_value = "0.0.0.0:0")]
    pub bind: SocketAddr,

    /// JSON targets file, used instead of positional targets.
    #[arg(long, conflicts_with = "targets")]
    pub targets_file: Option<PathBuf>,

    /// Peers to probe, e.g. router.example.net:6881
    #[arg(required_unless_present = "targets_file")]
    pub targets: Vec<String>,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The final target list, from the command line or the targets file.
    pub async fn resolve_targets(&self) -> Result<Vec<String>> {
        let targets = match &self.targets_file {
            Some(path) => config::load_targets(path).await?,
            None => self.targets.clone(),
        };
        ensure!(!targets.is_empty(), "no targets to probe");
        Ok(targets)
    }
}
