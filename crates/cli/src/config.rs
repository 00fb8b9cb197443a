//! Command-line arguments and the cluster description file.

use crate::commands::Command;
use anyhow::{bail, Context};
use clap::Parser;
use corelib::{NodeId, TopologyDescriptor};
use rebalancing::{InMemoryMetadata, RedirectConfig, ServerState};
use replication::StoreDefinition;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, Level};

#[derive(Debug, Parser)]
#[command(name = "redirect", about = "Inspect request redirection during a rebalance", long_about = None)]
pub struct CliConfig {
    /// Cluster description (JSON).
    #[arg(short, long, default_value = "cluster.json")]
    pub cluster: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> anyhow::Result<()> {
        init_logging(self.verbose);

        let cluster = ClusterFile::load(&self.cluster)?;
        debug!(path = %self.cluster.display(), node = %cluster.node_id, "loaded cluster description");
        let result = self.command.execute(&cluster)?;
        println!("{result}");
        Ok(())
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

/// The view one node has of the cluster, as written by an operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterFile {
    pub node_id: NodeId,
    pub current: TopologyDescriptor,
    #[serde(default)]
    pub source: Option<TopologyDescriptor>,
    #[serde(default)]
    pub state: ServerState,
    pub stores: Vec<StoreDefinition>,
    #[serde(default)]
    pub redirect: RedirectConfig,
}

impl ClusterFile {
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_json_str(&json).with_context(|| format!("invalid cluster file {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let cluster: ClusterFile = serde_json::from_str(json)?;
        cluster.validate()?;
        Ok(cluster)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.state == ServerState::Rebalancing && self.source.is_none() {
            bail!("rebalancing state requires a source topology");
        }
        if self.stores.is_empty() {
            bail!("no stores defined");
        }
        self.redirect.validate()?;
        Ok(())
    }

    /// Metadata as the node would hold it.
    pub fn metadata(&self) -> anyhow::Result<Arc<InMemoryMetadata>> {
        let current = self.current.build().context("invalid current topology")?;
        let metadata = InMemoryMetadata::new(self.node_id, Arc::new(current));
        for store in &self.stores {
            metadata.add_store_definition(store.clone());
        }
        if let Some(source) = &self.source {
            let source = source.build().context("invalid source topology")?;
            metadata.set_source_topology(Some(Arc::new(source)));
        }
        metadata.set_server_state(self.state);
        Ok(Arc::new(metadata))
    }
}
