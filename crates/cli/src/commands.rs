//! Subcommands.

use crate::config::ClusterFile;
use anyhow::Context;
use clap::Subcommand;
use corelib::NodeId;
use rebalancing::{MetadataStore, RedirectResolver, ServerState};
use replication::RoutingSnapshot;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the replicas of a key under the current and source topologies.
    Replicas {
        #[arg(long)]
        store: String,
        key: String,
    },
    /// Print the donor each key would be proxied to from this node.
    Resolve {
        #[arg(long)]
        store: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Summarize this node's rebalancing state.
    Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub key: String,
    pub donor: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CommandResult {
    Replicas {
        store: String,
        key: String,
        current: Vec<NodeId>,
        source: Option<Vec<NodeId>>,
    },
    Resolved {
        store: String,
        node: NodeId,
        resolutions: Vec<Resolution>,
    },
    Status {
        node: NodeId,
        state: ServerState,
        current_nodes: usize,
        source_nodes: Option<usize>,
        redirecting_enabled: bool,
        proxy_put_enabled: bool,
    },
}

impl Command {
    pub fn execute(&self, cluster: &ClusterFile) -> anyhow::Result<CommandResult> {
        let metadata = cluster.metadata()?;
        match self {
            Command::Replicas { store, key } => {
                let store_def = metadata
                    .store_definition(store)
                    .with_context(|| format!("unknown store {store}"))?;
                let current = RoutingSnapshot::new(metadata.current_topology(), store_def.clone())
                    .replicas_for_key(key.as_bytes());
                let source = metadata.source_topology().map(|source| {
                    RoutingSnapshot::new(source, store_def).replicas_for_key(key.as_bytes())
                });
                Ok(CommandResult::Replicas {
                    store: store.clone(),
                    key: key.clone(),
                    current,
                    source,
                })
            }
            Command::Resolve { store, keys } => {
                let resolver = RedirectResolver::new(metadata.clone());
                let plan = resolver.plan(store, cluster.redirect.redirecting_enabled)?;
                let resolutions = keys
                    .iter()
                    .map(|key| Resolution {
                        key: key.clone(),
                        donor: plan.as_ref().and_then(|plan| plan.donor_for(key.as_bytes())),
                    })
                    .collect();
                Ok(CommandResult::Resolved {
                    store: store.clone(),
                    node: metadata.node_id(),
                    resolutions,
                })
            }
            Command::Status => Ok(CommandResult::Status {
                node: metadata.node_id(),
                state: metadata.server_state(),
                current_nodes: metadata.current_topology().node_count(),
                source_nodes: metadata.source_topology().map(|source| source.node_count()),
                redirecting_enabled: cluster.redirect.redirecting_enabled,
                proxy_put_enabled: cluster.redirect.proxy_put_enabled,
            }),
        }
    }
}

fn node_list(nodes: &[NodeId]) -> String {
    nodes.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(", ")
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Replicas {
                store,
                key,
                current,
                source,
            } => {
                writeln!(f, "{store}/{key}")?;
                write!(f, "  current: [{}]", node_list(current))?;
                if let Some(source) = source {
                    write!(f, "\n  source:  [{}]", node_list(source))?;
                }
                Ok(())
            }
            CommandResult::Resolved {
                store,
                node,
                resolutions,
            } => {
                write!(f, "{store} on node {node}")?;
                for resolution in resolutions {
                    match resolution.donor {
                        Some(donor) => write!(f, "\n  {} -> proxy to {donor}", resolution.key)?,
                        None => write!(f, "\n  {} -> local", resolution.key)?,
                    }
                }
                Ok(())
            }
            CommandResult::Status {
                node,
                state,
                current_nodes,
                source_nodes,
                redirecting_enabled,
                proxy_put_enabled,
            } => {
                writeln!(f, "node {node}: {state:?}")?;
                write!(f, "  current topology: {current_nodes} nodes")?;
                if let Some(source_nodes) = source_nodes {
                    write!(f, "\n  source topology:  {source_nodes} nodes")?;
                }
                write!(
                    f,
                    "\n  redirecting: {redirecting_enabled}, proxy put: {proxy_put_enabled}"
                )
            }
        }
    }
}
