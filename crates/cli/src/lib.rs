//! CLI tool for inspecting redirection on a rebalancing node.
//!
//! Provides commands for:
//! - Listing the replicas of a key before and after the rebalance
//! - Resolving the donor a key would be proxied to
//! - Summarizing the node's rebalancing state

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult, Resolution};
pub use config::{CliConfig, ClusterFile};
