//! CLI entry point for redirect-rs.

use clap::Parser;
use cli::CliConfig;

fn main() -> anyhow::Result<()> {
    CliConfig::parse().run()
}
