//! Logmon Control - CLI client for the Logmon daemon
//!
//! Lists and edits monitor rules, shows cluster status, provisions indexes
//! and triggers the alert reconciliation job.

use anyhow::Result;
use clap::Parser;
use logmonctl::cli::Cli;
use logmonctl::commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    commands::run(cli).await
}
