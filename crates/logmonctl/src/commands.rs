//! Command execution for logmonctl

use crate::cli::{Cli, Commands};
use crate::client::DaemonClient;
use crate::output;
use anyhow::Result;
use logmon_common::MonitorRule;
use serde::Serialize;
use std::io::IsTerminal;

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let client = DaemonClient::new(&cli.daemon)?;
    let json = cli.json;
    let color = !json && std::io::stdout().is_terminal();

    match cli.command {
        Commands::List => {
            let views = client.list().await?;
            emit(json, &views, || output::render_rules(&views, color))
        }
        Commands::Add(args) => {
            let rule = MonitorRule::from(args);
            let ack = client.add(&rule).await?;
            emit(json, &ack, || status_line(&ack))
        }
        Commands::Edit { position, rule } => {
            let rule = MonitorRule::from(rule);
            let ack = client.edit(position, &rule).await?;
            emit(json, &ack, || status_line(&ack))
        }
        Commands::Delete { position } => {
            let ack = client.delete(position).await?;
            emit(json, &ack, || status_line(&ack))
        }
        Commands::Status => {
            let status = client.status().await?;
            emit(json, &status, || output::render_status(&status, color))
        }
        Commands::SetupIndexes => {
            let report = client.setup_indexes().await?;
            emit(json, &report, || output::render_report(&report))?;
            if report.aborted || report.failed_count() > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::TriggerJob => {
            let status = client.trigger_job().await?;
            emit(json, &status, || output::render_job(&status))?;
            if !status.dispatched {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn status_line(ack: &serde_json::Value) -> String {
    let status = ack.get("status").and_then(|s| s.as_str()).unwrap_or("Done");
    format!("{}\n", status)
}
