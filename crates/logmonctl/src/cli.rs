//! CLI - Command-line argument parsing
//!
//! Keeps argument parsing separate from execution logic.

use clap::{Args, Parser, Subcommand};
use logmon_common::{MonitorRule, VERSION};

/// Daemon address used when neither --daemon nor $LOGMON_DAEMON is given
pub const DEFAULT_DAEMON_URL: &str = "http://127.0.0.1:5000";

/// Logmon control CLI
#[derive(Parser, Debug)]
#[command(name = "logmonctl")]
#[command(about = "Logmon - manage log monitor rules and cluster indexes", long_about = None)]
#[command(version = VERSION)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Daemon base URL
    #[arg(long, global = true, env = "LOGMON_DAEMON", default_value = DEFAULT_DAEMON_URL)]
    pub daemon: String,

    /// Output JSON only
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List monitor rules with their positions
    List,

    /// Append a monitor rule
    Add(RuleArgs),

    /// Replace the rule at a position
    Edit {
        position: usize,

        #[command(flatten)]
        rule: RuleArgs,
    },

    /// Delete the rule at a position (later rules shift down)
    Delete { position: usize },

    /// Show cluster liveness and index existence
    Status,

    /// Create the mapped indexes once the cluster is up
    SetupIndexes,

    /// Launch the alert reconciliation job
    TriggerJob,
}

/// Fields of a monitor rule
#[derive(Args, Debug, Clone)]
pub struct RuleArgs {
    /// Rule name
    #[arg(long)]
    pub name: String,

    /// Index display name (e.g. Index_A)
    #[arg(long)]
    pub index: String,

    /// Text to scan for in log messages
    #[arg(long)]
    pub text: String,

    /// Scan window (e.g. 5m)
    #[arg(long, default_value = "5m")]
    pub time: String,

    /// Notification channel id
    #[arg(long)]
    pub channel: String,
}

impl From<RuleArgs> for MonitorRule {
    fn from(args: RuleArgs) -> Self {
        MonitorRule::new(args.name, args.index, args.text, args.time, args.channel)
    }
}
