//! Logmon Daemon - monitor rule console
//!
//! Serves the rule registry, cluster status, index provisioning and job
//! trigger over a JSON HTTP API.

use anyhow::{Context, Result};
use clap::Parser;
use logmon_common::{Config, Console, VERSION};
use logmond::server::{self, AppState};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Parser)]
#[command(name = "logmond")]
#[command(about = "Logmon daemon - monitor rules and cluster provisioning", long_about = None)]
#[command(version = VERSION)]
struct Args {
    /// Config file (overrides $LOGMON_CONFIG and /etc/logmon/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address (overrides server.bind)
    #[arg(long)]
    bind: Option<String>,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logmond::logging::init(&args.log_level);

    info!("Logmon Daemon v{} starting", VERSION);

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());

    // The blocking HTTP client must be created and dropped outside the async runtime
    let console = Console::from_config(&config).context("Failed to build console")?;
    info!(
        "Registry at {}, cluster at {}, {} mapped indexes",
        config.registry.path.display(),
        config.cluster.url,
        console.mapping().len()
    );
    let request_timeout = server::request_timeout(&console);
    info!("Request timeout {}s", request_timeout.as_secs());
    let shared = Arc::new(Mutex::new(console));

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    let state = AppState::from_shared(shared.clone(), request_timeout);
    let result = runtime.block_on(server::run(state, &bind));
    drop(runtime);
    drop(shared);

    result
}
