use anyhow::Context;
use live_supervisor::{ProbeProvider, Supervisor, SupervisorConfig};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    live_supervisor::init_tracing();

    tracing::info!("Starting Live Supervisor v{}", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("live-supervisor.json"));

    let config = SupervisorConfig::from_file(&config_path)
        .with_context(|| format!("Unable to load configuration from {:?}", config_path))?;

    let source = config
        .source
        .clone()
        .context("Configuration has no `source` block")?;
    let provider = Arc::new(ProbeProvider::from_config(&source));

    tracing::info!("Link Start");
    Supervisor::new(provider, config)?.run().await;

    Ok(())
}
