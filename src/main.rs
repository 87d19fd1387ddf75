use anyhow::{Context, Result};
use clap::Parser;
use clipsync::cli::Cli;
use clipsync::config::Config;
use clipsync::node::Node;
use clipsync::store::build_store;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG takes precedence over -v/-q
    let level = cli.log_level().to_string().to_lowercase();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("clipsync={}", level)));
    fmt().with_env_filter(filter).with_target(false).init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let config = cli.apply_overrides(config)?;

    let store = build_store(config.store).context("Failed to open local clipboard")?;

    let node = Node::bind(config, store)
        .await
        .context("Failed to start clipboard node")?;
    let handle = node.spawn_with_config_peers()?;

    // Stops on Ctrl-C, or as soon as the HTTP server exits on its own
    handle
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutting down"),
                Err(e) => error!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
        })
        .await
        .context("Clipboard node stopped")?;
    Ok(())
}
