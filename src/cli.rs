use crate::config::Config;
use crate::error::Result;
use crate::store::StoreKind;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "clipsync")]
#[command(about = "Keep one clipboard in sync across a set of machines", long_about = None)]
#[command(version)]
#[command(after_help = "EXAMPLES:
    # Run with ./config.json ({\"servers\": [...], \"port\": \":8080\"})
    clipsync

    # Two peers, explicit listen address
    clipsync --listen :8080 --peer http://10.0.0.2:8080 --peer http://10.0.0.3:8080

    # Headless node without an OS clipboard
    clipsync --memory-store --config /etc/clipsync.toml -v")]
pub struct Cli {
    /// Config file (.json or .toml)
    #[arg(short, long, env = "CLIPSYNC_CONFIG", default_value = "config.json")]
    pub config: PathBuf,

    /// Listen address, overrides the config file (e.g. ":8080")
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Peer base URL, repeatable; replaces the configured peer list
    #[arg(short, long = "peer", value_name = "URL")]
    pub peers: Vec<String>,

    /// Seconds between sync cycles, overrides the config file
    #[arg(short, long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Keep the clipboard in memory instead of the OS clipboard
    #[arg(long)]
    pub memory_store: bool,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only show warnings and errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, mut config: Config) -> Result<Config> {
        if let Some(listen) = &self.listen {
            config.listen = listen.clone();
        }
        if !self.peers.is_empty() {
            config.peers = self.peers.clone();
        }
        if let Some(secs) = self.interval {
            config.interval = Duration::from_secs(secs);
        }
        if self.memory_store {
            config.store = StoreKind::Memory;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            return tracing::Level::WARN;
        }

        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
