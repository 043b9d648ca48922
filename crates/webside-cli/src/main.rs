//! Webside server launcher
//!
//! Loads `webside.toml` (when given), applies command-line overrides and serves the
//! kernel image until Ctrl+C or a fatal runtime error.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use webside_server::{kernel_inspector, serve, WebsideConfig};

const DEFAULT_LOG_FILTER: &str = "webside=info,webside_server=info,webside_engine=info";

#[derive(Parser, Debug)]
#[command(name = "webside")]
#[command(about = "Webside introspection server over a live object image", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "WEBSIDE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "WEBSIDE_PORT")]
    port: Option<u16>,

    /// Start with an empty pin table
    #[arg(long)]
    no_samples: bool,
}

impl Cli {
    /// File configuration (or defaults) with the command-line values applied on top
    fn resolve_config(&self) -> Result<WebsideConfig> {
        let mut config = match &self.config {
            Some(path) => WebsideConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => WebsideConfig::default(),
        };
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_samples {
            config.inspector.pin_samples = false;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let inspector = kernel_inspector(config.inspector.pin_samples)?;
    tracing::debug!(pins = inspector.pins().len(), "kernel image loaded");
    serve(&config, inspector).await?;
    Ok(())
}
