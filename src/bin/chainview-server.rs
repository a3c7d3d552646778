#![forbid(unsafe_code)]
//! Web server for ChainView

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use chainview::api::{run_server, AppState};
use chainview::config::{load_config, DEFAULT_CONFIG_FILE};
use chainview::explorer::Explorer;
use chainview::rpc::NodeClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Hostname to bind the web server to
    #[arg(long)]
    host: Option<String>,
    /// Port to bind the web server to
    #[arg(long)]
    port: Option<u16>,
    /// Directory of static files to serve
    #[arg(long)]
    www: Option<String>,
    /// Node JSON-RPC endpoint (http(s) URL or IPC socket path)
    #[arg(long)]
    endpoint: Option<String>,
    /// Number of recent blocks to show
    #[arg(long)]
    window: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(&cli.config)?;

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(www) = cli.www {
        config.server.www_root = www;
    }
    if let Some(endpoint) = cli.endpoint {
        config.node.endpoint = endpoint;
    }
    if let Some(window) = cli.window {
        config.explorer.window_size = window;
    }
    config.validate()?;

    tracing::info!(endpoint = %config.node.endpoint, "connecting to node");
    let client = NodeClient::connect(&config.node.endpoint, config.rpc_timeout()?)?;

    let explorer = Explorer::new(Arc::new(client)).with_window_size(config.explorer.window_size);
    let state = AppState::new(explorer, &config.server.www_root);

    run_server(state, &config.bind_address()).await
}
