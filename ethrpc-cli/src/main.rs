use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethrpc_core::{ChainBuilder, HttpTransport, HttpTransportConfig, NetworkConfig};
use ethrpc_interceptors::default_registry;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ethrpc")]
#[command(about = "Send Ethereum JSON-RPC calls through the interceptor chain")]
#[command(version)]
pub struct Cli {
    /// JSON-RPC endpoint (defaults to the network config's `host`)
    #[arg(short, long)]
    rpc_url: Option<String>,

    /// Network configuration file (.toml, .yaml or .json)
    #[arg(short, long)]
    network_config: Option<PathBuf>,

    /// Declare the network as forked from this origin
    #[arg(long)]
    fork: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Send one call and print the response
    Call {
        /// Method name, e.g. eth_blockNumber
        method: String,

        /// Positional parameters as a JSON array
        #[arg(default_value = "[]")]
        params: String,
    },
    /// Print the interceptors the chain was built with
    Layers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    info!("ethrpc-core {}", ethrpc_core::VERSION);

    let mut network = match &cli.network_config {
        Some(path) => NetworkConfig::load(path)
            .with_context(|| format!("loading network config {}", path.display()))?,
        None => NetworkConfig::new(),
    };
    if let Some(origin) = &cli.fork {
        network.insert("fork", origin.clone());
    }

    let url = cli
        .rpc_url
        .clone()
        .or_else(|| network.host().map(str::to_string))
        .context("no RPC endpoint: pass --rpc-url or set `host` in the network config")?;

    let transport_config =
        HttpTransportConfig::new(&url)?.with_timeout(Duration::from_secs(cli.timeout_secs));
    let transport = Arc::new(HttpTransport::with_config(transport_config)?);

    let registry = default_registry();
    let chain = ChainBuilder::new(&registry)
        .build(transport, &network)
        .await
        .with_context(|| format!("building interceptor chain for {}", url))?;

    match cli.command {
        Commands::Call { method, params } => {
            let params: Vec<Value> =
                serde_json::from_str(&params).context("params must be a JSON array")?;
            info!("Calling {} with {} param(s)", method, params.len());

            let response = chain.send(&method, params).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.is_error() {
                anyhow::bail!("node returned an error for {}", method);
            }
        }
        Commands::Layers => {
            if chain.is_empty() {
                println!("(no interceptors apply)");
            }
            for (name, layer) in chain.interceptor_names().iter().zip(chain.layers()) {
                println!("{:>6}  {}", layer.value(), name);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
