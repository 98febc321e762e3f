// node/src/main.rs
use clap::{Parser, Subcommand};
use ledger_node::{Node, NodeConfig};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webrpc::Client;

#[derive(Parser)]
#[command(name = "ledger-node")]
#[command(about = "Ledger node with a JSON-RPC 2.0 gateway", version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the node and its RPC server
    Start {
        /// Configuration file path
        #[arg(short, long, default_value = "./config.toml")]
        config: String,

        /// Override the RPC listen address
        #[arg(long)]
        rpc_addr: Option<SocketAddr>,
    },

    /// Initialize a new node with a fresh genesis key
    Init {
        /// Data directory
        #[arg(short, long, default_value = "./data")]
        data_dir: String,
    },

    /// Show status of a running node
    Status {
        #[arg(long, default_value = "127.0.0.1:6430")]
        rpc: String,
    },

    /// Query blocks from a running node
    Blocks {
        #[arg(long, default_value = "127.0.0.1:6430")]
        rpc: String,

        /// Fetch the most recent N blocks
        #[arg(long, conflicts_with_all = ["start", "end"])]
        last: Option<u64>,

        #[arg(long, requires = "end")]
        start: Option<u64>,

        #[arg(long, requires = "start")]
        end: Option<u64>,
    },

    /// Show unspent outputs of addresses
    Outputs {
        #[arg(long, default_value = "127.0.0.1:6430")]
        rpc: String,

        #[arg(required = true)]
        addresses: Vec<String>,
    },

    /// Look up a transaction by id
    Transaction {
        #[arg(long, default_value = "127.0.0.1:6430")]
        rpc: String,

        txid: String,
    },

    /// Submit a hex-encoded signed transaction
    Inject {
        #[arg(long, default_value = "127.0.0.1:6430")]
        rpc: String,

        raw: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "ledger_node={},webrpc={},hyper=warn",
                    log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Start { config, rpc_addr } => {
            start_node(&config, rpc_addr).await?;
        }
        Commands::Init { data_dir } => {
            init_node(&data_dir).await?;
        }
        Commands::Status { rpc } => {
            print_json(&Client::new(rpc).get_status().await?)?;
        }
        Commands::Blocks {
            rpc,
            last,
            start,
            end,
        } => {
            let client = Client::new(rpc);
            let blocks = match (start, end) {
                (Some(start), Some(end)) => client.get_blocks(start, end).await?,
                _ => client.get_last_blocks(last.unwrap_or(1)).await?,
            };
            print_json(&blocks)?;
        }
        Commands::Outputs { rpc, addresses } => {
            print_json(&Client::new(rpc).get_unspent_outputs(&addresses).await?)?;
        }
        Commands::Transaction { rpc, txid } => {
            print_json(&Client::new(rpc).get_transaction_by_id(&txid).await?)?;
        }
        Commands::Inject { rpc, raw } => {
            let txid = Client::new(rpc).inject_transaction_str(&raw).await?;
            println!("{}", txid);
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn start_node(config_path: &str, rpc_addr: Option<SocketAddr>) -> anyhow::Result<()> {
    tracing::info!("Loading configuration from {}", config_path);
    let mut config = NodeConfig::from_file(config_path)?;

    if let Some(addr) = rpc_addr {
        config.rpc.listen_addr = addr;
    }

    let node = Node::new(config)?;
    node.start().await?;

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");

    node.stop().await?;
    tracing::info!("Node stopped gracefully");

    Ok(())
}

async fn init_node(data_dir: &str) -> anyhow::Result<()> {
    tracing::info!("Initializing node at {}", data_dir);
    let dir = Path::new(data_dir);
    std::fs::create_dir_all(dir.join("keys"))?;

    let keypair = ledger_crypto::KeyPair::generate();
    let key_json = serde_json::json!({
        "public_key": keypair.public_key().to_hex(),
        "secret_key": keypair.secret_key().to_hex(),
        "address": keypair.address().to_string(),
    });
    let key_path = dir.join("keys").join("genesis.json");
    std::fs::write(&key_path, serde_json::to_string_pretty(&key_json)?)?;
    tracing::info!("Genesis keypair saved to {}", key_path.display());
    tracing::warn!("Keep this file secure!");

    let mut config = NodeConfig::default();
    config.data_dir = data_dir.to_string();
    config.chain.genesis_address = keypair.address().to_string();
    config.chain.chain_file = Some(dir.join("chain.json").to_string_lossy().into_owned());

    let node = Node::new(config.clone())?;
    if let Some(chain_file) = &config.chain.chain_file {
        node.save_chain(chain_file).await?;
    }

    let config_path = dir.join("config.toml");
    config.to_file(&config_path)?;

    tracing::info!("Node initialized successfully at {}", data_dir);
    tracing::info!("Edit {} to configure your node", config_path.display());

    Ok(())
}
