// node/src/runtime.rs
use crate::gateway::{unix_now, LedgerGateway};
use crate::ledger::Ledger;
use crate::NodeConfig;
use ledger_core::Block;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use webrpc::{ServerConfig, WebRpc};

pub struct Node {
    config: NodeConfig,
    ledger: Arc<RwLock<Ledger>>,
    rpc: Mutex<Option<Arc<WebRpc>>>,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl Node {
    /// Load the chain file if present, otherwise start from genesis
    pub fn new(config: NodeConfig) -> anyhow::Result<Self> {
        let ledger = match config.chain.chain_file.as_deref() {
            Some(path) if Path::new(path).exists() => {
                tracing::info!("Loading chain from {}", path);
                let contents = std::fs::read_to_string(path)?;
                let blocks: Vec<Block> = serde_json::from_str(&contents)?;
                Ledger::from_blocks(blocks)?
            }
            _ => {
                let address = config.genesis_address()?;
                tracing::info!("Creating genesis block for {}", address);
                Ledger::new(
                    address,
                    config.chain.genesis_coins,
                    config.chain.genesis_timestamp,
                )
            }
        };

        tracing::info!(
            "Ledger ready: head seq={} hash={}",
            ledger.head_seq(),
            ledger.head().hash()
        );

        Ok(Self {
            config,
            ledger: Arc::new(RwLock::new(ledger)),
            rpc: Mutex::new(None),
            producer: Mutex::new(None),
        })
    }

    pub async fn start(&self) -> anyhow::Result<()> {
        let mut rpc = self.rpc.lock().await;
        let mut producer = self.producer.lock().await;
        if rpc.is_some() || producer.is_some() {
            anyhow::bail!("node already started");
        }

        tracing::info!("Starting ledger node");

        if self.config.rpc.enabled {
            let gateway = Arc::new(LedgerGateway::new(self.ledger.clone()));
            let server = Arc::new(WebRpc::new(
                ServerConfig {
                    listen_addr: self.config.rpc.listen_addr,
                },
                gateway,
            ));
            let addr = server.start().await?;
            *rpc = Some(server);
            tracing::info!("RPC server started on {}", addr);
        }

        if self.config.chain.block_interval_seconds > 0 {
            *producer = Some(self.spawn_block_producer());
        }

        Ok(())
    }

    /// Stop the RPC server and block producer, then persist the chain
    pub async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!("Shutting down node...");

        if let Some(producer) = self.producer.lock().await.take() {
            producer.abort();
        }

        if let Some(server) = self.rpc.lock().await.take() {
            server.shutdown().await?;
        }

        if let Some(path) = &self.config.chain.chain_file {
            self.save_chain(path).await?;
        }

        tracing::info!("Node shutdown complete");
        Ok(())
    }

    /// Write every block to `path` as JSON
    pub async fn save_chain(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let ledger = self.ledger.read().await;
        let contents = serde_json::to_string_pretty(ledger.blocks())?;
        std::fs::write(path.as_ref(), contents)?;
        tracing::info!(
            "Saved {} blocks to {}",
            ledger.blocks().len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Bound RPC address, once the server is listening
    pub async fn rpc_addr(&self) -> Option<SocketAddr> {
        let server = self.rpc.lock().await.as_ref()?.clone();
        server.local_addr().await
    }

    pub fn ledger(&self) -> &Arc<RwLock<Ledger>> {
        &self.ledger
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Confirm the pool now, if it holds anything
    pub async fn produce_block(&self) -> anyhow::Result<Option<Block>> {
        Ok(self.ledger.write().await.create_block(unix_now())?)
    }

    fn spawn_block_producer(&self) -> JoinHandle<()> {
        let ledger = self.ledger.clone();
        let period = self.config.chain.block_interval_seconds;
        tracing::info!("Block producer started, interval {}s", period);

        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(period));
            loop {
                ticker.tick().await;
                let result = ledger.write().await.create_block(unix_now());
                match result {
                    Ok(Some(block)) => tracing::info!(
                        "Produced block {} with {} transactions",
                        block.seq(),
                        block.body.transactions.len()
                    ),
                    Ok(None) => tracing::trace!("Pool empty, no block produced"),
                    Err(e) => tracing::warn!("Block production failed: {}", e),
                }
            }
        })
    }
}
