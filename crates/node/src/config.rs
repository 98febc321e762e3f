// node/src/config.rs
use ledger_crypto::Address;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub data_dir: String,
    pub rpc: RpcConfig,
    pub chain: ChainConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub enabled: bool,
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// JSON file holding every block; loaded on start and written on stop
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_file: Option<String>,
    /// Receives the whole supply in the genesis block
    pub genesis_address: String,
    /// Supply in droplets
    pub genesis_coins: u64,
    pub genesis_timestamp: u64,
    /// Seconds between attempts to turn the unconfirmed pool into a block; 0 disables
    #[serde(default)]
    pub block_interval_seconds: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".into(),
            rpc: RpcConfig {
                enabled: true,
                listen_addr: SocketAddr::from(([127, 0, 0, 1], webrpc::server::DEFAULT_PORT)),
            },
            chain: ChainConfig {
                chain_file: None,
                genesis_address: Address::zero().to_string(),
                genesis_coins: 100_000_000 * ledger_core::DROPLETS_PER_COIN,
                genesis_timestamp: 1_426_562_704,
                block_interval_seconds: 10,
            },
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn genesis_address(&self) -> anyhow::Result<Address> {
        self.chain
            .genesis_address
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid genesis address {}: {}", self.chain.genesis_address, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert!(config.rpc.enabled);
        assert_eq!(config.rpc.listen_addr.port(), 6430);
        assert!(config.chain.chain_file.is_none());
        assert_eq!(config.genesis_address().unwrap(), Address::zero());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = NodeConfig::default();
        config.chain.chain_file = Some("./data/chain.json".into());

        let path = std::env::temp_dir().join(format!("ledger-node-config-{}.toml", std::process::id()));
        config.to_file(&path).unwrap();
        let loaded = NodeConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_block_interval_defaults_to_zero() {
        let toml = r#"
            data_dir = "./data"

            [rpc]
            enabled = false
            listen_addr = "127.0.0.1:6430"

            [chain]
            genesis_address = "x"
            genesis_coins = 1
            genesis_timestamp = 0
        "#;
        let config: NodeConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.chain.block_interval_seconds, 0);
        assert!(config.genesis_address().is_err());
    }
}
