// node/src/lib.rs
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod runtime;

pub use config::{ChainConfig, NodeConfig, RpcConfig};
pub use gateway::LedgerGateway;
pub use ledger::{Ledger, OutputPartitions};
pub use runtime::Node;
