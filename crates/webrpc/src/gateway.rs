// webrpc/src/gateway.rs
use async_trait::async_trait;
use ledger_core::{
    LedgerTransaction, ReadableBlocks, ReadableOutputSet, Timestamp, Transaction, UxOut,
    UxOutJson,
};
use ledger_crypto::{Address, Hash};

/// Restricts which unspent outputs a query returns
///
/// Several filters compose by intersection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputsFilter {
    /// Outputs owned by any of these addresses
    Addresses(Vec<Address>),
    /// Outputs with any of these hashes
    Hashes(Vec<Hash>),
}

impl OutputsFilter {
    pub fn matches(&self, ux: &UxOut) -> bool {
        match self {
            OutputsFilter::Addresses(addrs) => addrs.contains(&ux.body.address),
            OutputsFilter::Hashes(hashes) => hashes.contains(&ux.hash()),
        }
    }

    /// True when every filter accepts `ux`
    pub fn matches_all(filters: &[OutputsFilter], ux: &UxOut) -> bool {
        filters.iter().all(|f| f.matches(ux))
    }
}

/// Everything the RPC layer needs from the ledger node
///
/// Implementations are called concurrently from in-flight requests and
/// must synchronize internally.
#[async_trait]
pub trait Gatewayer: Send + Sync {
    /// The `n` most recent blocks, highest sequence last
    async fn get_last_blocks(&self, n: u64) -> anyhow::Result<ReadableBlocks>;

    /// Blocks in the inclusive sequence range
    async fn get_blocks(&self, start: u64, end: u64) -> anyhow::Result<ReadableBlocks>;

    /// Blocks at the given sequences, in request order
    async fn get_blocks_in_depth(&self, seqs: &[u64]) -> anyhow::Result<ReadableBlocks>;

    async fn get_unspent_outputs(
        &self,
        filters: &[OutputsFilter],
    ) -> anyhow::Result<ReadableOutputSet>;

    /// `Ok(None)` means the transaction is unknown
    async fn get_transaction(&self, txid: &Hash) -> anyhow::Result<Option<LedgerTransaction>>;

    /// Validate and broadcast a transaction
    async fn inject_transaction(&self, txn: Transaction) -> anyhow::Result<()>;

    async fn get_addr_uxouts(&self, address: &Address) -> anyhow::Result<Vec<UxOutJson>>;

    fn get_time_now(&self) -> Timestamp;
}
