// node/src/gateway.rs
use crate::ledger::Ledger;
use async_trait::async_trait;
use ledger_core::{
    LedgerTransaction, ReadableBlocks, ReadableOutputSet, ReadableOutputs, Timestamp,
    Transaction, UxOutJson,
};
use ledger_crypto::{Address, Hash};
use std::sync::Arc;
use tokio::sync::RwLock;
use webrpc::{Gatewayer, OutputsFilter};

/// Current Unix time in seconds
pub fn unix_now() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as Timestamp
}

/// [`Gatewayer`] backed by the node's in-memory ledger
#[derive(Clone)]
pub struct LedgerGateway {
    ledger: Arc<RwLock<Ledger>>,
    clock: fn() -> Timestamp,
}

impl LedgerGateway {
    pub fn new(ledger: Arc<RwLock<Ledger>>) -> Self {
        Self::with_clock(ledger, unix_now)
    }

    pub fn with_clock(ledger: Arc<RwLock<Ledger>>, clock: fn() -> Timestamp) -> Self {
        Self { ledger, clock }
    }
}

#[async_trait]
impl Gatewayer for LedgerGateway {
    async fn get_last_blocks(&self, n: u64) -> anyhow::Result<ReadableBlocks> {
        let ledger = self.ledger.read().await;
        Ok(ReadableBlocks::new(ledger.last_blocks(n)))
    }

    async fn get_blocks(&self, start: u64, end: u64) -> anyhow::Result<ReadableBlocks> {
        let ledger = self.ledger.read().await;
        Ok(ReadableBlocks::new(ledger.blocks_in_range(start, end)))
    }

    async fn get_blocks_in_depth(&self, seqs: &[u64]) -> anyhow::Result<ReadableBlocks> {
        let ledger = self.ledger.read().await;
        Ok(ReadableBlocks::new(ledger.blocks_at(seqs)))
    }

    async fn get_unspent_outputs(
        &self,
        filters: &[OutputsFilter],
    ) -> anyhow::Result<ReadableOutputSet> {
        let ledger = self.ledger.read().await;
        let head_time = ledger.head_time();
        let partitions = ledger.unspent_outputs(|ux| OutputsFilter::matches_all(filters, ux));

        Ok(ReadableOutputSet {
            head_outputs: ReadableOutputs::new(head_time, &partitions.head),
            outgoing_outputs: ReadableOutputs::new(head_time, &partitions.outgoing),
            incoming_outputs: ReadableOutputs::new(head_time, &partitions.incoming),
        })
    }

    async fn get_transaction(&self, txid: &Hash) -> anyhow::Result<Option<LedgerTransaction>> {
        Ok(self.ledger.read().await.transaction(txid))
    }

    async fn inject_transaction(&self, txn: Transaction) -> anyhow::Result<()> {
        self.ledger.write().await.inject(txn)?;
        Ok(())
    }

    async fn get_addr_uxouts(&self, address: &Address) -> anyhow::Result<Vec<UxOutJson>> {
        Ok(self.ledger.read().await.address_uxouts(address))
    }

    fn get_time_now(&self) -> Timestamp {
        (self.clock)()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::{genesis_ledger, genesis_output, spend, GENESIS_TIME};
    use ledger_core::DROPLETS_PER_COIN;
    use ledger_crypto::KeyPair;

    fn fixed_clock() -> Timestamp {
        GENESIS_TIME + 42
    }

    #[tokio::test]
    async fn test_blocks_and_clock() {
        let (ledger, _) = genesis_ledger();
        let genesis_hash = ledger.head().hash().to_hex();
        let gw = LedgerGateway::with_clock(Arc::new(RwLock::new(ledger)), fixed_clock);

        let last = gw.get_last_blocks(1).await.unwrap();
        assert_eq!(last.blocks.len(), 1);
        assert_eq!(last.blocks[0].header.block_hash, genesis_hash);
        assert_eq!(gw.get_blocks(0, 0).await.unwrap(), last);
        assert_eq!(gw.get_blocks_in_depth(&[0]).await.unwrap(), last);
        assert_eq!(gw.get_time_now(), GENESIS_TIME + 42);
    }

    #[tokio::test]
    async fn test_inject_then_query() {
        let (ledger, owner) = genesis_ledger();
        let ux = genesis_output(&ledger);
        let recipient = KeyPair::generate().address();
        let gw = LedgerGateway::new(Arc::new(RwLock::new(ledger)));

        let txn = spend(&ux, &owner, recipient, DROPLETS_PER_COIN);
        let txid = txn.hash();
        gw.inject_transaction(txn.clone()).await.unwrap();
        assert!(gw.inject_transaction(txn).await.is_err());

        let found = gw.get_transaction(&txid).await.unwrap().unwrap();
        assert!(found.status.unconfirmed);
        assert!(gw.get_transaction(&Hash::zero()).await.unwrap().is_none());

        let set = gw
            .get_unspent_outputs(&[OutputsFilter::Addresses(vec![owner.address()])])
            .await
            .unwrap();
        assert!(set.head_outputs.is_empty());
        assert_eq!(set.outgoing_outputs.len(), 1);
        assert_eq!(set.incoming_outputs.len(), 1);

        let history = gw.get_addr_uxouts(&owner.address()).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_unix_now() {
        assert!(unix_now() > 1_000_000_000);
    }
}
