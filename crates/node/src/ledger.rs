// node/src/ledger.rs

//! In-memory ledger: confirmed chain, unspent outputs and the unconfirmed pool

use ledger_core::{
    Block, BlockSeq, CoinHours, Droplets, LedgerError, LedgerResult, LedgerTransaction,
    Timestamp, Transaction, TransactionStatus, UxHead, UxOut, UxOutJson,
};
use ledger_crypto::{Address, Hash};
use std::collections::{HashMap, HashSet};

/// Unspent outputs split by pending activity; no output is in two partitions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPartitions {
    /// Confirmed and untouched by the pool
    pub head: Vec<UxOut>,
    /// Confirmed but spent by a pooled transaction
    pub outgoing: Vec<UxOut>,
    /// Created by a pooled transaction
    pub incoming: Vec<UxOut>,
}

pub struct Ledger {
    /// Indexed by sequence; never empty
    blocks: Vec<Block>,
    /// txid -> sequence of the containing block
    txn_index: HashMap<Hash, BlockSeq>,
    /// Every confirmed output, spent or not
    outputs: HashMap<Hash, UxOut>,
    /// uxid -> (block seq, txid) that spent it
    spent: HashMap<Hash, (BlockSeq, Hash)>,
    /// Outputs ever owned by an address, in creation order
    address_index: HashMap<Address, Vec<Hash>>,
    /// Unconfirmed pool in arrival order
    pool: Vec<Transaction>,
    /// uxid -> txid of the pooled transaction spending it
    pool_spends: HashMap<Hash, Hash>,
}

impl Ledger {
    /// Create a ledger whose genesis block mints `coins` to `address`
    pub fn new(address: Address, coins: Droplets, timestamp: Timestamp) -> Self {
        let genesis = Block::new_genesis(address, coins, timestamp);
        let mut ledger = Self::empty();
        ledger.connect(genesis);
        ledger
    }

    /// Rebuild a ledger by replaying a full chain, genesis first
    pub fn from_blocks(blocks: Vec<Block>) -> LedgerResult<Self> {
        let mut iter = blocks.into_iter();
        let genesis = iter
            .next()
            .ok_or_else(|| LedgerError::InvalidBlock("chain has no genesis block".into()))?;
        if genesis.seq() != 0 || !genesis.header.prev_hash.is_zero() {
            return Err(LedgerError::InvalidBlock("first block is not a genesis block".into()));
        }
        if genesis.header.body_hash != genesis.body.hash() {
            return Err(LedgerError::InvalidBlock("body hash mismatch".into()));
        }

        let mut ledger = Self::empty();
        ledger.connect(genesis);
        for block in iter {
            ledger.apply_block(block)?;
        }
        Ok(ledger)
    }

    fn empty() -> Self {
        Self {
            blocks: Vec::new(),
            txn_index: HashMap::new(),
            outputs: HashMap::new(),
            spent: HashMap::new(),
            address_index: HashMap::new(),
            pool: Vec::new(),
            pool_spends: HashMap::new(),
        }
    }

    pub fn head(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn head_seq(&self) -> BlockSeq {
        self.head().seq()
    }

    pub fn head_time(&self) -> Timestamp {
        self.head().time()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn pool(&self) -> &[Transaction] {
        &self.pool
    }

    fn unspent(&self, uxid: &Hash) -> Option<&UxOut> {
        if self.spent.contains_key(uxid) {
            return None;
        }
        self.outputs.get(uxid)
    }

    /// Look up the inputs of `txn`, failing on unknown or spent ones
    fn resolve_inputs(&self, txn: &Transaction) -> LedgerResult<Vec<UxOut>> {
        txn.inputs
            .iter()
            .map(|uxid| {
                if self.spent.contains_key(uxid) {
                    return Err(LedgerError::OutputSpent(*uxid));
                }
                self.outputs
                    .get(uxid)
                    .cloned()
                    .ok_or(LedgerError::UnknownOutput(*uxid))
            })
            .collect()
    }

    /// Check signatures and value conservation; returns the fee in coin hours
    fn check_spend(
        &self,
        txn: &Transaction,
        uxins: &[UxOut],
        head_time: Timestamp,
    ) -> LedgerResult<CoinHours> {
        txn.verify()?;
        txn.verify_signatures(uxins)?;

        let in_coins = uxins
            .iter()
            .try_fold(0u64, |acc, ux| acc.checked_add(ux.body.coins))
            .ok_or_else(|| LedgerError::InvalidTransaction("input coins overflow".into()))?;
        let in_hours = uxins
            .iter()
            .fold(0u64, |acc, ux| acc.saturating_add(ux.coin_hours(head_time)));
        let out_coins = txn.output_coins().unwrap_or(u64::MAX);
        let out_hours = txn.output_hours().unwrap_or(u64::MAX);

        if out_coins > in_coins {
            return Err(LedgerError::InvalidTransaction(format!(
                "outputs spend {} droplets but inputs hold {}",
                out_coins, in_coins
            )));
        }
        if out_hours > in_hours {
            return Err(LedgerError::InvalidTransaction(format!(
                "outputs spend {} coin hours but inputs hold {}",
                out_hours, in_hours
            )));
        }
        Ok(in_hours - out_hours)
    }

    /// Append a block that must follow the current head
    ///
    /// The block is fully validated before any state changes. Pooled
    /// transactions that the block confirms or conflicts with are dropped.
    pub fn apply_block(&mut self, block: Block) -> LedgerResult<()> {
        block.verify_follows(&self.head().header)?;

        let head_time = block.time();
        let mut spent_here = HashSet::new();
        for txn in &block.body.transactions {
            let txid = txn.hash();
            if self.txn_index.contains_key(&txid) {
                return Err(LedgerError::DuplicateTransaction(txid));
            }
            for input in &txn.inputs {
                if !spent_here.insert(*input) {
                    return Err(LedgerError::OutputSpent(*input));
                }
            }
            let uxins = self.resolve_inputs(txn)?;
            self.check_spend(txn, &uxins, head_time)?;
        }

        self.connect(block);
        Ok(())
    }

    /// Apply a block's effects without validation
    fn connect(&mut self, block: Block) {
        let seq = block.seq();
        let head = UxHead {
            time: block.time(),
            bk_seq: seq,
        };

        for txn in &block.body.transactions {
            let txid = txn.hash();
            for input in &txn.inputs {
                self.spent.insert(*input, (seq, txid));
            }
            for ux in txn.create_outputs(head) {
                let uxid = ux.hash();
                self.address_index
                    .entry(ux.body.address)
                    .or_default()
                    .push(uxid);
                self.outputs.insert(uxid, ux);
            }
            self.txn_index.insert(txid, seq);
        }

        tracing::debug!(
            seq,
            txns = block.body.transactions.len(),
            "block connected"
        );
        self.blocks.push(block);
        self.prune_pool();
    }

    /// Drop pooled transactions that are confirmed or no longer spendable
    fn prune_pool(&mut self) {
        let before = self.pool.len();
        let pool = std::mem::take(&mut self.pool);
        self.pool = pool
            .into_iter()
            .filter(|txn| {
                !self.txn_index.contains_key(&txn.hash())
                    && txn.inputs.iter().all(|uxid| self.unspent(uxid).is_some())
            })
            .collect();

        if self.pool.len() != before {
            self.pool_spends = self
                .pool
                .iter()
                .flat_map(|txn| {
                    let txid = txn.hash();
                    txn.inputs.iter().map(move |uxid| (*uxid, txid))
                })
                .collect();
            tracing::debug!(removed = before - self.pool.len(), "pool pruned");
        }
    }

    /// Validate a transaction against the head and add it to the pool
    pub fn inject(&mut self, txn: Transaction) -> LedgerResult<Hash> {
        let txid = txn.hash();
        if self.txn_index.contains_key(&txid) || self.pool.iter().any(|t| t.hash() == txid) {
            return Err(LedgerError::DuplicateTransaction(txid));
        }

        let uxins = self.resolve_inputs(&txn)?;
        if let Some(uxid) = txn.inputs.iter().find(|uxid| self.pool_spends.contains_key(*uxid)) {
            return Err(LedgerError::OutputSpent(*uxid));
        }
        self.check_spend(&txn, &uxins, self.head_time())?;

        for uxid in &txn.inputs {
            self.pool_spends.insert(*uxid, txid);
        }
        self.pool.push(txn);
        tracing::info!(%txid, pool = self.pool.len(), "transaction added to pool");
        Ok(txid)
    }

    /// Confirm the whole pool in a new block
    ///
    /// Returns `None` when the pool is empty. `time` is raised to the head
    /// time if the clock is behind.
    pub fn create_block(&mut self, time: Timestamp) -> LedgerResult<Option<Block>> {
        if self.pool.is_empty() {
            return Ok(None);
        }

        let time = time.max(self.head_time());
        let mut fee: CoinHours = 0;
        for txn in &self.pool {
            let uxins = self.resolve_inputs(txn)?;
            fee = fee.saturating_add(self.check_spend(txn, &uxins, time)?);
        }

        let block = Block::new(&self.head().header, self.pool.clone(), time, fee);
        self.apply_block(block.clone())?;
        tracing::info!(seq = block.seq(), txns = block.body.transactions.len(), "block created");
        Ok(Some(block))
    }

    /// The `n` newest blocks, oldest first
    pub fn last_blocks(&self, n: u64) -> &[Block] {
        let skip = self.blocks.len().saturating_sub(n.min(usize::MAX as u64) as usize);
        &self.blocks[skip..]
    }

    /// Blocks in the inclusive range, clipped to the chain
    pub fn blocks_in_range(&self, start: BlockSeq, end: BlockSeq) -> &[Block] {
        let len = self.blocks.len() as u64;
        if start > end || start >= len {
            return &[];
        }
        let end = end.min(len - 1);
        &self.blocks[start as usize..=end as usize]
    }

    /// Blocks at the given sequences in request order; unknown ones are skipped
    pub fn blocks_at(&self, seqs: &[BlockSeq]) -> Vec<&Block> {
        seqs.iter()
            .filter_map(|seq| usize::try_from(*seq).ok().and_then(|i| self.blocks.get(i)))
            .collect()
    }

    pub fn transaction(&self, txid: &Hash) -> Option<LedgerTransaction> {
        if let Some(seq) = self.txn_index.get(txid) {
            let block = &self.blocks[*seq as usize];
            let txn = block.body.transactions.iter().find(|t| &t.hash() == txid)?;
            return Some(LedgerTransaction {
                txn: txn.clone(),
                status: TransactionStatus::confirmed(self.head_seq(), *seq),
                time: block.time(),
            });
        }

        self.pool
            .iter()
            .find(|t| &t.hash() == txid)
            .map(|txn| LedgerTransaction {
                txn: txn.clone(),
                status: TransactionStatus::unconfirmed(),
                time: 0,
            })
    }

    /// Unspent outputs accepted by `filter`, partitioned by pool activity
    pub fn unspent_outputs(&self, filter: impl Fn(&UxOut) -> bool) -> OutputPartitions {
        let mut partitions = OutputPartitions::default();

        for (uxid, ux) in &self.outputs {
            if self.spent.contains_key(uxid) || !filter(ux) {
                continue;
            }
            if self.pool_spends.contains_key(uxid) {
                partitions.outgoing.push(ux.clone());
            } else {
                partitions.head.push(ux.clone());
            }
        }

        let pending_head = UxHead {
            time: self.head_time(),
            bk_seq: self.head_seq() + 1,
        };
        partitions.incoming = self
            .pool
            .iter()
            .flat_map(|txn| txn.create_outputs(pending_head))
            .filter(|ux| filter(ux))
            .collect();

        partitions
    }

    /// Every confirmed output an address has owned
    pub fn address_uxouts(&self, address: &Address) -> Vec<UxOutJson> {
        self.address_index
            .get(address)
            .map(|uxids| {
                uxids
                    .iter()
                    .filter_map(|uxid| self.outputs.get(uxid))
                    .map(|ux| UxOutJson::new(ux, self.spent.get(&ux.hash()).copied()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Sum of confirmed unspent coins owned by `address`
    pub fn balance(&self, address: &Address) -> Droplets {
        self.address_index
            .get(address)
            .into_iter()
            .flatten()
            .filter_map(|uxid| self.unspent(uxid))
            .map(|ux| ux.body.coins)
            .sum()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ledger_core::{TransactionOutput, DROPLETS_PER_COIN};
    use ledger_crypto::KeyPair;

    pub(crate) const GENESIS_TIME: Timestamp = 1_000_000;
    pub(crate) const SUPPLY: Droplets = 1_000 * DROPLETS_PER_COIN;

    pub(crate) fn genesis_ledger() -> (Ledger, KeyPair) {
        let owner = KeyPair::generate();
        (Ledger::new(owner.address(), SUPPLY, GENESIS_TIME), owner)
    }

    pub(crate) fn genesis_output(ledger: &Ledger) -> UxOut {
        let genesis = &ledger.blocks()[0];
        genesis.body.transactions[0]
            .create_outputs(UxHead {
                time: genesis.time(),
                bk_seq: 0,
            })
            .remove(0)
    }

    /// Spend `ux` into `to` and change back to the owner
    pub(crate) fn spend(ux: &UxOut, owner: &KeyPair, to: Address, coins: Droplets) -> Transaction {
        let mut outputs = vec![TransactionOutput {
            address: to,
            coins,
            hours: 1,
        }];
        if ux.body.coins > coins {
            outputs.push(TransactionOutput {
                address: owner.address(),
                coins: ux.body.coins - coins,
                hours: 1,
            });
        }
        let mut txn = Transaction::new(vec![ux.hash()], outputs);
        txn.sign_inputs(std::slice::from_ref(owner)).unwrap();
        txn
    }

    #[test]
    fn test_genesis() {
        let (ledger, owner) = genesis_ledger();
        assert_eq!(ledger.head_seq(), 0);
        assert_eq!(ledger.head_time(), GENESIS_TIME);
        assert_eq!(ledger.balance(&owner.address()), SUPPLY);
    }

    #[test]
    fn test_inject_and_create_block() {
        let (mut ledger, owner) = genesis_ledger();
        let recipient = KeyPair::generate().address();
        let txn = spend(&genesis_output(&ledger), &owner, recipient, 10 * DROPLETS_PER_COIN);
        let txid = ledger.inject(txn).unwrap();

        let pending = ledger.transaction(&txid).unwrap();
        assert!(pending.status.unconfirmed);
        assert_eq!(pending.time, 0);

        let block = ledger.create_block(GENESIS_TIME + 100).unwrap().unwrap();
        assert_eq!(block.seq(), 1);
        assert!(ledger.pool().is_empty());
        assert_eq!(ledger.balance(&recipient), 10 * DROPLETS_PER_COIN);
        assert_eq!(ledger.balance(&owner.address()), SUPPLY - 10 * DROPLETS_PER_COIN);

        let confirmed = ledger.transaction(&txid).unwrap();
        assert!(confirmed.status.confirmed);
        assert_eq!(confirmed.status.block_seq, 1);
        assert_eq!(confirmed.status.height, 1);
        assert_eq!(confirmed.time, GENESIS_TIME + 100);
    }

    #[test]
    fn test_create_block_empty_pool() {
        let (mut ledger, _) = genesis_ledger();
        assert!(ledger.create_block(GENESIS_TIME + 1).unwrap().is_none());
        assert_eq!(ledger.head_seq(), 0);
    }

    #[test]
    fn test_inject_rejections() {
        let (mut ledger, owner) = genesis_ledger();
        let ux = genesis_output(&ledger);
        let recipient = KeyPair::generate().address();

        // Wrong signer
        let thief = KeyPair::generate();
        let stolen = spend(&ux, &thief, recipient, DROPLETS_PER_COIN);
        assert!(ledger.inject(stolen).is_err());

        // Inflation
        let inflated = spend(&ux, &owner, recipient, SUPPLY + 1);
        assert!(matches!(
            ledger.inject(inflated),
            Err(LedgerError::InvalidTransaction(_))
        ));

        // Zero coins
        let zero = spend(&ux, &owner, recipient, 0);
        assert!(ledger.inject(zero).is_err());

        // Accepted once, then duplicate, then double spend against the pool
        let first = spend(&ux, &owner, recipient, DROPLETS_PER_COIN);
        ledger.inject(first.clone()).unwrap();
        assert!(matches!(
            ledger.inject(first),
            Err(LedgerError::DuplicateTransaction(_))
        ));
        let second = spend(&ux, &owner, recipient, 2 * DROPLETS_PER_COIN);
        assert!(matches!(ledger.inject(second), Err(LedgerError::OutputSpent(_))));

        // Unknown input
        let mut ghost = ux.clone();
        ghost.body.coins += 1;
        let unknown = spend(&ghost, &owner, recipient, DROPLETS_PER_COIN);
        assert!(matches!(ledger.inject(unknown), Err(LedgerError::UnknownOutput(_))));
    }

    #[test]
    fn test_partitions_are_disjoint() {
        let (mut ledger, owner) = genesis_ledger();
        let recipient = KeyPair::generate().address();
        let ux = genesis_output(&ledger);
        let all = |_: &UxOut| true;

        let before = ledger.unspent_outputs(all);
        assert_eq!(before.head, vec![ux.clone()]);
        assert!(before.outgoing.is_empty() && before.incoming.is_empty());

        ledger
            .inject(spend(&ux, &owner, recipient, DROPLETS_PER_COIN))
            .unwrap();
        let pending = ledger.unspent_outputs(all);
        assert!(pending.head.is_empty());
        assert_eq!(pending.outgoing, vec![ux]);
        assert_eq!(pending.incoming.len(), 2);
        assert!(pending.incoming.iter().all(|o| o.head.bk_seq == 1));

        let mine = ledger.unspent_outputs(|o| o.body.address == recipient);
        assert_eq!(mine.incoming.len(), 1);
        assert!(mine.outgoing.is_empty());
    }

    #[test]
    fn test_apply_block_rejects_bad_linkage() {
        let (mut ledger, _) = genesis_ledger();
        let orphan = Block::new(&ledger.head().header, Vec::new(), GENESIS_TIME + 1, 0);
        let mut skipped = orphan.clone();
        skipped.header.seq = 5;
        assert!(ledger.apply_block(skipped).is_err());
        ledger.apply_block(orphan).unwrap();
        assert_eq!(ledger.head_seq(), 1);
    }

    #[test]
    fn test_block_queries() {
        let (mut ledger, _) = genesis_ledger();
        for i in 1..=4 {
            let block = Block::new(&ledger.head().header, Vec::new(), GENESIS_TIME + i, 0);
            ledger.apply_block(block).unwrap();
        }

        let last: Vec<_> = ledger.last_blocks(2).iter().map(|b| b.seq()).collect();
        assert_eq!(last, vec![3, 4]);
        let range: Vec<_> = ledger.blocks_in_range(1, 9).iter().map(|b| b.seq()).collect();
        assert_eq!(range, vec![1, 2, 3, 4]);
        assert!(ledger.blocks_in_range(3, 2).is_empty());
        let picked: Vec<_> = ledger.blocks_at(&[4, 0, 99]).iter().map(|b| b.seq()).collect();
        assert_eq!(picked, vec![4, 0]);
    }

    #[test]
    fn test_address_history_and_replay() {
        let (mut ledger, owner) = genesis_ledger();
        let recipient = KeyPair::generate().address();
        let ux = genesis_output(&ledger);
        let txn = spend(&ux, &owner, recipient, DROPLETS_PER_COIN);
        let txid = txn.hash();
        ledger.inject(txn).unwrap();
        ledger.create_block(GENESIS_TIME + 60).unwrap();

        let history = ledger.address_uxouts(&owner.address());
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].uxid, ux.hash().to_hex());
        assert_eq!(history[0].spent_block_seq, 1);
        assert_eq!(history[0].spent_tx, txid.to_hex());
        assert_eq!(history[1].spent_block_seq, 0);

        let replayed = Ledger::from_blocks(ledger.blocks().to_vec()).unwrap();
        assert_eq!(replayed.head().hash(), ledger.head().hash());
        assert_eq!(replayed.balance(&recipient), DROPLETS_PER_COIN);
        assert!(Ledger::from_blocks(Vec::new()).is_err());
    }
}
