// ledger-core/src/block.rs
use crate::codec::Encoder;
use crate::transaction::{Transaction, TransactionOutput};
use crate::{types::*, LedgerError, LedgerResult};
use ledger_crypto::{hash::Hashable, Address, Hash};
use serde::{Deserialize, Serialize};

/// Current block format version
pub const BLOCK_VERSION: u32 = 0;

/// Block header containing metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    /// Block timestamp
    pub time: Timestamp,
    /// Block sequence, genesis is 0
    pub seq: BlockSeq,
    /// Coin hours burned by the block's transactions
    pub fee: CoinHours,
    /// Hash of previous block header
    pub prev_hash: Hash,
    /// Hash of the block body
    pub body_hash: Hash,
}

impl BlockHeader {
    /// Calculate header hash
    pub fn hash(&self) -> Hash {
        let mut enc = Encoder::new();
        enc.u32(self.version)
            .u64(self.time)
            .u64(self.seq)
            .u64(self.fee)
            .hash(&self.prev_hash)
            .hash(&self.body_hash);
        enc.into_bytes().sha256()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
}

impl BlockBody {
    /// SHA-256 over the concatenated transaction ids
    pub fn hash(&self) -> Hash {
        let mut bytes = Vec::with_capacity(self.transactions.len() * 32);
        for txn in &self.transactions {
            bytes.extend_from_slice(txn.hash().as_bytes());
        }
        bytes.sha256()
    }
}

/// Complete block structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    /// Create the block that follows `prev`
    pub fn new(
        prev: &BlockHeader,
        transactions: Vec<Transaction>,
        time: Timestamp,
        fee: CoinHours,
    ) -> Self {
        let body = BlockBody { transactions };
        let header = BlockHeader {
            version: BLOCK_VERSION,
            time,
            seq: prev.seq + 1,
            fee,
            prev_hash: prev.hash(),
            body_hash: body.hash(),
        };
        Self { header, body }
    }

    /// Create the genesis block, which mints `coins` to `address`
    pub fn new_genesis(address: Address, coins: Droplets, time: Timestamp) -> Self {
        let txn = Transaction::new(
            Vec::new(),
            vec![TransactionOutput {
                address,
                coins,
                hours: coins,
            }],
        );
        let body = BlockBody {
            transactions: vec![txn],
        };
        let header = BlockHeader {
            version: BLOCK_VERSION,
            time,
            seq: 0,
            fee: 0,
            prev_hash: Hash::zero(),
            body_hash: body.hash(),
        };
        Self { header, body }
    }

    pub fn hash(&self) -> Hash {
        self.header.hash()
    }

    pub fn seq(&self) -> BlockSeq {
        self.header.seq
    }

    pub fn time(&self) -> Timestamp {
        self.header.time
    }

    /// Check that this block can follow `prev`
    pub fn verify_follows(&self, prev: &BlockHeader) -> LedgerResult<()> {
        if self.header.seq != prev.seq + 1 {
            return Err(LedgerError::InvalidBlock(format!(
                "invalid block seq: expected {}, got {}",
                prev.seq + 1,
                self.header.seq
            )));
        }
        if self.header.prev_hash != prev.hash() {
            return Err(LedgerError::InvalidBlock("previous hash mismatch".into()));
        }
        if self.header.time < prev.time {
            return Err(LedgerError::InvalidBlock(
                "block time is earlier than previous block".into(),
            ));
        }
        if self.header.body_hash != self.body.hash() {
            return Err(LedgerError::InvalidBlock("body hash mismatch".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_crypto::KeyPair;

    #[test]
    fn test_genesis() {
        let address = KeyPair::generate().address();
        let genesis = Block::new_genesis(address, 100 * DROPLETS_PER_COIN, 1_000);
        assert_eq!(genesis.seq(), 0);
        assert!(genesis.header.prev_hash.is_zero());
        assert_eq!(genesis.body.transactions.len(), 1);
        assert_eq!(genesis.body.transactions[0].outputs[0].address, address);
    }

    #[test]
    fn test_chain_linkage() {
        let genesis = Block::new_genesis(Address::zero(), 1, 1_000);
        let next = Block::new(&genesis.header, Vec::new(), 1_010, 0);
        assert_eq!(next.seq(), 1);
        assert!(next.verify_follows(&genesis.header).is_ok());

        let mut bad = next.clone();
        bad.header.seq = 5;
        assert!(bad.verify_follows(&genesis.header).is_err());

        let mut bad = next;
        bad.header.prev_hash = Hash::zero();
        assert!(bad.verify_follows(&genesis.header).is_err());
    }

    #[test]
    fn test_header_hash_changes() {
        let genesis = Block::new_genesis(Address::zero(), 1, 1_000);
        let mut other = genesis.header.clone();
        other.time += 1;
        assert_ne!(genesis.hash(), other.hash());
    }
}
