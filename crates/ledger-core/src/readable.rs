// ledger-core/src/readable.rs

//! JSON-friendly projections of ledger objects
//!
//! Hashes and addresses render as strings and coin amounts as fixed-point
//! decimal strings. These are the shapes the RPC surface returns.

use crate::block::Block;
use crate::transaction::{LedgerTransaction, Transaction, TransactionStatus};
use crate::uxout::{UxBody, UxOut};
use crate::types::*;
use ledger_crypto::Hash;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableTransactionOutput {
    pub uxid: String,
    pub dst: String,
    pub coins: String,
    pub hours: CoinHours,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableTransaction {
    pub length: u32,
    #[serde(rename = "type")]
    pub kind: u8,
    pub txid: String,
    pub inner_hash: String,
    pub sigs: Vec<String>,
    pub inputs: Vec<String>,
    pub outputs: Vec<ReadableTransactionOutput>,
}

impl From<&Transaction> for ReadableTransaction {
    fn from(txn: &Transaction) -> Self {
        let txid = txn.hash();
        let outputs = txn
            .outputs
            .iter()
            .map(|o| {
                let uxid = UxBody {
                    src_transaction: txid,
                    address: o.address,
                    coins: o.coins,
                    hours: o.hours,
                }
                .hash();
                ReadableTransactionOutput {
                    uxid: uxid.to_hex(),
                    dst: o.address.to_string(),
                    coins: droplets_to_string(o.coins),
                    hours: o.hours,
                }
            })
            .collect();

        Self {
            length: txn.length,
            kind: txn.kind,
            txid: txid.to_hex(),
            inner_hash: txn.inner_hash.to_hex(),
            sigs: txn.sigs.iter().map(|s| s.to_hex()).collect(),
            inputs: txn.inputs.iter().map(|h| h.to_hex()).collect(),
            outputs,
        }
    }
}

/// A transaction with its confirmation status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub status: TransactionStatus,
    /// Confirmation time, 0 while unconfirmed
    pub time: Timestamp,
    pub txn: ReadableTransaction,
}

impl TransactionResult {
    pub fn new(txn: &LedgerTransaction) -> Self {
        Self {
            status: txn.status,
            time: txn.time,
            txn: ReadableTransaction::from(&txn.txn),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableBlockHeader {
    pub seq: BlockSeq,
    pub block_hash: String,
    pub previous_block_hash: String,
    pub timestamp: Timestamp,
    pub fee: CoinHours,
    pub version: u32,
    pub tx_body_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableBlockBody {
    pub txns: Vec<ReadableTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableBlock {
    pub header: ReadableBlockHeader,
    pub body: ReadableBlockBody,
}

impl From<&Block> for ReadableBlock {
    fn from(block: &Block) -> Self {
        let header = ReadableBlockHeader {
            seq: block.header.seq,
            block_hash: block.hash().to_hex(),
            previous_block_hash: block.header.prev_hash.to_hex(),
            timestamp: block.header.time,
            fee: block.header.fee,
            version: block.header.version,
            tx_body_hash: block.header.body_hash.to_hex(),
        };
        let body = ReadableBlockBody {
            txns: block
                .body
                .transactions
                .iter()
                .map(ReadableTransaction::from)
                .collect(),
        };
        Self { header, body }
    }
}

/// Ordered list of blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableBlocks {
    pub blocks: Vec<ReadableBlock>,
}

impl ReadableBlocks {
    pub fn new<'a>(blocks: impl IntoIterator<Item = &'a Block>) -> Self {
        Self {
            blocks: blocks.into_iter().map(ReadableBlock::from).collect(),
        }
    }
}

/// Unspent output as seen at some head time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableOutput {
    pub hash: String,
    pub time: Timestamp,
    pub block_seq: BlockSeq,
    pub src_tx: String,
    pub address: String,
    pub coins: String,
    pub hours: CoinHours,
    /// Hours including accrual up to the head time
    pub calculated_hours: CoinHours,
}

impl ReadableOutput {
    pub fn new(head_time: Timestamp, ux: &UxOut) -> Self {
        Self {
            hash: ux.hash().to_hex(),
            time: ux.head.time,
            block_seq: ux.head.bk_seq,
            src_tx: ux.body.src_transaction.to_hex(),
            address: ux.body.address.to_string(),
            coins: droplets_to_string(ux.body.coins),
            hours: ux.body.hours,
            calculated_hours: ux.coin_hours(head_time),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadableOutputs(pub Vec<ReadableOutput>);

impl ReadableOutputs {
    pub fn new(head_time: Timestamp, uxouts: &[UxOut]) -> Self {
        Self(
            uxouts
                .iter()
                .map(|ux| ReadableOutput::new(head_time, ux))
                .collect(),
        )
    }

    /// Newest first; equal times fall back to ascending hash
    pub fn sort_by_recency(&mut self) {
        self.0
            .sort_by(|a, b| b.time.cmp(&a.time).then_with(|| a.hash.cmp(&b.hash)));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ReadableOutput> {
        self.0.iter()
    }
}

/// Unspent outputs of a set of addresses, split by pending activity
///
/// An output appears in exactly one partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadableOutputSet {
    /// Confirmed and not spent by any pending transaction
    pub head_outputs: ReadableOutputs,
    /// Confirmed but spent by a pending transaction
    pub outgoing_outputs: ReadableOutputs,
    /// Created by a pending transaction
    pub incoming_outputs: ReadableOutputs,
}

impl ReadableOutputSet {
    pub fn sort_by_recency(&mut self) {
        self.head_outputs.sort_by_recency();
        self.outgoing_outputs.sort_by_recency();
        self.incoming_outputs.sort_by_recency();
    }
}

/// Address history entry for one output, spent or not
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxOutJson {
    pub uxid: String,
    pub time: Timestamp,
    pub src_block_seq: BlockSeq,
    pub src_tx: String,
    pub owner_address: String,
    pub coins: Droplets,
    pub hours: CoinHours,
    /// 0 while unspent
    pub spent_block_seq: BlockSeq,
    /// Zero hash while unspent
    pub spent_tx: String,
}

impl UxOutJson {
    pub fn new(ux: &UxOut, spent: Option<(BlockSeq, Hash)>) -> Self {
        let (spent_block_seq, spent_tx) = spent.unwrap_or((0, Hash::zero()));
        Self {
            uxid: ux.hash().to_hex(),
            time: ux.head.time,
            src_block_seq: ux.head.bk_seq,
            src_tx: ux.body.src_transaction.to_hex(),
            owner_address: ux.body.address.to_string(),
            coins: ux.body.coins,
            hours: ux.body.hours,
            spent_block_seq,
            spent_tx: spent_tx.to_hex(),
        }
    }
}
