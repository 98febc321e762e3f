// ledger-core/src/lib.rs

//! Core ledger data structures
//!
//! This crate provides:
//! - Unspent outputs (`UxOut`)
//! - Transactions and their binary wire encoding
//! - Blocks
//! - JSON-friendly "readable" projections of all of the above

pub mod block;
pub mod codec;
pub mod readable;
pub mod transaction;
pub mod types;
pub mod uxout;

pub use block::{Block, BlockBody, BlockHeader};
pub use readable::{
    ReadableBlock, ReadableBlockBody, ReadableBlockHeader, ReadableBlocks, ReadableOutput,
    ReadableOutputSet, ReadableOutputs, ReadableTransaction, ReadableTransactionOutput,
    TransactionResult, UxOutJson,
};
pub use transaction::{LedgerTransaction, Transaction, TransactionOutput, TransactionStatus};
pub use types::*;
pub use uxout::{UxBody, UxHead, UxOut};

use ledger_crypto::Hash;

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur in ledger operations
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Unknown output: {0}")]
    UnknownOutput(Hash),

    #[error("Output already spent: {0}")]
    OutputSpent(Hash),

    #[error("Transaction already known: {0}")]
    DuplicateTransaction(Hash),

    #[error("Cryptographic error: {0}")]
    CryptoError(#[from] ledger_crypto::CryptoError),

    #[error("Decode error: {0}")]
    DecodeError(String),
}
