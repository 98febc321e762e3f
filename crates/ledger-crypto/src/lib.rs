// ledger-crypto/src/lib.rs

//! Cryptographic primitives for the ledger
//!
//! This crate provides:
//! - SHA-256 hashing and the fixed-size `Hash` type
//! - Base58 checksummed addresses
//! - secp256k1 key pairs with recoverable signatures

pub mod address;
pub mod hash;
pub mod keypair;
pub mod signature;

pub use address::Address;
pub use hash::{Hash, Hashable};
pub use keypair::{KeyPair, PublicKey, SecretKey};
pub use signature::Signature;

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid public key")]
    InvalidPublicKey,

    #[error("Invalid secret key")]
    InvalidSecretKey,

    #[error("Invalid hash: {0}")]
    InvalidHash(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}
