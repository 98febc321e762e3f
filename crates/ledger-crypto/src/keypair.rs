// ledger-crypto/src/keypair.rs

use crate::{Address, CryptoError, CryptoResult, Hash, Signature};
use secp256k1::{Message, PublicKey as Secp256k1Pk, Secp256k1, SecretKey as Secp256k1Sk};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Compressed secp256k1 public key
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    bytes: Vec<u8>,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> CryptoResult<Self> {
        let key = Secp256k1Pk::from_slice(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self::from(key))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        Self::from_bytes(&bytes)
    }

    /// Derive an address from this public key
    pub fn to_address(&self) -> Address {
        Address::from_public_key(self)
    }
}

impl From<Secp256k1Pk> for PublicKey {
    fn from(key: Secp256k1Pk) -> Self {
        Self {
            bytes: key.serialize().to_vec(),
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PublicKey({}...)",
            hex::encode(&self.bytes[..8.min(self.bytes.len())])
        )
    }
}

/// Secret/Private key wrapper (kept private)
pub struct SecretKey {
    bytes: Vec<u8>,
}

impl SecretKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidSecretKey)?;
        Secp256k1Sk::from_slice(&bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self { bytes })
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        // Zero out the key material on drop
        self.bytes.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}

/// secp256k1 key pair
pub struct KeyPair {
    public_key: PublicKey,
    secret_key: SecretKey,
}

impl KeyPair {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        use rand::rngs::OsRng;

        let secp = Secp256k1::new();
        let mut rng = OsRng;
        let secret_key = Secp256k1Sk::new(&mut rng);
        let public_key = Secp256k1Pk::from_secret_key(&secp, &secret_key);

        Self {
            public_key: public_key.into(),
            secret_key: SecretKey {
                bytes: secret_key.secret_bytes().to_vec(),
            },
        }
    }

    /// Rebuild a keypair from its secret key
    pub fn from_secret_key(secret_key: SecretKey) -> CryptoResult<Self> {
        let secp = Secp256k1::signing_only();
        let sk = Secp256k1Sk::from_slice(secret_key.as_bytes())
            .map_err(|_| CryptoError::InvalidSecretKey)?;
        let public_key = Secp256k1Pk::from_secret_key(&secp, &sk);

        Ok(Self {
            public_key: public_key.into(),
            secret_key,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret_key
    }

    pub fn address(&self) -> Address {
        self.public_key.to_address()
    }

    /// Sign a 32-byte digest, producing a recoverable signature
    pub fn sign(&self, digest: &Hash) -> CryptoResult<Signature> {
        let secp = Secp256k1::signing_only();
        let secret_key = Secp256k1Sk::from_slice(self.secret_key.as_bytes())
            .map_err(|_| CryptoError::InvalidSecretKey)?;
        let msg = Message::from_digest_slice(digest.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)?;

        let signature = secp.sign_ecdsa_recoverable(&msg, &secret_key);
        Ok(Signature::from_recoverable(&signature))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
