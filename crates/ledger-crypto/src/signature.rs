// ledger-crypto/src/signature.rs

use crate::{Address, CryptoError, CryptoResult, Hash, PublicKey};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, Secp256k1};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Size of a recoverable signature: 64-byte compact form plus recovery id
pub const SIGNATURE_SIZE: usize = 65;

/// Recoverable secp256k1 signature
#[derive(Clone, PartialEq, Eq)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub(crate) fn from_recoverable(signature: &RecoverableSignature) -> Self {
        let (recovery_id, compact) = signature.serialize_compact();
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = recovery_id.to_i32() as u8;
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> CryptoResult<Self> {
        if slice.len() != SIGNATURE_SIZE {
            return Err(CryptoError::InvalidSignature);
        }
        let mut bytes = [0u8; SIGNATURE_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Get the signature bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidSignature)?;
        Self::from_slice(&bytes)
    }

    /// Recover the public key that produced this signature over `digest`
    pub fn recover(&self, digest: &Hash) -> CryptoResult<PublicKey> {
        let secp = Secp256k1::verification_only();
        let recovery_id =
            RecoveryId::from_i32(self.0[64] as i32).map_err(|_| CryptoError::InvalidSignature)?;
        let signature = RecoverableSignature::from_compact(&self.0[..64], recovery_id)
            .map_err(|_| CryptoError::InvalidSignature)?;
        let msg = Message::from_digest_slice(digest.as_bytes())
            .map_err(|_| CryptoError::InvalidSignature)?;

        let public_key = secp
            .recover_ecdsa(&msg, &signature)
            .map_err(|_| CryptoError::InvalidSignature)?;
        Ok(public_key.into())
    }

    /// Check that this signature over `digest` was made by the owner of `address`
    pub fn verify_address(&self, digest: &Hash, address: &Address) -> CryptoResult<()> {
        let public_key = self.recover(digest)?;
        if &public_key.to_address() != address {
            return Err(CryptoError::InvalidSignature);
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8]))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Hashable, KeyPair};

    #[test]
    fn test_signature_hex() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign(&b"payload".sha256()).unwrap();
        let parsed = Signature::from_hex(&signature.to_hex()).unwrap();
        assert_eq!(signature, parsed);
    }

    #[test]
    fn test_wrong_signer_rejected() {
        let signer = KeyPair::generate();
        let other = KeyPair::generate();
        let digest = b"payload".sha256();
        let signature = signer.sign(&digest).unwrap();
        assert_eq!(
            signature.verify_address(&digest, &other.address()),
            Err(CryptoError::InvalidSignature)
        );
    }

    #[test]
    fn test_wrong_digest_rejected() {
        let signer = KeyPair::generate();
        let signature = signer.sign(&b"payload".sha256()).unwrap();
        assert!(signature
            .verify_address(&b"other".sha256(), &signer.address())
            .is_err());
    }

    #[test]
    fn test_from_slice_length() {
        assert!(Signature::from_slice(&[0u8; 64]).is_err());
    }
}
