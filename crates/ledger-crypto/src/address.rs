// ledger-crypto/src/address.rs

use crate::{hash::Hashable, CryptoError, CryptoResult, PublicKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of the key portion of an address
pub const ADDRESS_KEY_SIZE: usize = 20;

/// Length of the checksum appended to the base58 form
const CHECKSUM_SIZE: usize = 4;

/// Version byte of every address this ledger issues
pub const ADDRESS_VERSION: u8 = 0;

/// Ledger address derived from a public key
///
/// The string form is base58 of `key || version || checksum`, where the
/// checksum is the first four bytes of SHA-256(`key || version`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    version: u8,
    key: [u8; ADDRESS_KEY_SIZE],
}

impl Address {
    /// Create address from key bytes
    pub fn new(key: [u8; ADDRESS_KEY_SIZE]) -> Self {
        Self {
            version: ADDRESS_VERSION,
            key,
        }
    }

    /// Derive address from public key (last 20 bytes of its SHA-256)
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let hash = public_key.as_bytes().sha256();
        let mut key = [0u8; ADDRESS_KEY_SIZE];
        key.copy_from_slice(&hash.as_bytes()[12..32]);
        Self::new(key)
    }

    pub fn key(&self) -> &[u8; ADDRESS_KEY_SIZE] {
        &self.key
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn zero() -> Self {
        Self::new([0u8; ADDRESS_KEY_SIZE])
    }

    fn checksum(&self) -> [u8; CHECKSUM_SIZE] {
        let mut payload = Vec::with_capacity(ADDRESS_KEY_SIZE + 1);
        payload.extend_from_slice(&self.key);
        payload.push(self.version);
        let digest = payload.sha256();
        let mut checksum = [0u8; CHECKSUM_SIZE];
        checksum.copy_from_slice(&digest.as_bytes()[..CHECKSUM_SIZE]);
        checksum
    }

    /// Encode as base58
    pub fn to_base58(&self) -> String {
        let mut bytes = Vec::with_capacity(ADDRESS_KEY_SIZE + 1 + CHECKSUM_SIZE);
        bytes.extend_from_slice(&self.key);
        bytes.push(self.version);
        bytes.extend_from_slice(&self.checksum());
        bs58::encode(bytes).into_string()
    }

    /// Decode from base58, verifying length, version and checksum
    pub fn from_base58(s: &str) -> CryptoResult<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CryptoError::InvalidAddress(e.to_string()))?;
        if bytes.len() != ADDRESS_KEY_SIZE + 1 + CHECKSUM_SIZE {
            return Err(CryptoError::InvalidAddress("invalid address length".into()));
        }

        let mut key = [0u8; ADDRESS_KEY_SIZE];
        key.copy_from_slice(&bytes[..ADDRESS_KEY_SIZE]);
        let address = Self {
            version: bytes[ADDRESS_KEY_SIZE],
            key,
        };

        if address.version != ADDRESS_VERSION {
            return Err(CryptoError::InvalidAddress("invalid address version".into()));
        }
        if bytes[ADDRESS_KEY_SIZE + 1..] != address.checksum() {
            return Err(CryptoError::InvalidAddress("invalid address checksum".into()));
        }

        Ok(address)
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KeyPair;

    #[test]
    fn test_address_derivation() {
        let keypair = KeyPair::generate();
        let address1 = keypair.public_key().to_address();
        let address2 = Address::from_public_key(keypair.public_key());
        assert_eq!(address1, address2);
    }

    #[test]
    fn test_address_base58() {
        let address = KeyPair::generate().address();
        let parsed: Address = address.to_string().parse().unwrap();
        assert_eq!(address, parsed);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("invalid-address-foo".parse::<Address>().is_err());
        assert!("foo".parse::<Address>().is_err());
        assert!("".parse::<Address>().is_err());
    }

    #[test]
    fn test_rejects_bad_checksum() {
        let address = KeyPair::generate().address();
        let mut bytes = bs58::decode(address.to_base58()).into_vec().unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = bs58::encode(bytes).into_string();
        assert_eq!(
            tampered.parse::<Address>(),
            Err(CryptoError::InvalidAddress("invalid address checksum".into()))
        );
    }

    #[test]
    fn test_json_is_base58_string() {
        let address = KeyPair::generate().address();
        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, format!("\"{}\"", address));
        assert!(serde_json::from_str::<Address>("\"foo\"").is_err());
    }
}
