// ledger-core/src/codec.rs

//! Little-endian binary codec for the transaction wire format
//!
//! Variable-length sequences are prefixed with a `u32` element count.

use crate::{LedgerError, LedgerResult};
use ledger_crypto::address::ADDRESS_KEY_SIZE;
use ledger_crypto::hash::HASH_SIZE;
use ledger_crypto::signature::SIGNATURE_SIZE;
use ledger_crypto::{Address, Hash, Signature};

/// Upper bound on any decoded sequence length
const MAX_SEQUENCE_LEN: u32 = 1 << 16;

#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn hash(&mut self, h: &Hash) -> &mut Self {
        self.buf.extend_from_slice(h.as_bytes());
        self
    }

    pub fn address(&mut self, a: &Address) -> &mut Self {
        self.buf.extend_from_slice(a.key());
        self.buf.push(a.version());
        self
    }

    pub fn signature(&mut self, s: &Signature) -> &mut Self {
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Write a `u32` element count
    pub fn count(&mut self, n: usize) -> &mut Self {
        self.u32(n as u32)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug)]
pub struct Decoder<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize, what: &str) -> LedgerResult<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        match end {
            Some(end) => {
                let slice = &self.bytes[self.pos..end];
                self.pos = end;
                Ok(slice)
            }
            None => Err(LedgerError::DecodeError(format!(
                "not enough buffer data to decode {}",
                what
            ))),
        }
    }

    pub fn u8(&mut self) -> LedgerResult<u8> {
        Ok(self.take(1, "u8")?[0])
    }

    pub fn u32(&mut self) -> LedgerResult<u32> {
        let mut b = [0u8; 4];
        b.copy_from_slice(self.take(4, "u32")?);
        Ok(u32::from_le_bytes(b))
    }

    pub fn u64(&mut self) -> LedgerResult<u64> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8, "u64")?);
        Ok(u64::from_le_bytes(b))
    }

    pub fn hash(&mut self) -> LedgerResult<Hash> {
        Ok(Hash::from_slice(self.take(HASH_SIZE, "hash")?)?)
    }

    pub fn address(&mut self) -> LedgerResult<Address> {
        let mut key = [0u8; ADDRESS_KEY_SIZE];
        key.copy_from_slice(self.take(ADDRESS_KEY_SIZE, "address")?);
        let address = Address::new(key);
        let version = self.u8()?;
        if version != address.version() {
            return Err(LedgerError::DecodeError(format!(
                "invalid address version {}",
                version
            )));
        }
        Ok(address)
    }

    pub fn signature(&mut self) -> LedgerResult<Signature> {
        Ok(Signature::from_slice(self.take(SIGNATURE_SIZE, "signature")?)?)
    }

    /// Read a `u32` element count
    pub fn count(&mut self) -> LedgerResult<usize> {
        let n = self.u32()?;
        if n > MAX_SEQUENCE_LEN {
            return Err(LedgerError::DecodeError(format!(
                "sequence length {} exceeds limit",
                n
            )));
        }
        Ok(n as usize)
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Fail if any bytes remain unread
    pub fn finish(self) -> LedgerResult<()> {
        if self.pos != self.bytes.len() {
            return Err(LedgerError::DecodeError(format!(
                "{} trailing bytes after decode",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}
