// ledger-core/src/transaction.rs

use crate::codec::{Decoder, Encoder};
use crate::uxout::{UxBody, UxHead, UxOut};
use crate::{types::*, LedgerError, LedgerResult};
use ledger_crypto::{hash::Hashable, Address, Hash, KeyPair, Signature};
use serde::{Deserialize, Serialize};

/// The only transaction kind currently defined
pub const TRANSACTION_KIND_TRANSFER: u8 = 0;

/// Output created by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub address: Address,
    pub coins: Droplets,
    pub hours: CoinHours,
}

/// Transfer transaction
///
/// Spends `inputs` (hashes of unspent outputs) and creates `outputs`. Each
/// input carries one signature over `inner_hash || input`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Length of the serialized transaction in bytes
    pub length: u32,
    pub kind: u8,
    /// Hash of inputs and outputs, the part the signatures commit to
    pub inner_hash: Hash,
    pub sigs: Vec<Signature>,
    pub inputs: Vec<Hash>,
    pub outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Create a new unsigned transaction
    pub fn new(inputs: Vec<Hash>, outputs: Vec<TransactionOutput>) -> Self {
        let mut txn = Self {
            length: 0,
            kind: TRANSACTION_KIND_TRANSFER,
            inner_hash: Hash::zero(),
            sigs: Vec::new(),
            inputs,
            outputs,
        };
        txn.finalize();
        txn
    }

    /// Hash over inputs and outputs only
    pub fn compute_inner_hash(&self) -> Hash {
        let mut enc = Encoder::new();
        enc.count(self.inputs.len());
        for input in &self.inputs {
            enc.hash(input);
        }
        enc.count(self.outputs.len());
        for output in &self.outputs {
            enc.address(&output.address).u64(output.coins).u64(output.hours);
        }
        enc.into_bytes().sha256()
    }

    /// Recompute `inner_hash` and `length`
    pub fn finalize(&mut self) {
        self.inner_hash = self.compute_inner_hash();
        self.length = self.serialized_len() as u32;
    }

    fn serialized_len(&self) -> usize {
        4 + 1 + 32
            + 4 + self.sigs.len() * ledger_crypto::signature::SIGNATURE_SIZE
            + 4 + self.inputs.len() * 32
            + 4 + self.outputs.len() * (21 + 8 + 8)
    }

    /// Digest the signature for input `i` commits to
    pub fn signing_digest(&self, i: usize) -> Option<Hash> {
        self.inputs.get(i).map(|input| self.inner_hash.add_hash(input))
    }

    /// Sign every input; `keys[i]` must own input `i`
    pub fn sign_inputs(&mut self, keys: &[KeyPair]) -> LedgerResult<()> {
        if keys.len() != self.inputs.len() {
            return Err(LedgerError::InvalidTransaction(format!(
                "expected {} keys, got {}",
                self.inputs.len(),
                keys.len()
            )));
        }

        self.inner_hash = self.compute_inner_hash();
        let mut sigs = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let digest = self.inner_hash.add_hash(&self.inputs[i]);
            sigs.push(key.sign(&digest)?);
        }
        self.sigs = sigs;
        self.finalize();
        Ok(())
    }

    /// Binary wire encoding
    pub fn serialize(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        enc.u32(self.length).u8(self.kind).hash(&self.inner_hash);
        enc.count(self.sigs.len());
        for sig in &self.sigs {
            enc.signature(sig);
        }
        enc.count(self.inputs.len());
        for input in &self.inputs {
            enc.hash(input);
        }
        enc.count(self.outputs.len());
        for output in &self.outputs {
            enc.address(&output.address).u64(output.coins).u64(output.hours);
        }
        enc.into_bytes()
    }

    /// Decode the binary wire encoding
    ///
    /// The whole buffer must be consumed and the embedded length must match it.
    pub fn deserialize(bytes: &[u8]) -> LedgerResult<Self> {
        let mut dec = Decoder::new(bytes);
        let length = dec.u32()?;
        let kind = dec.u8()?;
        let inner_hash = dec.hash()?;

        let n = dec.count()?;
        let mut sigs = Vec::with_capacity(n);
        for _ in 0..n {
            sigs.push(dec.signature()?);
        }

        let n = dec.count()?;
        let mut inputs = Vec::with_capacity(n);
        for _ in 0..n {
            inputs.push(dec.hash()?);
        }

        let n = dec.count()?;
        let mut outputs = Vec::with_capacity(n);
        for _ in 0..n {
            outputs.push(TransactionOutput {
                address: dec.address()?,
                coins: dec.u64()?,
                hours: dec.u64()?,
            });
        }
        dec.finish()?;

        if length as usize != bytes.len() {
            return Err(LedgerError::DecodeError(format!(
                "transaction length {} does not match {} bytes",
                length,
                bytes.len()
            )));
        }

        Ok(Self {
            length,
            kind,
            inner_hash,
            sigs,
            inputs,
            outputs,
        })
    }

    /// Hex of the binary encoding
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Transaction id
    pub fn hash(&self) -> Hash {
        self.serialize().sha256()
    }

    pub fn output_coins(&self) -> Option<Droplets> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.coins))
    }

    pub fn output_hours(&self) -> Option<CoinHours> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.hours))
    }

    /// Structural checks that need no ledger state
    pub fn verify(&self) -> LedgerResult<()> {
        if self.kind != TRANSACTION_KIND_TRANSFER {
            return Err(LedgerError::InvalidTransaction(format!(
                "unknown transaction kind {}",
                self.kind
            )));
        }
        if self.inputs.is_empty() {
            return Err(LedgerError::InvalidTransaction("no inputs".into()));
        }
        if self.outputs.is_empty() {
            return Err(LedgerError::InvalidTransaction("no outputs".into()));
        }
        if self.sigs.len() != self.inputs.len() {
            return Err(LedgerError::InvalidTransaction(
                "signature count does not match input count".into(),
            ));
        }
        if self.inner_hash != self.compute_inner_hash() {
            return Err(LedgerError::InvalidTransaction("invalid inner hash".into()));
        }
        let mut seen = std::collections::HashSet::new();
        if !self.inputs.iter().all(|input| seen.insert(*input)) {
            return Err(LedgerError::InvalidTransaction("duplicate input".into()));
        }
        if self.outputs.iter().any(|o| o.coins == 0) {
            return Err(LedgerError::InvalidTransaction("zero coin output".into()));
        }
        if self.output_coins().is_none() || self.output_hours().is_none() {
            return Err(LedgerError::InvalidTransaction("output overflow".into()));
        }
        Ok(())
    }

    /// Check each signature against the owner of the matching spent output
    pub fn verify_signatures(&self, uxins: &[UxOut]) -> LedgerResult<()> {
        if uxins.len() != self.inputs.len() || self.sigs.len() != self.inputs.len() {
            return Err(LedgerError::InvalidTransaction(
                "input count mismatch".into(),
            ));
        }
        for (i, (sig, ux)) in self.sigs.iter().zip(uxins).enumerate() {
            let digest = self.inner_hash.add_hash(&self.inputs[i]);
            sig.verify_address(&digest, &ux.body.address)?;
        }
        Ok(())
    }

    /// Outputs this transaction creates once included under `head`
    pub fn create_outputs(&self, head: UxHead) -> Vec<UxOut> {
        let txid = self.hash();
        self.outputs
            .iter()
            .map(|o| UxOut {
                head,
                body: UxBody {
                    src_transaction: txid,
                    address: o.address,
                    coins: o.coins,
                    hours: o.hours,
                },
            })
            .collect()
    }
}

/// Confirmation status of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub confirmed: bool,
    /// In the unconfirmed pool
    pub unconfirmed: bool,
    /// Number of blocks from the head down to (and including) the containing block
    pub height: u64,
    pub block_seq: BlockSeq,
    /// Neither confirmed nor pooled
    pub unknown: bool,
}

impl TransactionStatus {
    pub fn confirmed(head_seq: BlockSeq, block_seq: BlockSeq) -> Self {
        Self {
            confirmed: true,
            height: head_seq.saturating_sub(block_seq) + 1,
            block_seq,
            ..Default::default()
        }
    }

    pub fn unconfirmed() -> Self {
        Self {
            unconfirmed: true,
            ..Default::default()
        }
    }

    pub fn unknown() -> Self {
        Self {
            unknown: true,
            ..Default::default()
        }
    }
}

/// A transaction as the ledger knows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub txn: Transaction,
    pub status: TransactionStatus,
    /// Confirmation time, 0 while unconfirmed
    pub time: Timestamp,
}
