// ledger-core/src/uxout.rs

use crate::codec::Encoder;
use crate::types::*;
use ledger_crypto::{hash::Hashable, Address, Hash};
use serde::{Deserialize, Serialize};

/// Seconds of holding one whole coin that accrue one coin hour
const COIN_HOUR_SECONDS: u64 = 3600;

/// Where and when an output was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxHead {
    /// Timestamp of the block that created the output
    pub time: Timestamp,
    /// Sequence of the block that created the output
    pub bk_seq: BlockSeq,
}

/// What an output holds; its hash identifies the output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxBody {
    pub src_transaction: Hash,
    pub address: Address,
    pub coins: Droplets,
    pub hours: CoinHours,
}

impl UxBody {
    pub fn hash(&self) -> Hash {
        let mut enc = Encoder::new();
        enc.hash(&self.src_transaction)
            .address(&self.address)
            .u64(self.coins)
            .u64(self.hours);
        enc.into_bytes().sha256()
    }
}

/// Unspent transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UxOut {
    pub head: UxHead,
    pub body: UxBody,
}

impl UxOut {
    /// Output id, independent of the block it landed in
    pub fn hash(&self) -> Hash {
        self.body.hash()
    }

    /// Coin hours the output holds at `head_time`, including accrued hours
    ///
    /// Saturates instead of overflowing; a `head_time` earlier than the
    /// output's creation accrues nothing.
    pub fn coin_hours(&self, head_time: Timestamp) -> CoinHours {
        let elapsed = head_time.saturating_sub(self.head.time);
        let whole_coins = self.body.coins / DROPLETS_PER_COIN;
        let accrued = whole_coins.saturating_mul(elapsed) / COIN_HOUR_SECONDS;
        self.body.hours.saturating_add(accrued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uxout(coins: Droplets, hours: CoinHours, time: Timestamp) -> UxOut {
        UxOut {
            head: UxHead { time, bk_seq: 1 },
            body: UxBody {
                src_transaction: Hash::zero(),
                address: Address::zero(),
                coins,
                hours,
            },
        }
    }

    #[test]
    fn test_hash_ignores_head() {
        let a = uxout(1, 1, 100);
        let mut b = a.clone();
        b.head.time = 200;
        b.head.bk_seq = 9;
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_depends_on_body() {
        let a = uxout(1, 1, 100);
        let b = uxout(2, 1, 100);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_coin_hours_accrue() {
        let ux = uxout(10 * DROPLETS_PER_COIN, 5, 1_000);
        assert_eq!(ux.coin_hours(1_000), 5);
        assert_eq!(ux.coin_hours(1_000 + 3600), 15);
        assert_eq!(ux.coin_hours(1_000 + 1800), 10);
    }

    #[test]
    fn test_coin_hours_before_creation() {
        let ux = uxout(10 * DROPLETS_PER_COIN, 5, 1_000);
        assert_eq!(ux.coin_hours(0), 5);
    }

    #[test]
    fn test_coin_hours_saturate() {
        let ux = uxout(u64::MAX, u64::MAX - 1, 0);
        assert_eq!(ux.coin_hours(u64::MAX), u64::MAX);
    }
}
