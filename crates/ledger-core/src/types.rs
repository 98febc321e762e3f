// ledger-core/src/types.rs

/// Block sequence number (height of the block, genesis is 0)
pub type BlockSeq = u64;

/// Timestamp in Unix epoch seconds
pub type Timestamp = u64;

/// Coin amount in droplets
pub type Droplets = u64;

/// Coin hours
pub type CoinHours = u64;

/// Number of decimal places a coin amount is rendered with
pub const DROPLET_PRECISION: u32 = 6;

/// Droplets in one whole coin
pub const DROPLETS_PER_COIN: Droplets = 10u64.pow(DROPLET_PRECISION);

/// Render droplets as a fixed-point coin string, e.g. `1500000` -> `"1.500000"`
pub fn droplets_to_string(droplets: Droplets) -> String {
    format!(
        "{}.{:0width$}",
        droplets / DROPLETS_PER_COIN,
        droplets % DROPLETS_PER_COIN,
        width = DROPLET_PRECISION as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_droplets_to_string() {
        assert_eq!(droplets_to_string(0), "0.000000");
        assert_eq!(droplets_to_string(1), "0.000001");
        assert_eq!(droplets_to_string(1_500_000), "1.500000");
        assert_eq!(droplets_to_string(123 * DROPLETS_PER_COIN), "123.000000");
    }
}
