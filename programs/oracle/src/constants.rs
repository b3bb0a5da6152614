/// UQ64.64 fixed-point one, the scale of cumulative prices.
pub const Q64: u128 = 1 << 64;

/// Maximum accepted age of a push-feed round, in seconds.
pub const MAX_FEED_AGE: i64 = 3_600;

/// Push feeds quoting in ETH use 18 decimals.
pub const FEED_ETH_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Push feeds quoting in USD use 8 decimals.
pub const FEED_USD_PRECISION: u128 = 100_000_000;

pub const MAX_GRANULARITY: usize = 64;
