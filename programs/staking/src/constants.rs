/// Fixed-point scale for `acc_tkn_per_share`.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Scale for lock-tier multipliers and fees (10_000 = 1x / 100%).
pub const BPS_SCALE: u64 = 10_000;

/// Extra precision divisor applied to the daily emission rate.
pub const RATE_DIVISOR: u64 = 10;

/// Pool id of the designated lock pool.
pub const LOCK_POOL_ID: u64 = 0;

pub const MAX_POOLS: usize = 16;
pub const MAX_LOCK_TIERS: usize = 8;
pub const MAX_LOCK_DEPOSITS: usize = 64;
pub const MAX_HELD_IDS: usize = 64;
pub const MAX_POOL_HELD_IDS: usize = 256;

pub const SEED_USER: &[u8] = b"user";
