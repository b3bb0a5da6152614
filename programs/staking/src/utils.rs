use crate::account::{LockDeposit, LockTier};
use crate::constants::BPS_SCALE;
use crate::error::ErrorCode;
use anchor_lang::prelude::*;

/// Maturity check against the tier's current lock period.
pub fn can_withdraw(tier: &LockTier, deposit: &LockDeposit, now: i64) -> bool {
    now >= deposit.timestamp.saturating_add(tier.lock_period as i64)
}

/// Raw amount scaled by a tier multiplier (scale 10_000).
pub fn weighted_amount(amount: u64, multiplier: u64) -> Result<u64> {
    let weighted = (amount as u128)
        .checked_mul(multiplier as u128)
        .ok_or(ErrorCode::MathOverflow)?
        .checked_div(BPS_SCALE as u128)
        .ok_or(ErrorCode::MathOverflow)?;
    u64::try_from(weighted).map_err(|_| error!(ErrorCode::MathOverflow))
}

/// Splits a forced-unlock amount into (fee, payout). Fee rounds down.
pub fn split_fee(amount: u64, claim_fee: u64) -> Result<(u64, u64)> {
    let fee = (amount as u128)
        .checked_mul(claim_fee as u128)
        .ok_or(ErrorCode::MathOverflow)?
        .checked_div(BPS_SCALE as u128)
        .ok_or(ErrorCode::MathOverflow)?;
    let fee = u64::try_from(fee).map_err(|_| error!(ErrorCode::MathOverflow))?;
    let payout = amount.checked_sub(fee).ok_or(ErrorCode::MathOverflow)?;
    Ok((fee, payout))
}
