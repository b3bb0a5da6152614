use anchor_lang::prelude::*;

#[event]
pub struct PoolAdded {
    pub pool_id: u64,
    pub staking_mint: Pubkey,
    pub alloc_point: u64,
    pub vesting: bool,
}

#[event]
pub struct PoolChanged {
    pub pool_id: u64,
    pub alloc_point: u64,
}

#[event]
pub struct LockTierChanged {
    pub tier_id: u64,
    pub multiplier: u64,
    pub claim_fee: u64,
    pub lock_period: u64,
    pub force_unlock: bool,
}

#[event]
pub struct RateChanged {
    pub perc_per_day: u64,
}

#[event]
pub struct Deposited {
    pub pool_id: u64,
    pub user: Pubkey,
    pub depositor: Pubkey,
    pub tier_id: u64,
    pub amount: u64,
    pub weighted: u64,
}

#[event]
pub struct Withdrawn {
    pub pool_id: u64,
    pub user: Pubkey,
    pub amount: u64,
    pub fee: u64,
    pub weighted: u64,
}

#[event]
pub struct RewardClaimed {
    pub pool_id: u64,
    pub user: Pubkey,
    pub amount: u64,
    pub vested: bool,
}

#[event]
pub struct VestingAdded {
    pub user: Pubkey,
    pub amount: u64,
}

#[event]
pub struct PauseChanged {
    pub paused: bool,
}

#[event]
pub struct AuthorityTransferred {
    pub old_authority: Pubkey,
    pub new_authority: Pubkey,
}
