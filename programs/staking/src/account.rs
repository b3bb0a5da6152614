use crate::constants::*;
use crate::error::ErrorCode;
use crate::utils::{can_withdraw, split_fee, weighted_amount};
use crate::{pending_reward, reward_per_block};
use anchor_lang::prelude::*;

/// Stake unit of a pool, fixed at configuration time.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AssetKind {
    Fungible,
    NonFungible,
}

/// One reward stream. Lives in the registry's pool arena, indexed by pool id.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug)]
pub struct Pool {
    pub kind: AssetKind,
    /// Rewards are routed through vesting instead of paid directly.
    pub vesting: bool,
    /// Mint of the staked asset.
    pub staking_mint: Pubkey,
    /// Vault holding staked assets, owned by the program signer.
    pub staking_vault: Pubkey,
    /// Share of the global emission.
    pub alloc_point: u64,
    /// Slot up to which rewards have been accrued.
    pub last_reward_slot: u64,
    /// Accumulated reward per weighted unit, scaled by `ACC_PRECISION`.
    pub acc_tkn_per_share: u128,
    /// Sum of all users' weighted deposits.
    pub total_deposit: u64,
    pub investor_count: u32,
    /// Valid NFT id range (NFT pools only).
    pub start_idx: u64,
    pub end_idx: u64,
    /// NFT ids currently held in custody (NFT pools only).
    pub held_ids: Vec<u64>,
}

impl Pool {
    pub const SIZE: usize =
        1 + 1 + 32 + 32 + 8 + 8 + 16 + 8 + 4 + 8 + 8 + 4 + MAX_POOL_HELD_IDS * 8;
}

/// Lock tier configuration. Read live at withdrawal time, not snapshotted
/// at deposit time; changing a tier re-weights its outstanding deposits.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct LockTier {
    /// Reward weight, scale 10_000.
    pub multiplier: u64,
    /// Early forced-unlock fee, scale 10_000.
    pub claim_fee: u64,
    /// Lock duration in seconds.
    pub lock_period: u64,
    /// Whether forced early unlock is permitted.
    pub force_unlock: bool,
}

impl LockTier {
    pub const SIZE: usize = 8 + 8 + 8 + 1;
}

/// One locked deposit. Append-only; indices are never reused or compacted,
/// withdrawal marks the entry instead of removing it.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug)]
pub struct LockDeposit {
    pub tier: u64,
    pub withdrawn: bool,
    pub timestamp: i64,
    pub amount: u64,
}

impl LockDeposit {
    pub const SIZE: usize = 8 + 1 + 8 + 8;
}

/// Deposit input, parsed once per call against the pool's asset kind.
#[derive(Clone, Debug)]
pub enum StakeInput {
    Fungible { amount: u64 },
    NonFungible { ids: Vec<u64> },
}

impl StakeInput {
    pub fn parse(kind: AssetKind, amounts: &[u64]) -> Result<Self> {
        match kind {
            AssetKind::Fungible => {
                require!(amounts.len() == 1, ErrorCode::AmountLengthMismatch);
                require!(amounts[0] > 0, ErrorCode::ZeroAmount);
                Ok(StakeInput::Fungible { amount: amounts[0] })
            }
            AssetKind::NonFungible => {
                require!(!amounts.is_empty(), ErrorCode::ZeroAmount);
                Ok(StakeInput::NonFungible {
                    ids: amounts.to_vec(),
                })
            }
        }
    }

    /// Units moving through the pool vault.
    pub fn transfer_amount(&self) -> u64 {
        match self {
            StakeInput::Fungible { amount } => *amount,
            StakeInput::NonFungible { ids } => ids.len() as u64,
        }
    }
}

#[derive(Debug)]
pub struct DepositOutcome {
    /// Units added to pool and user weighted totals.
    pub weighted: u64,
    /// Escrow receipts to mint (raw locked amount, lock pool only).
    pub escrow_mint: u64,
}

#[derive(Debug)]
pub struct WithdrawOutcome {
    /// Principal returned to the user.
    pub payout: u64,
    /// Forced-unlock fee sent to the fee wallet.
    pub fee: u64,
    /// Escrow receipts to burn (full raw amount, lock pool only).
    pub escrow_burn: u64,
    /// Units removed from pool and user weighted totals.
    pub weighted: u64,
}

#[account]
pub struct Staking {
    /// Privileged account.
    pub authority: Pubkey,
    /// Nonce to derive the program-derived address owning the vaults.
    pub nonce: u8,
    /// Paused state of the program; gates deposits only.
    pub paused: bool,
    /// Operation-in-progress flag, checked on entry of every mutating op.
    pub locked: bool,
    /// Mint of the reward token.
    pub reward_mint: Pubkey,
    /// Custody for accrued rewards.
    pub reward_vault: Pubkey,
    /// Wallet rewards are pulled from; must delegate to the program signer.
    pub funding_wallet: Pubkey,
    /// Destination for forced-unlock fees.
    pub fee_wallet: Pubkey,
    /// Escrow receipt mint, authority = program signer.
    pub escrow_mint: Pubkey,
    /// Custody the vesting collaborator claims from.
    pub vesting_vault: Pubkey,
    /// Daily emission in permil of the funding balance, scale 10_000.
    pub perc_per_day: u64,
    /// Slots per day used to spread the daily emission.
    pub blocks_per_day: u64,
    /// Sum of all pools' alloc points.
    pub total_alloc_point: u64,
    pub pools: Vec<Pool>,
    pub tiers: Vec<LockTier>,
}

impl Staking {
    /// Worst-case account data size at full registry capacity. The registry
    /// is created by the client and passed to `initialize` under the `zero`
    /// constraint; allocate `8 + SIZE` bytes (discriminator included).
    pub const SIZE: usize = 32
        + 1
        + 1
        + 1
        + 32 * 6
        + 8 * 3
        + 4
        + MAX_POOLS * Pool::SIZE
        + 4
        + MAX_LOCK_TIERS * LockTier::SIZE;

    pub fn pool(&self, pool_id: u64) -> Result<&Pool> {
        self.pools
            .get(pool_id as usize)
            .ok_or_else(|| error!(ErrorCode::UnknownPool))
    }

    pub fn pool_mut(&mut self, pool_id: u64) -> Result<&mut Pool> {
        self.pools
            .get_mut(pool_id as usize)
            .ok_or_else(|| error!(ErrorCode::UnknownPool))
    }

    pub fn tier(&self, tier_id: u64) -> Result<&LockTier> {
        self.tiers
            .get(tier_id as usize)
            .ok_or_else(|| error!(ErrorCode::UnknownLockTier))
    }

    /// Brings a pool's accumulator current and returns the reward to pull
    /// from the funding wallet. Idempotent within a slot; an empty or
    /// zero-weight pool advances without accruing.
    pub fn accrue_pool(&mut self, pool_id: u64, slot: u64, funding_balance: u64) -> Result<u64> {
        let total_alloc = self.total_alloc_point;
        let rpb = reward_per_block(funding_balance, self.perc_per_day, self.blocks_per_day)?;
        let pool = self.pool_mut(pool_id)?;

        if slot <= pool.last_reward_slot {
            return Ok(0);
        }
        if pool.total_deposit == 0 || pool.alloc_point == 0 || total_alloc == 0 {
            pool.last_reward_slot = slot;
            return Ok(0);
        }

        let elapsed = slot - pool.last_reward_slot;
        let reward = (elapsed as u128)
            .checked_mul(rpb as u128)
            .ok_or(ErrorCode::MathOverflow)?
            .checked_mul(pool.alloc_point as u128)
            .ok_or(ErrorCode::MathOverflow)?
            .checked_div(total_alloc as u128)
            .ok_or(ErrorCode::MathOverflow)?;

        pool.acc_tkn_per_share = pool
            .acc_tkn_per_share
            .checked_add(
                reward
                    .checked_mul(ACC_PRECISION)
                    .ok_or(ErrorCode::MathOverflow)?
                    .checked_div(pool.total_deposit as u128)
                    .ok_or(ErrorCode::MathOverflow)?,
            )
            .ok_or(ErrorCode::MathOverflow)?;
        pool.last_reward_slot = slot;

        u64::try_from(reward).map_err(|_| error!(ErrorCode::MathOverflow))
    }

    /// Accrues every pool in ascending id order. Required before any change
    /// to alloc points or the emission rate. Later pools see the funding
    /// balance reduced by earlier pulls.
    pub fn mass_accrue(&mut self, slot: u64, mut funding_balance: u64) -> Result<u64> {
        let mut total = 0u64;
        for pool_id in 0..self.pools.len() as u64 {
            let pulled = self.accrue_pool(pool_id, slot, funding_balance)?;
            funding_balance = funding_balance.saturating_sub(pulled);
            total = total.checked_add(pulled).ok_or(ErrorCode::MathOverflow)?;
        }
        Ok(total)
    }

    /// Reward accrued to `user` since its last sync point.
    pub fn pending(&self, user: &User) -> Result<u64> {
        let pool = self.pool(user.pool_id)?;
        pending_reward(user.total_deposit, pool.acc_tkn_per_share, user.reward_debt)
    }

    /// Ledger side of a deposit. The caller must have accrued the pool and
    /// settled pending rewards first; this resyncs the reward debt.
    pub fn record_deposit(
        &mut self,
        user: &mut User,
        pool_id: u64,
        tier_id: u64,
        input: &StakeInput,
        now: i64,
    ) -> Result<DepositOutcome> {
        // Tier config is only consulted for the lock pool.
        let tier = if pool_id == LOCK_POOL_ID {
            let tier = *self.tier(tier_id)?;
            require!(tier.multiplier > 0, ErrorCode::TierNotConfigured);
            Some(tier)
        } else {
            None
        };

        let pool = self.pool_mut(pool_id)?;
        let mut escrow_mint = 0u64;

        let weighted = match (pool.kind, input) {
            (AssetKind::NonFungible, StakeInput::NonFungible { ids }) => {
                for id in ids {
                    require!(
                        *id >= pool.start_idx && *id <= pool.end_idx,
                        ErrorCode::IdOutOfRange
                    );
                    require!(!pool.held_ids.contains(id), ErrorCode::DuplicateId);
                    require!(
                        pool.held_ids.len() < MAX_POOL_HELD_IDS,
                        ErrorCode::HeldIdListFull
                    );
                    require!(user.held_ids.len() < MAX_HELD_IDS, ErrorCode::HeldIdListFull);
                    pool.held_ids.push(*id);
                    user.held_ids.push(*id);
                }
                ids.len() as u64
            }
            (AssetKind::Fungible, StakeInput::Fungible { amount }) => {
                if let Some(tier) = tier {
                    require!(
                        user.lock_deposits.len() < MAX_LOCK_DEPOSITS,
                        ErrorCode::DepositListFull
                    );
                    user.lock_deposits.push(LockDeposit {
                        tier: tier_id,
                        withdrawn: false,
                        timestamp: now,
                        amount: *amount,
                    });
                    escrow_mint = *amount;
                    weighted_amount(*amount, tier.multiplier)?
                } else {
                    *amount
                }
            }
            _ => return Err(error!(ErrorCode::AmountLengthMismatch)),
        };

        if user.total_deposit == 0 {
            pool.investor_count = pool
                .investor_count
                .checked_add(1)
                .ok_or(ErrorCode::MathOverflow)?;
        }
        pool.total_deposit = pool
            .total_deposit
            .checked_add(weighted)
            .ok_or(ErrorCode::MathOverflow)?;
        user.total_deposit = user
            .total_deposit
            .checked_add(weighted)
            .ok_or(ErrorCode::MathOverflow)?;
        user.sync_debt(pool.acc_tkn_per_share)?;
        user.last_deposit_time = now;

        Ok(DepositOutcome {
            weighted,
            escrow_mint,
        })
    }

    /// Ledger side of a withdrawal. The caller must have accrued the pool
    /// and settled pending rewards first; this resyncs the reward debt.
    pub fn record_withdraw(
        &mut self,
        user: &mut User,
        pool_id: u64,
        tier_id: u64,
        deposit_index: u64,
        input: &StakeInput,
        now: i64,
    ) -> Result<WithdrawOutcome> {
        let tier = if pool_id == LOCK_POOL_ID {
            Some(*self.tier(tier_id)?)
        } else {
            None
        };

        let pool = self.pool_mut(pool_id)?;

        let outcome = match (pool.kind, input) {
            (AssetKind::NonFungible, StakeInput::NonFungible { ids }) => {
                for id in ids {
                    let pos = user
                        .held_ids
                        .iter()
                        .position(|held| held == id)
                        .ok_or(ErrorCode::IdNotHeld)?;
                    user.held_ids.swap_remove(pos);
                    let pos = pool
                        .held_ids
                        .iter()
                        .position(|held| held == id)
                        .ok_or(ErrorCode::IdNotHeld)?;
                    pool.held_ids.swap_remove(pos);
                }
                WithdrawOutcome {
                    payout: ids.len() as u64,
                    fee: 0,
                    escrow_burn: 0,
                    weighted: ids.len() as u64,
                }
            }
            (AssetKind::Fungible, StakeInput::Fungible { amount }) => {
                if let Some(tier) = tier {
                    let entry = user
                        .lock_deposits
                        .get_mut(deposit_index as usize)
                        .ok_or(ErrorCode::UnknownDeposit)?;
                    require!(entry.tier == tier_id, ErrorCode::DepositTierMismatch);
                    require!(!entry.withdrawn, ErrorCode::AlreadyWithdrawn);
                    // Lock deposits leave whole; the caller states the exact
                    // entry amount rather than a free-form value.
                    require!(*amount == entry.amount, ErrorCode::LockAmountMismatch);

                    let (fee, payout) = if can_withdraw(&tier, entry, now) {
                        (0, entry.amount)
                    } else {
                        require!(tier.force_unlock, ErrorCode::ForcedUnlockDisabled);
                        split_fee(entry.amount, tier.claim_fee)?
                    };
                    entry.withdrawn = true;
                    let raw = entry.amount;
                    WithdrawOutcome {
                        payout,
                        fee,
                        escrow_burn: raw,
                        weighted: weighted_amount(raw, tier.multiplier)?,
                    }
                } else {
                    require!(*amount <= user.total_deposit, ErrorCode::InsufficientDeposit);
                    WithdrawOutcome {
                        payout: *amount,
                        fee: 0,
                        escrow_burn: 0,
                        weighted: *amount,
                    }
                }
            }
            _ => return Err(error!(ErrorCode::AmountLengthMismatch)),
        };

        pool.total_deposit = pool
            .total_deposit
            .checked_sub(outcome.weighted)
            .ok_or(ErrorCode::MathOverflow)?;
        user.total_deposit = user
            .total_deposit
            .checked_sub(outcome.weighted)
            .ok_or(ErrorCode::MathOverflow)?;
        if user.total_deposit == 0 {
            pool.investor_count = pool.investor_count.saturating_sub(1);
        }
        user.sync_debt(pool.acc_tkn_per_share)?;

        Ok(outcome)
    }
}

#[account]
#[derive(Default)]
pub struct User {
    /// Registry this user belongs to.
    pub staking: Pubkey,
    pub pool_id: u64,
    /// The owner of this account.
    pub owner: Pubkey,
    /// Weighted deposit total.
    pub total_deposit: u64,
    /// `total_deposit * acc_tkn_per_share / ACC_PRECISION` at last sync.
    pub reward_debt: u128,
    /// Cumulative reward paid out or vested.
    pub total_claimed: u64,
    pub last_deposit_time: i64,
    /// Held NFT ids (NFT pools only).
    pub held_ids: Vec<u64>,
    /// Locked deposits, append-only (lock pool only).
    pub lock_deposits: Vec<LockDeposit>,
    /// Signer nonce.
    pub nonce: u8,
}

impl User {
    pub const SIZE: usize = 32
        + 8
        + 32
        + 8
        + 16
        + 8
        + 8
        + 4
        + MAX_HELD_IDS * 8
        + 4
        + MAX_LOCK_DEPOSITS * LockDeposit::SIZE
        + 1;

    pub fn sync_debt(&mut self, acc_tkn_per_share: u128) -> Result<()> {
        self.reward_debt = (self.total_deposit as u128)
            .checked_mul(acc_tkn_per_share)
            .ok_or(ErrorCode::MathOverflow)?
            .checked_div(ACC_PRECISION)
            .ok_or(ErrorCode::MathOverflow)?;
        Ok(())
    }
}
