pub mod account;
pub mod constants;
pub mod context;
pub mod error;
pub mod event;
pub mod utils;

use account::*;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::clock::Clock;
use anchor_spl::token::{self, Token};
use constants::*;
use context::*;
use error::ErrorCode;
use event::*;

#[cfg(test)]
mod tests;

declare_id!("1286zPd1cGgNxerziaEQRG2z2jWXMczcjT2ZX2UP3iq6");

/// Per-block emission, computed fresh from the current funding balance so
/// the rate scales with remaining funds.
pub fn reward_per_block(
    funding_balance: u64,
    perc_per_day: u64,
    blocks_per_day: u64,
) -> Result<u64> {
    let per_day = (funding_balance as u128)
        .checked_mul(perc_per_day as u128)
        .ok_or(ErrorCode::MathOverflow)?
        .checked_div(BPS_SCALE as u128)
        .ok_or(ErrorCode::MathOverflow)?
        .checked_div(RATE_DIVISOR as u128)
        .ok_or(ErrorCode::MathOverflow)?;
    let rpb = per_day
        .checked_div(blocks_per_day as u128)
        .ok_or(ErrorCode::MathOverflow)?;
    u64::try_from(rpb).map_err(|_| error!(ErrorCode::MathOverflow))
}

/// Reward accrued beyond the user's last sync point.
pub fn pending_reward(total_deposit: u64, acc_tkn_per_share: u128, reward_debt: u128) -> Result<u64> {
    let accrued = (total_deposit as u128)
        .checked_mul(acc_tkn_per_share)
        .ok_or(ErrorCode::MathOverflow)?
        .checked_div(ACC_PRECISION)
        .ok_or(ErrorCode::MathOverflow)?;
    let pending = accrued
        .checked_sub(reward_debt)
        .ok_or(ErrorCode::MathOverflow)?;
    u64::try_from(pending).map_err(|_| error!(ErrorCode::MathOverflow))
}

/// Transfer out of program custody, signed by the program signer PDA.
fn signer_transfer<'info>(
    token_program: &Program<'info, Token>,
    from: AccountInfo<'info>,
    to: AccountInfo<'info>,
    authority: AccountInfo<'info>,
    staking_key: &Pubkey,
    nonce: u8,
    amount: u64,
) -> Result<()> {
    if amount == 0 {
        return Ok(());
    }
    let seeds = &[staking_key.as_ref(), &[nonce]];
    let signer = &[&seeds[..]];
    let cpi_ctx = CpiContext::new_with_signer(
        token_program.to_account_info(),
        token::Transfer {
            from,
            to,
            authority,
        },
        signer,
    );
    token::transfer(cpi_ctx, amount)
}

#[program]
pub mod staking {
    use super::*;

    pub fn initialize(
        ctx: Context<Initialize>,
        nonce: u8,
        perc_per_day: u64,
        blocks_per_day: u64,
    ) -> Result<()> {
        require!(blocks_per_day > 0, ErrorCode::ZeroAmount);
        require!(perc_per_day <= BPS_SCALE, ErrorCode::MathOverflow);

        let staking = &mut ctx.accounts.staking;
        staking.authority = ctx.accounts.authority.key();
        staking.nonce = nonce;
        staking.paused = false;
        staking.locked = false;
        staking.reward_mint = ctx.accounts.reward_mint.key();
        staking.reward_vault = ctx.accounts.reward_vault.key();
        staking.funding_wallet = ctx.accounts.funding_wallet.key();
        staking.fee_wallet = ctx.accounts.fee_wallet.key();
        staking.escrow_mint = ctx.accounts.escrow_mint.key();
        staking.vesting_vault = ctx.accounts.vesting_vault.key();
        staking.perc_per_day = perc_per_day;
        staking.blocks_per_day = blocks_per_day;
        staking.total_alloc_point = 0;
        staking.pools = Vec::new();
        staking.tiers = Vec::new();

        Ok(())
    }

    pub fn add_pool(
        ctx: Context<AddPool>,
        kind: AssetKind,
        vesting: bool,
        alloc_point: u64,
        start_idx: u64,
        end_idx: u64,
    ) -> Result<()> {
        let clock = Clock::get()?;
        let staking_key = ctx.accounts.staking.key();
        let nonce = ctx.accounts.staking.nonce;

        // Accrue with pre-change weights before total_alloc_point moves.
        let funding_balance = ctx.accounts.funding_wallet.amount;
        let pulled = ctx
            .accounts
            .staking
            .mass_accrue(clock.slot, funding_balance)?;
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.funding_wallet.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            pulled,
        )?;

        let staking = &mut ctx.accounts.staking;
        require!(staking.pools.len() < MAX_POOLS, ErrorCode::TooManyPools);
        if staking.pools.is_empty() {
            // Pool id 0 is the lock pool and must take fungible deposits.
            require!(kind == AssetKind::Fungible, ErrorCode::LockPoolMustBeFungible);
        }
        if kind == AssetKind::NonFungible {
            require!(start_idx <= end_idx, ErrorCode::IdOutOfRange);
        }

        let pool_id = staking.pools.len() as u64;
        staking.pools.push(Pool {
            kind,
            vesting,
            staking_mint: ctx.accounts.staking_mint.key(),
            staking_vault: ctx.accounts.staking_vault.key(),
            alloc_point,
            last_reward_slot: clock.slot,
            acc_tkn_per_share: 0,
            total_deposit: 0,
            investor_count: 0,
            start_idx,
            end_idx,
            held_ids: Vec::new(),
        });
        staking.total_alloc_point = staking
            .total_alloc_point
            .checked_add(alloc_point)
            .ok_or(ErrorCode::MathOverflow)?;

        emit!(PoolAdded {
            pool_id,
            staking_mint: ctx.accounts.staking_mint.key(),
            alloc_point,
            vesting,
        });
        Ok(())
    }

    pub fn set_pool(ctx: Context<UpdateWeights>, pool_id: u64, alloc_point: u64) -> Result<()> {
        let clock = Clock::get()?;
        let staking_key = ctx.accounts.staking.key();
        let nonce = ctx.accounts.staking.nonce;

        let funding_balance = ctx.accounts.funding_wallet.amount;
        let pulled = ctx
            .accounts
            .staking
            .mass_accrue(clock.slot, funding_balance)?;
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.funding_wallet.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            pulled,
        )?;

        let staking = &mut ctx.accounts.staking;
        let old = staking.pool(pool_id)?.alloc_point;
        staking.total_alloc_point = staking
            .total_alloc_point
            .checked_sub(old)
            .ok_or(ErrorCode::MathOverflow)?
            .checked_add(alloc_point)
            .ok_or(ErrorCode::MathOverflow)?;
        staking.pool_mut(pool_id)?.alloc_point = alloc_point;

        emit!(PoolChanged {
            pool_id,
            alloc_point,
        });
        Ok(())
    }

    pub fn set_rate(ctx: Context<UpdateWeights>, perc_per_day: u64) -> Result<()> {
        require!(perc_per_day <= BPS_SCALE, ErrorCode::MathOverflow);
        let clock = Clock::get()?;
        let staking_key = ctx.accounts.staking.key();
        let nonce = ctx.accounts.staking.nonce;

        // Accrue at the old rate up to this point.
        let funding_balance = ctx.accounts.funding_wallet.amount;
        let pulled = ctx
            .accounts
            .staking
            .mass_accrue(clock.slot, funding_balance)?;
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.funding_wallet.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            pulled,
        )?;

        ctx.accounts.staking.perc_per_day = perc_per_day;
        emit!(RateChanged { perc_per_day });
        Ok(())
    }

    pub fn set_lock_tier(
        ctx: Context<SetLockTier>,
        tier_id: u64,
        multiplier: u64,
        claim_fee: u64,
        lock_period: u64,
        force_unlock: bool,
    ) -> Result<()> {
        require!(claim_fee <= BPS_SCALE, ErrorCode::MathOverflow);

        let staking = &mut ctx.accounts.staking;
        let tier = LockTier {
            multiplier,
            claim_fee,
            lock_period,
            force_unlock,
        };
        let idx = tier_id as usize;
        if idx == staking.tiers.len() {
            require!(
                staking.tiers.len() < MAX_LOCK_TIERS,
                ErrorCode::TooManyLockTiers
            );
            staking.tiers.push(tier);
        } else {
            require!(idx < staking.tiers.len(), ErrorCode::UnknownLockTier);
            staking.tiers[idx] = tier;
        }

        emit!(LockTierChanged {
            tier_id,
            multiplier,
            claim_fee,
            lock_period,
            force_unlock,
        });
        Ok(())
    }

    pub fn set_fee_wallet(ctx: Context<SetFeeWallet>) -> Result<()> {
        let staking = &mut ctx.accounts.staking;
        staking.fee_wallet = ctx.accounts.new_fee_wallet.key();
        Ok(())
    }

    pub fn transfer_authority(ctx: Context<TransferAuthority>, new_authority: Pubkey) -> Result<()> {
        require!(new_authority != Pubkey::default(), ErrorCode::ZeroAmount);
        let staking = &mut ctx.accounts.staking;
        let old_authority = staking.authority;
        staking.authority = new_authority;
        emit!(AuthorityTransferred {
            old_authority,
            new_authority,
        });
        Ok(())
    }

    pub fn pause(ctx: Context<Pause>) -> Result<()> {
        ctx.accounts.staking.paused = true;
        emit!(PauseChanged { paused: true });
        Ok(())
    }

    pub fn unpause(ctx: Context<Unpause>) -> Result<()> {
        ctx.accounts.staking.paused = false;
        emit!(PauseChanged { paused: false });
        Ok(())
    }

    pub fn create_user(ctx: Context<CreateUser>, pool_id: u64) -> Result<()> {
        ctx.accounts.staking.pool(pool_id)?;

        let user = &mut ctx.accounts.user;
        user.staking = ctx.accounts.staking.key();
        user.pool_id = pool_id;
        user.owner = ctx.accounts.owner.key();
        user.total_deposit = 0;
        user.reward_debt = 0;
        user.total_claimed = 0;
        user.last_deposit_time = 0;
        user.held_ids = Vec::new();
        user.lock_deposits = Vec::new();
        user.nonce = ctx.bumps.user;

        Ok(())
    }

    /// Deposit into a pool for the beneficiary behind `user`. Fungible pools
    /// take one amount; NFT pools take the ids to stake; the lock pool also
    /// mints 1:1 escrow receipts and records a lock deposit for `tier_id`.
    pub fn deposit(
        ctx: Context<Deposit>,
        pool_id: u64,
        tier_id: u64,
        amounts: Vec<u64>,
    ) -> Result<()> {
        let clock = Clock::get()?;
        let staking_key = ctx.accounts.staking.key();
        let nonce = ctx.accounts.staking.nonce;

        require!(!ctx.accounts.staking.locked, ErrorCode::ReentrantCall);
        ctx.accounts.staking.locked = true;

        let funding_balance = ctx.accounts.funding_wallet.amount;
        let pulled = ctx
            .accounts
            .staking
            .accrue_pool(pool_id, clock.slot, funding_balance)?;
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.funding_wallet.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            pulled,
        )?;

        let (kind, vesting, vault, staking_mint) = {
            let pool = ctx.accounts.staking.pool(pool_id)?;
            (pool.kind, pool.vesting, pool.staking_vault, pool.staking_mint)
        };
        require_keys_eq!(
            ctx.accounts.staking_vault.key(),
            vault,
            ErrorCode::PoolAccountMismatch
        );
        require_keys_eq!(
            ctx.accounts.depositor_asset_account.mint,
            staking_mint,
            ErrorCode::PoolAccountMismatch
        );

        let input = StakeInput::parse(kind, &amounts)?;

        // Settle rewards accrued before this deposit existed.
        let pending = ctx.accounts.staking.pending(&ctx.accounts.user)?;
        if pending > 0 {
            let to = if vesting {
                ctx.accounts.vesting_vault.to_account_info()
            } else {
                ctx.accounts.user_reward_account.to_account_info()
            };
            signer_transfer(
                &ctx.accounts.token_program,
                ctx.accounts.reward_vault.to_account_info(),
                to,
                ctx.accounts.staking_signer.to_account_info(),
                &staking_key,
                nonce,
                pending,
            )?;
            let user = &mut ctx.accounts.user;
            user.total_claimed = user
                .total_claimed
                .checked_add(pending)
                .ok_or(ErrorCode::MathOverflow)?;
            if vesting {
                emit!(VestingAdded {
                    user: user.owner,
                    amount: pending,
                });
            }
            emit!(RewardClaimed {
                pool_id,
                user: user.owner,
                amount: pending,
                vested: vesting,
            });
        }

        // Asset into custody, signed by the depositor.
        {
            let cpi_ctx = CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                token::Transfer {
                    from: ctx.accounts.depositor_asset_account.to_account_info(),
                    to: ctx.accounts.staking_vault.to_account_info(),
                    authority: ctx.accounts.depositor.to_account_info(),
                },
            );
            token::transfer(cpi_ctx, input.transfer_amount())?;
        }

        let outcome = ctx.accounts.staking.record_deposit(
            &mut ctx.accounts.user,
            pool_id,
            tier_id,
            &input,
            clock.unix_timestamp,
        )?;

        // Escrow receipt for locked principal.
        if outcome.escrow_mint > 0 {
            let seeds = &[staking_key.as_ref(), &[nonce]];
            let signer = &[&seeds[..]];
            let cpi_ctx = CpiContext::new_with_signer(
                ctx.accounts.token_program.to_account_info(),
                token::MintTo {
                    mint: ctx.accounts.escrow_mint.to_account_info(),
                    to: ctx.accounts.user_escrow_account.to_account_info(),
                    authority: ctx.accounts.staking_signer.to_account_info(),
                },
                signer,
            );
            token::mint_to(cpi_ctx, outcome.escrow_mint)?;
        }

        emit!(Deposited {
            pool_id,
            user: ctx.accounts.user.owner,
            depositor: ctx.accounts.depositor.key(),
            tier_id,
            amount: input.transfer_amount(),
            weighted: outcome.weighted,
        });

        ctx.accounts.staking.locked = false;
        Ok(())
    }

    /// Withdraw principal. Self-service only: rewards are settled first,
    /// then the asset leaves custody under the lock-tier policy.
    pub fn withdraw(
        ctx: Context<Withdraw>,
        tier_id: u64,
        deposit_index: u64,
        amounts: Vec<u64>,
    ) -> Result<()> {
        let clock = Clock::get()?;
        let staking_key = ctx.accounts.staking.key();
        let nonce = ctx.accounts.staking.nonce;
        let pool_id = ctx.accounts.user.pool_id;

        require!(!ctx.accounts.staking.locked, ErrorCode::ReentrantCall);
        ctx.accounts.staking.locked = true;

        let funding_balance = ctx.accounts.funding_wallet.amount;
        let pulled = ctx
            .accounts
            .staking
            .accrue_pool(pool_id, clock.slot, funding_balance)?;
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.funding_wallet.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            pulled,
        )?;

        let (kind, vesting, vault, staking_mint) = {
            let pool = ctx.accounts.staking.pool(pool_id)?;
            (pool.kind, pool.vesting, pool.staking_vault, pool.staking_mint)
        };
        require_keys_eq!(
            ctx.accounts.staking_vault.key(),
            vault,
            ErrorCode::PoolAccountMismatch
        );
        require_keys_eq!(
            ctx.accounts.owner_asset_account.mint,
            staking_mint,
            ErrorCode::PoolAccountMismatch
        );

        let input = StakeInput::parse(kind, &amounts)?;

        // Reward is claimed before principal leaves, against the
        // pre-withdrawal total.
        let pending = ctx.accounts.staking.pending(&ctx.accounts.user)?;
        if pending > 0 {
            let to = if vesting {
                ctx.accounts.vesting_vault.to_account_info()
            } else {
                ctx.accounts.user_reward_account.to_account_info()
            };
            signer_transfer(
                &ctx.accounts.token_program,
                ctx.accounts.reward_vault.to_account_info(),
                to,
                ctx.accounts.staking_signer.to_account_info(),
                &staking_key,
                nonce,
                pending,
            )?;
            let user = &mut ctx.accounts.user;
            user.total_claimed = user
                .total_claimed
                .checked_add(pending)
                .ok_or(ErrorCode::MathOverflow)?;
            if vesting {
                emit!(VestingAdded {
                    user: user.owner,
                    amount: pending,
                });
            }
            emit!(RewardClaimed {
                pool_id,
                user: user.owner,
                amount: pending,
                vested: vesting,
            });
        }

        let outcome = ctx.accounts.staking.record_withdraw(
            &mut ctx.accounts.user,
            pool_id,
            tier_id,
            deposit_index,
            &input,
            clock.unix_timestamp,
        )?;

        // Principal back to the owner, fee to the fee wallet.
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.staking_vault.to_account_info(),
            ctx.accounts.owner_asset_account.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            outcome.payout,
        )?;
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.staking_vault.to_account_info(),
            ctx.accounts.fee_wallet.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            outcome.fee,
        )?;

        // Escrow receipts burn for the full raw amount, fee included.
        if outcome.escrow_burn > 0 {
            let cpi_ctx = CpiContext::new(
                ctx.accounts.token_program.to_account_info(),
                token::Burn {
                    mint: ctx.accounts.escrow_mint.to_account_info(),
                    from: ctx.accounts.user_escrow_account.to_account_info(),
                    authority: ctx.accounts.owner.to_account_info(),
                },
            );
            token::burn(cpi_ctx, outcome.escrow_burn)?;
        }

        emit!(Withdrawn {
            pool_id,
            user: ctx.accounts.user.owner,
            amount: outcome.payout,
            fee: outcome.fee,
            weighted: outcome.weighted,
        });

        ctx.accounts.staking.locked = false;
        Ok(())
    }

    /// Settle pending reward without touching principal. A zero pending
    /// amount is a valid no-op and still emits the event.
    pub fn claim(ctx: Context<ClaimReward>) -> Result<()> {
        let clock = Clock::get()?;
        let staking_key = ctx.accounts.staking.key();
        let nonce = ctx.accounts.staking.nonce;
        let pool_id = ctx.accounts.user.pool_id;

        require!(!ctx.accounts.staking.locked, ErrorCode::ReentrantCall);
        ctx.accounts.staking.locked = true;

        let funding_balance = ctx.accounts.funding_wallet.amount;
        let pulled = ctx
            .accounts
            .staking
            .accrue_pool(pool_id, clock.slot, funding_balance)?;
        signer_transfer(
            &ctx.accounts.token_program,
            ctx.accounts.funding_wallet.to_account_info(),
            ctx.accounts.reward_vault.to_account_info(),
            ctx.accounts.staking_signer.to_account_info(),
            &staking_key,
            nonce,
            pulled,
        )?;

        let pending = ctx.accounts.staking.pending(&ctx.accounts.user)?;
        let (vesting, acc) = {
            let pool = ctx.accounts.staking.pool(pool_id)?;
            (pool.vesting, pool.acc_tkn_per_share)
        };

        if pending > 0 {
            let to = if vesting {
                ctx.accounts.vesting_vault.to_account_info()
            } else {
                ctx.accounts.user_reward_account.to_account_info()
            };
            signer_transfer(
                &ctx.accounts.token_program,
                ctx.accounts.reward_vault.to_account_info(),
                to,
                ctx.accounts.staking_signer.to_account_info(),
                &staking_key,
                nonce,
                pending,
            )?;
            if vesting {
                emit!(VestingAdded {
                    user: ctx.accounts.user.owner,
                    amount: pending,
                });
            }
        }

        let user = &mut ctx.accounts.user;
        user.total_claimed = user
            .total_claimed
            .checked_add(pending)
            .ok_or(ErrorCode::MathOverflow)?;
        user.sync_debt(acc)?;

        emit!(RewardClaimed {
            pool_id,
            user: user.owner,
            amount: pending,
            vested: vesting,
        });

        ctx.accounts.staking.locked = false;
        Ok(())
    }
}
