use crate::account::*;
use crate::constants::SEED_USER;
use crate::error::ErrorCode;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::program_option::COption;
use anchor_spl::token::{Mint, Token, TokenAccount};

#[derive(Accounts)]
#[instruction(nonce: u8)]
pub struct Initialize<'info> {
    /// CHECK: recorded as the privileged account.
    pub authority: AccountInfo<'info>,

    #[account(zero)]
    pub staking: Box<Account<'info, Staking>>,

    pub reward_mint: Box<Account<'info, Mint>>,
    #[account(
        constraint = reward_vault.mint == reward_mint.key(),
        constraint = reward_vault.owner == staking_signer.key(),
        constraint = reward_vault.close_authority == COption::None,
    )]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    /// Rewards are pulled from here; its owner must delegate to the
    /// program signer.
    #[account(constraint = funding_wallet.mint == reward_mint.key())]
    pub funding_wallet: Box<Account<'info, TokenAccount>>,

    #[account(constraint = fee_wallet.mint == reward_mint.key())]
    pub fee_wallet: Box<Account<'info, TokenAccount>>,

    /// Custody the vesting collaborator unlocks from.
    #[account(constraint = vesting_vault.mint == reward_mint.key())]
    pub vesting_vault: Box<Account<'info, TokenAccount>>,

    /// 1:1 receipt for locked principal.
    #[account(
        constraint = escrow_mint.mint_authority == COption::Some(staking_signer.key()),
    )]
    pub escrow_mint: Box<Account<'info, Mint>>,

    #[account(
        seeds = [
            staking.to_account_info().key.as_ref()
        ],
        bump = nonce,
    )]
    /// CHECK: program signer PDA, nothing to check.
    pub staking_signer: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct AddPool<'info> {
    #[account(
        mut,
        has_one = authority,
        has_one = funding_wallet,
        has_one = reward_vault,
    )]
    pub staking: Box<Account<'info, Staking>>,
    pub authority: Signer<'info>,

    pub staking_mint: Box<Account<'info, Mint>>,
    #[account(
        constraint = staking_vault.mint == staking_mint.key(),
        constraint = staking_vault.owner == staking_signer.key(),
        constraint = staking_vault.close_authority == COption::None,
    )]
    pub staking_vault: Box<Account<'info, TokenAccount>>,

    // Mass accrual runs before the weight change.
    #[account(mut)]
    pub funding_wallet: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        seeds = [
            staking.to_account_info().key.as_ref()
        ],
        bump = staking.nonce,
    )]
    /// CHECK: program signer PDA, nothing to check.
    pub staking_signer: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct UpdateWeights<'info> {
    #[account(
        mut,
        has_one = authority,
        has_one = funding_wallet,
        has_one = reward_vault,
    )]
    pub staking: Box<Account<'info, Staking>>,
    pub authority: Signer<'info>,

    #[account(mut)]
    pub funding_wallet: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        seeds = [
            staking.to_account_info().key.as_ref()
        ],
        bump = staking.nonce,
    )]
    /// CHECK: program signer PDA, nothing to check.
    pub staking_signer: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct SetLockTier<'info> {
    #[account(
        mut,
        has_one = authority,
    )]
    pub staking: Box<Account<'info, Staking>>,
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct SetFeeWallet<'info> {
    #[account(
        mut,
        has_one = authority,
        has_one = reward_mint,
    )]
    pub staking: Box<Account<'info, Staking>>,
    pub authority: Signer<'info>,
    pub reward_mint: Box<Account<'info, Mint>>,
    #[account(constraint = new_fee_wallet.mint == reward_mint.key())]
    pub new_fee_wallet: Box<Account<'info, TokenAccount>>,
}

#[derive(Accounts)]
pub struct TransferAuthority<'info> {
    #[account(
        mut,
        has_one = authority,
    )]
    pub staking: Box<Account<'info, Staking>>,
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct Pause<'info> {
    #[account(
        mut,
        has_one = authority,
        constraint = !staking.paused @ ErrorCode::Paused,
    )]
    pub staking: Box<Account<'info, Staking>>,
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct Unpause<'info> {
    #[account(
        mut,
        has_one = authority,
        constraint = staking.paused,
    )]
    pub staking: Box<Account<'info, Staking>>,
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
#[instruction(pool_id: u64)]
pub struct CreateUser<'info> {
    #[account(
        constraint = !staking.paused @ ErrorCode::Paused,
    )]
    pub staking: Box<Account<'info, Staking>>,
    #[account(
        init,
        payer = owner,
        space = 8 + User::SIZE,
        seeds = [
            SEED_USER,
            owner.key.as_ref(),
            staking.to_account_info().key.as_ref(),
            &pool_id.to_le_bytes()
        ],
        bump
    )]
    pub user: Box<Account<'info, User>>,
    #[account(mut)]
    pub owner: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
#[instruction(pool_id: u64)]
pub struct Deposit<'info> {
    #[account(
        mut,
        has_one = funding_wallet,
        has_one = reward_vault,
        has_one = vesting_vault,
        has_one = escrow_mint,
        constraint = !staking.paused @ ErrorCode::Paused,
    )]
    pub staking: Box<Account<'info, Staking>>,

    /// Beneficiary's ledger entry; the depositor may differ (bonding path).
    #[account(
        mut,
        constraint = user.staking == staking.key() @ ErrorCode::UserPoolMismatch,
        constraint = user.pool_id == pool_id @ ErrorCode::UserPoolMismatch,
    )]
    pub user: Box<Account<'info, User>>,
    pub depositor: Signer<'info>,

    /// Validated against the pool's configured vault in the handler.
    #[account(mut)]
    pub staking_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub depositor_asset_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub funding_wallet: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub vesting_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = user_reward_account.owner == user.owner,
        constraint = user_reward_account.mint == staking.reward_mint,
    )]
    pub user_reward_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub escrow_mint: Box<Account<'info, Mint>>,
    #[account(
        mut,
        constraint = user_escrow_account.owner == user.owner,
        constraint = user_escrow_account.mint == escrow_mint.key(),
    )]
    pub user_escrow_account: Box<Account<'info, TokenAccount>>,

    #[account(
        seeds = [
            staking.to_account_info().key.as_ref()
        ],
        bump = staking.nonce,
    )]
    /// CHECK: program signer PDA, nothing to check.
    pub staking_signer: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct Withdraw<'info> {
    #[account(
        mut,
        has_one = funding_wallet,
        has_one = reward_vault,
        has_one = vesting_vault,
        has_one = fee_wallet,
        has_one = escrow_mint,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(
        mut,
        has_one = owner,
        constraint = user.staking == staking.key() @ ErrorCode::UserPoolMismatch,
        seeds = [
            SEED_USER,
            owner.key.as_ref(),
            staking.to_account_info().key.as_ref(),
            &user.pool_id.to_le_bytes()
        ],
        bump = user.nonce,
    )]
    pub user: Box<Account<'info, User>>,
    pub owner: Signer<'info>,

    /// Validated against the pool's configured vault in the handler.
    #[account(mut)]
    pub staking_vault: Box<Account<'info, TokenAccount>>,
    #[account(
        mut,
        constraint = owner_asset_account.owner == owner.key(),
    )]
    pub owner_asset_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub funding_wallet: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub vesting_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub fee_wallet: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = user_reward_account.owner == owner.key(),
        constraint = user_reward_account.mint == staking.reward_mint,
    )]
    pub user_reward_account: Box<Account<'info, TokenAccount>>,

    #[account(mut)]
    pub escrow_mint: Box<Account<'info, Mint>>,
    #[account(
        mut,
        constraint = user_escrow_account.owner == owner.key(),
        constraint = user_escrow_account.mint == escrow_mint.key(),
    )]
    pub user_escrow_account: Box<Account<'info, TokenAccount>>,

    #[account(
        seeds = [
            staking.to_account_info().key.as_ref()
        ],
        bump = staking.nonce,
    )]
    /// CHECK: program signer PDA, nothing to check.
    pub staking_signer: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}

#[derive(Accounts)]
pub struct ClaimReward<'info> {
    #[account(
        mut,
        has_one = funding_wallet,
        has_one = reward_vault,
        has_one = vesting_vault,
    )]
    pub staking: Box<Account<'info, Staking>>,

    #[account(
        mut,
        has_one = owner,
        constraint = user.staking == staking.key() @ ErrorCode::UserPoolMismatch,
        seeds = [
            SEED_USER,
            owner.key.as_ref(),
            staking.to_account_info().key.as_ref(),
            &user.pool_id.to_le_bytes()
        ],
        bump = user.nonce,
    )]
    pub user: Box<Account<'info, User>>,
    pub owner: Signer<'info>,

    #[account(mut)]
    pub funding_wallet: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub reward_vault: Box<Account<'info, TokenAccount>>,
    #[account(mut)]
    pub vesting_vault: Box<Account<'info, TokenAccount>>,

    #[account(
        mut,
        constraint = user_reward_account.owner == owner.key(),
        constraint = user_reward_account.mint == staking.reward_mint,
    )]
    pub user_reward_account: Box<Account<'info, TokenAccount>>,

    #[account(
        seeds = [
            staking.to_account_info().key.as_ref()
        ],
        bump = staking.nonce,
    )]
    /// CHECK: program signer PDA, nothing to check.
    pub staking_signer: AccountInfo<'info>,

    pub token_program: Program<'info, Token>,
}
