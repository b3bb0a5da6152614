use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Program is paused.")]
    Paused,
    #[msg("Reentrant call.")]
    ReentrantCall,
    #[msg("Math operation overflow.")]
    MathOverflow,
    #[msg("Unknown pool id.")]
    UnknownPool,
    #[msg("Pool registry is full.")]
    TooManyPools,
    #[msg("Lock tier registry is full.")]
    TooManyLockTiers,
    #[msg("Unknown lock tier.")]
    UnknownLockTier,
    #[msg("Lock tier has no multiplier configured.")]
    TierNotConfigured,
    #[msg("The first pool must be the fungible lock pool.")]
    LockPoolMustBeFungible,
    #[msg("Amount must be greater than zero.")]
    ZeroAmount,
    #[msg("Fungible pools take exactly one amount.")]
    AmountLengthMismatch,
    #[msg("NFT id outside the pool's configured range.")]
    IdOutOfRange,
    #[msg("NFT id is already staked in this pool.")]
    DuplicateId,
    #[msg("NFT id is not staked by this user.")]
    IdNotHeld,
    #[msg("Unknown lock deposit index.")]
    UnknownDeposit,
    #[msg("Lock deposit tier does not match.")]
    DepositTierMismatch,
    #[msg("Lock deposit was already withdrawn.")]
    AlreadyWithdrawn,
    #[msg("Deposit is still locked and forced unlock is disabled.")]
    ForcedUnlockDisabled,
    #[msg("Withdraw amount exceeds deposited balance.")]
    InsufficientDeposit,
    #[msg("Amount does not match the lock deposit.")]
    LockAmountMismatch,
    #[msg("Lock deposit list is full.")]
    DepositListFull,
    #[msg("Held NFT id list is full.")]
    HeldIdListFull,
    #[msg("Account does not match the pool configuration.")]
    PoolAccountMismatch,
    #[msg("User account does not belong to this pool.")]
    UserPoolMismatch,
}
