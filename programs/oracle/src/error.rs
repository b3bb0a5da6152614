use anchor_lang::prelude::*;

#[error_code]
pub enum OracleError {
    #[msg("Math operation overflow.")]
    MathOverflow,
    #[msg("Granularity must be greater than one.")]
    InvalidGranularity,
    #[msg("Window size must be evenly divisible by granularity.")]
    WindowNotDivisible,
    #[msg("Token is not part of the tracked pair.")]
    InvalidToken,
    #[msg("Pair has no liquidity to derive a price from.")]
    InsufficientLiquidity,
    #[msg("No observation recorded inside the window.")]
    MissingHistoricalObservation,
    #[msg("Unexpected time elapsed since the oldest observation.")]
    UnexpectedTimeElapsed,
    #[msg("Push feed round is incomplete.")]
    IncompleteRound,
    #[msg("Push feed round is stale.")]
    StaleRound,
    #[msg("Push feed returned a zero or negative price.")]
    ZeroPrice,
    #[msg("Push feed is not configured.")]
    FeedNotConfigured,
    #[msg("Account does not match the oracle configuration.")]
    AccountMismatch,
    #[msg("Account data does not match the expected layout.")]
    InvalidLayout,
}
