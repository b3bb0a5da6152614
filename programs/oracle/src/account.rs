use crate::constants::*;
use crate::error::OracleError;
use crate::{compute_amount_out, observation_index_of};
use anchor_lang::prelude::*;

/// Where `price_in_eth` gets its answer. Each source carries its own
/// staleness contract: Twap bounds the age of the oldest observation,
/// Feed validates the round it reads.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum PriceSource {
    Twap,
    Feed,
}

/// One ring-buffer slot. A slot is overwritten at most once per period.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug)]
pub struct Observation {
    pub timestamp: i64,
    pub price0_cumulative: u128,
    pub price1_cumulative: u128,
}

impl Observation {
    pub const SIZE: usize = 8 + 16 + 16;
}

#[account]
pub struct Oracle {
    /// Privileged account.
    pub authority: Pubkey,
    /// Liquidity pair the cumulative prices are read from.
    pub pair: Pubkey,
    /// Pair tokens in canonical order.
    pub token0: Pubkey,
    pub token1: Pubkey,
    /// Token priced by `price_in_eth`.
    pub base_token: Pubkey,
    /// Full averaging window in seconds.
    pub window_size: i64,
    /// Number of ring slots; window_size / granularity = period_size.
    pub granularity: u8,
    pub period_size: i64,
    /// Configured quoting strategy.
    pub price_source: PriceSource,
    /// Push feed quoting base_token in ETH.
    pub feed: Pubkey,
    /// Push feed quoting ETH in USD.
    pub eth_usd_feed: Pubkey,
    pub observations: Vec<Observation>,
}

impl Oracle {
    /// Worst-case account data size at `MAX_GRANULARITY` slots. The oracle
    /// account is created by the client and passed to `initialize` under the
    /// `zero` constraint; allocate `8 + SIZE` bytes (discriminator included).
    pub const SIZE: usize =
        32 * 7 + 8 + 1 + 8 + 1 + 4 + MAX_GRANULARITY * Observation::SIZE;

    /// Commits the pair's cumulative prices into the current slot if that
    /// slot has not been written this period. Returns the slot index on
    /// commit, `None` on the within-period no-op.
    pub fn update(
        &mut self,
        now: i64,
        price0_cumulative: u128,
        price1_cumulative: u128,
    ) -> Result<Option<usize>> {
        let idx = observation_index_of(now, self.period_size, self.granularity);
        let period_size = self.period_size;
        let obs = self
            .observations
            .get_mut(idx)
            .ok_or(OracleError::MathOverflow)?;
        if now.saturating_sub(obs.timestamp) > period_size {
            obs.timestamp = now;
            obs.price0_cumulative = price0_cumulative;
            obs.price1_cumulative = price1_cumulative;
            Ok(Some(idx))
        } else {
            Ok(None)
        }
    }

    /// Oldest slot in the window relative to `now`.
    pub fn first_observation(&self, now: i64) -> Result<&Observation> {
        let idx = observation_index_of(now, self.period_size, self.granularity);
        let oldest = (idx + 1) % self.granularity as usize;
        self.observations
            .get(oldest)
            .ok_or_else(|| error!(OracleError::MathOverflow))
    }

    /// Time-weighted average of `amount_in` over the window, against the
    /// pair's cumulative prices extrapolated to `now`. Fails when the
    /// oldest observation is older than the window.
    pub fn consult(
        &self,
        token_in: &Pubkey,
        amount_in: u64,
        now: i64,
        price0_cumulative_now: u128,
        price1_cumulative_now: u128,
    ) -> Result<u64> {
        let first = self.first_observation(now)?;
        let elapsed = now.saturating_sub(first.timestamp);
        require!(
            elapsed <= self.window_size,
            OracleError::MissingHistoricalObservation
        );
        require!(
            elapsed >= self.window_size - self.period_size * 2,
            OracleError::UnexpectedTimeElapsed
        );

        if *token_in == self.token0 {
            compute_amount_out(
                first.price0_cumulative,
                price0_cumulative_now,
                elapsed,
                amount_in,
            )
        } else if *token_in == self.token1 {
            compute_amount_out(
                first.price1_cumulative,
                price1_cumulative_now,
                elapsed,
                amount_in,
            )
        } else {
            Err(error!(OracleError::InvalidToken))
        }
    }
}

/// Account layout expected of the liquidity pair this oracle reads: the
/// reserves and the running UQ64.64 cumulative prices for both directions.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug)]
pub struct PairSnapshot {
    pub token0: Pubkey,
    pub token1: Pubkey,
    pub reserve0: u64,
    pub reserve1: u64,
    pub block_timestamp_last: i64,
    pub price0_cumulative_last: u128,
    pub price1_cumulative_last: u128,
}

impl PairSnapshot {
    pub fn load(info: &AccountInfo) -> Result<Self> {
        let data = info.try_borrow_data()?;
        // Skip the owner program's discriminator.
        let mut slice = data
            .get(8..)
            .ok_or_else(|| error!(OracleError::InvalidLayout))?;
        Self::deserialize(&mut slice).map_err(|_| error!(OracleError::InvalidLayout))
    }

    /// Cumulative prices extrapolated from the last pair commit to `now`.
    /// Cumulative accumulators wrap by design.
    pub fn current_cumulative_prices(&self, now: i64) -> Result<(u128, u128)> {
        require!(
            self.reserve0 > 0 && self.reserve1 > 0,
            OracleError::InsufficientLiquidity
        );
        let elapsed = now.saturating_sub(self.block_timestamp_last) as u128;
        if elapsed == 0 {
            return Ok((self.price0_cumulative_last, self.price1_cumulative_last));
        }

        let price0 = (self.reserve1 as u128)
            .checked_mul(Q64)
            .ok_or(OracleError::MathOverflow)?
            .checked_div(self.reserve0 as u128)
            .ok_or(OracleError::MathOverflow)?;
        let price1 = (self.reserve0 as u128)
            .checked_mul(Q64)
            .ok_or(OracleError::MathOverflow)?
            .checked_div(self.reserve1 as u128)
            .ok_or(OracleError::MathOverflow)?;

        Ok((
            self.price0_cumulative_last
                .wrapping_add(price0.wrapping_mul(elapsed)),
            self.price1_cumulative_last
                .wrapping_add(price1.wrapping_mul(elapsed)),
        ))
    }
}

/// Push-feed round, aggregator `latestRoundData` semantics.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug)]
pub struct FeedRound {
    pub round_id: u64,
    pub answer: i128,
    pub updated_at: i64,
    pub answered_in_round: u64,
}

impl FeedRound {
    pub fn load(info: &AccountInfo) -> Result<Self> {
        let data = info.try_borrow_data()?;
        let mut slice = data
            .get(8..)
            .ok_or_else(|| error!(OracleError::InvalidLayout))?;
        Self::deserialize(&mut slice).map_err(|_| error!(OracleError::InvalidLayout))
    }

    /// Strict round validation: any stale, incomplete or zero round fails
    /// rather than falling back to a default.
    pub fn validate(&self, now: i64) -> Result<u128> {
        require!(
            self.round_id == self.answered_in_round,
            OracleError::IncompleteRound
        );
        require!(self.updated_at > 0, OracleError::StaleRound);
        require!(
            now.saturating_sub(self.updated_at) <= MAX_FEED_AGE,
            OracleError::StaleRound
        );
        require!(self.answer > 0, OracleError::ZeroPrice);
        Ok(self.answer as u128)
    }
}
