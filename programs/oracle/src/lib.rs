pub mod account;
pub mod constants;
pub mod context;
pub mod error;
pub mod event;

use crate::account::*;
use crate::constants::*;
use crate::context::*;
use crate::error::OracleError;
use crate::event::*;
use anchor_lang::prelude::*;
use anchor_lang::solana_program::clock::Clock;

declare_id!("HGjZQxb9vX9bAHeAvxK9c4ecuiy5AX9bESBMX146G2aq");

/// Ring slot a timestamp falls into.
pub fn observation_index_of(timestamp: i64, period_size: i64, granularity: u8) -> usize {
    let epoch_period = timestamp / period_size;
    (epoch_period % granularity as i64) as usize
}

/// Average the UQ64.64 cumulative price over `elapsed` seconds and apply
/// it to `amount_in`. The cumulative difference wraps by design.
pub fn compute_amount_out(
    cumulative_start: u128,
    cumulative_end: u128,
    elapsed: i64,
    amount_in: u64,
) -> Result<u64> {
    require!(elapsed > 0, OracleError::UnexpectedTimeElapsed);
    let average = cumulative_end.wrapping_sub(cumulative_start) / elapsed as u128;
    let out = average
        .checked_mul(amount_in as u128)
        .ok_or(OracleError::MathOverflow)?
        >> 64;
    u64::try_from(out).map_err(|_| error!(OracleError::MathOverflow))
}

/// Quote `amount_in` of the oracle's base token in ETH through whichever
/// source the oracle is configured with. Returns the amount alongside
/// the source that answered.
fn eth_quote(
    oracle: &Oracle,
    pair: &AccountInfo,
    feed: &AccountInfo,
    now: i64,
    amount_in: u64,
) -> Result<(u64, PriceSource)> {
    match oracle.price_source {
        PriceSource::Feed => {
            require!(oracle.feed != Pubkey::default(), OracleError::FeedNotConfigured);
            let price = FeedRound::load(feed)?.validate(now)?;
            let out = (amount_in as u128)
                .checked_mul(price)
                .ok_or(OracleError::MathOverflow)?
                / FEED_ETH_PRECISION;
            let out = u64::try_from(out).map_err(|_| error!(OracleError::MathOverflow))?;
            Ok((out, PriceSource::Feed))
        }
        PriceSource::Twap => {
            let snapshot = PairSnapshot::load(pair)?;
            let (cum0, cum1) = snapshot.current_cumulative_prices(now)?;
            let out = oracle.consult(&oracle.base_token, amount_in, now, cum0, cum1)?;
            Ok((out, PriceSource::Twap))
        }
    }
}

#[program]
pub mod oracle {
    use super::*;

    pub fn initialize(
        ctx: Context<InitializeOracle>,
        window_size: i64,
        granularity: u8,
        base_token: Pubkey,
    ) -> Result<()> {
        require!(
            granularity > 1 && (granularity as usize) <= MAX_GRANULARITY,
            OracleError::InvalidGranularity
        );
        require!(
            window_size % granularity as i64 == 0,
            OracleError::WindowNotDivisible
        );

        let snapshot = PairSnapshot::load(&ctx.accounts.pair)?;
        require!(
            base_token == snapshot.token0 || base_token == snapshot.token1,
            OracleError::InvalidToken
        );

        let oracle = &mut ctx.accounts.oracle;
        oracle.authority = ctx.accounts.authority.key();
        oracle.pair = ctx.accounts.pair.key();
        oracle.token0 = snapshot.token0;
        oracle.token1 = snapshot.token1;
        oracle.base_token = base_token;
        oracle.window_size = window_size;
        oracle.granularity = granularity;
        oracle.period_size = window_size / granularity as i64;
        oracle.price_source = PriceSource::Twap;
        oracle.feed = Pubkey::default();
        oracle.eth_usd_feed = Pubkey::default();
        oracle.observations = vec![Observation::default(); granularity as usize];
        Ok(())
    }

    pub fn set_feed(
        ctx: Context<SetFeed>,
        feed: Pubkey,
        eth_usd_feed: Pubkey,
        price_source: PriceSource,
    ) -> Result<()> {
        let oracle = &mut ctx.accounts.oracle;
        oracle.feed = feed;
        oracle.eth_usd_feed = eth_usd_feed;
        oracle.price_source = price_source;
        emit!(FeedChanged {
            feed,
            eth_usd_feed,
            price_source,
        });
        Ok(())
    }

    /// Commit the pair's cumulative prices into the current ring slot.
    /// At most one commit lands per period; extra calls are no-ops, so
    /// this is safe to crank aggressively.
    pub fn update(ctx: Context<Update>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let snapshot = PairSnapshot::load(&ctx.accounts.pair)?;
        let (cum0, cum1) = snapshot.current_cumulative_prices(now)?;
        if let Some(slot_index) = ctx.accounts.oracle.update(now, cum0, cum1)? {
            emit!(PriceUpdated {
                slot_index: slot_index as u64,
                timestamp: now,
                price0_cumulative: cum0,
                price1_cumulative: cum1,
            });
        }
        Ok(())
    }

    /// Window-averaged output amount for `amount_in` of `token_in`.
    pub fn consult(ctx: Context<Consult>, token_in: Pubkey, amount_in: u64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let snapshot = PairSnapshot::load(&ctx.accounts.pair)?;
        let (cum0, cum1) = snapshot.current_cumulative_prices(now)?;
        let amount_out = ctx
            .accounts
            .oracle
            .consult(&token_in, amount_in, now, cum0, cum1)?;
        emit!(Consulted {
            token_in,
            amount_in,
            amount_out,
        });
        Ok(())
    }

    pub fn price_in_eth(ctx: Context<QuoteEth>, amount_in: u64) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let (amount_out, source) = eth_quote(
            &ctx.accounts.oracle,
            &ctx.accounts.pair,
            &ctx.accounts.feed,
            now,
            amount_in,
        )?;
        emit!(Quoted {
            amount_in,
            amount_out,
            source,
            in_usd: false,
        });
        Ok(())
    }

    pub fn price_in_usd(ctx: Context<QuoteUsd>, amount_in: u64) -> Result<()> {
        let oracle = &ctx.accounts.oracle;
        require!(
            oracle.eth_usd_feed != Pubkey::default(),
            OracleError::FeedNotConfigured
        );
        let now = Clock::get()?.unix_timestamp;
        let (eth_amount, source) =
            eth_quote(oracle, &ctx.accounts.pair, &ctx.accounts.feed, now, amount_in)?;
        let usd_price = FeedRound::load(&ctx.accounts.eth_usd_feed)?.validate(now)?;
        let amount_out = (eth_amount as u128)
            .checked_mul(usd_price)
            .ok_or(OracleError::MathOverflow)?
            / FEED_USD_PRECISION;
        let amount_out = u64::try_from(amount_out).map_err(|_| error!(OracleError::MathOverflow))?;
        emit!(Quoted {
            amount_in,
            amount_out,
            source,
            in_usd: true,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: i64 = 24 * 3600;
    const GRANULARITY: u8 = 24;
    const PERIOD: i64 = WINDOW / GRANULARITY as i64;

    fn oracle() -> Oracle {
        Oracle {
            authority: Pubkey::new_unique(),
            pair: Pubkey::new_unique(),
            token0: Pubkey::new_unique(),
            token1: Pubkey::new_unique(),
            base_token: Pubkey::default(),
            window_size: WINDOW,
            granularity: GRANULARITY,
            period_size: PERIOD,
            price_source: PriceSource::Twap,
            feed: Pubkey::default(),
            eth_usd_feed: Pubkey::default(),
            observations: vec![Observation::default(); GRANULARITY as usize],
        }
    }

    #[test]
    fn observation_index_is_periodic() {
        let full_cycle = PERIOD * GRANULARITY as i64;
        for t in [0, PERIOD - 1, PERIOD, 7 * PERIOD + 13, full_cycle - 1] {
            let idx = observation_index_of(t, PERIOD, GRANULARITY);
            assert!(idx < GRANULARITY as usize);
            assert_eq!(idx, observation_index_of(t + full_cycle, PERIOD, GRANULARITY));
        }
        assert_eq!(observation_index_of(0, PERIOD, GRANULARITY), 0);
        assert_eq!(observation_index_of(PERIOD, PERIOD, GRANULARITY), 1);
        assert_eq!(
            observation_index_of(full_cycle, PERIOD, GRANULARITY),
            0
        );
    }

    #[test]
    fn update_commits_once_per_period() {
        let mut o = oracle();
        let t0 = 1_000_000 * PERIOD;
        assert!(o.update(t0, 100, 200).unwrap().is_some());
        // Same period, nothing written.
        assert!(o.update(t0 + PERIOD / 2, 999, 999).unwrap().is_none());
        let idx = observation_index_of(t0, PERIOD, GRANULARITY);
        assert_eq!(o.observations[idx].price0_cumulative, 100);
        // Next period lands in the next slot.
        let next = o.update(t0 + PERIOD, 300, 400).unwrap().unwrap();
        assert_eq!(next, (idx + 1) % GRANULARITY as usize);
    }

    #[test]
    fn consult_averages_a_constant_price() {
        let mut o = oracle();
        let now = 1_000_000 * PERIOD + WINDOW;
        // Constant reserve ratio of 3:1 over the whole window.
        let price0 = 3u128 << 64;
        let first_ts = now - WINDOW + PERIOD;
        let first_idx = observation_index_of(first_ts, PERIOD, GRANULARITY);
        o.observations[first_idx] = Observation {
            timestamp: first_ts,
            price0_cumulative: price0.wrapping_mul(first_ts as u128),
            price1_cumulative: 0,
        };
        // Place the current slot so first_idx is the oldest.
        let cur = Observation {
            timestamp: now,
            price0_cumulative: price0.wrapping_mul(now as u128),
            price1_cumulative: 0,
        };
        let cur_idx = observation_index_of(now, PERIOD, GRANULARITY);
        assert_eq!(first_idx, (cur_idx + 1) % GRANULARITY as usize);
        o.observations[cur_idx] = cur;

        let out = o
            .consult(
                &o.token0,
                1_000,
                now,
                price0.wrapping_mul(now as u128),
                0,
            )
            .unwrap();
        assert_eq!(out, 3_000);
    }

    #[test]
    fn consult_rejects_a_stale_window() {
        let mut o = oracle();
        let now = 1_000_000 * PERIOD;
        let first_idx = (observation_index_of(now, PERIOD, GRANULARITY) + 1)
            % GRANULARITY as usize;
        o.observations[first_idx] = Observation {
            timestamp: now - WINDOW - PERIOD,
            price0_cumulative: 0,
            price1_cumulative: 0,
        };
        let err = o.consult(&o.token0, 1_000, now, 0, 0).unwrap_err();
        assert_eq!(err, OracleError::MissingHistoricalObservation.into());
    }

    #[test]
    fn consult_rejects_an_unknown_token() {
        let mut o = oracle();
        let now = 1_000_000 * PERIOD;
        let first_idx = (observation_index_of(now, PERIOD, GRANULARITY) + 1)
            % GRANULARITY as usize;
        o.observations[first_idx] = Observation {
            timestamp: now - WINDOW + PERIOD,
            price0_cumulative: 0,
            price1_cumulative: 0,
        };
        let stranger = Pubkey::new_unique();
        let err = o.consult(&stranger, 1_000, now, 0, 0).unwrap_err();
        assert_eq!(err, OracleError::InvalidToken.into());
    }

    #[test]
    fn cumulative_prices_extrapolate_between_commits() {
        let snapshot = PairSnapshot {
            token0: Pubkey::new_unique(),
            token1: Pubkey::new_unique(),
            reserve0: 100,
            reserve1: 300,
            block_timestamp_last: 1_000,
            price0_cumulative_last: 7,
            price1_cumulative_last: 11,
        };
        let (cum0, cum1) = snapshot.current_cumulative_prices(1_010).unwrap();
        assert_eq!(cum0, 7 + (3u128 << 64) * 10);
        assert_eq!(cum1, 11 + ((1u128 << 64) / 3) * 10);
        // No time elapsed returns the stored accumulators untouched.
        let (c0, c1) = snapshot.current_cumulative_prices(1_000).unwrap();
        assert_eq!((c0, c1), (7, 11));
    }

    #[test]
    fn cumulative_prices_require_liquidity() {
        let snapshot = PairSnapshot {
            reserve0: 0,
            reserve1: 300,
            ..Default::default()
        };
        let err = snapshot.current_cumulative_prices(1_010).unwrap_err();
        assert_eq!(err, OracleError::InsufficientLiquidity.into());
    }

    #[test]
    fn compute_amount_out_survives_accumulator_wrap() {
        // end < start numerically, but the wrapped difference is exact.
        let start = u128::MAX - (5u128 << 64) + 1;
        let end = (5u128 << 64).wrapping_add(start).wrapping_add(10u128 << 64);
        let out = compute_amount_out(start, end, 5, 100).unwrap();
        assert_eq!(out, 300);
    }

    #[test]
    fn feed_round_validation_is_strict() {
        let now = 10_000;
        let good = FeedRound {
            round_id: 9,
            answer: 42,
            updated_at: now - 60,
            answered_in_round: 9,
        };
        assert_eq!(good.validate(now).unwrap(), 42);

        let incomplete = FeedRound {
            answered_in_round: 8,
            ..good
        };
        assert_eq!(
            incomplete.validate(now).unwrap_err(),
            OracleError::IncompleteRound.into()
        );

        let never_updated = FeedRound {
            updated_at: 0,
            ..good
        };
        assert_eq!(
            never_updated.validate(now).unwrap_err(),
            OracleError::StaleRound.into()
        );

        let stale = FeedRound {
            updated_at: now - MAX_FEED_AGE - 1,
            ..good
        };
        assert_eq!(
            stale.validate(now).unwrap_err(),
            OracleError::StaleRound.into()
        );

        let negative = FeedRound {
            answer: -1,
            ..good
        };
        assert_eq!(
            negative.validate(now).unwrap_err(),
            OracleError::ZeroPrice.into()
        );
    }
}
