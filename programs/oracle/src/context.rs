use crate::account::*;
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct InitializeOracle<'info> {
    #[account(zero)]
    pub oracle: Box<Account<'info, Oracle>>,
    pub authority: Signer<'info>,
    /// CHECK: pair layout is validated on every read.
    pub pair: AccountInfo<'info>,
}

#[derive(Accounts)]
pub struct SetFeed<'info> {
    #[account(mut, has_one = authority)]
    pub oracle: Box<Account<'info, Oracle>>,
    pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct Update<'info> {
    #[account(mut)]
    pub oracle: Box<Account<'info, Oracle>>,
    /// CHECK: address pinned to the oracle's pair.
    #[account(constraint = pair.key() == oracle.pair @ crate::error::OracleError::AccountMismatch)]
    pub pair: AccountInfo<'info>,
}

#[derive(Accounts)]
pub struct Consult<'info> {
    pub oracle: Box<Account<'info, Oracle>>,
    /// CHECK: address pinned to the oracle's pair.
    #[account(constraint = pair.key() == oracle.pair @ crate::error::OracleError::AccountMismatch)]
    pub pair: AccountInfo<'info>,
}

#[derive(Accounts)]
pub struct QuoteEth<'info> {
    pub oracle: Box<Account<'info, Oracle>>,
    /// CHECK: address pinned to the oracle's pair.
    #[account(constraint = pair.key() == oracle.pair @ crate::error::OracleError::AccountMismatch)]
    pub pair: AccountInfo<'info>,
    /// CHECK: address pinned to the configured feed; round layout is
    /// validated on read.
    #[account(constraint = feed.key() == oracle.feed @ crate::error::OracleError::AccountMismatch)]
    pub feed: AccountInfo<'info>,
}

#[derive(Accounts)]
pub struct QuoteUsd<'info> {
    pub oracle: Box<Account<'info, Oracle>>,
    /// CHECK: address pinned to the oracle's pair.
    #[account(constraint = pair.key() == oracle.pair @ crate::error::OracleError::AccountMismatch)]
    pub pair: AccountInfo<'info>,
    /// CHECK: address pinned to the configured feed.
    #[account(constraint = feed.key() == oracle.feed @ crate::error::OracleError::AccountMismatch)]
    pub feed: AccountInfo<'info>,
    /// CHECK: address pinned to the configured ETH/USD feed.
    #[account(constraint = eth_usd_feed.key() == oracle.eth_usd_feed @ crate::error::OracleError::AccountMismatch)]
    pub eth_usd_feed: AccountInfo<'info>,
}
