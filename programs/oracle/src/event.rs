use crate::account::PriceSource;
use anchor_lang::prelude::*;

#[event]
pub struct PriceUpdated {
    pub slot_index: u64,
    pub timestamp: i64,
    pub price0_cumulative: u128,
    pub price1_cumulative: u128,
}

#[event]
pub struct Consulted {
    pub token_in: Pubkey,
    pub amount_in: u64,
    pub amount_out: u64,
}

#[event]
pub struct Quoted {
    pub amount_in: u64,
    pub amount_out: u64,
    pub source: PriceSource,
    pub in_usd: bool,
}

#[event]
pub struct FeedChanged {
    pub feed: Pubkey,
    pub eth_usd_feed: Pubkey,
    pub price_source: PriceSource,
}
