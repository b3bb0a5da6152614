use crate::account::*;
use crate::error::ErrorCode;
use crate::{pending_reward, reward_per_block};
use anchor_lang::prelude::Pubkey;

const DECIMALS: u64 = 1_000_000_000;
const BLOCKS_PER_DAY: u64 = 7_150;

fn registry() -> Staking {
    Staking {
        authority: Pubkey::new_unique(),
        nonce: 255,
        paused: false,
        locked: false,
        reward_mint: Pubkey::new_unique(),
        reward_vault: Pubkey::new_unique(),
        funding_wallet: Pubkey::new_unique(),
        fee_wallet: Pubkey::new_unique(),
        escrow_mint: Pubkey::new_unique(),
        vesting_vault: Pubkey::new_unique(),
        perc_per_day: 1,
        blocks_per_day: BLOCKS_PER_DAY,
        total_alloc_point: 0,
        pools: Vec::new(),
        tiers: Vec::new(),
    }
}

fn push_pool(staking: &mut Staking, kind: AssetKind, alloc_point: u64) -> u64 {
    let pool_id = staking.pools.len() as u64;
    let (start_idx, end_idx) = match kind {
        AssetKind::Fungible => (0, 0),
        AssetKind::NonFungible => (10, 19),
    };
    staking.pools.push(Pool {
        kind,
        vesting: false,
        staking_mint: Pubkey::new_unique(),
        staking_vault: Pubkey::new_unique(),
        alloc_point,
        last_reward_slot: 0,
        acc_tkn_per_share: 0,
        total_deposit: 0,
        investor_count: 0,
        start_idx,
        end_idx,
        held_ids: Vec::new(),
    });
    staking.total_alloc_point += alloc_point;
    pool_id
}

fn push_tier(staking: &mut Staking, multiplier: u64, claim_fee: u64, lock_period: u64, force_unlock: bool) {
    staking.tiers.push(LockTier {
        multiplier,
        claim_fee,
        lock_period,
        force_unlock,
    });
}

fn user(pool_id: u64) -> User {
    User {
        staking: Pubkey::new_unique(),
        pool_id,
        owner: Pubkey::new_unique(),
        ..Default::default()
    }
}

fn fungible(amount: u64) -> StakeInput {
    StakeInput::Fungible { amount }
}

fn ids(ids: &[u64]) -> StakeInput {
    StakeInput::NonFungible { ids: ids.to_vec() }
}

#[test]
fn reward_per_block_matches_daily_rate() {
    // 1,000,000 tokens in the funding wallet, 0.001% per day over 7150
    // blocks: (1e15 / 10000) / 10 / 7150.
    let funding = 1_000_000 * DECIMALS;
    let rpb = reward_per_block(funding, 1, BLOCKS_PER_DAY).unwrap();
    assert_eq!(rpb, 1_398_601);

    // Rate scales with the remaining balance.
    assert_eq!(
        reward_per_block(funding / 2, 1, BLOCKS_PER_DAY).unwrap(),
        699_300
    );
    assert_eq!(reward_per_block(0, 1, BLOCKS_PER_DAY).unwrap(), 0);
}

#[test]
fn sole_staker_accrues_full_day_emission() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    let deposit = 1_000 * DECIMALS;
    staking
        .record_deposit(&mut u, pid, 0, &fungible(deposit), 0)
        .unwrap();
    assert_eq!(staking.pending(&u).unwrap(), 0);

    let funding = 1_000_000 * DECIMALS;
    let pulled = staking.accrue_pool(pid, BLOCKS_PER_DAY, funding).unwrap();
    // One day's emission, 0.001% of the funding balance (modulo the
    // per-block floor).
    assert_eq!(pulled, 1_398_601 * BLOCKS_PER_DAY);

    // The sole depositor is owed the full accrued amount.
    assert_eq!(staking.pending(&u).unwrap(), pulled);
}

#[test]
fn accumulator_is_monotonic() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);
    staking
        .record_deposit(&mut u, pid, 0, &fungible(500 * DECIMALS), 0)
        .unwrap();

    let funding = 1_000 * DECIMALS;
    let mut last_acc = 0u128;
    for slot in [10, 11, 500, 500, 7_150, 20_000] {
        staking.accrue_pool(pid, slot, funding).unwrap();
        let acc = staking.pool(pid).unwrap().acc_tkn_per_share;
        assert!(acc >= last_acc);
        last_acc = acc;
    }
}

#[test]
fn accrual_is_idempotent_within_a_slot() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);
    staking
        .record_deposit(&mut u, pid, 0, &fungible(DECIMALS), 0)
        .unwrap();

    let funding = 1_000 * DECIMALS;
    let first = staking.accrue_pool(pid, 100, funding).unwrap();
    assert!(first > 0);
    let acc = staking.pool(pid).unwrap().acc_tkn_per_share;
    assert_eq!(staking.accrue_pool(pid, 100, funding).unwrap(), 0);
    assert_eq!(staking.pool(pid).unwrap().acc_tkn_per_share, acc);
}

#[test]
fn empty_pool_advances_without_accruing() {
    let mut staking = registry();
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);

    let pulled = staking.accrue_pool(pid, 5_000, 1_000 * DECIMALS).unwrap();
    assert_eq!(pulled, 0);
    let pool = staking.pool(pid).unwrap();
    assert_eq!(pool.acc_tkn_per_share, 0);
    assert_eq!(pool.last_reward_slot, 5_000);
}

#[test]
fn zero_weight_pool_advances_without_accruing() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    push_pool(&mut staking, AssetKind::Fungible, 100);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 0);
    let mut u = user(pid);
    staking
        .record_deposit(&mut u, pid, 0, &fungible(DECIMALS), 0)
        .unwrap();

    assert_eq!(staking.accrue_pool(pid, 5_000, 1_000 * DECIMALS).unwrap(), 0);
    assert_eq!(staking.pool(pid).unwrap().last_reward_slot, 5_000);
}

#[test]
fn emission_is_pro_rata_by_alloc_point() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    let a = push_pool(&mut staking, AssetKind::Fungible, 75);
    let b = push_pool(&mut staking, AssetKind::Fungible, 25);
    let mut ua = user(a);
    let mut ub = user(b);
    staking
        .record_deposit(&mut ua, a, 0, &fungible(DECIMALS), 0)
        .unwrap();
    staking
        .record_deposit(&mut ub, b, 0, &fungible(DECIMALS), 0)
        .unwrap();

    let funding = 1_000_000 * DECIMALS;
    let pulled_a = staking.accrue_pool(a, 1_000, funding).unwrap();
    let pulled_b = staking.accrue_pool(b, 1_000, funding).unwrap();
    assert_eq!(pulled_a, pulled_b * 3);
}

#[test]
fn mass_accrue_covers_every_pool() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    let a = push_pool(&mut staking, AssetKind::Fungible, 50);
    let b = push_pool(&mut staking, AssetKind::Fungible, 50);
    let mut ua = user(a);
    let mut ub = user(b);
    staking
        .record_deposit(&mut ua, a, 0, &fungible(DECIMALS), 0)
        .unwrap();
    staking
        .record_deposit(&mut ub, b, 0, &fungible(DECIMALS), 0)
        .unwrap();

    let total = staking.mass_accrue(2_000, 1_000_000 * DECIMALS).unwrap();
    assert!(total > 0);
    assert_eq!(staking.pool(a).unwrap().last_reward_slot, 2_000);
    assert_eq!(staking.pool(b).unwrap().last_reward_slot, 2_000);
}

#[test]
fn mass_accrue_decrements_funding_between_pools() {
    // Two identical pools: the second accrues against the balance left
    // after the first pool's pull, so it earns strictly less.
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    let a = push_pool(&mut staking, AssetKind::Fungible, 50);
    let b = push_pool(&mut staking, AssetKind::Fungible, 50);
    let mut ua = user(a);
    let mut ub = user(b);
    staking
        .record_deposit(&mut ua, a, 0, &fungible(DECIMALS), 0)
        .unwrap();
    staking
        .record_deposit(&mut ub, b, 0, &fungible(DECIMALS), 0)
        .unwrap();

    staking.mass_accrue(2_000, 1_000_000 * DECIMALS).unwrap();
    let acc_a = staking.pool(a).unwrap().acc_tkn_per_share;
    let acc_b = staking.pool(b).unwrap().acc_tkn_per_share;
    assert!(acc_a > 0);
    assert!(acc_b > 0);
    assert!(acc_b < acc_a);
}

#[test]
fn total_deposit_is_conserved_across_operations() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut ua = user(pid);
    let mut ub = user(pid);

    let check = |staking: &Staking, ua: &User, ub: &User| {
        assert_eq!(
            staking.pool(pid).unwrap().total_deposit,
            ua.total_deposit + ub.total_deposit
        );
    };

    staking
        .record_deposit(&mut ua, pid, 0, &fungible(300), 0)
        .unwrap();
    check(&staking, &ua, &ub);
    staking
        .record_deposit(&mut ub, pid, 0, &fungible(700), 10)
        .unwrap();
    check(&staking, &ua, &ub);
    staking
        .record_withdraw(&mut ua, pid, 0, 0, &fungible(300), 20)
        .unwrap();
    check(&staking, &ua, &ub);
    staking
        .record_deposit(&mut ub, pid, 0, &fungible(40), 30)
        .unwrap();
    check(&staking, &ua, &ub);
}

#[test]
fn pending_is_zero_after_every_sync() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);
    let funding = 1_000_000 * DECIMALS;

    staking
        .record_deposit(&mut u, pid, 0, &fungible(1_000), 0)
        .unwrap();
    assert_eq!(staking.pending(&u).unwrap(), 0);

    staking.accrue_pool(pid, 1_000, funding).unwrap();
    assert!(staking.pending(&u).unwrap() > 0);

    // A fresh deposit resyncs the debt; the handler pays the pending
    // amount out first.
    staking
        .record_deposit(&mut u, pid, 0, &fungible(500), 100)
        .unwrap();
    assert_eq!(staking.pending(&u).unwrap(), 0);

    staking.accrue_pool(pid, 2_000, funding).unwrap();
    staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(1_000), 200)
        .unwrap();
    assert_eq!(staking.pending(&u).unwrap(), 0);
}

#[test]
fn forced_unlock_splits_fee() {
    // 2x tier, 5% fee, one day lock; raw 100 withdrawn immediately.
    let mut staking = registry();
    push_tier(&mut staking, 20_000, 500, 86_400, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();
    assert_eq!(staking.pool(pid).unwrap().total_deposit, 200);
    assert_eq!(u.total_deposit, 200);

    let outcome = staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 0)
        .unwrap();
    assert_eq!(outcome.fee, 5);
    assert_eq!(outcome.payout, 95);
    assert_eq!(outcome.escrow_burn, 100);
    assert_eq!(outcome.weighted, 200);
    assert_eq!(staking.pool(pid).unwrap().total_deposit, 0);
    assert_eq!(u.total_deposit, 0);
}

#[test]
fn matured_withdraw_pays_in_full() {
    let mut staking = registry();
    push_tier(&mut staking, 20_000, 500, 86_400, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();
    let outcome = staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 86_400)
        .unwrap();
    assert_eq!(outcome.fee, 0);
    assert_eq!(outcome.payout, 100);
}

#[test]
fn second_withdraw_of_same_deposit_is_rejected() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();
    staking
        .record_deposit(&mut u, pid, 0, &fungible(50), 0)
        .unwrap();
    staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 10)
        .unwrap();

    let err = staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 20)
        .unwrap_err();
    assert_eq!(err, ErrorCode::AlreadyWithdrawn.into());

    // The neighbouring index is still withdrawable.
    staking
        .record_withdraw(&mut u, pid, 0, 1, &fungible(50), 30)
        .unwrap();
}

#[test]
fn lock_withdraw_amount_must_match_the_entry() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();

    // Lock deposits leave whole; a partial or inflated amount is rejected
    // and the entry stays withdrawable.
    for wrong in [1, 99, 101] {
        let err = staking
            .record_withdraw(&mut u, pid, 0, 0, &fungible(wrong), 10)
            .unwrap_err();
        assert_eq!(err, ErrorCode::LockAmountMismatch.into());
    }
    assert!(!u.lock_deposits[0].withdrawn);

    let outcome = staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 10)
        .unwrap();
    assert_eq!(outcome.payout, 100);
}

#[test]
fn locked_deposit_without_forced_unlock_is_rejected() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 500, 86_400, false);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();
    let total_before = staking.pool(pid).unwrap().total_deposit;

    let err = staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 100)
        .unwrap_err();
    assert_eq!(err, ErrorCode::ForcedUnlockDisabled.into());
    assert_eq!(staking.pool(pid).unwrap().total_deposit, total_before);
    assert!(!u.lock_deposits[0].withdrawn);
}

#[test]
fn unconfigured_tier_rejects_deposits() {
    let mut staking = registry();
    push_tier(&mut staking, 0, 0, 0, false);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    let err = staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap_err();
    assert_eq!(err, ErrorCode::TierNotConfigured.into());

    let err = staking
        .record_deposit(&mut u, pid, 5, &fungible(100), 0)
        .unwrap_err();
    assert_eq!(err, ErrorCode::UnknownLockTier.into());
}

#[test]
fn tier_changes_apply_to_existing_deposits() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 500, 86_400, false);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();

    // Shorten the lock after the fact; the old deposit matures early.
    staking.tiers[0].lock_period = 10;
    let outcome = staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 20)
        .unwrap();
    assert_eq!(outcome.fee, 0);
    assert_eq!(outcome.payout, 100);
}

#[test]
fn nft_pool_checks_range_and_duplicates() {
    let mut staking = registry();
    push_pool(&mut staking, AssetKind::Fungible, 0);
    let pid = push_pool(&mut staking, AssetKind::NonFungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &ids(&[10, 11]), 0)
        .unwrap();
    assert_eq!(u.total_deposit, 2);
    assert_eq!(staking.pool(pid).unwrap().total_deposit, 2);

    let err = staking
        .record_deposit(&mut u, pid, 0, &ids(&[11]), 0)
        .unwrap_err();
    assert_eq!(err, ErrorCode::DuplicateId.into());

    let err = staking
        .record_deposit(&mut u, pid, 0, &ids(&[20]), 0)
        .unwrap_err();
    assert_eq!(err, ErrorCode::IdOutOfRange.into());
}

#[test]
fn nft_withdraw_requires_held_ids() {
    let mut staking = registry();
    push_pool(&mut staking, AssetKind::Fungible, 0);
    let pid = push_pool(&mut staking, AssetKind::NonFungible, 100);
    let mut ua = user(pid);
    let mut ub = user(pid);

    staking
        .record_deposit(&mut ua, pid, 0, &ids(&[10, 11]), 0)
        .unwrap();
    staking
        .record_deposit(&mut ub, pid, 0, &ids(&[12]), 0)
        .unwrap();

    // Held by another user, not the caller.
    let err = staking
        .record_withdraw(&mut ub, pid, 0, 0, &ids(&[10]), 10)
        .unwrap_err();
    assert_eq!(err, ErrorCode::IdNotHeld.into());

    let outcome = staking
        .record_withdraw(&mut ua, pid, 0, 0, &ids(&[10]), 10)
        .unwrap();
    assert_eq!(outcome.weighted, 1);
    assert_eq!(outcome.payout, 1);
    assert!(!staking.pool(pid).unwrap().held_ids.contains(&10));
    assert!(!ua.held_ids.contains(&10));
    assert!(staking.pool(pid).unwrap().held_ids.contains(&12));
}

#[test]
fn plain_pool_withdraw_is_bounded_by_deposit() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, false);
    push_pool(&mut staking, AssetKind::Fungible, 0);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();
    let err = staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(101), 10)
        .unwrap_err();
    assert_eq!(err, ErrorCode::InsufficientDeposit.into());

    staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 10)
        .unwrap();
    assert_eq!(u.total_deposit, 0);
}

#[test]
fn investor_count_tracks_entries_and_exits() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);

    assert_eq!(staking.pool(pid).unwrap().investor_count, 0);
    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();
    assert_eq!(staking.pool(pid).unwrap().investor_count, 1);
    staking
        .record_deposit(&mut u, pid, 0, &fungible(100), 0)
        .unwrap();
    assert_eq!(staking.pool(pid).unwrap().investor_count, 1);

    staking
        .record_withdraw(&mut u, pid, 0, 0, &fungible(100), 10)
        .unwrap();
    assert_eq!(staking.pool(pid).unwrap().investor_count, 1);
    staking
        .record_withdraw(&mut u, pid, 0, 1, &fungible(100), 10)
        .unwrap();
    assert_eq!(staking.pool(pid).unwrap().investor_count, 0);
}

#[test]
fn pending_never_underflows() {
    let mut staking = registry();
    push_tier(&mut staking, 10_000, 0, 0, true);
    let pid = push_pool(&mut staking, AssetKind::Fungible, 100);
    let mut u = user(pid);
    let funding = 1_000_000 * DECIMALS;

    staking
        .record_deposit(&mut u, pid, 0, &fungible(1_000), 0)
        .unwrap();
    let mut last_pending = 0u64;
    for slot in [100, 200, 300] {
        staking.accrue_pool(pid, slot, funding).unwrap();
        let pool = staking.pool(pid).unwrap();
        let pending =
            pending_reward(u.total_deposit, pool.acc_tkn_per_share, u.reward_debt).unwrap();
        assert!(pending >= last_pending);
        last_pending = pending;
    }
    assert!(last_pending > 0);
}
