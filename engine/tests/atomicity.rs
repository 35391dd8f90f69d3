//! A failed token transfer must leave the stake ledger exactly as it was.

use stakepool_engine::{Payout, PoolTerms, StakingEngine, StakingError};
use stakepool_nullables::{NullClock, NullTokenLedger, TransferCall};
use stakepool_token::{TokenLedger, TransferError};
use stakepool_types::{AccountId, Timestamp, TokenId, SECS_PER_DAY};
use std::sync::Arc;

const T0: u64 = 1_000_000;

fn owner() -> AccountId {
    AccountId::new("owner")
}

fn alice() -> AccountId {
    AccountId::new("alice")
}

fn bob() -> AccountId {
    AccountId::new("bob")
}

fn escrow() -> AccountId {
    AccountId::new("escrow")
}

fn stk() -> TokenId {
    TokenId::new("STK")
}

fn setup(reward_token: &str) -> (Arc<NullClock>, Arc<NullTokenLedger>, StakingEngine) {
    let clock = Arc::new(NullClock::new(T0));
    let tokens = Arc::new(NullTokenLedger::new());
    let engine = StakingEngine::new(clock.clone(), tokens.clone(), escrow(), owner());
    engine
        .create_pool(
            &owner(),
            PoolTerms {
                start_time: Timestamp::new(T0),
                stake_token: TokenId::new("STK"),
                reward_token: TokenId::new(reward_token),
                min_stake_amount: 100,
                max_stake_amount_per_user: 100_000,
                pool_cap: 1_000_000,
                duration_days: 30,
                redemption_buffer_days: 2,
                apr: 50,
                apr_denominator: 100,
                whitelist_threshold: 1_000,
            },
        )
        .unwrap();
    tokens.fund(&TokenId::new("STK"), &alice(), &escrow(), 50_000);
    (clock, tokens, engine)
}

#[test]
fn stake_with_insufficient_balance_changes_nothing() {
    let (_clock, tokens, engine) = setup("STK");
    tokens
        .inner()
        .approve(&TokenId::new("STK"), &alice(), &escrow(), 1_000_000);
    let err = engine.stake(0, &alice(), 60_000).unwrap_err();
    assert!(matches!(
        err,
        StakingError::TransferFailed(TransferError::InsufficientBalance { .. })
    ));
    assert_eq!(engine.get_stake_info(0, &alice()).unwrap().amount, 0);
    assert_eq!(engine.total_staked(0).unwrap(), 0);
    assert_eq!(tokens.balance_of(&TokenId::new("STK"), &alice()), 50_000);
}

#[test]
fn collaborator_outage_on_stake_changes_nothing() {
    let (_clock, tokens, engine) = setup("STK");
    engine.stake(0, &alice(), 1_000).unwrap();
    tokens.fail_next_transfer_in(TransferError::Unavailable("maintenance".into()));
    assert_eq!(engine.stake(0, &alice(), 500).unwrap_err().kind(), "TransferFailed");
    assert_eq!(engine.get_stake_info(0, &alice()).unwrap().amount, 1_000);
    assert!(engine.is_whitelisted(0, &alice()).unwrap());
}

#[test]
fn unstake_failure_keeps_position() {
    let (_clock, tokens, engine) = setup("STK");
    engine.stake(0, &alice(), 2_000).unwrap();
    tokens.fail_transfer_out_after(0);
    assert!(engine.unstake(0, &alice()).is_err());
    assert_eq!(engine.get_stake_info(0, &alice()).unwrap().amount, 2_000);
    assert_eq!(engine.total_staked(0).unwrap(), 2_000);
}

#[test]
fn withdraw_with_unfunded_reward_escrow_changes_nothing() {
    let (clock, tokens, engine) = setup("RWD");
    engine.stake(0, &alice(), 10_000).unwrap();
    clock.advance_days(32);

    let err = engine.withdraw(0, &alice()).unwrap_err();
    assert!(matches!(
        err,
        StakingError::TransferFailed(TransferError::InsufficientEscrow { .. })
    ));
    // the reserve check stops the payout before any leg moves
    assert!(!tokens
        .calls()
        .iter()
        .any(|c| matches!(c, TransferCall::Out { .. })));
    assert_eq!(engine.get_stake_info(0, &alice()).unwrap().amount, 10_000);
}

#[test]
fn distinct_reward_token_pays_both_legs() {
    let (clock, tokens, engine) = setup("RWD");
    let rwd = TokenId::new("RWD");
    tokens.fund(&rwd, &owner(), &escrow(), 1_000_000);
    engine.fund_rewards(&owner(), &rwd, 1_000_000).unwrap();
    engine.stake(0, &alice(), 10_000).unwrap();
    clock.advance_days(32);

    let payout = engine.withdraw(0, &alice()).unwrap();
    assert_eq!(payout.reward, 10_000 * 50 * 30 / 365 / 100);
    assert_eq!(tokens.balance_of(&TokenId::new("STK"), &alice()), 50_000);
    assert_eq!(tokens.balance_of(&rwd, &alice()), payout.reward);
    assert_eq!(engine.reward_reserve(&rwd), 1_000_000 - payout.reward);
}

#[test]
fn failed_reward_leg_reverses_principal_leg() {
    let (clock, tokens, engine) = setup("RWD");
    let rwd = TokenId::new("RWD");
    tokens.fund(&rwd, &owner(), &escrow(), 1_000_000);
    engine.fund_rewards(&owner(), &rwd, 1_000_000).unwrap();
    engine.stake(0, &alice(), 10_000).unwrap();
    clock.set(T0 + 40 * SECS_PER_DAY);

    let stk_before = tokens.balance_of(&TokenId::new("STK"), &alice());
    // principal leg succeeds, reward leg fails
    tokens.fail_transfer_out_after(1);
    let err = engine.withdraw(0, &alice()).unwrap_err();
    assert_eq!(err.kind(), "TransferFailed");

    assert_eq!(tokens.balance_of(&TokenId::new("STK"), &alice()), stk_before);
    assert_eq!(tokens.balance_of(&rwd, &alice()), 0);
    let pos = engine.get_stake_info(0, &alice()).unwrap();
    assert_eq!(pos.amount, 10_000);
    assert!(!pos.withdrawn);
    assert_eq!(pos.unpaid_reward, 0);

    // a retry once the collaborator recovers succeeds
    let payout = engine.withdraw(0, &alice()).unwrap();
    assert_eq!(payout.principal, 10_000);
}

#[test]
fn exact_allowance_staker_is_never_paid_principal_twice() {
    let (clock, tokens, engine) = setup("RWD");
    let rwd = TokenId::new("RWD");
    let carol = AccountId::new("carol");
    tokens.fund(&rwd, &owner(), &escrow(), 1_000_000);
    engine.fund_rewards(&owner(), &rwd, 1_000_000).unwrap();
    tokens.fund(&stk(), &carol, &escrow(), 10_000);
    engine.stake(0, &carol, 10_000).unwrap();
    engine.stake(0, &alice(), 10_000).unwrap();
    clock.set(T0 + 40 * SECS_PER_DAY);
    let reward = engine.get_reward_claimable(0, &carol).unwrap();
    assert_eq!(reward, 410);

    // reward leg fails; carol has no allowance left to pull the principal back
    tokens.fail_transfer_out_after(1);
    assert_eq!(engine.withdraw(0, &carol).unwrap_err().kind(), "TransferFailed");

    assert_eq!(tokens.balance_of(&stk(), &carol), 10_000);
    let pos = engine.get_stake_info(0, &carol).unwrap();
    assert_eq!(pos.amount, 0);
    assert_eq!(pos.unpaid_reward, reward);
    assert!(!pos.withdrawn);
    assert_eq!(engine.total_staked(0).unwrap(), 10_000);
    assert_eq!(engine.get_reward_claimable(0, &carol).unwrap(), reward);
    assert!(matches!(
        engine.unstake(0, &carol),
        Err(StakingError::NoActiveStake { .. })
    ));

    // the retry pays only the owed reward
    let payout = engine.withdraw(0, &carol).unwrap();
    assert_eq!(payout, Payout { principal: 0, reward });
    assert_eq!(tokens.balance_of(&stk(), &carol), 10_000);
    assert_eq!(tokens.balance_of(&rwd, &carol), reward);
    assert!(engine.get_stake_info(0, &carol).unwrap().withdrawn);
    assert_eq!(engine.reward_reserve(&rwd), 1_000_000 - reward);
    assert!(engine.withdraw(0, &carol).is_err());

    // the other staker's principal is still in escrow
    assert_eq!(engine.unstake(0, &alice()).unwrap(), 10_000);
    assert_eq!(tokens.balance_of(&stk(), &escrow()), 0);
}

#[test]
fn unfunded_rewards_never_spend_other_stakers_principal() {
    let (clock, tokens, engine) = setup("STK");
    tokens.fund(&stk(), &bob(), &escrow(), 10_000);
    engine.stake(0, &alice(), 10_000).unwrap();
    engine.stake(0, &bob(), 10_000).unwrap();
    clock.set(T0 + 40 * SECS_PER_DAY);

    let err = engine.withdraw(0, &alice()).unwrap_err();
    assert!(matches!(
        err,
        StakingError::TransferFailed(TransferError::InsufficientEscrow { needed: 410, available: 0, .. })
    ));
    assert_eq!(engine.get_stake_info(0, &alice()).unwrap().amount, 10_000);
    assert_eq!(tokens.balance_of(&stk(), &escrow()), 20_000);

    // funding covers one reward, not two
    tokens.fund(&stk(), &owner(), &escrow(), 600);
    engine.fund_rewards(&owner(), &stk(), 600).unwrap();
    assert_eq!(engine.withdraw(0, &alice()).unwrap().reward, 410);
    assert_eq!(engine.reward_reserve(&stk()), 190);
    assert!(matches!(
        engine.withdraw(0, &bob()).unwrap_err(),
        StakingError::TransferFailed(TransferError::InsufficientEscrow { needed: 410, available: 190, .. })
    ));

    assert_eq!(engine.unstake(0, &bob()).unwrap(), 10_000);
    assert_eq!(tokens.balance_of(&stk(), &escrow()), 190);
}
