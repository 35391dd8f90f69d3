//! Many threads hammering one engine.

use stakepool_engine::{PoolTerms, StakingEngine, StakingError};
use stakepool_nullables::{NullClock, NullTokenLedger};
use stakepool_token::TokenLedger;
use stakepool_types::{AccountId, Timestamp, TokenId};
use std::sync::Arc;
use std::thread;

const T0: u64 = 5_000;

fn engine(pool_cap: u128, max_per_user: u128) -> (Arc<NullTokenLedger>, Arc<StakingEngine>) {
    let clock = Arc::new(NullClock::new(T0));
    let tokens = Arc::new(NullTokenLedger::new());
    let owner = AccountId::new("owner");
    let engine = StakingEngine::new(clock, tokens.clone(), AccountId::new("escrow"), owner.clone());
    engine
        .create_pool(
            &owner,
            PoolTerms {
                start_time: Timestamp::new(T0),
                stake_token: TokenId::new("STK"),
                reward_token: TokenId::new("STK"),
                min_stake_amount: 1,
                max_stake_amount_per_user: max_per_user,
                pool_cap,
                duration_days: 7,
                redemption_buffer_days: 0,
                apr: 10,
                apr_denominator: 100,
                whitelist_threshold: 50,
            },
        )
        .unwrap();
    (tokens, Arc::new(engine))
}

#[test]
fn concurrent_stakes_never_exceed_pool_cap() {
    let (tokens, engine) = engine(1_000, 1_000);
    let escrow = AccountId::new("escrow");
    let stk = TokenId::new("STK");
    for i in 0..16 {
        tokens.fund(&stk, &AccountId::new(format!("u{i}")), &escrow, 10_000);
    }

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = engine.clone();
            thread::spawn(move || {
                let account = AccountId::new(format!("u{i}"));
                let mut accepted = 0u128;
                for _ in 0..20 {
                    match engine.stake(0, &account, 7) {
                        Ok(_) => accepted += 7,
                        Err(StakingError::AboveCap { .. }) => {}
                        Err(other) => panic!("unexpected error: {other}"),
                    }
                }
                accepted
            })
        })
        .collect();
    let accepted: u128 = handles.into_iter().map(|h| h.join().unwrap()).sum();

    let total = engine.total_staked(0).unwrap();
    assert!(total <= 1_000);
    assert_eq!(total, accepted);
    assert_eq!(tokens.balance_of(&stk, &escrow), total);
    let sum: u128 = engine.stakers(0).unwrap().iter().map(|(_, p)| p.amount).sum();
    assert_eq!(sum, total);
}

#[test]
fn same_account_racing_itself_respects_per_user_cap() {
    let (tokens, engine) = engine(1_000_000, 100);
    let alice = AccountId::new("alice");
    tokens.fund(&TokenId::new("STK"), &alice, &AccountId::new("escrow"), 10_000);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = engine.clone();
            let alice = alice.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    let _ = engine.stake(0, &alice, 3);
                    let _ = engine.unstake(0, &alice);
                    let _ = engine.stake(0, &alice, 40);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let position = engine.get_stake_info(0, &alice).unwrap();
    assert!(position.amount <= 100);
    assert_eq!(engine.total_staked(0).unwrap(), position.amount);
    assert_eq!(
        tokens.balance_of(&TokenId::new("STK"), &alice),
        10_000 - position.amount
    );
}
