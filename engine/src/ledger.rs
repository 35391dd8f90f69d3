//! Stake ledger: per-pool books of stake positions.
//!
//! Each pool's book sits behind its own mutex. A mutation holds that lock
//! from validation through the token transfer to the commit, so updates to
//! one `(pool, account)` key are linearized and the pool-cap check cannot
//! race. Ledger state is only written after the transfer succeeds.
//!
//! Rewards are paid only out of the reward reserve: the amount of each reward
//! token funded into escrow and not yet paid. Staked principal never backs a
//! reward.

use crate::error::{CapScope, StakingError};
use crate::pool::Pool;
use crate::position::{Payout, StakePosition};
use crate::reward::claimable_reward;
use crate::whitelist::is_whitelisted;
use stakepool_token::{TokenLedger, TransferError};
use stakepool_types::{AccountId, PoolId, Timestamp, TokenId};
use stakepool_utils::format_duration;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct PoolBook {
    positions: BTreeMap<AccountId, StakePosition>,
    total_staked: u128,
}

impl PoolBook {
    fn position(&self, account: &AccountId) -> StakePosition {
        self.positions.get(account).cloned().unwrap_or_default()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// How far a payout got.
enum Settlement {
    Paid,
    /// The principal landed but the reward leg failed and the principal could
    /// not be pulled back.
    PrincipalOnly(TransferError),
}

/// Owns every stake position and moves funds through the token ledger.
pub struct StakeLedger {
    books: RwLock<HashMap<PoolId, Arc<Mutex<PoolBook>>>>,
    tokens: Arc<dyn TokenLedger>,
    escrow: AccountId,
    /// Funded, unpaid reward per reward token. Held across every escrow
    /// payout so checks and transfer legs do not interleave.
    reserves: Mutex<HashMap<TokenId, u128>>,
}

impl StakeLedger {
    pub fn new(tokens: Arc<dyn TokenLedger>, escrow: AccountId) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            tokens,
            escrow,
            reserves: Mutex::new(HashMap::new()),
        }
    }

    pub fn escrow(&self) -> &AccountId {
        &self.escrow
    }

    /// Pull `amount` of `token` from `funder` into escrow and add it to the
    /// reward reserve. Returns the new reserve.
    pub fn fund_rewards(
        &self,
        funder: &AccountId,
        token: &TokenId,
        amount: u128,
    ) -> Result<u128, StakingError> {
        let mut reserves = lock(&self.reserves);
        let funded = reserves
            .get(token)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        self.tokens.transfer_in(token, funder, &self.escrow, amount)?;
        reserves.insert(token.clone(), funded);
        Ok(funded)
    }

    /// Reward funds of `token` available for payouts.
    pub fn reward_reserve(&self, token: &TokenId) -> u128 {
        lock(&self.reserves).get(token).copied().unwrap_or(0)
    }

    /// Create the empty book for a newly registered pool.
    pub fn open_book(&self, pool_id: PoolId) {
        self.books
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(pool_id)
            .or_default();
    }

    fn book(&self, pool_id: PoolId) -> Result<Arc<Mutex<PoolBook>>, StakingError> {
        self.books
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pool_id)
            .cloned()
            .ok_or(StakingError::PoolNotFound(pool_id))
    }

    /// Deposit `amount` into `account`'s position, pulling funds into escrow.
    pub fn stake(
        &self,
        pool: &Pool,
        account: &AccountId,
        amount: u128,
        now: Timestamp,
    ) -> Result<StakePosition, StakingError> {
        let book = self.book(pool.id)?;
        let mut book = lock(&book);

        if !pool.is_open_for_staking(now) {
            return Err(StakingError::PoolClosed(pool.id));
        }
        let terms = &pool.terms;
        if amount == 0 || amount < terms.min_stake_amount {
            return Err(StakingError::BelowMinimum {
                amount,
                minimum: terms.min_stake_amount.max(1),
            });
        }

        let current = book.position(account);
        let base = if current.withdrawn { 0 } else { current.amount };
        let user_total = base.checked_add(amount).ok_or(StakingError::Overflow)?;
        if user_total > terms.max_stake_amount_per_user {
            return Err(StakingError::AboveCap {
                scope: CapScope::PerUser,
                resulting: user_total,
                limit: terms.max_stake_amount_per_user,
            });
        }
        let pool_total = book
            .total_staked
            .checked_add(amount)
            .ok_or(StakingError::Overflow)?;
        if pool_total > terms.pool_cap {
            return Err(StakingError::AboveCap {
                scope: CapScope::Pool,
                resulting: pool_total,
                limit: terms.pool_cap,
            });
        }

        self.tokens
            .transfer_in(&terms.stake_token, account, &self.escrow, amount)?;

        let position = StakePosition {
            amount: user_total,
            staked_at: now,
            ..StakePosition::default()
        };
        book.positions.insert(account.clone(), position.clone());
        book.total_staked = pool_total;

        info!(
            pool_id = pool.id,
            %account,
            amount,
            position = user_total,
            whitelisted = is_whitelisted(&position, pool),
            "stake accepted"
        );
        Ok(position)
    }

    /// Return the full principal and drop the position, forfeiting any reward.
    pub fn unstake(
        &self,
        pool: &Pool,
        account: &AccountId,
        now: Timestamp,
    ) -> Result<u128, StakingError> {
        let book = self.book(pool.id)?;
        let mut book = lock(&book);

        let position = book.position(account);
        if !position.is_active() {
            return Err(StakingError::NoActiveStake {
                pool_id: pool.id,
                account: account.clone(),
            });
        }

        {
            let _reserves = lock(&self.reserves);
            self.tokens
                .transfer_out(&pool.terms.stake_token, &self.escrow, account, position.amount)?;
        }

        book.positions.remove(account);
        book.total_staked = book.total_staked.saturating_sub(position.amount);

        info!(
            pool_id = pool.id,
            %account,
            amount = position.amount,
            at = %now,
            "stake returned without reward"
        );
        Ok(position.amount)
    }

    /// Pay principal plus the cliff reward once the redemption period has passed.
    ///
    /// If the principal was paid but the reward leg failed and could not be
    /// reversed, the principal is committed as paid, the reward is recorded as
    /// owed and the error is returned. The next call pays only that reward.
    pub fn withdraw(
        &self,
        pool: &Pool,
        account: &AccountId,
        now: Timestamp,
    ) -> Result<Payout, StakingError> {
        let book = self.book(pool.id)?;
        let mut book = lock(&book);

        let position = book.position(account);
        if !position.is_active() && !position.awaits_reward() {
            return Err(StakingError::NoActiveStake {
                pool_id: pool.id,
                account: account.clone(),
            });
        }
        if !pool.is_redeemable(now) {
            debug!(
                pool_id = pool.id,
                %account,
                wait = %format_duration(now.secs_until(pool.redemption_time())),
                "withdrawal before redemption"
            );
            return Err(StakingError::RedemptionPeriodNotElapsed {
                redeemable_at: pool.redemption_time(),
                now,
            });
        }

        let payout = Payout {
            principal: position.amount,
            reward: claimable_reward(&position, pool, now)?,
        };
        if let Settlement::PrincipalOnly(e) = self.pay_out(pool, account, payout)? {
            warn!(
                pool_id = pool.id,
                %account,
                principal = payout.principal,
                unpaid_reward = payout.reward,
                "principal paid, reward left owed"
            );
            book.positions.insert(
                account.clone(),
                StakePosition {
                    amount: 0,
                    staked_at: position.staked_at,
                    withdrawn: false,
                    unpaid_reward: payout.reward,
                },
            );
            book.total_staked = book.total_staked.saturating_sub(payout.principal);
            return Err(e.into());
        }

        book.positions.insert(
            account.clone(),
            StakePosition {
                amount: 0,
                staked_at: position.staked_at,
                withdrawn: true,
                unpaid_reward: 0,
            },
        );
        book.total_staked = book.total_staked.saturating_sub(payout.principal);

        info!(
            pool_id = pool.id,
            %account,
            principal = payout.principal,
            reward = payout.reward,
            "withdrawal paid"
        );
        Ok(payout)
    }

    /// Move a payout from escrow to `account`. On `Err` nothing has moved.
    fn pay_out(&self, pool: &Pool, account: &AccountId, payout: Payout) -> Result<Settlement, StakingError> {
        let terms = &pool.terms;
        let mut reserves = lock(&self.reserves);

        let reserve = reserves.get(&terms.reward_token).copied().unwrap_or(0);
        if reserve < payout.reward {
            return Err(TransferError::InsufficientEscrow {
                token: terms.reward_token.clone(),
                escrow: self.escrow.clone(),
                needed: payout.reward,
                available: reserve,
            }
            .into());
        }

        if terms.stake_token == terms.reward_token {
            let total = payout
                .principal
                .checked_add(payout.reward)
                .ok_or(StakingError::Overflow)?;
            self.tokens
                .transfer_out(&terms.stake_token, &self.escrow, account, total)?;
            reserves.insert(terms.reward_token.clone(), reserve - payout.reward);
            return Ok(Settlement::Paid);
        }

        if payout.reward > 0 {
            let available = self.tokens.balance_of(&terms.reward_token, &self.escrow);
            if available < payout.reward {
                return Err(TransferError::InsufficientEscrow {
                    token: terms.reward_token.clone(),
                    escrow: self.escrow.clone(),
                    needed: payout.reward,
                    available,
                }
                .into());
            }
        }

        if payout.principal > 0 {
            self.tokens
                .transfer_out(&terms.stake_token, &self.escrow, account, payout.principal)?;
        }
        if payout.reward == 0 {
            return Ok(Settlement::Paid);
        }
        if let Err(e) = self
            .tokens
            .transfer_out(&terms.reward_token, &self.escrow, account, payout.reward)
        {
            if payout.principal == 0 {
                return Err(e.into());
            }
            warn!(pool_id = pool.id, %account, error = %e, "reward leg failed, reversing principal leg");
            return match self.tokens.transfer_in(
                &terms.stake_token,
                account,
                &self.escrow,
                payout.principal,
            ) {
                Ok(()) => Err(e.into()),
                Err(rollback) => {
                    error!(
                        pool_id = pool.id,
                        %account,
                        principal = payout.principal,
                        error = %rollback,
                        "principal reversal failed"
                    );
                    Ok(Settlement::PrincipalOnly(e))
                }
            };
        }
        reserves.insert(terms.reward_token.clone(), reserve - payout.reward);
        Ok(Settlement::Paid)
    }

    /// The account's position in a pool; the zero value if it has none.
    pub fn position(&self, pool_id: PoolId, account: &AccountId) -> Result<StakePosition, StakingError> {
        let book = self.book(pool_id)?;
        let book = lock(&book);
        Ok(book.position(account))
    }

    pub fn total_staked(&self, pool_id: PoolId) -> Result<u128, StakingError> {
        let book = self.book(pool_id)?;
        let total = lock(&book).total_staked;
        Ok(total)
    }

    /// Accounts with a live position, sorted by account id.
    pub fn stakers(&self, pool_id: PoolId) -> Result<Vec<(AccountId, StakePosition)>, StakingError> {
        let book = self.book(pool_id)?;
        let book = lock(&book);
        let stakers: Vec<_> = book
            .positions
            .iter()
            .filter(|(_, p)| p.is_active())
            .map(|(a, p)| (a.clone(), p.clone()))
            .collect();
        debug!(pool_id, count = stakers.len(), "listed stakers");
        Ok(stakers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::tests::terms;
    use crate::pool::PoolRegistry;
    use stakepool_token::MemoryTokenLedger;
    use stakepool_types::{TokenId, SECS_PER_DAY};

    const START: u64 = 1_000;

    struct Fixture {
        tokens: Arc<MemoryTokenLedger>,
        ledger: StakeLedger,
        pool: Pool,
    }

    fn fixture() -> Fixture {
        let tokens = Arc::new(MemoryTokenLedger::new());
        let ledger = StakeLedger::new(tokens.clone(), AccountId::new("escrow"));
        let mut reg = PoolRegistry::new();
        let id = reg.create(terms(START), Timestamp::new(0)).unwrap();
        ledger.open_book(id);
        let pool = reg.get(id).unwrap().clone();
        let stk = TokenId::new("STK");
        for name in ["alice", "bob"] {
            tokens.mint(&stk, &AccountId::new(name), 1_000_000).unwrap();
            tokens.approve(&stk, &AccountId::new(name), &AccountId::new("escrow"), 1_000_000);
        }
        let owner = AccountId::new("owner");
        tokens.mint(&stk, &owner, 10_000).unwrap();
        tokens.approve(&stk, &owner, &AccountId::new("escrow"), 10_000);
        ledger.fund_rewards(&owner, &stk, 10_000).unwrap();
        Fixture { tokens, ledger, pool }
    }

    fn at(secs: u64) -> Timestamp {
        Timestamp::new(secs)
    }

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn stake_moves_funds_and_records_position() {
        let f = fixture();
        let pos = f.ledger.stake(&f.pool, &alice(), 2_000, at(START)).unwrap();
        assert_eq!(pos.amount, 2_000);
        assert_eq!(pos.staked_at, at(START));
        assert_eq!(f.tokens.balance_of(&TokenId::new("STK"), &alice()), 998_000);
        assert_eq!(f.ledger.total_staked(0).unwrap(), 2_000);
    }

    #[test]
    fn top_up_accumulates_and_refreshes_staked_at() {
        let f = fixture();
        f.ledger.stake(&f.pool, &alice(), 500, at(START)).unwrap();
        let pos = f.ledger.stake(&f.pool, &alice(), 700, at(START + 50)).unwrap();
        assert_eq!(pos.amount, 1_200);
        assert_eq!(pos.staked_at, at(START + 50));
    }

    #[test]
    fn stake_below_minimum_is_rejected() {
        let f = fixture();
        let err = f.ledger.stake(&f.pool, &alice(), 99, at(START)).unwrap_err();
        assert_eq!(err, StakingError::BelowMinimum { amount: 99, minimum: 100 });
    }

    #[test]
    fn per_user_cap_counts_existing_position() {
        let f = fixture();
        f.ledger.stake(&f.pool, &alice(), 9_000, at(START)).unwrap();
        let err = f.ledger.stake(&f.pool, &alice(), 1_001, at(START)).unwrap_err();
        assert!(matches!(
            err,
            StakingError::AboveCap { scope: CapScope::PerUser, resulting: 10_001, limit: 10_000 }
        ));
        assert_eq!(f.ledger.position(0, &alice()).unwrap().amount, 9_000);
    }

    #[test]
    fn pool_cap_is_enforced_across_accounts() {
        let mut f = fixture();
        f.pool.terms.pool_cap = 3_000;
        f.ledger.stake(&f.pool, &alice(), 2_000, at(START)).unwrap();
        let err = f
            .ledger
            .stake(&f.pool, &AccountId::new("bob"), 1_500, at(START))
            .unwrap_err();
        assert!(matches!(err, StakingError::AboveCap { scope: CapScope::Pool, .. }));
    }

    #[test]
    fn failed_transfer_leaves_ledger_untouched() {
        let f = fixture();
        let carol = AccountId::new("carol");
        f.tokens.mint(&TokenId::new("STK"), &carol, 5_000).unwrap();
        let err = f.ledger.stake(&f.pool, &carol, 1_000, at(START)).unwrap_err();
        assert!(matches!(
            err,
            StakingError::TransferFailed(TransferError::InsufficientAllowance { .. })
        ));
        assert_eq!(f.ledger.position(0, &carol).unwrap(), StakePosition::default());
        assert_eq!(f.ledger.total_staked(0).unwrap(), 0);
    }

    #[test]
    fn unstake_returns_principal_and_clears_position() {
        let f = fixture();
        f.ledger.stake(&f.pool, &alice(), 2_000, at(START)).unwrap();
        let paid = f.ledger.unstake(&f.pool, &alice(), at(START + 1)).unwrap();
        assert_eq!(paid, 2_000);
        assert_eq!(f.tokens.balance_of(&TokenId::new("STK"), &alice()), 1_000_000);
        assert_eq!(f.ledger.position(0, &alice()).unwrap(), StakePosition::default());
        assert_eq!(f.ledger.total_staked(0).unwrap(), 0);
        assert!(matches!(
            f.ledger.unstake(&f.pool, &alice(), at(START + 2)),
            Err(StakingError::NoActiveStake { .. })
        ));
    }

    #[test]
    fn withdraw_before_redemption_fails() {
        let f = fixture();
        f.ledger.stake(&f.pool, &alice(), 2_000, at(START)).unwrap();
        let just_before = f.pool.redemption_time().as_secs() - 1;
        let err = f.ledger.withdraw(&f.pool, &alice(), at(just_before)).unwrap_err();
        assert_eq!(err.kind(), "RedemptionPeriodNotElapsed");
    }

    #[test]
    fn withdraw_pays_principal_and_reward_then_marks_withdrawn() {
        let f = fixture();
        f.ledger.stake(&f.pool, &alice(), 2_000, at(START)).unwrap();
        let when = at(START + 100 * SECS_PER_DAY);
        let payout = f.ledger.withdraw(&f.pool, &alice(), when).unwrap();
        assert_eq!(payout.principal, 2_000);
        assert_eq!(payout.reward, 2_000 * 20 * 90 / 365 / 100);
        assert_eq!(
            f.tokens.balance_of(&TokenId::new("STK"), &alice()),
            1_000_000 + payout.reward
        );
        assert_eq!(
            f.ledger.reward_reserve(&TokenId::new("STK")),
            10_000 - payout.reward
        );
        let pos = f.ledger.position(0, &alice()).unwrap();
        assert!(pos.withdrawn);
        assert_eq!(pos.amount, 0);
        assert!(matches!(
            f.ledger.withdraw(&f.pool, &alice(), when),
            Err(StakingError::NoActiveStake { .. })
        ));
    }

    #[test]
    fn escrow_balance_without_reserve_does_not_back_rewards() {
        let f = fixture();
        // escrow holds the fixture's funding, but this ledger has no reserve
        let unfunded = StakeLedger::new(f.tokens.clone(), AccountId::new("escrow"));
        unfunded.open_book(0);
        unfunded.stake(&f.pool, &alice(), 2_000, at(START)).unwrap();

        let err = unfunded
            .withdraw(&f.pool, &alice(), at(START + 100 * SECS_PER_DAY))
            .unwrap_err();
        assert!(matches!(
            err,
            StakingError::TransferFailed(TransferError::InsufficientEscrow { available: 0, .. })
        ));
        assert_eq!(f.tokens.balance_of(&TokenId::new("STK"), &alice()), 998_000);
        assert!(unfunded.position(0, &alice()).unwrap().is_active());
    }

    #[test]
    fn unknown_pool_has_no_book() {
        let f = fixture();
        assert_eq!(f.ledger.total_staked(9).unwrap_err(), StakingError::PoolNotFound(9));
    }
}
