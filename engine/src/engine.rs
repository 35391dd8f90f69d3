//! The staking engine, the single entry point callers use.
//!
//! Wires the injected clock and token ledger to the pool registry, the stake
//! ledger and the admin set. Shared behind `Arc`; every method takes `&self`.

use crate::access::AccessControl;
use crate::error::StakingError;
use crate::ledger::StakeLedger;
use crate::pool::{Pool, PoolRegistry, PoolTerms};
use crate::position::{Payout, StakePosition};
use crate::reward::claimable_reward;
use crate::whitelist;
use stakepool_token::TokenLedger;
use stakepool_types::{AccountId, Clock, PoolId, Timestamp, TokenId};
use stakepool_utils::format_days;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub struct StakingEngine {
    clock: Arc<dyn Clock>,
    access: RwLock<AccessControl>,
    registry: RwLock<PoolRegistry>,
    stakes: StakeLedger,
}

impl StakingEngine {
    /// Create an engine holding funds in `escrow`, with `admin` as the only
    /// pool admin.
    pub fn new(
        clock: Arc<dyn Clock>,
        tokens: Arc<dyn TokenLedger>,
        escrow: AccountId,
        admin: AccountId,
    ) -> Self {
        Self::with_access(clock, tokens, escrow, AccessControl::new(admin))
    }

    pub fn with_access(
        clock: Arc<dyn Clock>,
        tokens: Arc<dyn TokenLedger>,
        escrow: AccountId,
        access: AccessControl,
    ) -> Self {
        Self {
            stakes: StakeLedger::new(tokens, escrow),
            clock,
            access: RwLock::new(access),
            registry: RwLock::new(PoolRegistry::new()),
        }
    }

    /// Current time as seen by the engine.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// The account holding staked principal and reward funds.
    pub fn escrow(&self) -> &AccountId {
        self.stakes.escrow()
    }

    // ── Administration ──────────────────────────────────────────────────

    pub fn is_admin(&self, account: &AccountId) -> bool {
        read(&self.access).is_admin(account)
    }

    pub fn admins(&self) -> Vec<AccountId> {
        read(&self.access).admins().cloned().collect()
    }

    pub fn grant_admin(&self, caller: &AccountId, account: AccountId) -> Result<bool, StakingError> {
        let granted = write(&self.access).grant(caller, account.clone())?;
        if granted {
            info!(%caller, %account, "admin granted");
        }
        Ok(granted)
    }

    pub fn revoke_admin(&self, caller: &AccountId, account: &AccountId) -> Result<bool, StakingError> {
        let revoked = write(&self.access).revoke(caller, account)?;
        if revoked {
            info!(%caller, %account, "admin revoked");
        }
        Ok(revoked)
    }

    /// Pull `amount` of `token` from the admin `caller` into escrow and add it
    /// to the reward reserve. Only reserved funds pay rewards.
    pub fn fund_rewards(
        &self,
        caller: &AccountId,
        token: &TokenId,
        amount: u128,
    ) -> Result<(), StakingError> {
        read(&self.access).ensure_admin(caller)?;
        let reserve = self.stakes.fund_rewards(caller, token, amount)?;
        info!(%caller, %token, amount, reserve, "reward reserve funded");
        Ok(())
    }

    /// Funded, not yet paid reward of `token`.
    pub fn reward_reserve(&self, token: &TokenId) -> u128 {
        self.stakes.reward_reserve(token)
    }

    // ── Pool lifecycle ──────────────────────────────────────────────────

    pub fn create_pool(&self, caller: &AccountId, terms: PoolTerms) -> Result<PoolId, StakingError> {
        read(&self.access).ensure_admin(caller)?;
        let now = self.now();
        let lock = format_days(terms.duration_days, terms.redemption_buffer_days);
        let mut registry = write(&self.registry);
        let id = registry.create(terms, now)?;
        self.stakes.open_book(id);
        drop(registry);
        info!(pool_id = id, %caller, lock = %lock, "pool created");
        Ok(id)
    }

    /// Deactivate a pool. Closing an already closed pool succeeds and changes nothing.
    pub fn close_pool(&self, caller: &AccountId, pool_id: PoolId) -> Result<(), StakingError> {
        read(&self.access).ensure_admin(caller)?;
        let now = self.now();
        if write(&self.registry).close(pool_id, now)? {
            info!(pool_id, %caller, "pool closed");
        }
        Ok(())
    }

    pub fn get_pool(&self, pool_id: PoolId) -> Result<Pool, StakingError> {
        read(&self.registry).get(pool_id).cloned()
    }

    pub fn list_pools(&self) -> Vec<Pool> {
        read(&self.registry).list().to_vec()
    }

    pub fn list_active_pools(&self) -> Vec<Pool> {
        read(&self.registry).list_active().cloned().collect()
    }

    // ── Staking ─────────────────────────────────────────────────────────

    pub fn stake(
        &self,
        pool_id: PoolId,
        account: &AccountId,
        amount: u128,
    ) -> Result<StakePosition, StakingError> {
        let pool = self.get_pool(pool_id)?;
        self.stakes.stake(&pool, account, amount, self.now())
    }

    /// Return the principal and forfeit the reward. Returns the amount paid.
    pub fn unstake(&self, pool_id: PoolId, account: &AccountId) -> Result<u128, StakingError> {
        let pool = self.get_pool(pool_id)?;
        self.stakes.unstake(&pool, account, self.now())
    }

    /// Pay principal plus reward after the redemption period. Returns the split.
    pub fn withdraw(&self, pool_id: PoolId, account: &AccountId) -> Result<Payout, StakingError> {
        let pool = self.get_pool(pool_id)?;
        self.stakes.withdraw(&pool, account, self.now())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn get_stake_info(
        &self,
        pool_id: PoolId,
        account: &AccountId,
    ) -> Result<StakePosition, StakingError> {
        self.stakes.position(pool_id, account)
    }

    pub fn get_reward_claimable(
        &self,
        pool_id: PoolId,
        account: &AccountId,
    ) -> Result<u128, StakingError> {
        let pool = self.get_pool(pool_id)?;
        let position = self.stakes.position(pool_id, account)?;
        claimable_reward(&position, &pool, self.now())
    }

    pub fn is_whitelisted(&self, pool_id: PoolId, account: &AccountId) -> Result<bool, StakingError> {
        let pool = self.get_pool(pool_id)?;
        let position = self.stakes.position(pool_id, account)?;
        Ok(whitelist::is_whitelisted(&position, &pool))
    }

    /// Accounts currently in the pool's whitelist, sorted.
    pub fn whitelist(&self, pool_id: PoolId) -> Result<Vec<AccountId>, StakingError> {
        let pool = self.get_pool(pool_id)?;
        Ok(self
            .stakes
            .stakers(pool_id)?
            .into_iter()
            .filter(|(_, p)| whitelist::is_whitelisted(p, &pool))
            .map(|(a, _)| a)
            .collect())
    }

    /// Accounts holding a live position in the pool, sorted.
    pub fn stakers(&self, pool_id: PoolId) -> Result<Vec<(AccountId, StakePosition)>, StakingError> {
        self.stakes.stakers(pool_id)
    }

    pub fn total_staked(&self, pool_id: PoolId) -> Result<u128, StakingError> {
        self.stakes.total_staked(pool_id)
    }
}
