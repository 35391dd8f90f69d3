//! Pool definitions and the registry that owns their lifecycle.

use crate::error::StakingError;
use crate::reward;
use serde::{Deserialize, Serialize};
use stakepool_types::amount::decimal_string;
use stakepool_types::{PoolId, Timestamp, TokenId, SECS_PER_DAY};

/// The immutable terms of a staking pool, supplied at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolTerms {
    /// Staking opens at this time.
    pub start_time: Timestamp,
    pub stake_token: TokenId,
    pub reward_token: TokenId,
    #[serde(with = "decimal_string")]
    pub min_stake_amount: u128,
    #[serde(with = "decimal_string")]
    pub max_stake_amount_per_user: u128,
    #[serde(with = "decimal_string")]
    pub pool_cap: u128,
    /// Lock length; the reward matures `duration_days` after `start_time`.
    pub duration_days: u64,
    /// Extra wait after maturity before principal and reward can be withdrawn.
    #[serde(default)]
    pub redemption_buffer_days: u64,
    /// Yearly rate numerator.
    pub apr: u64,
    pub apr_denominator: u64,
    #[serde(with = "decimal_string")]
    pub whitelist_threshold: u128,
}

impl PoolTerms {
    /// Check the terms against each other and against the current time.
    pub fn validate(&self, now: Timestamp) -> Result<(), StakingError> {
        for token in [&self.stake_token, &self.reward_token] {
            TokenId::parse(token.as_str())
                .map_err(|e| StakingError::invalid_terms(e.to_string()))?;
        }
        if self.min_stake_amount > self.max_stake_amount_per_user {
            return Err(StakingError::invalid_terms(format!(
                "min stake {} exceeds max stake per user {}",
                self.min_stake_amount, self.max_stake_amount_per_user
            )));
        }
        if self.max_stake_amount_per_user > self.pool_cap {
            return Err(StakingError::invalid_terms(format!(
                "max stake per user {} exceeds pool cap {}",
                self.max_stake_amount_per_user, self.pool_cap
            )));
        }
        if self.duration_days == 0 {
            return Err(StakingError::invalid_terms("duration must be at least one day"));
        }
        if self.apr_denominator == 0 {
            return Err(StakingError::invalid_terms("apr denominator must be non-zero"));
        }
        if self.start_time < now {
            return Err(StakingError::invalid_terms(format!(
                "start time {} is before current time {}",
                self.start_time, now
            )));
        }
        let redemption_secs = self
            .duration_days
            .checked_add(self.redemption_buffer_days)
            .and_then(|days| days.checked_mul(SECS_PER_DAY))
            .and_then(|secs| self.start_time.as_secs().checked_add(secs));
        if redemption_secs.is_none() {
            return Err(StakingError::invalid_terms("redemption time overflows"));
        }
        // A full pool must pay out without overflow so later reward reads cannot fail.
        reward::cliff_reward(self.pool_cap, self)
            .and_then(|r| r.checked_add(self.pool_cap))
            .ok_or_else(|| StakingError::invalid_terms("reward on a full pool overflows"))?;
        Ok(())
    }
}

/// A pool as held by the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub id: PoolId,
    #[serde(flatten)]
    pub terms: PoolTerms,
    /// Administrative flag; true at creation, false forever after a close.
    pub is_active: bool,
    pub created_at: Timestamp,
    /// When the pool was first closed.
    pub closed_at: Option<Timestamp>,
}

impl Pool {
    /// Staking window end, and the moment the reward matures.
    pub fn end_time(&self) -> Timestamp {
        self.terms.start_time.plus_days(self.terms.duration_days)
    }

    /// Earliest time a withdrawal is accepted.
    pub fn redemption_time(&self) -> Timestamp {
        self.end_time().plus_days(self.terms.redemption_buffer_days)
    }

    pub fn is_open_for_staking(&self, now: Timestamp) -> bool {
        self.is_active && now >= self.terms.start_time && now < self.end_time()
    }

    pub fn is_matured(&self, now: Timestamp) -> bool {
        now >= self.end_time()
    }

    pub fn is_redeemable(&self, now: Timestamp) -> bool {
        now >= self.redemption_time()
    }
}

/// Owns every pool, in creation order. Pool ids are indexes into that order.
#[derive(Clone, Debug, Default)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `terms` and register a new active pool under the next id.
    pub fn create(&mut self, terms: PoolTerms, now: Timestamp) -> Result<PoolId, StakingError> {
        terms.validate(now)?;
        let id = self.pools.len() as PoolId;
        self.pools.push(Pool {
            id,
            terms,
            is_active: true,
            created_at: now,
            closed_at: None,
        });
        Ok(id)
    }

    /// Deactivate a pool. Returns whether this call changed anything;
    /// closing a closed pool is a no-op.
    pub fn close(&mut self, id: PoolId, now: Timestamp) -> Result<bool, StakingError> {
        let pool = self.get_mut(id)?;
        if !pool.is_active {
            return Ok(false);
        }
        pool.is_active = false;
        pool.closed_at = Some(now);
        Ok(true)
    }

    pub fn get(&self, id: PoolId) -> Result<&Pool, StakingError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.pools.get(idx))
            .ok_or(StakingError::PoolNotFound(id))
    }

    fn get_mut(&mut self, id: PoolId) -> Result<&mut Pool, StakingError> {
        usize::try_from(id)
            .ok()
            .and_then(|idx| self.pools.get_mut(idx))
            .ok_or(StakingError::PoolNotFound(id))
    }

    /// All pools in creation order.
    pub fn list(&self) -> &[Pool] {
        &self.pools
    }

    /// Pools whose administrative flag is set, regardless of their time window.
    pub fn list_active(&self) -> impl Iterator<Item = &Pool> {
        self.pools.iter().filter(|p| p.is_active)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
