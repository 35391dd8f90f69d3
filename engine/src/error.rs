//! Staking errors.
//!
//! Every variant is an expected outcome of validating one call against the
//! current state; none of them leave partial state behind.

use stakepool_token::TransferError;
use stakepool_types::{AccountId, PoolId, Timestamp};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakingError {
    #[error("invalid pool terms: {reason}")]
    InvalidPoolTerms { reason: String },

    #[error("account {0} is not authorized to administer pools")]
    Unauthorized(AccountId),

    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    /// Raised both for administratively closed pools and for pools outside
    /// their staking window.
    #[error("Pool closed: pool {0} is not accepting stakes")]
    PoolClosed(PoolId),

    #[error("stake of {amount} is below the pool minimum of {minimum}")]
    BelowMinimum { amount: u128, minimum: u128 },

    #[error("stake would raise the {scope} total to {resulting}, above the limit of {limit}")]
    AboveCap {
        scope: CapScope,
        resulting: u128,
        limit: u128,
    },

    #[error("account {account} has no active stake in pool {pool_id}")]
    NoActiveStake { pool_id: PoolId, account: AccountId },

    #[error("Cannot withdraw before redemption period: opens at {redeemable_at}, now {now}")]
    RedemptionPeriodNotElapsed {
        redeemable_at: Timestamp,
        now: Timestamp,
    },

    #[error("token transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    #[error("arithmetic overflow in staking computation")]
    Overflow,
}

/// Which limit a stake ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapScope {
    PerUser,
    Pool,
}

impl std::fmt::Display for CapScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerUser => f.write_str("per-user"),
            Self::Pool => f.write_str("pool"),
        }
    }
}

impl StakingError {
    /// Stable machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPoolTerms { .. } => "InvalidPoolTerms",
            Self::Unauthorized(_) => "Unauthorized",
            Self::PoolNotFound(_) => "PoolNotFound",
            Self::PoolClosed(_) => "PoolClosed",
            Self::BelowMinimum { .. } => "BelowMinimum",
            Self::AboveCap { .. } => "AboveCap",
            Self::NoActiveStake { .. } => "NoActiveStake",
            Self::RedemptionPeriodNotElapsed { .. } => "RedemptionPeriodNotElapsed",
            Self::TransferFailed(_) => "TransferFailed",
            Self::Overflow => "Overflow",
        }
    }

    pub(crate) fn invalid_terms(reason: impl Into<String>) -> Self {
        Self::InvalidPoolTerms {
            reason: reason.into(),
        }
    }
}
