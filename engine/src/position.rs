//! Per-account stake positions.

use serde::{Deserialize, Serialize};
use stakepool_types::amount::decimal_string;
use stakepool_types::Timestamp;

/// An account's deposit into one pool.
///
/// The zero value stands for "no position"; a withdrawn position has its
/// amount zeroed and counts as empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    #[serde(with = "decimal_string")]
    pub amount: u128,
    /// Time of the most recent stake or top-up.
    pub staked_at: Timestamp,
    pub withdrawn: bool,
    /// Reward still owed after a withdrawal paid the principal but not the
    /// reward. The next withdrawal pays it and closes the position.
    #[serde(default, with = "decimal_string")]
    pub unpaid_reward: u128,
}

impl StakePosition {
    pub fn is_active(&self) -> bool {
        self.amount > 0 && !self.withdrawn
    }

    /// Principal already returned, reward outstanding.
    pub fn awaits_reward(&self) -> bool {
        !self.withdrawn && self.amount == 0 && self.unpaid_reward > 0
    }
}

/// What a successful withdrawal paid out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    #[serde(with = "decimal_string")]
    pub principal: u128,
    #[serde(with = "decimal_string")]
    pub reward: u128,
}

impl Payout {
    /// Principal plus reward. Cannot overflow for pools accepted at creation.
    pub fn total(&self) -> u128 {
        self.principal.saturating_add(self.reward)
    }
}
