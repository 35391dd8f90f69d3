//! Staking-pool accounting engine.
//!
//! Pools accept deposits of a stake token during a fixed window. After the
//! lock duration a binary (cliff) reward matures; after a further redemption
//! buffer the staker can withdraw principal plus reward. Accounts whose
//! stake meets a pool's threshold form that pool's whitelist.
//!
//! This crate handles:
//! - Pool creation, closing and listing (admin-gated)
//! - Stake, unstake and withdraw against an external token ledger
//! - Whitelist derivation from the current stake
//! - Cliff reward computation in overflow-safe integer arithmetic

pub mod access;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod pool;
pub mod position;
pub mod reward;
pub mod whitelist;

pub use access::AccessControl;
pub use engine::StakingEngine;
pub use error::{CapScope, StakingError};
pub use ledger::StakeLedger;
pub use pool::{Pool, PoolRegistry, PoolTerms};
pub use position::{Payout, StakePosition};
pub use reward::claimable_reward;
pub use whitelist::is_whitelisted;
