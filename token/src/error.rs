//! Token transfer errors.

use stakepool_types::{AccountId, TokenId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("insufficient {token} balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        token: TokenId,
        account: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("insufficient {token} allowance from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        token: TokenId,
        owner: AccountId,
        spender: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("insufficient {token} in escrow {escrow}: need {needed}, have {available}")]
    InsufficientEscrow {
        token: TokenId,
        escrow: AccountId,
        needed: u128,
        available: u128,
    },

    #[error("{token} balance of {account} would overflow")]
    Overflow { token: TokenId, account: AccountId },

    #[error("token ledger unavailable: {0}")]
    Unavailable(String),
}
