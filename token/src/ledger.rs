//! The token ledger contract consumed by the staking engine.

use crate::error::TransferError;
use stakepool_types::{AccountId, TokenId};

/// Moves staked principal into escrow and pays principal and rewards out.
///
/// Implementations must apply each call atomically: a failed call leaves
/// every balance and allowance unchanged.
pub trait TokenLedger: Send + Sync {
    /// Pull `amount` of `token` from `from` into `to` (the escrow), spending
    /// the allowance `from` granted to `to`.
    fn transfer_in(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError>;

    /// Pay `amount` of `token` out of the escrow `from` to `to`.
    fn transfer_out(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError>;

    fn balance_of(&self, token: &TokenId, account: &AccountId) -> u128;
}
