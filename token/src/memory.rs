//! In-process fungible token ledger.
//!
//! Mirrors the surface of a standard fungible token (mint, transfer,
//! transferFrom, approve/allowance, balanceOf) for any number of tokens.
//! Thread-safe: all state sits behind a single mutex so each call is atomic.

use crate::error::TransferError;
use crate::ledger::TokenLedger;
use stakepool_types::{AccountId, TokenId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Default)]
struct LedgerState {
    balances: HashMap<(TokenId, AccountId), u128>,
    allowances: HashMap<(TokenId, AccountId, AccountId), u128>,
    supply: HashMap<TokenId, u128>,
}

impl LedgerState {
    fn balance(&self, token: &TokenId, account: &AccountId) -> u128 {
        self.balances
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn allowance(&self, token: &TokenId, owner: &AccountId, spender: &AccountId) -> u128 {
        self.allowances
            .get(&(token.clone(), owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Check then apply a balance move; nothing changes on error.
    fn move_balance(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        let from_balance = self.balance(token, from);
        if from_balance < amount {
            return Err(TransferError::InsufficientBalance {
                token: token.clone(),
                account: from.clone(),
                needed: amount,
                available: from_balance,
            });
        }
        if from == to {
            return Ok(());
        }
        let to_balance = self
            .balance(token, to)
            .checked_add(amount)
            .ok_or_else(|| TransferError::Overflow {
                token: token.clone(),
                account: to.clone(),
            })?;
        self.balances
            .insert((token.clone(), from.clone()), from_balance - amount);
        self.balances.insert((token.clone(), to.clone()), to_balance);
        Ok(())
    }
}

/// A thread-safe in-memory token ledger.
#[derive(Default)]
pub struct MemoryTokenLedger {
    state: Mutex<LedgerState>,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `amount` new units of `token` in `to`'s balance.
    pub fn mint(&self, token: &TokenId, to: &AccountId, amount: u128) -> Result<(), TransferError> {
        let mut state = self.state();
        let overflow = || TransferError::Overflow {
            token: token.clone(),
            account: to.clone(),
        };
        let supply = state
            .supply
            .get(token)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        let balance = state
            .balance(token, to)
            .checked_add(amount)
            .ok_or_else(overflow)?;
        state.supply.insert(token.clone(), supply);
        state.balances.insert((token.clone(), to.clone()), balance);
        debug!(%token, account = %to, amount, "minted");
        Ok(())
    }

    /// Set the amount `spender` may pull from `owner` (replaces any previous value).
    pub fn approve(&self, token: &TokenId, owner: &AccountId, spender: &AccountId, amount: u128) {
        self.state()
            .allowances
            .insert((token.clone(), owner.clone(), spender.clone()), amount);
    }

    pub fn allowance(&self, token: &TokenId, owner: &AccountId, spender: &AccountId) -> u128 {
        self.state().allowance(token, owner, spender)
    }

    pub fn total_supply(&self, token: &TokenId) -> u128 {
        self.state().supply.get(token).copied().unwrap_or(0)
    }

    /// Move `amount` from `from` to `to` on `from`'s own authority.
    pub fn transfer(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.state().move_balance(token, from, to, amount)
    }

    /// Move `amount` from `from` to `to` on `spender`'s authority, consuming allowance.
    pub fn transfer_from(
        &self,
        token: &TokenId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        let mut state = self.state();
        let allowance = state.allowance(token, from, spender);
        if allowance < amount {
            return Err(TransferError::InsufficientAllowance {
                token: token.clone(),
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount,
                available: allowance,
            });
        }
        state.move_balance(token, from, to, amount)?;
        state.allowances.insert(
            (token.clone(), from.clone(), spender.clone()),
            allowance - amount,
        );
        Ok(())
    }
}

impl TokenLedger for MemoryTokenLedger {
    fn transfer_in(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.transfer_from(token, to, from, to, amount)
    }

    fn transfer_out(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.transfer(token, from, to, amount).map_err(|e| match e {
            TransferError::InsufficientBalance {
                token,
                account,
                needed,
                available,
            } => TransferError::InsufficientEscrow {
                token,
                escrow: account,
                needed,
                available,
            },
            other => other,
        })
    }

    fn balance_of(&self, token: &TokenId, account: &AccountId) -> u128 {
        self.state().balance(token, account)
    }
}
