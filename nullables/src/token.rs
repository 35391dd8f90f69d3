//! Nullable token ledger: an in-memory ledger with call recording and
//! failure injection.

use stakepool_token::{MemoryTokenLedger, TokenLedger, TransferError};
use stakepool_types::{AccountId, TokenId};
use std::sync::Mutex;

/// One recorded call through the [`TokenLedger`] trait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferCall {
    In {
        token: TokenId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    },
    Out {
        token: TokenId,
        from: AccountId,
        to: AccountId,
        amount: u128,
    },
}

#[derive(Default)]
struct Faults {
    /// Number of further `transfer_out` calls to let through before failing one.
    out_countdown: Option<usize>,
    next_in: Option<TransferError>,
}

/// Wraps a [`MemoryTokenLedger`]; setup (mint, approve) goes through
/// [`NullTokenLedger::inner`], engine traffic goes through the trait and is
/// recorded.
#[derive(Default)]
pub struct NullTokenLedger {
    inner: MemoryTokenLedger,
    calls: Mutex<Vec<TransferCall>>,
    faults: Mutex<Faults>,
}

impl NullTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryTokenLedger {
        &self.inner
    }

    /// Mint and approve `spender` for the same amount in one step.
    pub fn fund(&self, token: &TokenId, account: &AccountId, spender: &AccountId, amount: u128) {
        self.inner
            .mint(token, account, amount)
            .expect("nullable mint overflowed");
        let allowance = self.inner.allowance(token, account, spender);
        self.inner
            .approve(token, account, spender, allowance.saturating_add(amount));
    }

    /// Let `skip` more `transfer_out` calls succeed, then fail the next one.
    pub fn fail_transfer_out_after(&self, skip: usize) {
        self.faults.lock().unwrap().out_countdown = Some(skip);
    }

    /// Fail the next `transfer_in` with `error`.
    pub fn fail_next_transfer_in(&self, error: TransferError) {
        self.faults.lock().unwrap().next_in = Some(error);
    }

    /// Every call made through the trait, in order (failed ones included).
    pub fn calls(&self) -> Vec<TransferCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl TokenLedger for NullTokenLedger {
    fn transfer_in(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.calls.lock().unwrap().push(TransferCall::In {
            token: token.clone(),
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        if let Some(err) = self.faults.lock().unwrap().next_in.take() {
            return Err(err);
        }
        self.inner.transfer_in(token, from, to, amount)
    }

    fn transfer_out(
        &self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.calls.lock().unwrap().push(TransferCall::Out {
            token: token.clone(),
            from: from.clone(),
            to: to.clone(),
            amount,
        });
        {
            let mut faults = self.faults.lock().unwrap();
            match faults.out_countdown {
                Some(0) => {
                    faults.out_countdown = None;
                    return Err(TransferError::Unavailable("injected transfer_out failure".into()));
                }
                Some(n) => faults.out_countdown = Some(n - 1),
                None => {}
            }
        }
        self.inner.transfer_out(token, from, to, amount)
    }

    fn balance_of(&self, token: &TokenId, account: &AccountId) -> u128 {
        self.inner.balance_of(token, account)
    }
}
