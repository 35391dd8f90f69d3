//! Cliff reward computation.
//!
//! `reward = floor(amount × apr × duration_days / 365 / apr_denominator)`,
//! paid in full once the pool matures and zero before. The two floor
//! divisions collapse into one division by `365 × apr_denominator`.

use crate::error::StakingError;
use crate::pool::{Pool, PoolTerms};
use crate::position::StakePosition;
use stakepool_types::{Timestamp, DAYS_PER_YEAR};

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// `floor(a × b / c)` without a wide intermediate.
///
/// Common factors are cancelled first; if the reduced product still
/// overflows, `a` is split into quotient and remainder of `c`.
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    if a == 0 || b == 0 {
        return Some(0);
    }
    let g1 = gcd(a, c);
    let (a, c) = (a / g1, c / g1);
    let g2 = gcd(b, c);
    let (b, c) = (b / g2, c / g2);

    if let Some(product) = a.checked_mul(b) {
        return Some(product / c);
    }
    let (q, r) = (a / c, a % c);
    q.checked_mul(b)?.checked_add(r.checked_mul(b)? / c)
}

/// The full cliff reward for `amount` under `terms`, or `None` on overflow.
pub fn cliff_reward(amount: u128, terms: &PoolTerms) -> Option<u128> {
    let rate = (terms.apr as u128).checked_mul(terms.duration_days as u128)?;
    let denominator = (DAYS_PER_YEAR as u128).checked_mul(terms.apr_denominator as u128)?;
    mul_div_floor(amount, rate, denominator)
}

/// Reward claimable for `position` at `now`: zero before maturity, the fixed
/// cliff amount from maturity on. A reward left owed by a partial payout
/// stays claimable.
pub fn claimable_reward(
    position: &StakePosition,
    pool: &Pool,
    now: Timestamp,
) -> Result<u128, StakingError> {
    if position.awaits_reward() {
        return Ok(position.unpaid_reward);
    }
    if !position.is_active() || !pool.is_matured(now) {
        return Ok(0);
    }
    cliff_reward(position.amount, &pool.terms).ok_or(StakingError::Overflow)
}
