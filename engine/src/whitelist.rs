//! Whitelist membership, derived from the current stake.
//!
//! Nothing is stored: membership is re-evaluated against the live amount on
//! every read, so a position driven to zero is never whitelisted.

use crate::pool::Pool;
use crate::position::StakePosition;

pub fn is_whitelisted(position: &StakePosition, pool: &Pool) -> bool {
    position.is_active() && position.amount >= pool.terms.whitelist_threshold
}
