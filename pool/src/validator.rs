use soroban_sdk::{panic_with_error, Env};

use crate::{
    constants::{RATE_MODE_STABLE, RATE_MODE_VARIABLE},
    errors::PoolError,
    storage,
};

/// Require that an incoming amount is not negative
///
/// ### Arguments
/// * `amount` - The amount to check
///
/// ### Panics
/// If the number is negative
pub fn require_nonnegative(e: &Env, amount: &i128) {
    if amount.is_negative() {
        panic_with_error!(e, PoolError::NegativeAmountError);
    }
}

/// Require that an incoming amount is strictly positive
///
/// ### Panics
/// If the number is negative or zero
pub fn require_positive(e: &Env, amount: &i128) {
    require_nonnegative(e, amount);
    if *amount == 0 {
        panic_with_error!(e, PoolError::InvalidAmount);
    }
}

/// Require that a rate mode names a debt type
pub fn require_debt_rate_mode(e: &Env, rate_mode: u32) {
    if rate_mode != RATE_MODE_STABLE && rate_mode != RATE_MODE_VARIABLE {
        panic_with_error!(e, PoolError::InvalidRateMode);
    }
}

/// Guard held for the duration of a state changing invocation. Entering while another
/// guard is held panics. A failed invocation reverts the lock with the rest of its writes.
pub struct NonReentrant;

impl NonReentrant {
    /// Acquire the pool lock
    ///
    /// ### Panics
    /// If the lock is already held
    pub fn enter(e: &Env) -> Self {
        if storage::is_locked(e) {
            panic_with_error!(e, PoolError::ReentrancyDetected);
        }
        storage::set_locked(e, true);
        NonReentrant
    }

    /// Release the pool lock
    pub fn exit(self, e: &Env) {
        storage::set_locked(e, false);
    }
}
