use soroban_sdk::{panic_with_error, Env, I256};

use crate::{
    constants::{PERCENTAGE_FACTOR, RAY, WAD},
    errors::PoolError,
};

/// Compute `(a * b + c / 2) / c` with a 256 bit intermediate
///
/// ### Panics
/// If `c` is zero or the result does not fit in an i128
pub fn mul_div_half_up(e: &Env, a: i128, b: i128, c: i128) -> i128 {
    if c == 0 {
        panic_with_error!(e, PoolError::DivisionByZero);
    }
    let product = I256::from_i128(e, a).mul(&I256::from_i128(e, b));
    let result = product
        .add(&I256::from_i128(e, c / 2))
        .div(&I256::from_i128(e, c));
    to_i128(e, &result)
}

/// Compute `(a1 * b1 + a2 * b2 + d / 2) / d` with 256 bit intermediates
///
/// Used to re-weight an average rate when a new position is added.
pub fn weighted_add_div(e: &Env, a1: i128, b1: i128, a2: i128, b2: i128, d: i128) -> i128 {
    if d == 0 {
        panic_with_error!(e, PoolError::DivisionByZero);
    }
    let sum = I256::from_i128(e, a1)
        .mul(&I256::from_i128(e, b1))
        .add(&I256::from_i128(e, a2).mul(&I256::from_i128(e, b2)));
    let result = sum
        .add(&I256::from_i128(e, d / 2))
        .div(&I256::from_i128(e, d));
    to_i128(e, &result)
}

/// Compute `(a1 * b1 - a2 * b2 + d / 2) / d` with 256 bit intermediates, or None
/// if `a2 * b2` is not smaller than `a1 * b1`
///
/// Used to re-weight an average rate when a position is removed.
pub fn weighted_sub_div(
    e: &Env,
    a1: i128,
    b1: i128,
    a2: i128,
    b2: i128,
    d: i128,
) -> Option<i128> {
    if d == 0 {
        panic_with_error!(e, PoolError::DivisionByZero);
    }
    let first = I256::from_i128(e, a1).mul(&I256::from_i128(e, b1));
    let second = I256::from_i128(e, a2).mul(&I256::from_i128(e, b2));
    if second >= first {
        return None;
    }
    let result = first
        .sub(&second)
        .add(&I256::from_i128(e, d / 2))
        .div(&I256::from_i128(e, d));
    Some(to_i128(e, &result))
}

fn to_i128(e: &Env, value: &I256) -> i128 {
    value
        .to_i128()
        .unwrap_or_else(|| panic_with_error!(e, PoolError::OverflowError))
}

/// Multiply two rays, rounding half up
pub fn ray_mul(e: &Env, a: i128, b: i128) -> i128 {
    mul_div_half_up(e, a, b, RAY)
}

/// Divide two rays, rounding half up
pub fn ray_div(e: &Env, a: i128, b: i128) -> i128 {
    mul_div_half_up(e, a, RAY, b)
}

/// Multiply two wads, rounding half up
pub fn wad_mul(e: &Env, a: i128, b: i128) -> i128 {
    mul_div_half_up(e, a, b, WAD)
}

/// Divide two wads, rounding half up
pub fn wad_div(e: &Env, a: i128, b: i128) -> i128 {
    mul_div_half_up(e, a, WAD, b)
}

/// Apply a percentage expressed in basis points, rounding half up
pub fn percent_mul(e: &Env, value: i128, percentage: i128) -> i128 {
    mul_div_half_up(e, value, percentage, PERCENTAGE_FACTOR)
}

/// Divide by a percentage expressed in basis points, rounding half up
pub fn percent_div(e: &Env, value: i128, percentage: i128) -> i128 {
    mul_div_half_up(e, value, PERCENTAGE_FACTOR, percentage)
}
