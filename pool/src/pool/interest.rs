use cast::i128;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{panic_with_error, Env};

use crate::{
    constants::{PERCENTAGE_FACTOR, RAY, SECONDS_PER_YEAR},
    errors::PoolError,
    math::{percent_mul, ray_div, ray_mul, weighted_add_div},
    storage::RateStrategy,
};

/// Calculate the interest accumulated with a linear model since `last_time`
///
/// ### Arguments
/// * `rate` - The annual interest rate (ray)
/// * `last_time` - The timestamp interest was last accumulated
///
/// ### Returns
/// The cumulated interest factor (ray), 1 RAY if no time has passed
pub fn calc_linear_interest(e: &Env, rate: i128, last_time: u64) -> i128 {
    let delta = i128(e.ledger().timestamp() - last_time);
    let accrued = rate
        .fixed_mul_floor(delta, SECONDS_PER_YEAR)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::OverflowError));
    RAY + accrued
}

/// Calculate the interest accumulated with a compounding model since `last_time`
///
/// The compounding is approximated with the first three terms of the binomial expansion
/// of `(1 + rate / SECONDS_PER_YEAR) ^ delta`, which underestimates the exact value.
///
/// ### Arguments
/// * `rate` - The annual interest rate (ray)
/// * `last_time` - The timestamp interest was last accumulated
///
/// ### Returns
/// The cumulated interest factor (ray), 1 RAY if no time has passed
pub fn calc_compounded_interest(e: &Env, rate: i128, last_time: u64) -> i128 {
    let exp = i128(e.ledger().timestamp() - last_time);
    if exp == 0 {
        return RAY;
    }
    let exp_minus_one = exp - 1;
    let exp_minus_two = if exp > 2 { exp - 2 } else { 0 };

    let rate_per_second = rate / SECONDS_PER_YEAR;
    let base_power_two = ray_mul(e, rate_per_second, rate_per_second);
    let base_power_three = ray_mul(e, base_power_two, rate_per_second);

    let second_term = exp * exp_minus_one * base_power_two / 2;
    let third_term = exp * exp_minus_one * exp_minus_two * base_power_three / 6;

    RAY + rate_per_second * exp + second_term + third_term
}

/// Calculate the utilization of a reserve
///
/// ### Returns
/// The share of the reserve's liquidity that is borrowed (ray), 0 if nothing is borrowed
pub fn calc_utilization(e: &Env, available_liquidity: i128, total_debt: i128) -> i128 {
    if total_debt == 0 {
        return 0;
    }
    ray_div(e, total_debt, available_liquidity + total_debt)
}

/// The largest variable rate the strategy can produce (ray)
pub fn max_variable_rate(strategy: &RateStrategy) -> i128 {
    strategy.base_rate + strategy.var_slope_1 + strategy.var_slope_2
}

/// Calculate the interest rates of a reserve from its liquidity and debt
///
/// ### Arguments
/// * `strategy` - The rate strategy of the reserve
/// * `market_rate` - The market reference stable borrow rate (ray)
/// * `available_liquidity` - The underlying available to borrow
/// * `total_stable_debt` - The total stable debt of the reserve
/// * `total_var_debt` - The total variable debt of the reserve
/// * `avg_stable_rate` - The weighted average rate of the stable debt (ray)
/// * `reserve_factor` - The share of interest sent to the treasury (bps)
///
/// ### Returns
/// * (i128, i128, i128) - (liquidity rate, stable borrow rate, variable borrow rate), all rays
#[allow(clippy::too_many_arguments)]
pub fn calc_interest_rates(
    e: &Env,
    strategy: &RateStrategy,
    market_rate: i128,
    available_liquidity: i128,
    total_stable_debt: i128,
    total_var_debt: i128,
    avg_stable_rate: i128,
    reserve_factor: u32,
) -> (i128, i128, i128) {
    let total_debt = total_stable_debt + total_var_debt;
    let util = calc_utilization(e, available_liquidity, total_debt);

    let (stable_premium, var_rate) = if util > strategy.optimal_util {
        rates_above_optimal(e, strategy, util)
    } else {
        rates_below_optimal(e, strategy, util)
    };
    let stable_rate = market_rate + stable_premium;

    let liquidity_rate = if total_debt == 0 {
        0
    } else {
        let overall_borrow_rate = weighted_add_div(
            e,
            total_var_debt,
            var_rate,
            total_stable_debt,
            avg_stable_rate,
            total_debt,
        );
        percent_mul(
            e,
            ray_mul(e, overall_borrow_rate, util),
            PERCENTAGE_FACTOR - i128(reserve_factor),
        )
    };

    (liquidity_rate, stable_rate, var_rate)
}

/// The stable premium over the market rate and the variable rate on the first slope
fn rates_below_optimal(e: &Env, strategy: &RateStrategy, util: i128) -> (i128, i128) {
    let stable_premium = ray_mul(
        e,
        strategy.stable_slope_1,
        ray_div(e, util, strategy.optimal_util),
    );
    let var_rate = strategy.base_rate
        + ray_div(
            e,
            ray_mul(e, util, strategy.var_slope_1),
            strategy.optimal_util,
        );
    (stable_premium, var_rate)
}

/// The stable premium over the market rate and the variable rate on the second slope
fn rates_above_optimal(e: &Env, strategy: &RateStrategy, util: i128) -> (i128, i128) {
    let excess_util = ray_div(e, util - strategy.optimal_util, RAY - strategy.optimal_util);
    let stable_premium =
        strategy.stable_slope_1 + ray_mul(e, strategy.stable_slope_2, excess_util);
    let var_rate =
        strategy.base_rate + strategy.var_slope_1 + ray_mul(e, strategy.var_slope_2, excess_util);
    (stable_premium, var_rate)
}
