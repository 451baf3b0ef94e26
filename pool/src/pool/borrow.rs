use sep_41_token::TokenClient;
use soroban_sdk::{panic_with_error, Address, Env};

use crate::{
    constants::{
        HEALTH_FACTOR_LIQUIDATION_THRESHOLD, MAX_AMOUNT, MAX_STABLE_RATE_BORROW_SIZE_PERCENT,
        RATE_MODE_STABLE, REBALANCE_DOWN_RATE_DELTA, REBALANCE_UP_LIQUIDITY_RATE_THRESHOLD,
        REBALANCE_UP_USAGE_RATIO_THRESHOLD,
    },
    errors::PoolError,
    math::{percent_div, percent_mul},
    storage::{self, AllowanceKey},
    validator::{require_debt_rate_mode, require_nonnegative, require_positive},
};

use super::{
    health_factor::{to_base, PositionData},
    interest::max_variable_rate,
    pool::Pool,
    reserve::Reserve,
    status::Action,
    user::User,
};

/// Borrow `amount` of `asset` against the collateral of `on_behalf_of` and send it to `from`.
/// Borrowing on behalf of another user consumes the allowance they delegated to `from`.
///
/// ### Panics
/// If the borrow is not allowed or the collateral of `on_behalf_of` cannot support it
pub fn execute_borrow(
    e: &Env,
    from: &Address,
    asset: &Address,
    amount: i128,
    rate_mode: u32,
    on_behalf_of: &Address,
) {
    require_positive(e, &amount);
    require_debt_rate_mode(e, rate_mode);

    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::Borrow);

    if from != on_behalf_of {
        spend_allowance(e, on_behalf_of, from, asset, rate_mode, amount);
    }

    let mut user = User::load(e, on_behalf_of);
    validate_borrow(e, &mut pool, &reserve, &user, amount, rate_mode);
    open_debt(e, &mut user, &mut reserve, amount, rate_mode);
    reserve.data.available_liquidity -= amount;

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
    user.store(e);

    TokenClient::new(e, asset).transfer(&e.current_contract_address(), from, &amount);
}

/// Repay `amount` of the `rate_mode` debt `on_behalf_of` holds in `asset`, paid by `from`.
/// An amount of `MAX_AMOUNT` repays the full debt.
///
/// Returns the amount repaid
///
/// ### Panics
/// If `on_behalf_of` holds no debt of the selected type, or `MAX_AMOUNT` is used to repay
/// on behalf of another user
pub fn execute_repay(
    e: &Env,
    from: &Address,
    asset: &Address,
    amount: i128,
    rate_mode: u32,
    on_behalf_of: &Address,
) -> i128 {
    require_positive(e, &amount);
    require_debt_rate_mode(e, rate_mode);

    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::Repay);

    let mut user = User::load(e, on_behalf_of);
    let debt = if rate_mode == RATE_MODE_STABLE {
        user.stable_debt(e, &reserve)
    } else {
        user.var_debt(e, &reserve)
    };
    if debt == 0 {
        panic_with_error!(e, PoolError::NoDebtOfSelectedType);
    }
    if amount == MAX_AMOUNT && from != on_behalf_of {
        panic_with_error!(e, PoolError::NoExplicitAmountToRepayOnBehalf);
    }

    let payback = amount.min(debt);
    close_debt(e, &mut user, &mut reserve, payback, rate_mode);
    reserve.data.available_liquidity += payback;

    TokenClient::new(e, asset).transfer(from, &e.current_contract_address(), &payback);

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
    user.store(e);
    payback
}

/// Move the full debt `from` holds in `asset` out of `rate_mode` and into the other debt type
///
/// ### Panics
/// If `from` holds no debt of `rate_mode`, or a swap to stable debt is not allowed
pub fn execute_swap_borrow_rate_mode(e: &Env, from: &Address, asset: &Address, rate_mode: u32) {
    require_debt_rate_mode(e, rate_mode);

    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::SwapRateMode);

    let mut user = User::load(e, from);
    let stable_debt = user.stable_debt(e, &reserve);
    let var_debt = user.var_debt(e, &reserve);
    if rate_mode == RATE_MODE_STABLE {
        if stable_debt == 0 {
            panic_with_error!(e, PoolError::NoDebtOfSelectedType);
        }
        user.remove_stable_debt(e, &mut reserve, stable_debt);
        user.add_var_debt(e, &mut reserve, stable_debt);
    } else {
        if var_debt == 0 {
            panic_with_error!(e, PoolError::NoDebtOfSelectedType);
        }
        require_stable_borrow_allowed(e, &reserve, &user, var_debt, stable_debt + var_debt);
        let stable_rate = reserve.data.stable_borrow_rate;
        user.remove_var_debt(e, &mut reserve, var_debt);
        user.add_stable_debt(e, &mut reserve, var_debt, stable_rate);
    }

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
    user.store(e);
}

/// Reset the stable rate of `user`'s debt in `asset` to the reserve's current stable rate
///
/// ### Panics
/// If the user holds no stable debt, or neither rebalance condition is met
pub fn execute_rebalance(e: &Env, asset: &Address, user: &Address) {
    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::Rebalance);

    let mut user = User::load(e, user);
    let stable_debt = user.stable_debt(e, &reserve);
    if stable_debt == 0 {
        panic_with_error!(e, PoolError::NoDebtOfSelectedType);
    }

    let user_rate = user.get_reserve(reserve.index()).stable_rate;
    let current_rate = reserve.data.stable_borrow_rate;
    let liquidity_rate_ceiling = percent_mul(
        e,
        max_variable_rate(&reserve.strategy),
        REBALANCE_UP_LIQUIDITY_RATE_THRESHOLD,
    );
    let rebalance_up = reserve.utilization(e) >= REBALANCE_UP_USAGE_RATIO_THRESHOLD
        && reserve.data.liquidity_rate <= liquidity_rate_ceiling;
    let rebalance_down = user_rate > current_rate + REBALANCE_DOWN_RATE_DELTA;
    if !rebalance_up && !rebalance_down {
        panic_with_error!(e, PoolError::RebalanceNotNeeded);
    }

    user.remove_stable_debt(e, &mut reserve, stable_debt);
    user.add_stable_debt(e, &mut reserve, stable_debt, current_rate);

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
    user.store(e);
}

/// Set the amount of `rate_mode` debt in `asset` that `delegatee` can borrow against the
/// collateral of `delegator`
pub fn execute_approve_delegation(
    e: &Env,
    delegator: &Address,
    delegatee: &Address,
    asset: &Address,
    rate_mode: u32,
    amount: i128,
) {
    require_nonnegative(e, &amount);
    require_debt_rate_mode(e, rate_mode);
    if !storage::has_res(e, asset) {
        panic_with_error!(e, PoolError::ReserveNotFound);
    }
    let key = AllowanceKey {
        delegator: delegator.clone(),
        delegatee: delegatee.clone(),
        asset: asset.clone(),
        rate_mode,
    };
    storage::set_allowance(e, &key, &amount);
}

/// Consume `amount` of the allowance `delegator` granted `delegatee`
///
/// ### Panics
/// If the allowance is smaller than `amount`
pub(super) fn spend_allowance(
    e: &Env,
    delegator: &Address,
    delegatee: &Address,
    asset: &Address,
    rate_mode: u32,
    amount: i128,
) {
    let key = AllowanceKey {
        delegator: delegator.clone(),
        delegatee: delegatee.clone(),
        asset: asset.clone(),
        rate_mode,
    };
    let allowance = storage::get_allowance(e, &key);
    if allowance < amount {
        panic_with_error!(e, PoolError::InsufficientBorrowAllowance);
    }
    storage::set_allowance(e, &key, &(allowance - amount));
}

/// Validate that `user` can borrow `amount` of the reserve as `rate_mode` debt, based on the
/// user's positions before the borrow
///
/// ### Panics
/// If the reserve cannot lend the amount or the user's collateral cannot support it
pub(super) fn validate_borrow(
    e: &Env,
    pool: &mut Pool,
    reserve: &Reserve,
    user: &User,
    amount: i128,
    rate_mode: u32,
) {
    if !reserve.config.borrowing_enabled {
        panic_with_error!(e, PoolError::BorrowingNotEnabled);
    }
    if amount > reserve.data.available_liquidity {
        panic_with_error!(e, PoolError::InsufficientLiquidity);
    }

    let position_data = PositionData::calculate_from_positions(e, pool, &user.positions);
    if position_data.collateral_base == 0 {
        panic_with_error!(e, PoolError::CollateralBalanceIsZero);
    }
    if position_data.as_health_factor(e) < HEALTH_FACTOR_LIQUIDATION_THRESHOLD {
        panic_with_error!(e, PoolError::HealthFactorBelowThreshold);
    }

    let price = pool.load_price(e, &reserve.asset);
    let amount_base = to_base(e, reserve, price, amount);
    let ltv = position_data.avg_ltv();
    if ltv == 0
        || percent_div(e, position_data.liability_base + amount_base, ltv)
            > position_data.collateral_base
    {
        panic_with_error!(e, PoolError::CollateralCannotCoverNewBorrow);
    }

    if rate_mode == RATE_MODE_STABLE {
        require_stable_borrow_allowed(e, reserve, user, amount, amount);
    }
}

/// Require that `amount` of new stable debt can be opened in the reserve. A user using the
/// reserve as collateral cannot hold stable debt of `debt` or less than their supply.
fn require_stable_borrow_allowed(
    e: &Env,
    reserve: &Reserve,
    user: &User,
    amount: i128,
    debt: i128,
) {
    if !reserve.config.stable_borrowing_enabled {
        panic_with_error!(e, PoolError::StableBorrowingNotEnabled);
    }
    if user.is_collateral(reserve.index())
        && reserve.config.ltv != 0
        && debt <= user.supply_balance(e, reserve)
    {
        panic_with_error!(e, PoolError::CollateralSameAsBorrowingCurrency);
    }
    let max_loan = percent_mul(
        e,
        reserve.data.available_liquidity,
        MAX_STABLE_RATE_BORROW_SIZE_PERCENT,
    );
    if amount > max_loan {
        panic_with_error!(e, PoolError::AmountBiggerThanMaxLoanSizeStable);
    }
}

/// Open `amount` of `rate_mode` debt for the user. Stable debt is opened at the reserve's
/// current stable rate.
pub(super) fn open_debt(
    e: &Env,
    user: &mut User,
    reserve: &mut Reserve,
    amount: i128,
    rate_mode: u32,
) {
    if rate_mode == RATE_MODE_STABLE {
        let stable_rate = reserve.data.stable_borrow_rate;
        user.add_stable_debt(e, reserve, amount, stable_rate);
    } else {
        user.add_var_debt(e, reserve, amount);
    }
}

fn close_debt(e: &Env, user: &mut User, reserve: &mut Reserve, amount: i128, rate_mode: u32) {
    if rate_mode == RATE_MODE_STABLE {
        user.remove_stable_debt(e, reserve, amount);
    } else {
        user.remove_var_debt(e, reserve, amount);
    }
}
