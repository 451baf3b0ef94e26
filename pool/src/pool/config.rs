use crate::{
    auth::AdminAuth,
    constants::{MAX_RESERVES, PERCENTAGE_FACTOR, RAY},
    errors::PoolError,
    math::percent_mul,
    storage::{self, PoolConfig, RateStrategy, ReserveConfig, ReserveData},
    validator::require_nonnegative,
};
use cast::i128;
use soroban_sdk::{panic_with_error, Address, Env};

use super::{interest::calc_interest_rates, pool::Pool};

/// Initialize the pool
///
/// Panics if the pool is already initialized or the arguments are invalid
pub fn execute_initialize(
    e: &Env,
    admin: &Address,
    emergency_admin: &Address,
    oracle: &Address,
    treasury: &Address,
    flash_premium: u32,
) {
    if storage::has_admin(e) {
        panic_with_error!(e, PoolError::AlreadyInitializedError);
    }

    if i128(flash_premium) > PERCENTAGE_FACTOR {
        panic_with_error!(e, PoolError::InvalidPoolInitArgs);
    }

    storage::set_admin(e, admin);
    storage::set_emergency_admin(e, emergency_admin);
    storage::set_pool_config(
        e,
        &PoolConfig {
            oracle: oracle.clone(),
            treasury: treasury.clone(),
            flash_premium,
            paused: false,
        },
    );
}

/// Update the pool
pub fn execute_update_pool(e: &Env, _auth: &AdminAuth, treasury: &Address, flash_premium: u32) {
    if i128(flash_premium) > PERCENTAGE_FACTOR {
        panic_with_error!(e, PoolError::BadRequest);
    }
    let mut pool_config = storage::get_pool_config(e);
    pool_config.treasury = treasury.clone();
    pool_config.flash_premium = flash_premium;
    storage::set_pool_config(e, &pool_config);
}

/// Initialize a reserve for the pool
///
/// Returns the index of the reserve
pub fn execute_init_reserve(
    e: &Env,
    _auth: &AdminAuth,
    asset: &Address,
    config: &ReserveConfig,
    strategy: &RateStrategy,
) -> u32 {
    if storage::has_res(e, asset) {
        panic_with_error!(e, PoolError::AlreadyInitializedError);
    }
    require_valid_reserve_config(e, config);
    require_valid_rate_strategy(e, strategy);
    if storage::get_res_list(e).len() >= MAX_RESERVES {
        panic_with_error!(e, PoolError::MaxReservesExceeded);
    }

    let index = storage::push_res_list(e, asset);
    let mut reserve_config = config.clone();
    reserve_config.index = index;
    storage::set_res_config(e, asset, &reserve_config);
    storage::set_res_strategy(e, asset, strategy);

    let market_rate = storage::get_market_rate(e, asset);
    let (liquidity_rate, stable_rate, var_rate) = calc_interest_rates(
        e,
        strategy,
        market_rate,
        0,
        0,
        0,
        0,
        reserve_config.reserve_factor,
    );
    let init_data = ReserveData {
        liquidity_index: RAY,
        var_borrow_index: RAY,
        liquidity_rate,
        var_borrow_rate: var_rate,
        stable_borrow_rate: stable_rate,
        avg_stable_rate: 0,
        available_liquidity: 0,
        total_stable_debt: 0,
        scaled_var_debt: 0,
        scaled_supply: 0,
        accrued_to_treasury: 0,
        last_time: e.ledger().timestamp(),
    };
    storage::set_res_data(e, asset, &init_data);
    index
}

/// Update the risk parameters of a reserve. The index, decimals and status flags are kept.
pub fn execute_update_reserve(e: &Env, _auth: &AdminAuth, asset: &Address, config: &ReserveConfig) {
    require_valid_reserve_config(e, config);

    // accrue under the old parameters before they change
    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);

    let mut new_config = config.clone();
    new_config.index = reserve.config.index;
    new_config.decimals = reserve.config.decimals;
    new_config.active = reserve.config.active;
    new_config.frozen = reserve.config.frozen;
    storage::set_res_config(e, asset, &new_config);

    reserve.config = new_config;
    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
}

/// Replace the interest rate strategy of a reserve
pub fn execute_set_rate_strategy(
    e: &Env,
    _auth: &AdminAuth,
    asset: &Address,
    strategy: &RateStrategy,
) {
    require_valid_rate_strategy(e, strategy);

    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    storage::set_res_strategy(e, asset, strategy);

    reserve.strategy = strategy.clone();
    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
}

/// Set the market reference stable borrow rate of a reserve
pub fn execute_set_market_rate(e: &Env, _auth: &AdminAuth, asset: &Address, rate: i128) {
    require_nonnegative(e, &rate);

    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    storage::set_market_rate(e, asset, &rate);

    reserve.market_rate = rate;
    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
}

/// Activate or deactivate a reserve
///
/// ### Panics
/// If the reserve is deactivated while it still holds liquidity or earns interest
pub fn execute_set_reserve_active(e: &Env, _auth: &AdminAuth, asset: &Address, active: bool) {
    let pool = Pool::load(e);
    let reserve = pool.load_reserve(e, asset);
    if !active && (reserve.data.available_liquidity != 0 || reserve.data.liquidity_rate != 0) {
        panic_with_error!(e, PoolError::ReserveLiquidityNotZero);
    }

    let mut config = reserve.config;
    config.active = active;
    storage::set_res_config(e, asset, &config);
}

/// Freeze or unfreeze a reserve
pub fn execute_set_reserve_frozen(e: &Env, _auth: &AdminAuth, asset: &Address, frozen: bool) {
    if !storage::has_res(e, asset) {
        panic_with_error!(e, PoolError::ReserveNotFound);
    }
    let mut config = storage::get_res_config(e, asset);
    config.frozen = frozen;
    storage::set_res_config(e, asset, &config);
}

fn require_valid_reserve_config(e: &Env, config: &ReserveConfig) {
    let liq_threshold = i128(config.liq_threshold);
    let liq_bonus = i128(config.liq_bonus);
    let invalid_liquidation = if liq_threshold > 0 {
        liq_bonus <= PERCENTAGE_FACTOR
            || percent_mul(e, liq_threshold, liq_bonus) > PERCENTAGE_FACTOR
    } else {
        liq_bonus != 0 || config.collateral_enabled
    };
    if config.decimals > 18
        || config.ltv > config.liq_threshold
        || invalid_liquidation
        || i128(config.reserve_factor) > PERCENTAGE_FACTOR
    {
        panic_with_error!(e, PoolError::InvalidReserveConfig);
    }
}

fn require_valid_rate_strategy(e: &Env, strategy: &RateStrategy) {
    if strategy.optimal_util <= 0
        || strategy.optimal_util > RAY
        || strategy.base_rate < 0
        || strategy.var_slope_1 < 0
        || strategy.var_slope_2 < 0
        || strategy.stable_slope_1 < 0
        || strategy.stable_slope_2 < 0
    {
        panic_with_error!(e, PoolError::InvalidRateStrategy);
    }
}
