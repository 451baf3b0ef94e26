use cast::i128;
use sep_41_token::TokenClient;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{panic_with_error, Address, Env};

use crate::{
    constants::{
        CLOSE_FACTOR_HF_THRESHOLD, HEALTH_FACTOR_LIQUIDATION_THRESHOLD,
        LIQUIDATION_CLOSE_FACTOR_PERCENT, PERCENTAGE_FACTOR,
    },
    errors::PoolError,
    math::{percent_div, percent_mul},
    validator::require_positive,
};

use super::{
    health_factor::{to_base, PositionData},
    pool::Pool,
    reserve::Reserve,
    status::Action,
    user::User,
};

/// Cover up to `debt_to_cover` of `user`'s debt in `debt_asset` and seize the equivalent
/// collateral in `collateral_asset`, plus the reserve's liquidation bonus.
///
/// Returns the (debt covered, collateral seized) in underlying tokens
///
/// ### Arguments
/// * `receive_supply` - If the liquidator receives the user's supply receipts instead of
///                      the collateral's underlying
///
/// ### Panics
/// If the user is healthy, or the reserves do not hold a liquidatable position for the user
pub fn execute_liquidation(
    e: &Env,
    liquidator: &Address,
    collateral_asset: &Address,
    debt_asset: &Address,
    user: &Address,
    debt_to_cover: i128,
    receive_supply: bool,
) -> (i128, i128) {
    require_positive(e, &debt_to_cover);
    if liquidator == user {
        panic_with_error!(e, PoolError::BadRequest);
    }

    let mut pool = Pool::load(e);
    let collateral_reserve = pool.load_reserve(e, collateral_asset);
    pool.require_action_allowed(e, &collateral_reserve, Action::Liquidation);
    let debt_reserve = pool.load_reserve(e, debt_asset);
    pool.require_action_allowed(e, &debt_reserve, Action::Liquidation);
    pool.cache_reserve(collateral_reserve, false);
    pool.cache_reserve(debt_reserve, false);

    let mut user = User::load(e, user);
    let position_data = PositionData::calculate_from_positions(e, &mut pool, &user.positions);
    let health_factor = position_data.as_health_factor(e);
    if health_factor >= HEALTH_FACTOR_LIQUIDATION_THRESHOLD {
        panic_with_error!(e, PoolError::HealthFactorNotBelowThreshold);
    }

    let collateral_reserve = pool.load_reserve(e, collateral_asset);
    let collateral_index = collateral_reserve.index();
    let user_collateral = user.supply_balance(e, &collateral_reserve);
    if !user.is_collateral(collateral_index)
        || collateral_reserve.config.liq_threshold == 0
        || user_collateral == 0
    {
        panic_with_error!(e, PoolError::CollateralCannotBeLiquidated);
    }

    let debt_reserve = pool.load_reserve(e, debt_asset);
    let stable_debt = user.stable_debt(e, &debt_reserve);
    let var_debt = user.var_debt(e, &debt_reserve);
    if stable_debt + var_debt == 0 {
        panic_with_error!(e, PoolError::UserDoesNotHaveDebtOfSelectedType);
    }

    let close_factor = if health_factor < CLOSE_FACTOR_HF_THRESHOLD {
        PERCENTAGE_FACTOR
    } else {
        LIQUIDATION_CLOSE_FACTOR_PERCENT
    };
    let max_debt = percent_mul(e, stable_debt + var_debt, close_factor);
    let debt_price = pool.load_price(e, debt_asset);
    let collateral_price = pool.load_price(e, collateral_asset);
    let (debt_covered, collateral_seized) = calc_liquidation_amounts(
        e,
        &collateral_reserve,
        collateral_price,
        user_collateral,
        &debt_reserve,
        debt_price,
        debt_to_cover.min(max_debt),
    );
    if debt_covered == 0 || collateral_seized == 0 {
        panic_with_error!(e, PoolError::InvalidAmount);
    }
    if !receive_supply && collateral_reserve.data.available_liquidity < collateral_seized {
        panic_with_error!(e, PoolError::NotEnoughLiquidityToLiquidate);
    }

    // variable debt is covered before stable debt
    let mut debt_reserve = pool.load_reserve(e, debt_asset);
    let var_covered = debt_covered.min(var_debt);
    if var_covered > 0 {
        user.remove_var_debt(e, &mut debt_reserve, var_covered);
    }
    let stable_covered = debt_covered - var_covered;
    if stable_covered > 0 {
        user.remove_stable_debt(e, &mut debt_reserve, stable_covered);
    }
    debt_reserve.data.available_liquidity += debt_covered;
    pool.cache_reserve(debt_reserve, true);

    let mut collateral_reserve = pool.load_reserve(e, collateral_asset);
    let user_scaled = user.get_scaled_supply(collateral_index);
    let scaled_seized = if collateral_seized == user_collateral {
        user_scaled
    } else {
        collateral_reserve
            .to_scaled_supply(e, collateral_seized)
            .min(user_scaled)
    };
    if receive_supply {
        let mut liquidator_user = User::load(e, liquidator);
        let liquidator_was_empty = liquidator_user.get_scaled_supply(collateral_index) == 0;
        user.transfer_supply(e, &mut liquidator_user, collateral_index, scaled_seized);
        if liquidator_was_empty && collateral_reserve.config.collateral_enabled {
            liquidator_user.set_collateral(collateral_index, true);
        }
        liquidator_user.store(e);
    } else {
        user.remove_supply(e, &mut collateral_reserve, scaled_seized);
        collateral_reserve.data.available_liquidity -= collateral_seized;
    }
    pool.cache_reserve(collateral_reserve, true);

    pool.store_cached_reserves(e);
    user.store(e);

    let pool_address = e.current_contract_address();
    TokenClient::new(e, debt_asset).transfer(liquidator, &pool_address, &debt_covered);
    if !receive_supply {
        TokenClient::new(e, collateral_asset).transfer(
            &pool_address,
            liquidator,
            &collateral_seized,
        );
    }
    (debt_covered, collateral_seized)
}

/// Calculate the collateral seized for covering `debt_to_cover`, including the liquidation
/// bonus. If the user does not hold enough collateral, all of it is seized and the debt
/// covered is reduced to match.
///
/// Returns the (debt covered, collateral seized) in underlying tokens
fn calc_liquidation_amounts(
    e: &Env,
    collateral_reserve: &Reserve,
    collateral_price: i128,
    user_collateral: i128,
    debt_reserve: &Reserve,
    debt_price: i128,
    debt_to_cover: i128,
) -> (i128, i128) {
    let bonus = i128(collateral_reserve.config.liq_bonus);
    let debt_base = to_base(e, debt_reserve, debt_price, debt_to_cover);
    let collateral_seized = percent_mul(e, debt_base, bonus)
        .fixed_div_floor(collateral_price, collateral_reserve.scalar)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::OverflowError));
    if collateral_seized <= user_collateral {
        return (debt_to_cover, collateral_seized);
    }

    let collateral_base = to_base(e, collateral_reserve, collateral_price, user_collateral);
    let debt_covered = percent_div(e, collateral_base, bonus)
        .fixed_div_floor(debt_price, debt_reserve.scalar)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::OverflowError));
    (debt_covered, user_collateral)
}
