use sep_41_token::TokenClient;
use soroban_sdk::{panic_with_error, Address, Env, Vec};

use crate::{
    constants::MAX_AMOUNT,
    errors::PoolError,
    validator::{require_nonnegative, require_positive},
};

use super::{
    health_factor::PositionData,
    pool::Pool,
    status::Action,
    user::User,
};

/// Deposit `amount` of `asset` from `from` and credit the supply receipts to `on_behalf_of`.
/// The first deposit into a reserve enables it as collateral if the reserve allows it.
///
/// Returns the supply receipts minted
pub fn execute_deposit(
    e: &Env,
    from: &Address,
    asset: &Address,
    amount: i128,
    on_behalf_of: &Address,
) -> i128 {
    require_positive(e, &amount);

    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::Deposit);

    let mut user = User::load(e, on_behalf_of);
    let is_first_deposit = user.get_scaled_supply(reserve.index()) == 0;
    let scaled = user.add_supply(e, &mut reserve, amount);
    if is_first_deposit && reserve.config.collateral_enabled {
        user.set_collateral(reserve.index(), true);
    }
    reserve.data.available_liquidity += amount;

    TokenClient::new(e, asset).transfer(from, &e.current_contract_address(), &amount);

    pool.cache_reserve(reserve, true);
    pool.store_cached_reserves(e);
    user.store(e);
    scaled
}

/// Withdraw `amount` of `asset` supplied by `from` and send it to `to`. An amount of
/// `MAX_AMOUNT` withdraws the full balance.
///
/// Returns the amount withdrawn
///
/// ### Panics
/// If the user does not hold enough supply, the reserve does not hold enough liquidity, or the
/// withdrawal would leave the user below the minimum health factor
pub fn execute_withdraw(
    e: &Env,
    from: &Address,
    asset: &Address,
    amount: i128,
    to: &Address,
) -> i128 {
    require_positive(e, &amount);

    let mut pool = Pool::load(e);
    let mut reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::Withdraw);

    let mut user = User::load(e, from);
    let user_scaled = user.get_scaled_supply(reserve.index());
    let (to_withdraw, to_burn) = if amount == MAX_AMOUNT {
        (user.supply_balance(e, &reserve), user_scaled)
    } else {
        (amount, reserve.to_scaled_supply(e, amount))
    };
    if to_burn == 0 || to_withdraw == 0 {
        panic_with_error!(e, PoolError::InvalidAmount);
    }
    if to_burn > user_scaled {
        panic_with_error!(e, PoolError::BalanceError);
    }
    if to_withdraw > reserve.data.available_liquidity {
        panic_with_error!(e, PoolError::InsufficientLiquidity);
    }

    let was_collateral = user.is_collateral(reserve.index());
    user.remove_supply(e, &mut reserve, to_burn);
    reserve.data.available_liquidity -= to_withdraw;
    pool.cache_reserve(reserve, true);

    if was_collateral && user.positions.has_debt() {
        PositionData::calculate_from_positions(e, &mut pool, &user.positions).require_healthy(e);
    }

    pool.store_cached_reserves(e);
    user.store(e);

    TokenClient::new(e, asset).transfer(&e.current_contract_address(), to, &to_withdraw);
    to_withdraw
}

/// Enable or disable the supply of `from` in `asset` as collateral
///
/// ### Panics
/// If the user has no supply in the reserve, the reserve cannot be used as collateral, or
/// disabling the collateral would leave the user below the minimum health factor
pub fn execute_set_collateral(e: &Env, from: &Address, asset: &Address, enabled: bool) {
    let mut pool = Pool::load(e);
    let reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::SetCollateral);

    let mut user = User::load(e, from);
    if user.get_scaled_supply(reserve.index()) == 0 {
        panic_with_error!(e, PoolError::UnderlyingBalanceZero);
    }
    if enabled && !reserve.config.collateral_enabled {
        panic_with_error!(e, PoolError::CollateralNotEnabled);
    }
    user.set_collateral(reserve.index(), enabled);
    pool.cache_reserve(reserve, false);

    if !enabled && user.positions.has_debt() {
        PositionData::calculate_from_positions(e, &mut pool, &user.positions).require_healthy(e);
    }
    user.store(e);
}

/// Move `amount` of supply in `asset` from `from` to `to`
///
/// Returns the supply receipts moved
///
/// ### Panics
/// If `from` does not hold enough supply or the transfer would leave `from` below the minimum
/// health factor
pub fn execute_transfer_supply(
    e: &Env,
    from: &Address,
    to: &Address,
    asset: &Address,
    amount: i128,
) -> i128 {
    require_positive(e, &amount);
    if from == to {
        panic_with_error!(e, PoolError::BadRequest);
    }

    let mut pool = Pool::load(e);
    let reserve = pool.load_reserve(e, asset);
    pool.require_action_allowed(e, &reserve, Action::TransferSupply);

    let mut from_user = User::load(e, from);
    let mut to_user = User::load(e, to);
    let scaled = reserve.to_scaled_supply(e, amount);
    if scaled == 0 {
        panic_with_error!(e, PoolError::InvalidAmount);
    }
    let was_collateral = from_user.is_collateral(reserve.index());
    let to_was_empty = to_user.get_scaled_supply(reserve.index()) == 0;

    from_user.transfer_supply(e, &mut to_user, reserve.index(), scaled);
    if to_was_empty && reserve.config.collateral_enabled {
        to_user.set_collateral(reserve.index(), true);
    }
    pool.cache_reserve(reserve, false);

    if was_collateral && from_user.positions.has_debt() {
        PositionData::calculate_from_positions(e, &mut pool, &from_user.positions)
            .require_healthy(e);
    }

    from_user.store(e);
    to_user.store(e);
    scaled
}

/// Credit the treasury with the supply receipts accrued to it by each of `assets`
///
/// Returns the supply receipts credited for each asset
pub fn execute_mint_to_treasury(e: &Env, assets: &Vec<Address>) -> Vec<i128> {
    let mut pool = Pool::load(e);
    let mut treasury = User::load(e, &pool.config.treasury);
    let mut minted = Vec::new(e);
    for asset in assets.iter() {
        let mut reserve = pool.load_reserve(e, &asset);
        pool.require_action_allowed(e, &reserve, Action::MintToTreasury);

        let to_mint = reserve.data.accrued_to_treasury;
        require_nonnegative(e, &to_mint);
        if to_mint > 0 {
            treasury.add_scaled_supply(reserve.index(), to_mint);
            reserve.data.scaled_supply += to_mint;
            reserve.data.accrued_to_treasury = 0;
        }
        minted.push_back(to_mint);
        pool.cache_reserve(reserve, true);
    }
    pool.store_cached_reserves(e);
    treasury.store(e);
    minted
}
