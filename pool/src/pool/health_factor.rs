use cast::i128;
use soroban_fixed_point_math::FixedPoint;
use soroban_sdk::{contracttype, panic_with_error, Env};

use crate::{
    constants::{HEALTH_FACTOR_LIQUIDATION_THRESHOLD, INFINITE_HEALTH_FACTOR},
    errors::PoolError,
    math::{percent_mul, wad_div},
    storage,
};

use super::{pool::Pool, Positions, Reserve};

/// A user's account summary, denominated in the oracle's base asset
#[derive(Clone)]
#[contracttype]
pub struct AccountData {
    pub total_collateral: i128,
    pub total_debt: i128,
    pub available_borrows: i128,
    pub current_liquidation_threshold: i128, // bps
    pub ltv: i128,                           // bps
    pub health_factor: i128,                 // wad
}

pub struct PositionData {
    /// The collateral balance denominated in the base asset
    pub collateral_base: i128,
    /// The liability balance denominated in the base asset
    pub liability_base: i128,
    /// The sum of each collateral's base value multiplied by its loan to value
    pub weighted_ltv: i128,
    /// The sum of each collateral's base value multiplied by its liquidation threshold
    pub weighted_threshold: i128,
}

/// Value `amount` of the reserve's underlying in the oracle's base asset
pub fn to_base(e: &Env, reserve: &Reserve, price: i128, amount: i128) -> i128 {
    price
        .fixed_mul_floor(amount, reserve.scalar)
        .unwrap_or_else(|| panic_with_error!(e, PoolError::OverflowError))
}

impl PositionData {
    /// Calculate the position data for a given set of of positions
    ///
    /// ### Arguments
    /// * pool - The pool
    /// * positions - The positions to calculate the health factor for
    pub fn calculate_from_positions(e: &Env, pool: &mut Pool, positions: &Positions) -> Self {
        let reserve_list = storage::get_res_list(e);
        let mut collateral_base = 0;
        let mut liability_base = 0;
        let mut weighted_ltv = 0;
        let mut weighted_threshold = 0;
        for i in 0..reserve_list.len() {
            let data = positions.get(i);
            let has_collateral = data.collateral && data.scaled_supply > 0;
            if !has_collateral && !data.has_debt() {
                continue;
            }
            let reserve = pool.load_reserve(e, &reserve_list.get_unchecked(i));

            if has_collateral && reserve.config.liq_threshold > 0 {
                let price = pool.load_price(e, &reserve.asset);
                let supply = reserve.to_asset_from_supply(e, data.scaled_supply);
                let value = to_base(e, &reserve, price, supply);
                collateral_base += value;
                weighted_ltv += value * i128(reserve.config.ltv);
                weighted_threshold += value * i128(reserve.config.liq_threshold);
            }

            if data.has_debt() {
                let price = pool.load_price(e, &reserve.asset);
                let debt = data.stable_debt(e)
                    + reserve.to_asset_from_var_debt(e, data.scaled_var_debt);
                liability_base += to_base(e, &reserve, price, debt);
            }

            pool.cache_reserve(reserve, false);
        }

        PositionData {
            collateral_base,
            liability_base,
            weighted_ltv,
            weighted_threshold,
        }
    }

    /// The collateral weighted loan to value (bps)
    pub fn avg_ltv(&self) -> i128 {
        if self.collateral_base == 0 {
            return 0;
        }
        self.weighted_ltv / self.collateral_base
    }

    /// The collateral weighted liquidation threshold (bps)
    pub fn avg_liq_threshold(&self) -> i128 {
        if self.collateral_base == 0 {
            return 0;
        }
        self.weighted_threshold / self.collateral_base
    }

    /// Return the health factor as a wad, or `INFINITE_HEALTH_FACTOR` without liabilities
    pub fn as_health_factor(&self, e: &Env) -> i128 {
        if self.liability_base == 0 {
            return INFINITE_HEALTH_FACTOR;
        }
        wad_div(
            e,
            percent_mul(e, self.collateral_base, self.avg_liq_threshold()),
            self.liability_base,
        )
    }

    /// The additional liabilities the collateral supports, denominated in the base asset
    pub fn available_borrows(&self, e: &Env) -> i128 {
        let max_borrows = percent_mul(e, self.collateral_base, self.avg_ltv());
        if max_borrows <= self.liability_base {
            return 0;
        }
        max_borrows - self.liability_base
    }

    /// Check if the position data meets the minimum health factor, panic if not
    pub fn require_healthy(&self, e: &Env) {
        if self.liability_base == 0 {
            return;
        }
        if self.as_health_factor(e) < HEALTH_FACTOR_LIQUIDATION_THRESHOLD {
            panic_with_error!(e, PoolError::HealthFactorBelowThreshold);
        }
    }

    /// Summarize the position data for callers
    pub fn to_account_data(&self, e: &Env) -> AccountData {
        AccountData {
            total_collateral: self.collateral_base,
            total_debt: self.liability_base,
            available_borrows: self.available_borrows(e),
            current_liquidation_threshold: self.avg_liq_threshold(),
            ltv: self.avg_ltv(),
            health_factor: self.as_health_factor(e),
        }
    }
}
