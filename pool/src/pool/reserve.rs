use cast::i128;
use soroban_sdk::{contracttype, panic_with_error, Address, Env};

use crate::{
    constants::RAY,
    errors::PoolError,
    math::{percent_mul, ray_div, ray_mul},
    storage::{self, RateStrategy, ReserveConfig, ReserveData},
};

use super::interest::{
    calc_compounded_interest, calc_interest_rates, calc_linear_interest, calc_utilization,
};

#[derive(Clone)]
#[contracttype]
pub struct Reserve {
    pub asset: Address,          // the underlying asset address
    pub config: ReserveConfig,   // the risk configuration of the reserve
    pub strategy: RateStrategy,  // the interest rate strategy of the reserve
    pub data: ReserveData,       // the accounting state of the reserve
    pub market_rate: i128,       // the market reference stable borrow rate (ray)
    pub scalar: i128,            // scalar used for balances
}

impl Reserve {
    /// Load a Reserve from the ledger and accrue interest to the current ledger timestamp.
    ///
    /// **NOTE**: This function is not cached, and should be called from the Pool.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    ///
    /// ### Panics
    /// If the asset is not a reserve of the pool
    pub fn load(e: &Env, asset: &Address) -> Reserve {
        if !storage::has_res(e, asset) {
            panic_with_error!(e, PoolError::ReserveNotFound);
        }
        let config = storage::get_res_config(e, asset);
        let mut reserve = Reserve {
            asset: asset.clone(),
            scalar: 10i128.pow(config.decimals),
            config,
            strategy: storage::get_res_strategy(e, asset),
            data: storage::get_res_data(e, asset),
            market_rate: storage::get_market_rate(e, asset),
        };
        reserve.accrue(e);
        reserve
    }

    /// Accrue interest on the reserve up to the current ledger timestamp and credit the
    /// treasury with the reserve factor of the interest accrued by borrowers
    fn accrue(&mut self, e: &Env) {
        // short circuit if the reserve has already been updated this ledger
        if e.ledger().timestamp() == self.data.last_time {
            return;
        }

        let prev_var_index = self.data.var_borrow_index;
        let prev_stable_debt = self.data.total_stable_debt;

        if self.data.liquidity_rate > 0 {
            let cumulated =
                calc_linear_interest(e, self.data.liquidity_rate, self.data.last_time);
            self.data.liquidity_index = ray_mul(e, cumulated, self.data.liquidity_index);
        }

        if self.data.scaled_var_debt != 0 {
            let cumulated =
                calc_compounded_interest(e, self.data.var_borrow_rate, self.data.last_time);
            self.data.var_borrow_index = ray_mul(e, cumulated, self.data.var_borrow_index);
        }

        if self.data.total_stable_debt != 0 {
            let cumulated =
                calc_linear_interest(e, self.data.avg_stable_rate, self.data.last_time);
            self.data.total_stable_debt = ray_mul(e, self.data.total_stable_debt, cumulated);
        }

        if self.config.reserve_factor > 0 {
            let prev_var_debt = ray_mul(e, self.data.scaled_var_debt, prev_var_index);
            let accrued = self.total_var_debt(e) - prev_var_debt + self.data.total_stable_debt
                - prev_stable_debt;
            let to_treasury = percent_mul(e, accrued, i128(self.config.reserve_factor));
            if to_treasury > 0 {
                self.data.accrued_to_treasury += ray_div(e, to_treasury, self.data.liquidity_index);
            }
        }

        self.data.last_time = e.ledger().timestamp();
    }

    /// Recalculate the interest rates of the reserve from its current liquidity and debt
    pub fn update_rates(&mut self, e: &Env) {
        let (liquidity_rate, stable_rate, var_rate) = calc_interest_rates(
            e,
            &self.strategy,
            self.market_rate,
            self.data.available_liquidity,
            self.data.total_stable_debt,
            self.total_var_debt(e),
            self.data.avg_stable_rate,
            self.config.reserve_factor,
        );
        self.data.liquidity_rate = liquidity_rate;
        self.data.stable_borrow_rate = stable_rate;
        self.data.var_borrow_rate = var_rate;
    }

    /// Store the updated reserve data to the ledger.
    pub fn store(&self, e: &Env) {
        storage::set_res_data(e, &self.asset, &self.data);
    }

    /// Fetch the index of the reserve in the reserve list
    pub fn index(&self) -> u32 {
        self.config.index
    }

    /// Fetch the total variable debt of the reserve in underlying tokens
    pub fn total_var_debt(&self, e: &Env) -> i128 {
        ray_mul(e, self.data.scaled_var_debt, self.data.var_borrow_index)
    }

    /// Fetch the total debt of the reserve in underlying tokens
    pub fn total_debt(&self, e: &Env) -> i128 {
        self.total_var_debt(e) + self.data.total_stable_debt
    }

    /// Fetch the total supply of the reserve in underlying tokens, excluding the treasury's
    /// uncredited share
    pub fn total_supply(&self, e: &Env) -> i128 {
        ray_mul(e, self.data.scaled_supply, self.data.liquidity_index)
    }

    /// Fetch the current utilization of the reserve (ray)
    pub fn utilization(&self, e: &Env) -> i128 {
        calc_utilization(e, self.data.available_liquidity, self.total_debt(e))
    }

    /// Distribute `amount` of underlying to the current suppliers by growing the liquidity index
    ///
    /// ### Arguments
    /// * `amount` - The amount of underlying to distribute
    pub fn cumulate_to_liquidity_index(&mut self, e: &Env, amount: i128) {
        let total_supply = self.total_supply(e);
        if total_supply == 0 || amount == 0 {
            return;
        }
        let ratio = ray_div(e, amount, total_supply);
        self.data.liquidity_index = ray_mul(e, ratio + RAY, self.data.liquidity_index);
    }

    /********** Conversion Functions **********/

    /// Convert underlying to supply receipts, rounding half up
    ///
    /// ### Arguments
    /// * `amount` - The amount of underlying to convert
    pub fn to_scaled_supply(&self, e: &Env, amount: i128) -> i128 {
        ray_div(e, amount, self.data.liquidity_index)
    }

    /// Convert supply receipts to underlying, rounding half up
    ///
    /// ### Arguments
    /// * `scaled` - The amount of supply receipts to convert
    pub fn to_asset_from_supply(&self, e: &Env, scaled: i128) -> i128 {
        ray_mul(e, scaled, self.data.liquidity_index)
    }

    /// Convert underlying to scaled variable debt, rounding half up
    ///
    /// ### Arguments
    /// * `amount` - The amount of underlying to convert
    pub fn to_scaled_var_debt(&self, e: &Env, amount: i128) -> i128 {
        ray_div(e, amount, self.data.var_borrow_index)
    }

    /// Convert scaled variable debt to underlying, rounding half up
    ///
    /// ### Arguments
    /// * `scaled` - The amount of scaled variable debt to convert
    pub fn to_asset_from_var_debt(&self, e: &Env, scaled: i128) -> i128 {
        ray_mul(e, scaled, self.data.var_borrow_index)
    }
}
