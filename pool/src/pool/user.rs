use soroban_sdk::{contracttype, panic_with_error, Address, Env, Map};

use crate::{
    errors::PoolError,
    math::{ray_mul, weighted_add_div, weighted_sub_div},
    storage,
    validator::require_nonnegative,
};

use super::{interest::calc_linear_interest, Reserve};

/// A user's position in a single reserve
#[derive(Clone, Default)]
#[contracttype]
pub struct UserReserveData {
    pub scaled_supply: i128,    // the supply receipt balance
    pub stable_principal: i128, // the stable debt, accrued up to stable_last_time
    pub stable_rate: i128,      // the rate the stable debt accrues at (ray)
    pub stable_last_time: u64,  // the last time the stable debt was updated
    pub scaled_var_debt: i128,  // the variable debt, scaled by the variable borrow index
    pub collateral: bool,       // if the supply is used as collateral
}

impl UserReserveData {
    pub fn is_empty(&self) -> bool {
        self.scaled_supply == 0 && self.stable_principal == 0 && self.scaled_var_debt == 0
    }

    pub fn has_debt(&self) -> bool {
        self.stable_principal != 0 || self.scaled_var_debt != 0
    }

    /// The stable debt accrued linearly at the position's stable rate
    pub fn stable_debt(&self, e: &Env) -> i128 {
        if self.stable_principal == 0 {
            return 0;
        }
        let cumulated = calc_linear_interest(e, self.stable_rate, self.stable_last_time);
        ray_mul(e, self.stable_principal, cumulated)
    }
}

/// A user / contracts position's with the pool, keyed by reserve index
#[derive(Clone)]
#[contracttype]
pub struct Positions {
    pub reserves: Map<u32, UserReserveData>,
}

impl Positions {
    /// Create an empty Positions object in the environment
    pub fn env_default(e: &Env) -> Self {
        Positions {
            reserves: Map::new(e),
        }
    }

    /// Get the position for the reserve at the given index, or an empty one
    pub fn get(&self, reserve_index: u32) -> UserReserveData {
        self.reserves.get(reserve_index).unwrap_or_default()
    }

    /// Check if the positions hold debt in any reserve
    pub fn has_debt(&self) -> bool {
        self.reserves.values().iter().any(|data| data.has_debt())
    }
}

/// A user's current balances in a reserve, accrued to the current ledger timestamp
#[derive(Clone)]
#[contracttype]
pub struct UserReserveView {
    pub current_supply: i128,
    pub current_stable_debt: i128,
    pub current_variable_debt: i128,
    pub principal_stable_debt: i128,
    pub scaled_variable_debt: i128,
    pub stable_borrow_rate: i128,
    pub liquidity_rate: i128,
    pub stable_rate_last_updated: u64,
    pub usage_as_collateral_enabled: bool,
}

/// A user / contracts position's with the pool
#[derive(Clone)]
pub struct User {
    pub address: Address,
    pub positions: Positions,
}

impl User {
    /// Load a User from the ledger
    pub fn load(e: &Env, address: &Address) -> Self {
        User {
            address: address.clone(),
            positions: storage::get_user_positions(e, address),
        }
    }

    /// Store the user's positions to the ledger
    pub fn store(&self, e: &Env) {
        storage::set_user_positions(e, &self.address, &self.positions);
    }

    /// Get the position for the reserve at the given index
    pub fn get_reserve(&self, reserve_index: u32) -> UserReserveData {
        self.positions.get(reserve_index)
    }

    fn set_reserve(&mut self, reserve_index: u32, data: UserReserveData) {
        if data.is_empty() {
            self.positions.reserves.remove(reserve_index);
        } else {
            self.positions.reserves.set(reserve_index, data);
        }
    }

    /// Build the view of the user's position in a reserve
    pub fn view(&self, e: &Env, reserve: &Reserve) -> UserReserveView {
        let data = self.get_reserve(reserve.index());
        UserReserveView {
            current_supply: self.supply_balance(e, reserve),
            current_stable_debt: self.stable_debt(e, reserve),
            current_variable_debt: self.var_debt(e, reserve),
            principal_stable_debt: data.stable_principal,
            scaled_variable_debt: data.scaled_var_debt,
            stable_borrow_rate: data.stable_rate,
            liquidity_rate: reserve.data.liquidity_rate,
            stable_rate_last_updated: data.stable_last_time,
            usage_as_collateral_enabled: data.collateral,
        }
    }

    /********** Supply **********/

    /// Get the supply receipts for the reserve
    pub fn get_scaled_supply(&self, reserve_index: u32) -> i128 {
        self.get_reserve(reserve_index).scaled_supply
    }

    /// Get the supply for the reserve in underlying tokens
    pub fn supply_balance(&self, e: &Env, reserve: &Reserve) -> i128 {
        reserve.to_asset_from_supply(e, self.get_scaled_supply(reserve.index()))
    }

    /// Mint supply receipts worth `amount` of underlying to the user and update the
    /// reserve's scaled supply. Returns the receipts minted.
    ///
    /// ### Panics
    /// If the amount is worth zero supply receipts
    pub fn add_supply(&mut self, e: &Env, reserve: &mut Reserve, amount: i128) -> i128 {
        let scaled = reserve.to_scaled_supply(e, amount);
        if scaled == 0 {
            panic_with_error!(e, PoolError::InvalidAmount);
        }
        self.add_scaled_supply(reserve.index(), scaled);
        reserve.data.scaled_supply += scaled;
        scaled
    }

    /// Burn `scaled` supply receipts from the user and update the reserve's scaled supply
    ///
    /// ### Panics
    /// If the user does not hold enough supply receipts
    pub fn remove_supply(&mut self, e: &Env, reserve: &mut Reserve, scaled: i128) {
        self.remove_scaled_supply(e, reserve.index(), scaled);
        reserve.data.scaled_supply -= scaled;
    }

    /// Move `scaled` supply receipts from this user to `to`. The reserve totals are unchanged.
    ///
    /// ### Panics
    /// If the user does not hold enough supply receipts
    pub fn transfer_supply(&mut self, e: &Env, to: &mut User, reserve_index: u32, scaled: i128) {
        self.remove_scaled_supply(e, reserve_index, scaled);
        to.add_scaled_supply(reserve_index, scaled);
    }

    /// Credit supply receipts that are already accounted for by the reserve
    pub fn add_scaled_supply(&mut self, reserve_index: u32, scaled: i128) {
        let mut data = self.get_reserve(reserve_index);
        data.scaled_supply += scaled;
        self.set_reserve(reserve_index, data);
    }

    fn remove_scaled_supply(&mut self, e: &Env, reserve_index: u32, scaled: i128) {
        let mut data = self.get_reserve(reserve_index);
        let new_balance = data.scaled_supply - scaled;
        if new_balance < 0 {
            panic_with_error!(e, PoolError::BalanceError);
        }
        data.scaled_supply = new_balance;
        if new_balance == 0 {
            data.collateral = false;
        }
        self.set_reserve(reserve_index, data);
    }

    /********** Collateral **********/

    /// Check if the user's supply in the reserve is used as collateral
    pub fn is_collateral(&self, reserve_index: u32) -> bool {
        self.get_reserve(reserve_index).collateral
    }

    /// Set if the user's supply in the reserve is used as collateral
    pub fn set_collateral(&mut self, reserve_index: u32, enabled: bool) {
        let mut data = self.get_reserve(reserve_index);
        data.collateral = enabled;
        self.set_reserve(reserve_index, data);
    }

    /********** Stable Debt **********/

    /// Get the user's stable debt in the reserve, accrued linearly at the user's stable rate
    pub fn stable_debt(&self, e: &Env, reserve: &Reserve) -> i128 {
        self.get_reserve(reserve.index()).stable_debt(e)
    }

    /// Add `amount` of stable debt at `rate` to the user. The user's rate becomes the
    /// weighted average of the accrued debt and the new debt, and the reserve's average
    /// stable rate is reweighted.
    pub fn add_stable_debt(&mut self, e: &Env, reserve: &mut Reserve, amount: i128, rate: i128) {
        require_nonnegative(e, &amount);
        let current_balance = self.stable_debt(e, reserve);
        let mut data = self.get_reserve(reserve.index());

        let next_balance = current_balance + amount;
        data.stable_rate =
            weighted_add_div(e, data.stable_rate, current_balance, rate, amount, next_balance);
        data.stable_principal = next_balance;
        data.stable_last_time = e.ledger().timestamp();
        self.set_reserve(reserve.index(), data);

        let prev_total = reserve.data.total_stable_debt;
        let next_total = prev_total + amount;
        reserve.data.avg_stable_rate = weighted_add_div(
            e,
            reserve.data.avg_stable_rate,
            prev_total,
            rate,
            amount,
            next_total,
        );
        reserve.data.total_stable_debt = next_total;
    }

    /// Remove `amount` of stable debt from the user and reweight the reserve's average
    /// stable rate
    ///
    /// ### Panics
    /// If the user owes less than `amount`
    pub fn remove_stable_debt(&mut self, e: &Env, reserve: &mut Reserve, amount: i128) {
        let current_balance = self.stable_debt(e, reserve);
        if amount > current_balance {
            panic_with_error!(e, PoolError::BalanceError);
        }
        let mut data = self.get_reserve(reserve.index());

        // the reserve total accrues at the average rate, so it can drift below the sum of the
        // individual debts
        let prev_total = reserve.data.total_stable_debt;
        if prev_total <= amount {
            reserve.data.avg_stable_rate = 0;
            reserve.data.total_stable_debt = 0;
        } else {
            let next_total = prev_total - amount;
            match weighted_sub_div(
                e,
                reserve.data.avg_stable_rate,
                prev_total,
                data.stable_rate,
                amount,
                next_total,
            ) {
                Some(avg) => {
                    reserve.data.avg_stable_rate = avg;
                    reserve.data.total_stable_debt = next_total;
                }
                None => {
                    reserve.data.avg_stable_rate = 0;
                    reserve.data.total_stable_debt = 0;
                }
            }
        }

        data.stable_principal = current_balance - amount;
        if data.stable_principal == 0 {
            data.stable_rate = 0;
            data.stable_last_time = 0;
        } else {
            data.stable_last_time = e.ledger().timestamp();
        }
        self.set_reserve(reserve.index(), data);
    }

    /********** Variable Debt **********/

    /// Get the user's variable debt in the reserve in underlying tokens
    pub fn var_debt(&self, e: &Env, reserve: &Reserve) -> i128 {
        reserve.to_asset_from_var_debt(e, self.get_reserve(reserve.index()).scaled_var_debt)
    }

    /// Add `amount` of variable debt to the user and update the reserve's scaled variable debt
    ///
    /// ### Panics
    /// If the amount is worth zero scaled debt
    pub fn add_var_debt(&mut self, e: &Env, reserve: &mut Reserve, amount: i128) {
        let scaled = reserve.to_scaled_var_debt(e, amount);
        if scaled == 0 {
            panic_with_error!(e, PoolError::InvalidAmount);
        }
        let mut data = self.get_reserve(reserve.index());
        data.scaled_var_debt += scaled;
        self.set_reserve(reserve.index(), data);
        reserve.data.scaled_var_debt += scaled;
    }

    /// Remove `amount` of variable debt from the user and update the reserve's scaled
    /// variable debt. Removing the full debt clears the scaled balance exactly.
    ///
    /// ### Panics
    /// If the user owes less than `amount`
    pub fn remove_var_debt(&mut self, e: &Env, reserve: &mut Reserve, amount: i128) {
        let mut data = self.get_reserve(reserve.index());
        let current_balance = reserve.to_asset_from_var_debt(e, data.scaled_var_debt);
        if amount > current_balance {
            panic_with_error!(e, PoolError::BalanceError);
        }
        let scaled = if amount == current_balance {
            data.scaled_var_debt
        } else {
            reserve.to_scaled_var_debt(e, amount).min(data.scaled_var_debt)
        };
        data.scaled_var_debt -= scaled;
        self.set_reserve(reserve.index(), data);
        reserve.data.scaled_var_debt -= scaled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::RAY, testutils};
    use soroban_sdk::testutils::{Address as _, Ledger, LedgerInfo};

    fn set_time(e: &Env, timestamp: u64) {
        e.ledger().set(LedgerInfo {
            timestamp,
            protocol_version: 20,
            sequence_number: 1234,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 10,
            min_persistent_entry_ttl: 10,
            max_entry_ttl: 2000000,
        });
    }

    fn empty_reserve(e: &Env) -> Reserve {
        let mut reserve = testutils::default_reserve(e);
        reserve.data.scaled_supply = 0;
        reserve.data.scaled_var_debt = 0;
        reserve.data.total_stable_debt = 0;
        reserve.data.avg_stable_rate = 0;
        reserve
    }

    #[test]
    fn test_supply() {
        let e = Env::default();
        let samwise = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        reserve.data.liquidity_index = 1_250_000_000_000_000_000_000_000_000;
        let mut user = User {
            address: samwise.clone(),
            positions: Positions::env_default(&e),
        };

        let scaled = user.add_supply(&e, &mut reserve, 100_0000000);
        assert_eq!(scaled, 80_0000000);
        assert_eq!(user.get_scaled_supply(reserve.index()), 80_0000000);
        assert_eq!(user.supply_balance(&e, &reserve), 100_0000000);
        assert_eq!(reserve.data.scaled_supply, 80_0000000);

        user.set_collateral(reserve.index(), true);
        user.remove_supply(&e, &mut reserve, 30_0000000);
        assert_eq!(user.get_scaled_supply(reserve.index()), 50_0000000);
        assert_eq!(reserve.data.scaled_supply, 50_0000000);
        assert!(user.is_collateral(reserve.index()));

        // emptying the position clears the collateral flag and drops the entry
        user.remove_supply(&e, &mut reserve, 50_0000000);
        assert!(!user.is_collateral(reserve.index()));
        assert!(!user.positions.reserves.contains_key(reserve.index()));
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #10)")]
    fn test_remove_supply_over_balance() {
        let e = Env::default();
        let samwise = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        let mut user = User {
            address: samwise,
            positions: Positions::env_default(&e),
        };
        user.add_supply(&e, &mut reserve, 10_0000000);
        user.remove_supply(&e, &mut reserve, 10_0000001);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1204)")]
    fn test_add_supply_rounds_to_zero() {
        let e = Env::default();
        let samwise = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        reserve.data.liquidity_index = 3 * RAY;
        let mut user = User {
            address: samwise,
            positions: Positions::env_default(&e),
        };
        user.add_supply(&e, &mut reserve, 1);
    }

    #[test]
    fn test_transfer_supply() {
        let e = Env::default();
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        let mut sam = User {
            address: samwise,
            positions: Positions::env_default(&e),
        };
        let mut fro = User {
            address: frodo,
            positions: Positions::env_default(&e),
        };
        sam.add_supply(&e, &mut reserve, 10_0000000);
        sam.transfer_supply(&e, &mut fro, reserve.index(), 4_0000000);

        assert_eq!(sam.get_scaled_supply(reserve.index()), 6_0000000);
        assert_eq!(fro.get_scaled_supply(reserve.index()), 4_0000000);
        assert_eq!(reserve.data.scaled_supply, 10_0000000);
    }

    #[test]
    fn test_stable_debt_accrues_linearly() {
        let e = Env::default();
        set_time(&e, 0);
        let samwise = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        let mut user = User {
            address: samwise,
            positions: Positions::env_default(&e),
        };
        let rate = 100_000_000_000_000_000_000_000_000; // 10%
        user.add_stable_debt(&e, &mut reserve, 100_0000000, rate);
        assert_eq!(user.stable_debt(&e, &reserve), 100_0000000);
        assert_eq!(reserve.data.total_stable_debt, 100_0000000);
        assert_eq!(reserve.data.avg_stable_rate, rate);

        set_time(&e, 31536000 / 2);
        assert_eq!(user.stable_debt(&e, &reserve), 105_0000000);
    }

    #[test]
    fn test_stable_debt_reweights_rates() {
        let e = Env::default();
        set_time(&e, 0);
        let samwise = Address::generate(&e);
        let frodo = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        let mut sam = User {
            address: samwise,
            positions: Positions::env_default(&e),
        };
        let mut fro = User {
            address: frodo,
            positions: Positions::env_default(&e),
        };
        let rate_10 = 100_000_000_000_000_000_000_000_000;
        let rate_20 = 200_000_000_000_000_000_000_000_000;

        sam.add_stable_debt(&e, &mut reserve, 100_0000000, rate_10);
        sam.add_stable_debt(&e, &mut reserve, 100_0000000, rate_20);
        assert_eq!(sam.get_reserve(0).stable_rate, 150_000_000_000_000_000_000_000_000);
        assert_eq!(sam.get_reserve(0).stable_principal, 200_0000000);

        fro.add_stable_debt(&e, &mut reserve, 200_0000000, rate_20);
        assert_eq!(reserve.data.total_stable_debt, 400_0000000);
        assert_eq!(reserve.data.avg_stable_rate, 175_000_000_000_000_000_000_000_000);

        fro.remove_stable_debt(&e, &mut reserve, 200_0000000);
        assert_eq!(reserve.data.total_stable_debt, 200_0000000);
        assert_eq!(reserve.data.avg_stable_rate, 150_000_000_000_000_000_000_000_000);
        let fro_data = fro.get_reserve(0);
        assert_eq!(fro_data.stable_principal, 0);
        assert_eq!(fro_data.stable_rate, 0);
        assert_eq!(fro_data.stable_last_time, 0);

        sam.remove_stable_debt(&e, &mut reserve, 200_0000000);
        assert_eq!(reserve.data.total_stable_debt, 0);
        assert_eq!(reserve.data.avg_stable_rate, 0);
    }

    #[test]
    fn test_var_debt() {
        let e = Env::default();
        let samwise = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        reserve.data.var_borrow_index = 2 * RAY;
        let mut user = User {
            address: samwise,
            positions: Positions::env_default(&e),
        };

        user.add_var_debt(&e, &mut reserve, 100_0000000);
        assert_eq!(user.get_reserve(0).scaled_var_debt, 50_0000000);
        assert_eq!(reserve.data.scaled_var_debt, 50_0000000);
        assert!(user.positions.has_debt());

        reserve.data.var_borrow_index = 3 * RAY;
        assert_eq!(user.var_debt(&e, &reserve), 150_0000000);

        user.remove_var_debt(&e, &mut reserve, 60_0000000);
        assert_eq!(user.get_reserve(0).scaled_var_debt, 30_0000000);

        user.remove_var_debt(&e, &mut reserve, 90_0000000);
        assert_eq!(user.get_reserve(0).scaled_var_debt, 0);
        assert_eq!(reserve.data.scaled_var_debt, 0);
        assert!(!user.positions.has_debt());
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #10)")]
    fn test_remove_var_debt_over_balance() {
        let e = Env::default();
        let samwise = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        let mut user = User {
            address: samwise,
            positions: Positions::env_default(&e),
        };
        user.add_var_debt(&e, &mut reserve, 100_0000000);
        user.remove_var_debt(&e, &mut reserve, 100_0000001);
    }

    #[test]
    fn test_store_and_load() {
        let e = Env::default();
        let pool = testutils::create_pool(&e);
        let samwise = Address::generate(&e);

        let mut reserve = empty_reserve(&e);
        let mut user = User {
            address: samwise.clone(),
            positions: Positions::env_default(&e),
        };
        user.add_supply(&e, &mut reserve, 10_0000000);
        user.set_collateral(0, true);

        e.as_contract(&pool, || {
            user.store(&e);
            let loaded = User::load(&e, &samwise);
            assert_eq!(loaded.get_scaled_supply(0), 10_0000000);
            assert!(loaded.is_collateral(0));
        });
    }
}
