use crate::{
    auth::{AdminAuth, EmergencyAuth},
    pool::{
        self, AccountData, Pool as PoolState, PositionData, Positions, Reserve, User,
        UserReserveView,
    },
    storage::{self, AllowanceKey, RateStrategy, ReserveConfig, ReserveData},
    validator::NonReentrant,
};
use soroban_sdk::{contract, contractclient, contractimpl, Address, Bytes, Env, Symbol, Vec};

/// ### Pool
///
/// A money market pool. Suppliers earn interest from borrowers, who borrow against their
/// supplied collateral at either a variable or a stable rate.
#[contract]
pub struct PoolContract;

#[contractclient(name = "PoolClient")]
pub trait Pool {
    /********** Admin **********/

    /// Initialize the pool
    ///
    /// ### Arguments
    /// * `admin` - The Address for the admin
    /// * `emergency_admin` - The Address that can pause the pool
    /// * `oracle` - The contract address of the price oracle
    /// * `treasury` - The Address credited with the reserve factor of accrued interest
    /// * `flash_premium` - The premium charged on flash loans (bps)
    ///
    /// ### Panics
    /// If the pool is already initialized or the flash premium is over 100%
    fn initialize(
        e: Env,
        admin: Address,
        emergency_admin: Address,
        oracle: Address,
        treasury: Address,
        flash_premium: u32,
    );

    /// (Admin only) Set a new address as the admin of this pool
    ///
    /// ### Arguments
    /// * `new_admin` - The new admin address
    ///
    /// ### Panics
    /// If the caller is not the admin
    fn set_admin(e: Env, new_admin: Address);

    /// (Admin only) Set a new address as the emergency admin of this pool
    ///
    /// ### Arguments
    /// * `new_emergency_admin` - The new emergency admin address
    ///
    /// ### Panics
    /// If the caller is not the admin
    fn set_emergency_admin(e: Env, new_emergency_admin: Address);

    /// (Admin only) Update the pool
    ///
    /// ### Arguments
    /// * `treasury` - The new treasury address
    /// * `flash_premium` - The new flash loan premium (bps)
    ///
    /// ### Panics
    /// If the caller is not the admin
    fn update_pool(e: Env, treasury: Address, flash_premium: u32);

    /// (Admin only) Initialize a reserve in the pool
    ///
    /// Returns the index of the reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset to add as a reserve
    /// * `config` - The ReserveConfig for the reserve
    /// * `strategy` - The interest rate strategy of the reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, the reserve is already setup, or the config is invalid
    fn init_reserve(
        e: Env,
        asset: Address,
        config: ReserveConfig,
        strategy: RateStrategy,
    ) -> u32;

    /// (Admin only) Update the risk parameters of a reserve
    ///
    /// ### Arguments
    /// * `asset` - The underlying asset of the reserve
    /// * `config` - The ReserveConfig for the reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, the reserve does not exist, or the config is invalid
    fn update_reserve(e: Env, asset: Address, config: ReserveConfig);

    /// (Admin only) Replace the interest rate strategy of a reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, the reserve does not exist, or the strategy is invalid
    fn set_rate_strategy(e: Env, asset: Address, strategy: RateStrategy);

    /// (Admin only) Set the market reference rate the stable borrow rate of a reserve is
    /// based on (ray)
    ///
    /// ### Panics
    /// If the caller is not the admin or the reserve does not exist
    fn set_market_borrow_rate(e: Env, asset: Address, rate: i128);

    /// (Admin only) Activate or deactivate a reserve
    ///
    /// ### Panics
    /// If the caller is not the admin, or a reserve with liquidity is deactivated
    fn set_reserve_active(e: Env, asset: Address, active: bool);

    /// (Admin only) Freeze or unfreeze a reserve. Frozen reserves refuse deposits, borrows
    /// and swaps to stable debt.
    ///
    /// ### Panics
    /// If the caller is not the admin or the reserve does not exist
    fn set_reserve_frozen(e: Env, asset: Address, frozen: bool);

    /// (Emergency admin only) Pause or unpause the pool
    ///
    /// ### Panics
    /// If the caller is not the emergency admin
    fn set_paused(e: Env, paused: bool);

    /********** Supply **********/

    /// Deposit tokens from `from` into the pool and credit the supply to `on_behalf_of`
    ///
    /// ### Arguments
    /// * `from` - The address supplying the tokens
    /// * `asset` - The underlying asset to deposit
    /// * `amount` - The amount of underlying to deposit
    /// * `on_behalf_of` - The address credited with the supply
    ///
    /// ### Panics
    /// If the reserve does not accept deposits
    fn deposit(e: Env, from: Address, asset: Address, amount: i128, on_behalf_of: Address);

    /// Withdraw supply from the pool. Use `MAX_AMOUNT` to withdraw the full balance.
    ///
    /// Returns the amount withdrawn
    ///
    /// ### Panics
    /// If the withdrawal would leave `from` below the minimum health factor
    fn withdraw(e: Env, from: Address, asset: Address, amount: i128, to: Address) -> i128;

    /// Enable or disable a supply position as collateral
    ///
    /// ### Panics
    /// If `from` has no supply in the reserve, or disabling it leaves `from` unhealthy
    fn set_use_as_collateral(e: Env, from: Address, asset: Address, enabled: bool);

    /// Transfer supply from `from` to `to`
    ///
    /// ### Panics
    /// If the transfer would leave `from` below the minimum health factor
    fn transfer_supply(e: Env, from: Address, to: Address, asset: Address, amount: i128);

    /// Credit the treasury with the interest accrued to it by each of `assets`
    fn mint_to_treasury(e: Env, assets: Vec<Address>);

    /********** Borrow **********/

    /// Borrow tokens against the collateral of `on_behalf_of` and send them to `from`
    ///
    /// ### Arguments
    /// * `from` - The address receiving the tokens
    /// * `asset` - The underlying asset to borrow
    /// * `amount` - The amount of underlying to borrow
    /// * `rate_mode` - 1 for stable debt, 2 for variable debt
    /// * `on_behalf_of` - The address taking on the debt. Requires a delegated allowance
    ///                    if it is not `from`.
    ///
    /// ### Panics
    /// If the borrow is not allowed or not supported by the collateral of `on_behalf_of`
    fn borrow(
        e: Env,
        from: Address,
        asset: Address,
        amount: i128,
        rate_mode: u32,
        on_behalf_of: Address,
    );

    /// Repay debt of `on_behalf_of` with tokens from `from`. Use `MAX_AMOUNT` to repay your
    /// full debt.
    ///
    /// Returns the amount repaid
    fn repay(
        e: Env,
        from: Address,
        asset: Address,
        amount: i128,
        rate_mode: u32,
        on_behalf_of: Address,
    ) -> i128;

    /// Swap the debt `from` holds of `rate_mode` into the other debt type
    fn swap_borrow_rate_mode(e: Env, from: Address, asset: Address, rate_mode: u32);

    /// Reset the stable rate of a user's debt to the current stable rate of the reserve
    ///
    /// ### Panics
    /// If the position does not meet a rebalance condition
    fn rebalance_stable_borrow_rate(e: Env, asset: Address, user: Address);

    /// Allow `delegatee` to borrow up to `amount` of `rate_mode` debt against the collateral
    /// of `delegator`
    fn approve_delegation(
        e: Env,
        delegator: Address,
        delegatee: Address,
        asset: Address,
        rate_mode: u32,
        amount: i128,
    );

    /// Lend tokens to `receiver` for the duration of its `exec_op` callback
    ///
    /// ### Arguments
    /// * `caller` - The address initiating the flash loan
    /// * `receiver` - The contract receiving the tokens
    /// * `assets` - The underlying assets to lend
    /// * `amounts` - The amount of each asset to lend
    /// * `modes` - 0 to repay within the call, 1 or 2 to keep the tokens as stable or
    ///             variable debt of `on_behalf_of`
    /// * `on_behalf_of` - The address taking on the debt legs
    /// * `params` - Passed through to the receiver
    ///
    /// ### Panics
    /// If a leg is not repaid or the debt legs are not supported by the collateral of
    /// `on_behalf_of`
    #[allow(clippy::too_many_arguments)]
    fn flash_loan(
        e: Env,
        caller: Address,
        receiver: Address,
        assets: Vec<Address>,
        amounts: Vec<i128>,
        modes: Vec<u32>,
        on_behalf_of: Address,
        params: Bytes,
    );

    /// Liquidate an unhealthy position by covering its debt in `debt_asset` in exchange for
    /// its collateral in `collateral_asset` plus a bonus
    ///
    /// Returns the (debt covered, collateral seized)
    ///
    /// ### Arguments
    /// * `receive_a_token` - If the liquidator receives supply instead of the underlying
    ///
    /// ### Panics
    /// If the user is healthy
    fn liquidation_call(
        e: Env,
        liquidator: Address,
        collateral_asset: Address,
        debt_asset: Address,
        user: Address,
        debt_to_cover: i128,
        receive_a_token: bool,
    ) -> (i128, i128);

    /********** Views **********/

    /// Fetch the borrow allowance `delegator` granted `delegatee`
    fn get_borrow_allowance(
        e: Env,
        delegator: Address,
        delegatee: Address,
        asset: Address,
        rate_mode: u32,
    ) -> i128;

    /// Fetch the reserve data, accrued to the current ledger timestamp
    fn get_reserve_data(e: Env, asset: Address) -> ReserveData;

    /// Fetch the reserve config
    fn get_reserve_config(e: Env, asset: Address) -> ReserveConfig;

    /// Fetch the interest rate strategy of a reserve
    fn get_rate_strategy(e: Env, asset: Address) -> RateStrategy;

    /// Fetch the underlying assets of the reserves, in reserve index order
    fn get_reserve_list(e: Env) -> Vec<Address>;

    /// Fetch a summary of a user's account, denominated in the oracle's base asset
    fn get_user_account_data(e: Env, user: Address) -> AccountData;

    /// Fetch a user's balances in a reserve
    fn get_user_reserve_data(e: Env, asset: Address, user: Address) -> UserReserveView;

    /// Fetch the positions for an address
    fn get_positions(e: Env, address: Address) -> Positions;

    /// Calculate the interest rates of a reserve for the given balances
    ///
    /// Returns (liquidity rate, stable borrow rate, variable borrow rate), all rays
    fn calculate_interest_rates(
        e: Env,
        asset: Address,
        available_liquidity: i128,
        total_stable_debt: i128,
        total_var_debt: i128,
        avg_stable_rate: i128,
        reserve_factor: u32,
    ) -> (i128, i128, i128);
}

#[contractimpl]
impl Pool for PoolContract {
    fn initialize(
        e: Env,
        admin: Address,
        emergency_admin: Address,
        oracle: Address,
        treasury: Address,
        flash_premium: u32,
    ) {
        storage::extend_instance(&e);

        pool::execute_initialize(
            &e,
            &admin,
            &emergency_admin,
            &oracle,
            &treasury,
            flash_premium,
        );
    }

    fn set_admin(e: Env, new_admin: Address) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);
        new_admin.require_auth();

        storage::set_admin(&e, &new_admin);

        e.events().publish(
            (Symbol::new(&e, "set_admin"), auth.address().clone()),
            new_admin,
        );
    }

    fn set_emergency_admin(e: Env, new_emergency_admin: Address) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        storage::set_emergency_admin(&e, &new_emergency_admin);

        e.events().publish(
            (
                Symbol::new(&e, "set_emergency_admin"),
                auth.address().clone(),
            ),
            new_emergency_admin,
        );
    }

    fn update_pool(e: Env, treasury: Address, flash_premium: u32) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        pool::execute_update_pool(&e, &auth, &treasury, flash_premium);

        e.events().publish(
            (Symbol::new(&e, "update_pool"), auth.address().clone()),
            (treasury, flash_premium),
        );
    }

    fn init_reserve(
        e: Env,
        asset: Address,
        config: ReserveConfig,
        strategy: RateStrategy,
    ) -> u32 {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        let index = pool::execute_init_reserve(&e, &auth, &asset, &config, &strategy);

        e.events().publish(
            (Symbol::new(&e, "init_reserve"), auth.address().clone()),
            (asset, index),
        );
        index
    }

    fn update_reserve(e: Env, asset: Address, config: ReserveConfig) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        pool::execute_update_reserve(&e, &auth, &asset, &config);

        e.events().publish(
            (Symbol::new(&e, "update_reserve"), auth.address().clone()),
            asset,
        );
    }

    fn set_rate_strategy(e: Env, asset: Address, strategy: RateStrategy) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        pool::execute_set_rate_strategy(&e, &auth, &asset, &strategy);

        e.events().publish(
            (Symbol::new(&e, "set_rate_strategy"), auth.address().clone()),
            asset,
        );
    }

    fn set_market_borrow_rate(e: Env, asset: Address, rate: i128) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        pool::execute_set_market_rate(&e, &auth, &asset, rate);

        e.events().publish(
            (Symbol::new(&e, "set_market_rate"), auth.address().clone()),
            (asset, rate),
        );
    }

    fn set_reserve_active(e: Env, asset: Address, active: bool) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        pool::execute_set_reserve_active(&e, &auth, &asset, active);

        e.events().publish(
            (Symbol::new(&e, "set_reserve_active"), auth.address().clone()),
            (asset, active),
        );
    }

    fn set_reserve_frozen(e: Env, asset: Address, frozen: bool) {
        storage::extend_instance(&e);
        let auth = AdminAuth::require(&e);

        pool::execute_set_reserve_frozen(&e, &auth, &asset, frozen);

        e.events().publish(
            (Symbol::new(&e, "set_reserve_frozen"), auth.address().clone()),
            (asset, frozen),
        );
    }

    fn set_paused(e: Env, paused: bool) {
        storage::extend_instance(&e);
        let auth = EmergencyAuth::require(&e);

        pool::execute_set_paused(&e, &auth, paused);

        e.events().publish(
            (Symbol::new(&e, "set_paused"), auth.address().clone()),
            paused,
        );
    }

    fn deposit(e: Env, from: Address, asset: Address, amount: i128, on_behalf_of: Address) {
        storage::extend_instance(&e);
        from.require_auth();
        let guard = NonReentrant::enter(&e);

        let scaled = pool::execute_deposit(&e, &from, &asset, amount, &on_behalf_of);

        guard.exit(&e);
        e.events().publish(
            (Symbol::new(&e, "deposit"), asset, on_behalf_of),
            (from, amount, scaled),
        );
    }

    fn withdraw(e: Env, from: Address, asset: Address, amount: i128, to: Address) -> i128 {
        storage::extend_instance(&e);
        from.require_auth();
        let guard = NonReentrant::enter(&e);

        let withdrawn = pool::execute_withdraw(&e, &from, &asset, amount, &to);

        guard.exit(&e);
        e.events()
            .publish((Symbol::new(&e, "withdraw"), asset, from), (to, withdrawn));
        withdrawn
    }

    fn set_use_as_collateral(e: Env, from: Address, asset: Address, enabled: bool) {
        storage::extend_instance(&e);
        from.require_auth();
        let guard = NonReentrant::enter(&e);

        pool::execute_set_collateral(&e, &from, &asset, enabled);

        guard.exit(&e);
        let topic = if enabled {
            Symbol::new(&e, "collateral_on")
        } else {
            Symbol::new(&e, "collateral_off")
        };
        e.events().publish((topic, asset, from), ());
    }

    fn transfer_supply(e: Env, from: Address, to: Address, asset: Address, amount: i128) {
        storage::extend_instance(&e);
        from.require_auth();
        let guard = NonReentrant::enter(&e);

        let scaled = pool::execute_transfer_supply(&e, &from, &to, &asset, amount);

        guard.exit(&e);
        e.events().publish(
            (Symbol::new(&e, "transfer_supply"), asset, from),
            (to, amount, scaled),
        );
    }

    fn mint_to_treasury(e: Env, assets: Vec<Address>) {
        storage::extend_instance(&e);
        let guard = NonReentrant::enter(&e);

        let minted = pool::execute_mint_to_treasury(&e, &assets);

        guard.exit(&e);
        e.events()
            .publish((Symbol::new(&e, "mint_to_treasury"),), (assets, minted));
    }

    fn borrow(
        e: Env,
        from: Address,
        asset: Address,
        amount: i128,
        rate_mode: u32,
        on_behalf_of: Address,
    ) {
        storage::extend_instance(&e);
        from.require_auth();
        let guard = NonReentrant::enter(&e);

        pool::execute_borrow(&e, &from, &asset, amount, rate_mode, &on_behalf_of);

        guard.exit(&e);
        e.events().publish(
            (Symbol::new(&e, "borrow"), asset, on_behalf_of),
            (from, amount, rate_mode),
        );
    }

    fn repay(
        e: Env,
        from: Address,
        asset: Address,
        amount: i128,
        rate_mode: u32,
        on_behalf_of: Address,
    ) -> i128 {
        storage::extend_instance(&e);
        from.require_auth();
        let guard = NonReentrant::enter(&e);

        let repaid = pool::execute_repay(&e, &from, &asset, amount, rate_mode, &on_behalf_of);

        guard.exit(&e);
        e.events().publish(
            (Symbol::new(&e, "repay"), asset, on_behalf_of),
            (from, repaid, rate_mode),
        );
        repaid
    }

    fn swap_borrow_rate_mode(e: Env, from: Address, asset: Address, rate_mode: u32) {
        storage::extend_instance(&e);
        from.require_auth();
        let guard = NonReentrant::enter(&e);

        pool::execute_swap_borrow_rate_mode(&e, &from, &asset, rate_mode);

        guard.exit(&e);
        e.events()
            .publish((Symbol::new(&e, "swap_rate_mode"), asset, from), rate_mode);
    }

    fn rebalance_stable_borrow_rate(e: Env, asset: Address, user: Address) {
        storage::extend_instance(&e);
        let guard = NonReentrant::enter(&e);

        pool::execute_rebalance(&e, &asset, &user);

        guard.exit(&e);
        e.events()
            .publish((Symbol::new(&e, "rebalance"), asset, user), ());
    }

    fn approve_delegation(
        e: Env,
        delegator: Address,
        delegatee: Address,
        asset: Address,
        rate_mode: u32,
        amount: i128,
    ) {
        storage::extend_instance(&e);
        delegator.require_auth();

        pool::execute_approve_delegation(&e, &delegator, &delegatee, &asset, rate_mode, amount);

        e.events().publish(
            (Symbol::new(&e, "approve_delegation"), asset, delegator),
            (delegatee, rate_mode, amount),
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn flash_loan(
        e: Env,
        caller: Address,
        receiver: Address,
        assets: Vec<Address>,
        amounts: Vec<i128>,
        modes: Vec<u32>,
        on_behalf_of: Address,
        params: Bytes,
    ) {
        storage::extend_instance(&e);
        caller.require_auth();
        let guard = NonReentrant::enter(&e);

        let premiums = pool::execute_flash_loan(
            &e,
            &caller,
            &receiver,
            &assets,
            &amounts,
            &modes,
            &on_behalf_of,
            &params,
        );

        guard.exit(&e);
        for i in 0..assets.len() {
            e.events().publish(
                (
                    Symbol::new(&e, "flash_loan"),
                    assets.get_unchecked(i),
                    caller.clone(),
                ),
                (
                    receiver.clone(),
                    amounts.get_unchecked(i),
                    modes.get_unchecked(i),
                    premiums.get_unchecked(i),
                ),
            );
        }
    }

    fn liquidation_call(
        e: Env,
        liquidator: Address,
        collateral_asset: Address,
        debt_asset: Address,
        user: Address,
        debt_to_cover: i128,
        receive_a_token: bool,
    ) -> (i128, i128) {
        storage::extend_instance(&e);
        liquidator.require_auth();
        let guard = NonReentrant::enter(&e);

        let (debt_covered, collateral_seized) = pool::execute_liquidation(
            &e,
            &liquidator,
            &collateral_asset,
            &debt_asset,
            &user,
            debt_to_cover,
            receive_a_token,
        );

        guard.exit(&e);
        e.events().publish(
            (Symbol::new(&e, "liquidation"), user, liquidator),
            (
                collateral_asset,
                debt_asset,
                debt_covered,
                collateral_seized,
                receive_a_token,
            ),
        );
        (debt_covered, collateral_seized)
    }

    fn get_borrow_allowance(
        e: Env,
        delegator: Address,
        delegatee: Address,
        asset: Address,
        rate_mode: u32,
    ) -> i128 {
        storage::get_allowance(
            &e,
            &AllowanceKey {
                delegator,
                delegatee,
                asset,
                rate_mode,
            },
        )
    }

    fn get_reserve_data(e: Env, asset: Address) -> ReserveData {
        Reserve::load(&e, &asset).data
    }

    fn get_reserve_config(e: Env, asset: Address) -> ReserveConfig {
        storage::get_res_config(&e, &asset)
    }

    fn get_rate_strategy(e: Env, asset: Address) -> RateStrategy {
        storage::get_res_strategy(&e, &asset)
    }

    fn get_reserve_list(e: Env) -> Vec<Address> {
        storage::get_res_list(&e)
    }

    fn get_user_account_data(e: Env, user: Address) -> AccountData {
        let mut pool = PoolState::load(&e);
        let positions = storage::get_user_positions(&e, &user);
        PositionData::calculate_from_positions(&e, &mut pool, &positions).to_account_data(&e)
    }

    fn get_user_reserve_data(e: Env, asset: Address, user: Address) -> UserReserveView {
        let reserve = Reserve::load(&e, &asset);
        User::load(&e, &user).view(&e, &reserve)
    }

    fn get_positions(e: Env, address: Address) -> Positions {
        storage::get_user_positions(&e, &address)
    }

    fn calculate_interest_rates(
        e: Env,
        asset: Address,
        available_liquidity: i128,
        total_stable_debt: i128,
        total_var_debt: i128,
        avg_stable_rate: i128,
        reserve_factor: u32,
    ) -> (i128, i128, i128) {
        pool::calc_interest_rates(
            &e,
            &storage::get_res_strategy(&e, &asset),
            storage::get_market_rate(&e, &asset),
            available_liquidity,
            total_stable_debt,
            total_var_debt,
            avg_stable_rate,
            reserve_factor,
        )
    }
}
