#![cfg(test)]

use crate::{
    constants::RAY,
    pool::Reserve,
    storage::{self, PoolConfig, RateStrategy, ReserveConfig, ReserveData},
    PoolContract,
};
use sep_40_oracle::testutils::{Asset, MockPriceOracleClient, MockPriceOracleWASM};
use sep_41_token::testutils::{MockTokenClient, MockTokenWASM};
use soroban_sdk::{testutils::Address as _, Address, Env, IntoVal, Symbol, Vec};

pub(crate) fn create_pool(e: &Env) -> Address {
    e.register_contract(None, PoolContract {})
}

//************************************************
//           External Contract Helpers
//************************************************

// ***** Token *****

pub(crate) fn create_token_contract<'a>(
    e: &Env,
    admin: &Address,
) -> (Address, MockTokenClient<'a>) {
    let contract_address = Address::generate(e);
    e.register_contract_wasm(&contract_address, MockTokenWASM);
    let client = MockTokenClient::new(e, &contract_address);
    client.initialize(admin, &7, &"unit".into_val(e), &"test".into_val(e));
    (contract_address, client)
}

//***** Oracle ******

pub(crate) fn create_mock_oracle(e: &Env) -> (Address, MockPriceOracleClient) {
    let contract_address = e.register_contract_wasm(None, MockPriceOracleWASM);
    (
        contract_address.clone(),
        MockPriceOracleClient::new(e, &contract_address),
    )
}

/// Deploy an oracle pricing `assets` at `prices` (7 decimals) as of the current ledger and
/// set it as the pool's oracle. The pool config must already exist.
pub(crate) fn setup_oracle<'a>(
    e: &Env,
    pool_address: &Address,
    admin: &Address,
    assets: &Vec<Address>,
    prices: &Vec<i128>,
) -> MockPriceOracleClient<'a> {
    let oracle = e.register_contract_wasm(None, MockPriceOracleWASM);
    let oracle_client = MockPriceOracleClient::new(e, &oracle);
    let mut oracle_assets = Vec::new(e);
    for asset in assets.iter() {
        oracle_assets.push_back(Asset::Stellar(asset));
    }
    oracle_client.set_data(
        admin,
        &Asset::Other(Symbol::new(e, "USD")),
        &oracle_assets,
        &7,
        &300,
    );
    oracle_client.set_price(prices, &e.ledger().timestamp());
    e.as_contract(pool_address, || {
        let mut pool_config = storage::get_pool_config(e);
        pool_config.oracle = oracle;
        storage::set_pool_config(e, &pool_config);
    });
    oracle_client
}

//************************************************
//            Object Creation Helpers
//************************************************

//***** Pool *****

pub(crate) fn default_pool_config(e: &Env, oracle: &Address) -> PoolConfig {
    PoolConfig {
        oracle: oracle.clone(),
        treasury: Address::generate(e),
        flash_premium: 9,
        paused: false,
    }
}

/// Set the pool config with a placeholder oracle. Use `setup_oracle` to price assets.
pub(crate) fn setup_pool_config(e: &Env, pool_address: &Address, treasury: &Address) {
    let mut pool_config = default_pool_config(e, &Address::generate(e));
    pool_config.treasury = treasury.clone();
    e.as_contract(pool_address, || {
        storage::set_pool_config(e, &pool_config);
    });
}

//***** Reserve *****

pub(crate) fn default_reserve_config() -> ReserveConfig {
    ReserveConfig {
        index: 0,
        decimals: 7,
        ltv: 7500,
        liq_threshold: 8000,
        liq_bonus: 10500,
        reserve_factor: 1000,
        borrowing_enabled: true,
        stable_borrowing_enabled: true,
        collateral_enabled: true,
        active: true,
        frozen: false,
    }
}

pub(crate) fn default_strategy() -> RateStrategy {
    RateStrategy {
        optimal_util: 800_000_000_000_000_000_000_000_000,
        base_rate: 0,
        var_slope_1: 40_000_000_000_000_000_000_000_000,
        var_slope_2: 750_000_000_000_000_000_000_000_000,
        stable_slope_1: 20_000_000_000_000_000_000_000_000,
        stable_slope_2: 600_000_000_000_000_000_000_000_000,
    }
}

/// 100 supplied, 50 variable and 25 stable debt, 25 available
pub(crate) fn default_reserve_data() -> ReserveData {
    ReserveData {
        liquidity_index: RAY,
        var_borrow_index: RAY,
        liquidity_rate: 30_000_000_000_000_000_000_000_000,
        var_borrow_rate: 40_000_000_000_000_000_000_000_000,
        stable_borrow_rate: 60_000_000_000_000_000_000_000_000,
        avg_stable_rate: 50_000_000_000_000_000_000_000_000,
        available_liquidity: 25_0000000,
        total_stable_debt: 25_0000000,
        scaled_var_debt: 50_0000000,
        scaled_supply: 100_0000000,
        accrued_to_treasury: 0,
        last_time: 0,
    }
}

pub(crate) fn default_reserve(e: &Env) -> Reserve {
    Reserve {
        asset: Address::generate(e),
        config: default_reserve_config(),
        strategy: default_strategy(),
        data: default_reserve_data(),
        market_rate: 0,
        scalar: 1_0000000,
    }
}

/// Create a reserve based on the supplied config, strategy and data.
///
/// Mints the reserve's available liquidity of the underlying to the pool.
pub(crate) fn create_reserve(
    e: &Env,
    pool_address: &Address,
    token_address: &Address,
    reserve_config: &ReserveConfig,
    strategy: &RateStrategy,
    reserve_data: &ReserveData,
) {
    let mut new_reserve_config = reserve_config.clone();
    e.as_contract(pool_address, || {
        let index = storage::push_res_list(e, token_address);
        new_reserve_config.index = index;
        storage::set_res_config(e, token_address, &new_reserve_config);
        storage::set_res_strategy(e, token_address, strategy);
        storage::set_res_data(e, token_address, reserve_data);
    });
    if reserve_data.available_liquidity > 0 {
        MockTokenClient::new(e, token_address)
            .mock_all_auths()
            .mint(pool_address, &reserve_data.available_liquidity);
    }
}

/// Create a new token and list it as a reserve with the default config, strategy and data,
/// accrued up to the current ledger timestamp
pub(crate) fn create_reserve_at_time<'a>(
    e: &Env,
    pool_address: &Address,
    admin: &Address,
) -> (Address, MockTokenClient<'a>) {
    let (underlying, underlying_client) = create_token_contract(e, admin);
    let mut reserve_data = default_reserve_data();
    reserve_data.last_time = e.ledger().timestamp();
    create_reserve(
        e,
        pool_address,
        &underlying,
        &default_reserve_config(),
        &default_strategy(),
        &reserve_data,
    );
    (underlying, underlying_client)
}
