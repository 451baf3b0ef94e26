use soroban_sdk::{
    contracttype, unwrap::UnwrapOptimized, vec, Address, Env, IntoVal, Symbol, TryFromVal, Val,
    Vec,
};

use crate::pool::Positions;

pub(crate) const LEDGER_THRESHOLD_SHARED: u32 = 172800; // ~ 10 days
pub(crate) const LEDGER_BUMP_SHARED: u32 = 241920; // ~ 14 days

pub(crate) const LEDGER_THRESHOLD_USER: u32 = 518400; // ~ 30 days
pub(crate) const LEDGER_BUMP_USER: u32 = 535670; // ~ 31 days

/********** Storage Types **********/

/// The pool's config
#[derive(Clone)]
#[contracttype]
pub struct PoolConfig {
    pub oracle: Address,
    pub treasury: Address, // the address credited with the reserve factor cut
    pub flash_premium: u32, // the flash loan premium in basis points
    pub paused: bool,
}

/// The risk configuration of a reserve asset. Percentages are expressed in basis points.
#[derive(Clone)]
#[contracttype]
pub struct ReserveConfig {
    pub index: u32,          // the index of the reserve in the list
    pub decimals: u32,       // the decimals used by the underlying asset
    pub ltv: u32,            // the max loan to value of the collateral
    pub liq_threshold: u32,  // the collateral value ratio at which a position is liquidatable
    pub liq_bonus: u32,      // the multiplier applied to seized collateral (10500 = 5% bonus)
    pub reserve_factor: u32, // the share of accrued interest sent to the treasury
    pub borrowing_enabled: bool,
    pub stable_borrowing_enabled: bool,
    pub collateral_enabled: bool,
    pub active: bool,
    pub frozen: bool,
}

/// The interest rate strategy of a reserve. All values are expressed in rays.
#[derive(Clone)]
#[contracttype]
pub struct RateStrategy {
    pub optimal_util: i128,   // the utilization at the kink of the curve
    pub base_rate: i128,      // the variable rate at 0% utilization
    pub var_slope_1: i128,    // the variable rate increase from 0% to optimal utilization
    pub var_slope_2: i128,    // the variable rate increase from optimal to 100% utilization
    pub stable_slope_1: i128, // the stable rate increase from 0% to optimal utilization
    pub stable_slope_2: i128, // the stable rate increase from optimal to 100% utilization
}

/// The accounting state of a reserve asset
#[derive(Clone)]
#[contracttype]
pub struct ReserveData {
    pub liquidity_index: i128,     // the cumulated supply interest (ray)
    pub var_borrow_index: i128,    // the cumulated variable borrow interest (ray)
    pub liquidity_rate: i128,      // the current supply rate (ray)
    pub var_borrow_rate: i128,     // the current variable borrow rate (ray)
    pub stable_borrow_rate: i128,  // the rate a new stable loan is opened at (ray)
    pub avg_stable_rate: i128,     // the weighted average rate of all stable loans (ray)
    pub available_liquidity: i128, // the underlying held by the pool for this reserve
    pub total_stable_debt: i128,   // the stable debt of the reserve, accrued to last_time
    pub scaled_var_debt: i128,     // the sum of all scaled variable debt balances
    pub scaled_supply: i128,       // the sum of all scaled supply balances
    pub accrued_to_treasury: i128, // scaled supply owed to the treasury and not yet credited
    pub last_time: u64,            // the last time the data was updated
}

/********** Storage Key Types **********/

const ADMIN_KEY: &str = "Admin";
const EMERGENCY_ADMIN_KEY: &str = "EmergAdmin";
const POOL_CONFIG_KEY: &str = "Config";
const RES_LIST_KEY: &str = "ResList";
const LOCK_KEY: &str = "Lock";

#[derive(Clone)]
#[contracttype]
pub struct AllowanceKey {
    pub delegator: Address, // the address taking on the debt
    pub delegatee: Address, // the address allowed to borrow against the delegator
    pub asset: Address,
    pub rate_mode: u32,
}

#[derive(Clone)]
#[contracttype]
pub enum PoolDataKey {
    // A map of underlying asset's contract address to reserve config
    ResConfig(Address),
    // A map of underlying asset's contract address to reserve data
    ResData(Address),
    // A map of underlying asset's contract address to rate strategy
    ResStrategy(Address),
    // The market reference stable borrow rate of a reserve
    MarketRate(Address),
    // Map of positions in the pool for a user
    Positions(Address),
    // A credit delegation allowance
    Allowance(AllowanceKey),
}

/********** Storage **********/

/// Bump the instance rent for the contract
pub fn extend_instance(e: &Env) {
    e.storage()
        .instance()
        .extend_ttl(LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/// Fetch an entry in persistent storage that has a default value if it doesn't exist
fn get_persistent_default<K: IntoVal<Env, Val>, V: TryFromVal<Env, Val>>(
    e: &Env,
    key: &K,
    default: V,
    bump_threshold: u32,
    bump_amount: u32,
) -> V {
    if let Some(result) = e.storage().persistent().get::<K, V>(key) {
        e.storage()
            .persistent()
            .extend_ttl(key, bump_threshold, bump_amount);
        result
    } else {
        default
    }
}

/********** User **********/

/// Fetch the user's positions or return an empty Positions struct
///
/// ### Arguments
/// * `user` - The address of the user
pub fn get_user_positions(e: &Env, user: &Address) -> Positions {
    let key = PoolDataKey::Positions(user.clone());
    get_persistent_default(
        e,
        &key,
        Positions::env_default(e),
        LEDGER_THRESHOLD_USER,
        LEDGER_BUMP_USER,
    )
}

/// Set the user's positions
///
/// ### Arguments
/// * `user` - The address of the user
/// * `positions` - The new positions for the user
pub fn set_user_positions(e: &Env, user: &Address, positions: &Positions) {
    let key = PoolDataKey::Positions(user.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, Positions>(&key, positions);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}

/********** Admin **********/

// Fetch the current admin Address
///
/// ### Panics
/// If the admin does not exist
pub fn get_admin(e: &Env) -> Address {
    e.storage()
        .instance()
        .get(&Symbol::new(e, ADMIN_KEY))
        .unwrap_optimized()
}

/// Set a new admin
///
/// ### Arguments
/// * `new_admin` - The Address for the admin
pub fn set_admin(e: &Env, new_admin: &Address) {
    e.storage()
        .instance()
        .set::<Symbol, Address>(&Symbol::new(e, ADMIN_KEY), new_admin);
}

/// Checks if an admin is set
pub fn has_admin(e: &Env) -> bool {
    e.storage().instance().has(&Symbol::new(e, ADMIN_KEY))
}

/// Fetch the current emergency admin Address
///
/// ### Panics
/// If the emergency admin does not exist
pub fn get_emergency_admin(e: &Env) -> Address {
    e.storage()
        .instance()
        .get(&Symbol::new(e, EMERGENCY_ADMIN_KEY))
        .unwrap_optimized()
}

/// Set a new emergency admin
///
/// ### Arguments
/// * `new_admin` - The Address for the emergency admin
pub fn set_emergency_admin(e: &Env, new_admin: &Address) {
    e.storage()
        .instance()
        .set::<Symbol, Address>(&Symbol::new(e, EMERGENCY_ADMIN_KEY), new_admin);
}

/********** Reentrancy Lock **********/

/// Check if an action is currently executing
pub fn is_locked(e: &Env) -> bool {
    e.storage()
        .instance()
        .get::<Symbol, bool>(&Symbol::new(e, LOCK_KEY))
        .unwrap_or(false)
}

/// Set or clear the executing flag
pub fn set_locked(e: &Env, locked: bool) {
    e.storage()
        .instance()
        .set::<Symbol, bool>(&Symbol::new(e, LOCK_KEY), &locked);
}

/********** Pool Config **********/

/// Fetch the pool configuration
///
/// ### Panics
/// If the pool's config is not set
pub fn get_pool_config(e: &Env) -> PoolConfig {
    e.storage()
        .instance()
        .get(&Symbol::new(e, POOL_CONFIG_KEY))
        .unwrap_optimized()
}

/// Set the pool configuration
///
/// ### Arguments
/// * `config` - The pool configuration
pub fn set_pool_config(e: &Env, config: &PoolConfig) {
    e.storage()
        .instance()
        .set::<Symbol, PoolConfig>(&Symbol::new(e, POOL_CONFIG_KEY), config);
}

/********** Reserve Config (ResConfig) **********/

/// Fetch the reserve config for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the reserve does not exist
pub fn get_res_config(e: &Env, asset: &Address) -> ReserveConfig {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
    e.storage()
        .persistent()
        .get::<PoolDataKey, ReserveConfig>(&key)
        .unwrap_optimized()
}

/// Set the reserve configuration for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `config` - The reserve configuration for the asset
pub fn set_res_config(e: &Env, asset: &Address, config: &ReserveConfig) {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, ReserveConfig>(&key, config);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/// Checks if a reserve exists for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
pub fn has_res(e: &Env, asset: &Address) -> bool {
    let key = PoolDataKey::ResConfig(asset.clone());
    e.storage().persistent().has(&key)
}

/********** Reserve Data (ResData) **********/

/// Fetch the reserve data for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the reserve does not exist
pub fn get_res_data(e: &Env, asset: &Address) -> ReserveData {
    let key = PoolDataKey::ResData(asset.clone());
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
    e.storage()
        .persistent()
        .get::<PoolDataKey, ReserveData>(&key)
        .unwrap_optimized()
}

/// Set the reserve data for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `data` - The reserve data for the asset
pub fn set_res_data(e: &Env, asset: &Address, data: &ReserveData) {
    let key = PoolDataKey::ResData(asset.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, ReserveData>(&key, data);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/********** Reserve Strategy (ResStrategy) **********/

/// Fetch the interest rate strategy for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
///
/// ### Panics
/// If the reserve does not exist
pub fn get_res_strategy(e: &Env, asset: &Address) -> RateStrategy {
    let key = PoolDataKey::ResStrategy(asset.clone());
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
    e.storage()
        .persistent()
        .get::<PoolDataKey, RateStrategy>(&key)
        .unwrap_optimized()
}

/// Set the interest rate strategy for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `strategy` - The interest rate strategy for the asset
pub fn set_res_strategy(e: &Env, asset: &Address, strategy: &RateStrategy) {
    let key = PoolDataKey::ResStrategy(asset.clone());
    e.storage()
        .persistent()
        .set::<PoolDataKey, RateStrategy>(&key, strategy);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/********** Market Rate **********/

/// Fetch the market reference stable borrow rate for an asset, or zero if unset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
pub fn get_market_rate(e: &Env, asset: &Address) -> i128 {
    get_persistent_default(
        e,
        &PoolDataKey::MarketRate(asset.clone()),
        0,
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    )
}

/// Set the market reference stable borrow rate for an asset
///
/// ### Arguments
/// * `asset` - The contract address of the asset
/// * `rate` - The rate, expressed in rays
pub fn set_market_rate(e: &Env, asset: &Address, rate: &i128) {
    let key = PoolDataKey::MarketRate(asset.clone());
    e.storage().persistent().set::<PoolDataKey, i128>(&key, rate);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_SHARED, LEDGER_BUMP_SHARED);
}

/********** Reserve List (ResList) **********/

/// Fetch the list of reserves
pub fn get_res_list(e: &Env) -> Vec<Address> {
    get_persistent_default(
        e,
        &Symbol::new(e, RES_LIST_KEY),
        vec![e],
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    )
}

/// Add a reserve to the back of the list and returns the index
///
/// ### Arguments
/// * `asset` - The contract address of the underlying asset
///
// @dev: Once added it can't be removed
pub fn push_res_list(e: &Env, asset: &Address) -> u32 {
    let mut res_list = get_res_list(e);
    res_list.push_back(asset.clone());
    let new_index = res_list.len() - 1;
    e.storage()
        .persistent()
        .set::<Symbol, Vec<Address>>(&Symbol::new(e, RES_LIST_KEY), &res_list);
    e.storage().persistent().extend_ttl(
        &Symbol::new(e, RES_LIST_KEY),
        LEDGER_THRESHOLD_SHARED,
        LEDGER_BUMP_SHARED,
    );
    new_index
}

/********** Credit Delegation **********/

/// Fetch the borrow allowance a delegator granted a delegatee
///
/// ### Arguments
/// * `key` - The delegator, delegatee, asset and rate mode of the allowance
pub fn get_allowance(e: &Env, key: &AllowanceKey) -> i128 {
    get_persistent_default(
        e,
        &PoolDataKey::Allowance(key.clone()),
        0,
        LEDGER_THRESHOLD_USER,
        LEDGER_BUMP_USER,
    )
}

/// Set the borrow allowance a delegator granted a delegatee
///
/// ### Arguments
/// * `key` - The delegator, delegatee, asset and rate mode of the allowance
/// * `amount` - The amount of underlying the delegatee can borrow
pub fn set_allowance(e: &Env, key: &AllowanceKey, amount: &i128) {
    let key = PoolDataKey::Allowance(key.clone());
    if *amount == 0 {
        e.storage().persistent().remove(&key);
        return;
    }
    e.storage().persistent().set::<PoolDataKey, i128>(&key, amount);
    e.storage()
        .persistent()
        .extend_ttl(&key, LEDGER_THRESHOLD_USER, LEDGER_BUMP_USER);
}
