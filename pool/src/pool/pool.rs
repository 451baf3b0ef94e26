use soroban_sdk::{map, panic_with_error, vec, Address, Env, Map, Vec};

use sep_40_oracle::{Asset, PriceFeedClient};

use crate::{
    constants::MAX_PRICE_AGE,
    errors::PoolError,
    storage::{self, PoolConfig},
};

use super::{reserve::Reserve, status::Action};

pub struct Pool {
    pub config: PoolConfig,
    pub reserves: Map<Address, Reserve>,
    reserves_to_store: Vec<Address>,
    prices: Map<Address, i128>,
}

impl Pool {
    /// Load the Pool from the ledger
    pub fn load(e: &Env) -> Self {
        let pool_config = storage::get_pool_config(e);
        Pool {
            config: pool_config,
            reserves: map![e],
            reserves_to_store: vec![e],
            prices: map![e],
        }
    }

    /// Load a Reserve from the ledger and accrue it to the current ledger timestamp. Returns
    /// a cached version if it exists.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    pub fn load_reserve(&self, e: &Env, asset: &Address) -> Reserve {
        if let Some(reserve) = self.reserves.get(asset.clone()) {
            return reserve;
        }
        Reserve::load(e, asset)
    }

    /// Cache the updated reserve in the pool.
    ///
    /// ### Arguments
    /// * reserve - The updated reserve
    /// * write - If the reserve needs to be written to the ledger
    pub fn cache_reserve(&mut self, reserve: Reserve, write: bool) {
        if !self.reserves_to_store.contains(&reserve.asset) && write {
            self.reserves_to_store.push_back(reserve.asset.clone());
        }
        self.reserves.set(reserve.asset.clone(), reserve);
    }

    /// Reprice and store the cached reserves that need to be written to the ledger
    pub fn store_cached_reserves(&mut self, e: &Env) {
        for address in self.reserves_to_store.iter() {
            let mut reserve = self.reserves.get_unchecked(address.clone());
            reserve.update_rates(e);
            reserve.store(e);
            self.reserves.set(address, reserve);
        }
    }

    /// Require that the action is allowed by the pool and reserve status, or panic.
    ///
    /// ### Arguments
    /// * `reserve` - The reserve the action is performed on
    /// * `action` - The action being performed
    pub fn require_action_allowed(&self, e: &Env, reserve: &Reserve, action: Action) {
        if self.config.paused {
            panic_with_error!(e, PoolError::PoolPaused);
        }
        if !reserve.config.active {
            panic_with_error!(e, PoolError::ReserveInactive);
        }
        if reserve.config.frozen && action.blocked_by_freeze() {
            panic_with_error!(e, PoolError::ReserveFrozen);
        }
    }

    /// Load a price from the Pool's oracle. Returns a cached version if one already exists.
    ///
    /// ### Arguments
    /// * asset - The address of the underlying asset
    ///
    /// ### Panics
    /// If the price is missing, not positive, or stale
    pub fn load_price(&mut self, e: &Env, asset: &Address) -> i128 {
        if let Some(price) = self.prices.get(asset.clone()) {
            return price;
        }
        let oracle_client = PriceFeedClient::new(e, &self.config.oracle);
        let oracle_asset = Asset::Stellar(asset.clone());
        let price_data = oracle_client
            .lastprice(&oracle_asset)
            .unwrap_or_else(|| panic_with_error!(e, PoolError::InvalidPrice));
        if price_data.price <= 0 {
            panic_with_error!(e, PoolError::InvalidPrice);
        }
        if price_data.timestamp + MAX_PRICE_AGE < e.ledger().timestamp() {
            panic_with_error!(e, PoolError::StalePrice);
        }
        self.prices.set(asset.clone(), price_data.price);
        price_data.price
    }
}
