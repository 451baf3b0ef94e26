mod borrow;
pub use borrow::{
    execute_approve_delegation, execute_borrow, execute_rebalance, execute_repay,
    execute_swap_borrow_rate_mode,
};

mod config;
pub use config::{
    execute_init_reserve, execute_initialize, execute_set_market_rate, execute_set_rate_strategy,
    execute_set_reserve_active, execute_set_reserve_frozen, execute_update_pool,
    execute_update_reserve,
};

mod flash_loan;
pub use flash_loan::execute_flash_loan;

mod health_factor;
pub use health_factor::{AccountData, PositionData};

mod interest;
pub use interest::calc_interest_rates;

mod liquidation;
pub use liquidation::execute_liquidation;

#[allow(clippy::module_inception)]
mod pool;
pub use pool::Pool;

mod reserve;
pub use reserve::Reserve;

mod status;
pub use status::execute_set_paused;

mod supply;
pub use supply::{
    execute_deposit, execute_mint_to_treasury, execute_set_collateral, execute_transfer_supply,
    execute_withdraw,
};

mod user;
pub use user::{Positions, User, UserReserveData, UserReserveView};
