/********** Numbers **********/

/// Fixed-point scalar for ray (27 decimal) numbers
pub const RAY: i128 = 1_000_000_000_000_000_000_000_000_000;

/// Fixed-point scalar for wad (18 decimal) numbers
pub const WAD: i128 = 1_000_000_000_000_000_000;

/// 100% expressed in basis points
pub const PERCENTAGE_FACTOR: i128 = 10000;

// seconds per year
pub const SECONDS_PER_YEAR: i128 = 31536000;

/// Sentinel amount for "the full balance" on withdraw and repay
pub const MAX_AMOUNT: i128 = i128::MAX;

/// Reported health factor for an account without debt
pub const INFINITE_HEALTH_FACTOR: i128 = i128::MAX;

/********** Risk **********/

/// A position is liquidatable below a health factor of 1 (wad)
pub const HEALTH_FACTOR_LIQUIDATION_THRESHOLD: i128 = WAD;

/// Fraction of a debt that can be covered by one liquidation (bps)
pub const LIQUIDATION_CLOSE_FACTOR_PERCENT: i128 = 5000;

/// Below this health factor (wad) the whole debt can be covered by one liquidation
pub const CLOSE_FACTOR_HF_THRESHOLD: i128 = 950_000_000_000_000_000;

/// Max size of a single stable rate loan as a fraction of the available liquidity (bps)
pub const MAX_STABLE_RATE_BORROW_SIZE_PERCENT: i128 = 2500;

/// Utilization (ray) at or above which stable positions can be rebalanced up
pub const REBALANCE_UP_USAGE_RATIO_THRESHOLD: i128 = 950_000_000_000_000_000_000_000_000;

/// Liquidity rate ceiling for a rebalance up, as a fraction of the max variable rate (bps)
pub const REBALANCE_UP_LIQUIDITY_RATE_THRESHOLD: i128 = 4000;

/// A stable rate this far (ray) above the current stable rate can be rebalanced down
pub const REBALANCE_DOWN_RATE_DELTA: i128 = 200_000_000_000_000_000_000_000_000;

/// Default flash loan premium (bps)
pub const FLASH_LOAN_PREMIUM_TOTAL: u32 = 9;

/// Max number of reserves a pool can list
pub const MAX_RESERVES: u32 = 32;

/// Oracle prices older than this (seconds) are rejected
pub const MAX_PRICE_AGE: u64 = 24 * 60 * 60;

/********** Rate Modes **********/

/// Flash loan leg that is repaid within the call
pub const RATE_MODE_NONE: u32 = 0;

/// Debt at a rate fixed when borrowed
pub const RATE_MODE_STABLE: u32 = 1;

/// Debt at the reserve's variable rate
pub const RATE_MODE_VARIABLE: u32 = 2;
