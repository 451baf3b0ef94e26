use lending_pool::{RateStrategy, ReserveConfig};

pub fn default_reserve_config(decimals: u32) -> ReserveConfig {
    ReserveConfig {
        index: 0,
        decimals,
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

/// 0% base rate, 4% at 80% utilization, 79% at full utilization
pub fn default_rate_strategy() -> RateStrategy {
    RateStrategy {
        optimal_util: 800_000_000_000_000_000_000_000_000,
        base_rate: 0,
        var_slope_1: 40_000_000_000_000_000_000_000_000,
        var_slope_2: 750_000_000_000_000_000_000_000_000,
        stable_slope_1: 20_000_000_000_000_000_000_000_000,
        stable_slope_2: 600_000_000_000_000_000_000_000_000,
    }
}
