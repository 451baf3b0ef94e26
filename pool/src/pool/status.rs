use soroban_sdk::Env;

use crate::{auth::EmergencyAuth, storage};

/// The actions the pool status gate distinguishes between
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Deposit,
    Withdraw,
    Borrow,
    Repay,
    SwapRateMode,
    Rebalance,
    SetCollateral,
    FlashLoan,
    Liquidation,
    TransferSupply,
    MintToTreasury,
}

impl Action {
    /// Frozen reserves refuse actions that grow the reserve or its debt. Exits stay open.
    pub fn blocked_by_freeze(&self) -> bool {
        matches!(self, Action::Deposit | Action::Borrow | Action::SwapRateMode)
    }
}

/// (Emergency admin only) Pause or unpause every action of the pool
///
/// ### Arguments
/// * `paused` - If the pool should be paused
pub fn execute_set_paused(e: &Env, _auth: &EmergencyAuth, paused: bool) {
    let mut pool_config = storage::get_pool_config(e);
    pool_config.paused = paused;
    storage::set_pool_config(e, &pool_config);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils;
    use soroban_sdk::{testutils::Address as _, Address};

    #[test]
    fn test_blocked_by_freeze() {
        assert!(Action::Deposit.blocked_by_freeze());
        assert!(Action::Borrow.blocked_by_freeze());
        assert!(Action::SwapRateMode.blocked_by_freeze());

        assert!(!Action::Withdraw.blocked_by_freeze());
        assert!(!Action::Repay.blocked_by_freeze());
        assert!(!Action::Rebalance.blocked_by_freeze());
        assert!(!Action::SetCollateral.blocked_by_freeze());
        assert!(!Action::FlashLoan.blocked_by_freeze());
        assert!(!Action::Liquidation.blocked_by_freeze());
        assert!(!Action::TransferSupply.blocked_by_freeze());
        assert!(!Action::MintToTreasury.blocked_by_freeze());
    }

    #[test]
    fn test_set_paused() {
        let e = Env::default();
        e.mock_all_auths();

        let pool = testutils::create_pool(&e);
        let frodo = Address::generate(&e);
        let oracle = Address::generate(&e);

        e.as_contract(&pool, || {
            storage::set_emergency_admin(&e, &frodo);
            storage::set_pool_config(&e, &testutils::default_pool_config(&e, &oracle));

            let auth = EmergencyAuth::require(&e);
            execute_set_paused(&e, &auth, true);
            assert!(storage::get_pool_config(&e).paused);

            execute_set_paused(&e, &auth, false);
            assert!(!storage::get_pool_config(&e).paused);
        });
    }
}
