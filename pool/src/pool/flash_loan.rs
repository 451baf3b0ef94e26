use cast::i128;
use sep_41_token::TokenClient;
use soroban_sdk::{panic_with_error, vec, Address, Bytes, Env, Vec};

use crate::{
    constants::{RATE_MODE_NONE, RATE_MODE_VARIABLE},
    dependencies::FlashLoanReceiverClient,
    errors::PoolError,
    math::percent_mul,
    validator::require_positive,
};

use super::{
    borrow::{open_debt, spend_allowance, validate_borrow},
    pool::Pool,
    status::Action,
    user::User,
};

/// Lend `amounts` of `assets` to `receiver` for the duration of its `exec_op` callback.
///
/// Legs with mode `RATE_MODE_NONE` must be handed back with the premium before the callback
/// returns. Debt legs are kept by the receiver and opened as debt for `on_behalf_of`, as if
/// `caller` borrowed them.
///
/// Returns the premium charged for each leg
///
/// ### Panics
/// If the request is malformed, the receiver fails, or any leg is not settled
#[allow(clippy::too_many_arguments)]
pub fn execute_flash_loan(
    e: &Env,
    caller: &Address,
    receiver: &Address,
    assets: &Vec<Address>,
    amounts: &Vec<i128>,
    modes: &Vec<u32>,
    on_behalf_of: &Address,
    params: &Bytes,
) -> Vec<i128> {
    let len = assets.len();
    if len == 0 || amounts.len() != len || modes.len() != len {
        panic_with_error!(e, PoolError::InvalidFlashLoanParams);
    }
    for i in 1..len {
        let asset = assets.get_unchecked(i);
        if assets.first_index_of(&asset) != Some(i) {
            panic_with_error!(e, PoolError::InvalidFlashLoanParams);
        }
    }

    let pool_address = e.current_contract_address();
    let mut pool = Pool::load(e);
    let mut premiums: Vec<i128> = vec![e];
    let mut pre_balances: Vec<i128> = vec![e];
    for i in 0..len {
        let asset = assets.get_unchecked(i);
        let amount = amounts.get_unchecked(i);
        let mode = modes.get_unchecked(i);
        require_positive(e, &amount);
        if mode > RATE_MODE_VARIABLE {
            panic_with_error!(e, PoolError::InvalidRateMode);
        }

        let reserve = pool.load_reserve(e, &asset);
        pool.require_action_allowed(e, &reserve, Action::FlashLoan);
        if mode != RATE_MODE_NONE {
            pool.require_action_allowed(e, &reserve, Action::Borrow);
        }
        if amount > reserve.data.available_liquidity {
            panic_with_error!(e, PoolError::InsufficientLiquidity);
        }

        let premium = if mode == RATE_MODE_NONE {
            percent_mul(e, amount, i128(pool.config.flash_premium))
        } else {
            0
        };
        premiums.push_back(premium);

        let token_client = TokenClient::new(e, &asset);
        pre_balances.push_back(token_client.balance(&pool_address));
        pool.cache_reserve(reserve, false);
        token_client.transfer(&pool_address, receiver, &amount);
    }

    let success = FlashLoanReceiverClient::new(e, receiver).exec_op(
        assets,
        amounts,
        &premiums,
        caller,
        params,
    );
    if !success {
        panic_with_error!(e, PoolError::FlashLoanReceiverFailed);
    }

    let mut user = User::load(e, on_behalf_of);
    let mut opened_debt = false;
    for i in 0..len {
        let asset = assets.get_unchecked(i);
        let amount = amounts.get_unchecked(i);
        let mode = modes.get_unchecked(i);
        let premium = premiums.get_unchecked(i);

        let mut reserve = pool.load_reserve(e, &asset);
        if mode == RATE_MODE_NONE {
            let balance = TokenClient::new(e, &asset).balance(&pool_address);
            if balance < pre_balances.get_unchecked(i) + premium {
                panic_with_error!(e, PoolError::FlashLoanNotRepaid);
            }
            reserve.cumulate_to_liquidity_index(e, premium);
            reserve.data.available_liquidity += premium;
        } else {
            if caller != on_behalf_of {
                spend_allowance(e, on_behalf_of, caller, &asset, mode, amount);
            }
            validate_borrow(e, &mut pool, &reserve, &user, amount, mode);
            open_debt(e, &mut user, &mut reserve, amount, mode);
            reserve.data.available_liquidity -= amount;
            opened_debt = true;
        }
        pool.cache_reserve(reserve, true);
    }

    pool.store_cached_reserves(e);
    if opened_debt {
        user.store(e);
    }
    premiums
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::{RATE_MODE_STABLE, RAY},
        pool::execute_deposit,
        storage, testutils,
    };
    use mock_flash_receiver::{MockFlashReceiver, MockFlashReceiverClient};
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

    fn create_receiver<'a>(e: &Env, pool: &Address) -> (Address, MockFlashReceiverClient<'a>) {
        let address = e.register_contract(None, MockFlashReceiver {});
        let client = MockFlashReceiverClient::new(e, &address);
        client.initialize(pool);
        (address, client)
    }

    #[test]
    fn test_flash_loan_repaid() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        set_time(&e, 600);

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let (underlying, underlying_client) =
            testutils::create_reserve_at_time(&e, &pool, &bombadil);
        testutils::setup_pool_config(&e, &pool, &Address::generate(&e));
        let (receiver, _) = create_receiver(&e, &pool);
        // fund the premium
        underlying_client.mint(&receiver, &1_0000000);

        e.as_contract(&pool, || {
            let data_before = storage::get_res_data(&e, &underlying);
            let premiums = execute_flash_loan(
                &e,
                &samwise,
                &receiver,
                &vec![&e, underlying.clone()],
                &vec![&e, 10_0000000],
                &vec![&e, RATE_MODE_NONE],
                &samwise,
                &Bytes::new(&e),
            );
            assert_eq!(premiums, vec![&e, 0_0090000]);

            let data_after = storage::get_res_data(&e, &underlying);
            assert_eq!(
                data_after.available_liquidity,
                data_before.available_liquidity + 0_0090000
            );
            assert!(data_after.liquidity_index > data_before.liquidity_index);
            assert!(data_after.liquidity_index > RAY);
        });
        assert_eq!(underlying_client.balance(&receiver), 1_0000000 - 0_0090000);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1262)")]
    fn test_flash_loan_not_repaid() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        set_time(&e, 600);

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let (underlying, _) = testutils::create_reserve_at_time(&e, &pool, &bombadil);
        testutils::setup_pool_config(&e, &pool, &Address::generate(&e));
        let (receiver, receiver_client) = create_receiver(&e, &pool);
        receiver_client.set_behavior(&false, &true);

        e.as_contract(&pool, || {
            execute_flash_loan(
                &e,
                &samwise,
                &receiver,
                &vec![&e, underlying.clone()],
                &vec![&e, 10_0000000],
                &vec![&e, RATE_MODE_NONE],
                &samwise,
                &Bytes::new(&e),
            );
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1261)")]
    fn test_flash_loan_receiver_failed() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        set_time(&e, 600);

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let (underlying, underlying_client) =
            testutils::create_reserve_at_time(&e, &pool, &bombadil);
        testutils::setup_pool_config(&e, &pool, &Address::generate(&e));
        let (receiver, receiver_client) = create_receiver(&e, &pool);
        receiver_client.set_behavior(&true, &false);
        underlying_client.mint(&receiver, &1_0000000);

        e.as_contract(&pool, || {
            execute_flash_loan(
                &e,
                &samwise,
                &receiver,
                &vec![&e, underlying.clone()],
                &vec![&e, 10_0000000],
                &vec![&e, RATE_MODE_NONE],
                &samwise,
                &Bytes::new(&e),
            );
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1260)")]
    fn test_flash_loan_duplicate_assets() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        set_time(&e, 600);

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let (underlying, _) = testutils::create_reserve_at_time(&e, &pool, &bombadil);
        testutils::setup_pool_config(&e, &pool, &Address::generate(&e));
        let (receiver, _) = create_receiver(&e, &pool);

        e.as_contract(&pool, || {
            execute_flash_loan(
                &e,
                &samwise,
                &receiver,
                &vec![&e, underlying.clone(), underlying.clone()],
                &vec![&e, 1_0000000, 1_0000000],
                &vec![&e, RATE_MODE_NONE, RATE_MODE_NONE],
                &samwise,
                &Bytes::new(&e),
            );
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1260)")]
    fn test_flash_loan_mismatched_lengths() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        set_time(&e, 600);

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let (underlying, _) = testutils::create_reserve_at_time(&e, &pool, &bombadil);
        testutils::setup_pool_config(&e, &pool, &Address::generate(&e));
        let (receiver, _) = create_receiver(&e, &pool);

        e.as_contract(&pool, || {
            execute_flash_loan(
                &e,
                &samwise,
                &receiver,
                &vec![&e, underlying.clone()],
                &vec![&e, 1_0000000, 1_0000000],
                &vec![&e, RATE_MODE_NONE],
                &samwise,
                &Bytes::new(&e),
            );
        });
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1230)")]
    fn test_flash_loan_over_liquidity() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        set_time(&e, 600);

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let samwise = Address::generate(&e);
        let (underlying, _) = testutils::create_reserve_at_time(&e, &pool, &bombadil);
        testutils::setup_pool_config(&e, &pool, &Address::generate(&e));
        let (receiver, _) = create_receiver(&e, &pool);

        e.as_contract(&pool, || {
            execute_flash_loan(
                &e,
                &samwise,
                &receiver,
                &vec![&e, underlying.clone()],
                &vec![&e, 25_0000001],
                &vec![&e, RATE_MODE_NONE],
                &samwise,
                &Bytes::new(&e),
            );
        });
    }

    #[test]
    fn test_flash_loan_opens_debt() {
        let e = Env::default();
        e.mock_all_auths_allowing_non_root_auth();
        set_time(&e, 600);

        let pool = testutils::create_pool(&e);
        let bombadil = Address::generate(&e);
        let frodo = Address::generate(&e);
        let (underlying_0, underlying_0_client) =
            testutils::create_reserve_at_time(&e, &pool, &bombadil);
        let (underlying_1, underlying_1_client) =
            testutils::create_reserve_at_time(&e, &pool, &bombadil);
        testutils::setup_pool_config(&e, &pool, &Address::generate(&e));
        testutils::setup_oracle(
            &e,
            &pool,
            &bombadil,
            &vec![&e, underlying_0.clone(), underlying_1.clone()],
            &vec![&e, 1_0000000, 1_0000000],
        );
        let (receiver, receiver_client) = create_receiver(&e, &pool);
        receiver_client.set_behavior(&false, &true);

        underlying_0_client.mint(&frodo, &100_0000000);
        e.as_contract(&pool, || {
            execute_deposit(&e, &frodo, &underlying_0, 100_0000000, &frodo);

            let premiums = execute_flash_loan(
                &e,
                &frodo,
                &receiver,
                &vec![&e, underlying_1.clone()],
                &vec![&e, 5_0000000],
                &vec![&e, RATE_MODE_STABLE],
                &frodo,
                &Bytes::new(&e),
            );
            assert_eq!(premiums, vec![&e, 0]);

            let user = crate::pool::User::load(&e, &frodo);
            assert_eq!(user.get_reserve(1).stable_principal, 5_0000000);
            let data = storage::get_res_data(&e, &underlying_1);
            assert_eq!(data.available_liquidity, 20_0000000);
        });
        assert_eq!(underlying_1_client.balance(&receiver), 5_0000000);
    }
}
