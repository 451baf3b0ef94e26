use crate::pool::{default_rate_strategy, default_reserve_config};
use lending_pool::{PoolClient, PoolContract, ReserveData, UserReserveView};
use mock_flash_receiver::{MockFlashReceiver, MockFlashReceiverClient};
use sep_40_oracle::testutils::{Asset, MockPriceOracleClient, MockPriceOracleWASM};
use sep_41_token::testutils::{MockTokenClient, MockTokenWASM};
use soroban_sdk::testutils::{Address as _, Ledger, LedgerInfo};
use soroban_sdk::{vec as svec, Address, Env, String, Symbol};
use std::ops::{Index, IndexMut};

pub const SCALAR_7: i128 = 1_000_0000;
pub const SCALAR_9: i128 = 1_000_000_000;

pub const ONE_DAY: u64 = 24 * 60 * 60;
pub const ONE_YEAR: u64 = 365 * ONE_DAY;

#[derive(Clone, Copy)]
pub enum TokenIndex {
    USDC = 0,
    WETH = 1,
    XLM = 2,
}

impl<T> Index<TokenIndex> for Vec<T> {
    type Output = T;

    fn index(&self, index: TokenIndex) -> &Self::Output {
        &self[index as usize]
    }
}

impl<T> IndexMut<TokenIndex> for Vec<T> {
    fn index_mut(&mut self, index: TokenIndex) -> &mut Self::Output {
        &mut self[index as usize]
    }
}

pub struct TestFixture<'a> {
    pub env: Env,
    pub bombadil: Address,
    pub treasury: Address,
    pub pool: PoolClient<'a>,
    pub oracle: MockPriceOracleClient<'a>,
    pub receiver: MockFlashReceiverClient<'a>,
    pub tokens: Vec<MockTokenClient<'a>>,
}

impl TestFixture<'_> {
    /// Create a new TestFixture for the lending pool
    ///
    /// Deploys USDC (0), wETH (1), and XLM (2) test tokens, an oracle pricing them at $1,
    /// $2000 and $0.10, and a pool with a reserve for each token. Bombadil is the admin and
    /// emergency admin of the pool.
    pub fn create<'a>() -> TestFixture<'a> {
        let e = Env::default();
        e.mock_all_auths();
        e.budget().reset_unlimited();

        let bombadil = Address::generate(&e);
        let treasury = Address::generate(&e);

        e.ledger().set(LedgerInfo {
            timestamp: 1441065600, // Sept 1st, 2015
            protocol_version: 20,
            sequence_number: 100,
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 17280,
            min_persistent_entry_ttl: 9999999,
            max_entry_ttl: 9999999,
        });

        // deploy tokens
        let usdc_client = create_token(&e, &bombadil, 7, "USDC");
        let weth_client = create_token(&e, &bombadil, 9, "wETH");
        let xlm_client = create_token(&e, &bombadil, 7, "XLM");

        // deploy oracle
        let oracle_id = e.register_contract_wasm(None, MockPriceOracleWASM);
        let oracle_client = MockPriceOracleClient::new(&e, &oracle_id);
        oracle_client.set_data(
            &bombadil,
            &Asset::Other(Symbol::new(&e, "USD")),
            &svec![
                &e,
                Asset::Stellar(usdc_client.address.clone()),
                Asset::Stellar(weth_client.address.clone()),
                Asset::Stellar(xlm_client.address.clone()),
            ],
            &7,
            &300,
        );
        oracle_client.set_price_stable(&svec![
            &e,
            1_0000000,    // usdc
            2000_0000000, // weth
            0_1000000,    // xlm
        ]);

        // deploy pool
        let pool_id = e.register_contract(None, PoolContract {});
        let pool_client = PoolClient::new(&e, &pool_id);
        pool_client.initialize(&bombadil, &bombadil, &oracle_id, &treasury, &9);
        pool_client.init_reserve(
            &usdc_client.address,
            &default_reserve_config(7),
            &default_rate_strategy(),
        );
        pool_client.init_reserve(
            &weth_client.address,
            &default_reserve_config(9),
            &default_rate_strategy(),
        );
        pool_client.init_reserve(
            &xlm_client.address,
            &default_reserve_config(7),
            &default_rate_strategy(),
        );

        // deploy flash loan receiver
        let receiver_id = e.register_contract(None, MockFlashReceiver {});
        let receiver_client = MockFlashReceiverClient::new(&e, &receiver_id);
        receiver_client.initialize(&pool_id);

        TestFixture {
            env: e,
            bombadil,
            treasury,
            pool: pool_client,
            oracle: oracle_client,
            receiver: receiver_client,
            tokens: vec![usdc_client, weth_client, xlm_client],
        }
    }

    /********** State Helpers **********/

    pub fn read_reserve_data(&self, token_index: TokenIndex) -> ReserveData {
        self.pool
            .get_reserve_data(&self.tokens[token_index].address)
    }

    pub fn read_user_reserve(&self, token_index: TokenIndex, user: &Address) -> UserReserveView {
        self.pool
            .get_user_reserve_data(&self.tokens[token_index].address, user)
    }

    /// Set the oracle prices of USDC, wETH, and XLM (7 decimals)
    pub fn set_prices(&self, usdc: i128, weth: i128, xlm: i128) {
        self.oracle
            .set_price_stable(&svec![&self.env, usdc, weth, xlm]);
    }

    /********** Chain Helpers ***********/

    pub fn jump(&self, time: u64) {
        let blocks = time / 5;
        self.env.ledger().set(LedgerInfo {
            timestamp: self.env.ledger().timestamp() + time,
            protocol_version: 20,
            sequence_number: self.env.ledger().sequence() + (blocks as u32),
            network_id: Default::default(),
            base_reserve: 10,
            min_temp_entry_ttl: 17280,
            min_persistent_entry_ttl: 9999999,
            max_entry_ttl: 9999999,
        });
    }
}

fn create_token<'a>(e: &Env, admin: &Address, decimals: u32, symbol: &str) -> MockTokenClient<'a> {
    let token_id = e.register_contract_wasm(None, MockTokenWASM);
    let token_client = MockTokenClient::new(e, &token_id);
    token_client.initialize(
        admin,
        &decimals,
        &String::from_str(e, symbol),
        &String::from_str(e, symbol),
    );
    token_client
}
