use sep_41_token::TokenClient;
use soroban_sdk::{
    contract, contractimpl, contracttype, unwrap::UnwrapOptimized, Address, Bytes, Env, Symbol,
    Vec,
};

const POOL_KEY: &str = "Pool";
const BEHAVIOR_KEY: &str = "Behavior";

#[derive(Clone)]
#[contracttype]
pub struct Behavior {
    /// Return `amount + premium` of each asset to the pool
    pub repay: bool,
    /// The value `exec_op` reports to the pool
    pub result: bool,
}

#[contract]
pub struct MockFlashReceiver;

pub trait MockFlashReceiverTrait {
    /// Setup the receiver
    ///
    /// ### Arguments
    /// * `pool` - The pool that issues the flash loans
    fn initialize(e: Env, pool: Address);

    /// Mock Only: Set how the receiver handles the next flash loan
    fn set_behavior(e: Env, repay: bool, result: bool);

    /// Receive a flash loan from the pool
    fn exec_op(
        e: Env,
        assets: Vec<Address>,
        amounts: Vec<i128>,
        premiums: Vec<i128>,
        initiator: Address,
        params: Bytes,
    ) -> bool;
}

#[contractimpl]
impl MockFlashReceiverTrait for MockFlashReceiver {
    fn initialize(e: Env, pool: Address) {
        e.storage()
            .instance()
            .set::<Symbol, Address>(&Symbol::new(&e, POOL_KEY), &pool);
        e.storage().instance().set::<Symbol, Behavior>(
            &Symbol::new(&e, BEHAVIOR_KEY),
            &Behavior {
                repay: true,
                result: true,
            },
        );
    }

    fn set_behavior(e: Env, repay: bool, result: bool) {
        e.storage().instance().set::<Symbol, Behavior>(
            &Symbol::new(&e, BEHAVIOR_KEY),
            &Behavior { repay, result },
        );
    }

    fn exec_op(
        e: Env,
        assets: Vec<Address>,
        amounts: Vec<i128>,
        premiums: Vec<i128>,
        _initiator: Address,
        _params: Bytes,
    ) -> bool {
        let pool = e
            .storage()
            .instance()
            .get::<Symbol, Address>(&Symbol::new(&e, POOL_KEY))
            .unwrap_optimized();
        let behavior = e
            .storage()
            .instance()
            .get::<Symbol, Behavior>(&Symbol::new(&e, BEHAVIOR_KEY))
            .unwrap_optimized();
        if behavior.repay {
            for i in 0..assets.len() {
                let owed = amounts.get_unchecked(i) + premiums.get_unchecked(i);
                TokenClient::new(&e, &assets.get_unchecked(i)).transfer(
                    &e.current_contract_address(),
                    &pool,
                    &owed,
                );
            }
        }
        behavior.result
    }
}
