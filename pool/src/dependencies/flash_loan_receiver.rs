use soroban_sdk::{contractclient, Address, Bytes, Env, Vec};

/// Interface a contract must implement to receive a flash loan
#[contractclient(name = "FlashLoanReceiverClient")]
pub trait FlashLoanReceiver {
    /// Execute an operation with the borrowed funds. The pool has already transferred
    /// `amounts` of each of `assets` to the receiver. For every leg opened without debt, the
    /// receiver must transfer `amount + premium` back to the pool before returning.
    ///
    /// Returns true if the operation succeeded
    ///
    /// ### Arguments
    /// * `assets` - The assets lent
    /// * `amounts` - The amount lent of each asset
    /// * `premiums` - The fee owed for each asset
    /// * `initiator` - The address that started the flash loan
    /// * `params` - Opaque data forwarded from the initiator
    fn exec_op(
        e: Env,
        assets: Vec<Address>,
        amounts: Vec<i128>,
        premiums: Vec<i128>,
        initiator: Address,
        params: Bytes,
    ) -> bool;
}
