#![no_std]

#[cfg(any(test, feature = "testutils"))]
extern crate std;

mod auth;
mod constants;
mod contract;
mod dependencies;
mod errors;
mod math;
mod pool;
mod storage;
mod validator;

mod testutils;

pub use constants::*;
pub use contract::*;
pub use dependencies::FlashLoanReceiverClient;
pub use errors::PoolError;
pub use pool::{AccountData, Positions, UserReserveData, UserReserveView};
pub use storage::{PoolConfig, RateStrategy, ReserveConfig, ReserveData};
