#![no_std]

#[cfg(any(test, feature = "testutils"))]
extern crate std;

mod receiver;

pub use receiver::*;
