use lending_pool::RATE_MODE_VARIABLE;
use soroban_sdk::{testutils::Address as _, Address};

use crate::test_fixture::{TestFixture, TokenIndex, ONE_DAY, SCALAR_7, SCALAR_9};

/// Create a test fixture with a pool that has been in use for a day
///
/// Frodo supplies 100k USDC, 100 wETH, and 1M XLM, and borrows 60k USDC, 50 wETH, and 400k
/// XLM at the variable rate. Frodo keeps an equal amount of each token in their wallet.
///
/// Returns the fixture and frodo's address
pub fn create_fixture_with_data<'a>() -> (TestFixture<'a>, Address) {
    let fixture = TestFixture::create();
    let frodo = Address::generate(&fixture.env);

    let usdc = &fixture.tokens[TokenIndex::USDC];
    let weth = &fixture.tokens[TokenIndex::WETH];
    let xlm = &fixture.tokens[TokenIndex::XLM];

    usdc.mint(&frodo, &(200_000 * SCALAR_7));
    weth.mint(&frodo, &(200 * SCALAR_9));
    xlm.mint(&frodo, &(2_000_000 * SCALAR_7));

    fixture
        .pool
        .deposit(&frodo, &usdc.address, &(100_000 * SCALAR_7), &frodo);
    fixture
        .pool
        .deposit(&frodo, &weth.address, &(100 * SCALAR_9), &frodo);
    fixture
        .pool
        .deposit(&frodo, &xlm.address, &(1_000_000 * SCALAR_7), &frodo);

    fixture.pool.borrow(
        &frodo,
        &usdc.address,
        &(60_000 * SCALAR_7),
        &RATE_MODE_VARIABLE,
        &frodo,
    );
    fixture.pool.borrow(
        &frodo,
        &weth.address,
        &(50 * SCALAR_9),
        &RATE_MODE_VARIABLE,
        &frodo,
    );
    fixture.pool.borrow(
        &frodo,
        &xlm.address,
        &(400_000 * SCALAR_7),
        &RATE_MODE_VARIABLE,
        &frodo,
    );

    fixture.jump(ONE_DAY);

    (fixture, frodo)
}
