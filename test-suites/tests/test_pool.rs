#![cfg(test)]
use lending_pool::{MAX_AMOUNT, RATE_MODE_STABLE, RATE_MODE_VARIABLE, WAD};
use soroban_sdk::{
    testutils::{Address as _, AuthorizedFunction, AuthorizedInvocation, Events},
    vec, Address, IntoVal, Symbol, Val, Vec,
};
use test_suites::{
    assertions::{assert_approx_eq_abs, assert_approx_eq_rel},
    create_fixture_with_data,
    test_fixture::{TokenIndex, ONE_DAY, SCALAR_7, SCALAR_9},
};

/// Test user exposed functions on the lending pool for basic functionality, auth, and events.
#[test]
fn test_pool_user() {
    let (fixture, _) = create_fixture_with_data();
    let pool = &fixture.pool;
    let weth = &fixture.tokens[TokenIndex::WETH];
    let usdc = &fixture.tokens[TokenIndex::USDC];

    let sam = Address::generate(&fixture.env);
    weth.mint(&sam, &(10 * SCALAR_9));
    let mut sam_weth_balance = 10 * SCALAR_9;
    let mut pool_weth_balance = weth.balance(&pool.address);

    // Sam deposits 5 wETH
    let amount = 5 * SCALAR_9;
    pool.deposit(&sam, &weth.address, &amount, &sam);
    assert_eq!(
        fixture.env.auths()[0],
        (
            sam.clone(),
            AuthorizedInvocation {
                function: AuthorizedFunction::Contract((
                    pool.address.clone(),
                    Symbol::new(&fixture.env, "deposit"),
                    vec![
                        &fixture.env,
                        sam.to_val(),
                        weth.address.to_val(),
                        amount.into_val(&fixture.env),
                        sam.to_val(),
                    ]
                )),
                sub_invocations: std::vec![AuthorizedInvocation {
                    function: AuthorizedFunction::Contract((
                        weth.address.clone(),
                        Symbol::new(&fixture.env, "transfer"),
                        vec![
                            &fixture.env,
                            sam.to_val(),
                            pool.address.to_val(),
                            amount.into_val(&fixture.env)
                        ]
                    )),
                    sub_invocations: std::vec![]
                }]
            }
        )
    );
    let event = vec![&fixture.env, fixture.env.events().all().last_unchecked()];
    let sam_scaled_weth = pool
        .get_positions(&sam)
        .reserves
        .get_unchecked(TokenIndex::WETH as u32)
        .scaled_supply;
    let event_body: Vec<Val> = vec![
        &fixture.env,
        sam.to_val(),
        amount.into_val(&fixture.env),
        sam_scaled_weth.into_val(&fixture.env),
    ];
    assert_eq!(
        event,
        vec![
            &fixture.env,
            (
                pool.address.clone(),
                (
                    Symbol::new(&fixture.env, "deposit"),
                    weth.address.clone(),
                    sam.clone()
                )
                    .into_val(&fixture.env),
                event_body.into_val(&fixture.env)
            )
        ]
    );
    sam_weth_balance -= amount;
    pool_weth_balance += amount;
    assert_eq!(weth.balance(&sam), sam_weth_balance);
    assert_eq!(weth.balance(&pool.address), pool_weth_balance);
    let sam_weth = fixture.read_user_reserve(TokenIndex::WETH, &sam);
    assert_approx_eq_abs(sam_weth.current_supply, amount, 1);
    assert!(sam_weth.usage_as_collateral_enabled);

    // Sam borrows 1000 USDC against the wETH
    let amount = 1000 * SCALAR_7;
    pool.borrow(&sam, &usdc.address, &amount, &RATE_MODE_VARIABLE, &sam);
    assert_eq!(
        fixture.env.auths()[0],
        (
            sam.clone(),
            AuthorizedInvocation {
                function: AuthorizedFunction::Contract((
                    pool.address.clone(),
                    Symbol::new(&fixture.env, "borrow"),
                    vec![
                        &fixture.env,
                        sam.to_val(),
                        usdc.address.to_val(),
                        amount.into_val(&fixture.env),
                        RATE_MODE_VARIABLE.into_val(&fixture.env),
                        sam.to_val(),
                    ]
                )),
                sub_invocations: std::vec![]
            }
        )
    );
    let event = vec![&fixture.env, fixture.env.events().all().last_unchecked()];
    let event_body: Vec<Val> = vec![
        &fixture.env,
        sam.to_val(),
        amount.into_val(&fixture.env),
        RATE_MODE_VARIABLE.into_val(&fixture.env),
    ];
    assert_eq!(
        event,
        vec![
            &fixture.env,
            (
                pool.address.clone(),
                (
                    Symbol::new(&fixture.env, "borrow"),
                    usdc.address.clone(),
                    sam.clone()
                )
                    .into_val(&fixture.env),
                event_body.into_val(&fixture.env)
            )
        ]
    );
    assert_eq!(usdc.balance(&sam), amount);
    let sam_usdc = fixture.read_user_reserve(TokenIndex::USDC, &sam);
    assert_approx_eq_abs(sam_usdc.current_variable_debt, amount, 1);
    assert_eq!(sam_usdc.current_stable_debt, 0);

    // 10k of collateral at an 80% liquidation threshold covers 1k of debt 8 times
    let account = pool.get_user_account_data(&sam);
    assert_approx_eq_abs(account.total_collateral, 10_000 * SCALAR_7, 100);
    assert_approx_eq_abs(account.total_debt, 1_000 * SCALAR_7, 10);
    assert_approx_eq_abs(account.available_borrows, 6_500 * SCALAR_7, 100);
    assert_eq!(account.ltv, 7500);
    assert_eq!(account.current_liquidation_threshold, 8000);
    assert_approx_eq_rel(account.health_factor, 8 * WAD, 0_0000100);

    // Sam repays the full debt after 10 days
    fixture.jump(10 * ONE_DAY);
    usdc.mint(&sam, &(10 * SCALAR_7));
    let sam_usdc_balance = usdc.balance(&sam);
    let repaid = pool.repay(
        &sam,
        &usdc.address,
        &MAX_AMOUNT,
        &RATE_MODE_VARIABLE,
        &sam,
    );
    assert_eq!(
        fixture.env.auths()[0],
        (
            sam.clone(),
            AuthorizedInvocation {
                function: AuthorizedFunction::Contract((
                    pool.address.clone(),
                    Symbol::new(&fixture.env, "repay"),
                    vec![
                        &fixture.env,
                        sam.to_val(),
                        usdc.address.to_val(),
                        MAX_AMOUNT.into_val(&fixture.env),
                        RATE_MODE_VARIABLE.into_val(&fixture.env),
                        sam.to_val(),
                    ]
                )),
                sub_invocations: std::vec![AuthorizedInvocation {
                    function: AuthorizedFunction::Contract((
                        usdc.address.clone(),
                        Symbol::new(&fixture.env, "transfer"),
                        vec![
                            &fixture.env,
                            sam.to_val(),
                            pool.address.to_val(),
                            repaid.into_val(&fixture.env)
                        ]
                    )),
                    sub_invocations: std::vec![]
                }]
            }
        )
    );
    assert!(repaid > amount);
    // roughly 3% a year over 10 days
    assert_approx_eq_rel(repaid - amount, 8219178, 0_0500000);
    assert_eq!(usdc.balance(&sam), sam_usdc_balance - repaid);
    let sam_usdc = fixture.read_user_reserve(TokenIndex::USDC, &sam);
    assert_eq!(sam_usdc.current_variable_debt, 0);
    assert_eq!(
        pool.get_user_account_data(&sam).health_factor,
        i128::MAX
    );

    // Sam withdraws all wETH, including the interest earned
    let withdrawn = pool.withdraw(&sam, &weth.address, &MAX_AMOUNT, &sam);
    assert_eq!(
        fixture.env.auths()[0],
        (
            sam.clone(),
            AuthorizedInvocation {
                function: AuthorizedFunction::Contract((
                    pool.address.clone(),
                    Symbol::new(&fixture.env, "withdraw"),
                    vec![
                        &fixture.env,
                        sam.to_val(),
                        weth.address.to_val(),
                        MAX_AMOUNT.into_val(&fixture.env),
                        sam.to_val(),
                    ]
                )),
                sub_invocations: std::vec![]
            }
        )
    );
    let event = vec![&fixture.env, fixture.env.events().all().last_unchecked()];
    let event_body: Vec<Val> = vec![
        &fixture.env,
        sam.to_val(),
        withdrawn.into_val(&fixture.env),
    ];
    assert_eq!(
        event,
        vec![
            &fixture.env,
            (
                pool.address.clone(),
                (
                    Symbol::new(&fixture.env, "withdraw"),
                    weth.address.clone(),
                    sam.clone()
                )
                    .into_val(&fixture.env),
                event_body.into_val(&fixture.env)
            )
        ]
    );
    assert!(withdrawn > 5 * SCALAR_9);
    sam_weth_balance += withdrawn;
    pool_weth_balance -= withdrawn;
    assert_eq!(weth.balance(&sam), sam_weth_balance);
    assert_eq!(weth.balance(&pool.address), pool_weth_balance);
    let sam_weth = fixture.read_user_reserve(TokenIndex::WETH, &sam);
    assert_eq!(sam_weth.current_supply, 0);
    assert_eq!(pool.get_positions(&sam).reserves.len(), 0);
}

#[test]
fn test_pool_collateral_and_transfer_supply() {
    let (fixture, _) = create_fixture_with_data();
    let pool = &fixture.pool;
    let xlm = &fixture.tokens[TokenIndex::XLM];

    let sam = Address::generate(&fixture.env);
    let merry = Address::generate(&fixture.env);
    xlm.mint(&sam, &(10_000 * SCALAR_7));
    pool.deposit(&sam, &xlm.address, &(10_000 * SCALAR_7), &sam);
    assert_approx_eq_abs(
        pool.get_user_account_data(&sam).total_collateral,
        1_000 * SCALAR_7,
        10,
    );

    // Sam stops using the XLM as collateral
    pool.set_use_as_collateral(&sam, &xlm.address, &false);
    assert_eq!(
        fixture.env.auths()[0],
        (
            sam.clone(),
            AuthorizedInvocation {
                function: AuthorizedFunction::Contract((
                    pool.address.clone(),
                    Symbol::new(&fixture.env, "set_use_as_collateral"),
                    vec![
                        &fixture.env,
                        sam.to_val(),
                        xlm.address.to_val(),
                        false.into_val(&fixture.env),
                    ]
                )),
                sub_invocations: std::vec![]
            }
        )
    );
    let event = vec![&fixture.env, fixture.env.events().all().last_unchecked()];
    assert_eq!(
        event,
        vec![
            &fixture.env,
            (
                pool.address.clone(),
                (
                    Symbol::new(&fixture.env, "collateral_off"),
                    xlm.address.clone(),
                    sam.clone()
                )
                    .into_val(&fixture.env),
                ().into_val(&fixture.env)
            )
        ]
    );
    assert!(!fixture
        .read_user_reserve(TokenIndex::XLM, &sam)
        .usage_as_collateral_enabled);
    assert_eq!(pool.get_user_account_data(&sam).total_collateral, 0);

    // Sam moves half of the supply to Merry, who starts using it as collateral
    let amount = 5_000 * SCALAR_7;
    pool.transfer_supply(&sam, &merry, &xlm.address, &amount);
    let sam_xlm = fixture.read_user_reserve(TokenIndex::XLM, &sam);
    let merry_xlm = fixture.read_user_reserve(TokenIndex::XLM, &merry);
    assert_approx_eq_abs(sam_xlm.current_supply, amount, 2);
    assert_approx_eq_abs(merry_xlm.current_supply, amount, 2);
    assert!(merry_xlm.usage_as_collateral_enabled);
    assert_approx_eq_abs(
        pool.get_user_account_data(&merry).total_collateral,
        500 * SCALAR_7,
        10,
    );
}

#[test]
fn test_pool_stable_borrow_and_swap() {
    let (fixture, _) = create_fixture_with_data();
    let pool = &fixture.pool;
    let weth = &fixture.tokens[TokenIndex::WETH];
    let usdc = &fixture.tokens[TokenIndex::USDC];

    let sam = Address::generate(&fixture.env);
    weth.mint(&sam, &(5 * SCALAR_9));
    pool.deposit(&sam, &weth.address, &(5 * SCALAR_9), &sam);

    // Sam borrows 1000 USDC at the stable rate
    let stable_rate = fixture.read_reserve_data(TokenIndex::USDC).stable_borrow_rate;
    let amount = 1000 * SCALAR_7;
    pool.borrow(&sam, &usdc.address, &amount, &RATE_MODE_STABLE, &sam);
    let sam_usdc = fixture.read_user_reserve(TokenIndex::USDC, &sam);
    assert_eq!(sam_usdc.current_stable_debt, amount);
    assert_eq!(sam_usdc.principal_stable_debt, amount);
    assert_eq!(sam_usdc.stable_borrow_rate, stable_rate);
    assert_eq!(sam_usdc.current_variable_debt, 0);
    let usdc_data = fixture.read_reserve_data(TokenIndex::USDC);
    assert_eq!(usdc_data.total_stable_debt, amount);
    assert_eq!(usdc_data.avg_stable_rate, stable_rate);

    // the stable debt accrues at the fixed rate
    fixture.jump(30 * ONE_DAY);
    let sam_usdc = fixture.read_user_reserve(TokenIndex::USDC, &sam);
    assert!(sam_usdc.current_stable_debt > amount);

    // Sam swaps the stable debt to variable debt
    let debt = sam_usdc.current_stable_debt;
    pool.swap_borrow_rate_mode(&sam, &usdc.address, &RATE_MODE_STABLE);
    let sam_usdc = fixture.read_user_reserve(TokenIndex::USDC, &sam);
    assert_eq!(sam_usdc.current_stable_debt, 0);
    assert_eq!(sam_usdc.stable_borrow_rate, 0);
    assert_approx_eq_abs(sam_usdc.current_variable_debt, debt, 1);
    let usdc_data = fixture.read_reserve_data(TokenIndex::USDC);
    assert_eq!(usdc_data.total_stable_debt, 0);
    assert_eq!(usdc_data.avg_stable_rate, 0);
}

#[test]
fn test_pool_credit_delegation() {
    let (fixture, frodo) = create_fixture_with_data();
    let pool = &fixture.pool;
    let usdc = &fixture.tokens[TokenIndex::USDC];

    let merry = Address::generate(&fixture.env);
    let amount = 1000 * SCALAR_7;
    pool.approve_delegation(&frodo, &merry, &usdc.address, &RATE_MODE_VARIABLE, &amount);
    assert_eq!(
        pool.get_borrow_allowance(&frodo, &merry, &usdc.address, &RATE_MODE_VARIABLE),
        amount
    );
    assert_eq!(
        pool.get_borrow_allowance(&frodo, &merry, &usdc.address, &RATE_MODE_STABLE),
        0
    );

    // Merry borrows against Frodo's collateral
    let frodo_debt = fixture
        .read_user_reserve(TokenIndex::USDC, &frodo)
        .current_variable_debt;
    pool.borrow(&merry, &usdc.address, &amount, &RATE_MODE_VARIABLE, &frodo);
    assert_eq!(usdc.balance(&merry), amount);
    assert_eq!(
        pool.get_borrow_allowance(&frodo, &merry, &usdc.address, &RATE_MODE_VARIABLE),
        0
    );
    assert_approx_eq_abs(
        fixture
            .read_user_reserve(TokenIndex::USDC, &frodo)
            .current_variable_debt,
        frodo_debt + amount,
        2,
    );
    assert!(pool.get_positions(&merry).reserves.is_empty());
}

#[test]
#[should_panic(expected = "Error(Contract, #1249)")]
fn test_pool_borrow_on_behalf_without_allowance() {
    let (fixture, frodo) = create_fixture_with_data();
    let usdc = &fixture.tokens[TokenIndex::USDC];

    let merry = Address::generate(&fixture.env);
    fixture.pool.borrow(
        &merry,
        &usdc.address,
        &(10 * SCALAR_7),
        &RATE_MODE_VARIABLE,
        &frodo,
    );
}

#[test]
#[should_panic(expected = "Error(Contract, #1243)")]
fn test_pool_borrow_over_collateral() {
    let (fixture, _) = create_fixture_with_data();
    let weth = &fixture.tokens[TokenIndex::WETH];
    let usdc = &fixture.tokens[TokenIndex::USDC];

    // 2000 of collateral at a 75% loan to value
    let sam = Address::generate(&fixture.env);
    weth.mint(&sam, &SCALAR_9);
    fixture.pool.deposit(&sam, &weth.address, &SCALAR_9, &sam);
    fixture.pool.borrow(
        &sam,
        &usdc.address,
        &(1_600 * SCALAR_7),
        &RATE_MODE_VARIABLE,
        &sam,
    );
}

#[test]
#[should_panic(expected = "Error(Contract, #1246)")]
fn test_pool_withdraw_breaks_health_factor() {
    let (fixture, _) = create_fixture_with_data();
    let weth = &fixture.tokens[TokenIndex::WETH];
    let usdc = &fixture.tokens[TokenIndex::USDC];

    let sam = Address::generate(&fixture.env);
    weth.mint(&sam, &SCALAR_9);
    fixture.pool.deposit(&sam, &weth.address, &SCALAR_9, &sam);
    fixture.pool.borrow(
        &sam,
        &usdc.address,
        &(1_000 * SCALAR_7),
        &RATE_MODE_VARIABLE,
        &sam,
    );

    fixture
        .pool
        .withdraw(&sam, &weth.address, &(SCALAR_9 / 2), &sam);
}
