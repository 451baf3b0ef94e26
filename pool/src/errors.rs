use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
/// Error codes for the pool contract. Common errors are codes that match up with the built-in
/// contracts error reporting. Pool specific errors start at 1200.
pub enum PoolError {
    // Common Errors
    InternalError = 1,
    AlreadyInitializedError = 3,

    UnauthorizedError = 4,

    NegativeAmountError = 8,
    BalanceError = 10,
    OverflowError = 12,

    // Pool Request Errors (start at 1200)
    BadRequest = 1200,
    InvalidPoolInitArgs = 1201,
    InvalidReserveConfig = 1202,
    InvalidRateStrategy = 1203,
    InvalidAmount = 1204,
    InvalidRateMode = 1205,
    ReserveNotFound = 1206,
    MaxReservesExceeded = 1207,
    ReserveLiquidityNotZero = 1208,

    // Pool State Errors
    PoolPaused = 1210,
    ReserveInactive = 1211,
    ReserveFrozen = 1212,
    ReentrancyDetected = 1213,
    DivisionByZero = 1214,

    // Oracle Errors
    StalePrice = 1220,
    InvalidPrice = 1221,

    // Supply Errors
    InsufficientLiquidity = 1230,
    UnderlyingBalanceZero = 1231,
    CollateralNotEnabled = 1232,

    // Borrow Errors
    BorrowingNotEnabled = 1240,
    StableBorrowingNotEnabled = 1241,
    CollateralBalanceIsZero = 1242,
    CollateralCannotCoverNewBorrow = 1243,
    CollateralSameAsBorrowingCurrency = 1244,
    AmountBiggerThanMaxLoanSizeStable = 1245,
    HealthFactorBelowThreshold = 1246,
    NoDebtOfSelectedType = 1247,
    NoExplicitAmountToRepayOnBehalf = 1248,
    InsufficientBorrowAllowance = 1249,
    RebalanceNotNeeded = 1250,

    // Flash Loan Errors
    InvalidFlashLoanParams = 1260,
    FlashLoanReceiverFailed = 1261,
    FlashLoanNotRepaid = 1262,

    // Liquidation Errors
    HealthFactorNotBelowThreshold = 1270,
    CollateralCannotBeLiquidated = 1271,
    UserDoesNotHaveDebtOfSelectedType = 1272,
    NotEnoughLiquidityToLiquidate = 1273,
}
