use soroban_sdk::contracterror;

// Discriminants are shared across the contract family; `Liquidity = 3` is
// raised by the lend vault and deliberately absent here.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Error {
    Validation = 1,
    Authorization = 2,
    RatioViolation = 4,
    PositionState = 5,
    PriceIntegrity = 6,
    Settlement = 7,
}
