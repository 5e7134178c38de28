use soroban_sdk::contracterror;

// Same discriminant layout as the pair vault; `Liquidity = 3` belongs to
// the lend vault.
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
