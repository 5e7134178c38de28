use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    Validation = 1,
    Authorization = 2,
    Liquidity = 3,
}
