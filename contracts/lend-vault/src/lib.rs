#![no_std]

mod constants;
mod contract;
mod errors;
mod events;
mod helpers;
mod storage;

pub use crate::constants::{RATE_SCALE, RATIO_SCALE};
pub use crate::contract::{LendVault, LendVaultClient};
pub use crate::errors::Error;
pub use crate::storage::{Bank, DataKey};

#[cfg(test)]
mod test;
