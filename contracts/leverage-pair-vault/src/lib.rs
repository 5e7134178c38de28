#![no_std]

mod constants;
mod contract;
mod errors;
mod events;
mod helpers;
mod storage;

pub use crate::constants::RATIO_SCALE;
pub use crate::contract::{LeveragePairVault, LeveragePairVaultClient};
pub use crate::errors::Error;
pub use crate::storage::{ClosePreview, Config, Pool, Position, PositionStatus};

#[cfg(test)]
mod test;
