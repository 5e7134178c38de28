use soroban_sdk::{contracttype, Address, Env};

use crate::constants::{TTL_EXTEND_TO, TTL_THRESHOLD};

#[soroban_sdk::contractclient(name = "LendVaultClient")]
pub trait LendVaultContract {
    fn poke(env: Env, asset: Address);
    fn borrow(env: Env, debtor: Address, asset: Address, amount: u128) -> u128;
    fn repay(env: Env, debtor: Address, asset: Address, debt_share_amount: u128) -> u128;
    fn preview_repay(env: Env, asset: Address, debt_share_amount: u128) -> u128;
    fn get_debt_share(env: Env, asset: Address, debtor: Address) -> u128;
}

#[soroban_sdk::contractclient(name = "PositionVaultClient")]
pub trait PositionVaultContract {
    fn deposit(env: Env, from: Address, amount0: u128, amount1: u128) -> u128;
    fn withdraw(env: Env, from: Address, lp_amount: u128, to: Address) -> (u128, u128);
    fn get_total_amounts(env: Env) -> (u128, u128);
    fn total_share(env: Env) -> u128;
    fn last_trade_time(env: Env) -> u64;
}

#[soroban_sdk::contractclient(name = "PriceOracleClient")]
pub trait PriceOracleContract {
    /// TWAP as `(price, scale)`: `amount_quote = amount_base * price / scale`.
    fn price(env: Env, base: Address, quote: Address) -> (u128, u128);
    fn spot_price(env: Env, base: Address, quote: Address) -> (u128, u128);
    fn last_timestamp(env: Env) -> u64;
}

#[soroban_sdk::contractclient(name = "SwapRouterClient")]
pub trait SwapRouterContract {
    fn swap_exact_in(
        env: Env,
        from: Address,
        token_in: Address,
        token_out: Address,
        amount_in: u128,
        min_out: u128,
    ) -> u128;
    fn swap_exact_out(
        env: Env,
        from: Address,
        token_in: Address,
        token_out: Address,
        amount_out: u128,
        max_in: u128,
    ) -> u128;
    fn quote_exact_out(env: Env, token_in: Address, token_out: Address, amount_out: u128) -> u128;
}

#[contracttype]
pub enum DataKey {
    Admin,
    LendVault,
    Oracle,
    Router,
    LiquidationBonus,        // u128, parts-per-10000 of post-repay surplus
    MinTradeGap,             // u64 seconds
    MaxPriceAge,             // u64 seconds
    PoolCounter,             // u32
    Pool(u32),
    PositionCounter,         // u64
    Position(u64),
    UserPositions(Address),  // Vec<u64>
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pool {
    pub vault: Address,
    pub token0: Address,
    pub token1: Address,
    pub max_price_deviation: u128,
    pub open_debt_ratio: u128,
    pub liquidate_debt_ratio: u128,
    pub total_lp: u128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PositionStatus {
    Open,
    Closed,
    Liquidated,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Position {
    pub owner: Address,
    pub pool_id: u32,
    pub lp_share: u128,
    pub debt_share0: u128,
    pub debt_share1: u128,
    pub opened_at: u64,
    pub status: PositionStatus,
}

/// Projected settlement of a position at current prices. `net*` are signed:
/// negative means the withdrawn side alone cannot clear that side's debt.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClosePreview {
    pub amount0: u128,
    pub amount1: u128,
    pub debt0: u128,
    pub debt1: u128,
    pub net0: i128,
    pub net1: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub admin: Address,
    pub lend_vault: Address,
    pub oracle: Address,
    pub router: Address,
    pub liquidation_bonus: u128,
    pub min_trade_gap: u64,
    pub max_price_age: u64,
}

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    for key in [
        DataKey::Admin,
        DataKey::LendVault,
        DataKey::Oracle,
        DataKey::Router,
        DataKey::LiquidationBonus,
        DataKey::MinTradeGap,
        DataKey::MaxPriceAge,
        DataKey::PoolCounter,
        DataKey::PositionCounter,
    ] {
        if persistent.has(&key) {
            persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
        }
    }
}

pub fn bump_pool_ttl(env: &Env, pool_id: u32) {
    let key = DataKey::Pool(pool_id);
    let persistent = env.storage().persistent();
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn bump_position_ttl(env: &Env, position_id: u64) {
    let key = DataKey::Position(position_id);
    let persistent = env.storage().persistent();
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn bump_user_positions_ttl(env: &Env, user: &Address) {
    let key = DataKey::UserPositions(user.clone());
    let persistent = env.storage().persistent();
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}
