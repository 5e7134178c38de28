use soroban_sdk::auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation};
use soroban_sdk::{panic_with_error, token, Address, Env, IntoVal, Symbol, Vec};

use crate::constants::*;
use crate::errors::Error;
use crate::storage::*;

pub fn require_admin(env: &Env, admin: &Address) {
    let stored: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    bump_core_ttl(env);
    if stored != *admin {
        panic_with_error!(env, Error::Authorization);
    }
    admin.require_auth();
}

pub fn get_config(env: &Env) -> Config {
    let persistent = env.storage().persistent();
    let admin: Address = persistent
        .get(&DataKey::Admin)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    Config {
        admin,
        lend_vault: persistent.get(&DataKey::LendVault).unwrap(),
        oracle: persistent.get(&DataKey::Oracle).unwrap(),
        router: persistent.get(&DataKey::Router).unwrap(),
        liquidation_bonus: persistent.get(&DataKey::LiquidationBonus).unwrap(),
        min_trade_gap: persistent.get(&DataKey::MinTradeGap).unwrap(),
        max_price_age: persistent.get(&DataKey::MaxPriceAge).unwrap(),
    }
}

pub fn lend_vault(env: &Env) -> LendVaultClient<'_> {
    let addr: Address = env
        .storage()
        .persistent()
        .get(&DataKey::LendVault)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    LendVaultClient::new(env, &addr)
}

pub fn oracle(env: &Env) -> PriceOracleClient<'_> {
    let addr: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Oracle)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    PriceOracleClient::new(env, &addr)
}

pub fn router_address(env: &Env) -> Address {
    env.storage()
        .persistent()
        .get(&DataKey::Router)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation))
}

pub fn get_pool(env: &Env, pool_id: u32) -> Pool {
    bump_pool_ttl(env, pool_id);
    env.storage()
        .persistent()
        .get(&DataKey::Pool(pool_id))
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation))
}

pub fn set_pool(env: &Env, pool_id: u32, pool: &Pool) {
    env.storage().persistent().set(&DataKey::Pool(pool_id), pool);
    bump_pool_ttl(env, pool_id);
}

pub fn get_position(env: &Env, position_id: u64) -> Position {
    bump_position_ttl(env, position_id);
    env.storage()
        .persistent()
        .get(&DataKey::Position(position_id))
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation))
}

pub fn set_position(env: &Env, position_id: u64, position: &Position) {
    env.storage()
        .persistent()
        .set(&DataKey::Position(position_id), position);
    bump_position_ttl(env, position_id);
}

pub fn next_position_id(env: &Env) -> u64 {
    let id: u64 = env
        .storage()
        .persistent()
        .get(&DataKey::PositionCounter)
        .unwrap_or(0u64)
        + 1;
    env.storage()
        .persistent()
        .set(&DataKey::PositionCounter, &id);
    id
}

pub fn push_user_position(env: &Env, user: &Address, id: u64) {
    let mut positions: Vec<u64> = env
        .storage()
        .persistent()
        .get(&DataKey::UserPositions(user.clone()))
        .unwrap_or(Vec::new(env));
    positions.push_back(id);
    env.storage()
        .persistent()
        .set(&DataKey::UserPositions(user.clone()), &positions);
    bump_user_positions_ttl(env, user);
}

pub fn remove_user_position(env: &Env, user: &Address, id: u64) {
    let positions: Vec<u64> = env
        .storage()
        .persistent()
        .get(&DataKey::UserPositions(user.clone()))
        .unwrap_or(Vec::new(env));
    let mut out = Vec::new(env);
    for p in positions.iter() {
        if p != id {
            out.push_back(p);
        }
    }
    env.storage()
        .persistent()
        .set(&DataKey::UserPositions(user.clone()), &out);
    bump_user_positions_ttl(env, user);
}

pub fn mul_div_floor(env: &Env, a: u128, b: u128, denom: u128) -> u128 {
    if denom == 0 {
        panic_with_error!(env, Error::Validation);
    }
    a.checked_mul(b)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation))
        / denom
}

pub fn mul_div_ceil(env: &Env, a: u128, b: u128, denom: u128) -> u128 {
    if denom == 0 {
        panic_with_error!(env, Error::Validation);
    }
    let product = a
        .checked_mul(b)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    product / denom + u128::from(product % denom != 0)
}

/// Spot/TWAP divergence in parts-per-10000 of the TWAP, cross-multiplied so
/// the two `(price, scale)` pairs never need a common scale.
pub fn price_deviation(env: &Env, spot: (u128, u128), twap: (u128, u128)) -> u128 {
    let lhs = spot
        .0
        .checked_mul(twap.1)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    let rhs = twap
        .0
        .checked_mul(spot.1)
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    let diff = lhs.abs_diff(rhs);
    mul_div_floor(env, diff, RATIO_SCALE, rhs)
}

pub fn require_price_in_band(env: &Env, pool: &Pool) {
    let oracle = oracle(env);
    let twap = oracle.price(&pool.token0, &pool.token1);
    let spot = oracle.spot_price(&pool.token0, &pool.token1);
    if price_deviation(env, spot, twap) > pool.max_price_deviation {
        panic_with_error!(env, Error::PriceIntegrity);
    }
}

/// Debt-to-collateral ratio in parts-per-10000, both sides valued in token1
/// units via the TWAP. Collateral is the pro-rata claim on the external
/// vault; debt is what repaying both shares would cost right now.
pub fn compute_health(env: &Env, pool: &Pool, position: &Position) -> u128 {
    let lend = lend_vault(env);
    let debt0 = if position.debt_share0 > 0 {
        lend.preview_repay(&pool.token0, &position.debt_share0)
    } else {
        0
    };
    let debt1 = if position.debt_share1 > 0 {
        lend.preview_repay(&pool.token1, &position.debt_share1)
    } else {
        0
    };
    let rate = oracle(env).price(&pool.token0, &pool.token1);
    let debt_value = mul_div_ceil(env, debt0, rate.0, rate.1) + debt1;
    if debt_value == 0 {
        return 0;
    }

    let vault = PositionVaultClient::new(env, &pool.vault);
    let (held0, held1) = vault.get_total_amounts();
    let total_share = vault.total_share();
    let (claim0, claim1) = if total_share == 0 {
        (0, 0)
    } else {
        (
            mul_div_floor(env, held0, position.lp_share, total_share),
            mul_div_floor(env, held1, position.lp_share, total_share),
        )
    };
    let collateral_value = mul_div_floor(env, claim0, rate.0, rate.1) + claim1;
    if collateral_value == 0 {
        return HEALTH_MAX;
    }
    mul_div_floor(env, debt_value, RATIO_SCALE, collateral_value)
}

/// Pre-authorizes the nested `transfer(self -> to, amount)` a collaborator
/// performs when pulling funds from this contract.
pub fn authorize_pull(env: &Env, token: &Address, to: &Address, amount: u128) {
    let from = env.current_contract_address();
    let args = (from, to.clone(), amount as i128).into_val(env);
    let ctx = ContractContext {
        contract: token.clone(),
        fn_name: Symbol::new(env, "transfer"),
        args,
    };
    let mut auths = Vec::new(env);
    auths.push_back(InvokerContractAuthEntry::Contract(SubContractInvocation {
        context: ctx,
        sub_invocations: Vec::new(env),
    }));
    env.authorize_as_current_contract(auths);
}

/// Grants the lend vault a one-repay allowance; `repay` settles through
/// `transfer_from` and the amount is exact at the current ledger.
pub fn approve_repay(env: &Env, token: &Address, spender: &Address, amount: u128) {
    let expiry = env.ledger().sequence() + 1;
    token::Client::new(env, token).approve(
        &env.current_contract_address(),
        spender,
        &(amount as i128),
        &expiry,
    );
}
