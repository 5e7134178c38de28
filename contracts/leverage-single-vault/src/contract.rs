use soroban_sdk::{contract, contractimpl, panic_with_error, token, Address, Env, Vec};

use crate::constants::*;
use crate::errors::Error;
use crate::events::*;
use crate::helpers::*;
use crate::storage::*;

#[contract]
pub struct LeverageSingleVault;

#[contractimpl]
impl LeverageSingleVault {
    pub fn initialize(
        env: Env,
        admin: Address,
        lend_vault: Address,
        oracle: Address,
        router: Address,
        liquidation_bonus: u128,
        min_trade_gap: u64,
        max_price_age: u64,
    ) {
        if env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::Admin)
            .is_some()
        {
            panic_with_error!(&env, Error::Validation);
        }
        admin.require_auth();
        if liquidation_bonus > RATIO_SCALE {
            panic_with_error!(&env, Error::Validation);
        }
        let persistent = env.storage().persistent();
        persistent.set(&DataKey::Admin, &admin);
        persistent.set(&DataKey::LendVault, &lend_vault);
        persistent.set(&DataKey::Oracle, &oracle);
        persistent.set(&DataKey::Router, &router);
        persistent.set(&DataKey::LiquidationBonus, &liquidation_bonus);
        persistent.set(&DataKey::MinTradeGap, &min_trade_gap);
        persistent.set(&DataKey::MaxPriceAge, &max_price_age);
        persistent.set(&DataKey::PoolCounter, &0u32);
        persistent.set(&DataKey::PositionCounter, &0u64);
        bump_core_ttl(&env);
    }

    pub fn set_params(
        env: Env,
        admin: Address,
        liquidation_bonus: u128,
        min_trade_gap: u64,
        max_price_age: u64,
    ) {
        require_admin(&env, &admin);
        if liquidation_bonus > RATIO_SCALE {
            panic_with_error!(&env, Error::Validation);
        }
        let persistent = env.storage().persistent();
        persistent.set(&DataKey::LiquidationBonus, &liquidation_bonus);
        persistent.set(&DataKey::MinTradeGap, &min_trade_gap);
        persistent.set(&DataKey::MaxPriceAge, &max_price_age);
        ParamsUpdated {
            liquidation_bonus,
            min_trade_gap,
            max_price_age,
        }
        .publish(&env);
    }

    pub fn set_admin(env: Env, admin: Address, new_admin: Address) {
        require_admin(&env, &admin);
        env.storage().persistent().set(&DataKey::Admin, &new_admin);
        AdminChanged { admin: new_admin }.publish(&env);
    }

    pub fn add_pool(
        env: Env,
        admin: Address,
        vault: Address,
        token0: Address,
        token1: Address,
        zero_for_one: bool,
        max_price_deviation: u128,
        open_debt_ratio: u128,
        liquidate_debt_ratio: u128,
    ) -> u32 {
        require_admin(&env, &admin);
        validate_ratios(&env, max_price_deviation, open_debt_ratio, liquidate_debt_ratio);
        let pool_id: u32 = env
            .storage()
            .persistent()
            .get(&DataKey::PoolCounter)
            .unwrap_or(0u32)
            + 1;
        env.storage()
            .persistent()
            .set(&DataKey::PoolCounter, &pool_id);
        let pool = Pool {
            vault: vault.clone(),
            token0: token0.clone(),
            token1: token1.clone(),
            zero_for_one,
            max_price_deviation,
            open_debt_ratio,
            liquidate_debt_ratio,
            total_lp: 0,
        };
        set_pool(&env, pool_id, &pool);
        PoolAdded {
            pool_id,
            vault,
            token0,
            token1,
            zero_for_one,
        }
        .publish(&env);
        pool_id
    }

    pub fn update_pool(
        env: Env,
        admin: Address,
        pool_id: u32,
        max_price_deviation: u128,
        open_debt_ratio: u128,
        liquidate_debt_ratio: u128,
    ) {
        require_admin(&env, &admin);
        validate_ratios(&env, max_price_deviation, open_debt_ratio, liquidate_debt_ratio);
        let mut pool = get_pool(&env, pool_id);
        pool.max_price_deviation = max_price_deviation;
        pool.open_debt_ratio = open_debt_ratio;
        pool.liquidate_debt_ratio = liquidate_debt_ratio;
        set_pool(&env, pool_id, &pool);
        PoolUpdated {
            pool_id,
            max_price_deviation,
            open_debt_ratio,
            liquidate_debt_ratio,
        }
        .publish(&env);
    }

    /// Margin and debt both live on the pool's selected side; the external
    /// vault rebalances into whatever mix it needs.
    pub fn open_position(env: Env, user: Address, pool_id: u32, amount: u128, debt: u128) -> u64 {
        bump_core_ttl(&env);
        user.require_auth();
        let mut pool = get_pool(&env, pool_id);
        if amount == 0 {
            panic_with_error!(&env, Error::Validation);
        }
        let this = env.current_contract_address();
        pull(&env, pool.debt_token(), &user, &this, amount);

        let debt_share = if debt > 0 {
            lend_vault(&env).borrow(&this, pool.debt_token(), &debt)
        } else {
            0
        };

        require_price_in_band(&env, &pool);

        let lp_share = deposit_into_vault(&env, &pool, amount + debt);

        let position_id = next_position_id(&env);
        let position = Position {
            owner: user.clone(),
            pool_id,
            lp_share,
            debt_share,
            opened_at: env.ledger().timestamp(),
            status: PositionStatus::Open,
        };
        set_position(&env, position_id, &position);
        pool.total_lp += lp_share;
        set_pool(&env, pool_id, &pool);
        push_user_position(&env, &user, position_id);

        if compute_health(&env, &pool, &position) > pool.open_debt_ratio {
            panic_with_error!(&env, Error::RatioViolation);
        }

        PositionOpened {
            position_id,
            owner: user,
            pool_id,
            lp_share,
            debt_share,
        }
        .publish(&env);
        position_id
    }

    pub fn cover_position(env: Env, user: Address, position_id: u64, amount: u128) {
        bump_core_ttl(&env);
        user.require_auth();
        let mut position = get_position(&env, position_id);
        if position.owner != user {
            panic_with_error!(&env, Error::Authorization);
        }
        if position.status != PositionStatus::Open {
            panic_with_error!(&env, Error::PositionState);
        }
        if amount == 0 {
            panic_with_error!(&env, Error::Validation);
        }
        let mut pool = get_pool(&env, position.pool_id);
        let this = env.current_contract_address();
        pull(&env, pool.debt_token(), &user, &this, amount);

        let lp_added = deposit_into_vault(&env, &pool, amount);
        position.lp_share += lp_added;
        set_position(&env, position_id, &position);
        pool.total_lp += lp_added;
        set_pool(&env, position.pool_id, &pool);

        if compute_health(&env, &pool, &position) > pool.open_debt_ratio {
            panic_with_error!(&env, Error::RatioViolation);
        }

        PositionCovered {
            position_id,
            owner: user,
            lp_added,
        }
        .publish(&env);
    }

    pub fn close_position_pre(env: Env, position_id: u64) -> ClosePreview {
        let position = get_position(&env, position_id);
        let pool = get_pool(&env, position.pool_id);
        let vault = PositionVaultClient::new(&env, &pool.vault);
        let (held0, held1) = vault.get_total_amounts();
        let total_share = vault.total_share();
        let (amount0, amount1) = if total_share == 0 {
            (0, 0)
        } else {
            (
                mul_div_floor(&env, held0, position.lp_share, total_share),
                mul_div_floor(&env, held1, position.lp_share, total_share),
            )
        };
        let debt = if position.debt_share > 0 {
            lend_vault(&env).preview_repay(pool.debt_token(), &position.debt_share)
        } else {
            0
        };
        let (net0, net1) = if pool.zero_for_one {
            (amount0 as i128 - debt as i128, amount1 as i128)
        } else {
            (amount0 as i128, amount1 as i128 - debt as i128)
        };
        ClosePreview {
            amount0,
            amount1,
            debt,
            net0,
            net1,
        }
    }

    pub fn close_position(env: Env, user: Address, position_id: u64) {
        bump_core_ttl(&env);
        user.require_auth();
        let mut position = get_position(&env, position_id);
        if position.owner != user {
            panic_with_error!(&env, Error::Authorization);
        }
        if position.status != PositionStatus::Open {
            panic_with_error!(&env, Error::PositionState);
        }
        let mut pool = get_pool(&env, position.pool_id);

        let (surplus0, surplus1) = unwind(&env, position_id, &pool, &position);
        pay_out(&env, &pool.token0, &user, surplus0);
        pay_out(&env, &pool.token1, &user, surplus1);

        pool.total_lp -= position.lp_share;
        set_pool(&env, position.pool_id, &pool);
        position.status = PositionStatus::Closed;
        set_position(&env, position_id, &position);
        remove_user_position(&env, &user, position_id);

        PositionClosed {
            position_id,
            owner: user,
            surplus0,
            surplus1,
        }
        .publish(&env);
    }

    pub fn liquidate(env: Env, liquidator: Address, position_id: u64) {
        bump_core_ttl(&env);
        liquidator.require_auth();
        let mut position = get_position(&env, position_id);
        if position.status != PositionStatus::Open {
            panic_with_error!(&env, Error::PositionState);
        }
        let mut pool = get_pool(&env, position.pool_id);
        if compute_health(&env, &pool, &position) <= pool.liquidate_debt_ratio {
            panic_with_error!(&env, Error::PositionState);
        }
        let config = get_config(&env);
        let now = env.ledger().timestamp();
        let last_trade = PositionVaultClient::new(&env, &pool.vault).last_trade_time();
        if now.saturating_sub(last_trade) < config.min_trade_gap {
            panic_with_error!(&env, Error::PriceIntegrity);
        }
        if now.saturating_sub(oracle(&env).last_timestamp()) > config.max_price_age {
            panic_with_error!(&env, Error::PriceIntegrity);
        }

        let (surplus0, surplus1) = unwind(&env, position_id, &pool, &position);
        let bonus0 = mul_div_floor(&env, surplus0, config.liquidation_bonus, RATIO_SCALE);
        let bonus1 = mul_div_floor(&env, surplus1, config.liquidation_bonus, RATIO_SCALE);
        pay_out(&env, &pool.token0, &liquidator, bonus0);
        pay_out(&env, &pool.token1, &liquidator, bonus1);
        pay_out(&env, &pool.token0, &position.owner, surplus0 - bonus0);
        pay_out(&env, &pool.token1, &position.owner, surplus1 - bonus1);

        pool.total_lp -= position.lp_share;
        set_pool(&env, position.pool_id, &pool);
        position.status = PositionStatus::Liquidated;
        set_position(&env, position_id, &position);
        remove_user_position(&env, &position.owner, position_id);

        PositionLiquidated {
            position_id,
            liquidator,
            owner: position.owner,
            bonus0,
            bonus1,
        }
        .publish(&env);
    }

    pub fn pos_health(env: Env, position_id: u64) -> u128 {
        let position = get_position(&env, position_id);
        if position.status != PositionStatus::Open {
            return 0;
        }
        let pool = get_pool(&env, position.pool_id);
        compute_health(&env, &pool, &position)
    }

    pub fn get_pool(env: Env, pool_id: u32) -> Pool {
        get_pool(&env, pool_id)
    }

    pub fn get_pool_count(env: Env) -> u32 {
        env.storage()
            .persistent()
            .get(&DataKey::PoolCounter)
            .unwrap_or(0u32)
    }

    pub fn get_position(env: Env, position_id: u64) -> Position {
        get_position(&env, position_id)
    }

    pub fn get_user_positions(env: Env, user: Address) -> Vec<u64> {
        bump_user_positions_ttl(&env, &user);
        env.storage()
            .persistent()
            .get(&DataKey::UserPositions(user))
            .unwrap_or(Vec::new(&env))
    }

    pub fn get_config(env: Env) -> Config {
        get_config(&env)
    }
}

fn validate_ratios(
    env: &Env,
    max_price_deviation: u128,
    open_debt_ratio: u128,
    liquidate_debt_ratio: u128,
) {
    if max_price_deviation > RATIO_SCALE
        || open_debt_ratio >= liquidate_debt_ratio
        || liquidate_debt_ratio > RATIO_SCALE
    {
        panic_with_error!(env, Error::Validation);
    }
}

fn pull(env: &Env, token: &Address, from: &Address, to: &Address, amount: u128) {
    if amount > 0 {
        token::Client::new(env, token).transfer(from, to, &(amount as i128));
    }
}

fn pay_out(env: &Env, token: &Address, to: &Address, amount: u128) {
    if amount > 0 {
        token::Client::new(env, token).transfer(&env.current_contract_address(), to, &(amount as i128));
    }
}

fn deposit_into_vault(env: &Env, pool: &Pool, amount: u128) -> u128 {
    authorize_pull(env, pool.debt_token(), &pool.vault, amount);
    let this = env.current_contract_address();
    let (amount0, amount1) = if pool.zero_for_one {
        (amount, 0)
    } else {
        (0, amount)
    };
    let lp = PositionVaultClient::new(env, &pool.vault).deposit(&this, &amount0, &amount1);
    if lp == 0 {
        panic_with_error!(env, Error::Validation);
    }
    lp
}

/// Withdraws the full claim (both assets come back even for a one-sided
/// position), swaps the other side's output when the selected side cannot
/// clear the debt, repays, and returns the per-asset remainder.
fn unwind(env: &Env, position_id: u64, pool: &Pool, position: &Position) -> (u128, u128) {
    let lend = lend_vault(env);
    if position.debt_share > 0 {
        lend.poke(pool.debt_token());
    }

    let this = env.current_contract_address();
    let (mut have0, mut have1) =
        PositionVaultClient::new(env, &pool.vault).withdraw(&this, &position.lp_share, &this);

    let owed = if position.debt_share > 0 {
        lend.preview_repay(pool.debt_token(), &position.debt_share)
    } else {
        0
    };

    let have_debt_side = if pool.zero_for_one { have0 } else { have1 };
    if have_debt_side < owed {
        let need = owed - have_debt_side;
        let rate = oracle(env).price(&pool.token0, &pool.token1);
        // Cost of `need` debt-side units in other-side units at the TWAP.
        let twap_cost = if pool.zero_for_one {
            mul_div_ceil(env, need, rate.0, rate.1)
        } else {
            mul_div_ceil(env, need, rate.1, rate.0)
        };
        let available = if pool.zero_for_one { have1 } else { have0 };
        let spent = cover_shortfall(
            env,
            position_id,
            pool,
            pool.other_token(),
            pool.debt_token(),
            need,
            available,
            twap_cost,
        );
        if pool.zero_for_one {
            have0 += need;
            have1 -= spent;
        } else {
            have1 += need;
            have0 -= spent;
        }
    }

    if position.debt_share > 0 {
        let lend_addr = get_config(env).lend_vault;
        approve_repay(env, pool.debt_token(), &lend_addr, owed);
        lend.repay(&this, pool.debt_token(), &position.debt_share);
    }

    if pool.zero_for_one {
        (have0 - owed, have1)
    } else {
        (have0, have1 - owed)
    }
}

fn cover_shortfall(
    env: &Env,
    position_id: u64,
    pool: &Pool,
    token_in: &Address,
    token_out: &Address,
    amount_out: u128,
    available_in: u128,
    twap_cost: u128,
) -> u128 {
    let router = router_address(env);
    let quoted =
        SwapRouterClient::new(env, &router).quote_exact_out(token_in, token_out, &amount_out);
    let cap = mul_div_ceil(
        env,
        twap_cost,
        RATIO_SCALE + pool.max_price_deviation,
        RATIO_SCALE,
    );
    if quoted > available_in || quoted > cap {
        panic_with_error!(env, Error::Settlement);
    }
    authorize_pull(env, token_in, &router, quoted);
    let this = env.current_contract_address();
    let spent = SwapRouterClient::new(env, &router).swap_exact_out(
        &this,
        token_in,
        token_out,
        &amount_out,
        &quoted,
    );
    ShortfallSwapped {
        position_id,
        token_in: token_in.clone(),
        token_out: token_out.clone(),
        amount_in: spent,
        amount_out,
    }
    .publish(env);
    spent
}
