#![cfg(test)]

use super::*;
use interest_model::InterestModel;
use lend_vault::{LendVault, LendVaultClient};
use mock_position_vault::{MockPositionVault, MockPositionVaultClient};
use mock_price_oracle::{MockPriceOracle, MockPriceOracleClient};
use mock_swap_router::{MockSwapRouter, MockSwapRouterClient};
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, Env, String};

const MULTIPLIER: u128 = 3_963_723_998u128;
const JUMP: u128 = 221_968_543_885u128;
const KINK: u128 = 8_000u128;

const MAX_DEVIATION: u128 = 100; // 1%
const OPEN_RATIO: u128 = 8_500;
const LIQUIDATE_RATIO: u128 = 9_000;
const LIQUIDATION_BONUS: u128 = 1_000; // 10% of surplus
const MIN_TRADE_GAP: u64 = 300;
const MAX_PRICE_AGE: u64 = 3_600;

struct Setup<'a> {
    env: Env,
    admin: Address,
    user: Address,
    token0: Address,
    token1: Address,
    lend: LendVaultClient<'a>,
    pos_vault: MockPositionVaultClient<'a>,
    oracle: MockPriceOracleClient<'a>,
    router: MockSwapRouterClient<'a>,
    lev: LeveragePairVaultClient<'a>,
    lev_id: Address,
    pool_id: u32,
}

fn setup() -> Setup<'static> {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|l| l.timestamp = 1_000);

    let admin = Address::generate(&env);
    let user = Address::generate(&env);
    let supplier = Address::generate(&env);

    let sac0 = env.register_stellar_asset_contract_v2(admin.clone());
    let sac1 = env.register_stellar_asset_contract_v2(admin.clone());
    let token0 = sac0.address();
    let token1 = sac1.address();
    let mint0 = token::StellarAssetClient::new(&env, &token0);
    let mint1 = token::StellarAssetClient::new(&env, &token1);

    let model_id = env.register(InterestModel, ());
    interest_model::InterestModelClient::new(&env, &model_id).initialize(
        &admin, &0u128, &MULTIPLIER, &JUMP, &KINK,
    );

    let lend_id = env.register(LendVault, ());
    let lend = LendVaultClient::new(&env, &lend_id);
    lend.initialize(&admin, &model_id);
    lend.add_bank(&admin, &token0, &1u32, &String::from_str(&env, "ibT0"));
    lend.add_bank(&admin, &token1, &1u32, &String::from_str(&env, "ibT1"));

    let pos_vault_id = env.register(MockPositionVault, ());
    let pos_vault = MockPositionVaultClient::new(&env, &pos_vault_id);
    pos_vault.initialize(&token0, &token1);

    let oracle_id = env.register(MockPriceOracle, ());
    let oracle = MockPriceOracleClient::new(&env, &oracle_id);
    // Parity pair: 1 token0 = 1 token1.
    oracle.set_price(&token0, &token1, &1u128, &1u128);

    let router_id = env.register(MockSwapRouter, ());
    let router = MockSwapRouterClient::new(&env, &router_id);
    router.set_rate(&token0, &token1, &1u128, &1u128);
    router.set_rate(&token1, &token0, &1u128, &1u128);
    mint0.mint(&router_id, &1_000_000i128);
    mint1.mint(&router_id, &1_000_000i128);

    let lev_id = env.register(LeveragePairVault, ());
    let lev = LeveragePairVaultClient::new(&env, &lev_id);
    lev.initialize(
        &admin,
        &lend_id,
        &oracle_id,
        &router_id,
        &LIQUIDATION_BONUS,
        &MIN_TRADE_GAP,
        &MAX_PRICE_AGE,
    );
    lend.set_debtor(&admin, &lev_id, &true);

    let pool_id = lev.add_pool(
        &admin,
        &pos_vault_id,
        &token0,
        &token1,
        &MAX_DEVIATION,
        &OPEN_RATIO,
        &LIQUIDATE_RATIO,
    );

    mint0.mint(&supplier, &100_000i128);
    mint1.mint(&supplier, &100_000i128);
    lend.deposit(&supplier, &token0, &100_000u128);
    lend.deposit(&supplier, &token1, &100_000u128);

    mint0.mint(&user, &100_000i128);
    mint1.mint(&user, &100_000i128);

    Setup {
        env,
        admin,
        user,
        token0,
        token1,
        lend,
        pos_vault,
        oracle,
        router,
        lev,
        lev_id,
        pool_id,
    }
}

/// 1_000 + 1_000 own margin, 3_000 + 3_000 borrowed: health 7_500.
fn open_standard(s: &Setup) -> u64 {
    s.lev.open_position(
        &s.user,
        &s.pool_id,
        &1_000u128,
        &1_000u128,
        &3_000u128,
        &3_000u128,
    )
}

fn advance(env: &Env, secs: u64) {
    env.ledger().with_mut(|l| l.timestamp += secs);
}

#[test]
fn add_pool_assigns_ids_and_validates_ratios() {
    let s = setup();
    assert_eq!(s.pool_id, 1);
    let pool = s.lev.get_pool(&s.pool_id);
    assert_eq!(pool.token0, s.token0);
    assert_eq!(pool.open_debt_ratio, OPEN_RATIO);
    assert_eq!(pool.total_lp, 0);
    assert_eq!(s.lev.get_pool_count(), 1);
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")]
fn rejects_open_ratio_at_or_above_liquidate_ratio() {
    let s = setup();
    s.lev.add_pool(
        &s.admin,
        &s.pos_vault.address,
        &s.token0,
        &s.token1,
        &MAX_DEVIATION,
        &9_000u128,
        &9_000u128,
    );
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn rejects_pool_registration_by_non_admin() {
    let s = setup();
    let stranger = Address::generate(&s.env);
    s.lev.add_pool(
        &stranger,
        &s.pos_vault.address,
        &s.token0,
        &s.token1,
        &MAX_DEVIATION,
        &OPEN_RATIO,
        &LIQUIDATE_RATIO,
    );
}

#[test]
fn open_position_records_shares_and_debt() {
    let s = setup();
    let id = open_standard(&s);
    assert_eq!(id, 1);

    let position = s.lev.get_position(&id);
    assert_eq!(position.owner, s.user);
    assert_eq!(position.status, PositionStatus::Open);
    // First LP mint in the mock vault is amount0 + amount1.
    assert_eq!(position.lp_share, 8_000);
    assert_eq!(position.debt_share0, 3_000);
    assert_eq!(position.debt_share1, 3_000);

    assert_eq!(s.lev.get_pool(&s.pool_id).total_lp, 8_000);
    assert_eq!(s.lev.get_user_positions(&s.user), soroban_sdk::vec![&s.env, 1u64]);
    assert_eq!(s.lend.get_debt_share(&s.token0, &s.lev_id), 3_000);
    assert_eq!(s.lend.get_debt_share(&s.token1, &s.lev_id), 3_000);
    assert_eq!(s.pos_vault.get_total_amounts(), (4_000, 4_000));
    assert_eq!(s.lev.pos_health(&id), 7_500);
}

#[test]
fn over_ratio_open_reverts_without_state_change() {
    let s = setup();
    // 12_000 debt against 14_000 collateral: 8_571 > 8_500.
    let result = s.lev.try_open_position(
        &s.user,
        &s.pool_id,
        &1_000u128,
        &1_000u128,
        &6_000u128,
        &6_000u128,
    );
    assert!(result.is_err());

    assert_eq!(s.lev.get_pool(&s.pool_id).total_lp, 0);
    assert_eq!(s.lev.get_user_positions(&s.user).len(), 0);
    assert_eq!(s.lend.get_debt_share(&s.token0, &s.lev_id), 0);
    assert_eq!(s.lend.get_bank(&s.token0).total_debt, 0);
    assert_eq!(s.pos_vault.total_share(), 0);
    assert_eq!(
        token::Client::new(&s.env, &s.token0).balance(&s.user),
        100_000
    );
}

#[test]
#[should_panic(expected = "Error(Contract, #6)")]
fn open_rejects_spot_outside_deviation_band() {
    let s = setup();
    // 2% spot/TWAP gap against a 1% band.
    s.oracle.set_spot(&s.token0, &s.token1, &102u128, &100u128);
    open_standard(&s);
}

#[test]
fn cover_adds_margin_without_touching_debt() {
    let s = setup();
    let id = open_standard(&s);
    s.lev.cover_position(&s.user, &id, &1_000u128, &1_000u128);

    let position = s.lev.get_position(&id);
    // 8_000 shares over 8_000 held tokens: 2_000 in mints 2_000 shares.
    assert_eq!(position.lp_share, 10_000);
    assert_eq!(position.debt_share0, 3_000);
    assert_eq!(s.lev.get_pool(&s.pool_id).total_lp, 10_000);
    assert_eq!(s.lev.pos_health(&id), 6_000);
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn cover_rejects_non_owner() {
    let s = setup();
    let id = open_standard(&s);
    let stranger = Address::generate(&s.env);
    token::StellarAssetClient::new(&s.env, &s.token0).mint(&stranger, &10_000i128);
    s.lev.cover_position(&stranger, &id, &1_000u128, &0u128);
}

#[test]
fn close_returns_surplus_and_clears_debt() {
    let s = setup();
    let id = open_standard(&s);

    let t0 = token::Client::new(&s.env, &s.token0);
    let t1 = token::Client::new(&s.env, &s.token1);
    let before0 = t0.balance(&s.user);
    let before1 = t1.balance(&s.user);

    s.lev.close_position(&s.user, &id);

    // No price move, no interest: the margin comes straight back.
    assert_eq!(t0.balance(&s.user) - before0, 1_000);
    assert_eq!(t1.balance(&s.user) - before1, 1_000);
    assert_eq!(s.lev.get_position(&id).status, PositionStatus::Closed);
    assert_eq!(s.lev.get_pool(&s.pool_id).total_lp, 0);
    assert_eq!(s.lev.get_user_positions(&s.user).len(), 0);
    assert_eq!(s.lend.get_debt_share(&s.token0, &s.lev_id), 0);
    assert_eq!(s.lend.get_bank(&s.token0).total_debt, 0);
    assert_eq!(s.lend.get_bank(&s.token1).total_debt, 0);
    assert_eq!(s.lev.pos_health(&id), 0);
}

#[test]
#[should_panic(expected = "Error(Contract, #5)")]
fn close_rejects_settled_position() {
    let s = setup();
    let id = open_standard(&s);
    s.lev.close_position(&s.user, &id);
    s.lev.close_position(&s.user, &id);
}

#[test]
fn close_preview_matches_shortfall_settlement() {
    let s = setup();
    let id = open_standard(&s);
    let sink = Address::generate(&s.env);
    // Drain token0 so that side alone can no longer clear its debt.
    s.pos_vault.skim(&1_600u128, &0u128, &sink);

    let preview = s.lev.close_position_pre(&id);
    assert_eq!(preview.amount0, 2_400);
    assert_eq!(preview.amount1, 4_000);
    assert_eq!(preview.debt0, 3_000);
    assert_eq!(preview.debt1, 3_000);
    assert_eq!(preview.net0, -600);
    assert_eq!(preview.net1, 1_000);

    let t0 = token::Client::new(&s.env, &s.token0);
    let t1 = token::Client::new(&s.env, &s.token1);
    let before0 = t0.balance(&s.user);
    let before1 = t1.balance(&s.user);

    s.lev.close_position(&s.user, &id);

    // 600 token1 swapped at parity to fill the token0 hole; combined
    // surplus equals the preview's net total.
    assert_eq!(t0.balance(&s.user) - before0, 0);
    assert_eq!(t1.balance(&s.user) - before1, 400);
    assert_eq!(s.lend.get_bank(&s.token0).total_debt, 0);
    assert_eq!(s.lend.get_bank(&s.token1).total_debt, 0);
}

#[test]
#[should_panic(expected = "Error(Contract, #7)")]
fn close_rejects_uncoverable_shortfall() {
    let s = setup();
    let id = open_standard(&s);
    let sink = Address::generate(&s.env);
    // Collateral value drops below total debt; the other side's whole
    // output cannot fill the hole.
    s.pos_vault.skim(&3_000u128, &0u128, &sink);
    s.lev.close_position(&s.user, &id);
}

#[test]
#[should_panic(expected = "Error(Contract, #7)")]
fn close_rejects_router_rate_beyond_deviation_allowance() {
    let s = setup();
    let id = open_standard(&s);
    let sink = Address::generate(&s.env);
    s.pos_vault.skim(&1_600u128, &0u128, &sink);
    // Router asks 619 token1 for 600 token0; the TWAP cap allows 606.
    s.router.set_rate(&s.token1, &s.token0, &97u128, &100u128);
    s.lev.close_position(&s.user, &id);
}

#[test]
#[should_panic(expected = "Error(Contract, #5)")]
fn liquidate_rejects_healthy_position() {
    let s = setup();
    let id = open_standard(&s);
    let liquidator = Address::generate(&s.env);
    s.lev.liquidate(&liquidator, &id);
}

#[test]
#[should_panic(expected = "Error(Contract, #6)")]
fn liquidate_rejects_fresh_vault_trade() {
    let s = setup();
    let id = open_standard(&s);
    let sink = Address::generate(&s.env);
    s.pos_vault.skim(&1_600u128, &0u128, &sink);
    // Unhealthy, but the open deposit just touched the vault.
    let liquidator = Address::generate(&s.env);
    s.lev.liquidate(&liquidator, &id);
}

#[test]
#[should_panic(expected = "Error(Contract, #6)")]
fn liquidate_rejects_stale_oracle() {
    let s = setup();
    let id = open_standard(&s);
    let sink = Address::generate(&s.env);
    s.pos_vault.skim(&1_600u128, &0u128, &sink);
    advance(&s.env, MAX_PRICE_AGE + 60);
    let liquidator = Address::generate(&s.env);
    s.lev.liquidate(&liquidator, &id);
}

#[test]
fn liquidation_clears_debt_and_splits_surplus() {
    let s = setup();
    let id = open_standard(&s);
    let sink = Address::generate(&s.env);
    // Health 6_000 / 6_400 = 9_375, above the 9_000 trigger.
    s.pos_vault.skim(&1_600u128, &0u128, &sink);
    advance(&s.env, MIN_TRADE_GAP);
    s.oracle.set_price(&s.token0, &s.token1, &1u128, &1u128);
    assert_eq!(s.lev.pos_health(&id), 9_375);

    let liquidator = Address::generate(&s.env);
    let t1 = token::Client::new(&s.env, &s.token1);
    let owner_before = t1.balance(&s.user);

    s.lev.liquidate(&liquidator, &id);

    // Surplus after the shortfall swap is 400 token1: 10% to the caller.
    assert_eq!(t1.balance(&liquidator), 40);
    assert_eq!(t1.balance(&s.user) - owner_before, 360);
    assert_eq!(s.lev.get_position(&id).status, PositionStatus::Liquidated);
    assert_eq!(s.lev.get_pool(&s.pool_id).total_lp, 0);
    assert_eq!(s.lend.get_debt_share(&s.token0, &s.lev_id), 0);
    assert_eq!(s.lend.get_bank(&s.token0).total_debt, 0);
    assert_eq!(s.lend.get_bank(&s.token1).total_debt, 0);
    assert_eq!(s.lev.get_user_positions(&s.user).len(), 0);
}

#[test]
fn health_values_both_sides_at_the_oracle_rate() {
    let s = setup();
    // 1 token0 = 2 token1; the scale folds any decimal gap into the price.
    s.oracle.set_price(&s.token0, &s.token1, &2u128, &1u128);
    let id = s.lev.open_position(
        &s.user,
        &s.pool_id,
        &1_000u128,
        &1_000u128,
        &1_000u128,
        &1_000u128,
    );
    // Debt 2_000 + 1_000, collateral 4_000 + 2_000, both in token1 units.
    assert_eq!(s.lev.pos_health(&id), 5_000);

    let t0 = token::Client::new(&s.env, &s.token0);
    let t1 = token::Client::new(&s.env, &s.token1);
    let before0 = t0.balance(&s.user);
    let before1 = t1.balance(&s.user);
    s.lev.close_position(&s.user, &id);
    assert_eq!(t0.balance(&s.user) - before0, 1_000);
    assert_eq!(t1.balance(&s.user) - before1, 1_000);
}

#[test]
fn pos_health_is_idempotent() {
    let s = setup();
    let id = open_standard(&s);
    let bank_before = s.lend.get_bank(&s.token0);
    let first = s.lev.pos_health(&id);
    let second = s.lev.pos_health(&id);
    assert_eq!(first, second);
    assert_eq!(s.lend.get_bank(&s.token0), bank_before);
    assert_eq!(s.lev.get_position(&id), s.lev.get_position(&id));
}

#[test]
fn debt_shares_aggregate_across_positions() {
    let s = setup();
    let first = open_standard(&s);
    let second = s.lev.open_position(
        &s.user,
        &s.pool_id,
        &2_000u128,
        &2_000u128,
        &1_000u128,
        &1_000u128,
    );
    let p1 = s.lev.get_position(&first);
    let p2 = s.lev.get_position(&second);
    assert_eq!(
        s.lend.get_debt_share(&s.token0, &s.lev_id),
        p1.debt_share0 + p2.debt_share0
    );
    assert_eq!(
        s.lev.get_pool(&s.pool_id).total_lp,
        p1.lp_share + p2.lp_share
    );
    assert_eq!(s.lev.get_user_positions(&s.user).len(), 2);
}

#[test]
fn update_pool_applies_to_future_checks_only() {
    let s = setup();
    let id = open_standard(&s);
    assert_eq!(s.lev.pos_health(&id), 7_500);
    // Tightening below the live health leaves the position open but
    // makes it liquidatable at the next check.
    s.lev
        .update_pool(&s.admin, &s.pool_id, &MAX_DEVIATION, &6_000u128, &7_000u128);
    assert_eq!(s.lev.get_position(&id).status, PositionStatus::Open);

    advance(&s.env, MIN_TRADE_GAP);
    s.oracle.set_price(&s.token0, &s.token1, &1u128, &1u128);
    let liquidator = Address::generate(&s.env);
    s.lev.liquidate(&liquidator, &id);
    assert_eq!(s.lev.get_position(&id).status, PositionStatus::Liquidated);
}
