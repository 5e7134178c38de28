#![cfg(test)]

use super::*;
use interest_model::InterestModel;
use soroban_sdk::testutils::{Address as _, Ledger};
use soroban_sdk::{token, Address, Env, String};

const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;
// ~10% APR at the 80% kink, ~150% APR at full utilization.
const MULTIPLIER: u128 = 3_963_723_998u128;
const JUMP: u128 = 221_968_543_885u128;
const KINK: u128 = 8_000u128;

struct Setup<'a> {
    env: Env,
    admin: Address,
    supplier: Address,
    debtor: Address,
    asset: Address,
    asset_admin: token::StellarAssetClient<'a>,
    vault: LendVaultClient<'a>,
    vault_id: Address,
}

fn setup() -> Setup<'static> {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().with_mut(|l| l.timestamp = 1_000);

    let admin = Address::generate(&env);
    let supplier = Address::generate(&env);
    let debtor = Address::generate(&env);

    let sac = env.register_stellar_asset_contract_v2(admin.clone());
    let asset = sac.address();
    let asset_admin = token::StellarAssetClient::new(&env, &asset);

    let model_id = env.register(InterestModel, ());
    interest_model::InterestModelClient::new(&env, &model_id).initialize(
        &admin, &0u128, &MULTIPLIER, &JUMP, &KINK,
    );

    let vault_id = env.register(LendVault, ());
    let vault = LendVaultClient::new(&env, &vault_id);
    vault.initialize(&admin, &model_id);
    vault.add_bank(&admin, &asset, &1u32, &String::from_str(&env, "ibTEST"));
    vault.set_debtor(&admin, &debtor, &true);

    asset_admin.mint(&supplier, &10_000_000i128);
    asset_admin.mint(&debtor, &10_000_000i128);

    Setup {
        env,
        admin,
        supplier,
        debtor,
        asset,
        asset_admin,
        vault,
        vault_id,
    }
}

fn approve_vault(s: &Setup, from: &Address, amount: i128) {
    let expiry = s.env.ledger().sequence() + 1000;
    token::Client::new(&s.env, &s.asset).approve(from, &s.vault_id, &amount, &expiry);
}

fn advance(env: &Env, secs: u64) {
    env.ledger().with_mut(|l| l.timestamp += secs);
}

#[test]
fn initialize_and_register_bank() {
    let s = setup();
    assert_eq!(s.vault.get_admin(), s.admin);
    assert_eq!(s.vault.get_banks().len(), 1);
    let bank = s.vault.get_bank(&s.asset);
    assert_eq!(bank.total_balance, 0);
    assert_eq!(bank.total_share, 0);
    assert_eq!(bank.total_debt, 0);
    assert_eq!(bank.total_debt_share, 0);
    assert!(s.vault.is_debtor(&s.debtor));
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")]
fn rejects_double_initialize() {
    let s = setup();
    let model = s.vault.get_interest_model();
    s.vault.initialize(&s.admin, &model);
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")]
fn rejects_duplicate_bank() {
    let s = setup();
    s.vault
        .add_bank(&s.admin, &s.asset, &2u32, &String::from_str(&s.env, "ibDUP"));
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn rejects_non_admin_bank_registration() {
    let s = setup();
    let stranger = Address::generate(&s.env);
    let other = s
        .env
        .register_stellar_asset_contract_v2(s.admin.clone())
        .address();
    s.vault
        .add_bank(&stranger, &other, &1u32, &String::from_str(&s.env, "ibX"));
}

#[test]
#[should_panic(expected = "Error(Contract, #1)")]
fn rejects_deposit_to_unregistered_bank() {
    let s = setup();
    let other = s
        .env
        .register_stellar_asset_contract_v2(s.admin.clone())
        .address();
    s.vault.deposit(&s.supplier, &other, &1_000u128);
}

#[test]
fn first_deposit_bootstraps_one_to_one() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    let bank = s.vault.get_bank(&s.asset);
    assert_eq!(bank.total_balance, 1_000_000);
    assert_eq!(bank.total_share, 1_000_000);
    assert_eq!(s.vault.get_share_balance(&s.asset, &s.supplier), 1_000_000);
}

#[test]
fn deposit_after_interest_mints_floor_rounded_shares() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    s.vault.borrow(&s.debtor, &s.asset, &500_000u128);
    advance(&s.env, SECONDS_PER_YEAR);
    s.vault.poke(&s.asset);

    let bank = s.vault.get_bank(&s.asset);
    assert!(bank.total_balance > 1_000_000);
    assert_eq!(bank.total_share, 1_000_000);

    let second = Address::generate(&s.env);
    s.asset_admin.mint(&second, &1_000_000i128);
    s.vault.deposit(&second, &s.asset, &100_000u128);
    let expected = 100_000u128 * bank.total_share / bank.total_balance;
    assert_eq!(s.vault.get_share_balance(&s.asset, &second), expected);
    // Share price above par means strictly fewer shares than tokens in.
    assert!(expected < 100_000);
}

#[test]
fn withdraw_is_floor_inverse_and_burns_exact_shares() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    s.vault.borrow(&s.debtor, &s.asset, &300_000u128);
    advance(&s.env, SECONDS_PER_YEAR / 2);
    s.vault.poke(&s.asset);

    let bank = s.vault.get_bank(&s.asset);
    let share_amount = 250_000u128;
    let expected = share_amount * bank.total_balance / bank.total_share;
    assert_eq!(s.vault.preview_withdraw(&s.asset, &share_amount), expected);

    let token_client = token::Client::new(&s.env, &s.asset);
    let before = token_client.balance(&s.supplier);
    s.vault.withdraw(&s.supplier, &s.asset, &share_amount);
    assert_eq!(token_client.balance(&s.supplier) - before, expected as i128);
    assert_eq!(
        s.vault.get_share_balance(&s.asset, &s.supplier),
        1_000_000 - share_amount
    );
    let after = s.vault.get_bank(&s.asset);
    assert_eq!(after.total_share, bank.total_share - share_amount);
    assert_eq!(after.total_balance, bank.total_balance - expected);
}

#[test]
#[should_panic(expected = "Error(Contract, #3)")]
fn withdraw_beyond_cash_fails() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    s.vault.borrow(&s.debtor, &s.asset, &900_000u128);
    // 1:1 share price, but only 100_000 cash remains in the vault.
    s.vault.withdraw(&s.supplier, &s.asset, &200_000u128);
}

#[test]
#[should_panic(expected = "Error(Contract, #2)")]
fn borrow_requires_allow_list() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    let outsider = Address::generate(&s.env);
    s.vault.borrow(&outsider, &s.asset, &10_000u128);
}

#[test]
#[should_panic(expected = "Error(Contract, #3)")]
fn borrow_beyond_cash_fails() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    s.vault.borrow(&s.debtor, &s.asset, &1_000_001u128);
}

#[test]
fn borrow_and_repay_round_trip_clears_debt() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    let shares = s.vault.borrow(&s.debtor, &s.asset, &400_000u128);
    assert_eq!(shares, 400_000);
    assert_eq!(s.vault.get_debt_share(&s.asset, &s.debtor), shares);

    advance(&s.env, SECONDS_PER_YEAR);
    s.vault.poke(&s.asset);
    let owed = s.vault.preview_repay(&s.asset, &shares);
    // Interest only grows debt.
    assert!(owed > 400_000);

    approve_vault(&s, &s.debtor, owed as i128);
    let paid = s.vault.repay(&s.debtor, &s.asset, &shares);
    assert_eq!(paid, owed);

    let bank = s.vault.get_bank(&s.asset);
    assert_eq!(bank.total_debt, 0);
    assert_eq!(bank.total_debt_share, 0);
    assert_eq!(s.vault.get_debt_share(&s.asset, &s.debtor), 0);
    // Suppliers keep the accrued interest.
    assert_eq!(bank.total_balance, 1_000_000 + (owed - 400_000));
}

#[test]
fn debt_rounding_never_shorts_the_pool() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    let first = s.vault.borrow(&s.debtor, &s.asset, &333_333u128);
    advance(&s.env, 86_400);
    // Second draw at a grown debt price mints ceil-rounded shares.
    let second = s.vault.borrow(&s.debtor, &s.asset, &111_111u128);
    advance(&s.env, 86_400);
    s.vault.poke(&s.asset);

    let owed_first = s.vault.preview_repay(&s.asset, &first);
    approve_vault(&s, &s.debtor, owed_first as i128);
    s.vault.repay(&s.debtor, &s.asset, &first);

    let owed_second = s.vault.preview_repay(&s.asset, &second);
    approve_vault(&s, &s.debtor, owed_second as i128);
    s.vault.repay(&s.debtor, &s.asset, &second);

    let bank = s.vault.get_bank(&s.asset);
    assert_eq!(bank.total_debt_share, 0);
    assert_eq!(bank.total_debt, 0);
    // Ceil rounding on both legs means the pool never lost principal.
    assert!(owed_first + owed_second >= 333_333 + 111_111);
}

#[test]
fn accrual_grows_both_aggregates_and_never_reverses() {
    let s = setup();
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    s.vault.borrow(&s.debtor, &s.asset, &500_000u128);
    assert_eq!(s.vault.get_utilization(&s.asset), 5_000);

    let before = s.vault.get_bank(&s.asset);
    advance(&s.env, SECONDS_PER_YEAR);
    s.vault.poke(&s.asset);
    let after = s.vault.get_bank(&s.asset);

    assert!(after.total_debt > before.total_debt);
    assert_eq!(
        after.total_balance - before.total_balance,
        after.total_debt - before.total_debt
    );
    // ~6.25% APR at 50% utilization on this curve.
    let interest = after.total_debt - before.total_debt;
    assert!(interest > 31_000 && interest < 31_500);

    // Re-poking at the same timestamp is a no-op.
    s.vault.poke(&s.asset);
    assert_eq!(s.vault.get_bank(&s.asset), after);
}

#[test]
fn utilization_is_zero_for_an_idle_bank() {
    let s = setup();
    assert_eq!(s.vault.get_utilization(&s.asset), 0);
    s.vault.deposit(&s.supplier, &s.asset, &1_000_000u128);
    assert_eq!(s.vault.get_utilization(&s.asset), 0);
}

#[test]
fn admin_handover_transfers_control() {
    let s = setup();
    let new_admin = Address::generate(&s.env);
    s.vault.set_admin(&s.admin, &new_admin);
    assert_eq!(s.vault.get_admin(), new_admin);
    let other = s
        .env
        .register_stellar_asset_contract_v2(s.admin.clone())
        .address();
    s.vault
        .add_bank(&new_admin, &other, &2u32, &String::from_str(&s.env, "ibY"));
    assert_eq!(s.vault.get_banks().len(), 2);
}
