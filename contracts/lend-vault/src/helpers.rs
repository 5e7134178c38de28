use soroban_sdk::{panic_with_error, token, Address, Env};

use crate::constants::{RATE_SCALE, RATIO_SCALE};
use crate::errors::Error;
use crate::events::InterestAccrued;
use crate::storage::*;

pub fn require_admin(env: &Env, admin: &Address) {
    let stored: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .expect("admin not set");
    bump_core_ttl(env);
    if stored != *admin {
        panic_with_error!(env, Error::Authorization);
    }
    admin.require_auth();
}

pub fn get_bank(env: &Env, asset: &Address) -> Bank {
    bump_bank_ttl(env, asset);
    match env
        .storage()
        .persistent()
        .get(&DataKey::Bank(asset.clone()))
    {
        Some(bank) => bank,
        None => panic_with_error!(env, Error::Validation),
    }
}

pub fn set_bank(env: &Env, bank: &Bank) {
    env.storage()
        .persistent()
        .set(&DataKey::Bank(bank.asset.clone()), bank);
    bump_bank_ttl(env, &bank.asset);
}

pub fn get_share(env: &Env, asset: &Address, holder: &Address) -> u128 {
    bump_share_ttl(env, asset, holder);
    env.storage()
        .persistent()
        .get(&DataKey::Share(asset.clone(), holder.clone()))
        .unwrap_or(0u128)
}

pub fn set_share(env: &Env, asset: &Address, holder: &Address, value: u128) {
    let key = DataKey::Share(asset.clone(), holder.clone());
    if value == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &value);
        bump_share_ttl(env, asset, holder);
    }
}

pub fn get_debt_share(env: &Env, asset: &Address, debtor: &Address) -> u128 {
    bump_debt_share_ttl(env, asset, debtor);
    env.storage()
        .persistent()
        .get(&DataKey::DebtShare(asset.clone(), debtor.clone()))
        .unwrap_or(0u128)
}

pub fn set_debt_share(env: &Env, asset: &Address, debtor: &Address, value: u128) {
    let key = DataKey::DebtShare(asset.clone(), debtor.clone());
    if value == 0 {
        env.storage().persistent().remove(&key);
    } else {
        env.storage().persistent().set(&key, &value);
        bump_debt_share_ttl(env, asset, debtor);
    }
}

pub fn is_debtor(env: &Env, debtor: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Debtor(debtor.clone()))
        .unwrap_or(false)
}

/// Physically held balance of `asset`; may be less than the bank's
/// `total_balance` because part of the pool is lent out.
pub fn cash_balance(env: &Env, asset: &Address) -> u128 {
    let bal = token::Client::new(env, asset).balance(&env.current_contract_address());
    if bal < 0 {
        0u128
    } else {
        bal as u128
    }
}

pub fn utilization_of(bank: &Bank) -> u128 {
    if bank.total_balance == 0 || bank.total_debt == 0 {
        return 0;
    }
    let util = bank.total_debt.saturating_mul(RATIO_SCALE) / bank.total_balance;
    util.min(RATIO_SCALE)
}

/// Accrue interest on the bank in place. Invoked first in every mutating
/// entry point; never decreases either aggregate.
pub fn accrue(env: &Env, bank: &mut Bank) {
    let now = env.ledger().timestamp();
    if now <= bank.last_accrual_time {
        return;
    }
    let elapsed = (now - bank.last_accrual_time) as u128;
    bank.last_accrual_time = now;
    if bank.total_debt == 0 {
        return;
    }
    let model: Address = env
        .storage()
        .persistent()
        .get(&DataKey::InterestModel)
        .expect("interest model not set");
    let rate = InterestModelClient::new(env, &model).get_rate(&utilization_of(bank));
    let interest = checked_interest_product(env, bank.total_debt, rate, elapsed);
    if interest == 0 {
        return;
    }
    bank.total_debt = bank.total_debt.saturating_add(interest);
    bank.total_balance = bank.total_balance.saturating_add(interest);
    InterestAccrued {
        asset: bank.asset.clone(),
        interest,
        total_debt: bank.total_debt,
        total_balance: bank.total_balance,
    }
    .publish(env);
}

/// interest = principal * rate_per_second * elapsed / RATE_SCALE.
/// Reduce factors by gcd with the denominator to avoid intermediate overflow.
pub fn checked_interest_product(env: &Env, principal: u128, rate: u128, elapsed: u128) -> u128 {
    let mut denom = RATE_SCALE;
    let mut a = principal;
    let mut b = rate;
    let mut c = elapsed;

    let g1 = gcd_u128(a, denom);
    a /= g1;
    denom /= g1;
    let g2 = gcd_u128(b, denom);
    b /= g2;
    denom /= g2;
    let g3 = gcd_u128(c, denom);
    c /= g3;
    denom /= g3;

    let numerator = a
        .checked_mul(b)
        .and_then(|v| v.checked_mul(c))
        .unwrap_or_else(|| panic_with_error!(env, Error::Validation));
    numerator / denom
}

fn gcd_u128(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
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
    let quotient = product / denom;
    if product % denom != 0 {
        quotient + 1
    } else {
        quotient
    }
}

pub fn to_i128(env: &Env, amount: u128) -> i128 {
    if amount > i128::MAX as u128 {
        panic_with_error!(env, Error::Validation);
    }
    amount as i128
}
