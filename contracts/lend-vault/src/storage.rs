use soroban_sdk::{contracttype, Address, Env, String};

use crate::constants::{TTL_EXTEND_TO, TTL_THRESHOLD};

#[soroban_sdk::contractclient(name = "InterestModelClient")]
pub trait InterestModelContract {
    fn get_rate(env: Env, utilization: u128) -> u128;
}

#[contracttype]
pub enum DataKey {
    Admin,                      // Address
    InterestModel,              // Address
    BankList,                   // Vec<Address>
    Bank(Address),              // Bank, keyed by asset
    Share(Address, Address),    // (asset, holder) -> u128 supplier shares
    DebtShare(Address, Address), // (asset, debtor) -> u128 aggregate debt shares
    Debtor(Address),            // bool allow-list entry
}

/// Per-asset ledger. `total_debt` carries principal plus accrued interest;
/// `total_balance` includes funds currently lent out.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Bank {
    pub asset: Address,
    pub risk_tier: u32,
    pub share_name: String,
    pub total_balance: u128,
    pub total_debt: u128,
    pub total_share: u128,
    pub total_debt_share: u128,
    pub last_accrual_time: u64,
}

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    if persistent.has(&DataKey::Admin) {
        persistent.extend_ttl(&DataKey::Admin, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::InterestModel) {
        persistent.extend_ttl(&DataKey::InterestModel, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::BankList) {
        persistent.extend_ttl(&DataKey::BankList, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn bump_bank_ttl(env: &Env, asset: &Address) {
    let key = DataKey::Bank(asset.clone());
    let persistent = env.storage().persistent();
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn bump_share_ttl(env: &Env, asset: &Address, holder: &Address) {
    let key = DataKey::Share(asset.clone(), holder.clone());
    let persistent = env.storage().persistent();
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

pub fn bump_debt_share_ttl(env: &Env, asset: &Address, debtor: &Address) {
    let key = DataKey::DebtShare(asset.clone(), debtor.clone());
    let persistent = env.storage().persistent();
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}
