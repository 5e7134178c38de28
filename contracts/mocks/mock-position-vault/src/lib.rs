#![no_std]
//! Two-asset liquidity vault stand-in for tests. Shares are minted pro rata
//! against the vault's current token balances; `skim` lets a test simulate
//! losses (the real vault rebalances into and out of range).
use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env};

#[contracttype]
enum DataKey {
    Token0,
    Token1,
    TotalShare,
    Share(Address),
    LastTradeTime,
}

#[contract]
pub struct MockPositionVault;

#[contractimpl]
impl MockPositionVault {
    pub fn initialize(env: Env, token0: Address, token1: Address) {
        if env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::Token0)
            .is_some()
        {
            panic!("already initialized");
        }
        env.storage().persistent().set(&DataKey::Token0, &token0);
        env.storage().persistent().set(&DataKey::Token1, &token1);
        env.storage()
            .persistent()
            .set(&DataKey::TotalShare, &0u128);
        env.storage()
            .persistent()
            .set(&DataKey::LastTradeTime, &env.ledger().timestamp());
    }

    pub fn deposit(env: Env, from: Address, amount0: u128, amount1: u128) -> u128 {
        from.require_auth();
        if amount0 == 0 && amount1 == 0 {
            panic!("bad amount");
        }
        let vault = env.current_contract_address();
        let (held0, held1) = Self::get_total_amounts(env.clone());
        let total_share: u128 = read(&env, &DataKey::TotalShare);

        if amount0 > 0 {
            token::Client::new(&env, &read(&env, &DataKey::Token0))
                .transfer(&from, &vault, &(amount0 as i128));
        }
        if amount1 > 0 {
            token::Client::new(&env, &read(&env, &DataKey::Token1))
                .transfer(&from, &vault, &(amount1 as i128));
        }

        let minted = if total_share == 0 {
            amount0 + amount1
        } else {
            if held0 + held1 == 0 {
                panic!("vault drained");
            }
            total_share * (amount0 + amount1) / (held0 + held1)
        };
        let holder_share: u128 = read_or(&env, &DataKey::Share(from.clone()), 0);
        env.storage()
            .persistent()
            .set(&DataKey::Share(from), &(holder_share + minted));
        env.storage()
            .persistent()
            .set(&DataKey::TotalShare, &(total_share + minted));
        env.storage()
            .persistent()
            .set(&DataKey::LastTradeTime, &env.ledger().timestamp());
        minted
    }

    pub fn withdraw(env: Env, from: Address, lp_amount: u128, to: Address) -> (u128, u128) {
        from.require_auth();
        let holder_share: u128 = read_or(&env, &DataKey::Share(from.clone()), 0);
        let total_share: u128 = read(&env, &DataKey::TotalShare);
        if lp_amount == 0 || lp_amount > holder_share {
            panic!("bad share amount");
        }
        let vault = env.current_contract_address();
        let (held0, held1) = Self::get_total_amounts(env.clone());
        let out0 = held0 * lp_amount / total_share;
        let out1 = held1 * lp_amount / total_share;

        env.storage()
            .persistent()
            .set(&DataKey::Share(from), &(holder_share - lp_amount));
        env.storage()
            .persistent()
            .set(&DataKey::TotalShare, &(total_share - lp_amount));
        if out0 > 0 {
            token::Client::new(&env, &read(&env, &DataKey::Token0))
                .transfer(&vault, &to, &(out0 as i128));
        }
        if out1 > 0 {
            token::Client::new(&env, &read(&env, &DataKey::Token1))
                .transfer(&vault, &to, &(out1 as i128));
        }
        env.storage()
            .persistent()
            .set(&DataKey::LastTradeTime, &env.ledger().timestamp());
        (out0, out1)
    }

    pub fn get_total_amounts(env: Env) -> (u128, u128) {
        let vault = env.current_contract_address();
        let bal0 = token::Client::new(&env, &read(&env, &DataKey::Token0)).balance(&vault);
        let bal1 = token::Client::new(&env, &read(&env, &DataKey::Token1)).balance(&vault);
        (bal0.max(0) as u128, bal1.max(0) as u128)
    }

    pub fn total_share(env: Env) -> u128 {
        read(&env, &DataKey::TotalShare)
    }

    pub fn share_of(env: Env, holder: Address) -> u128 {
        read_or(&env, &DataKey::Share(holder), 0)
    }

    pub fn last_trade_time(env: Env) -> u64 {
        read(&env, &DataKey::LastTradeTime)
    }

    /// Test hook: pretend a trade just happened (or long ago).
    pub fn set_last_trade_time(env: Env, timestamp: u64) {
        env.storage()
            .persistent()
            .set(&DataKey::LastTradeTime, &timestamp);
    }

    /// Test hook: drain tokens without burning shares, simulating a loss.
    pub fn skim(env: Env, amount0: u128, amount1: u128, to: Address) {
        let vault = env.current_contract_address();
        if amount0 > 0 {
            token::Client::new(&env, &read(&env, &DataKey::Token0))
                .transfer(&vault, &to, &(amount0 as i128));
        }
        if amount1 > 0 {
            token::Client::new(&env, &read(&env, &DataKey::Token1))
                .transfer(&vault, &to, &(amount1 as i128));
        }
    }
}

fn read<T: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>>(env: &Env, key: &DataKey) -> T {
    env.storage().persistent().get(key).expect("not initialized")
}

fn read_or(env: &Env, key: &DataKey, default: u128) -> u128 {
    env.storage().persistent().get(key).unwrap_or(default)
}
