use soroban_sdk::{contract, contractimpl, panic_with_error, token, Address, Env, String, Vec};

use crate::errors::Error;
use crate::events::*;
use crate::helpers::*;
use crate::storage::*;

#[contract]
pub struct LendVault;

#[contractimpl]
impl LendVault {
    pub fn initialize(env: Env, admin: Address, interest_model: Address) {
        if env
            .storage()
            .persistent()
            .get::<_, Address>(&DataKey::Admin)
            .is_some()
        {
            panic_with_error!(&env, Error::Validation);
        }
        admin.require_auth();
        env.storage().persistent().set(&DataKey::Admin, &admin);
        env.storage()
            .persistent()
            .set(&DataKey::InterestModel, &interest_model);
        env.storage()
            .persistent()
            .set(&DataKey::BankList, &Vec::<Address>::new(&env));
        bump_core_ttl(&env);
    }

    /// Register a bank for `asset`. The registry is append-only; banks are
    /// never removed.
    pub fn add_bank(env: Env, admin: Address, asset: Address, risk_tier: u32, share_name: String) {
        require_admin(&env, &admin);
        if env
            .storage()
            .persistent()
            .has(&DataKey::Bank(asset.clone()))
        {
            panic_with_error!(&env, Error::Validation);
        }
        let bank = Bank {
            asset: asset.clone(),
            risk_tier,
            share_name,
            total_balance: 0,
            total_debt: 0,
            total_share: 0,
            total_debt_share: 0,
            last_accrual_time: env.ledger().timestamp(),
        };
        set_bank(&env, &bank);
        let mut banks: Vec<Address> = env
            .storage()
            .persistent()
            .get(&DataKey::BankList)
            .unwrap_or(Vec::new(&env));
        banks.push_back(asset.clone());
        env.storage().persistent().set(&DataKey::BankList, &banks);
        BankAdded { asset, risk_tier }.publish(&env);
    }

    pub fn set_debtor(env: Env, admin: Address, debtor: Address, allowed: bool) {
        require_admin(&env, &admin);
        env.storage()
            .persistent()
            .set(&DataKey::Debtor(debtor.clone()), &allowed);
        DebtorSet { debtor, allowed }.publish(&env);
    }

    pub fn set_interest_model(env: Env, admin: Address, model: Address) {
        require_admin(&env, &admin);
        // Interface check before wiring the model in.
        let _ = InterestModelClient::new(&env, &model).get_rate(&0u128);
        env.storage()
            .persistent()
            .set(&DataKey::InterestModel, &model);
        InterestModelChanged { model }.publish(&env);
    }

    pub fn set_admin(env: Env, admin: Address, new_admin: Address) {
        require_admin(&env, &admin);
        env.storage().persistent().set(&DataKey::Admin, &new_admin);
        AdminChanged { admin: new_admin }.publish(&env);
    }

    /// Public accrual hook, mirroring Compound's accrueInterest. Lets a
    /// debtor settle the debt price before previewing a repay.
    pub fn poke(env: Env, asset: Address) {
        let mut bank = get_bank(&env, &asset);
        accrue(&env, &mut bank);
        set_bank(&env, &bank);
    }

    pub fn deposit(env: Env, user: Address, asset: Address, amount: u128) {
        user.require_auth();
        let mut bank = get_bank(&env, &asset);
        accrue(&env, &mut bank);
        if amount == 0 {
            panic_with_error!(&env, Error::Validation);
        }
        // Floor rounding against the pre-deposit balance keeps the share
        // price from being inflated by deposit precision.
        let shares = if bank.total_share == 0 {
            amount
        } else {
            mul_div_floor(&env, amount, bank.total_share, bank.total_balance)
        };
        if shares == 0 {
            panic_with_error!(&env, Error::Validation);
        }
        token::Client::new(&env, &asset).transfer(
            &user,
            &env.current_contract_address(),
            &to_i128(&env, amount),
        );
        let held = get_share(&env, &asset, &user);
        set_share(&env, &asset, &user, held + shares);
        bank.total_balance += amount;
        bank.total_share += shares;
        set_bank(&env, &bank);
        Deposited {
            asset,
            supplier: user,
            amount,
            shares,
        }
        .publish(&env);
    }

    pub fn withdraw(env: Env, user: Address, asset: Address, share_amount: u128) {
        user.require_auth();
        let mut bank = get_bank(&env, &asset);
        accrue(&env, &mut bank);
        if share_amount == 0 {
            panic_with_error!(&env, Error::Validation);
        }
        let held = get_share(&env, &asset, &user);
        if held < share_amount {
            panic_with_error!(&env, Error::Validation);
        }
        let amount = mul_div_floor(&env, share_amount, bank.total_balance, bank.total_share);
        // total_balance counts lent-out funds; only cash can leave.
        if amount > cash_balance(&env, &asset) {
            panic_with_error!(&env, Error::Liquidity);
        }
        set_share(&env, &asset, &user, held - share_amount);
        bank.total_balance -= amount;
        bank.total_share -= share_amount;
        set_bank(&env, &bank);
        token::Client::new(&env, &asset).transfer(
            &env.current_contract_address(),
            &user,
            &to_i128(&env, amount),
        );
        Withdrawn {
            asset,
            supplier: user,
            amount,
            shares: share_amount,
        }
        .publish(&env);
    }

    /// Debtor-only. Returns the debt shares minted for this draw; slicing
    /// them across positions is the debtor's bookkeeping, not the bank's.
    pub fn borrow(env: Env, debtor: Address, asset: Address, amount: u128) -> u128 {
        debtor.require_auth();
        if !is_debtor(&env, &debtor) {
            panic_with_error!(&env, Error::Authorization);
        }
        let mut bank = get_bank(&env, &asset);
        accrue(&env, &mut bank);
        if amount == 0 {
            panic_with_error!(&env, Error::Validation);
        }
        if amount > cash_balance(&env, &asset) {
            panic_with_error!(&env, Error::Liquidity);
        }
        // Ceiling keeps rounding loss on the borrower side of the ledger.
        let debt_shares = if bank.total_debt_share == 0 {
            amount
        } else {
            mul_div_ceil(&env, amount, bank.total_debt_share, bank.total_debt)
        };
        bank.total_debt += amount;
        bank.total_debt_share += debt_shares;
        set_bank(&env, &bank);
        let account = get_debt_share(&env, &asset, &debtor);
        set_debt_share(&env, &asset, &debtor, account + debt_shares);
        token::Client::new(&env, &asset).transfer(
            &env.current_contract_address(),
            &debtor,
            &to_i128(&env, amount),
        );
        Borrowed {
            asset,
            debtor,
            amount,
            debt_shares,
            total_debt: bank.total_debt,
        }
        .publish(&env);
        debt_shares
    }

    /// Debtor-only. Pulls the ceil-rounded amount for `debt_share_amount`
    /// via allowance and retires the shares. Returns the amount pulled.
    pub fn repay(env: Env, debtor: Address, asset: Address, debt_share_amount: u128) -> u128 {
        debtor.require_auth();
        let mut bank = get_bank(&env, &asset);
        accrue(&env, &mut bank);
        if debt_share_amount == 0 {
            panic_with_error!(&env, Error::Validation);
        }
        let account = get_debt_share(&env, &asset, &debtor);
        if account < debt_share_amount {
            panic_with_error!(&env, Error::Validation);
        }
        let amount = mul_div_ceil(&env, debt_share_amount, bank.total_debt, bank.total_debt_share);
        token::Client::new(&env, &asset).transfer_from(
            &env.current_contract_address(),
            &debtor,
            &env.current_contract_address(),
            &to_i128(&env, amount),
        );
        bank.total_debt = bank.total_debt.saturating_sub(amount);
        bank.total_debt_share -= debt_share_amount;
        set_bank(&env, &bank);
        set_debt_share(&env, &asset, &debtor, account - debt_share_amount);
        Repaid {
            asset,
            debtor,
            amount,
            debt_shares: debt_share_amount,
            total_debt: bank.total_debt,
        }
        .publish(&env);
        amount
    }

    pub fn get_bank(env: Env, asset: Address) -> Bank {
        get_bank(&env, &asset)
    }

    pub fn get_banks(env: Env) -> Vec<Address> {
        bump_core_ttl(&env);
        env.storage()
            .persistent()
            .get(&DataKey::BankList)
            .unwrap_or(Vec::new(&env))
    }

    pub fn get_share_balance(env: Env, asset: Address, holder: Address) -> u128 {
        get_share(&env, &asset, &holder)
    }

    pub fn get_debt_share(env: Env, asset: Address, debtor: Address) -> u128 {
        get_debt_share(&env, &asset, &debtor)
    }

    pub fn is_debtor(env: Env, debtor: Address) -> bool {
        is_debtor(&env, &debtor)
    }

    /// Underlying owed for `share_amount` supplier shares at the current
    /// share price (floor).
    pub fn preview_withdraw(env: Env, asset: Address, share_amount: u128) -> u128 {
        let bank = get_bank(&env, &asset);
        if bank.total_share == 0 {
            return 0;
        }
        mul_div_floor(&env, share_amount, bank.total_balance, bank.total_share)
    }

    /// Underlying owed for `debt_share_amount` debt shares at the current
    /// debt price (ceil). Does not accrue; call `poke` first for an exact
    /// same-ledger figure.
    pub fn preview_repay(env: Env, asset: Address, debt_share_amount: u128) -> u128 {
        let bank = get_bank(&env, &asset);
        if bank.total_debt_share == 0 {
            return 0;
        }
        mul_div_ceil(&env, debt_share_amount, bank.total_debt, bank.total_debt_share)
    }

    pub fn get_cash(env: Env, asset: Address) -> u128 {
        let _ = get_bank(&env, &asset);
        cash_balance(&env, &asset)
    }

    pub fn get_utilization(env: Env, asset: Address) -> u128 {
        let bank = get_bank(&env, &asset);
        utilization_of(&bank)
    }

    pub fn get_admin(env: Env) -> Address {
        bump_core_ttl(&env);
        env.storage()
            .persistent()
            .get(&DataKey::Admin)
            .expect("admin not set")
    }

    pub fn get_interest_model(env: Env) -> Address {
        bump_core_ttl(&env);
        env.storage()
            .persistent()
            .get(&DataKey::InterestModel)
            .expect("interest model not set")
    }
}
