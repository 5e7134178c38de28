#![no_std]
//! Fixed-rate swap venue for tests. The router pays out of its own reserves
//! at a settable `(price, scale)` rate per pair, with no slippage model:
//! `amount_out = amount_in * price / scale`.
use soroban_sdk::{contract, contractimpl, contracttype, token, Address, Env};

#[contracttype]
enum DataKey {
    Rate(Address, Address),
}

#[contract]
pub struct MockSwapRouter;

#[contractimpl]
impl MockSwapRouter {
    pub fn set_rate(env: Env, token_in: Address, token_out: Address, price: u128, scale: u128) {
        if price == 0 || scale == 0 {
            panic!("bad rate");
        }
        env.storage()
            .persistent()
            .set(&DataKey::Rate(token_in, token_out), &(price, scale));
    }

    pub fn swap_exact_in(
        env: Env,
        from: Address,
        token_in: Address,
        token_out: Address,
        amount_in: u128,
        min_out: u128,
    ) -> u128 {
        from.require_auth();
        let (price, scale) = rate(&env, &token_in, &token_out);
        let amount_out = amount_in * price / scale;
        if amount_out < min_out {
            panic!("insufficient output");
        }
        settle(&env, &from, &token_in, &token_out, amount_in, amount_out);
        amount_out
    }

    pub fn swap_exact_out(
        env: Env,
        from: Address,
        token_in: Address,
        token_out: Address,
        amount_out: u128,
        max_in: u128,
    ) -> u128 {
        from.require_auth();
        let amount_in = Self::quote_exact_out(env.clone(), token_in.clone(), token_out.clone(), amount_out);
        if amount_in > max_in {
            panic!("excessive input");
        }
        settle(&env, &from, &token_in, &token_out, amount_in, amount_out);
        amount_in
    }

    /// Input required for `amount_out`, rounded against the taker.
    pub fn quote_exact_out(env: Env, token_in: Address, token_out: Address, amount_out: u128) -> u128 {
        let (price, scale) = rate(&env, &token_in, &token_out);
        (amount_out * scale + price - 1) / price
    }
}

fn rate(env: &Env, token_in: &Address, token_out: &Address) -> (u128, u128) {
    env.storage()
        .persistent()
        .get(&DataKey::Rate(token_in.clone(), token_out.clone()))
        .expect("no rate")
}

fn settle(
    env: &Env,
    from: &Address,
    token_in: &Address,
    token_out: &Address,
    amount_in: u128,
    amount_out: u128,
) {
    let router = env.current_contract_address();
    token::Client::new(env, token_in).transfer(from, &router, &(amount_in as i128));
    token::Client::new(env, token_out).transfer(&router, from, &(amount_out as i128));
}
