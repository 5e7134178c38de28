#![no_std]
//! Settable price feed for tests. Prices are `(price, scale)` pairs:
//! `amount_quote = amount_base * price / scale`.
use soroban_sdk::{contract, contractimpl, contracttype, Address, Env};

#[contracttype]
enum DataKey {
    Twap(Address, Address),
    Spot(Address, Address),
    LastTimestamp,
}

#[contract]
pub struct MockPriceOracle;

#[contractimpl]
impl MockPriceOracle {
    /// Sets both TWAP and spot and stamps the feed as fresh.
    pub fn set_price(env: Env, base: Address, quote: Address, price: u128, scale: u128) {
        Self::set_twap(env.clone(), base.clone(), quote.clone(), price, scale);
        Self::set_spot(env, base, quote, price, scale);
    }

    pub fn set_twap(env: Env, base: Address, quote: Address, price: u128, scale: u128) {
        if price == 0 || scale == 0 {
            panic!("bad price");
        }
        env.storage()
            .persistent()
            .set(&DataKey::Twap(base, quote), &(price, scale));
        env.storage()
            .persistent()
            .set(&DataKey::LastTimestamp, &env.ledger().timestamp());
    }

    pub fn set_spot(env: Env, base: Address, quote: Address, price: u128, scale: u128) {
        if price == 0 || scale == 0 {
            panic!("bad price");
        }
        env.storage()
            .persistent()
            .set(&DataKey::Spot(base, quote), &(price, scale));
    }

    /// Test hook: backdate the feed without touching prices.
    pub fn set_last_timestamp(env: Env, timestamp: u64) {
        env.storage()
            .persistent()
            .set(&DataKey::LastTimestamp, &timestamp);
    }

    pub fn price(env: Env, base: Address, quote: Address) -> (u128, u128) {
        env.storage()
            .persistent()
            .get(&DataKey::Twap(base, quote))
            .expect("no price")
    }

    pub fn spot_price(env: Env, base: Address, quote: Address) -> (u128, u128) {
        env.storage()
            .persistent()
            .get(&DataKey::Spot(base, quote))
            .expect("no price")
    }

    pub fn last_timestamp(env: Env) -> u64 {
        env.storage()
            .persistent()
            .get(&DataKey::LastTimestamp)
            .unwrap_or(0)
    }
}
