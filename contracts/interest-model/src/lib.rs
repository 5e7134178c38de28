#![no_std]
use soroban_sdk::{
    contract, contracterror, contractevent, contractimpl, contracttype, panic_with_error, Address,
    Env,
};

/// Ratios and utilization are parts-per-10000.
pub const RATIO_SCALE: u128 = 10_000u128;
/// Per-second rates are 1e18 mantissas.
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000u128;
/// Caps each per-second rate parameter at roughly 1000% APY to keep the
/// accrual product well inside u128.
pub const MAX_RATE_PER_SECOND: u128 = 320_000_000_000u128;

const TTL_THRESHOLD: u32 = 100_000_000;
const TTL_EXTEND_TO: u32 = 200_000_000;

#[contracttype]
pub enum DataKey {
    Admin,          // Address
    BaseRate,       // u128, per-second 1e18
    Multiplier,     // u128, per-second 1e18 at full kink utilization
    JumpMultiplier, // u128, per-second 1e18 applied above the kink
    Kink,           // u128, parts-per-10000
}

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    Validation = 1,
    Authorization = 2,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ModelInitialized {
    pub base_rate: u128,
    pub multiplier: u128,
    pub jump_multiplier: u128,
    pub kink: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamsUpdated {
    pub base_rate: u128,
    pub multiplier: u128,
    pub jump_multiplier: u128,
    pub kink: u128,
}

#[contract]
pub struct InterestModel;

#[contractimpl]
impl InterestModel {
    pub fn initialize(
        env: Env,
        admin: Address,
        base_rate: u128,
        multiplier: u128,
        jump_multiplier: u128,
        kink: u128,
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
        validate_params(&env, base_rate, multiplier, jump_multiplier, kink);
        env.storage().persistent().set(&DataKey::Admin, &admin);
        write_params(&env, base_rate, multiplier, jump_multiplier, kink);
        bump_ttl(&env);
        ModelInitialized {
            base_rate,
            multiplier,
            jump_multiplier,
            kink,
        }
        .publish(&env);
    }

    /// Per-second borrow rate (1e18 mantissa) for a utilization expressed in
    /// parts-per-10000. Two-slope curve: gentle below the kink, steep above.
    pub fn get_rate(env: Env, utilization: u128) -> u128 {
        ensure_initialized(&env);
        bump_ttl(&env);
        if utilization > RATIO_SCALE {
            panic_with_error!(&env, Error::Validation);
        }
        let base: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::BaseRate)
            .unwrap_or(0);
        let mult: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::Multiplier)
            .unwrap_or(0);
        let jump: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::JumpMultiplier)
            .unwrap_or(0);
        let kink: u128 = env
            .storage()
            .persistent()
            .get(&DataKey::Kink)
            .unwrap_or(RATIO_SCALE * 8 / 10);
        if utilization <= kink {
            base.saturating_add(utilization.saturating_mul(mult) / RATIO_SCALE)
        } else {
            let normal = base.saturating_add(kink.saturating_mul(mult) / RATIO_SCALE);
            let excess = utilization - kink;
            normal.saturating_add(excess.saturating_mul(jump) / RATIO_SCALE)
        }
    }

    pub fn set_params(
        env: Env,
        admin: Address,
        base_rate: u128,
        multiplier: u128,
        jump_multiplier: u128,
        kink: u128,
    ) {
        require_admin(&env, &admin);
        validate_params(&env, base_rate, multiplier, jump_multiplier, kink);
        write_params(&env, base_rate, multiplier, jump_multiplier, kink);
        ParamsUpdated {
            base_rate,
            multiplier,
            jump_multiplier,
            kink,
        }
        .publish(&env);
    }

    pub fn set_admin(env: Env, admin: Address, new_admin: Address) {
        require_admin(&env, &admin);
        env.storage().persistent().set(&DataKey::Admin, &new_admin);
    }

    pub fn get_admin(env: Env) -> Address {
        ensure_initialized(&env);
        env.storage()
            .persistent()
            .get(&DataKey::Admin)
            .expect("admin not set")
    }
}

fn validate_params(env: &Env, base: u128, multiplier: u128, jump: u128, kink: u128) {
    if kink > RATIO_SCALE {
        panic_with_error!(env, Error::Validation);
    }
    if base > MAX_RATE_PER_SECOND
        || multiplier > MAX_RATE_PER_SECOND
        || jump > MAX_RATE_PER_SECOND
    {
        panic_with_error!(env, Error::Validation);
    }
}

fn write_params(env: &Env, base: u128, multiplier: u128, jump: u128, kink: u128) {
    env.storage().persistent().set(&DataKey::BaseRate, &base);
    env.storage()
        .persistent()
        .set(&DataKey::Multiplier, &multiplier);
    env.storage()
        .persistent()
        .set(&DataKey::JumpMultiplier, &jump);
    env.storage().persistent().set(&DataKey::Kink, &kink);
}

fn ensure_initialized(env: &Env) {
    if env
        .storage()
        .persistent()
        .get::<_, Address>(&DataKey::Admin)
        .is_none()
    {
        panic_with_error!(env, Error::Validation);
    }
}

fn require_admin(env: &Env, admin: &Address) {
    let stored: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Admin)
        .expect("admin not set");
    bump_ttl(env);
    if stored != *admin {
        panic_with_error!(env, Error::Authorization);
    }
    admin.require_auth();
}

fn bump_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    if persistent.has(&DataKey::Admin) {
        persistent.extend_ttl(&DataKey::Admin, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::BaseRate) {
        persistent.extend_ttl(&DataKey::BaseRate, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::Multiplier) {
        persistent.extend_ttl(&DataKey::Multiplier, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::JumpMultiplier) {
        persistent.extend_ttl(&DataKey::JumpMultiplier, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
    if persistent.has(&DataKey::Kink) {
        persistent.extend_ttl(&DataKey::Kink, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::testutils::Address as _;

    // ~10% APR at the 80% kink, ~150% APR at full utilization.
    const MULTIPLIER: u128 = 3_963_723_998u128;
    const JUMP: u128 = 221_968_543_885u128;
    const KINK: u128 = 8_000u128;

    fn setup() -> (Env, InterestModelClient<'static>, Address) {
        let env = Env::default();
        env.mock_all_auths();
        let admin = Address::generate(&env);
        let id = env.register(InterestModel, ());
        let client = InterestModelClient::new(&env, &id);
        client.initialize(&admin, &0u128, &MULTIPLIER, &JUMP, &KINK);
        (env, client, admin)
    }

    #[test]
    fn rate_is_monotonic_across_the_kink() {
        let (_env, client, _admin) = setup();
        let idle = client.get_rate(&0u128);
        let half = client.get_rate(&5_000u128);
        let at_kink = client.get_rate(&KINK);
        let above = client.get_rate(&9_000u128);
        let full = client.get_rate(&RATIO_SCALE);
        assert_eq!(idle, 0);
        assert!(half < at_kink);
        assert!(at_kink < above);
        assert!(above < full);
        // Slope above the kink dominates the gentle segment.
        assert!(full - at_kink > at_kink);
    }

    #[test]
    fn kink_rate_matches_configured_slope() {
        let (_env, client, _admin) = setup();
        assert_eq!(client.get_rate(&KINK), KINK * MULTIPLIER / RATIO_SCALE);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1)")]
    fn rejects_utilization_above_one() {
        let (_env, client, _admin) = setup();
        client.get_rate(&(RATIO_SCALE + 1));
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #1)")]
    fn rejects_double_initialize() {
        let (env, client, _admin) = setup();
        let other = Address::generate(&env);
        client.initialize(&other, &0u128, &MULTIPLIER, &JUMP, &KINK);
    }

    #[test]
    #[should_panic(expected = "Error(Contract, #2)")]
    fn rejects_non_admin_params() {
        let (env, client, _admin) = setup();
        let stranger = Address::generate(&env);
        client.set_params(&stranger, &0u128, &MULTIPLIER, &JUMP, &KINK);
    }

    #[test]
    fn params_update_applies_prospectively() {
        let (_env, client, admin) = setup();
        let before = client.get_rate(&5_000u128);
        client.set_params(&admin, &0u128, &(MULTIPLIER * 2), &JUMP, &KINK);
        assert_eq!(client.get_rate(&5_000u128), before * 2);
    }
}
