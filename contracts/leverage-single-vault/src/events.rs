use soroban_sdk::{contractevent, Address};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolAdded {
    #[topic]
    pub pool_id: u32,
    pub vault: Address,
    pub token0: Address,
    pub token1: Address,
    pub zero_for_one: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolUpdated {
    #[topic]
    pub pool_id: u32,
    pub max_price_deviation: u128,
    pub open_debt_ratio: u128,
    pub liquidate_debt_ratio: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionOpened {
    #[topic]
    pub position_id: u64,
    #[topic]
    pub owner: Address,
    pub pool_id: u32,
    pub lp_share: u128,
    pub debt_share: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionCovered {
    #[topic]
    pub position_id: u64,
    #[topic]
    pub owner: Address,
    pub lp_added: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionClosed {
    #[topic]
    pub position_id: u64,
    #[topic]
    pub owner: Address,
    pub surplus0: u128,
    pub surplus1: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PositionLiquidated {
    #[topic]
    pub position_id: u64,
    #[topic]
    pub liquidator: Address,
    pub owner: Address,
    pub bonus0: u128,
    pub bonus1: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShortfallSwapped {
    #[topic]
    pub position_id: u64,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: u128,
    pub amount_out: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminChanged {
    #[topic]
    pub admin: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParamsUpdated {
    pub liquidation_bonus: u128,
    pub min_trade_gap: u64,
    pub max_price_age: u64,
}
