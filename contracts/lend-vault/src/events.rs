use soroban_sdk::{contractevent, Address};

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BankAdded {
    #[topic]
    pub asset: Address,
    pub risk_tier: u32,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebtorSet {
    #[topic]
    pub debtor: Address,
    pub allowed: bool,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deposited {
    #[topic]
    pub asset: Address,
    #[topic]
    pub supplier: Address,
    pub amount: u128,
    pub shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdrawn {
    #[topic]
    pub asset: Address,
    #[topic]
    pub supplier: Address,
    pub amount: u128,
    pub shares: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Borrowed {
    #[topic]
    pub asset: Address,
    #[topic]
    pub debtor: Address,
    pub amount: u128,
    pub debt_shares: u128,
    pub total_debt: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Repaid {
    #[topic]
    pub asset: Address,
    #[topic]
    pub debtor: Address,
    pub amount: u128,
    pub debt_shares: u128,
    pub total_debt: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterestAccrued {
    #[topic]
    pub asset: Address,
    pub interest: u128,
    pub total_debt: u128,
    pub total_balance: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdminChanged {
    #[topic]
    pub admin: Address,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterestModelChanged {
    #[topic]
    pub model: Address,
}
