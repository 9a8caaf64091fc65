use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Revenue figures of one bracket under one fee policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRevenue {
    /// Fee charged to each client of the bracket.
    pub rate: Decimal,

    /// `client_count * rate`.
    pub gross: Decimal,

    /// Gross revenue after attrition.
    pub adjusted: Decimal,

    /// Adjusted revenue minus the bracket's total rebate. May be negative.
    pub net: Decimal,
}

/// Rebate granted by one discount program within one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRebate {
    pub program: String,
    pub eligible_clients: u64,
    pub rebate: Decimal,
}

/// Derived revenue of one bracket under both fee policies.
///
/// The rebate does not depend on the fee policy: it is computed once and
/// subtracted from both adjusted figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueRow {
    pub label: String,
    pub client_count: u64,
    pub irpef: PolicyRevenue,
    pub custom: PolicyRevenue,
    pub rebates: Vec<ProgramRebate>,
    pub total_rebate: Decimal,
}
