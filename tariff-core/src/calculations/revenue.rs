//! Gross revenue per bracket: `client_count * rate`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::fee_policy::{FeePolicy, UnmappedBracketError};
use crate::models::BracketRecord;

/// Gross revenue of one bracket under one policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketGross {
    pub label: String,
    pub client_count: u64,
    pub rate: Decimal,
    pub gross: Decimal,
}

/// `client_count * rate`, exact.
pub fn gross_revenue(
    client_count: u64,
    rate: Decimal,
) -> Decimal {
    Decimal::from(client_count) * rate
}

/// Computes gross revenue for every bracket, in input order.
///
/// Stops at the first bracket the policy cannot price; the pipeline is the
/// place that tolerates partial tables.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::BracketRecord;
/// use tariff_core::calculations::{FeePolicy, compute_gross};
///
/// let table = vec![BracketRecord::new("A", 100), BracketRecord::new("B", 200)];
/// let gross = compute_gross(&table, &FeePolicy::flat(dec!(35))).unwrap();
///
/// assert_eq!(gross[0].gross, dec!(3500));
/// assert_eq!(gross[1].gross, dec!(7000));
/// ```
pub fn compute_gross(
    records: &[BracketRecord],
    policy: &FeePolicy,
) -> Result<Vec<BracketGross>, UnmappedBracketError> {
    records
        .iter()
        .map(|record| -> Result<BracketGross, UnmappedBracketError> {
            let rate = policy.resolve(record)?;
            Ok(BracketGross {
                label: record.label.clone(),
                client_count: record.client_count,
                rate,
                gross: gross_revenue(record.client_count, rate),
            })
        })
        .collect()
}
