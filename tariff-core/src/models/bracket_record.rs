use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One income bracket of the client population.
///
/// `irpef_rate` is only set when the input table already carries a
/// `Tariffa_IRPEF` column computed upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketRecord {
    pub label: String,
    pub client_count: u64,
    pub irpef_rate: Option<Decimal>,
}

impl BracketRecord {
    pub fn new(
        label: impl Into<String>,
        client_count: u64,
    ) -> Self {
        Self {
            label: label.into(),
            client_count,
            irpef_rate: None,
        }
    }

    pub fn with_irpef_rate(
        mut self,
        rate: Decimal,
    ) -> Self {
        self.irpef_rate = Some(rate);
        self
    }
}

/// Sum of `client_count` over every record, or `None` if it does not fit
/// in a `u64`.
pub fn total_population(records: &[BracketRecord]) -> Option<u64> {
    records
        .iter()
        .try_fold(0u64, |acc, r| acc.checked_add(r.client_count))
}
