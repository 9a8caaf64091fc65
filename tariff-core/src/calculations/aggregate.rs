//! Aggregate views over a derived revenue table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::percentage;
use crate::calculations::pipeline::PipelineError;
use crate::calculations::revenue::gross_revenue;
use crate::models::RevenueRow;
use crate::params::InvalidParameterError;

/// Column sums of a revenue table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueTotals {
    pub population: u64,
    pub gross_irpef: Decimal,
    pub gross_custom: Decimal,
    pub adjusted_irpef: Decimal,
    pub adjusted_custom: Decimal,
    pub total_rebate: Decimal,
    pub net_irpef: Decimal,
    pub net_custom: Decimal,
}

/// A bracket's share of a selected subset of the population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationShare {
    pub label: String,
    pub client_count: u64,
    /// Percentage of the selected subset, not of the whole population.
    pub percentage: Decimal,
}

/// Sums every column of `rows`.
///
/// Rows from a successful [`RevenuePipeline::run`](crate::calculations::RevenuePipeline::run)
/// never overflow the population sum.
pub fn totals(rows: &[RevenueRow]) -> RevenueTotals {
    rows.iter().fold(RevenueTotals::default(), |mut acc, row| {
        acc.population += row.client_count;
        acc.gross_irpef += row.irpef.gross;
        acc.gross_custom += row.custom.gross;
        acc.adjusted_irpef += row.irpef.adjusted;
        acc.adjusted_custom += row.custom.adjusted;
        acc.total_rebate += row.total_rebate;
        acc.net_irpef += row.irpef.net;
        acc.net_custom += row.custom.net;
        acc
    })
}

/// Revenue if every client paid the same `rate`.
pub fn baseline_revenue(
    population: u64,
    rate: Decimal,
) -> Decimal {
    gross_revenue(population, rate)
}

/// The `n` most populated brackets, largest first, each with its share of
/// the selected brackets' combined population.
///
/// Ties keep input order. `rows` itself is left untouched.
///
/// # Errors
///
/// - [`PipelineError::InvalidParameter`] if `n` is zero
/// - [`PipelineError::EmptyPopulation`] if the selection holds no clients
pub fn top_by_population(
    rows: &[RevenueRow],
    n: usize,
) -> Result<Vec<PopulationShare>, PipelineError> {
    if n == 0 {
        return Err(InvalidParameterError {
            name: "top_n".to_string(),
            value: Decimal::ZERO,
            expected: "at least 1".to_string(),
        }
        .into());
    }

    if rows.is_empty() {
        return Err(PipelineError::EmptyPopulation);
    }

    let mut selected: Vec<&RevenueRow> = rows.iter().collect();
    selected.sort_by(|a, b| b.client_count.cmp(&a.client_count));
    selected.truncate(n);

    let subset_population: u64 = selected.iter().map(|r| r.client_count).sum();
    let whole = Decimal::from(subset_population);

    selected
        .into_iter()
        .map(|row| -> Result<PopulationShare, PipelineError> {
            let share = percentage(Decimal::from(row.client_count), whole)
                .ok_or(PipelineError::EmptyPopulation)?;
            Ok(PopulationShare {
                label: row.label.clone(),
                client_count: row.client_count,
                percentage: share,
            })
        })
        .collect()
}
