//! Exploratory statistics used when designing a tiered schedule.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::calculations::common::pct_to_fraction;
use crate::calculations::pipeline::PipelineError;
use crate::label::parse_bracket_label;
use crate::models::BracketRecord;
use crate::params::ensure_range;

/// Percentiles of the brackets' upper income limits.
///
/// Each bracket counts once regardless of its population. Open-ended and
/// unparseable brackets are left out. Values between ranks are linearly
/// interpolated.
///
/// # Errors
///
/// - [`PipelineError::InvalidParameter`] for a percentile outside [0, 100]
/// - [`PipelineError::EmptyPopulation`] if no bracket has an upper limit
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::BracketRecord;
/// use tariff_core::calculations::upper_bound_percentiles;
///
/// let table = vec![
///     BracketRecord::new("da 0 a 10.000", 1),
///     BracketRecord::new("da 10.000 a 20.000", 1),
///     BracketRecord::new("da 20.000 a 40.000", 1),
///     BracketRecord::new("oltre 40.000", 1),
/// ];
///
/// let quartiles = upper_bound_percentiles(&table, &[dec!(25), dec!(50), dec!(75)]).unwrap();
///
/// assert_eq!(quartiles, vec![dec!(15000), dec!(20000), dec!(30000)]);
/// ```
pub fn upper_bound_percentiles(
    records: &[BracketRecord],
    percentiles: &[Decimal],
) -> Result<Vec<Decimal>, PipelineError> {
    let mut bounds: Vec<Decimal> = records
        .iter()
        .filter_map(|r| parse_bracket_label(&r.label).ok())
        .filter_map(|b| b.representative_value())
        .collect();
    if bounds.is_empty() {
        return Err(PipelineError::EmptyPopulation);
    }
    bounds.sort();

    percentiles
        .iter()
        .map(|&p| -> Result<Decimal, PipelineError> {
            ensure_range("percentile", p, Decimal::ZERO, Decimal::ONE_HUNDRED)?;
            Ok(interpolate(&bounds, p))
        })
        .collect()
}

/// Linear interpolation between the closest ranks of sorted `values`.
fn interpolate(
    values: &[Decimal],
    pct: Decimal,
) -> Decimal {
    let last = values.len() - 1;
    let rank = pct_to_fraction(pct) * Decimal::from(last);
    let lower = rank.floor();
    let lo = lower.to_usize().unwrap_or(last).min(last);
    let hi = (lo + 1).min(last);
    values[lo] + (values[hi] - values[lo]) * (rank - lower)
}
