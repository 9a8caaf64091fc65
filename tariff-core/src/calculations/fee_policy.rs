//! Fee policy resolution: which rate applies to a bracket.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::label::{LabelParseError, parse_bracket_label};
use crate::models::{BracketRecord, FeeSchedule};
use crate::params::{InvalidParameterError, ensure_non_negative};

/// Why a bracket could not be mapped to a rate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnmappedReason {
    #[error(transparent)]
    Label(#[from] LabelParseError),

    #[error("no precomputed rate in the input table")]
    MissingPrecomputedRate,
}

/// A bracket has no fee rate under the requested policy.
///
/// Such a row must be excluded and reported, never priced at zero.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("bracket '{label}' cannot be mapped to a fee rate: {reason}")]
pub struct UnmappedBracketError {
    pub label: String,
    pub reason: UnmappedReason,
}

/// How a bracket's fee rate is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeePolicy {
    /// The same rate for every bracket, regardless of income.
    Flat { rate: Decimal },

    /// Rate looked up from the bracket's upper income limit.
    Tiered(FeeSchedule),

    /// Rate already computed upstream and carried by the input row.
    Precomputed,
}

impl FeePolicy {
    pub fn flat(rate: Decimal) -> Self {
        Self::Flat { rate }
    }

    /// Resolves the fee rate of `record` under this policy.
    ///
    /// # Errors
    ///
    /// Returns [`UnmappedBracketError`] if the label cannot be parsed under
    /// a tiered policy, or the row carries no rate under
    /// [`FeePolicy::Precomputed`].
    pub fn resolve(
        &self,
        record: &BracketRecord,
    ) -> Result<Decimal, UnmappedBracketError> {
        match self {
            Self::Flat { rate } => Ok(*rate),
            Self::Tiered(schedule) => resolve(&record.label, schedule),
            Self::Precomputed => record.irpef_rate.ok_or_else(|| UnmappedBracketError {
                label: record.label.clone(),
                reason: UnmappedReason::MissingPrecomputedRate,
            }),
        }
    }

    /// Rejects a negative flat rate. Schedules are validated when built.
    pub fn validate(
        &self,
        name: &str,
    ) -> Result<(), InvalidParameterError> {
        match self {
            Self::Flat { rate } => ensure_non_negative(name, *rate),
            Self::Tiered(_) | Self::Precomputed => Ok(()),
        }
    }
}

impl fmt::Display for FeePolicy {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Flat { rate } => write!(f, "flat {rate}"),
            Self::Tiered(schedule) => write!(f, "schedule {}", schedule.name()),
            Self::Precomputed => write!(f, "precomputed"),
        }
    }
}

/// Resolves the rate of the bracket named `label` under `schedule`.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::FeeSchedule;
/// use tariff_core::calculations::resolve;
///
/// let irpef = FeeSchedule::irpef_2022();
///
/// assert_eq!(resolve("da 20.000 a 26.000", &irpef).unwrap(), dec!(30));
/// assert_eq!(resolve("oltre 120.000", &irpef).unwrap(), dec!(40));
/// assert!(resolve("TOTALE", &irpef).is_err());
/// ```
pub fn resolve(
    label: &str,
    schedule: &FeeSchedule,
) -> Result<Decimal, UnmappedBracketError> {
    let bound = parse_bracket_label(label).map_err(|e| UnmappedBracketError {
        label: label.to_string(),
        reason: e.into(),
    })?;
    Ok(schedule.rate_for(&bound))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn flat_policy_ignores_label() {
        let policy = FeePolicy::flat(dec!(35));

        assert_eq!(policy.resolve(&BracketRecord::new("da 0 a 1.000", 10)), Ok(dec!(35)));
        assert_eq!(policy.resolve(&BracketRecord::new("oltre 300.000", 10)), Ok(dec!(35)));
    }

    #[test]
    fn tiered_policy_uses_upper_bound() {
        let policy = FeePolicy::Tiered(FeeSchedule::irpef_2022());

        assert_eq!(
            policy.resolve(&BracketRecord::new("da 26.000 a 29.000", 400)),
            Ok(dec!(35))
        );
    }

    #[test]
    fn tiered_policy_reports_malformed_label() {
        let policy = FeePolicy::Tiered(FeeSchedule::irpef_2022());

        let err = policy
            .resolve(&BracketRecord::new("zero o minore di zero", 30))
            .unwrap_err();

        assert_eq!(err.label, "zero o minore di zero");
        assert!(matches!(
            err.reason,
            UnmappedReason::Label(LabelParseError::Malformed(_))
        ));
    }

    #[test]
    fn tiered_policy_reports_summary_row() {
        let err = resolve("TOTALE", &FeeSchedule::irpef_2022()).unwrap_err();

        assert_eq!(
            err.reason,
            UnmappedReason::Label(LabelParseError::SummaryRow("TOTALE".to_string()))
        );
    }

    #[test]
    fn precomputed_policy_reads_row_rate() {
        let record = BracketRecord::new("da 0 a 1.000", 10).with_irpef_rate(dec!(25));

        assert_eq!(FeePolicy::Precomputed.resolve(&record), Ok(dec!(25)));
    }

    #[test]
    fn precomputed_policy_without_rate_is_unmapped() {
        let err = FeePolicy::Precomputed
            .resolve(&BracketRecord::new("da 0 a 1.000", 10))
            .unwrap_err();

        assert_eq!(err.reason, UnmappedReason::MissingPrecomputedRate);
    }

    #[test]
    fn validate_rejects_negative_flat_rate() {
        let err = FeePolicy::flat(dec!(-1)).validate("custom_rate").unwrap_err();

        assert_eq!(err.name, "custom_rate");
        assert!(FeePolicy::Precomputed.validate("irpef").is_ok());
    }

    #[test]
    fn display_names_policy() {
        assert_eq!(FeePolicy::flat(dec!(35)).to_string(), "flat 35");
        assert_eq!(
            FeePolicy::Tiered(FeeSchedule::irpef_2022()).to_string(),
            "schedule irpef-2022"
        );
    }
}
