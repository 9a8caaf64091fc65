use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::label::BracketBound;

/// Errors raised when a fee schedule does not partition `[0, ∞)`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeeScheduleError {
    #[error("fee schedule '{0}' has no tiers")]
    Empty(String),

    #[error("fee schedule '{name}': bound {bound} at tier {index} is not above the previous bound")]
    NonIncreasingBound {
        name: String,
        index: usize,
        bound: Decimal,
    },

    #[error("fee schedule '{name}': only the last tier may be unbounded (tier {index} is)")]
    UnboundedTierNotLast { name: String, index: usize },

    #[error("fee schedule '{0}' must end with an unbounded tier")]
    MissingUnboundedTier(String),

    #[error("fee schedule '{name}': tier {index} has negative bound or rate {value}")]
    NegativeValue {
        name: String,
        index: usize,
        value: Decimal,
    },
}

/// One `(upper_bound, rate)` pair. `upper_bound == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTier {
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl FeeTier {
    pub fn up_to(
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn above(rate: Decimal) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }
}

/// A named, validated fee schedule.
///
/// Tiers are ordered by strictly increasing upper bound and the last tier is
/// unbounded, so every income value maps to exactly one rate.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::{BracketBound, FeeSchedule, FeeTier};
///
/// let schedule = FeeSchedule::new(
///     "two-tier",
///     vec![FeeTier::up_to(dec!(20000), dec!(25)), FeeTier::above(dec!(40))],
/// )
/// .unwrap();
///
/// assert_eq!(schedule.rate_for(&BracketBound::Bounded { upper: dec!(20000) }), dec!(25));
/// assert_eq!(schedule.rate_for(&BracketBound::Unbounded { lower: None }), dec!(40));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeSchedule {
    name: String,
    tiers: Vec<FeeTier>,
}

impl FeeSchedule {
    /// Name of the IRPEF-aligned preset.
    pub const IRPEF_2022: &'static str = "irpef-2022";
    /// Name of the percentile-derived tiered preset.
    pub const CUSTOM_TIERS: &'static str = "custom-tiers";

    /// Builds a schedule, checking that the tiers partition `[0, ∞)`.
    ///
    /// # Errors
    ///
    /// Returns [`FeeScheduleError`] if:
    /// - `tiers` is empty
    /// - a bound or rate is negative
    /// - bounds are not strictly increasing
    /// - an unbounded tier is not last, or the last tier is bounded
    pub fn new(
        name: impl Into<String>,
        tiers: Vec<FeeTier>,
    ) -> Result<Self, FeeScheduleError> {
        let name = name.into();
        if tiers.is_empty() {
            return Err(FeeScheduleError::Empty(name));
        }

        let last = tiers.len() - 1;
        let mut previous: Option<Decimal> = None;
        for (index, tier) in tiers.iter().enumerate() {
            if tier.rate < Decimal::ZERO {
                return Err(FeeScheduleError::NegativeValue {
                    name,
                    index,
                    value: tier.rate,
                });
            }
            match tier.upper_bound {
                None if index != last => {
                    return Err(FeeScheduleError::UnboundedTierNotLast { name, index });
                }
                None => {}
                Some(_) if index == last => {
                    return Err(FeeScheduleError::MissingUnboundedTier(name));
                }
                Some(bound) if bound < Decimal::ZERO => {
                    return Err(FeeScheduleError::NegativeValue {
                        name,
                        index,
                        value: bound,
                    });
                }
                Some(bound) => {
                    if previous.is_some_and(|p| bound <= p) {
                        return Err(FeeScheduleError::NonIncreasingBound { name, index, bound });
                    }
                    previous = Some(bound);
                }
            }
        }

        Ok(Self { name, tiers })
    }

    /// Fee schedule aligned with the 2022 IRPEF brackets.
    pub fn irpef_2022() -> Self {
        Self::preset(
            Self::IRPEF_2022,
            &[(15_000, 25), (28_000, 30), (50_000, 35)],
            40,
        )
    }

    /// Tiered schedule with an extra low and high bracket, designed from the
    /// quartiles of the population's upper income limits.
    pub fn custom_tiers() -> Self {
        Self::preset(
            Self::CUSTOM_TIERS,
            &[(10_000, 20), (70_000, 30), (100_000, 45)],
            50,
        )
    }

    fn preset(
        name: &str,
        bounded: &[(i64, i64)],
        top_rate: i64,
    ) -> Self {
        let mut tiers: Vec<FeeTier> = bounded
            .iter()
            .map(|&(bound, rate)| FeeTier::up_to(Decimal::from(bound), Decimal::from(rate)))
            .collect();
        tiers.push(FeeTier::above(Decimal::from(top_rate)));
        Self {
            name: name.to_string(),
            tiers,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tiers(&self) -> &[FeeTier] {
        &self.tiers
    }

    /// Rate of the first tier whose upper bound is at or above the bracket's
    /// upper limit. The open-ended bracket always takes the top rate.
    pub fn rate_for(
        &self,
        bound: &BracketBound,
    ) -> Decimal {
        match bound.representative_value() {
            Some(value) => self
                .tiers
                .iter()
                .find(|t| t.upper_bound.is_none_or(|b| value <= b))
                .map_or_else(|| self.top_rate(), |t| t.rate),
            None => self.top_rate(),
        }
    }

    fn top_rate(&self) -> Decimal {
        // Non-empty by construction.
        self.tiers.last().map_or(Decimal::ZERO, |t| t.rate)
    }
}
