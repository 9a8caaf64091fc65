//! Operator-facing scenario parameters and their domain checks.
//!
//! The interactive surface clamps its inputs, but every value is validated
//! again here before any computation runs. Nothing is clamped silently.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::DiscountProgram;

/// A parameter fell outside its documented domain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid parameter `{name}` = {value}: expected {expected}")]
pub struct InvalidParameterError {
    pub name: String,
    pub value: Decimal,
    pub expected: String,
}

/// Fails unless `min <= value <= max`.
pub fn ensure_range(
    name: impl Into<String>,
    value: Decimal,
    min: Decimal,
    max: Decimal,
) -> Result<(), InvalidParameterError> {
    if value < min || value > max {
        return Err(InvalidParameterError {
            name: name.into(),
            value,
            expected: format!("a value in [{min}, {max}]"),
        });
    }
    Ok(())
}

/// Fails when `value` is negative.
pub fn ensure_non_negative(
    name: impl Into<String>,
    value: Decimal,
) -> Result<(), InvalidParameterError> {
    if value < Decimal::ZERO {
        return Err(InvalidParameterError {
            name: name.into(),
            value,
            expected: "a non-negative value".to_string(),
        });
    }
    Ok(())
}

/// Upper limit of the custom flat rate.
pub const MAX_CUSTOM_RATE: u32 = 100;
/// Upper limit of the attrition percentage accepted from the operator.
pub const MAX_ATTRITION_PCT: u32 = 50;
/// Upper limit of either eligibility percentage accepted from the operator.
pub const MAX_ELIGIBLE_PCT: u32 = 50;

/// The parameter set an operator can tune between runs.
///
/// Defaults reproduce the reference scenario: a custom flat rate of 35,
/// no attrition, 15% members rebated 5 each and 10% relatives rebated 3
/// each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioParams {
    /// Flat fee applied to every bracket under the custom policy.
    pub custom_rate: u32,

    /// Percentage of projected revenue lost to clients opting out.
    pub attrition_pct: u32,

    pub rebate_tesserati: Decimal,
    pub rebate_congiunti: Decimal,
    pub eligible_pct_tesserati: u32,
    pub eligible_pct_congiunti: u32,
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            custom_rate: 35,
            attrition_pct: 0,
            rebate_tesserati: Decimal::from(5),
            rebate_congiunti: Decimal::from(3),
            eligible_pct_tesserati: 15,
            eligible_pct_congiunti: 10,
        }
    }
}

impl ScenarioParams {
    /// Validates every field against its surface domain.
    ///
    /// # Example
    ///
    /// ```
    /// use tariff_core::ScenarioParams;
    ///
    /// let params = ScenarioParams { attrition_pct: 60, ..Default::default() };
    /// let err = params.validate().unwrap_err();
    ///
    /// assert_eq!(err.name, "attrition_pct");
    /// ```
    pub fn validate(&self) -> Result<(), InvalidParameterError> {
        let bounded = [
            ("custom_rate", self.custom_rate, MAX_CUSTOM_RATE),
            ("attrition_pct", self.attrition_pct, MAX_ATTRITION_PCT),
            ("eligible_pct_tesserati", self.eligible_pct_tesserati, MAX_ELIGIBLE_PCT),
            ("eligible_pct_congiunti", self.eligible_pct_congiunti, MAX_ELIGIBLE_PCT),
        ];
        for (name, value, max) in bounded {
            ensure_range(
                name,
                Decimal::from(value),
                Decimal::ZERO,
                Decimal::from(max),
            )?;
        }
        ensure_non_negative("rebate_tesserati", self.rebate_tesserati)?;
        ensure_non_negative("rebate_congiunti", self.rebate_congiunti)
    }

    pub fn custom_rate(&self) -> Decimal {
        Decimal::from(self.custom_rate)
    }

    pub fn attrition_pct(&self) -> Decimal {
        Decimal::from(self.attrition_pct)
    }

    /// The two reference discount programs, members first.
    pub fn discount_programs(&self) -> Vec<DiscountProgram> {
        vec![
            DiscountProgram::tesserati(
                Decimal::from(self.eligible_pct_tesserati),
                self.rebate_tesserati,
            ),
            DiscountProgram::congiunti(
                Decimal::from(self.eligible_pct_congiunti),
                self.rebate_congiunti,
            ),
        ]
    }
}
