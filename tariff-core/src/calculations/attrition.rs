//! Client attrition ("rinuncia"): a deterministic share of revenue lost
//! when fees rise.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::pct_to_fraction;
use crate::params::{InvalidParameterError, ensure_range};

/// Which policies attrition applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AttritionScope {
    /// Only the custom policy loses clients; the IRPEF figure is the
    /// reference and stays unadjusted.
    #[default]
    CustomOnly,
    /// Both policies lose the same share of clients.
    AllPolicies,
}

impl AttritionScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CustomOnly => "custom-only",
            Self::AllPolicies => "all-policies",
        }
    }

    pub fn applies_to_irpef(&self) -> bool {
        matches!(self, Self::AllPolicies)
    }
}

impl fmt::Display for AttritionScope {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttritionScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom-only" => Ok(Self::CustomOnly),
            "all-policies" => Ok(Self::AllPolicies),
            other => Err(format!(
                "unknown attrition scope '{other}' (expected custom-only or all-policies)"
            )),
        }
    }
}

/// `gross * (1 - attrition_pct / 100)`.
///
/// # Errors
///
/// Returns [`InvalidParameterError`] if `attrition_pct` is outside [0, 100].
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::calculations::adjust;
///
/// assert_eq!(adjust(dec!(10500), dec!(20)).unwrap(), dec!(8400));
/// assert!(adjust(dec!(10500), dec!(101)).is_err());
/// ```
pub fn adjust(
    gross: Decimal,
    attrition_pct: Decimal,
) -> Result<Decimal, InvalidParameterError> {
    ensure_range(
        "attrition_pct",
        attrition_pct,
        Decimal::ZERO,
        Decimal::ONE_HUNDRED,
    )?;
    Ok(gross * (Decimal::ONE - pct_to_fraction(attrition_pct)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn zero_attrition_keeps_gross() {
        assert_eq!(adjust(dec!(8500), dec!(0)), Ok(dec!(8500)));
    }

    #[test]
    fn full_attrition_zeroes_revenue() {
        assert_eq!(adjust(dec!(8500), dec!(100)), Ok(dec!(0)));
    }

    #[test]
    fn twenty_percent_attrition() {
        assert_eq!(adjust(dec!(10500), dec!(20)), Ok(dec!(8400)));
    }

    #[test]
    fn fractional_attrition_is_exact() {
        assert_eq!(adjust(dec!(1000), dec!(12.5)), Ok(dec!(875)));
    }

    #[test]
    fn out_of_range_attrition_is_rejected() {
        let below = adjust(dec!(100), dec!(-1)).unwrap_err();
        let above = adjust(dec!(100), dec!(100.01)).unwrap_err();

        assert_eq!(below.name, "attrition_pct");
        assert_eq!(above.value, dec!(100.01));
    }

    #[test]
    fn scope_round_trips_through_strings() {
        for scope in [AttritionScope::CustomOnly, AttritionScope::AllPolicies] {
            assert_eq!(scope.as_str().parse::<AttritionScope>(), Ok(scope));
        }
        assert!("both".parse::<AttritionScope>().is_err());
    }

    #[test]
    fn default_scope_is_custom_only() {
        assert_eq!(AttritionScope::default(), AttritionScope::CustomOnly);
        assert!(!AttritionScope::CustomOnly.applies_to_irpef());
        assert!(AttritionScope::AllPolicies.applies_to_irpef());
    }
}
