use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::params::{InvalidParameterError, ensure_non_negative, ensure_range};

/// A discount program: a share of each bracket is eligible for a fixed
/// per-client rebate.
///
/// Programs are independent and additive. A client counted as eligible for
/// one program may also be counted for another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountProgram {
    /// Display name, also used for export column headers.
    pub name: String,

    /// Percentage of the bracket's clients that are eligible, in [0, 100].
    pub eligible_pct: Decimal,

    /// Fixed rebate granted to each eligible client.
    pub rebate_per_client: Decimal,
}

impl DiscountProgram {
    pub fn new(
        name: impl Into<String>,
        eligible_pct: Decimal,
        rebate_per_client: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            eligible_pct,
            rebate_per_client,
        }
    }

    /// Association members.
    pub fn tesserati(
        eligible_pct: Decimal,
        rebate_per_client: Decimal,
    ) -> Self {
        Self::new("Tesserati", eligible_pct, rebate_per_client)
    }

    /// Relatives of association members.
    pub fn congiunti(
        eligible_pct: Decimal,
        rebate_per_client: Decimal,
    ) -> Self {
        Self::new("Congiunti", eligible_pct, rebate_per_client)
    }

    /// Checks `eligible_pct` is in [0, 100] and the rebate is non-negative.
    pub fn validate(&self) -> Result<(), InvalidParameterError> {
        ensure_range(
            format!("{}.eligible_pct", self.name),
            self.eligible_pct,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;
        ensure_non_negative(
            format!("{}.rebate_per_client", self.name),
            self.rebate_per_client,
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn named_constructors_set_names() {
        assert_eq!(DiscountProgram::tesserati(dec!(15), dec!(5)).name, "Tesserati");
        assert_eq!(DiscountProgram::congiunti(dec!(10), dec!(3)).name, "Congiunti");
    }

    #[test]
    fn validate_accepts_full_range() {
        assert!(DiscountProgram::tesserati(dec!(0), dec!(0)).validate().is_ok());
        assert!(DiscountProgram::tesserati(dec!(100), dec!(5)).validate().is_ok());
    }

    #[test]
    fn validate_rejects_pct_above_hundred() {
        let err = DiscountProgram::tesserati(dec!(100.5), dec!(5))
            .validate()
            .unwrap_err();

        assert_eq!(err.name, "Tesserati.eligible_pct");
        assert_eq!(err.value, dec!(100.5));
    }

    #[test]
    fn validate_rejects_negative_rebate() {
        let err = DiscountProgram::congiunti(dec!(10), dec!(-1))
            .validate()
            .unwrap_err();

        assert_eq!(err.name, "Congiunti.rebate_per_client");
    }
}
