//! Parser for income-bracket labels.
//!
//! Bracket labels come from published income tables and follow the Italian
//! number format (`.` groups thousands, `,` starts the fraction):
//!
//! | Label                    | Result                                 |
//! |--------------------------|----------------------------------------|
//! | `da 10.000 a 12.000`     | `Bounded { upper: 12000 }`             |
//! | `fino a €15.000`         | `Bounded { upper: 15000 }`             |
//! | `oltre 300.000`          | `Unbounded { lower: Some(300000) }`    |
//! | `reddito oltre 300.000`  | `Unbounded { lower: Some(300000) }`    |
//! | `TOTALE`                 | [`LabelParseError::SummaryRow`]        |
//! | anything else            | [`LabelParseError::Malformed`]         |

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static UPPER_BOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\ba\s*€?\s*(\d[\d.]*(?:,\d+)?)\s*(?:€|euro)?\s*$")
        .expect("upper bound pattern is valid")
});

static OPEN_ENDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\boltre\b\s*€?\s*(\d[\d.]*(?:,\d+)?)?").expect("open-ended pattern is valid")
});

/// Errors raised when a label cannot be turned into a bracket bound.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LabelParseError {
    /// The row is a table total, not a bracket.
    #[error("summary row '{0}' is not an income bracket")]
    SummaryRow(String),

    /// The label does not follow any known bracket pattern.
    #[error("malformed bracket label '{0}'")]
    Malformed(String),

    /// The label matched but its amount is not a number.
    #[error("invalid amount '{amount}' in bracket label '{label}'")]
    InvalidAmount { label: String, amount: String },
}

/// The income range a bracket label denotes, reduced to the value used for
/// fee lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BracketBound {
    /// A closed bracket, represented by its upper income limit.
    Bounded { upper: Decimal },
    /// The open-ended top bracket.
    Unbounded { lower: Option<Decimal> },
}

impl BracketBound {
    /// The upper limit used for fee lookup, `None` for the top bracket.
    pub fn representative_value(&self) -> Option<Decimal> {
        match self {
            Self::Bounded { upper } => Some(*upper),
            Self::Unbounded { .. } => None,
        }
    }
}

/// Parses a bracket label into its bound.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::{BracketBound, parse_bracket_label};
///
/// assert_eq!(
///     parse_bracket_label("da 10.000 a 12.000"),
///     Ok(BracketBound::Bounded { upper: dec!(12000) })
/// );
/// assert_eq!(
///     parse_bracket_label("oltre 300.000"),
///     Ok(BracketBound::Unbounded { lower: Some(dec!(300000)) })
/// );
/// ```
pub fn parse_bracket_label(label: &str) -> Result<BracketBound, LabelParseError> {
    if label.to_lowercase().contains("totale") {
        return Err(LabelParseError::SummaryRow(label.to_string()));
    }

    if let Some(caps) = OPEN_ENDED.captures(label) {
        let lower = caps
            .get(1)
            .map(|m| parse_amount(label, m.as_str()))
            .transpose()?;
        return Ok(BracketBound::Unbounded { lower });
    }

    let caps = UPPER_BOUND
        .captures(label)
        .ok_or_else(|| LabelParseError::Malformed(label.to_string()))?;
    let upper = parse_amount(label, &caps[1])?;

    Ok(BracketBound::Bounded { upper })
}

/// Converts an Italian-formatted amount (`12.500,50`) to a [`Decimal`].
fn parse_amount(
    label: &str,
    amount: &str,
) -> Result<Decimal, LabelParseError> {
    let normalized = amount.replace('.', "").replace(',', ".");
    normalized
        .parse()
        .map_err(|_| LabelParseError::InvalidAmount {
            label: label.to_string(),
            amount: amount.to_string(),
        })
}
