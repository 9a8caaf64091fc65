//! Synthesis of a client population from published bracket percentages.
//!
//! The input is a two-column table (`Classe`, `Percentuale`) giving each
//! income bracket's share of taxpayers. Multiplying by a target number of
//! clients gives a population table the pipeline can price.

use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;
use tariff_core::calculations::common::{pct_to_fraction, round_half_even};
use tariff_core::params::ensure_range;
use tariff_core::{BracketRecord, InvalidParameterError, LabelParseError, parse_bracket_label};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("bracket '{label}': {source}")]
    InvalidPercentage {
        label: String,
        #[source]
        source: InvalidParameterError,
    },

    #[error("bracket '{label}': percentage '{value}' is not a number")]
    NotANumber { label: String, value: String },

    #[error("bracket '{0}': client count does not fit in 64 bits")]
    CountOverflow(String),
}

impl From<csv::Error> for SynthesisError {
    fn from(err: csv::Error) -> Self {
        SynthesisError::CsvParse(err.to_string())
    }
}

/// One row of the percentages table. `percentage` is `None` when the
/// source left the cell empty or marked it `NA`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PercentageRow {
    pub label: String,
    pub percentage: Option<Decimal>,
}

impl PercentageRow {
    pub fn new(
        label: impl Into<String>,
        percentage: Option<Decimal>,
    ) -> Self {
        Self {
            label: label.into(),
            percentage,
        }
    }
}

/// Result of [`synthesize_population`]: the population table plus the
/// labels of the rows that were dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesis {
    pub records: Vec<BracketRecord>,
    pub dropped: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawPercentageRow {
    #[serde(rename = "Classe", default)]
    classe: String,

    #[serde(rename = "Percentuale", default)]
    percentuale: String,
}

/// Parses a `Classe,Percentuale` table.
///
/// Percentages accept either `12.5` or the Italian `12,5`; empty cells and
/// `NA`/`NaN` become `None`.
pub fn parse_percentages<R: Read>(reader: R) -> Result<Vec<PercentageRow>, SynthesisError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.deserialize::<RawPercentageRow>() {
        let raw = result?;
        let percentage = parse_percentage(&raw.classe, &raw.percentuale)?;
        rows.push(PercentageRow::new(raw.classe, percentage));
    }
    Ok(rows)
}

/// Reads a file from disk and delegates to [`parse_percentages`].
pub fn load_percentages(path: &Path) -> Result<Vec<PercentageRow>, SynthesisError> {
    let file = std::fs::File::open(path).map_err(|source| SynthesisError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_percentages(file)
}

fn parse_percentage(
    label: &str,
    raw: &str,
) -> Result<Option<Decimal>, SynthesisError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.replace(',', ".")
        .parse::<Decimal>()
        .map(Some)
        .map_err(|_| SynthesisError::NotANumber {
            label: label.to_string(),
            value: raw.to_string(),
        })
}

/// Builds a population of `total_clients` from bracket percentages.
///
/// Each bracket gets `round_half_even(percentage / 100 * total_clients)`
/// clients, so the synthesized total can differ from `total_clients` by a
/// few units. Rows with an empty label or percentage are dropped, and so
/// is the summary `TOTALE` row.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_data::synthesis::{PercentageRow, synthesize_population};
///
/// let rows = vec![
///     PercentageRow::new("da 0 a 10.000", Some(dec!(25))),
///     PercentageRow::new("oltre 10.000", Some(dec!(75))),
///     PercentageRow::new("TOTALE", Some(dec!(100))),
/// ];
///
/// let synthesis = synthesize_population(&rows, 6000).unwrap();
///
/// assert_eq!(synthesis.records[0].client_count, 1500);
/// assert_eq!(synthesis.records[1].client_count, 4500);
/// assert_eq!(synthesis.dropped, vec!["TOTALE".to_string()]);
/// ```
///
/// # Errors
///
/// [`SynthesisError::InvalidPercentage`] if a percentage is outside [0, 100].
pub fn synthesize_population(
    rows: &[PercentageRow],
    total_clients: u64,
) -> Result<Synthesis, SynthesisError> {
    let total = Decimal::from(total_clients);
    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = Vec::new();

    for row in rows {
        if is_summary_row(&row.label) {
            info!(bracket = %row.label, "dropping summary row");
            dropped.push(row.label.clone());
            continue;
        }
        let Some(pct) = row.percentage.filter(|_| !row.label.is_empty()) else {
            debug!(bracket = %row.label, "dropping row with missing values");
            dropped.push(row.label.clone());
            continue;
        };

        ensure_range("percentage", pct, Decimal::ZERO, Decimal::ONE_HUNDRED).map_err(
            |source| SynthesisError::InvalidPercentage {
                label: row.label.clone(),
                source,
            },
        )?;

        let client_count = round_half_even(pct_to_fraction(pct) * total)
            .to_u64()
            .ok_or_else(|| SynthesisError::CountOverflow(row.label.clone()))?;
        records.push(BracketRecord::new(row.label.clone(), client_count));
    }

    debug!(
        brackets = records.len(),
        dropped = dropped.len(),
        total_clients,
        "population synthesized"
    );

    Ok(Synthesis { records, dropped })
}

fn is_summary_row(label: &str) -> bool {
    matches!(parse_bracket_label(label), Err(LabelParseError::SummaryRow(_)))
}
