//! CSV loader for the client population table.
//!
//! ## CSV Format
//!
//! Headers are matched by name; column order does not matter.
//!
//! | Column            | Required | Type    | Notes                                  |
//! |-------------------|----------|---------|----------------------------------------|
//! | `Classe`          | yes      | string  | Bracket label, e.g. `da 0 a 10.000`    |
//! | `Numero_Clienti`  | yes      | integer | Non-negative                           |
//! | `Tariffa_IRPEF`   | no       | decimal | Rate computed upstream, may be empty   |
//! | `Fatturato_IRPEF` | no       | decimal | Revenue computed upstream, may be empty|
//!
//! ```csv
//! Classe,Numero_Clienti,Tariffa_IRPEF,Fatturato_IRPEF
//! da 0 a 10.000,1500,25,37500
//! oltre 120.000,50,40,2000
//! ```

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tariff_core::BracketRecord;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur when loading the population table.
#[derive(Debug, Error)]
pub enum PopulationLoadError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("empty bracket label on row {0}")]
    EmptyLabel(usize),

    #[error("duplicate bracket label '{label}' on row {row}")]
    DuplicateLabel { label: String, row: usize },
}

impl From<csv::Error> for PopulationLoadError {
    fn from(err: csv::Error) -> Self {
        PopulationLoadError::CsvParse(err.to_string())
    }
}

/// A single row of the population CSV.
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct PopulationRow {
    #[serde(rename = "Classe")]
    classe: String,

    #[serde(rename = "Numero_Clienti")]
    numero_clienti: u64,

    #[serde(
        rename = "Tariffa_IRPEF",
        default,
        deserialize_with = "deserialize_optional_decimal"
    )]
    tariffa_irpef: Option<Decimal>,

    #[serde(
        rename = "Fatturato_IRPEF",
        default,
        deserialize_with = "deserialize_optional_decimal"
    )]
    fatturato_irpef: Option<Decimal>,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Loader for the bracket population table.
pub struct PopulationLoader;

impl PopulationLoader {
    /// Parse the population table from any reader, in file order.
    ///
    /// A precomputed `Fatturato_IRPEF` that disagrees with
    /// `Numero_Clienti * Tariffa_IRPEF` is logged and otherwise ignored;
    /// revenue is always recomputed.
    ///
    /// # Errors
    ///
    /// * [`PopulationLoadError::CsvParse`] – bad structure, missing column,
    ///   negative or non-numeric count.
    /// * [`PopulationLoadError::EmptyLabel`] / [`PopulationLoadError::DuplicateLabel`]
    ///   – labels must be present and unique.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<BracketRecord>, PopulationLoadError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        let mut seen = HashSet::new();

        for (idx, result) in csv_reader.deserialize::<PopulationRow>().enumerate() {
            let row = result?;
            let row_number = idx + 1;

            if row.classe.is_empty() {
                return Err(PopulationLoadError::EmptyLabel(row_number));
            }
            if !seen.insert(row.classe.clone()) {
                return Err(PopulationLoadError::DuplicateLabel {
                    label: row.classe,
                    row: row_number,
                });
            }
            check_precomputed_revenue(&row);

            records.push(BracketRecord {
                label: row.classe,
                client_count: row.numero_clienti,
                irpef_rate: row.tariffa_irpef,
            });
        }

        debug!(brackets = records.len(), "population table parsed");
        Ok(records)
    }

    /// Read a file from disk and delegate to [`PopulationLoader::parse`].
    pub fn load_from_file(path: &Path) -> Result<Vec<BracketRecord>, PopulationLoadError> {
        let file = std::fs::File::open(path).map_err(|source| PopulationLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(file)
    }
}

fn check_precomputed_revenue(row: &PopulationRow) {
    if let (Some(rate), Some(revenue)) = (row.tariffa_irpef, row.fatturato_irpef) {
        let expected = Decimal::from(row.numero_clienti) * rate;
        if expected != revenue {
            warn!(
                bracket = %row.classe,
                %expected,
                found = %revenue,
                "precomputed Fatturato_IRPEF disagrees with Numero_Clienti * Tariffa_IRPEF"
            );
        }
    }
}
