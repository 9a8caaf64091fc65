//! The revenue pipeline: one derived row per bracket, under the IRPEF and
//! custom policies side by side.
//!
//! # Stages
//!
//! For every bracket, independently of the others:
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Resolve the IRPEF and custom rates |
//! | 2    | Gross revenue under both policies (`client_count * rate`) |
//! | 3    | Attrition adjustment (custom only, or both, per [`AttritionScope`]) |
//! | 4    | Total rebate across discount programs (policy independent) |
//! | 5    | Net revenue = adjusted - rebate, for both policies |
//!
//! Net revenue is not clamped: when rebates exceed the adjusted figure the
//! row shows a negative net.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tariff_core::calculations::{PipelineConfig, RevenuePipeline};
//! use tariff_core::{BracketRecord, DiscountProgram, FeeSchedule};
//!
//! let table = vec![
//!     BracketRecord::new("da 0 a 10.000", 100),
//!     BracketRecord::new("da 20.000 a 26.000", 200),
//! ];
//! let config = PipelineConfig::new(
//!     FeeSchedule::irpef_2022(),
//!     dec!(35),
//!     dec!(20),
//!     vec![DiscountProgram::tesserati(dec!(15), dec!(5))],
//! );
//!
//! let output = RevenuePipeline::new(config).unwrap().run(&table).unwrap();
//! let totals = output.totals();
//!
//! assert_eq!(totals.gross_irpef, dec!(8500));
//! assert_eq!(totals.adjusted_custom, dec!(8400));
//! assert_eq!(totals.total_rebate, dec!(225));
//! assert_eq!(totals.net_irpef, dec!(8275));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::aggregate::{self, PopulationShare, RevenueTotals};
use crate::calculations::attrition::{AttritionScope, adjust};
use crate::calculations::discount::compute_rebate;
use crate::calculations::fee_policy::{FeePolicy, UnmappedBracketError, UnmappedReason};
use crate::calculations::revenue::gross_revenue;
use crate::models::{
    BracketRecord, DiscountProgram, FeeSchedule, PolicyRevenue, RevenueRow, total_population,
};
use crate::params::{InvalidParameterError, ScenarioParams};

/// Errors surfaced by the pipeline and its aggregate views.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A bracket has no rate under one of the policies (strict mode only).
    #[error(transparent)]
    UnmappedBracket(#[from] UnmappedBracketError),

    /// A parameter is outside its domain.
    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),

    /// No brackets, or no clients, to compute over.
    #[error("bracket table is empty or has no clients")]
    EmptyPopulation,
}

/// What to do with a bracket that cannot be priced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    /// Exclude the bracket and report it in [`PipelineOutput::skipped`].
    #[default]
    Lenient,
    /// Fail the whole run.
    Strict,
}

/// A bracket excluded from the output, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedBracket {
    pub label: String,
    pub client_count: u64,
    pub reason: UnmappedReason,
}

/// Parameters of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub irpef_policy: FeePolicy,
    pub custom_policy: FeePolicy,
    pub attrition_pct: Decimal,
    pub attrition_scope: AttritionScope,
    pub discount_programs: Vec<DiscountProgram>,
    pub mode: RunMode,
}

impl PipelineConfig {
    /// Reference configuration: IRPEF-aligned schedule against a flat custom
    /// rate, attrition on the custom policy only, lenient mode.
    pub fn new(
        irpef_schedule: FeeSchedule,
        custom_rate: Decimal,
        attrition_pct: Decimal,
        discount_programs: Vec<DiscountProgram>,
    ) -> Self {
        Self {
            irpef_policy: FeePolicy::Tiered(irpef_schedule),
            custom_policy: FeePolicy::flat(custom_rate),
            attrition_pct,
            attrition_scope: AttritionScope::default(),
            discount_programs,
            mode: RunMode::default(),
        }
    }

    /// Builds the reference configuration from operator parameters, after
    /// checking them against their surface domains.
    pub fn from_params(
        params: &ScenarioParams,
        irpef_schedule: FeeSchedule,
    ) -> Result<Self, InvalidParameterError> {
        params.validate()?;
        Ok(Self::new(
            irpef_schedule,
            params.custom_rate(),
            params.attrition_pct(),
            params.discount_programs(),
        ))
    }

    pub fn with_custom_policy(
        mut self,
        policy: FeePolicy,
    ) -> Self {
        self.custom_policy = policy;
        self
    }

    pub fn with_attrition_scope(
        mut self,
        scope: AttritionScope,
    ) -> Self {
        self.attrition_scope = scope;
        self
    }

    pub fn with_mode(
        mut self,
        mode: RunMode,
    ) -> Self {
        self.mode = mode;
        self
    }

    /// Checks every parameter before any row is computed.
    pub fn validate(&self) -> Result<(), InvalidParameterError> {
        self.irpef_policy.validate("irpef_rate")?;
        self.custom_policy.validate("custom_rate")?;
        crate::params::ensure_range(
            "attrition_pct",
            self.attrition_pct,
            Decimal::ZERO,
            Decimal::ONE_HUNDRED,
        )?;
        self.discount_programs
            .iter()
            .try_for_each(DiscountProgram::validate)
    }

    fn irpef_attrition_pct(&self) -> Decimal {
        if self.attrition_scope.applies_to_irpef() {
            self.attrition_pct
        } else {
            Decimal::ZERO
        }
    }
}

/// Rows derived from one run, in input order, plus the brackets excluded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    pub rows: Vec<RevenueRow>,
    pub skipped: Vec<SkippedBracket>,
}

impl PipelineOutput {
    /// Clients in the priced rows.
    pub fn resolved_population(&self) -> u64 {
        self.rows.iter().map(|r| r.client_count).sum()
    }

    /// Clients in the excluded brackets.
    pub fn skipped_population(&self) -> u64 {
        self.skipped.iter().map(|s| s.client_count).sum()
    }

    /// Priced plus excluded clients; equals the input table's population.
    pub fn total_population(&self) -> u64 {
        self.resolved_population() + self.skipped_population()
    }

    pub fn totals(&self) -> RevenueTotals {
        aggregate::totals(&self.rows)
    }

    /// `(total_net_irpef, total_net_custom)`.
    pub fn net_totals(&self) -> (Decimal, Decimal) {
        let totals = self.totals();
        (totals.net_irpef, totals.net_custom)
    }

    pub fn top_by_population(
        &self,
        n: usize,
    ) -> Result<Vec<PopulationShare>, PipelineError> {
        aggregate::top_by_population(&self.rows, n)
    }
}

/// Derives the full revenue table from a bracket table.
///
/// Holds only its configuration. The table is borrowed, never mutated, and
/// every call recomputes everything from scratch.
#[derive(Debug, Clone)]
pub struct RevenuePipeline {
    config: PipelineConfig,
}

impl RevenuePipeline {
    /// Validates `config` and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidParameter`] if any parameter is
    /// outside its domain.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage over `records`.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::EmptyPopulation`] if `records` is empty or holds
    ///   no clients
    /// - [`PipelineError::InvalidParameter`] if the client counts add up to
    ///   more than `u64::MAX`
    /// - [`PipelineError::UnmappedBracket`] in strict mode, for the first
    ///   bracket that cannot be priced
    pub fn run(
        &self,
        records: &[BracketRecord],
    ) -> Result<PipelineOutput, PipelineError> {
        // Every population sum over the output is bounded by this total.
        match total_population(records) {
            None => return Err(population_overflow(records).into()),
            Some(0) => return Err(PipelineError::EmptyPopulation),
            Some(_) => {}
        }

        let mut rows = Vec::with_capacity(records.len());
        let mut skipped = Vec::new();

        for record in records {
            let (irpef_rate, custom_rate) = match self.resolve_rates(record) {
                Ok(rates) => rates,
                Err(err) if self.config.mode == RunMode::Strict => return Err(err.into()),
                Err(err) => {
                    warn!(
                        bracket = %record.label,
                        clients = record.client_count,
                        reason = %err.reason,
                        "excluding unmapped bracket"
                    );
                    skipped.push(SkippedBracket {
                        label: record.label.clone(),
                        client_count: record.client_count,
                        reason: err.reason,
                    });
                    continue;
                }
            };
            rows.push(self.derive_row(record, irpef_rate, custom_rate)?);
        }

        debug!(
            rows = rows.len(),
            skipped = skipped.len(),
            irpef = %self.config.irpef_policy,
            custom = %self.config.custom_policy,
            "revenue table derived"
        );

        Ok(PipelineOutput { rows, skipped })
    }

    /// Step 1: both rates, or the first policy failure.
    fn resolve_rates(
        &self,
        record: &BracketRecord,
    ) -> Result<(Decimal, Decimal), UnmappedBracketError> {
        let irpef = self.config.irpef_policy.resolve(record)?;
        let custom = self.config.custom_policy.resolve(record)?;
        Ok((irpef, custom))
    }

    /// Steps 2 to 5.
    fn derive_row(
        &self,
        record: &BracketRecord,
        irpef_rate: Decimal,
        custom_rate: Decimal,
    ) -> Result<RevenueRow, PipelineError> {
        let rebate = compute_rebate(record.client_count, &self.config.discount_programs)?;

        let irpef = self.policy_revenue(
            record.client_count,
            irpef_rate,
            self.config.irpef_attrition_pct(),
            rebate.total,
        )?;
        let custom = self.policy_revenue(
            record.client_count,
            custom_rate,
            self.config.attrition_pct,
            rebate.total,
        )?;

        Ok(RevenueRow {
            label: record.label.clone(),
            client_count: record.client_count,
            irpef,
            custom,
            rebates: rebate.programs,
            total_rebate: rebate.total,
        })
    }

    fn policy_revenue(
        &self,
        client_count: u64,
        rate: Decimal,
        attrition_pct: Decimal,
        total_rebate: Decimal,
    ) -> Result<PolicyRevenue, InvalidParameterError> {
        let gross = gross_revenue(client_count, rate);
        let adjusted = adjust(gross, attrition_pct)?;
        Ok(PolicyRevenue {
            rate,
            gross,
            adjusted,
            net: adjusted - total_rebate,
        })
    }
}

fn population_overflow(records: &[BracketRecord]) -> InvalidParameterError {
    InvalidParameterError {
        name: "client_count".to_string(),
        value: records.iter().map(|r| Decimal::from(r.client_count)).sum(),
        expected: format!("a total population of at most {}", u64::MAX),
    }
}

/// One-shot run with the reference configuration.
///
/// # Errors
///
/// See [`RevenuePipeline::new`] and [`RevenuePipeline::run`].
pub fn run(
    records: &[BracketRecord],
    irpef_schedule: &FeeSchedule,
    custom_rate: Decimal,
    attrition_pct: Decimal,
    discount_programs: &[DiscountProgram],
) -> Result<PipelineOutput, PipelineError> {
    let config = PipelineConfig::new(
        irpef_schedule.clone(),
        custom_rate,
        attrition_pct,
        discount_programs.to_vec(),
    );
    RevenuePipeline::new(config)?.run(records)
}
