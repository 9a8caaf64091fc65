use std::path::PathBuf;

use clap::Parser;
use rust_decimal::Decimal;
use tariff_core::calculations::AttritionScope;

use crate::config::ScenarioOverrides;

/// Compare revenue under the IRPEF-aligned schedule and a custom fee policy.
///
/// Reads a `Classe,Numero_Clienti` population table, derives gross,
/// attrition-adjusted and net revenue per bracket under both policies, and
/// prints totals, a uniform-rate baseline and the most populated brackets.
///
/// Every scenario flag overrides the same key in `--config`; keys set in
/// neither fall back to the built-in defaults.
#[derive(Debug, Parser)]
#[command(name = "tariff-report")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Population CSV (Classe, Numero_Clienti[, Tariffa_IRPEF, Fatturato_IRPEF])
    #[arg(short, long)]
    pub input: PathBuf,

    /// TOML scenario file with a [scenario] table and [[schedules]] entries
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Flat fee of the custom policy, 0 to 100 [default: 35]
    #[arg(long)]
    pub custom_rate: Option<u32>,

    /// Price the custom policy with a named schedule instead of the flat rate
    #[arg(long, value_name = "NAME")]
    pub custom_schedule: Option<String>,

    /// Attrition percentage, 0 to 50 [default: 0]
    #[arg(long, value_name = "PCT")]
    pub attrition: Option<u32>,

    /// Policies attrition applies to: custom-only or all-policies [default: custom-only]
    #[arg(long, value_name = "SCOPE")]
    pub attrition_scope: Option<AttritionScope>,

    /// Rebate per eligible member [default: 5]
    #[arg(long)]
    pub rebate_tesserati: Option<Decimal>,

    /// Rebate per eligible relative [default: 3]
    #[arg(long)]
    pub rebate_congiunti: Option<Decimal>,

    /// Percentage of each bracket eligible as members, 0 to 50 [default: 15]
    #[arg(long, value_name = "PCT")]
    pub eligible_tesserati: Option<u32>,

    /// Percentage of each bracket eligible as relatives, 0 to 50 [default: 10]
    #[arg(long, value_name = "PCT")]
    pub eligible_congiunti: Option<u32>,

    /// Uniform rate of the baseline comparison [default: 30]
    #[arg(long)]
    pub baseline_rate: Option<Decimal>,

    /// Named schedule for the IRPEF-aligned policy [default: irpef-2022]
    #[arg(long, value_name = "NAME")]
    pub irpef_schedule: Option<String>,

    /// Use the Tariffa_IRPEF column of the input instead of a schedule lookup
    #[arg(long)]
    pub precomputed_irpef: bool,

    /// Number of brackets in the population ranking [default: 10]
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,

    /// Fail on the first bracket that cannot be priced
    #[arg(long)]
    pub strict: bool,

    /// Write the derived revenue table to this CSV
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Append log records to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The scenario keys set on the command line. Boolean switches only
    /// override when present.
    pub fn overrides(&self) -> ScenarioOverrides {
        ScenarioOverrides {
            custom_rate: self.custom_rate,
            custom_schedule: self.custom_schedule.clone(),
            attrition_pct: self.attrition,
            attrition_scope: self.attrition_scope,
            rebate_tesserati: self.rebate_tesserati,
            rebate_congiunti: self.rebate_congiunti,
            eligible_pct_tesserati: self.eligible_tesserati,
            eligible_pct_congiunti: self.eligible_congiunti,
            baseline_rate: self.baseline_rate,
            irpef_schedule: self.irpef_schedule.clone(),
            precomputed_irpef: self.precomputed_irpef.then_some(true),
            top: self.top,
            strict: self.strict.then_some(true),
        }
    }
}
