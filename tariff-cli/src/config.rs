//! Scenario configuration: an optional TOML file merged under the command
//! line flags.
//!
//! ```toml
//! [scenario]
//! custom_rate = 40
//! attrition_pct = 10
//! attrition_scope = "all-policies"
//! irpef_schedule = "irpef-2022"
//! custom_schedule = "flat-low"
//! top = 5
//!
//! [[schedules]]
//! name = "flat-low"
//! tiers = [
//!     { up_to = 20000, rate = 20 },
//!     { rate = 30 },
//! ]
//! ```
//!
//! Precedence is flag, then file, then built-in default.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tariff_core::calculations::{AttritionScope, FeePolicy, PipelineConfig, RunMode};
use tariff_core::{
    FeeSchedule, FeeScheduleError, FeeTier, InvalidParameterError, RegistryError, ScenarioParams,
    ScheduleRegistry,
};
use thiserror::Error;
use tracing::{debug, warn};

/// Uniform rate the two policies are compared against.
pub const DEFAULT_BASELINE_RATE: u32 = 30;
/// Number of brackets in the population ranking.
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid scenario file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Schedule(#[from] FeeScheduleError),

    #[error(transparent)]
    UnknownSchedule(#[from] RegistryError),

    #[error(transparent)]
    InvalidParameter(#[from] InvalidParameterError),
}

/// Scenario keys that may be set by the file or the command line.
///
/// Every key is optional; unset keys fall through to the next source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioOverrides {
    pub custom_rate: Option<u32>,
    pub custom_schedule: Option<String>,
    pub attrition_pct: Option<u32>,
    pub attrition_scope: Option<AttritionScope>,
    pub rebate_tesserati: Option<Decimal>,
    pub rebate_congiunti: Option<Decimal>,
    pub eligible_pct_tesserati: Option<u32>,
    pub eligible_pct_congiunti: Option<u32>,
    pub baseline_rate: Option<Decimal>,
    pub irpef_schedule: Option<String>,
    pub precomputed_irpef: Option<bool>,
    pub top: Option<usize>,
    pub strict: Option<bool>,
}

impl ScenarioOverrides {
    /// Keys set here win; the rest are taken from `fallback`.
    pub fn or(
        self,
        fallback: ScenarioOverrides,
    ) -> ScenarioOverrides {
        ScenarioOverrides {
            custom_rate: self.custom_rate.or(fallback.custom_rate),
            custom_schedule: self.custom_schedule.or(fallback.custom_schedule),
            attrition_pct: self.attrition_pct.or(fallback.attrition_pct),
            attrition_scope: self.attrition_scope.or(fallback.attrition_scope),
            rebate_tesserati: self.rebate_tesserati.or(fallback.rebate_tesserati),
            rebate_congiunti: self.rebate_congiunti.or(fallback.rebate_congiunti),
            eligible_pct_tesserati: self.eligible_pct_tesserati.or(fallback.eligible_pct_tesserati),
            eligible_pct_congiunti: self.eligible_pct_congiunti.or(fallback.eligible_pct_congiunti),
            baseline_rate: self.baseline_rate.or(fallback.baseline_rate),
            irpef_schedule: self.irpef_schedule.or(fallback.irpef_schedule),
            precomputed_irpef: self.precomputed_irpef.or(fallback.precomputed_irpef),
            top: self.top.or(fallback.top),
            strict: self.strict.or(fallback.strict),
        }
    }

    /// Fills the remaining gaps with the built-in defaults.
    pub fn into_settings(self) -> Settings {
        let defaults = ScenarioParams::default();
        let params = ScenarioParams {
            custom_rate: self.custom_rate.unwrap_or(defaults.custom_rate),
            attrition_pct: self.attrition_pct.unwrap_or(defaults.attrition_pct),
            rebate_tesserati: self.rebate_tesserati.unwrap_or(defaults.rebate_tesserati),
            rebate_congiunti: self.rebate_congiunti.unwrap_or(defaults.rebate_congiunti),
            eligible_pct_tesserati: self
                .eligible_pct_tesserati
                .unwrap_or(defaults.eligible_pct_tesserati),
            eligible_pct_congiunti: self
                .eligible_pct_congiunti
                .unwrap_or(defaults.eligible_pct_congiunti),
        };

        Settings {
            params,
            attrition_scope: self.attrition_scope.unwrap_or_default(),
            baseline_rate: self
                .baseline_rate
                .unwrap_or_else(|| Decimal::from(DEFAULT_BASELINE_RATE)),
            irpef_schedule: self
                .irpef_schedule
                .unwrap_or_else(|| FeeSchedule::IRPEF_2022.to_string()),
            custom_schedule: self.custom_schedule,
            precomputed_irpef: self.precomputed_irpef.unwrap_or(false),
            top_n: self.top.unwrap_or(DEFAULT_TOP_N),
            mode: if self.strict.unwrap_or(false) {
                RunMode::Strict
            } else {
                RunMode::Lenient
            },
        }
    }
}

/// A user-defined schedule from a `[[schedules]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleDef {
    pub name: String,
    pub tiers: Vec<TierDef>,
}

/// One tier; omit `up_to` for the final, unbounded tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierDef {
    #[serde(default)]
    pub up_to: Option<Decimal>,
    pub rate: Decimal,
}

impl ScheduleDef {
    pub fn to_schedule(&self) -> Result<FeeSchedule, FeeScheduleError> {
        let tiers = self
            .tiers
            .iter()
            .map(|t| FeeTier {
                upper_bound: t.up_to,
                rate: t.rate,
            })
            .collect();
        FeeSchedule::new(self.name.clone(), tiers)
    }
}

/// Contents of a scenario file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioFile {
    pub scenario: ScenarioOverrides,
    pub schedules: Vec<ScheduleDef>,
}

impl ScenarioFile {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file = Self::from_toml_str(&content)?;
        debug!(
            path = %path.display(),
            schedules = file.schedules.len(),
            "scenario file loaded"
        );
        Ok(file)
    }

    /// Presets plus every schedule defined in the file.
    ///
    /// A file schedule named like a preset replaces it.
    pub fn build_registry(&self) -> Result<ScheduleRegistry, ConfigError> {
        let mut registry = ScheduleRegistry::with_presets();
        for def in &self.schedules {
            let schedule = def.to_schedule()?;
            if registry.get(schedule.name()).is_ok() {
                warn!(schedule = %schedule.name(), "scenario file replaces a built-in schedule");
            }
            registry.register(schedule);
        }
        Ok(registry)
    }
}

/// Fully resolved settings of one report run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub params: ScenarioParams,
    pub attrition_scope: AttritionScope,
    pub baseline_rate: Decimal,
    pub irpef_schedule: String,
    pub custom_schedule: Option<String>,
    pub precomputed_irpef: bool,
    pub top_n: usize,
    pub mode: RunMode,
}

impl Default for Settings {
    fn default() -> Self {
        ScenarioOverrides::default().into_settings()
    }
}

impl Settings {
    /// Checks the report-only settings. Scenario parameters are checked by
    /// [`Settings::pipeline_config`].
    pub fn validate(&self) -> Result<(), InvalidParameterError> {
        tariff_core::params::ensure_non_negative("baseline_rate", self.baseline_rate)?;
        if self.top_n == 0 {
            return Err(InvalidParameterError {
                name: "top".to_string(),
                value: Decimal::ZERO,
                expected: "at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Builds the pipeline configuration, looking schedules up by name.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidParameter`] – a scenario parameter is outside
    ///   its domain.
    /// * [`ConfigError::UnknownSchedule`] – a schedule name is not registered.
    pub fn pipeline_config(
        &self,
        registry: &ScheduleRegistry,
    ) -> Result<PipelineConfig, ConfigError> {
        let irpef = registry.get(&self.irpef_schedule)?.clone();
        let mut config = PipelineConfig::from_params(&self.params, irpef)?
            .with_attrition_scope(self.attrition_scope)
            .with_mode(self.mode);

        if self.precomputed_irpef {
            config.irpef_policy = FeePolicy::Precomputed;
        }
        if let Some(name) = &self.custom_schedule {
            let schedule = registry.get(name)?.clone();
            config = config.with_custom_policy(FeePolicy::Tiered(schedule));
        }
        Ok(config)
    }
}
