use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use tariff_core::calculations::{PipelineConfig, PipelineOutput, RevenuePipeline};
use tariff_core::{BracketRecord, ScheduleRegistry};
use tariff_data::{PopulationLoader, write_revenue_csv};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::config::{ScenarioFile, Settings};
use crate::report::Report;

/// Result of one evaluated scenario.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub config: PipelineConfig,
    pub output: PipelineOutput,
    pub report: Report,
}

/// Reads the scenario file, or an empty one when none was given.
pub fn load_scenario(path: Option<&Path>) -> Result<ScenarioFile> {
    match path {
        Some(path) => ScenarioFile::load(path)
            .with_context(|| format!("Failed to load scenario file: {}", path.display())),
        None => Ok(ScenarioFile::default()),
    }
}

/// Runs the pipeline over `records` with `settings` and builds the report.
pub fn evaluate(
    settings: &Settings,
    registry: &ScheduleRegistry,
    records: &[BracketRecord],
) -> Result<Evaluation> {
    settings.validate().context("Invalid report settings")?;
    let config = settings
        .pipeline_config(registry)
        .context("Invalid scenario")?;

    debug!(
        irpef = %config.irpef_policy,
        custom = %config.custom_policy,
        attrition = %config.attrition_pct,
        scope = %config.attrition_scope,
        "scenario resolved"
    );

    let output = RevenuePipeline::new(config.clone())?
        .run(records)
        .context("Revenue pipeline failed")?;
    let report = Report::build(&output, &config, settings.baseline_rate, settings.top_n)?;

    Ok(Evaluation {
        config,
        output,
        report,
    })
}

/// Writes the derived revenue table as CSV.
pub fn export(
    evaluation: &Evaluation,
    path: &Path,
) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create: {}", path.display()))?;
    write_revenue_csv(
        BufWriter::new(file),
        &evaluation.output.rows,
        &evaluation.config.discount_programs,
    )
    .with_context(|| format!("Failed to write revenue table: {}", path.display()))
}

/// Entry point of `tariff-report`.
pub fn run(cli: &Cli) -> Result<()> {
    let file = load_scenario(cli.config.as_deref())?;
    let registry = file
        .build_registry()
        .context("Invalid schedule in scenario file")?;
    debug!(schedules = ?registry.available(), "schedule registry built");

    let settings = cli.overrides().or(file.scenario).into_settings();

    let records = PopulationLoader::load_from_file(&cli.input)
        .with_context(|| format!("Failed to load population: {}", cli.input.display()))?;
    info!(
        brackets = records.len(),
        path = %cli.input.display(),
        "population loaded"
    );

    let evaluation = evaluate(&settings, &registry, &records)?;
    let (net_irpef, net_custom) = evaluation.output.net_totals();
    info!(
        priced = evaluation.output.rows.len(),
        skipped = evaluation.output.skipped.len(),
        %net_irpef,
        %net_custom,
        "revenue derived"
    );

    print!("{}", evaluation.report);

    if let Some(path) = &cli.output {
        export(&evaluation, path)?;
        info!(path = %path.display(), "revenue table written");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tariff_core::calculations::{PipelineError, RunMode};

    use super::*;

    fn records() -> Vec<BracketRecord> {
        vec![
            BracketRecord::new("zero o minore di zero", 30),
            BracketRecord::new("da 0 a 10.000", 1500),
            BracketRecord::new("oltre 120.000", 50),
        ]
    }

    #[test]
    fn test_evaluate_lenient_reports_skipped() {
        let evaluation = evaluate(
            &Settings::default(),
            &ScheduleRegistry::with_presets(),
            &records(),
        )
        .unwrap();

        assert_eq!(evaluation.output.rows.len(), 2);
        assert_eq!(evaluation.report.skipped[0].label, "zero o minore di zero");
        assert_eq!(evaluation.report.baseline, dec!(46500));
    }

    #[test]
    fn test_evaluate_strict_fails_on_unmapped_bracket() {
        let settings = Settings {
            mode: RunMode::Strict,
            ..Default::default()
        };

        let err = evaluate(&settings, &ScheduleRegistry::with_presets(), &records()).unwrap_err();

        assert!(
            matches!(
                err.downcast_ref::<PipelineError>(),
                Some(PipelineError::UnmappedBracket(_))
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn test_evaluate_empty_table_is_empty_population() {
        let err = evaluate(&Settings::default(), &ScheduleRegistry::with_presets(), &[]).unwrap_err();

        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::EmptyPopulation)
        );
    }

    #[test]
    fn test_load_scenario_without_path_is_default() {
        assert_eq!(load_scenario(None).unwrap(), ScenarioFile::default());
    }
}
