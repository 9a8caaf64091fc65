//! Integration tests that read the on-disk fixtures, run the pipeline and
//! write the results back out.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tariff_core::calculations::{FeePolicy, PipelineConfig, RevenuePipeline};
use tariff_core::{FeeSchedule, ScenarioParams};
use tariff_data::{
    PopulationLoader, load_percentages, synthesize_population, write_population_csv,
    write_revenue_csv,
};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn default_pipeline() -> RevenuePipeline {
    let config = PipelineConfig::from_params(&ScenarioParams::default(), FeeSchedule::irpef_2022())
        .expect("defaults are valid");
    RevenuePipeline::new(config).expect("defaults are valid")
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_load_fixture_file_succeeds() {
    let records = PopulationLoader::load_from_file(&fixture_path("fatturato.csv"))
        .expect("fixture file should load without error");

    assert_eq!(records.len(), 11);
    assert_eq!(records.iter().map(|r| r.client_count).sum::<u64>(), 6000);
    assert_eq!(records[0].irpef_rate, None);
    assert_eq!(records[1].irpef_rate, Some(dec!(25)));
}

#[test]
fn test_fixture_runs_through_pipeline() {
    let records = PopulationLoader::load_from_file(&fixture_path("fatturato.csv")).unwrap();

    let output = default_pipeline().run(&records).expect("lenient run");

    assert_eq!(output.skipped.len(), 1);
    assert_eq!(output.skipped[0].label, "zero o minore di zero");
    assert_eq!(output.resolved_population(), 5970);
    assert_eq!(output.net_totals(), (dec!(172539), dec!(202689)));
}

#[test]
fn test_precomputed_rates_match_schedule_lookup() {
    let records = PopulationLoader::load_from_file(&fixture_path("fatturato.csv")).unwrap();
    let tiered = default_pipeline().run(&records).unwrap();

    let mut config = default_pipeline().config().clone();
    config.irpef_policy = FeePolicy::Precomputed;
    let precomputed = RevenuePipeline::new(config).unwrap().run(&records).unwrap();

    assert_eq!(precomputed.rows, tiered.rows);
    assert_eq!(precomputed.skipped.len(), 1);
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn test_export_twice_is_byte_identical() {
    let records = PopulationLoader::load_from_file(&fixture_path("fatturato.csv")).unwrap();
    let pipeline = default_pipeline();
    let programs = pipeline.config().discount_programs.clone();

    let mut first = Vec::new();
    let mut second = Vec::new();
    write_revenue_csv(&mut first, &pipeline.run(&records).unwrap().rows, &programs).unwrap();
    write_revenue_csv(&mut second, &pipeline.run(&records).unwrap().rows, &programs).unwrap();

    assert_eq!(first, second);
    // header + 10 priced rows
    assert_eq!(String::from_utf8(first).unwrap().lines().count(), 11);
}

// =============================================================================
// Synthesis
// =============================================================================

#[test]
fn test_synthesized_population_matches_fixture_counts() {
    let rows = load_percentages(&fixture_path("percentuali.csv")).expect("fixture parses");

    let synthesis = synthesize_population(&rows, 6000).expect("valid percentages");
    let loaded = PopulationLoader::load_from_file(&fixture_path("fatturato.csv")).unwrap();

    let synthesized: Vec<_> = synthesis
        .records
        .iter()
        .map(|r| (r.label.as_str(), r.client_count))
        .collect();
    let expected: Vec<_> = loaded
        .iter()
        .map(|r| (r.label.as_str(), r.client_count))
        .collect();
    assert_eq!(synthesized, expected);
    assert_eq!(
        synthesis.dropped,
        vec!["non classificati".to_string(), "TOTALE".to_string()]
    );
}

#[test]
fn test_synthesized_population_reloads() {
    let rows = load_percentages(&fixture_path("percentuali.csv")).unwrap();
    let synthesis = synthesize_population(&rows, 6000).unwrap();

    let mut buf = Vec::new();
    write_population_csv(&mut buf, &synthesis.records).unwrap();
    let reloaded = PopulationLoader::parse(buf.as_slice()).expect("written table reloads");

    assert_eq!(reloaded, synthesis.records);
}
