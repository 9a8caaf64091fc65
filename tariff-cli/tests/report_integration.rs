//! End-to-end runs of the report against the on-disk fixtures.

use std::path::{Path, PathBuf};

use clap::Parser;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use tariff_cli::app::{evaluate, load_scenario, run};
use tariff_cli::{Cli, Settings};
use tariff_core::ScheduleRegistry;
use tariff_data::PopulationLoader;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cli(extra: &[&str]) -> Cli {
    let input = fixture_path("fatturato.csv");
    let mut args = vec!["tariff-report", "--input", input.to_str().unwrap()];
    args.extend_from_slice(extra);
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_default_scenario_totals() {
    let records = PopulationLoader::load_from_file(&fixture_path("fatturato.csv")).unwrap();

    let evaluation =
        evaluate(&Settings::default(), &ScheduleRegistry::with_presets(), &records).unwrap();

    let totals = evaluation.report.totals;
    assert_eq!(totals.population, 5970);
    assert_eq!(totals.gross_irpef, dec!(178800));
    assert_eq!(totals.gross_custom, dec!(208950));
    assert_eq!(totals.total_rebate, dec!(6261));
    assert_eq!(evaluation.output.net_totals(), (dec!(172539), dec!(202689)));
    assert_eq!(evaluation.report.baseline, dec!(179100));
    assert_eq!(evaluation.report.top.len(), 10);
}

#[test]
fn test_scenario_file_applies_under_flags() {
    let file = load_scenario(Some(fixture_path("scenario.toml").as_path())).unwrap();
    let registry = file.build_registry().unwrap();
    let records = PopulationLoader::load_from_file(&fixture_path("fatturato.csv")).unwrap();
    let settings = cli(&["--top", "2"]).overrides().or(file.scenario).into_settings();

    let evaluation = evaluate(&settings, &registry, &records).unwrap();
    let totals = evaluation.report.totals;

    assert_eq!(totals.gross_custom, dec!(168800));
    // 168800 * 0.8 = 135040, less 6261 of rebates
    assert_eq!(totals.net_custom, dec!(128779));
    assert_eq!(totals.adjusted_irpef, totals.gross_irpef);
    let counts: Vec<_> = evaluation.report.top.iter().map(|s| s.client_count).collect();
    assert_eq!(counts, vec![1500, 1000]);
}

#[test]
fn test_file_schedule_selected_by_flag() {
    let file = load_scenario(Some(fixture_path("scenario.toml").as_path())).unwrap();
    let registry = file.build_registry().unwrap();
    let records = PopulationLoader::load_from_file(&fixture_path("fatturato.csv")).unwrap();
    let settings = cli(&["--irpef-schedule", "uniform-30"])
        .overrides()
        .or(file.scenario)
        .into_settings();

    let evaluation = evaluate(&settings, &registry, &records).unwrap();

    assert_eq!(evaluation.report.totals.gross_irpef, evaluation.report.baseline);
}

#[test]
fn test_run_writes_revenue_csv() {
    let output = std::env::temp_dir().join(format!("tariff-report-{}.csv", std::process::id()));
    let config = fixture_path("scenario.toml");

    run(&cli(&[
        "--config",
        config.to_str().unwrap(),
        "--output",
        output.to_str().unwrap(),
    ]))
    .unwrap();

    let csv = std::fs::read_to_string(&output).unwrap();
    std::fs::remove_file(&output).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().contains("Clienti_Tesserati,Clienti_Congiunti"));
    assert_eq!(lines.count(), 10);
}

#[test]
fn test_run_strict_fails_on_fixture() {
    let err = run(&cli(&["--strict"])).unwrap_err();

    assert!(format!("{err:#}").contains("zero o minore di zero"), "{err:#}");
}
