use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tariff_data::{load_percentages, synthesize_population, write_population_csv};

/// Synthesize a client population from published bracket percentages.
///
/// The input CSV must have the columns:
/// - Classe: the income bracket label (e.g. `da 10.000 a 15.000`)
/// - Percentuale: the bracket's share of taxpayers, 0 to 100
///
/// Rows with missing values and the `TOTALE` summary row are dropped.
#[derive(Parser, Debug)]
#[command(name = "tariff-synthesize")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the Classe,Percentuale CSV
    #[arg(short, long)]
    input: PathBuf,

    /// Number of clients to distribute across the brackets
    #[arg(short, long, default_value_t = 6000)]
    total: u64,

    /// Output CSV (Classe,Numero_Clienti); stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();

    let rows = load_percentages(&args.input)
        .with_context(|| format!("Failed to read percentages: {}", args.input.display()))?;

    let synthesis = synthesize_population(&rows, args.total)
        .with_context(|| format!("Failed to synthesize from: {}", args.input.display()))?;

    let synthesized: u64 = synthesis.records.iter().map(|r| r.client_count).sum();
    info!(
        brackets = synthesis.records.len(),
        dropped = synthesis.dropped.len(),
        requested = args.total,
        synthesized,
        "population synthesized"
    );

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create: {}", path.display()))?;
            write_population_csv(BufWriter::new(file), &synthesis.records)
                .with_context(|| format!("Failed to write: {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_population_csv(&mut handle, &synthesis.records)
                .context("Failed to write population to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}
