pub mod export;
pub mod loader;
pub mod synthesis;

pub use export::{ExportError, write_population_csv, write_revenue_csv};
pub use loader::{PopulationLoadError, PopulationLoader};
pub use synthesis::{
    PercentageRow, Synthesis, SynthesisError, load_percentages, parse_percentages,
    synthesize_population,
};
