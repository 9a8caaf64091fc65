pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod report;

pub use cli::Cli;
pub use config::{ConfigError, ScenarioFile, ScenarioOverrides, Settings};
pub use report::Report;
