pub mod calculations;
pub mod label;
pub mod models;
pub mod params;
pub mod registry;

pub use label::{BracketBound, LabelParseError, parse_bracket_label};
pub use models::*;
pub use params::{InvalidParameterError, ScenarioParams};
pub use registry::{RegistryError, ScheduleRegistry};
