use std::collections::HashMap;

use thiserror::Error;

use crate::models::FeeSchedule;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown fee schedule '{name}'; available: {available:?}")]
    UnknownSchedule {
        name: String,
        available: Vec<String>,
    },
}

/// Named fee schedules an operator can pick from.
///
/// Typical lifetime:
/// 1. Create with `ScheduleRegistry::with_presets()`.
/// 2. Call `register` once per schedule defined in the scenario file.
/// 3. Call `get` to pick the schedule for a run.
#[derive(Debug, Clone)]
pub struct ScheduleRegistry {
    schedules: HashMap<String, FeeSchedule>,
}

impl ScheduleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            schedules: HashMap::new(),
        }
    }

    /// Registry holding the built-in presets.
    pub fn with_presets() -> Self {
        let mut registry = Self::new();
        registry.register(FeeSchedule::irpef_2022());
        registry.register(FeeSchedule::custom_tiers());
        registry
    }

    /// Register a schedule under its own name.
    ///
    /// A schedule with the same name is silently replaced.
    pub fn register(
        &mut self,
        schedule: FeeSchedule,
    ) {
        self.schedules.insert(schedule.name().to_string(), schedule);
    }

    /// Names of every registered schedule, sorted alphabetically.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<_> = self.schedules.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Look up a schedule by name.
    ///
    /// # Errors
    /// * [`RegistryError::UnknownSchedule`] if nothing is registered under `name`.
    pub fn get(
        &self,
        name: &str,
    ) -> Result<&FeeSchedule, RegistryError> {
        self.schedules
            .get(name)
            .ok_or_else(|| RegistryError::UnknownSchedule {
                name: name.to_string(),
                available: self.available(),
            })
    }
}

impl Default for ScheduleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
