//! Configuration data structures for simulation setups.

mod parameters;
mod settings;

pub use parameters::{Parameters, ParametersError};
pub use settings::{Settings, SettingsError, StrainEntry, VaccineEntry};
