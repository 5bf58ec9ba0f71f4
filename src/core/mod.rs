//! Core immunity model.
//!
//! The model is split into leaf components that are combined by the
//! immunity updater:
//!
//! 1. `waning`: closed-form nab decay functions and the precomputed
//!    kinetics table.
//! 2. `efficacy`: conversion of nab levels to protection factors.
//! 3. `strain` / `vaccine`: catalog entries resolved from presets or
//!    custom parameter sets.
//! 4. `immunity`: the cross-immunity matrix and the per-timestep update of
//!    each agent's nab level and protection values.
//! 5. `people` / `sim`: the agent-state store and the simulation-level
//!    context those updates operate on.

pub mod efficacy;
pub mod immunity;
pub mod people;
pub mod sim;
pub mod strain;
pub mod vaccine;
pub mod waning;

pub use efficacy::{Axis, LogisticPars, NabEffPars, nab_to_efficacy};
pub use immunity::{Immunity, check_immunity, check_nab, init_immunity, init_nab};
pub use people::People;
pub use sim::Sim;
pub use strain::{Strain, StrainId, StrainPars, StrainParsOverride, StrainSpec, StrainTable};
pub use vaccine::{Vaccine, VaccinePars, VaccineParsOverride, VaccineSpec};
pub use waning::{DecaySpec, NabKinetics, RawDecaySpec};
