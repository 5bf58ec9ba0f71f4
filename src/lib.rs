//! Agent-based modelling of acquired immunity.
//!
//! The crate models how a neutralizing-antibody (nab) level is assigned to
//! an individual after infection or vaccination, how it wanes over time,
//! how it converts into protection against infection, symptomatic and
//! severe disease, and how protection carries over between pathogen strains
//! through an asymmetric cross-immunity matrix.

pub mod args;
pub mod config;
pub mod core;
pub mod errors;
pub mod presets;
pub mod runner;
pub mod sample;
pub mod stats;
