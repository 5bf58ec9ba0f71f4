//! Conversion of nab levels into protection factors.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::ImmunityError;

/// Protection axis: efficacy against infection (`sus`), symptomatic
/// disease (`symp`) or severe disease (`sev`).
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[display("sus")]
    Sus,
    #[display("symp")]
    Symp,
    #[display("sev")]
    Sev,
}

impl FromStr for Axis {
    type Err = ImmunityError;

    fn from_str(axis: &str) -> Result<Self, Self::Err> {
        match axis {
            "sus" => Ok(Axis::Sus),
            "symp" => Ok(Axis::Symp),
            "sev" => Ok(Axis::Sev),
            other => Err(ImmunityError::InvalidAxis(other.to_string())),
        }
    }
}

/// Parameters of the logistic nab-to-efficacy transform on the
/// susceptibility axis.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LogisticPars {
    pub slope: f64,
    pub n_50: f64,
}

/// Efficacy-mapping parameters per protection axis. The progression axes
/// carry constant efficacy ceilings; only the susceptibility axis depends
/// on the nab magnitude.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct NabEffPars {
    pub sus: LogisticPars,
    pub symp: f64,
    pub sev: f64,
}

impl Default for NabEffPars {
    fn default() -> Self {
        DEFAULT_NAB_EFF
    }
}

pub const DEFAULT_NAB_EFF: NabEffPars = NabEffPars {
    sus: LogisticPars {
        slope: 2.5,
        n_50: 0.55,
    },
    symp: 0.1,
    sev: 0.52,
};

/// Convert nab levels into protection factors in `[0, 1]` on one axis.
///
/// The susceptibility axis applies a logistic transform in log10 nab space;
/// zero (or negative) nab saturates to zero efficacy, since the logistic
/// expression is undefined there. The progression axes broadcast their
/// constant ceiling to the input length.
pub fn nab_to_efficacy(nabs: &[f64], axis: Axis, pars: &NabEffPars) -> Vec<f64> {
    match axis {
        Axis::Sus => nabs
            .iter()
            .map(|&nab| {
                if nab <= 0. {
                    return 0.;
                }
                let exponent = -pars.sus.slope * (nab.log10() - pars.sus.n_50.log10());
                1. / (1. + exponent.exp())
            })
            .collect(),
        Axis::Symp => vec![pars.symp; nabs.len()],
        Axis::Sev => vec![pars.sev; nabs.len()],
    }
}
