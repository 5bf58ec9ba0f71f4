//! Closed-form nab waning kinetics.
//!
//! A decay specification resolves into one of four functional forms, which
//! is then evaluated once over the full simulation horizon into a
//! [`NabKinetics`] lookup table.

use serde::{Deserialize, Serialize};

use crate::errors::ImmunityError;

/// Valid decay form tags, in the order they are dispatched.
pub const FORM_CHOICES: [&str; 4] = ["nab_decay", "exp_decay", "linear_growth", "linear_decay"];

/// A resolved decay form. Construction from configuration goes through
/// [`RawDecaySpec::resolve`], so an invalid form tag fails before the
/// simulation starts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "form", rename_all = "snake_case")]
pub enum DecaySpec {
    /// Piecewise decay: simple exponential with `decay_rate1` up to day
    /// `decay_time1`; beyond that, the decay rate itself decays
    /// exponentially with `decay_rate2`. Captures an initially fast
    /// antibody decline that slows over time.
    NabDecay {
        decay_rate1: f64,
        decay_time1: f64,
        decay_rate2: f64,
    },
    /// Exponential decay from `init_val` with the given half life
    /// (no decay when the half life is undefined), optionally preceded by a
    /// linear growth ramp of `delay` days.
    ExpDecay {
        init_val: f64,
        half_life: Option<f64>,
        #[serde(default)]
        delay: Option<usize>,
    },
    /// Linear growth `slope * t`.
    LinearGrowth { slope: f64 },
    /// Linear decay `init_val - slope * t`, floored at zero.
    LinearDecay { init_val: f64, slope: f64 },
}

/// Default piecewise decay: 90-day initial half life, slowing after day 250.
pub const DEFAULT_NAB_DECAY: DecaySpec = DecaySpec::NabDecay {
    decay_rate1: 0.007701635339554948, // ln(2) / 90
    decay_time1: 250.,
    decay_rate2: 0.001,
};

/// A decay specification as it appears in configuration files: a form tag
/// with a flat set of parameters. Missing parameters fall back to the
/// defaults of the selected form.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RawDecaySpec {
    /// Functional form tag; `nab_decay` if absent.
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub decay_rate1: Option<f64>,
    #[serde(default)]
    pub decay_time1: Option<f64>,
    #[serde(default)]
    pub decay_rate2: Option<f64>,
    #[serde(default)]
    pub init_val: Option<f64>,
    #[serde(default)]
    pub half_life: Option<f64>,
    #[serde(default)]
    pub delay: Option<usize>,
    #[serde(default)]
    pub slope: Option<f64>,
}

impl RawDecaySpec {
    /// Resolve the form tag into a [`DecaySpec`].
    pub fn resolve(&self) -> Result<DecaySpec, ImmunityError> {
        match self.form.as_deref().unwrap_or("nab_decay") {
            "nab_decay" => Ok(DecaySpec::NabDecay {
                decay_rate1: self.decay_rate1.unwrap_or(0.007701635339554948),
                decay_time1: self.decay_time1.unwrap_or(250.),
                decay_rate2: self.decay_rate2.unwrap_or(0.001),
            }),
            "exp_decay" => Ok(DecaySpec::ExpDecay {
                init_val: self.init_val.unwrap_or(1.),
                half_life: self.half_life,
                delay: self.delay,
            }),
            "linear_growth" => Ok(DecaySpec::LinearGrowth {
                slope: self.slope.unwrap_or(1.),
            }),
            "linear_decay" => Ok(DecaySpec::LinearDecay {
                init_val: self.init_val.unwrap_or(1.),
                slope: self.slope.unwrap_or(1.),
            }),
            other => Err(ImmunityError::UnknownDecayForm(other.to_string())),
        }
    }
}

/// Precomputed decay multipliers, one entry per simulated day, indexed by
/// days since the most recent immunity-conferring event.
#[derive(Clone, Debug, PartialEq)]
pub struct NabKinetics {
    values: Vec<f64>,
}

impl NabKinetics {
    /// Evaluate `spec` at every day in `0..length`. Computed once per
    /// simulation setup and treated as read-only for the rest of the run.
    pub fn precompute(length: usize, spec: &DecaySpec) -> Self {
        let values = match spec {
            DecaySpec::NabDecay {
                decay_rate1,
                decay_time1,
                decay_rate2,
            } => nab_decay(length, *decay_rate1, *decay_time1, *decay_rate2),
            DecaySpec::ExpDecay {
                init_val,
                half_life,
                delay,
            } => exp_decay(length, *init_val, *half_life, *delay),
            DecaySpec::LinearGrowth { slope } => linear_growth(length, *slope),
            DecaySpec::LinearDecay { init_val, slope } => linear_decay(length, *init_val, *slope),
        };
        Self { values }
    }

    /// Multiplier for `days` since the most recent immunity-conferring
    /// event. `days` beyond the construction horizon violates the caller
    /// contract; the simulation length must be bounded by the horizon the
    /// table was built for.
    pub fn get(&self, days: usize) -> f64 {
        self.values[days]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Exponential decay whose rate itself decays exponentially after
/// `decay_time1`.
fn nab_decay(length: usize, decay_rate1: f64, decay_time1: f64, decay_rate2: f64) -> Vec<f64> {
    (0..length)
        .map(|day| {
            let t = day as f64;
            if t <= decay_time1 {
                (-t * decay_rate1).exp()
            } else {
                (-t * (decay_rate1 * (-(t - decay_time1) * decay_rate2).exp())).exp()
            }
        })
        .collect()
}

/// Exponential decay from `init_val`, with an optional linear growth ramp
/// of `delay` days reaching `init_val` at its end. An undefined half life
/// means no decay.
fn exp_decay(length: usize, init_val: f64, half_life: Option<f64>, delay: Option<usize>) -> Vec<f64> {
    let decay_rate = match half_life {
        Some(half_life) if half_life.is_finite() => std::f64::consts::LN_2 / half_life,
        _ => 0.,
    };
    match delay {
        Some(delay) if delay > 0 => {
            let mut values = linear_growth(delay.min(length), init_val / delay as f64);
            values.extend(
                (0..length.saturating_sub(delay)).map(|t| init_val * (-decay_rate * t as f64).exp()),
            );
            values
        }
        _ => (0..length)
            .map(|t| init_val * (-decay_rate * t as f64).exp())
            .collect(),
    }
}

fn linear_growth(length: usize, slope: f64) -> Vec<f64> {
    (0..length).map(|t| slope * t as f64).collect()
}

fn linear_decay(length: usize, init_val: f64, slope: f64) -> Vec<f64> {
    (0..length)
        .map(|t| (init_val - slope * t as f64).max(0.))
        .collect()
}
