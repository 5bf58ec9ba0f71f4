//! Random sampling primitives shared across the immunity model.

use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use serde::{Deserialize, Serialize};
use std::cmp::min;

/// A named distribution with shape/scale parameters, as it appears in
/// configuration files (e.g. `dist: normal, par1: 0, par2: 2`).
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(tag = "dist", rename_all = "snake_case")]
pub enum SampleDist {
    Normal { par1: f64, par2: f64 },
    Lognormal { par1: f64, par2: f64 },
    Uniform { par1: f64, par2: f64 },
}

impl SampleDist {
    pub fn draw(&self, rng: &mut impl Rng) -> f64 {
        match self {
            SampleDist::Normal { par1, par2 } => Normal::new(*par1, *par2).unwrap().sample(rng),
            SampleDist::Lognormal { par1, par2 } => {
                LogNormal::new(*par1, *par2).unwrap().sample(rng)
            }
            SampleDist::Uniform { par1, par2 } => rng.random_range(*par1..*par2),
        }
    }
}

/// Round a non-negative value stochastically to the nearest integer, such
/// that the expectation matches the input.
pub fn stochastic_round(value: f64, rng: &mut impl Rng) -> usize {
    if value <= 0. {
        return 0;
    }
    let floor = value.floor();
    floor as usize + rng.random_bool(value - floor) as usize
}

/// Choose `amount` entries from `pool` uniformly without replacement.
/// Returns the whole pool when it has fewer than `amount` entries.
pub fn choose(pool: &[usize], amount: usize, rng: &mut impl Rng) -> Vec<usize> {
    let amount = min(amount, pool.len());
    rand::seq::index::sample(rng, pool.len(), amount)
        .into_iter()
        .map(|idx| pool[idx])
        .collect()
}
