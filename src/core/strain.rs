//! Strain catalog entries and the strain-indexed registry.

use derive_more::Display;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

use crate::core::people::People;
use crate::core::sim::Sim;
use crate::core::waning::DecaySpec;
use crate::errors::ImmunityError;
use crate::presets;
use crate::sample;

/// Opaque identifier of a registered strain. Identifiers are assigned in
/// registration order by [`StrainTable::register`]; the wild baseline is
/// always index 0.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("strain-{_0}")]
pub struct StrainId(pub(crate) usize);

impl StrainId {
    pub const WILD: StrainId = StrainId(0);

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Fully resolved strain parameter set. Immutable after resolution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StrainPars {
    /// Relative transmissibility.
    pub rel_beta: f64,
    /// Relative probability of developing symptoms.
    pub rel_symp_prob: f64,
    /// Relative probability of severe disease.
    pub rel_severe_prob: f64,
    /// Relative immunogenicity.
    pub rel_imm: f64,
    /// Nab waning kinetics conferred by this strain.
    pub nab_decay: DecaySpec,
}

/// Partial strain parameter set; missing fields fall back to the wild
/// strain defaults.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StrainParsOverride {
    #[serde(default)]
    pub rel_beta: Option<f64>,
    #[serde(default)]
    pub rel_symp_prob: Option<f64>,
    #[serde(default)]
    pub rel_severe_prob: Option<f64>,
    #[serde(default)]
    pub rel_imm: Option<f64>,
    #[serde(default)]
    pub nab_decay: Option<DecaySpec>,
}

impl StrainParsOverride {
    pub fn resolve(&self) -> StrainPars {
        let wild = &presets::STRAIN_PARS["wild"];
        StrainPars {
            rel_beta: self.rel_beta.unwrap_or(wild.rel_beta),
            rel_symp_prob: self.rel_symp_prob.unwrap_or(wild.rel_symp_prob),
            rel_severe_prob: self.rel_severe_prob.unwrap_or(wild.rel_severe_prob),
            rel_imm: self.rel_imm.unwrap_or(wild.rel_imm),
            nab_decay: self
                .nab_decay
                .clone()
                .unwrap_or_else(|| wild.nab_decay.clone()),
        }
    }
}

/// A strain specification: either a preset name or a parameter mapping.
#[derive(Clone, Debug, PartialEq)]
pub enum StrainSpec {
    Preset(String),
    Custom(StrainParsOverride),
}

impl Serialize for StrainSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            StrainSpec::Preset(name) => serializer.serialize_str(name),
            StrainSpec::Custom(pars) => pars.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for StrainSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        match value {
            serde_yaml::Value::String(name) => Ok(StrainSpec::Preset(name)),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)
                .map(StrainSpec::Custom)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(ImmunityError::InvalidSpec(format!(
                "could not understand strain specification {:?}; \
                 specify a predefined strain name or a parameter mapping",
                other
            )))),
        }
    }
}

/// Strip case and decoration from a strain name before preset lookup.
fn normalize_strain(name: &str) -> String {
    let mut name = name.to_lowercase();
    for token in [".", " ", "strain", "variant", "voc"] {
        name = name.replace(token, "");
    }
    name
}

/// A strain catalog entry: resolved parameters plus the import schedule.
#[derive(Clone, Debug, PartialEq)]
pub struct Strain {
    pub label: String,
    /// Days on which imports of this strain are introduced.
    pub days: SmallVec<[usize; 4]>,
    /// Number of imports per scheduled day, before rescaling.
    pub n_imports: usize,
    pub pars: StrainPars,
}

impl Strain {
    /// Resolve a strain specification into a catalog entry. Preset names
    /// are normalized before lookup; unknown names fail with the full list
    /// of valid choices.
    pub fn new(
        spec: &StrainSpec,
        label: Option<&str>,
        days: &[usize],
        n_imports: usize,
    ) -> Result<Self, ImmunityError> {
        let (pars, default_label) = match spec {
            StrainSpec::Preset(name) => {
                let normalized = normalize_strain(name);
                let key = presets::STRAIN_MAPPING
                    .get(normalized.as_str())
                    .ok_or_else(|| ImmunityError::UnknownPreset {
                        kind: "variant",
                        name: name.clone(),
                        choices: presets::strain_choices(),
                    })?;
                (presets::STRAIN_PARS[key].clone(), *key)
            }
            StrainSpec::Custom(pars) => (pars.resolve(), "custom"),
        };
        Ok(Self {
            label: label.unwrap_or(default_label).to_string(),
            days: SmallVec::from_slice(days),
            n_imports,
            pars,
        })
    }

    pub fn from_preset(name: &str, days: &[usize], n_imports: usize) -> Result<Self, ImmunityError> {
        Self::new(&StrainSpec::Preset(name.to_string()), None, days, n_imports)
    }

    /// Introduce this strain's scheduled imports on the simulation's
    /// current day: stochastically round the rescaled import count, sample
    /// that many agents uniformly from the susceptible pool without
    /// replacement, and infect them with this strain. Called once per
    /// simulated day by the intervention loop. Returns the infected agents.
    pub fn apply(&self, id: StrainId, sim: &Sim, people: &mut People) -> Vec<usize> {
        if !self.days.contains(&sim.t) {
            return Vec::new();
        }
        let mut rng = rand::rng();
        let n_imports =
            sample::stochastic_round(self.n_imports as f64 / sim.rescale_vec[sim.t], &mut rng);
        let susceptible = people.susceptible_inds();
        let importation_inds = sample::choose(&susceptible, n_imports, &mut rng);
        people.infect(&importation_inds, id, sim.t);
        log::info!(
            "Importing {} infections of {} on day {}.",
            importation_inds.len(),
            self.label,
            sim.t
        );
        importation_inds
    }
}

/// Registry of active strains. Index 0 is always the wild baseline.
/// Registration consumes the entry, so a strain is registered exactly once
/// and its index never changes afterwards.
#[derive(Clone, Debug)]
pub struct StrainTable {
    entries: Vec<Strain>,
}

impl StrainTable {
    pub fn new() -> Self {
        let wild = Strain {
            label: "wild".to_string(),
            days: SmallVec::new(),
            n_imports: 0,
            pars: presets::STRAIN_PARS["wild"].clone(),
        };
        Self {
            entries: vec![wild],
        }
    }

    /// Register a strain and assign it the next sequential index.
    pub fn register(&mut self, strain: Strain) -> StrainId {
        self.entries.push(strain);
        StrainId(self.entries.len() - 1)
    }

    pub fn get(&self, id: StrainId) -> &Strain {
        &self.entries[id.0]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = StrainId> + use<> {
        (0..self.entries.len()).map(StrainId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrainId, &Strain)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, strain)| (StrainId(index), strain))
    }
}

impl Default for StrainTable {
    fn default() -> Self {
        Self::new()
    }
}
