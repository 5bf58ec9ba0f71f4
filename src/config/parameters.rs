use serde::{Deserialize, Serialize};
use std::fs;

use crate::core::efficacy::NabEffPars;
use crate::core::waning::RawDecaySpec;
use crate::sample::SampleDist;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Parameters {
    /// The number of agents in the population.
    #[serde(default = "default_n_agents")]
    pub n_agents: usize,

    /// The number of simulated days.
    #[serde(default = "default_n_days")]
    pub n_days: usize,

    /// Whether immunity is tracked and waned at all. When disabled, the
    /// immunity updates become no-ops.
    #[serde(default = "default_use_waning")]
    pub use_waning: bool,

    /// The distribution of the log2 peak nab drawn at recovery from a
    /// natural infection.
    #[serde(default = "default_nab_init")]
    pub nab_init: SampleDist,

    /// The multiplier applied to the existing peak nab when a natural
    /// infection follows an earlier immunity-conferring event.
    #[serde(default = "default_nab_boost")]
    pub nab_boost: f64,

    /// The parameters of the nab-to-efficacy transform for infection-derived
    /// nabs.
    #[serde(default)]
    pub nab_eff: NabEffPars,

    /// The default pairwise cross-immunity between strains without a preset
    /// entry.
    #[serde(default = "default_cross_immunity")]
    pub cross_immunity: f64,

    /// An optional simulation-level override of the nab waning kinetics.
    /// When absent, the baseline strain's kinetics apply.
    #[serde(default)]
    pub nab_decay: Option<RawDecaySpec>,

    /// The baseline probability that an infection is symptomatic, before
    /// per-strain scaling.
    #[serde(default = "default_symp_prob")]
    pub symp_prob: f64,

    /// The duration of an infection in days, from infection to recovery.
    #[serde(default = "default_dur_infection")]
    pub dur_infection: usize,
}

fn default_n_agents() -> usize {
    20_000
}

fn default_n_days() -> usize {
    180
}

fn default_use_waning() -> bool {
    true
}

fn default_nab_init() -> SampleDist {
    SampleDist::Normal { par1: 0., par2: 2. }
}

fn default_nab_boost() -> f64 {
    1.5
}

fn default_cross_immunity() -> f64 {
    0.5
}

fn default_symp_prob() -> f64 {
    0.66
}

fn default_dur_infection() -> usize {
    14
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            n_agents: default_n_agents(),
            n_days: default_n_days(),
            use_waning: default_use_waning(),
            nab_init: default_nab_init(),
            nab_boost: default_nab_boost(),
            nab_eff: NabEffPars::default(),
            cross_immunity: default_cross_immunity(),
            nab_decay: None,
            symp_prob: default_symp_prob(),
            dur_infection: default_dur_infection(),
        }
    }
}

#[derive(Debug)]
pub enum ParametersError {
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
}

impl std::error::Error for ParametersError {}

impl std::fmt::Display for ParametersError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParametersError::IoError(error) => write!(formatter, "IO error: {}", error),
            ParametersError::YamlError(error) => write!(formatter, "YAML error: {}", error),
        }
    }
}

impl std::fmt::Display for Parameters {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut output = vec![];
        self.write(&mut output).map_err(|_| std::fmt::Error)?;
        write!(formatter, "{}", String::from_utf8(output).unwrap())
    }
}

impl Parameters {
    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<(), ParametersError> {
        serde_yaml::to_writer(writer, self).map_err(ParametersError::YamlError)
    }

    pub fn read(reader: &mut dyn std::io::Read) -> Result<Parameters, ParametersError> {
        serde_yaml::from_reader(reader).map_err(ParametersError::YamlError)
    }

    pub fn write_to_file(&self, filename: &str) -> Result<(), ParametersError> {
        let file = fs::File::create(filename).map_err(ParametersError::IoError)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write(&mut writer)
    }

    pub fn read_from_file(filename: &str) -> Result<Parameters, ParametersError> {
        let file = fs::File::open(filename).map_err(ParametersError::IoError)?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader)
    }
}
