//! Settings module.

use super::parameters::Parameters;
use crate::core::strain::StrainSpec;
use crate::core::vaccine::VaccineSpec;

use serde::{Deserialize, Serialize};
use std::fs;

/// A strain to introduce into the simulation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StrainEntry {
    /// Preset name or custom parameter mapping.
    pub strain: StrainSpec,
    /// Display label; defaults to the preset name or `custom`.
    #[serde(default)]
    pub label: Option<String>,
    /// Days on which imports are introduced.
    #[serde(default)]
    pub days: Vec<usize>,
    /// Imports per scheduled day, before rescaling.
    #[serde(default = "default_n_imports")]
    pub n_imports: usize,
}

fn default_n_imports() -> usize {
    1
}

/// A vaccination campaign.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VaccineEntry {
    /// Preset name or custom parameter mapping.
    pub vaccine: VaccineSpec,
    /// Display label; defaults to the preset name or `custom`.
    #[serde(default)]
    pub label: Option<String>,
    /// Days on which first doses are offered.
    #[serde(default)]
    pub days: Vec<usize>,
    /// Per-agent probability of accepting a first dose on a campaign day.
    #[serde(default = "default_prob")]
    pub prob: f64,
}

fn default_prob() -> f64 {
    1.
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Settings {
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub strains: Vec<StrainEntry>,
    #[serde(default)]
    pub vaccines: Vec<VaccineEntry>,
}

#[derive(Debug)]
pub enum SettingsError {
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
}

impl std::error::Error for SettingsError {}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::IoError(error) => write!(formatter, "IO error: {}", error),
            SettingsError::YamlError(error) => write!(formatter, "YAML error: {}", error),
        }
    }
}

impl std::fmt::Display for Settings {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut output = vec![];
        self.write(&mut output).map_err(|_| std::fmt::Error)?;
        write!(formatter, "{}", String::from_utf8(output).unwrap())
    }
}

impl Settings {
    pub fn write(&self, writer: &mut dyn std::io::Write) -> Result<(), SettingsError> {
        serde_yaml::to_writer(writer, self).map_err(SettingsError::YamlError)
    }

    pub fn read(reader: &mut dyn std::io::Read) -> Result<Settings, SettingsError> {
        serde_yaml::from_reader(reader).map_err(SettingsError::YamlError)
    }

    pub fn write_to_file(&self, filename: &str) -> Result<(), SettingsError> {
        let file = fs::File::create(filename).map_err(SettingsError::IoError)?;
        let mut writer = std::io::BufWriter::new(file);
        self.write(&mut writer)
    }

    pub fn read_from_file(filename: &str) -> Result<Settings, SettingsError> {
        let file = fs::File::open(filename).map_err(SettingsError::IoError)?;
        let mut reader = std::io::BufReader::new(file);
        Self::read(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strain::StrainParsOverride;
    use serial_test::serial;

    #[test]
    fn read_write() {
        let settings = Settings {
            parameters: Parameters {
                n_agents: 1000,
                n_days: 120,
                ..Default::default()
            },
            strains: vec![
                StrainEntry {
                    strain: StrainSpec::Preset("b117".to_string()),
                    label: None,
                    days: vec![10],
                    n_imports: 20,
                },
                StrainEntry {
                    strain: StrainSpec::Custom(StrainParsOverride {
                        rel_beta: Some(2.),
                        ..Default::default()
                    }),
                    label: Some("homebrew".to_string()),
                    days: vec![40, 41],
                    n_imports: 5,
                },
            ],
            vaccines: vec![VaccineEntry {
                vaccine: VaccineSpec::Preset("pfizer".to_string()),
                label: None,
                days: vec![30],
                prob: 0.6,
            }],
        };
        let mut output = vec![];
        settings.write(&mut output).unwrap();
        let settings2 = Settings::read(&mut &output[..]).unwrap();
        assert_eq!(settings, settings2);
    }

    #[test]
    fn reads_a_plain_yaml_document() {
        let yaml = "
parameters:
  n_days: 60
strains:
  - strain: b1351
    days: [5]
    n_imports: 10
vaccines:
  - vaccine: moderna
    days: [0]
";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.parameters.n_days, 60);
        assert_eq!(
            settings.strains[0].strain,
            StrainSpec::Preset("b1351".to_string())
        );
        assert_eq!(settings.strains[0].n_imports, 10);
        assert_eq!(settings.vaccines[0].prob, 1.);
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let settings: Settings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    #[serial]
    fn read_write_file() {
        let tmp_dir = std::env::temp_dir().join("test_settings.yaml");
        let path = tmp_dir.to_str().unwrap();
        let settings = Settings::default();
        settings.write_to_file(path).unwrap();
        let read_settings = Settings::read_from_file(path).unwrap();
        assert_eq!(read_settings, settings);
        std::fs::remove_file(path).unwrap();
    }
}
