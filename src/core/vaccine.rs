//! Vaccine catalog entries.
//!
//! A vaccine resolves from either a preset name or a custom parameter
//! mapping. Presets merge two catalogs: dosing/nab-initialization
//! parameters and per-strain relative immunogenicity. Unlike strains,
//! vaccines have no registration side effect; the simulation context only
//! stores them so that agents' `vaccine_source` indices can be resolved.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::efficacy::NabEffPars;
use crate::errors::ImmunityError;
use crate::presets;
use crate::sample::SampleDist;

/// Dosing and nab-initialization parameters, as stored in the preset
/// catalog.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DosePars {
    /// Distribution of the log2 peak nab drawn at the first dose.
    pub nab_init: SampleDist,
    /// Multiplier applied to the existing peak nab on repeat doses.
    pub nab_boost: f64,
    /// Number of doses in the schedule.
    pub doses: usize,
    /// Days between doses, for multi-dose schedules.
    pub interval: Option<usize>,
    /// Efficacy-mapping parameters for vaccine-derived nabs.
    pub nab_eff: NabEffPars,
}

/// Fully resolved vaccine parameter set. Immutable after resolution.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct VaccinePars {
    pub nab_init: SampleDist,
    pub nab_boost: f64,
    pub doses: usize,
    pub interval: Option<usize>,
    pub nab_eff: NabEffPars,
    /// Relative immunogenicity against each strain label; unknown labels
    /// scale by 1.
    pub rel_imm: Vec<(String, f64)>,
}

impl VaccinePars {
    /// Relative immunogenicity of this vaccine against the given strain.
    pub fn rel_imm_for(&self, strain_label: &str) -> f64 {
        self.rel_imm
            .iter()
            .find(|(label, _)| label == strain_label)
            .map(|(_, value)| *value)
            .unwrap_or(1.)
    }
}

/// Partial vaccine parameter set; missing fields fall back to the
/// `default` preset.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct VaccineParsOverride {
    #[serde(default)]
    pub nab_init: Option<SampleDist>,
    #[serde(default)]
    pub nab_boost: Option<f64>,
    #[serde(default)]
    pub doses: Option<usize>,
    #[serde(default)]
    pub interval: Option<usize>,
    #[serde(default)]
    pub nab_eff: Option<NabEffPars>,
    #[serde(default)]
    pub rel_imm: Option<Vec<(String, f64)>>,
}

/// A vaccine specification: either a preset name or a parameter mapping.
#[derive(Clone, Debug, PartialEq)]
pub enum VaccineSpec {
    Preset(String),
    Custom(VaccineParsOverride),
}

impl Serialize for VaccineSpec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            VaccineSpec::Preset(name) => serializer.serialize_str(name),
            VaccineSpec::Custom(pars) => pars.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for VaccineSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_yaml::Value::deserialize(deserializer)?;
        match value {
            serde_yaml::Value::String(name) => Ok(VaccineSpec::Preset(name)),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value)
                .map(VaccineSpec::Custom)
                .map_err(D::Error::custom),
            other => Err(D::Error::custom(ImmunityError::InvalidSpec(format!(
                "could not understand vaccine specification {:?}; \
                 specify a predefined vaccine name or a parameter mapping",
                other
            )))),
        }
    }
}

/// Strip case and decoration from a vaccine name before preset lookup.
fn normalize_vaccine(name: &str) -> String {
    let mut name = name.to_lowercase();
    for token in [".", " ", "&", "-", "vaccine"] {
        name = name.replace(token, "");
    }
    name
}

/// A resolved vaccine catalog entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Vaccine {
    pub label: String,
    pub pars: VaccinePars,
}

impl Vaccine {
    /// Resolve a vaccine specification into a catalog entry. Presets merge
    /// the dose catalog with the per-strain immunogenicity catalog; custom
    /// mappings supply the merged set directly, with missing fields taken
    /// from the `default` preset.
    pub fn new(spec: &VaccineSpec, label: Option<&str>) -> Result<Self, ImmunityError> {
        let (pars, default_label) = match spec {
            VaccineSpec::Preset(name) => {
                let normalized = normalize_vaccine(name);
                let key = presets::VACCINE_MAPPING
                    .get(normalized.as_str())
                    .ok_or_else(|| ImmunityError::UnknownPreset {
                        kind: "vaccine",
                        name: name.clone(),
                        choices: presets::vaccine_choices(),
                    })?;
                (Self::merge_preset(key), *key)
            }
            VaccineSpec::Custom(overrides) => (Self::merge_custom(overrides), "custom"),
        };
        Ok(Self {
            label: label.unwrap_or(default_label).to_string(),
            pars,
        })
    }

    pub fn from_preset(name: &str) -> Result<Self, ImmunityError> {
        Self::new(&VaccineSpec::Preset(name.to_string()), None)
    }

    /// Dosing parameters of the `default` preset, used when no vaccine
    /// information is supplied.
    pub fn default_dose_pars() -> &'static DosePars {
        &presets::VACCINE_DOSE_PARS["default"]
    }

    fn merge_preset(key: &str) -> VaccinePars {
        let dose = &presets::VACCINE_DOSE_PARS[key];
        let rel_imm = presets::VACCINE_STRAIN_PARS[key]
            .iter()
            .map(|(label, value)| (label.to_string(), *value))
            .collect();
        VaccinePars {
            nab_init: dose.nab_init,
            nab_boost: dose.nab_boost,
            doses: dose.doses,
            interval: dose.interval,
            nab_eff: dose.nab_eff,
            rel_imm,
        }
    }

    fn merge_custom(overrides: &VaccineParsOverride) -> VaccinePars {
        let default = &presets::VACCINE_DOSE_PARS["default"];
        VaccinePars {
            nab_init: overrides.nab_init.unwrap_or(default.nab_init),
            nab_boost: overrides.nab_boost.unwrap_or(default.nab_boost),
            doses: overrides.doses.unwrap_or(default.doses),
            interval: overrides.interval.or(default.interval),
            nab_eff: overrides.nab_eff.unwrap_or(default.nab_eff),
            rel_imm: overrides.rel_imm.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_resolution_is_case_and_punctuation_insensitive() {
        for name in ["pfizer", "Pfizer", "Pfizer-BioNTech", "BNT162b2 vaccine"] {
            let vaccine = Vaccine::from_preset(name).unwrap();
            assert_eq!(vaccine.label, "pfizer");
            assert_eq!(vaccine.pars.doses, 2);
            assert_eq!(vaccine.pars.interval, Some(21));
        }
        let jj = Vaccine::from_preset("Johnson & Johnson").unwrap();
        assert_eq!(jj.label, "jj");
        assert_eq!(jj.pars.doses, 1);
    }

    #[test]
    fn every_preset_resolves_with_full_parameters() {
        for name in presets::vaccine_choices() {
            let vaccine = Vaccine::from_preset(name).unwrap();
            assert!(vaccine.pars.nab_boost >= 1.);
            assert!(vaccine.pars.doses >= 1);
            assert!(!vaccine.pars.rel_imm.is_empty());
        }
    }

    #[test]
    fn preset_merges_both_catalogs() {
        let pfizer = Vaccine::from_preset("pfizer").unwrap();
        assert_eq!(pfizer.pars.rel_imm_for("wild"), 1.);
        assert_eq!(pfizer.pars.rel_imm_for("b117"), 0.5);
        // strains absent from the catalog scale by 1
        assert_eq!(pfizer.pars.rel_imm_for("custom"), 1.);
    }

    #[test]
    fn unknown_preset_fails_with_choices() {
        let error = Vaccine::from_preset("sputnik").unwrap_err();
        match &error {
            ImmunityError::UnknownPreset { kind, name, choices } => {
                assert_eq!(*kind, "vaccine");
                assert_eq!(name, "sputnik");
                assert_eq!(choices, &presets::vaccine_choices());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn custom_spec_fills_missing_fields_from_default() {
        let spec = VaccineSpec::Custom(VaccineParsOverride {
            nab_boost: Some(4.),
            ..Default::default()
        });
        let vaccine = Vaccine::new(&spec, Some("My vaccine")).unwrap();
        let default = Vaccine::default_dose_pars();
        assert_eq!(vaccine.label, "My vaccine");
        assert_eq!(vaccine.pars.nab_boost, 4.);
        assert_eq!(vaccine.pars.nab_init, default.nab_init);
        assert_eq!(vaccine.pars.doses, default.doses);
    }

    #[test]
    fn spec_deserializes_from_string_or_mapping() {
        let preset: VaccineSpec = serde_yaml::from_str("moderna").unwrap();
        assert_eq!(preset, VaccineSpec::Preset("moderna".to_string()));

        let custom: VaccineSpec = serde_yaml::from_str("nab_boost: 4.0").unwrap();
        assert_eq!(
            custom,
            VaccineSpec::Custom(VaccineParsOverride {
                nab_boost: Some(4.),
                ..Default::default()
            })
        );
    }

    #[test]
    fn spec_rejects_other_yaml_nodes() {
        let result: Result<VaccineSpec, _> = serde_yaml::from_str("42");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("could not understand vaccine specification"));
    }
}
