//! Built-in strain, vaccine and cross-immunity catalogs.
//!
//! Preset names are looked up after normalization (lowercasing and token
//! stripping), so `B.1.1.7`, `b117 variant` and `B117` all resolve to the
//! same entry.

use phf::phf_map;

use crate::core::efficacy::{LogisticPars, NabEffPars};
use crate::core::strain::StrainPars;
use crate::core::vaccine::DosePars;
use crate::core::waning::DEFAULT_NAB_DECAY;
use crate::sample::SampleDist;

/// Normalized aliases to canonical strain keys.
pub static STRAIN_MAPPING: phf::Map<&'static str, &'static str> = phf_map! {
    "wild" => "wild",
    "default" => "wild",
    "b117" => "b117",
    "uk" => "b117",
    "unitedkingdom" => "b117",
    "b1351" => "b1351",
    "sa" => "b1351",
    "southafrica" => "b1351",
    "p1" => "p1",
    "b11248" => "p1",
    "brazil" => "p1",
};

/// Canonical strain parameter sets. Missing fields of custom strains fall
/// back to the `wild` entry.
pub static STRAIN_PARS: phf::Map<&'static str, StrainPars> = phf_map! {
    "wild" => WILD,
    "b117" => B117,
    "b1351" => B1351,
    "p1" => P1,
};

const WILD: StrainPars = StrainPars {
    rel_beta: 1.0,
    rel_symp_prob: 1.0,
    rel_severe_prob: 1.0,
    rel_imm: 1.0,
    nab_decay: DEFAULT_NAB_DECAY,
};

const B117: StrainPars = StrainPars {
    rel_beta: 1.5,
    rel_symp_prob: 1.0,
    rel_severe_prob: 1.8,
    rel_imm: 1.0,
    nab_decay: DEFAULT_NAB_DECAY,
};

const B1351: StrainPars = StrainPars {
    rel_beta: 1.4,
    rel_symp_prob: 1.0,
    rel_severe_prob: 1.4,
    rel_imm: 0.5,
    nab_decay: DEFAULT_NAB_DECAY,
};

const P1: StrainPars = StrainPars {
    rel_beta: 1.4,
    rel_symp_prob: 1.0,
    rel_severe_prob: 1.4,
    rel_imm: 0.5,
    nab_decay: DEFAULT_NAB_DECAY,
};

/// Pairwise cross-immunity: `CROSS_IMMUNITY[challenger]` lists, per prior
/// strain, the protection that recovery from the prior strain confers
/// against a challenge by the keyed strain. The table is asymmetric.
pub static CROSS_IMMUNITY: phf::Map<&'static str, &'static [(&'static str, f64)]> = phf_map! {
    "wild" => &[("b117", 0.5), ("b1351", 0.5), ("p1", 0.5)],
    "b117" => &[("wild", 0.5), ("b1351", 0.8), ("p1", 0.8)],
    "b1351" => &[("wild", 0.066), ("b117", 0.5), ("p1", 0.5)],
    "p1" => &[("wild", 0.34), ("b117", 0.4), ("b1351", 0.4)],
};

/// Preset cross-immunity of a prior infection with `prior` against a
/// challenge by `challenger`, if both labels are known.
pub fn get_cross_immunity(challenger: &str, prior: &str) -> Option<f64> {
    CROSS_IMMUNITY
        .get(challenger)?
        .iter()
        .find(|(label, _)| *label == prior)
        .map(|(_, value)| *value)
}

/// Normalized aliases to canonical vaccine keys.
pub static VACCINE_MAPPING: phf::Map<&'static str, &'static str> = phf_map! {
    "default" => "default",
    "pfizer" => "pfizer",
    "biontech" => "pfizer",
    "pfizerbiontech" => "pfizer",
    "bnt162b2" => "pfizer",
    "moderna" => "moderna",
    "mrna1273" => "moderna",
    "az" => "az",
    "astrazeneca" => "az",
    "azd1222" => "az",
    "jj" => "jj",
    "johnsonjohnson" => "jj",
    "janssen" => "jj",
    "ad26covs1" => "jj",
};

const DEFAULT_VX_NAB_EFF: NabEffPars = NabEffPars {
    sus: LogisticPars {
        slope: 2.5,
        n_50: 0.55,
    },
    symp: 0.1,
    sev: 0.52,
};

/// Dosing and nab-initialization parameters per vaccine.
pub static VACCINE_DOSE_PARS: phf::Map<&'static str, DosePars> = phf_map! {
    "default" => DosePars {
        nab_init: SampleDist::Normal { par1: 0.5, par2: 2.0 },
        nab_boost: 2.0,
        doses: 1,
        interval: None,
        nab_eff: DEFAULT_VX_NAB_EFF,
    },
    "pfizer" => DosePars {
        nab_init: SampleDist::Normal { par1: 2.0, par2: 2.0 },
        nab_boost: 3.0,
        doses: 2,
        interval: Some(21),
        nab_eff: DEFAULT_VX_NAB_EFF,
    },
    "moderna" => DosePars {
        nab_init: SampleDist::Normal { par1: 2.0, par2: 2.0 },
        nab_boost: 3.0,
        doses: 2,
        interval: Some(28),
        nab_eff: DEFAULT_VX_NAB_EFF,
    },
    "az" => DosePars {
        nab_init: SampleDist::Normal { par1: -0.85, par2: 2.0 },
        nab_boost: 3.0,
        doses: 2,
        interval: Some(21),
        nab_eff: DEFAULT_VX_NAB_EFF,
    },
    "jj" => DosePars {
        nab_init: SampleDist::Normal { par1: -1.1, par2: 2.0 },
        nab_boost: 3.0,
        doses: 1,
        interval: None,
        nab_eff: DEFAULT_VX_NAB_EFF,
    },
};

/// Relative immunogenicity of each vaccine against each known strain.
/// Strains missing from an entry scale by 1.
pub static VACCINE_STRAIN_PARS: phf::Map<&'static str, &'static [(&'static str, f64)]> = phf_map! {
    "default" => &[("wild", 1.0), ("b117", 1.0), ("b1351", 1.0), ("p1", 1.0)],
    "pfizer" => &[("wild", 1.0), ("b117", 0.5), ("b1351", 0.15), ("p1", 0.154)],
    "moderna" => &[("wild", 1.0), ("b117", 0.5), ("b1351", 0.15), ("p1", 0.154)],
    "az" => &[("wild", 1.0), ("b117", 0.43), ("b1351", 0.11), ("p1", 0.34)],
    "jj" => &[("wild", 1.0), ("b117", 0.43), ("b1351", 0.15), ("p1", 0.115)],
};

/// Canonical strain preset names, for error messages.
pub fn strain_choices() -> Vec<&'static str> {
    let mut choices: Vec<&'static str> = STRAIN_PARS.keys().copied().collect();
    choices.sort();
    choices
}

/// Canonical vaccine preset names, for error messages.
pub fn vaccine_choices() -> Vec<&'static str> {
    let mut choices: Vec<&'static str> = VACCINE_DOSE_PARS.keys().copied().collect();
    choices.sort();
    choices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_alias_targets_a_catalog_entry() {
        for key in STRAIN_MAPPING.values() {
            assert!(STRAIN_PARS.contains_key(key));
        }
        for key in VACCINE_MAPPING.values() {
            assert!(VACCINE_DOSE_PARS.contains_key(key));
            assert!(VACCINE_STRAIN_PARS.contains_key(key));
        }
    }

    #[test]
    fn cross_immunity_is_asymmetric() {
        assert_eq!(get_cross_immunity("b1351", "wild"), Some(0.066));
        assert_eq!(get_cross_immunity("wild", "b1351"), Some(0.5));
    }

    #[test]
    fn cross_immunity_unknown_pair() {
        assert_eq!(get_cross_immunity("wild", "nonexistent"), None);
        assert_eq!(get_cross_immunity("nonexistent", "wild"), None);
    }

    #[test]
    fn choices_are_sorted_and_complete() {
        assert_eq!(strain_choices(), vec!["b117", "b1351", "p1", "wild"]);
        assert_eq!(
            vaccine_choices(),
            vec!["az", "default", "jj", "moderna", "pfizer"]
        );
    }
}
