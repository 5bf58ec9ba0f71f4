//! Cross-immunity matrices and the per-timestep immunity update.
//!
//! There are two fundamental sources of immunity:
//!
//! 1. prior exposure: degree of protection depends on the challenge
//!    strain, the prior strain and the time since recovery;
//! 2. vaccination: degree of protection depends on the challenge strain,
//!    the vaccine and the time since vaccination.
//!
//! `init_nab` assigns a peak nab at each immunity-conferring event,
//! `check_nab` wanes it along the precomputed kinetics table, and
//! `check_immunity` converts the current nab into per-strain protection
//! values.

use itertools::Itertools;
use ndarray::{Array1, Array2};

use crate::config::Parameters;
use crate::core::efficacy::{Axis, nab_to_efficacy};
use crate::core::people::People;
use crate::core::sim::Sim;
use crate::core::strain::StrainId;
use crate::core::vaccine::Vaccine;
use crate::core::waning::NabKinetics;
use crate::presets;

/// Per-strain immunity tensors, built once per simulation and read-only
/// during the run.
#[derive(Clone, Debug, PartialEq)]
pub struct Immunity {
    /// Susceptibility cross-immunity. Entry `[challenger, prior]` scales
    /// the nab level of an agent previously infected by `prior` when
    /// challenged by `challenger`. Diagonal entries are 1; unknown pairs
    /// keep the configured default. Asymmetric.
    pub sus: Array2<f64>,
    /// Symptomatic-disease progression scaling per strain.
    pub symp: Array1<f64>,
    /// Severe-disease progression scaling per strain.
    pub sev: Array1<f64>,
}

/// Build the cross-immunity tensors for all registered strains and
/// precompute the nab kinetics table over the simulation horizon.
///
/// No-op when immunity waning is globally disabled. The matrix is only
/// rebuilt when none exists yet or `create` is set; the kinetics table is
/// refreshed on every call.
pub fn init_immunity(sim: &mut Sim, create: bool) {
    if !sim.pars.use_waning {
        return;
    }

    let n = sim.n_strains();
    if sim.immunity.is_none() || create {
        let mut sus = Array2::from_elem((n, n), sim.pars.cross_immunity);
        sus.diag_mut().fill(1.);
        for (i, prior) in sim.strains.iter() {
            for (j, challenger) in sim.strains.iter() {
                if i == j {
                    continue;
                }
                if let Some(value) = presets::get_cross_immunity(&challenger.label, &prior.label)
                {
                    sus[[j.index(), i.index()]] = value;
                }
            }
        }
        log::debug!("Built {n}x{n} cross-immunity matrix.");
        sim.immunity = Some(Immunity {
            sus,
            symp: Array1::ones(n),
            sev: Array1::ones(n),
        });
    }

    sim.nab_kin = Some(NabKinetics::precompute(
        sim.pars.n_days + 1,
        &sim.decay_spec(),
    ));
}

/// Draw or boost the peak nab level for agents after an immunity-conferring
/// event.
///
/// Agents without a prior peak draw a fresh sample from the configured
/// initialization distribution, transformed via `2^sample`; for natural
/// infections the draw is additionally scaled by the binary prior-symptom
/// indicator, so asymptomatic infections confer no nabs by this path.
/// Agents with an existing peak are boosted multiplicatively instead of
/// redrawn. Only `inds` is touched.
pub fn init_nab(
    people: &mut People,
    inds: &[usize],
    prior_inf: bool,
    vaccine: Option<&Vaccine>,
    pars: &Parameters,
) {
    let mut rng = rand::rng();
    let (nab_init, nab_boost) = if prior_inf {
        (pars.nab_init, pars.nab_boost)
    } else {
        match vaccine {
            Some(vaccine) => (vaccine.pars.nab_init, vaccine.pars.nab_boost),
            None => {
                let dose = Vaccine::default_dose_pars();
                (dose.nab_init, dose.nab_boost)
            }
        }
    };

    for &ind in inds {
        people.init_nab[ind] = Some(match people.init_nab[ind] {
            Some(peak) => peak * nab_boost,
            None => {
                let draw = 2f64.powf(nab_init.draw(&mut rng));
                if prior_inf {
                    draw * people.prior_symptoms[ind]
                } else {
                    draw
                }
            }
        });
    }
}

/// Recompute current nab levels from the peak nab and the time since the
/// most recent immunity-conferring event.
///
/// The event day is `max(date_recovered, date_vaccinated)` over whichever
/// dates are defined; agents with neither are left untouched. The elapsed
/// days must lie within the kinetics table's horizon.
pub fn check_nab(t: usize, people: &mut People, nab_kin: &NabKinetics, inds: &[usize]) {
    for &ind in inds {
        let last_event = match (people.date_recovered[ind], people.date_vaccinated[ind]) {
            (Some(recovered), Some(vaccinated)) => recovered.max(vaccinated),
            (Some(recovered), None) => recovered,
            (None, Some(vaccinated)) => vaccinated,
            (None, None) => continue,
        };
        if let Some(init_nab) = people.init_nab[ind] {
            people.nab[ind] = nab_kin.get(t - last_event) * init_nab;
        }
    }
}

/// Refresh per-strain protection values for this timestep.
///
/// Susceptibility mode (`sus = true`) runs over all currently susceptible
/// agents (`inds` is ignored) and partitions them into four groups:
/// vaccinated without prior infection, previously infected by the same
/// strain, previously infected by a different strain (grouped per distinct
/// prior strain), and naive agents, which are left unmodified.
///
/// Disease-severity mode (`sus = false`) runs over the caller-supplied
/// newly-infected `inds` and computes symptomatic and severe protection
/// for the previously-recovered and the vaccinated subsets. The vaccinated
/// branch is written last, so vaccination wins for agents in both subsets.
///
/// No-op until `init_immunity` has built the matrix.
pub fn check_immunity(people: &mut People, strain: StrainId, sus: bool, inds: &[usize], sim: &Sim) {
    let Some(immunity) = &sim.immunity else {
        return;
    };
    let s = strain.index();
    let strain_label = sim.strains.get(strain).label.clone();
    let nab_eff = &sim.pars.nab_eff;

    if sus {
        let mut sus_vacc: Vec<(usize, usize)> = Vec::new();
        let mut was_inf_same: Vec<usize> = Vec::new();
        let mut was_inf_diff: Vec<(usize, StrainId)> = Vec::new();
        for ind in people.susceptible_inds() {
            match (people.recovered_strain[ind], people.vaccine_source[ind]) {
                (Some(prior), _) if prior == strain => was_inf_same.push(ind),
                (Some(prior), _) => was_inf_diff.push((ind, prior)),
                (None, Some(source)) if people.vaccinated[ind] => sus_vacc.push((ind, source)),
                _ => {}
            }
        }

        // vaccinated without prior infection, per vaccine source
        for (source, group) in sus_vacc.into_iter().into_group_map_by(|&(_, source)| source) {
            let vaccine = &sim.vaccines[source];
            let scale = vaccine.pars.rel_imm_for(&strain_label);
            let nabs: Vec<f64> = group
                .iter()
                .map(|&(ind, _)| people.nab[ind] * scale)
                .collect();
            let efficacy = nab_to_efficacy(&nabs, Axis::Sus, &vaccine.pars.nab_eff);
            for (&(ind, _), value) in group.iter().zip(efficacy) {
                people.sus_imm[[s, ind]] = value;
            }
        }

        // prior exposure to the strain under evaluation
        if !was_inf_same.is_empty() {
            let scale = immunity.sus[[s, s]];
            let nabs: Vec<f64> = was_inf_same
                .iter()
                .map(|&ind| people.nab[ind] * scale)
                .collect();
            let efficacy = nab_to_efficacy(&nabs, Axis::Sus, nab_eff);
            for (&ind, value) in was_inf_same.iter().zip(efficacy) {
                people.sus_imm[[s, ind]] = value;
            }
        }

        // cross-immunity, per distinct prior strain
        for (prior, group) in was_inf_diff.into_iter().into_group_map_by(|&(_, prior)| prior) {
            let scale = immunity.sus[[s, prior.index()]];
            let nabs: Vec<f64> = group
                .iter()
                .map(|&(ind, _)| people.nab[ind] * scale)
                .collect();
            let efficacy = nab_to_efficacy(&nabs, Axis::Sus, nab_eff);
            for (&(ind, _), value) in group.iter().zip(efficacy) {
                people.sus_imm[[s, ind]] = value;
            }
        }
    } else {
        let was_inf: Vec<usize> = inds
            .iter()
            .copied()
            .filter(|&ind| people.recovered_strain[ind].is_some())
            .collect();
        let is_vacc: Vec<(usize, usize)> = inds
            .iter()
            .copied()
            .filter_map(|ind| {
                people.vaccine_source[ind]
                    .filter(|_| people.vaccinated[ind])
                    .map(|source| (ind, source))
            })
            .collect();

        // reinfection branch first; the vaccinated branch is written last
        // so vaccination wins for agents in both subsets
        if !was_inf.is_empty() {
            let symp_nabs: Vec<f64> = was_inf
                .iter()
                .map(|&ind| people.nab[ind] * immunity.symp[s])
                .collect();
            let sev_nabs: Vec<f64> = was_inf
                .iter()
                .map(|&ind| people.nab[ind] * immunity.sev[s])
                .collect();
            let symp_eff = nab_to_efficacy(&symp_nabs, Axis::Symp, nab_eff);
            let sev_eff = nab_to_efficacy(&sev_nabs, Axis::Sev, nab_eff);
            for ((&ind, symp), sev) in was_inf.iter().zip(symp_eff).zip(sev_eff) {
                people.symp_imm[[s, ind]] = symp;
                people.sev_imm[[s, ind]] = sev;
            }
        }

        for (source, group) in is_vacc.into_iter().into_group_map_by(|&(_, source)| source) {
            let vaccine = &sim.vaccines[source];
            let scale = vaccine.pars.rel_imm_for(&strain_label);
            let symp_nabs: Vec<f64> = group
                .iter()
                .map(|&(ind, _)| people.nab[ind] * scale * immunity.symp[s])
                .collect();
            let sev_nabs: Vec<f64> = group
                .iter()
                .map(|&(ind, _)| people.nab[ind] * scale * immunity.sev[s])
                .collect();
            let symp_eff = nab_to_efficacy(&symp_nabs, Axis::Symp, nab_eff);
            let sev_eff = nab_to_efficacy(&sev_nabs, Axis::Sev, nab_eff);
            for ((&(ind, _), symp), sev) in group.iter().zip(symp_eff).zip(sev_eff) {
                people.symp_imm[[s, ind]] = symp;
                people.sev_imm[[s, ind]] = sev;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strain::Strain;
    use crate::core::waning::RawDecaySpec;
    use crate::sample::SampleDist;

    fn test_sim() -> Sim {
        let mut sim = Sim::new(Parameters::default()).unwrap();
        sim.register_strain(Strain::from_preset("b117", &[], 1).unwrap());
        sim.register_strain(Strain::from_preset("b1351", &[], 1).unwrap());
        init_immunity(&mut sim, false);
        sim
    }

    #[test]
    fn matrix_diagonal_is_one() {
        let sim = test_sim();
        let immunity = sim.immunity.as_ref().unwrap();
        for i in 0..sim.n_strains() {
            assert_eq!(immunity.sus[[i, i]], 1.);
        }
    }

    #[test]
    fn matrix_uses_preset_pairs_and_defaults() {
        let sim = test_sim();
        let immunity = sim.immunity.as_ref().unwrap();
        // [challenger, prior]: prior b1351 protects 0.8 against b117,
        // prior wild protects only 0.066 against b1351
        assert_eq!(immunity.sus[[1, 2]], 0.8);
        assert_eq!(immunity.sus[[2, 0]], 0.066);
        // asymmetry
        assert_ne!(immunity.sus[[2, 0]], immunity.sus[[0, 2]]);
        // progression vectors start at one
        assert!(immunity.symp.iter().all(|&v| v == 1.));
        assert!(immunity.sev.iter().all(|&v| v == 1.));
    }

    #[test]
    fn matrix_keeps_default_for_unknown_pairs() {
        let mut sim = Sim::new(Parameters::default()).unwrap();
        let spec = crate::core::strain::StrainSpec::Custom(Default::default());
        sim.register_strain(Strain::new(&spec, Some("novel"), &[], 1).unwrap());
        init_immunity(&mut sim, false);
        let immunity = sim.immunity.as_ref().unwrap();
        assert_eq!(immunity.sus[[1, 0]], sim.pars.cross_immunity);
        assert_eq!(immunity.sus[[0, 1]], sim.pars.cross_immunity);
    }

    #[test]
    fn matrix_is_not_rebuilt_unless_forced() {
        let mut sim = test_sim();
        sim.immunity.as_mut().unwrap().sus[[1, 0]] = 0.123;
        init_immunity(&mut sim, false);
        assert_eq!(sim.immunity.as_ref().unwrap().sus[[1, 0]], 0.123);
        init_immunity(&mut sim, true);
        assert_ne!(sim.immunity.as_ref().unwrap().sus[[1, 0]], 0.123);
    }

    #[test]
    fn init_immunity_is_a_no_op_without_waning() {
        let mut pars = Parameters::default();
        pars.use_waning = false;
        let mut sim = Sim::new(pars).unwrap();
        init_immunity(&mut sim, false);
        assert!(sim.immunity.is_none());
        assert!(sim.nab_kin.is_none());
    }

    #[test]
    fn kinetics_table_covers_the_horizon() {
        let sim = test_sim();
        assert_eq!(sim.nab_kin.as_ref().unwrap().len(), sim.pars.n_days + 1);
    }

    fn deterministic_pars() -> Parameters {
        let mut pars = Parameters::default();
        // par2 = 0 makes every draw exactly 2^par1
        pars.nab_init = SampleDist::Normal { par1: 3., par2: 0. };
        pars.nab_boost = 1.5;
        pars
    }

    #[test]
    fn init_nab_draws_for_naive_and_boosts_for_repeat() {
        let pars = deterministic_pars();
        let mut people = People::new(2, 1);
        people.prior_symptoms[0] = 1.;
        people.prior_symptoms[1] = 1.;

        init_nab(&mut people, &[0], true, None, &pars);
        assert_eq!(people.init_nab[0], Some(8.));
        assert_eq!(people.init_nab[1], None);

        // repeat event boosts instead of redrawing
        init_nab(&mut people, &[0], true, None, &pars);
        assert_eq!(people.init_nab[0], Some(12.));
        init_nab(&mut people, &[0], true, None, &pars);
        assert_eq!(people.init_nab[0], Some(18.));
    }

    #[test]
    fn init_nab_asymptomatic_infection_confers_nothing() {
        let pars = deterministic_pars();
        let mut people = People::new(1, 1);
        people.prior_symptoms[0] = 0.;
        init_nab(&mut people, &[0], true, None, &pars);
        assert_eq!(people.init_nab[0], Some(0.));
    }

    #[test]
    fn init_nab_from_vaccine_ignores_symptoms() {
        let pars = deterministic_pars();
        let spec = crate::core::vaccine::VaccineSpec::Custom(crate::core::vaccine::VaccineParsOverride {
            nab_init: Some(SampleDist::Normal { par1: 2., par2: 0. }),
            nab_boost: Some(3.),
            ..Default::default()
        });
        let vaccine = Vaccine::new(&spec, None).unwrap();

        let mut people = People::new(1, 1);
        init_nab(&mut people, &[0], false, Some(&vaccine), &pars);
        assert_eq!(people.init_nab[0], Some(4.));
        init_nab(&mut people, &[0], false, Some(&vaccine), &pars);
        assert_eq!(people.init_nab[0], Some(12.));
    }

    fn linear_kinetics() -> NabKinetics {
        let spec = RawDecaySpec {
            form: Some("linear_decay".to_string()),
            init_val: Some(1.),
            slope: Some(0.1),
            ..Default::default()
        };
        NabKinetics::precompute(20, &spec.resolve().unwrap())
    }

    #[test]
    fn check_nab_wanes_from_the_most_recent_event() {
        let nab_kin = linear_kinetics();
        let mut people = People::new(3, 1);
        people.init_nab[0] = Some(10.);
        people.date_recovered[0] = Some(5);
        people.init_nab[1] = Some(10.);
        people.date_recovered[1] = Some(2);
        people.date_vaccinated[1] = Some(6);

        check_nab(8, &mut people, &nab_kin, &[0, 1, 2]);
        // 3 days since recovery: 0.7 * 10
        assert!((people.nab[0] - 7.).abs() < 1e-12);
        // the later of the two dates wins: 2 days since vaccination
        assert!((people.nab[1] - 8.).abs() < 1e-12);
        // no event: untouched
        assert_eq!(people.nab[2], 0.);
    }

    #[test]
    fn susceptibility_mode_partitions_four_groups() {
        let mut sim = test_sim();
        let b117 = StrainId(1);
        let source = sim.register_vaccine(Vaccine::from_preset("pfizer").unwrap());

        let mut people = People::new(4, sim.n_strains());
        // agent 0: naive
        // agent 1: vaccinated, no prior infection
        people.vaccinate(&[1], source, 0);
        // agent 2: recovered from b117 (the strain under evaluation)
        people.recovered_strain[2] = Some(b117);
        people.date_recovered[2] = Some(0);
        // agent 3: recovered from wild (a different strain)
        people.recovered_strain[3] = Some(StrainId::WILD);
        people.date_recovered[3] = Some(0);
        for ind in 1..4 {
            people.nab[ind] = 2.;
        }

        check_immunity(&mut people, b117, true, &[], &sim);

        let naive = people.sus_imm[[1, 0]];
        let vaccinated = people.sus_imm[[1, 1]];
        let same = people.sus_imm[[1, 2]];
        let cross = people.sus_imm[[1, 3]];

        // naive agents retain their prior (zero) protection
        assert_eq!(naive, 0.);
        // matching prior infection protects more than a never-infected agent
        assert!(same > naive);
        // same-strain protection (scale 1) beats cross protection (scale 0.5)
        assert!(same > cross);
        assert!(cross > 0.);
        // vaccine protection is scaled by the vaccine's immunogenicity for
        // this strain (pfizer vs b117: 0.5), matching the cross branch here
        assert!(vaccinated > 0.);
        assert!((vaccinated - cross).abs() < 1e-12);
    }

    #[test]
    fn susceptibility_mode_skips_non_susceptible_agents() {
        let sim = test_sim();
        let mut people = People::new(2, sim.n_strains());
        people.recovered_strain[0] = Some(StrainId::WILD);
        people.nab[0] = 2.;
        people.susceptible[0] = false;

        check_immunity(&mut people, StrainId::WILD, true, &[], &sim);
        assert_eq!(people.sus_imm[[0, 0]], 0.);
    }

    #[test]
    fn cross_immunity_is_applied_per_prior_strain() {
        let sim = test_sim();
        let b1351 = StrainId(2);

        let mut people = People::new(2, sim.n_strains());
        // both recovered, same nab, different prior strains
        people.recovered_strain[0] = Some(StrainId::WILD); // scale 0.066
        people.recovered_strain[1] = Some(StrainId(1)); // b117, scale 0.5
        people.nab[0] = 2.;
        people.nab[1] = 2.;

        check_immunity(&mut people, b1351, true, &[], &sim);
        assert!(people.sus_imm[[2, 1]] > people.sus_imm[[2, 0]]);
    }

    #[test]
    fn severity_mode_sets_both_axes_for_both_subsets() {
        let mut sim = test_sim();
        let source = sim.register_vaccine(Vaccine::from_preset("pfizer").unwrap());

        let mut people = People::new(4, sim.n_strains());
        // agent 0: reinfection (previously recovered)
        people.recovered_strain[0] = Some(StrainId::WILD);
        // agent 1: vaccinated
        people.vaccinate(&[1], source, 0);
        // agent 2: both vaccinated and previously recovered
        people.recovered_strain[2] = Some(StrainId::WILD);
        people.vaccinate(&[2], source, 0);
        for ind in 0..3 {
            people.nab[ind] = 1.;
        }

        check_immunity(&mut people, StrainId::WILD, false, &[0, 1, 2], &sim);

        for ind in 0..3 {
            assert_eq!(people.symp_imm[[0, ind]], sim.pars.nab_eff.symp);
            assert_eq!(people.sev_imm[[0, ind]], sim.pars.nab_eff.sev);
        }
        // agent 3 was not in the target subset
        assert_eq!(people.symp_imm[[0, 3]], 0.);
        assert_eq!(people.sev_imm[[0, 3]], 0.);
    }

    #[test]
    fn check_immunity_is_a_no_op_before_init() {
        let sim = Sim::new(Parameters::default()).unwrap();
        assert!(sim.immunity.is_none());
        let mut people = People::new(1, 1);
        people.recovered_strain[0] = Some(StrainId::WILD);
        people.nab[0] = 5.;
        check_immunity(&mut people, StrainId::WILD, true, &[], &sim);
        assert_eq!(people.sus_imm[[0, 0]], 0.);
    }
}
