//! Structure-of-arrays store for the agents' immunity state.
//!
//! Allocated once at population creation and mutated in place by the
//! immunity updater, always through an explicit index subset. Protection
//! values are strain × agent matrices so that each agent carries a
//! per-challenge-strain efficacy.

use ndarray::Array2;

use crate::core::strain::StrainId;

pub struct People {
    n_agents: usize,
    /// Currently susceptible to infection.
    pub susceptible: Vec<bool>,
    /// Strain of the current infection, while infected.
    pub exposed_strain: Vec<Option<StrainId>>,
    pub date_infected: Vec<Option<usize>>,
    pub date_recovered: Vec<Option<usize>>,
    /// Strain of the most recent cleared infection.
    pub recovered_strain: Vec<Option<StrainId>>,
    /// Binary indicator of symptoms during the most recent infection;
    /// scales the nab draw at recovery.
    pub prior_symptoms: Vec<f64>,
    pub vaccinated: Vec<bool>,
    /// Index of the vaccine the agent received.
    pub vaccine_source: Vec<Option<usize>>,
    pub date_vaccinated: Vec<Option<usize>>,
    pub doses: Vec<usize>,
    /// Peak nab recorded at the most recent immunity-conferring event;
    /// `None` until the first event.
    pub init_nab: Vec<Option<f64>>,
    /// Current nab level, recomputed every timestep from `init_nab` and the
    /// kinetics table.
    pub nab: Vec<f64>,
    /// Protection against infection, per challenge strain and agent.
    pub sus_imm: Array2<f64>,
    /// Protection against symptomatic disease, per strain and agent.
    pub symp_imm: Array2<f64>,
    /// Protection against severe disease, per strain and agent.
    pub sev_imm: Array2<f64>,
}

impl People {
    /// Allocate state for `n_agents` agents and `n_strains` strains, with
    /// sentinel/zero values throughout.
    pub fn new(n_agents: usize, n_strains: usize) -> Self {
        Self {
            n_agents,
            susceptible: vec![true; n_agents],
            exposed_strain: vec![None; n_agents],
            date_infected: vec![None; n_agents],
            date_recovered: vec![None; n_agents],
            recovered_strain: vec![None; n_agents],
            prior_symptoms: vec![0.; n_agents],
            vaccinated: vec![false; n_agents],
            vaccine_source: vec![None; n_agents],
            date_vaccinated: vec![None; n_agents],
            doses: vec![0; n_agents],
            init_nab: vec![None; n_agents],
            nab: vec![0.; n_agents],
            sus_imm: Array2::zeros((n_strains, n_agents)),
            symp_imm: Array2::zeros((n_strains, n_agents)),
            sev_imm: Array2::zeros((n_strains, n_agents)),
        }
    }

    pub fn len(&self) -> usize {
        self.n_agents
    }

    pub fn is_empty(&self) -> bool {
        self.n_agents == 0
    }

    pub fn n_strains(&self) -> usize {
        self.sus_imm.nrows()
    }

    pub fn susceptible_inds(&self) -> Vec<usize> {
        (0..self.n_agents)
            .filter(|&ind| self.susceptible[ind])
            .collect()
    }

    pub fn infected_inds(&self) -> Vec<usize> {
        (0..self.n_agents)
            .filter(|&ind| self.exposed_strain[ind].is_some())
            .collect()
    }

    /// Agents that have had at least one immunity-conferring event.
    pub fn nab_event_inds(&self) -> Vec<usize> {
        (0..self.n_agents)
            .filter(|&ind| {
                self.date_recovered[ind].is_some() || self.date_vaccinated[ind].is_some()
            })
            .collect()
    }

    /// Mark agents as infected with `strain` on day `t`.
    pub fn infect(&mut self, inds: &[usize], strain: StrainId, t: usize) {
        for &ind in inds {
            self.susceptible[ind] = false;
            self.exposed_strain[ind] = Some(strain);
            self.date_infected[ind] = Some(t);
        }
    }

    /// Mark an agent as recovered on day `t`. Returns the cleared strain.
    pub fn recover(&mut self, ind: usize, t: usize, symptomatic: bool) -> Option<StrainId> {
        let strain = self.exposed_strain[ind].take()?;
        self.susceptible[ind] = true;
        self.date_recovered[ind] = Some(t);
        self.recovered_strain[ind] = Some(strain);
        self.prior_symptoms[ind] = if symptomatic { 1. } else { 0. };
        Some(strain)
    }

    /// Record a dose of vaccine `source` on day `t`.
    pub fn vaccinate(&mut self, inds: &[usize], source: usize, t: usize) {
        for &ind in inds {
            self.vaccinated[ind] = true;
            self.vaccine_source[ind] = Some(source);
            self.date_vaccinated[ind] = Some(t);
            self.doses[ind] += 1;
        }
    }
}
