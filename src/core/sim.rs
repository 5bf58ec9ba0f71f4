//! Simulation-level immunity context.
//!
//! Bundles the immutable parameter set with the strain registry, the
//! vaccine list, the cross-immunity matrix and the precomputed kinetics
//! table. Constructed once at setup; the surrounding simulation loop only
//! advances `t` and passes the context by reference into the update
//! operations.

use crate::config::Parameters;
use crate::core::strain::{Strain, StrainId, StrainTable};
use crate::core::vaccine::Vaccine;
use crate::core::waning::{DecaySpec, NabKinetics};
use crate::core::{immunity::Immunity, people::People};
use crate::errors::ImmunityError;

pub struct Sim {
    pub pars: Parameters,
    pub strains: StrainTable,
    pub vaccines: Vec<Vaccine>,
    pub immunity: Option<Immunity>,
    pub nab_kin: Option<NabKinetics>,
    /// Per-day population rescaling factors applied to import counts.
    pub rescale_vec: Vec<f64>,
    /// Current simulated day.
    pub t: usize,
    /// Simulation-level decay override, resolved eagerly at construction.
    nab_decay: Option<DecaySpec>,
}

impl Sim {
    /// Create a context from an immutable parameter set. A configured
    /// decay override is resolved here so that an invalid form fails
    /// before the simulation starts.
    pub fn new(pars: Parameters) -> Result<Self, ImmunityError> {
        let nab_decay = pars
            .nab_decay
            .as_ref()
            .map(|raw| raw.resolve())
            .transpose()?;
        let rescale_vec = vec![1.; pars.n_days + 1];
        Ok(Self {
            pars,
            strains: StrainTable::new(),
            vaccines: Vec::new(),
            immunity: None,
            nab_kin: None,
            rescale_vec,
            t: 0,
            nab_decay,
        })
    }

    pub fn n_strains(&self) -> usize {
        self.strains.len()
    }

    pub fn register_strain(&mut self, strain: Strain) -> StrainId {
        self.strains.register(strain)
    }

    /// Add a vaccine to the context and return the source index agents are
    /// tagged with.
    pub fn register_vaccine(&mut self, vaccine: Vaccine) -> usize {
        self.vaccines.push(vaccine);
        self.vaccines.len() - 1
    }

    /// The decay specification the kinetics table is built from: the
    /// simulation-level override if configured, otherwise the baseline
    /// strain's.
    pub fn decay_spec(&self) -> DecaySpec {
        self.nab_decay
            .clone()
            .unwrap_or_else(|| self.strains.get(StrainId::WILD).pars.nab_decay.clone())
    }

    /// Run every registered strain's import schedule for the current day.
    /// Returns the newly infected agents per strain, for the caller to
    /// refresh their disease-severity protection.
    pub fn apply_imports(&self, people: &mut People) -> Vec<(StrainId, Vec<usize>)> {
        let mut seeded = Vec::new();
        for (id, strain) in self.strains.iter() {
            let importation_inds = strain.apply(id, self, people);
            if !importation_inds.is_empty() {
                seeded.push((id, importation_inds));
            }
        }
        seeded
    }
}
