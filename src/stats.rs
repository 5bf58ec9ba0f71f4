//! Per-day population summaries for the output time series.

use serde::Serialize;

use crate::core::people::People;

/// One row of the output time series.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DayStats {
    pub day: usize,
    pub n_susceptible: usize,
    pub n_infected: usize,
    pub n_vaccinated: usize,
    pub n_doses: usize,
    pub mean_nab: f64,
    pub mean_sus_imm: f64,
}

impl DayStats {
    pub fn collect(day: usize, people: &People) -> Self {
        let n_agents = people.len().max(1) as f64;
        Self {
            day,
            n_susceptible: people.susceptible_inds().len(),
            n_infected: people.infected_inds().len(),
            n_vaccinated: people.vaccinated.iter().filter(|&&v| v).count(),
            n_doses: people.doses.iter().sum(),
            mean_nab: people.nab.iter().sum::<f64>() / n_agents,
            mean_sus_imm: people.sus_imm.mean().unwrap_or(0.),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::strain::StrainId;

    #[test]
    fn collect_summarizes_the_population() {
        let mut people = People::new(4, 1);
        people.infect(&[0, 1], StrainId::WILD, 3);
        people.vaccinate(&[2], 0, 1);
        people.vaccinate(&[2], 0, 22);
        people.nab[2] = 2.;
        people.sus_imm[[0, 2]] = 0.5;

        let stats = DayStats::collect(5, &people);
        assert_eq!(stats.day, 5);
        assert_eq!(stats.n_susceptible, 2);
        assert_eq!(stats.n_infected, 2);
        assert_eq!(stats.n_vaccinated, 1);
        assert_eq!(stats.n_doses, 2);
        assert_eq!(stats.mean_nab, 0.5);
        assert_eq!(stats.mean_sus_imm, 0.125);
    }

    #[test]
    fn empty_population_yields_zeros() {
        let people = People::new(0, 1);
        let stats = DayStats::collect(0, &people);
        assert_eq!(stats.n_susceptible, 0);
        assert_eq!(stats.mean_nab, 0.);
        assert_eq!(stats.mean_sus_imm, 0.);
    }
}
