use anyhow::Result;

use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::fs;
use std::path::Path;

use crate::args::Args;
use crate::config::Settings;
use crate::core::immunity::{check_immunity, check_nab, init_immunity, init_nab};
use crate::core::people::People;
use crate::core::sim::Sim;
use crate::core::strain::Strain;
use crate::core::vaccine::Vaccine;
use crate::stats::DayStats;

/// A vaccination campaign bound to its registered vaccine index.
struct Campaign {
    source: usize,
    days: Vec<usize>,
    prob: f64,
}

pub struct Runner {
    args: Args,
    sim: Sim,
    people: People,
    campaigns: Vec<Campaign>,
    stats: Vec<DayStats>,
}

impl Runner {
    pub fn new(args: Args) -> Result<Runner> {
        Self::setup_logger(&args);

        let settings = Self::load_settings(&args.settings)?;

        let mut sim = Sim::new(settings.parameters.clone())?;
        for entry in &settings.strains {
            let strain = Strain::new(
                &entry.strain,
                entry.label.as_deref(),
                &entry.days,
                entry.n_imports,
            )?;
            sim.register_strain(strain);
        }
        let mut campaigns = Vec::new();
        for entry in &settings.vaccines {
            let vaccine = Vaccine::new(&entry.vaccine, entry.label.as_deref())?;
            let source = sim.register_vaccine(vaccine);
            campaigns.push(Campaign {
                source,
                days: entry.days.clone(),
                prob: entry.prob,
            });
        }
        init_immunity(&mut sim, false);

        let people = People::new(sim.pars.n_agents, sim.n_strains());

        Ok(Self {
            args,
            sim,
            people,
            campaigns,
            stats: Vec::new(),
        })
    }

    pub fn start(&mut self) {
        self.run();
        self.finish();
    }

    /// Setup logging level and file
    fn setup_logger(args: &Args) {
        let log_level = match args.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        simple_logging::log_to_file(args.log_file.as_str(), log_level).unwrap_or_else(|_| {
            eprintln!("Unable to open log file.");
            std::process::exit(1);
        });
    }

    /// Load settings from file
    fn load_settings(path: &str) -> Result<Settings> {
        let settings = Settings::read_from_file(path)?;
        log::info!("Loaded settings\n{}", settings);
        Ok(settings)
    }

    fn run(&mut self) {
        let bar = match self.args.disable_progress_bar {
            true => None,
            false => {
                let bar = ProgressBar::new(self.sim.pars.n_days as u64);
                bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "[{bar:40}] {pos:>7}/{len:7} [{elapsed_precise} / {duration_precise}] {msg}",
                    )
                    .expect("Unable to create template.")
                    .progress_chars("=> "),
            );
                Some(bar)
            }
        };

        let mut rng = rand::rng();

        for day in 0..=self.sim.pars.n_days {
            self.sim.t = day;
            log::debug!("Process imports for day {day}...");

            // introduce scheduled imports and set the seeded agents'
            // progression protection
            let seeded = self.sim.apply_imports(&mut self.people);
            for (strain, inds) in &seeded {
                check_immunity(&mut self.people, *strain, false, inds, &self.sim);
            }

            // vaccination campaigns
            log::debug!("Process vaccination...");
            for campaign in &self.campaigns {
                let vaccine = &self.sim.vaccines[campaign.source];

                if campaign.days.contains(&day) {
                    let targets: Vec<usize> = (0..self.people.len())
                        .filter(|&ind| {
                            !self.people.vaccinated[ind] && self.people.susceptible[ind]
                        })
                        .filter(|_| rng.random_bool(campaign.prob.clamp(0., 1.)))
                        .collect();
                    if !targets.is_empty() {
                        self.people.vaccinate(&targets, campaign.source, day);
                        init_nab(&mut self.people, &targets, false, Some(vaccine), &self.sim.pars);
                        log::info!(
                            "Administered {} first doses of {} on day {}.",
                            targets.len(),
                            vaccine.label,
                            day
                        );
                    }
                }

                // follow-up doses once the dosing interval has elapsed
                if let Some(interval) = vaccine.pars.interval {
                    let due: Vec<usize> = (0..self.people.len())
                        .filter(|&ind| {
                            self.people.vaccine_source[ind] == Some(campaign.source)
                                && self.people.doses[ind] < vaccine.pars.doses
                                && self.people.date_vaccinated[ind].map(|date| date + interval)
                                    == Some(day)
                        })
                        .collect();
                    if !due.is_empty() {
                        self.people.vaccinate(&due, campaign.source, day);
                        init_nab(&mut self.people, &due, false, Some(vaccine), &self.sim.pars);
                        log::info!(
                            "Administered {} follow-up doses of {} on day {}.",
                            due.len(),
                            vaccine.label,
                            day
                        );
                    }
                }
            }

            // recoveries
            log::debug!("Process recoveries...");
            for ind in self.people.infected_inds() {
                let due = self.people.date_infected[ind]
                    .map(|date| date + self.sim.pars.dur_infection)
                    == Some(day);
                if !due {
                    continue;
                }
                let Some(strain) = self.people.exposed_strain[ind] else {
                    continue;
                };
                let rel_symp_prob = self.sim.strains.get(strain).pars.rel_symp_prob;
                let protection = self.people.symp_imm[[strain.index(), ind]];
                let symp_prob =
                    (self.sim.pars.symp_prob * rel_symp_prob * (1. - protection)).clamp(0., 1.);
                let symptomatic = rng.random_bool(symp_prob);
                self.people.recover(ind, day, symptomatic);
                init_nab(&mut self.people, &[ind], true, None, &self.sim.pars);
            }

            // wane nabs and refresh per-strain protection
            log::debug!("Process waning...");
            if let Some(nab_kin) = &self.sim.nab_kin {
                let inds = self.people.nab_event_inds();
                check_nab(day, &mut self.people, nab_kin, &inds);
            }
            for strain in self.sim.strains.ids() {
                check_immunity(&mut self.people, strain, true, &[], &self.sim);
            }

            let stats = DayStats::collect(day, &self.people);
            log::info!(
                r###"
        day={day}
        n_susceptible={}
        n_infected={}"###,
                stats.n_susceptible,
                stats.n_infected
            );
            if let Some(bar) = bar.as_ref() {
                bar.set_position(day.try_into().unwrap());
                bar.set_message(format!("{} infected", stats.n_infected));
            }
            self.stats.push(stats);
        }

        if let Some(bar) = bar {
            bar.finish_with_message("Done.");
        }
        log::info!("Finished simulation.");
    }

    fn finish(&self) {
        log::info!("Storing time series...");
        fs::create_dir_all(&self.args.outdir).unwrap_or_else(|_| {
            eprintln!("Unable to create output directory.");
            std::process::exit(1);
        });
        let mut writer = csv::Writer::from_path(
            Path::new(self.args.outdir.as_str()).join("timeseries.csv"),
        )
        .expect("Unable to create time series file.");
        for row in &self.stats {
            writer
                .serialize(row)
                .expect("Unable to write to time series file.");
        }
        writer.flush().expect("Unable to flush time series file.");
        log::info!("Finished storing time series.");
    }
}
