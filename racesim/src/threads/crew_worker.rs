use crate::core::race_data::RaceData;
use crate::core::roster::Team;
use crate::interfaces::gui_interface::RaceLogger;
use crate::pre::sim_config::SimConfig;
use crate::sync::pit_box::PitBoxAccess;
use rand_distr::{Distribution, Uniform};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Ekipa serwisowa zespołu: konsument zgłoszeń z boksu. Czeka z limitem
/// czasu, żeby regularnie sprawdzać warunek zakończenia.
pub struct CrewWorker {
    team: Team,
    pit_box: Arc<PitBoxAccess>,
    data: Arc<RaceData>,
    config: SimConfig,
    logger: RaceLogger,
    running: Arc<AtomicBool>,
}

impl CrewWorker {
    pub fn new(
        team: Team,
        pit_box: Arc<PitBoxAccess>,
        data: Arc<RaceData>,
        config: SimConfig,
        logger: RaceLogger,
        running: Arc<AtomicBool>,
    ) -> CrewWorker {
        CrewWorker {
            team,
            pit_box,
            data,
            config,
            logger,
            running,
        }
    }

    fn stopped(&self) -> bool {
        !self.running.load(Ordering::Acquire) || self.data.race_finished()
    }

    /// Thread entry point: wait for a car, service it, report completion,
    /// repeat until shutdown.
    pub fn run(self) {
        self.logger
            .debug(&format!("Pit crew {} ready", self.team.name));
        let service_duration =
            Uniform::new_inclusive(self.config.pit_service_min_ms, self.config.pit_service_max_ms);
        let mut serviced = 0u32;

        while !self.stopped() {
            let timeout = self.data.scaled(self.config.crew_wait_timeout_ms);
            let accepted = self.pit_box.wait_for_car(timeout);

            if let Some((car_no, compound)) = accepted {
                self.logger.info(&format!(
                    "Crew {} begins tire change for car #{}",
                    self.team.name, car_no
                ));

                // randomised service time, scaled by the simulation speed
                let duration_ms = service_duration.sample(&mut rand::thread_rng());
                thread::sleep(self.data.scaled(duration_ms));

                // the accepted car must always be released, also on shutdown
                self.pit_box.finish_service();
                serviced += 1;

                self.logger.info(&format!(
                    "Crew {} done with car #{} - new tires: {}",
                    self.team.name,
                    car_no,
                    compound.label()
                ));
            }
        }

        self.logger.debug(&format!(
            "Pit crew {} finished - {} stops serviced",
            self.team.name, serviced
        ));
    }
}
