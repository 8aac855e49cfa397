use crate::core::car::Car;
use crate::core::race_data::{RaceData, RaceStatus};
use crate::interfaces::gui_interface::{RaceEvent, RaceLogger};
use crate::post::race_result::ResultEntry;
use crate::pre::sim_config::SimConfig;
use crate::sync::start_latch::StartLatch;
use crate::sync::Interrupted;
use helpers::general::format_gap_ms;
use rand_distr::{Distribution, Uniform};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub const START_LIGHTS: u8 = 5;

/// Dyrektor wyścigu: jedyny w stawce. Prowadzi sekwencję startową, nadzoruje
/// wyścig, a po pierwszym finiszu rozsyła flagę końca i kompiluje wyniki.
pub struct RaceDirector {
    data: Arc<RaceData>,
    latch: Arc<StartLatch>,
    config: SimConfig,
    logger: RaceLogger,
    running: Arc<AtomicBool>,
}

impl RaceDirector {
    pub fn new(
        data: Arc<RaceData>,
        latch: Arc<StartLatch>,
        config: SimConfig,
        logger: RaceLogger,
        running: Arc<AtomicBool>,
    ) -> RaceDirector {
        RaceDirector {
            data,
            latch,
            config,
            logger,
            running,
        }
    }

    fn stopped(&self) -> bool {
        !self.running.load(Ordering::Acquire)
    }

    /// Thread entry point.
    pub fn run(self) {
        self.logger.debug("Race director started");

        match self.conduct() {
            Ok(()) => {}
            Err(Interrupted) => self.logger.warning("Race director interrupted"),
        }

        self.logger.debug("Race director finished");
    }

    fn conduct(&self) -> Result<(), Interrupted> {
        self.start_sequence()?;

        let winner = self.supervise();

        if winner.is_some() && self.data.status() != RaceStatus::Aborted {
            // settling period: workers observe the flag at their next safe
            // point before the classification is frozen
            thread::sleep(self.data.scaled(self.config.settling_delay_ms));
            self.compile_results();
            self.data.set_status(RaceStatus::Finished);
        }
        Ok(())
    }

    /// Waits for the ready quorum (at least half the field at the latch),
    /// runs the five-light sequence with a random release jitter and opens
    /// the latch.
    fn start_sequence(&self) -> Result<(), Interrupted> {
        self.data.set_status(RaceStatus::StartPhase);
        self.logger.info("Start sequence begins...");

        while !self.latch.quorum_ready() {
            if self.stopped() || self.data.race_finished() {
                return Err(Interrupted);
            }
            self.logger.debug(&format!(
                "Waiting for cars: {}/{}",
                self.latch.ready_count(),
                self.latch.expected()
            ));
            thread::sleep(Duration::from_millis(self.config.ready_poll_interval_ms));
        }

        self.logger.info(&format!(
            "{}/{} cars ready - light sequence starts",
            self.latch.ready_count(),
            self.latch.expected()
        ));

        for light in 1..=START_LIGHTS {
            if self.stopped() || self.data.race_finished() {
                return Err(Interrupted);
            }
            self.logger.info(&format!("Start light {} ON", light));
            self.logger.event(RaceEvent::StartLight(light));
            thread::sleep(self.data.scaled(self.config.start_light_interval_ms));
        }

        // random hold before the lights go out, against anticipated starts
        let jitter = Uniform::new_inclusive(
            self.config.start_release_jitter_min_ms,
            self.config.start_release_jitter_max_ms,
        )
        .sample(&mut rand::thread_rng());
        self.logger.debug(&format!("Release jitter: {}ms", jitter));
        thread::sleep(self.data.scaled(jitter));

        self.latch.release();
        self.logger.info("LIGHTS OUT - field released!");
        self.logger.event(RaceEvent::StartReleased);
        self.data.set_status(RaceStatus::Running);
        self.data.mark_race_start();
        Ok(())
    }

    /// Watches the field at the GUI cadence until the first car finishes,
    /// then raises the race-wide flag. Returns None when the race was
    /// stopped externally.
    fn supervise(&self) -> Option<Arc<Car>> {
        loop {
            if self.stopped() {
                return None;
            }
            thread::sleep(self.data.scaled(self.config.gui_update_interval_ms));
            self.data.block_while_paused(self.data.finished_flag());

            self.logger.event(RaceEvent::StandingsChanged);

            if self.data.race_finished() {
                // abort came from outside
                return None;
            }

            if let Some(winner) = self.data.cars.iter().find(|c| c.is_finished()) {
                self.logger.info(&format!(
                    "LEADER FINISHED: {} - race over for the whole field",
                    winner.driver.initials
                ));
                self.data.raise_race_finished();
                return Some(Arc::clone(winner));
            }
        }
    }

    /// Sorts the field by the live ordering and appends one result record
    /// per car, gaps measured against the leader's accumulated time.
    fn compile_results(&self) {
        self.logger.info("Compiling final classification...");

        let order = self.data.race_order();
        let leader_total = order.first().map(|c| c.total_time_ms()).unwrap_or(0);

        for (idx, car) in order.iter().enumerate() {
            let gap_ms = car.total_time_ms().saturating_sub(leader_total);
            let team = self.data.team(car.team_id);

            let entry = ResultEntry {
                position: idx + 1,
                car_no: car.car_no,
                driver_name: car.driver.name.clone(),
                driver_initials: car.driver.initials.clone(),
                team_name: team.name.clone(),
                total_time_ms: car.total_time_ms(),
                best_lap_ms: car.best_lap_ms(),
                pit_stops: car.pit_stop_count(),
                gap_to_leader_ms: gap_ms,
            };

            self.logger.info(&format!(
                "P{}: {} ({}) - {}",
                entry.position,
                entry.driver_name,
                entry.team_name,
                format_gap_ms(entry.gap_to_leader_ms)
            ));

            self.data.push_result(entry);
        }

        self.logger.event(RaceEvent::RaceFinished(self.data.results()));
    }
}
