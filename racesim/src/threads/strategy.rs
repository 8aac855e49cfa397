use crate::core::car::Car;
use crate::core::race_data::{RaceData, RaceStatus};
use crate::core::roster::Team;
use crate::interfaces::gui_interface::RaceLogger;
use crate::pre::sim_config::SimConfig;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Próg zużycia, przy którym obowiązkowy pit stop jest brany wcześniej niż
/// w ostatniej możliwej rundzie.
const OPPORTUNISTIC_WEAR_PCT: f64 = 60.0;

/// Strateg zespołu: obserwuje oba bolidy i wystawia im żądania pit stopu
/// przez atomowy kanał (flaga + mieszanka). To jedyny zapis z zewnątrz do
/// stanu bolidu.
pub struct TeamStrategist {
    team: Team,
    cars: Vec<Arc<Car>>,
    data: Arc<RaceData>,
    config: SimConfig,
    logger: RaceLogger,
    running: Arc<AtomicBool>,
}

impl TeamStrategist {
    pub fn new(
        team: Team,
        cars: Vec<Arc<Car>>,
        data: Arc<RaceData>,
        config: SimConfig,
        logger: RaceLogger,
        running: Arc<AtomicBool>,
    ) -> TeamStrategist {
        TeamStrategist {
            team,
            cars,
            data,
            config,
            logger,
            running,
        }
    }

    fn stopped(&self) -> bool {
        !self.running.load(Ordering::Acquire) || self.data.race_finished()
    }

    /// Thread entry point: wait for the race to run, then poll both cars at
    /// the strategist interval.
    pub fn run(self) {
        self.logger
            .debug(&format!("Strategist {} started", self.team.name));

        // hold off until the field is released
        while !self.stopped() && !matches!(self.data.status(), RaceStatus::Running | RaceStatus::Paused)
        {
            thread::sleep(Duration::from_millis(self.config.ready_poll_interval_ms));
        }

        while !self.stopped() {
            for car in &self.cars {
                self.evaluate_car(car);
            }
            thread::sleep(self.data.scaled(self.config.strategy_interval_ms));
            self.data.block_while_paused(self.data.finished_flag());
        }

        self.logger
            .debug(&format!("Strategist {} finished", self.team.name));
    }

    /// One strategy pass for a single car. Public so a view can display the
    /// would-be recommendation; the decision rules are:
    /// mandatory window (last chance, or opportunistic at 60 % wear) and
    /// critical wear outside it.
    pub fn evaluate_car(&self, car: &Car) {
        if car.is_finished() || car.pit_requested() || car.status().is_in_pit() {
            return;
        }

        let lap = car.current_lap();
        if lap == 0 {
            return;
        }
        let total = self.data.total_laps();
        let remaining = total.saturating_sub(lap);
        let tires = car.tires();

        let mut reason: Option<String> = None;

        if !car.mandatory_pit_done() && self.config.is_in_pit_window(lap, total) {
            if remaining <= self.config.mandatory_pit_laps_before_end {
                reason = Some("mandatory stop (last chance)".to_string());
            } else if tires.wear_pct >= OPPORTUNISTIC_WEAR_PCT {
                reason = Some(format!("mandatory stop (tires at {:.0}%)", tires.wear_pct));
            }
        }

        if reason.is_none() && tires.wear_pct >= self.config.critical_tire_wear_pct && remaining > 2
        {
            reason = Some(format!("critical tire wear ({:.0}%)", tires.wear_pct));
        }

        if let Some(reason) = reason {
            let compound = self.config.compound_for_remaining_laps(remaining);
            if car.request_pit(compound) {
                self.logger.info(&format!(
                    "STRATEGY {}: {} -> pit stop requested, {}, new tires: {}",
                    self.team.name,
                    car.driver.initials,
                    reason,
                    compound.label()
                ));
            }
        }
    }
}
