use crate::core::race_data::{RaceData, RaceStatus, MAX_LAP_COUNT, MIN_LAP_COUNT};
use crate::core::track::SegmentKind;
use crate::interfaces::gui_interface::{RaceEvent, RaceLogger};
use crate::pre::sim_config::SimConfig;
use crate::sync::chicane::ChicaneAccess;
use crate::sync::overtake::{OvertakeManager, OvertakeStats};
use crate::sync::pit_box::PitBoxAccess;
use crate::sync::pit_lane::PitLaneController;
use crate::sync::segment_monitor::SegmentMonitor;
use crate::sync::start_latch::StartLatch;
use crate::sync::TrackSync;
use crate::threads::car_worker::CarWorker;
use crate::threads::crew_worker::CrewWorker;
use crate::threads::director::RaceDirector;
use crate::threads::strategy::TeamStrategist;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// grid spacing in progress units on the start/finish segment
const GRID_ROW_GAP: f64 = 0.03;
const GRID_SIDE_GAP: f64 = 0.01;

/// Kontroler symulacji: buduje obiekty synchronizacyjne, startuje i kończy
/// wątki robocze oraz tłumaczy polecenia widoku na stan wyścigu. Wszystkie
/// polecenia są idempotentne.
pub struct RaceController {
    data: Arc<RaceData>,
    config: SimConfig,
    logger: RaceLogger,
    sync: Option<Arc<TrackSync>>,
    handles: Vec<JoinHandle<()>>,
    worker_flags: Vec<Arc<AtomicBool>>,
    initialised: bool,
    race_running: bool,
}

impl RaceController {
    /// Controller over the standard setup (Nürburgring, full 20-car field).
    pub fn new(config: SimConfig, tx: Option<flume::Sender<RaceEvent>>, debug: bool) -> RaceController {
        RaceController::with_data(RaceData::standard(), config, tx, debug)
    }

    /// Controller over a custom track/roster, used by tests and tools.
    pub fn with_data(
        data: RaceData,
        config: SimConfig,
        tx: Option<flume::Sender<RaceEvent>>,
        debug: bool,
    ) -> RaceController {
        let logger = RaceLogger::new(tx, debug);
        logger.debug("Race controller created");
        RaceController {
            data: Arc::new(data),
            config,
            logger,
            sync: None,
            handles: Vec::new(),
            worker_flags: Vec::new(),
            initialised: false,
            race_running: false,
        }
    }

    // ---------------------------------------------------------------------
    // View -> core commands
    // ---------------------------------------------------------------------

    /// Builds primitives and workers for a new race: resets the race data,
    /// draws a random grid and recreates every synchronization object
    /// (including a fresh start latch).
    pub fn initialise(&mut self) {
        if self.race_running {
            self.logger.warning("Cannot initialise while a race is running");
            return;
        }

        self.logger.info("Initialising race simulation...");
        self.data.reset();
        self.draw_random_grid();
        self.sync = Some(Arc::new(self.build_sync_objects()));
        self.initialised = true;
        self.logger.info("Initialisation complete");
    }

    /// Launches all workers: crews first, then strategists, car workers and
    /// finally the director.
    pub fn start_race(&mut self) {
        if !self.initialised {
            self.logger.warning("Race not initialised - call initialise first");
            return;
        }
        if self.race_running {
            self.logger.warning("Race is already running");
            return;
        }

        let sync = match &self.sync {
            Some(sync) => Arc::clone(sync),
            None => {
                self.logger.warning("Race not initialised - call initialise first");
                return;
            }
        };

        self.logger.info("=== STARTING RACE ===");
        self.logger.info(&format!("Track: {}", self.data.track.name));
        self.logger.info(&format!("Laps: {}", self.data.total_laps()));
        self.logger.info(&format!("Cars: {}", self.data.cars.len()));

        self.race_running = true;

        for team in &self.data.teams {
            let flag = Arc::new(AtomicBool::new(true));
            let worker = CrewWorker::new(
                team.clone(),
                sync.pit_box(team.id),
                Arc::clone(&self.data),
                self.config.clone(),
                self.logger.clone(),
                Arc::clone(&flag),
            );
            self.worker_flags.push(flag);
            self.handles.push(thread::spawn(move || worker.run()));
        }

        for team in &self.data.teams {
            let flag = Arc::new(AtomicBool::new(true));
            let worker = TeamStrategist::new(
                team.clone(),
                self.data.team_cars(team.id),
                Arc::clone(&self.data),
                self.config.clone(),
                self.logger.clone(),
                Arc::clone(&flag),
            );
            self.worker_flags.push(flag);
            self.handles.push(thread::spawn(move || worker.run()));
        }

        for car in &self.data.cars {
            let flag = Arc::new(AtomicBool::new(true));
            let worker = CarWorker::new(
                Arc::clone(car),
                Arc::clone(&self.data),
                Arc::clone(&sync),
                self.config.clone(),
                self.logger.clone(),
                Arc::clone(&flag),
            );
            self.worker_flags.push(flag);
            self.handles.push(thread::spawn(move || worker.run()));
        }

        let flag = Arc::new(AtomicBool::new(true));
        let director = RaceDirector::new(
            Arc::clone(&self.data),
            Arc::clone(&sync.start_latch),
            self.config.clone(),
            self.logger.clone(),
            Arc::clone(&flag),
        );
        self.worker_flags.push(flag);
        self.handles.push(thread::spawn(move || director.run()));

        self.logger.info("All workers launched - waiting for the start sequence...");
    }

    /// Pauses the race; workers block at their next safe point.
    pub fn pause(&mut self) {
        if !self.race_running || self.data.status() != RaceStatus::Running {
            return;
        }
        self.logger.info("=== RACE PAUSED ===");
        self.data.set_status(RaceStatus::Paused);
    }

    /// Resumes a paused race and wakes the pause gate.
    pub fn resume(&mut self) {
        if self.data.status() != RaceStatus::Paused {
            return;
        }
        self.logger.info("=== RACE RESUMED ===");
        self.data.set_status(RaceStatus::Running);
    }

    /// Aborts the race and joins every worker. Safe to call repeatedly and
    /// also after a natural finish (it then only cleans up the threads).
    pub fn stop_race(&mut self) {
        if self.handles.is_empty() && !self.initialised {
            return;
        }

        self.logger.info("=== STOPPING RACE ===");

        if self.data.status() != RaceStatus::Finished {
            self.data.set_status(RaceStatus::Aborted);
        }
        self.data.raise_race_finished();
        for flag in &self.worker_flags {
            flag.store(false, Ordering::Release);
        }

        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
        self.worker_flags.clear();

        self.race_running = false;
        self.initialised = false;
        self.logger.info("All workers stopped");
    }

    /// Sets the simulation speed; only the documented factors are accepted.
    pub fn set_simulation_speed(&mut self, factor: f64) {
        if !SimConfig::is_valid_speed_factor(factor) {
            self.logger
                .warning(&format!("Unsupported simulation speed {}x", factor));
            return;
        }
        self.data.set_sim_speed(factor);
        self.logger.info(&format!("Simulation speed: {}x", factor));
    }

    /// Sets the lap count; only before the start and within the documented
    /// range.
    pub fn set_lap_count(&mut self, laps: u32) {
        if self.race_running {
            self.logger.warning("Lap count cannot change during a race");
            return;
        }
        if !(MIN_LAP_COUNT..=MAX_LAP_COUNT).contains(&laps) {
            self.logger.warning(&format!(
                "Lap count must be between {} and {}",
                MIN_LAP_COUNT, MAX_LAP_COUNT
            ));
            return;
        }
        self.data.set_total_laps(laps);
        self.logger.info(&format!("Lap count: {}", laps));
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn race_data(&self) -> Arc<RaceData> {
        Arc::clone(&self.data)
    }

    pub fn overtake_stats(&self) -> Option<OvertakeStats> {
        self.sync.as_ref().map(|s| s.overtaking.stats())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn is_race_running(&self) -> bool {
        self.race_running
    }

    // ---------------------------------------------------------------------
    // Setup helpers
    // ---------------------------------------------------------------------

    /// Losowe ustawienie pól startowych: kolejność tasowana, bolidy
    /// rozstawione rzędami za linią startu.
    fn draw_random_grid(&self) {
        let mut order = self.data.cars.clone();
        match self.config.grid_seed {
            Some(seed) => order.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => order.shuffle(&mut rand::thread_rng()),
        }

        for (idx, car) in order.iter().enumerate() {
            let position = (idx + 1) as u32;
            let row = idx / 2;
            let mut progress = -(row as f64) * GRID_ROW_GAP;
            if idx % 2 == 1 {
                progress -= GRID_SIDE_GAP;
            }
            car.set_current_segment(0);
            car.place_on_grid(position, progress);
            self.logger.debug(&format!(
                "Grid position {}: {} (progress {:.2})",
                position, car.driver.initials, progress
            ));
        }

        self.logger.info("Random grid drawn");
    }

    /// Builds every synchronization object for the current track and field.
    fn build_sync_objects(&self) -> TrackSync {
        let mut monitors = HashMap::new();
        let mut chicanes = HashMap::new();

        for segment in &self.data.track.segments {
            match segment.kind {
                SegmentKind::TightCurve => {
                    monitors.insert(
                        segment.id,
                        Arc::new(SegmentMonitor::new(segment.id, &segment.name, segment.capacity)),
                    );
                    self.logger.debug(&format!("Monitor created for: {}", segment.name));
                }
                SegmentKind::Chicane => {
                    chicanes.insert(
                        segment.id,
                        Arc::new(ChicaneAccess::new(segment.id, &segment.name, segment.capacity)),
                    );
                    self.logger.debug(&format!("Chicane access created for: {}", segment.name));
                }
                _ => {}
            }
        }

        let pit_lane = match self.data.track.pit {
            Some(pit) => PitLaneController::new(pit.entry_id, pit.exit_id),
            None => PitLaneController::new(0, 0),
        };

        let pit_boxes = self
            .data
            .teams
            .iter()
            .map(|team| Arc::new(PitBoxAccess::new(&team.name)))
            .collect::<Vec<_>>();

        self.logger.info(&format!(
            "Synchronization objects created: {} monitors, {} chicanes, {} boxes",
            monitors.len(),
            chicanes.len(),
            pit_boxes.len()
        ));

        TrackSync {
            monitors,
            chicanes,
            pit_lane: Arc::new(pit_lane),
            pit_boxes,
            overtaking: Arc::new(OvertakeManager::new()),
            start_latch: Arc::new(StartLatch::new(self.data.cars.len())),
        }
    }
}

impl Drop for RaceController {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.stop_race();
        }
    }
}
