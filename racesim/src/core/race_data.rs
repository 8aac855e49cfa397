use crate::core::car::Car;
use crate::core::roster::{Roster, Team};
use crate::core::tireset::TireCompound;
use crate::core::track::Track;
use crate::post::race_result::ResultEntry;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Race lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceStatus {
    Preparing,
    StartPhase,
    Running,
    Paused,
    Aborted,
    Finished,
}

impl RaceStatus {
    pub fn as_u8(&self) -> u8 {
        match self {
            RaceStatus::Preparing => 0,
            RaceStatus::StartPhase => 1,
            RaceStatus::Running => 2,
            RaceStatus::Paused => 3,
            RaceStatus::Aborted => 4,
            RaceStatus::Finished => 5,
        }
    }

    pub fn from_u8(value: u8) -> RaceStatus {
        match value {
            0 => RaceStatus::Preparing,
            1 => RaceStatus::StartPhase,
            2 => RaceStatus::Running,
            3 => RaceStatus::Paused,
            4 => RaceStatus::Aborted,
            5 => RaceStatus::Finished,
            other => panic!("Unknown race status code {}!", other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RaceStatus::Preparing => "Preparing",
            RaceStatus::StartPhase => "Start phase",
            RaceStatus::Running => "Running",
            RaceStatus::Paused => "Paused",
            RaceStatus::Aborted => "Aborted",
            RaceStatus::Finished => "Finished",
        }
    }
}

/// One completed lap, appended to the shared lap log.
#[derive(Debug, Clone)]
pub struct LapRecord {
    pub car_no: u32,
    pub lap: u32,
    pub time_ms: u64,
    pub compound: TireCompound,
    pub tire_wear_pct: f64,
}

pub const DEFAULT_LAP_COUNT: u32 = 30;
pub const MIN_LAP_COUNT: u32 = 20;
pub const MAX_LAP_COUNT: u32 = 50;

const PAUSE_WAIT_SLICE: Duration = Duration::from_millis(50);

/// Centralny, współdzielony stan wyścigu. Tory, zespoły i bolidy są
/// niemutowalne po zbudowaniu; pola statusu publikowane są atomowo, a listy
/// okrążeń i wyników tylko dopisywane.
#[derive(Debug)]
pub struct RaceData {
    pub track: Track,
    pub teams: Vec<Team>,
    pub cars: Vec<Arc<Car>>,

    status: AtomicU8,
    race_finished: AtomicBool,
    total_laps: AtomicU32,
    sim_speed_bits: AtomicU64,
    start_time: Mutex<Option<Instant>>,

    // pause gate: workers block here at safe points while status == Paused
    pause_lock: Mutex<()>,
    pause_cv: Condvar,

    lap_log: Mutex<Vec<LapRecord>>,
    results: Mutex<Vec<ResultEntry>>,
}

impl RaceData {
    pub fn new(track: Track, roster: Roster) -> RaceData {
        RaceData {
            track,
            teams: roster.teams,
            cars: roster.cars,
            status: AtomicU8::new(RaceStatus::Preparing.as_u8()),
            race_finished: AtomicBool::new(false),
            total_laps: AtomicU32::new(DEFAULT_LAP_COUNT),
            sim_speed_bits: AtomicU64::new(1f64.to_bits()),
            start_time: Mutex::new(None),
            pause_lock: Mutex::new(()),
            pause_cv: Condvar::new(),
            lap_log: Mutex::new(Vec::new()),
            results: Mutex::new(Vec::new()),
        }
    }

    /// The default setup: the Nürburgring ring and the full 20-car field.
    pub fn standard() -> RaceData {
        RaceData::new(Track::nuerburgring(), Roster::standard())
    }

    // ---------------------------------------------------------------------
    // Status, speed, laps
    // ---------------------------------------------------------------------

    pub fn status(&self) -> RaceStatus {
        RaceStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Changes the race status. Leaving `Paused` wakes every worker parked
    /// at the pause gate.
    pub fn set_status(&self, status: RaceStatus) {
        let was_paused = self.status() == RaceStatus::Paused;
        self.status.store(status.as_u8(), Ordering::Release);
        if was_paused && status != RaceStatus::Paused {
            let _guard = self.pause_lock.lock().unwrap();
            self.pause_cv.notify_all();
        }
    }

    /// Blocks while the race is paused. Safe point for every worker; returns
    /// immediately when the race is not paused. The stop flag breaks the
    /// wait so shutdown also reaches paused workers.
    pub fn block_while_paused(&self, stop: &AtomicBool) {
        if self.status() != RaceStatus::Paused {
            return;
        }
        let mut guard = self.pause_lock.lock().unwrap();
        while self.status() == RaceStatus::Paused && !stop.load(Ordering::Acquire) {
            let (g, _) = self.pause_cv.wait_timeout(guard, PAUSE_WAIT_SLICE).unwrap();
            guard = g;
        }
    }

    pub fn race_finished(&self) -> bool {
        self.race_finished.load(Ordering::Acquire)
    }

    /// Raises the race-wide finished flag; every worker observes it at its
    /// next safe point.
    pub fn raise_race_finished(&self) {
        self.race_finished.store(true, Ordering::Release);
    }

    /// The flag itself, for primitives that poll it while blocked.
    pub fn finished_flag(&self) -> &AtomicBool {
        &self.race_finished
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps.load(Ordering::Acquire)
    }

    /// Plain store; range validation happens in the controller.
    pub fn set_total_laps(&self, laps: u32) {
        self.total_laps.store(laps, Ordering::Release);
    }

    pub fn sim_speed(&self) -> f64 {
        f64::from_bits(self.sim_speed_bits.load(Ordering::Acquire))
    }

    pub fn set_sim_speed(&self, factor: f64) {
        if factor <= 0.0 {
            panic!("Simulation speed must be > 0, got {:.3}!", factor)
        }
        self.sim_speed_bits.store(factor.to_bits(), Ordering::Release);
    }

    /// Scales a base duration by the current simulation speed.
    pub fn scaled(&self, base_ms: u64) -> Duration {
        helpers::general::scale_time(base_ms, self.sim_speed())
    }

    pub fn mark_race_start(&self) {
        *self.start_time.lock().unwrap() = Some(Instant::now());
    }

    pub fn race_start(&self) -> Option<Instant> {
        *self.start_time.lock().unwrap()
    }

    // ---------------------------------------------------------------------
    // Live ordering
    // ---------------------------------------------------------------------

    /// Current leaderboard, leader first. Reads each car's published fields
    /// without locking; a worker mid-update between segment id and progress
    /// only causes bounded staleness. `total_cmp` keeps the order total.
    pub fn race_order(&self) -> Vec<Arc<Car>> {
        let mut order: Vec<Arc<Car>> = self.cars.to_vec();
        order.sort_by(|a, b| {
            b.completed_laps()
                .cmp(&a.completed_laps())
                .then_with(|| b.current_segment().cmp(&a.current_segment()))
                .then_with(|| b.progress().total_cmp(&a.progress()))
        });
        order
    }

    /// Gap of a car to the current leader, from accumulated lap times.
    pub fn gap_to_leader_ms(&self, car: &Car) -> u64 {
        let order = self.race_order();
        match order.first() {
            Some(leader) if leader.car_no != car.car_no => {
                car.total_time_ms().saturating_sub(leader.total_time_ms())
            }
            _ => 0,
        }
    }

    // ---------------------------------------------------------------------
    // Append-only logs
    // ---------------------------------------------------------------------

    pub fn add_lap_record(&self, record: LapRecord) {
        self.lap_log.lock().unwrap().push(record);
    }

    pub fn lap_log(&self) -> Vec<LapRecord> {
        self.lap_log.lock().unwrap().clone()
    }

    pub fn push_result(&self, entry: ResultEntry) {
        self.results.lock().unwrap().push(entry);
    }

    pub fn results(&self) -> Vec<ResultEntry> {
        self.results.lock().unwrap().clone()
    }

    // ---------------------------------------------------------------------
    // Reset
    // ---------------------------------------------------------------------

    /// Przygotowanie nowego wyścigu: wszystkie bolidy wracają na pola
    /// startowe z losowymi mieszankami, listy są czyszczone.
    pub fn reset(&self) {
        let mut rng = rand::thread_rng();
        for car in &self.cars {
            car.reset(crate::core::roster::random_starting_compound(&mut rng));
        }
        self.lap_log.lock().unwrap().clear();
        self.results.lock().unwrap().clear();
        self.race_finished.store(false, Ordering::Release);
        self.set_status(RaceStatus::Preparing);
        *self.start_time.lock().unwrap() = None;
    }

    pub fn team(&self, team_id: usize) -> &Team {
        match self.teams.get(team_id) {
            Some(team) => team,
            None => panic!("Unknown team id {}!", team_id),
        }
    }

    pub fn team_cars(&self, team_id: usize) -> Vec<Arc<Car>> {
        self.cars
            .iter()
            .filter(|c| c.team_id == team_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_key_ranks_laps_then_segment_then_progress() {
        let data = RaceData::standard();
        let a = &data.cars[0];
        let b = &data.cars[1];
        let c = &data.cars[2];

        a.begin_lap();
        a.close_lap(20_000); // 1 completed lap
        b.set_current_segment(5);
        b.set_progress(0.2);
        c.set_current_segment(5);
        c.set_progress(0.9);

        let order = data.race_order();
        assert_eq!(order[0].car_no, a.car_no);
        assert_eq!(order[1].car_no, c.car_no);
        assert_eq!(order[2].car_no, b.car_no);
    }

    #[test]
    fn gap_to_leader_is_zero_for_leader() {
        let data = RaceData::standard();
        let leader = &data.cars[0];
        leader.begin_lap();
        leader.close_lap(20_000);
        assert_eq!(data.gap_to_leader_ms(leader), 0);
    }

    #[test]
    fn reset_clears_logs_and_flags() {
        let data = RaceData::standard();
        data.add_lap_record(LapRecord {
            car_no: 1,
            lap: 1,
            time_ms: 20_000,
            compound: TireCompound::Soft,
            tire_wear_pct: 3.0,
        });
        data.raise_race_finished();
        data.set_status(RaceStatus::Finished);
        data.reset();
        assert!(data.lap_log().is_empty());
        assert!(data.results().is_empty());
        assert!(!data.race_finished());
        assert_eq!(data.status(), RaceStatus::Preparing);
    }

    #[test]
    fn pause_gate_releases_on_resume() {
        use std::sync::atomic::AtomicBool;
        use std::thread;

        let data = Arc::new(RaceData::standard());
        data.set_status(RaceStatus::Paused);
        let stop = Arc::new(AtomicBool::new(false));

        let d = Arc::clone(&data);
        let s = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            d.block_while_paused(&s);
        });

        thread::sleep(Duration::from_millis(100));
        assert!(!handle.is_finished());
        data.set_status(RaceStatus::Running);
        handle.join().unwrap();
    }
}
