use crate::core::driver::Driver;
use crate::core::tireset::{TireCompound, Tireset};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Mutex;

/// Stan bolidu widoczny dla innych wątków (tabela wyników, strateg, dyrektor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarStatus {
    Grid,
    Running,
    WaitingForSegment,
    InCriticalZone,
    InOvertakeZone,
    EnteringPit,
    InBox,
    LeavingPit,
    Finished,
    /// Reserved: present in the model, never set by the simulation.
    Retired,
}

impl CarStatus {
    pub fn as_u8(&self) -> u8 {
        match self {
            CarStatus::Grid => 0,
            CarStatus::Running => 1,
            CarStatus::WaitingForSegment => 2,
            CarStatus::InCriticalZone => 3,
            CarStatus::InOvertakeZone => 4,
            CarStatus::EnteringPit => 5,
            CarStatus::InBox => 6,
            CarStatus::LeavingPit => 7,
            CarStatus::Finished => 8,
            CarStatus::Retired => 9,
        }
    }

    pub fn from_u8(value: u8) -> CarStatus {
        match value {
            0 => CarStatus::Grid,
            1 => CarStatus::Running,
            2 => CarStatus::WaitingForSegment,
            3 => CarStatus::InCriticalZone,
            4 => CarStatus::InOvertakeZone,
            5 => CarStatus::EnteringPit,
            6 => CarStatus::InBox,
            7 => CarStatus::LeavingPit,
            8 => CarStatus::Finished,
            9 => CarStatus::Retired,
            other => panic!("Unknown car status code {}!", other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CarStatus::Grid => "On the grid",
            CarStatus::Running => "Running",
            CarStatus::WaitingForSegment => "Waiting for segment",
            CarStatus::InCriticalZone => "In critical zone",
            CarStatus::InOvertakeZone => "In overtake zone",
            CarStatus::EnteringPit => "Entering pit",
            CarStatus::InBox => "In box",
            CarStatus::LeavingPit => "Leaving pit",
            CarStatus::Finished => "Finished",
            CarStatus::Retired => "Retired",
        }
    }

    pub fn is_in_pit(&self) -> bool {
        matches!(self, CarStatus::EnteringPit | CarStatus::InBox | CarStatus::LeavingPit)
    }
}

// Pit-request cell: 0 = no request, otherwise compound code + 1. A single
// atomic carries the (flag, compound) pair so the pair is published together.
const PIT_REQUEST_NONE: u8 = 0;

fn store_f64(cell: &AtomicU64, value: f64) {
    cell.store(value.to_bits(), Ordering::Release);
}

fn load_f64(cell: &AtomicU64) -> f64 {
    f64::from_bits(cell.load(Ordering::Acquire))
}

/// A race car. The worker thread owning the car is the only writer of the
/// published fields; other threads read them through the accessors below and
/// write only through the documented channels (pit request, nothing else).
#[derive(Debug)]
pub struct Car {
    pub car_no: u32,
    pub team_id: usize,
    pub driver: Driver,

    status: AtomicU8,
    current_segment: AtomicU64,
    progress: AtomicU64,
    current_lap: AtomicU32,
    completed_laps: AtomicU32,
    pit_stops: AtomicU32,
    mandatory_pit_done: AtomicBool,
    finished: AtomicBool,
    pit_request: AtomicU8,
    grid_position: AtomicU32,

    tires: Mutex<Tireset>,

    last_lap_ms: AtomicU64,
    best_lap_ms: AtomicU64,
    total_time_ms: AtomicU64,
}

impl Car {
    pub fn new(car_no: u32, team_id: usize, driver: Driver, compound: TireCompound) -> Car {
        if car_no == 0 || car_no > 99 {
            panic!("Car number must be in [1, 99], got {}!", car_no)
        }
        Car {
            car_no,
            team_id,
            driver,
            status: AtomicU8::new(CarStatus::Grid.as_u8()),
            current_segment: AtomicU64::new(0),
            progress: AtomicU64::new(0f64.to_bits()),
            current_lap: AtomicU32::new(0),
            completed_laps: AtomicU32::new(0),
            pit_stops: AtomicU32::new(0),
            mandatory_pit_done: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            pit_request: AtomicU8::new(PIT_REQUEST_NONE),
            grid_position: AtomicU32::new(0),
            tires: Mutex::new(Tireset::new(compound)),
            last_lap_ms: AtomicU64::new(0),
            best_lap_ms: AtomicU64::new(u64::MAX),
            total_time_ms: AtomicU64::new(0),
        }
    }

    // ---------------------------------------------------------------------
    // Published fields (owner writes, everyone reads)
    // ---------------------------------------------------------------------

    pub fn status(&self) -> CarStatus {
        CarStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    pub fn set_status(&self, status: CarStatus) {
        self.status.store(status.as_u8(), Ordering::Release);
    }

    pub fn current_segment(&self) -> usize {
        self.current_segment.load(Ordering::Acquire) as usize
    }

    pub fn set_current_segment(&self, id: usize) {
        self.current_segment.store(id as u64, Ordering::Release);
    }

    pub fn progress(&self) -> f64 {
        load_f64(&self.progress)
    }

    /// Progress updates from the worker are clamped to [0, 1]; the grid
    /// placement uses `place_on_grid` instead and may be negative.
    pub fn set_progress(&self, progress: f64) {
        store_f64(&self.progress, progress.clamp(0.0, 1.0));
    }

    /// Rozstawienie na polach startowych: ujemny postęp za linią startu.
    pub fn place_on_grid(&self, position: u32, progress: f64) {
        self.grid_position.store(position, Ordering::Release);
        store_f64(&self.progress, progress.max(-0.5));
    }

    pub fn grid_position(&self) -> u32 {
        self.grid_position.load(Ordering::Acquire)
    }

    pub fn current_lap(&self) -> u32 {
        self.current_lap.load(Ordering::Acquire)
    }

    pub fn completed_laps(&self) -> u32 {
        self.completed_laps.load(Ordering::Acquire)
    }

    pub fn pit_stop_count(&self) -> u32 {
        self.pit_stops.load(Ordering::Acquire)
    }

    pub fn mandatory_pit_done(&self) -> bool {
        self.mandatory_pit_done.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub fn set_finished(&self) {
        self.set_status(CarStatus::Finished);
        self.finished.store(true, Ordering::Release);
    }

    // ---------------------------------------------------------------------
    // Laps and timing
    // ---------------------------------------------------------------------

    /// Starts the next lap. The first call moves the car from lap 0 to lap 1.
    pub fn begin_lap(&self) {
        self.current_lap.fetch_add(1, Ordering::AcqRel);
    }

    /// Publishes the timing of a completed lap and bumps the lap counters.
    pub fn close_lap(&self, lap_time_ms: u64) {
        self.last_lap_ms.store(lap_time_ms, Ordering::Release);
        let best = self.best_lap_ms.load(Ordering::Acquire);
        if lap_time_ms < best {
            self.best_lap_ms.store(lap_time_ms, Ordering::Release);
        }
        self.total_time_ms.fetch_add(lap_time_ms, Ordering::AcqRel);
        self.completed_laps.fetch_add(1, Ordering::AcqRel);
    }

    pub fn last_lap_ms(&self) -> u64 {
        self.last_lap_ms.load(Ordering::Acquire)
    }

    pub fn best_lap_ms(&self) -> u64 {
        let best = self.best_lap_ms.load(Ordering::Acquire);
        if best == u64::MAX {
            0
        } else {
            best
        }
    }

    pub fn total_time_ms(&self) -> u64 {
        self.total_time_ms.load(Ordering::Acquire)
    }

    // ---------------------------------------------------------------------
    // Tires
    // ---------------------------------------------------------------------

    /// Snapshot of the mounted tire set.
    pub fn tires(&self) -> Tireset {
        *self.tires.lock().unwrap()
    }

    /// Dodaje zużycie po przejechanym odcinku.
    pub fn wear_tires(&self) {
        self.tires.lock().unwrap().add_wear();
    }

    /// Mounts a fresh set, counts the stop and satisfies the mandatory-stop
    /// rule.
    pub fn fit_fresh_tires(&self, compound: TireCompound) {
        *self.tires.lock().unwrap() = Tireset::new(compound);
        self.pit_stops.fetch_add(1, Ordering::AcqRel);
        self.mandatory_pit_done.store(true, Ordering::Release);
    }

    /// Current speed factor: tire condition plus a driver bonus.
    pub fn speed_factor(&self) -> f64 {
        self.tires().speed_factor() + 0.1 * self.driver.skill_factor()
    }

    // ---------------------------------------------------------------------
    // Pit request (strategist writes, car worker reads-and-clears)
    // ---------------------------------------------------------------------

    /// Posts a pit request. Returns false when a request is already pending;
    /// the pending request is never overwritten (single-writer cell).
    pub fn request_pit(&self, compound: TireCompound) -> bool {
        self.pit_request
            .compare_exchange(
                PIT_REQUEST_NONE,
                compound.as_u8() + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    pub fn pit_requested(&self) -> bool {
        self.pit_request.load(Ordering::Acquire) != PIT_REQUEST_NONE
    }

    pub fn requested_compound(&self) -> Option<TireCompound> {
        match self.pit_request.load(Ordering::Acquire) {
            PIT_REQUEST_NONE => None,
            code => Some(TireCompound::from_u8(code - 1)),
        }
    }

    /// Consumes the pending request. Only the car's own worker calls this.
    pub fn take_pit_request(&self) -> Option<TireCompound> {
        match self.pit_request.swap(PIT_REQUEST_NONE, Ordering::AcqRel) {
            PIT_REQUEST_NONE => None,
            code => Some(TireCompound::from_u8(code - 1)),
        }
    }

    // ---------------------------------------------------------------------
    // Reset
    // ---------------------------------------------------------------------

    /// Powrót do stanu startowego przed nowym wyścigiem.
    pub fn reset(&self, starting_compound: TireCompound) {
        self.set_status(CarStatus::Grid);
        self.current_segment.store(0, Ordering::Release);
        store_f64(&self.progress, 0.0);
        self.current_lap.store(0, Ordering::Release);
        self.completed_laps.store(0, Ordering::Release);
        self.pit_stops.store(0, Ordering::Release);
        self.mandatory_pit_done.store(false, Ordering::Release);
        self.finished.store(false, Ordering::Release);
        self.pit_request.store(PIT_REQUEST_NONE, Ordering::Release);
        self.grid_position.store(0, Ordering::Release);
        *self.tires.lock().unwrap() = Tireset::new(starting_compound);
        self.last_lap_ms.store(0, Ordering::Release);
        self.best_lap_ms.store(u64::MAX, Ordering::Release);
        self.total_time_ms.store(0, Ordering::Release);
    }
}

impl std::fmt::Display for Car {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} ({})", self.car_no, self.driver.name, self.driver.initials)
    }
}
