use crate::sync::chicane::ChicaneAccess;
use crate::sync::Interrupted;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

pub const ENTRY_CAPACITY: usize = 3;
pub const EXIT_CAPACITY: usize = 3;

/// Kontrola dostępu do alei serwisowej: osobne, sprawiedliwe semafory dla
/// wjazdu i wyjazdu plus licznik aut aktualnie w alei. Semafory są
/// niezależne: auto opuszczające aleję nie czeka na zapchany wjazd.
pub struct PitLaneController {
    entry: ChicaneAccess,
    exit: ChicaneAccess,
    cars_in_lane: AtomicUsize,
}

impl PitLaneController {
    pub fn new(entry_segment: usize, exit_segment: usize) -> PitLaneController {
        PitLaneController::with_capacities(entry_segment, exit_segment, ENTRY_CAPACITY, EXIT_CAPACITY)
    }

    pub fn with_capacities(
        entry_segment: usize,
        exit_segment: usize,
        entry_capacity: usize,
        exit_capacity: usize,
    ) -> PitLaneController {
        PitLaneController {
            entry: ChicaneAccess::new(entry_segment, "Pit entry", entry_capacity),
            exit: ChicaneAccess::new(exit_segment, "Pit exit", exit_capacity),
            cars_in_lane: AtomicUsize::new(0),
        }
    }

    /// Blocks until an entry slot is free, then counts the car into the lane.
    pub fn request_entry(&self, car_no: u32, stop: &AtomicBool) -> Result<(), Interrupted> {
        self.entry.acquire(car_no, stop)?;
        self.cars_in_lane.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Bounded-wait entry; counts the car in only on success.
    pub fn request_entry_for(&self, car_no: u32, timeout: Duration) -> bool {
        if self.entry.try_acquire_for(car_no, timeout) {
            self.cars_in_lane.fetch_add(1, Ordering::AcqRel);
            true
        } else {
            false
        }
    }

    /// Frees the entry slot once the car has cleared the entry segment.
    pub fn complete_entry(&self, car_no: u32) {
        self.entry.release(car_no);
    }

    pub fn request_exit(&self, car_no: u32, stop: &AtomicBool) -> Result<(), Interrupted> {
        self.exit.acquire(car_no, stop)
    }

    /// Frees the exit slot and counts the car out of the lane.
    pub fn complete_exit(&self, car_no: u32) {
        self.exit.release(car_no);
        self.cars_in_lane.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn cars_in_lane(&self) -> usize {
        self.cars_in_lane.load(Ordering::Acquire)
    }

    pub fn free_entry_slots(&self) -> usize {
        self.entry.available()
    }

    pub fn free_exit_slots(&self) -> usize {
        self.exit.available()
    }

    pub fn entry_full(&self) -> bool {
        self.entry.available() == 0
    }

    pub fn exit_full(&self) -> bool {
        self.exit.available() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lane_counter_follows_entry_and_exit() {
        let lane = PitLaneController::new(15, 17);
        let stop = AtomicBool::new(false);

        lane.request_entry(1, &stop).unwrap();
        lane.complete_entry(1);
        assert_eq!(lane.cars_in_lane(), 1);

        lane.request_exit(1, &stop).unwrap();
        lane.complete_exit(1);
        assert_eq!(lane.cars_in_lane(), 0);
    }

    #[test]
    fn exit_is_independent_of_saturated_entry() {
        let lane = PitLaneController::new(15, 17);
        let stop = AtomicBool::new(false);

        // saturate the entry
        for car in 1..=3 {
            lane.request_entry(car, &stop).unwrap();
        }
        assert!(lane.entry_full());

        // a car already in the lane can still leave
        lane.request_exit(9, &stop).unwrap();
        assert_eq!(lane.free_exit_slots(), EXIT_CAPACITY - 1);
        lane.complete_exit(9);

        for car in 1..=3 {
            lane.complete_entry(car);
        }
    }
}
