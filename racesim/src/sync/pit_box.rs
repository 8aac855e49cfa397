use crate::core::tireset::TireCompound;
use crate::sync::{Interrupted, WAIT_SLICE};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct BoxState {
    current_car: Option<u32>,
    service_requested: bool,
    service_in_progress: bool,
    service_done: bool,
    chosen_compound: Option<TireCompound>,
}

/// Przekazanie auto→ekipa w boksie zespołu: mutex plus dwie zmienne
/// warunkowe. Auto jest producentem zgłoszenia serwisu, ekipa konsumentem.
///
/// Protocol: the car binds itself to the box, raises `service_requested` and
/// signals `car_arrived`; the crew wakes, marks `service_in_progress`, works
/// outside the lock, then sets `service_done` and signals
/// `service_complete`; the car observes `done` and clears all fields.
/// At most one car is resident per box; a teammate arriving while the box
/// is occupied waits until the resident car has cleared its fields.
pub struct PitBoxAccess {
    team_name: String,
    state: Mutex<BoxState>,
    car_arrived: Condvar,
    service_complete: Condvar,
}

impl PitBoxAccess {
    pub fn new(team_name: &str) -> PitBoxAccess {
        PitBoxAccess {
            team_name: team_name.to_owned(),
            state: Mutex::new(BoxState::default()),
            car_arrived: Condvar::new(),
            service_complete: Condvar::new(),
        }
    }

    /// Car side: drives into the box and blocks until the tire service is
    /// complete. Exactly one matching `finish_service` happens per call that
    /// returns `Ok`.
    pub fn perform_stop(
        &self,
        car_no: u32,
        compound: TireCompound,
        stop: &AtomicBool,
    ) -> Result<(), Interrupted> {
        let mut state = self.state.lock().unwrap();

        // wait for the box to be free (the teammate may be in service)
        while state.current_car.is_some() {
            if stop.load(Ordering::Acquire) {
                return Err(Interrupted);
            }
            let (s, _) = self.service_complete.wait_timeout(state, WAIT_SLICE).unwrap();
            state = s;
        }

        state.current_car = Some(car_no);
        state.chosen_compound = Some(compound);
        state.service_requested = true;
        state.service_done = false;
        self.car_arrived.notify_all();

        while !state.service_done {
            if stop.load(Ordering::Acquire) && !state.service_in_progress {
                // not yet accepted by the crew: withdraw the request
                *state = BoxState::default();
                self.service_complete.notify_all();
                return Err(Interrupted);
            }
            let (s, _) = self.service_complete.wait_timeout(state, WAIT_SLICE).unwrap();
            state = s;
        }

        *state = BoxState::default();
        self.service_complete.notify_all();
        Ok(())
    }

    /// Crew side: waits until a car requests service, at most `timeout`.
    /// Returns the car and the requested compound, with the service marked
    /// as running. `None` on timeout lets the crew check for shutdown.
    pub fn wait_for_car(&self, timeout: Duration) -> Option<(u32, TireCompound)> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();

        while !state.service_requested {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let remaining = (deadline - now).min(WAIT_SLICE);
            let (s, _) = self.car_arrived.wait_timeout(state, remaining).unwrap();
            state = s;
        }

        state.service_requested = false;
        state.service_in_progress = true;
        let car = state.current_car.expect("service requested without a car");
        let compound = state.chosen_compound.unwrap_or(TireCompound::Medium);
        Some((car, compound))
    }

    /// Crew side: marks the service complete and wakes the waiting car.
    /// Calling this without a running service is a protocol violation.
    pub fn finish_service(&self) {
        let mut state = self.state.lock().unwrap();
        if !state.service_in_progress {
            panic!("finish_service on box '{}' without a running service!", self.team_name)
        }
        state.service_in_progress = false;
        state.service_done = true;
        self.service_complete.notify_all();
    }

    pub fn is_occupied(&self) -> bool {
        self.state.lock().unwrap().current_car.is_some()
    }

    pub fn current_car(&self) -> Option<u32> {
        self.state.lock().unwrap().current_car
    }

    pub fn service_running(&self) -> bool {
        self.state.lock().unwrap().service_in_progress
    }

    pub fn team_name(&self) -> &str {
        &self.team_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn handoff_completes_in_order() {
        let pit_box = Arc::new(PitBoxAccess::new("Ferrari"));
        let stop = Arc::new(AtomicBool::new(false));

        let b = Arc::clone(&pit_box);
        let crew = thread::spawn(move || {
            let (car, compound) = b.wait_for_car(Duration::from_secs(5)).unwrap();
            assert_eq!(car, 16);
            assert_eq!(compound, TireCompound::Hard);
            thread::sleep(Duration::from_millis(30));
            b.finish_service();
        });

        let b = Arc::clone(&pit_box);
        let s = Arc::clone(&stop);
        let car = thread::spawn(move || b.perform_stop(16, TireCompound::Hard, &s));

        assert_eq!(car.join().unwrap(), Ok(()));
        crew.join().unwrap();
        assert!(!pit_box.is_occupied());
    }

    #[test]
    fn wait_for_car_times_out_empty() {
        let pit_box = PitBoxAccess::new("Haas");
        let start = Instant::now();
        assert!(pit_box.wait_for_car(Duration::from_millis(80)).is_none());
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    #[should_panic]
    fn finish_service_without_request_is_fatal() {
        let pit_box = PitBoxAccess::new("Haas");
        pit_box.finish_service();
    }

    #[test]
    fn unaccepted_request_can_be_withdrawn() {
        let pit_box = Arc::new(PitBoxAccess::new("Williams"));
        let stop = Arc::new(AtomicBool::new(false));

        let b = Arc::clone(&pit_box);
        let s = Arc::clone(&stop);
        let car = thread::spawn(move || b.perform_stop(23, TireCompound::Soft, &s));

        while !pit_box.is_occupied() {
            thread::sleep(Duration::from_millis(5));
        }
        stop.store(true, Ordering::Release);
        assert_eq!(car.join().unwrap(), Err(Interrupted));
        assert!(!pit_box.is_occupied());
    }
}
