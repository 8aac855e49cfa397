use crate::sync::{Interrupted, WAIT_SLICE};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

pub const CHICANE_CAPACITY: usize = 2;

#[derive(Debug)]
struct SemaphoreState {
    permits: usize,
    waiters: VecDeque<u32>,
}

/// Sprawiedliwy semafor licznikowy dla szykan (domyślnie 2 miejsca) oraz
/// obu końców alei serwisowej (po 3 miejsca). Jawna kolejka oczekujących
/// gwarantuje FIFO: permit dostaje zawsze głowa kolejki.
///
/// Invariant: permits in flight + permits available == capacity.
/// Ownership of a permit is by convention; a car releases the permit it
/// acquired.
#[derive(Debug)]
pub struct ChicaneAccess {
    segment_id: usize,
    name: String,
    capacity: usize,
    state: Mutex<SemaphoreState>,
    cv: Condvar,
}

impl ChicaneAccess {
    pub fn new(segment_id: usize, name: &str, capacity: usize) -> ChicaneAccess {
        if capacity == 0 {
            panic!("Semaphore capacity must be > 0!")
        }
        ChicaneAccess {
            segment_id,
            name: name.to_owned(),
            capacity,
            state: Mutex::new(SemaphoreState {
                permits: capacity,
                waiters: VecDeque::new(),
            }),
            cv: Condvar::new(),
        }
    }

    /// Blocks until a permit is free and the caller is the queue head.
    pub fn acquire(&self, car_no: u32, stop: &AtomicBool) -> Result<(), Interrupted> {
        let mut state = self.state.lock().unwrap();
        state.waiters.push_back(car_no);

        while state.permits == 0 || state.waiters.front() != Some(&car_no) {
            if stop.load(Ordering::Acquire) {
                state.waiters.retain(|&c| c != car_no);
                self.cv.notify_all();
                return Err(Interrupted);
            }
            let (s, _) = self.cv.wait_timeout(state, WAIT_SLICE).unwrap();
            state = s;
        }

        state.waiters.pop_front();
        state.permits -= 1;
        if state.permits > 0 && !state.waiters.is_empty() {
            // a permit is still free: the next head must re-evaluate now
            self.cv.notify_all();
        }
        Ok(())
    }

    /// Zero-wait variant: succeeds only with an empty queue and a free
    /// permit (a queued car may not be overtaken at the entry).
    pub fn try_acquire(&self, _car_no: u32) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.permits > 0 && state.waiters.is_empty() {
            state.permits -= 1;
            true
        } else {
            false
        }
    }

    /// Bounded wait. On timeout the waiter removes itself from the queue and
    /// returns false; queue order is preserved for everyone behind it.
    pub fn try_acquire_for(&self, car_no: u32, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock().unwrap();
        state.waiters.push_back(car_no);

        while state.permits == 0 || state.waiters.front() != Some(&car_no) {
            let now = Instant::now();
            if now >= deadline {
                state.waiters.retain(|&c| c != car_no);
                self.cv.notify_all();
                return false;
            }
            let remaining = (deadline - now).min(WAIT_SLICE);
            let (s, _) = self.cv.wait_timeout(state, remaining).unwrap();
            state = s;
        }

        state.waiters.pop_front();
        state.permits -= 1;
        if state.permits > 0 && !state.waiters.is_empty() {
            self.cv.notify_all();
        }
        true
    }

    /// Returns a permit. All waiters are woken; only the queue head can pass
    /// its predicate, so admission order is unchanged. Releasing beyond the
    /// configured capacity is a protocol violation.
    pub fn release(&self, car_no: u32) {
        let mut state = self.state.lock().unwrap();
        if state.permits >= self.capacity {
            panic!(
                "Car #{} released '{}' without a matching acquire!",
                car_no, self.name
            )
        }
        state.permits += 1;
        self.cv.notify_all();
    }

    pub fn available(&self) -> usize {
        self.state.lock().unwrap().permits
    }

    pub fn waiting(&self) -> usize {
        self.state.lock().unwrap().waiters.len()
    }

    pub fn has_waiters(&self) -> bool {
        !self.state.lock().unwrap().waiters.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn segment_id(&self) -> usize {
        self.segment_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn no_stop() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn permits_are_conserved() {
        let chicane = ChicaneAccess::new(7, "Schumacher-S", 2);
        let stop = no_stop();
        assert_eq!(chicane.available(), 2);
        chicane.acquire(1, &stop).unwrap();
        chicane.acquire(2, &stop).unwrap();
        assert_eq!(chicane.available(), 0);
        chicane.release(1);
        chicane.release(2);
        assert_eq!(chicane.available(), 2);
    }

    #[test]
    #[should_panic]
    fn release_without_acquire_is_fatal() {
        let chicane = ChicaneAccess::new(7, "Schumacher-S", 2);
        chicane.release(1);
    }

    #[test]
    fn try_acquire_fails_when_saturated() {
        let chicane = ChicaneAccess::new(7, "Schumacher-S", 1);
        assert!(chicane.try_acquire(1));
        assert!(!chicane.try_acquire(2));
        chicane.release(1);
        assert!(chicane.try_acquire(2));
        chicane.release(2);
    }

    #[test]
    fn timed_acquire_expires_without_permit() {
        let chicane = ChicaneAccess::new(7, "Schumacher-S", 1);
        assert!(chicane.try_acquire(1));
        let start = Instant::now();
        assert!(!chicane.try_acquire_for(2, Duration::from_millis(120)));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(120));
        assert_eq!(chicane.waiting(), 0);
        chicane.release(1);
    }

    #[test]
    fn waiters_are_admitted_in_arrival_order() {
        let chicane = Arc::new(ChicaneAccess::new(7, "Schumacher-S", 1));
        let stop = no_stop();
        chicane.acquire(0, &stop).unwrap();

        let admitted = Arc::new(Mutex::new(Vec::new()));
        let mut handles = Vec::new();
        for car_no in 1..=4u32 {
            // stagger the arrivals so the queue order is deterministic
            while chicane.waiting() < (car_no - 1) as usize {
                thread::sleep(Duration::from_millis(2));
            }
            let c = Arc::clone(&chicane);
            let log = Arc::clone(&admitted);
            handles.push(thread::spawn(move || {
                let stop = no_stop();
                c.acquire(car_no, &stop).unwrap();
                log.lock().unwrap().push(car_no);
                c.release(car_no);
            }));
            thread::sleep(Duration::from_millis(10));
        }

        chicane.release(0);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*admitted.lock().unwrap(), vec![1, 2, 3, 4]);
    }
}
