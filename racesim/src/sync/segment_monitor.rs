use crate::sync::{Interrupted, WAIT_SLICE};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

#[derive(Debug)]
struct MonitorState {
    occupants: usize,
    waiters: VecDeque<u32>,
}

/// Monitor strzegący odcinka o ograniczonej pojemności (ciasne zakręty mają
/// pojemność 1). Wjazd wymaga wolnego miejsca ORAZ pierwszej pozycji w
/// kolejce; kolejność przyjęć jest ściśle FIFO względem kolejności
/// przybycia.
///
/// Waiters re-validate the predicate on every wake-up, so spurious wake-ups
/// and the broadcast in `leave` are harmless.
#[derive(Debug)]
pub struct SegmentMonitor {
    segment_id: usize,
    name: String,
    capacity: usize,
    state: Mutex<MonitorState>,
    cv: Condvar,
}

impl SegmentMonitor {
    pub fn new(segment_id: usize, name: &str, capacity: usize) -> SegmentMonitor {
        if capacity == 0 {
            panic!("Monitor capacity must be > 0!")
        }
        SegmentMonitor {
            segment_id,
            name: name.to_owned(),
            capacity,
            state: Mutex::new(MonitorState {
                occupants: 0,
                waiters: VecDeque::new(),
            }),
            cv: Condvar::new(),
        }
    }

    /// Blocks until the car is admitted. A cancelled waiter removes itself
    /// from the queue, wakes the remaining waiters (the next head must
    /// re-evaluate) and returns `Err(Interrupted)`.
    pub fn enter(&self, car_no: u32, stop: &AtomicBool) -> Result<(), Interrupted> {
        let mut state = self.state.lock().unwrap();
        state.waiters.push_back(car_no);

        while state.occupants >= self.capacity || state.waiters.front() != Some(&car_no) {
            if stop.load(Ordering::Acquire) {
                state.waiters.retain(|&c| c != car_no);
                self.cv.notify_all();
                return Err(Interrupted);
            }
            let (s, _) = self.cv.wait_timeout(state, WAIT_SLICE).unwrap();
            state = s;
        }

        state.waiters.pop_front();
        state.occupants += 1;
        if state.occupants < self.capacity && !state.waiters.is_empty() {
            // capacity remains: the next head must re-evaluate now
            self.cv.notify_all();
        }
        Ok(())
    }

    /// Releases the slot and wakes all waiters so the new queue head can
    /// re-evaluate its predicate. Calling `leave` on an empty segment is a
    /// protocol violation.
    pub fn leave(&self, car_no: u32) {
        let mut state = self.state.lock().unwrap();
        if state.occupants == 0 {
            panic!(
                "Car #{} left segment '{}' without a prior enter!",
                car_no, self.name
            )
        }
        state.occupants -= 1;
        self.cv.notify_all();
    }

    /// Non-blocking fast path: succeeds only when nobody is queued and
    /// capacity permits.
    pub fn try_enter(&self, _car_no: u32) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.occupants < self.capacity && state.waiters.is_empty() {
            state.occupants += 1;
            true
        } else {
            false
        }
    }

    pub fn occupants(&self) -> usize {
        self.state.lock().unwrap().occupants
    }

    pub fn waiting(&self) -> usize {
        self.state.lock().unwrap().waiters.len()
    }

    pub fn is_full(&self) -> bool {
        self.state.lock().unwrap().occupants >= self.capacity
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
    use std::time::Duration;

    fn no_stop() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn enter_leave_tracks_occupancy() {
        let monitor = SegmentMonitor::new(2, "Yokohama-S", 1);
        let stop = no_stop();
        monitor.enter(1, &stop).unwrap();
        assert_eq!(monitor.occupants(), 1);
        assert!(monitor.is_full());
        monitor.leave(1);
        assert_eq!(monitor.occupants(), 0);
    }

    #[test]
    #[should_panic]
    fn leave_without_enter_is_fatal() {
        let monitor = SegmentMonitor::new(2, "Yokohama-S", 1);
        monitor.leave(7);
    }

    #[test]
    fn try_enter_respects_waiting_queue() {
        let monitor = Arc::new(SegmentMonitor::new(2, "Yokohama-S", 1));
        let stop = no_stop();
        monitor.enter(1, &stop).unwrap();

        let m = Arc::clone(&monitor);
        let waiter = thread::spawn(move || {
            let stop = no_stop();
            m.enter(2, &stop).unwrap();
            m.leave(2);
        });

        // wait until car 2 is queued, then the fast path must fail even
        // after the slot frees up, because the queue is not empty
        while monitor.waiting() == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!monitor.try_enter(3));
        monitor.leave(1);
        waiter.join().unwrap();
        assert!(monitor.try_enter(3));
        monitor.leave(3);
    }

    #[test]
    fn cancelled_waiter_unblocks_and_leaves_queue() {
        let monitor = Arc::new(SegmentMonitor::new(2, "Yokohama-S", 1));
        let stop = no_stop();
        monitor.enter(1, &stop).unwrap();

        let m = Arc::clone(&monitor);
        let cancel = Arc::new(AtomicBool::new(false));
        let c = Arc::clone(&cancel);
        let waiter = thread::spawn(move || m.enter(2, &c));

        while monitor.waiting() == 0 {
            thread::sleep(Duration::from_millis(5));
        }
        cancel.store(true, Ordering::Release);
        assert_eq!(waiter.join().unwrap(), Err(Interrupted));
        assert_eq!(monitor.waiting(), 0);
        monitor.leave(1);
    }
}
