use crate::sync::{Interrupted, WAIT_SLICE};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

/// Jednorazowa zapora startowa. Wszystkie auta, które dotarły do
/// `await_release` przed zwolnieniem, ruszają jednocześnie; spóźnione
/// przechodzą bez blokowania. Reset = kontroler buduje nową zaporę na
/// kolejny wyścig.
pub struct StartLatch {
    expected: usize,
    ready: AtomicUsize,
    released: Mutex<bool>,
    cv: Condvar,
    released_fast: AtomicBool,
}

impl StartLatch {
    pub fn new(expected: usize) -> StartLatch {
        if expected == 0 {
            panic!("Start latch needs at least one car!")
        }
        StartLatch {
            expected,
            ready: AtomicUsize::new(0),
            released: Mutex::new(false),
            cv: Condvar::new(),
            released_fast: AtomicBool::new(false),
        }
    }

    /// Reports the car as ready and blocks until the latch is released.
    pub fn await_release(&self, _car_no: u32, stop: &AtomicBool) -> Result<(), Interrupted> {
        self.ready.fetch_add(1, Ordering::AcqRel);

        let mut released = self.released.lock().unwrap();
        while !*released {
            if stop.load(Ordering::Acquire) {
                return Err(Interrupted);
            }
            let (r, _) = self.cv.wait_timeout(released, WAIT_SLICE).unwrap();
            released = r;
        }
        Ok(())
    }

    /// Releases every waiter. Idempotent: the first call transitions, all
    /// later calls are no-ops.
    pub fn release(&self) {
        let mut released = self.released.lock().unwrap();
        if !*released {
            *released = true;
            self.released_fast.store(true, Ordering::Release);
            self.cv.notify_all();
        }
    }

    pub fn is_released(&self) -> bool {
        self.released_fast.load(Ordering::Acquire)
    }

    pub fn ready_count(&self) -> usize {
        self.ready.load(Ordering::Acquire)
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn all_ready(&self) -> bool {
        self.ready_count() >= self.expected
    }

    /// Kworum startowe: co najmniej połowa stawki zgłoszona.
    pub fn quorum_ready(&self) -> bool {
        self.ready_count() * 2 >= self.expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn release_unblocks_all_waiters() {
        let latch = Arc::new(StartLatch::new(4));
        let mut handles = Vec::new();
        for car_no in 1..=4u32 {
            let l = Arc::clone(&latch);
            handles.push(thread::spawn(move || {
                let stop = AtomicBool::new(false);
                l.await_release(car_no, &stop)
            }));
        }

        while latch.ready_count() < 4 {
            thread::sleep(Duration::from_millis(5));
        }
        latch.release();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(()));
        }
    }

    #[test]
    fn release_is_idempotent() {
        let latch = StartLatch::new(2);
        latch.release();
        latch.release();
        assert!(latch.is_released());

        // a late arrival passes through without blocking
        let stop = AtomicBool::new(false);
        assert_eq!(latch.await_release(1, &stop), Ok(()));
    }

    #[test]
    fn quorum_at_half_the_field() {
        let latch = StartLatch::new(4);
        let stop = AtomicBool::new(true); // pass through immediately
        assert!(!latch.quorum_ready());
        let _ = latch.await_release(1, &stop);
        assert!(!latch.quorum_ready());
        let _ = latch.await_release(2, &stop);
        assert!(latch.quorum_ready());
    }
}
