pub mod chicane;
pub mod overtake;
pub mod pit_box;
pub mod pit_lane;
pub mod segment_monitor;
pub mod start_latch;

use crate::sync::chicane::ChicaneAccess;
use crate::sync::overtake::OvertakeManager;
use crate::sync::pit_box::PitBoxAccess;
use crate::sync::pit_lane::PitLaneController;
use crate::sync::segment_monitor::SegmentMonitor;
use crate::sync::start_latch::StartLatch;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A blocking wait was abandoned because the race was stopped. Workers
/// propagate this up with `?` and exit their loop without touching shared
/// state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wait interrupted by race shutdown")
    }
}

impl std::error::Error for Interrupted {}

/// Slice length for cancellable condvar waits. Waiters re-check their
/// predicate and the stop flag at this cadence.
pub(crate) const WAIT_SLICE: Duration = Duration::from_millis(50);

/// All synchronization objects of one race, shared by exactly the workers
/// that participate. Built once per race by the controller.
pub struct TrackSync {
    /// Monitor per tight curve, keyed by segment id.
    pub monitors: HashMap<usize, Arc<SegmentMonitor>>,
    /// Fair semaphore per chicane, keyed by segment id.
    pub chicanes: HashMap<usize, Arc<ChicaneAccess>>,
    pub pit_lane: Arc<PitLaneController>,
    /// One box per team, indexed by team id.
    pub pit_boxes: Vec<Arc<PitBoxAccess>>,
    pub overtaking: Arc<OvertakeManager>,
    pub start_latch: Arc<StartLatch>,
}

impl TrackSync {
    pub fn pit_box(&self, team_id: usize) -> Arc<PitBoxAccess> {
        match self.pit_boxes.get(team_id) {
            Some(b) => Arc::clone(b),
            None => panic!("No pit box for team id {}!", team_id),
        }
    }
}
