use crate::core::car::{Car, CarStatus};
use crate::core::race_data::{LapRecord, RaceData};
use crate::core::tireset::TireCompound;
use crate::core::track::{PitLayout, Segment, SegmentKind};
use crate::interfaces::gui_interface::RaceLogger;
use crate::pre::sim_config::SimConfig;
use crate::sync::{Interrupted, TrackSync};
use helpers::general::format_time_ms;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Przejazd odcinka jest dzielony na podkroki; między nimi wątek sprawdza
/// flagi zatrzymania i bramkę pauzy.
const TRAVERSAL_STEPS: u32 = 10;

/// Worker driving a single car around the ring: waits at the start latch,
/// traverses segments through their admission primitives, dives into the pit
/// lane when the strategist asks for it and closes laps at the finish line.
pub struct CarWorker {
    car: Arc<Car>,
    data: Arc<RaceData>,
    sync: Arc<TrackSync>,
    config: SimConfig,
    logger: RaceLogger,
    running: Arc<AtomicBool>,
}

impl CarWorker {
    pub fn new(
        car: Arc<Car>,
        data: Arc<RaceData>,
        sync: Arc<TrackSync>,
        config: SimConfig,
        logger: RaceLogger,
        running: Arc<AtomicBool>,
    ) -> CarWorker {
        CarWorker {
            car,
            data,
            sync,
            config,
            logger,
            running,
        }
    }

    /// Thread entry point. A cancelled wait ends the race for this car; the
    /// worker exits without touching any primitive again.
    pub fn run(self) {
        let tag = self.car.driver.initials.clone();
        self.logger.debug(&format!("Car worker started for {}", self.car));

        match self.drive() {
            Ok(()) => {}
            Err(Interrupted) => {
                self.logger
                    .warning(&format!("{} stopped while waiting (race shutdown)", tag));
            }
        }

        self.logger.debug(&format!("Car worker finished for {}", tag));
    }

    fn stopped(&self) -> bool {
        !self.running.load(Ordering::Acquire) || self.data.race_finished()
    }

    fn drive(&self) -> Result<(), Interrupted> {
        let initials = &self.car.driver.initials;

        self.logger.sync("AWAIT_START", initials);
        self.sync
            .start_latch
            .await_release(self.car.car_no, self.data.finished_flag())?;

        self.car.set_status(CarStatus::Running);
        self.car.begin_lap();
        let mut lap_start = Instant::now();
        self.logger.info(&format!("{} away - lap 1", initials));

        while !self.stopped() && !self.car.is_finished() {
            self.data.block_while_paused(self.data.finished_flag());
            self.traverse_current_segment()?;
            if self.stopped() {
                break;
            }
            self.advance_to_next_segment(&mut lap_start)?;
        }

        Ok(())
    }

    /// Dispatches the traversal by segment kind; critical kinds go through
    /// their admission primitive.
    fn traverse_current_segment(&self) -> Result<(), Interrupted> {
        let segment = self.data.track.segment(self.car.current_segment());

        match segment.kind {
            SegmentKind::TightCurve => self.traverse_tight_curve(segment),
            SegmentKind::Chicane => self.traverse_chicane(segment),
            SegmentKind::DrsZone | SegmentKind::Straight => {
                self.traverse_overtake_zone(segment);
                Ok(())
            }
            _ => {
                self.traverse(segment);
                Ok(())
            }
        }
    }

    fn traverse_tight_curve(&self, segment: &Segment) -> Result<(), Interrupted> {
        let monitor = match self.sync.monitors.get(&segment.id) {
            Some(monitor) => monitor,
            None => {
                self.traverse(segment);
                return Ok(());
            }
        };

        let initials = &self.car.driver.initials;
        self.car.set_status(CarStatus::WaitingForSegment);
        self.logger.sync("QUEUE_JOIN", &segment.name);

        monitor.enter(self.car.car_no, self.data.finished_flag())?;

        self.car.set_status(CarStatus::InCriticalZone);
        self.logger
            .debug(&format!("{} in {} ({}/{})", initials, segment.name, monitor.occupants(), monitor.capacity()));

        self.traverse(segment);

        monitor.leave(self.car.car_no);
        self.logger.sync("SEGMENT_LEFT", &segment.name);
        self.car.set_status(CarStatus::Running);
        Ok(())
    }

    fn traverse_chicane(&self, segment: &Segment) -> Result<(), Interrupted> {
        let chicane = match self.sync.chicanes.get(&segment.id) {
            Some(chicane) => chicane,
            None => {
                self.traverse(segment);
                return Ok(());
            }
        };

        self.car.set_status(CarStatus::WaitingForSegment);
        self.logger.sync("PERMIT_WAIT", &segment.name);

        chicane.acquire(self.car.car_no, self.data.finished_flag())?;

        self.car.set_status(CarStatus::InCriticalZone);
        self.logger.sync("PERMIT_GRANTED", &segment.name);

        self.traverse(segment);

        chicane.release(self.car.car_no);
        self.logger.sync("PERMIT_RETURNED", &segment.name);
        self.car.set_status(CarStatus::Running);
        Ok(())
    }

    fn traverse_overtake_zone(&self, segment: &Segment) {
        self.car.set_status(CarStatus::InOvertakeZone);
        if segment.overtaking_allowed {
            self.try_overtake(segment);
        }
        self.traverse(segment);
        self.car.set_status(CarStatus::Running);
    }

    /// Physical traversal: 10 sub-steps, each sleeping the scaled share of
    /// the segment time adjusted for tires and driver, with monotone
    /// progress updates. Tires wear once per traversed segment.
    fn traverse(&self, segment: &Segment) {
        let adjusted_ms = (segment.base_time_ms() as f64 / self.car.speed_factor()) as u64;
        let total = self.data.scaled(adjusted_ms);
        let step = (total / TRAVERSAL_STEPS).max(Duration::from_millis(1));
        let progress_per_step = 1.0 / TRAVERSAL_STEPS as f64;

        for _ in 0..TRAVERSAL_STEPS {
            if self.stopped() {
                break;
            }
            self.data.block_while_paused(self.data.finished_flag());
            thread::sleep(step);
            let progress = self.car.progress() + progress_per_step;
            self.car.set_progress(progress.min(1.0));
        }

        self.car.wear_tires();
    }

    /// Rolls an overtake attempt against the car directly ahead when it is
    /// in the same segment within the gap threshold.
    fn try_overtake(&self, segment: &Segment) {
        let order = self.data.race_order();
        let my_position = match order.iter().position(|c| c.car_no == self.car.car_no) {
            Some(position) => position,
            None => return,
        };
        if my_position == 0 {
            return;
        }

        let ahead = &order[my_position - 1];
        if ahead.is_finished() || ahead.current_segment() != self.car.current_segment() {
            return;
        }

        let progress_gap = ahead.progress() - self.car.progress();
        let gap_ms = (progress_gap * self.config.base_segment_time_ms as f64) as i64;
        if gap_ms <= 0 || gap_ms as u64 >= self.config.overtake_gap_threshold_ms {
            return;
        }

        let success = self
            .sync
            .overtaking
            .attempt(&self.car, ahead, segment, gap_ms as u64);

        if success {
            let new_progress = (ahead.progress() + self.config.overtake_progress_bonus).min(0.99);
            self.car.set_progress(new_progress);
            self.logger.info(&format!(
                "{} OVERTAKES {} in {}!",
                self.car.driver.initials,
                ahead.driver.initials,
                segment.name
            ));
        } else {
            self.logger.debug(&format!(
                "{} fails to pass {} in {}",
                self.car.driver.initials,
                ahead.driver.initials,
                segment.name
            ));
        }
    }

    /// Picks the next segment: pit detour at the branch when a stop is
    /// requested, lap close and wrap at the last main segment, rejoin after
    /// the pit exit, plain increment otherwise.
    fn advance_to_next_segment(&self, lap_start: &mut Instant) -> Result<(), Interrupted> {
        let current = self.car.current_segment();

        if let Some(pit) = self.data.track.pit {
            if self.car.pit_requested() && current == pit.entry_after {
                self.perform_pit_stop(&pit)?;
                return Ok(());
            }
        }

        let next = if current == self.data.track.main_segments - 1 {
            self.close_lap(lap_start);
            0
        } else if self.data.track.pit.map_or(false, |p| current == p.exit_id) {
            self.data.track.pit.map(|p| p.rejoin_at).unwrap_or(0)
        } else {
            current + 1
        };

        self.car.set_current_segment(next);
        self.car.set_progress(0.0);
        Ok(())
    }

    /// Publishes the lap record and either begins the next lap or finishes
    /// the race for this car.
    fn close_lap(&self, lap_start: &mut Instant) {
        let initials = &self.car.driver.initials;
        let lap = self.car.current_lap();
        let lap_time_ms = lap_start.elapsed().as_millis() as u64;
        *lap_start = Instant::now();

        self.car.close_lap(lap_time_ms);
        let tires = self.car.tires();
        self.data.add_lap_record(LapRecord {
            car_no: self.car.car_no,
            lap,
            time_ms: lap_time_ms,
            compound: tires.compound,
            tire_wear_pct: tires.wear_pct,
        });

        self.logger.info(&format!(
            "{} completes lap {} - {}",
            initials,
            lap,
            format_time_ms(lap_time_ms)
        ));

        if self.car.completed_laps() >= self.data.total_laps() {
            self.car.set_finished();
            self.logger
                .info(&format!("{} TAKES THE FLAG after {} laps!", initials, lap));
        } else {
            self.car.begin_lap();
        }
    }

    /// Complete pit stop: entry semaphore, entry segment, box handoff, fresh
    /// tires, exit semaphore, exit segment, rejoin.
    fn perform_pit_stop(&self, pit: &PitLayout) -> Result<(), Interrupted> {
        let initials = &self.car.driver.initials;
        let compound = self.car.take_pit_request().unwrap_or(TireCompound::Medium);

        self.logger.info(&format!("{} heads for the box!", initials));

        self.car.set_status(CarStatus::EnteringPit);
        self.car.set_current_segment(pit.entry_id);
        self.car.set_progress(0.0);
        self.sync
            .pit_lane
            .request_entry(self.car.car_no, self.data.finished_flag())?;

        self.traverse(self.data.track.segment(pit.entry_id));
        self.sync.pit_lane.complete_entry(self.car.car_no);

        self.car.set_current_segment(pit.lane_id);
        self.car.set_progress(0.0);
        self.car.set_status(CarStatus::InBox);

        let pit_box = self.sync.pit_box(self.car.team_id);
        pit_box.perform_stop(self.car.car_no, compound, self.data.finished_flag())?;

        self.car.fit_fresh_tires(compound);
        self.logger.info(&format!(
            "{} tire change done: {} (stop no. {})",
            initials,
            compound.label(),
            self.car.pit_stop_count()
        ));

        self.car.set_status(CarStatus::LeavingPit);
        self.car.set_current_segment(pit.exit_id);
        self.car.set_progress(0.0);
        self.sync
            .pit_lane
            .request_exit(self.car.car_no, self.data.finished_flag())?;

        self.traverse(self.data.track.segment(pit.exit_id));
        self.sync.pit_lane.complete_exit(self.car.car_no);

        self.car.set_status(CarStatus::Running);
        self.car.set_current_segment(pit.rejoin_at);
        self.car.set_progress(0.0);
        Ok(())
    }
}
