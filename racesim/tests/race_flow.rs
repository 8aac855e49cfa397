use racesim::core::car::Car;
use racesim::core::controller::RaceController;
use racesim::core::driver::Driver;
use racesim::core::race_data::RaceData;
use racesim::core::roster::{Roster, Team};
use racesim::core::tireset::TireCompound;
use racesim::core::track::{PitLayout, Segment, SegmentKind, Track};
use racesim::interfaces::gui_interface::{RaceEvent, RaceLogger};
use racesim::pre::sim_config::SimConfig;
use racesim::sync::overtake::OvertakeManager;
use racesim::threads::strategy::TeamStrategist;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A small ring with one of each critical kind plus a pit detour, for fast
/// end-to-end runs.
fn short_track() -> Track {
    let segments = vec![
        Segment::new(0, "Start/Finish", SegmentKind::StartFinish, 300, (0.1, 0.5), (0.4, 0.5)),
        Segment::new(1, "DRS zone", SegmentKind::DrsZone, 250, (0.4, 0.5), (0.7, 0.5)),
        Segment::new(2, "Hairpin", SegmentKind::TightCurve, 100, (0.7, 0.5), (0.8, 0.4)),
        Segment::new(3, "Esses", SegmentKind::Chicane, 150, (0.8, 0.4), (0.5, 0.3)),
        Segment::new(4, "Back straight", SegmentKind::Straight, 300, (0.5, 0.3), (0.1, 0.5)),
        Segment::new(5, "Pit entry", SegmentKind::PitEntry, 80, (0.45, 0.35), (0.4, 0.4)),
        Segment::new(6, "Pit lane", SegmentKind::PitLane, 150, (0.4, 0.4), (0.3, 0.45)),
        Segment::new(7, "Pit exit", SegmentKind::PitExit, 80, (0.3, 0.45), (0.35, 0.5)),
    ];
    Track::new(
        "Test ring",
        segments,
        5,
        Some(PitLayout {
            entry_after: 3,
            entry_id: 5,
            lane_id: 6,
            exit_id: 7,
            rejoin_at: 1,
        }),
    )
}

fn small_roster() -> Roster {
    let teams = vec![Team::new(0, "Alpha", "#FF0000"), Team::new(1, "Omega", "#0000FF")];
    let drivers = [
        ("Anna Fast", "ANF", 95u8, 0usize),
        ("Ben Quick", "BEN", 88, 0),
        ("Cara Swift", "CAR", 90, 1),
        ("Dan Steady", "DAN", 75, 1),
    ];
    let cars = drivers
        .iter()
        .enumerate()
        .map(|(idx, (name, initials, skill, team_id))| {
            Arc::new(Car::new(
                (idx + 1) as u32,
                *team_id,
                Driver::new(name, initials, *skill),
                TireCompound::Medium,
            ))
        })
        .collect();
    Roster::new(teams, cars)
}

fn fast_config() -> SimConfig {
    SimConfig {
        start_light_interval_ms: 20,
        start_release_jitter_min_ms: 5,
        start_release_jitter_max_ms: 20,
        gui_update_interval_ms: 20,
        strategy_interval_ms: 50,
        settling_delay_ms: 30,
        crew_wait_timeout_ms: 50,
        ready_poll_interval_ms: 5,
        pit_service_min_ms: 50,
        pit_service_max_ms: 100,
        grid_seed: Some(7),
        ..SimConfig::default()
    }
}

struct ObservedRun {
    lights: Vec<u8>,
    released: bool,
    results: Vec<racesim::post::race_result::ResultEntry>,
}

/// Drains the event channel until the final classification arrives.
fn observe_run(rx: &flume::Receiver<RaceEvent>, deadline: Duration) -> ObservedRun {
    let mut run = ObservedRun {
        lights: Vec::new(),
        released: false,
        results: Vec::new(),
    };
    let started = Instant::now();
    while started.elapsed() < deadline {
        match rx.recv_timeout(Duration::from_millis(500)) {
            Ok(RaceEvent::StartLight(n)) => run.lights.push(n),
            Ok(RaceEvent::StartReleased) => run.released = true,
            Ok(RaceEvent::RaceFinished(results)) => {
                run.results = results;
                return run;
            }
            Ok(_) => {}
            Err(flume::RecvTimeoutError::Timeout) => {}
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }
    }
    run
}

#[test]
fn full_race_start_fanout_and_restart() {
    let (tx, rx) = flume::unbounded();
    let data = RaceData::new(short_track(), small_roster());
    let mut controller = RaceController::with_data(data, fast_config(), Some(tx), false);

    let data = controller.race_data();
    data.set_total_laps(3);
    controller.set_simulation_speed(10.0);

    controller.initialise();
    controller.start_race();

    let run = observe_run(&rx, Duration::from_secs(60));

    // five-light sequence in order, release before the finish
    assert_eq!(run.lights, vec![1, 2, 3, 4, 5]);
    assert!(run.released);

    // complete classification: every car, positions contiguous, leader gap 0
    assert_eq!(run.results.len(), 4);
    for (idx, entry) in run.results.iter().enumerate() {
        assert_eq!(entry.position, idx + 1);
    }
    assert_eq!(run.results[0].gap_to_leader_ms, 0);
    assert!(run.results[0].total_time_ms > 0);

    // the winner completed the full distance; the rest were fanned out
    let winner = data
        .cars
        .iter()
        .find(|c| c.car_no == run.results[0].car_no)
        .unwrap();
    assert!(winner.is_finished());
    assert!(winner.completed_laps() >= 3);

    // stop_race joins every worker; the fan-out must terminate them
    controller.stop_race();

    // round trip: a fresh initialise + start completes another full race
    data.set_total_laps(3);
    controller.initialise();
    controller.start_race();
    let second = observe_run(&rx, Duration::from_secs(60));
    assert_eq!(second.results.len(), 4);
    controller.stop_race();
}

#[test]
fn requested_pit_stop_is_taken_through_the_detour() {
    let (tx, rx) = flume::unbounded();
    let data = RaceData::new(short_track(), small_roster());
    let mut controller = RaceController::with_data(data, fast_config(), Some(tx), false);

    let data = controller.race_data();
    data.set_total_laps(3);
    controller.set_simulation_speed(10.0);

    controller.initialise();

    // emulate the strategist: car 1 must stop for hard tires
    let car = data.cars[0].clone();
    assert!(car.request_pit(TireCompound::Hard));

    controller.start_race();
    let run = observe_run(&rx, Duration::from_secs(60));
    assert!(!run.results.is_empty());
    controller.stop_race();

    assert_eq!(car.pit_stop_count(), 1);
    assert!(car.mandatory_pit_done());
    assert_eq!(car.tires().compound, TireCompound::Hard);
    assert!(!car.pit_requested());
}

#[test]
fn strategist_requests_stop_only_inside_the_window() {
    let data = Arc::new(RaceData::standard());
    data.set_total_laps(30);
    let config = SimConfig::default();
    let team = data.teams[0].clone();
    let cars = data.team_cars(team.id);
    let strategist = TeamStrategist::new(
        team,
        cars.clone(),
        Arc::clone(&data),
        config,
        RaceLogger::console_only(false),
        Arc::new(AtomicBool::new(true)),
    );

    // car on lap 25 of 30 without its mandatory stop: last chance
    let late_car = &cars[0];
    for _ in 0..25 {
        late_car.begin_lap();
    }
    assert_eq!(late_car.current_lap(), 25);
    strategist.evaluate_car(late_car);
    assert!(late_car.pit_requested());
    // 5 laps remain, so the soft compound is chosen
    assert_eq!(late_car.requested_compound(), Some(TireCompound::Soft));

    // car on lap 24 with little wear: no request yet
    let early_car = &cars[1];
    for _ in 0..24 {
        early_car.begin_lap();
    }
    assert!(early_car.tires().wear_pct < 60.0);
    strategist.evaluate_car(early_car);
    assert!(!early_car.pit_requested());
}

#[test]
fn overtake_statistics_stay_consistent_under_concurrency() {
    let manager = Arc::new(OvertakeManager::new());
    let attacker_zone = Segment::new(1, "DRS zone", SegmentKind::DrsZone, 250, (0.0, 0.0), (1.0, 0.0));
    let done = Arc::new(AtomicBool::new(false));

    // two readers poll the stats while twenty writers roll attempts
    let mut readers = Vec::new();
    for _ in 0..2 {
        let m = Arc::clone(&manager);
        let d = Arc::clone(&done);
        readers.push(thread::spawn(move || {
            while !d.load(Ordering::Acquire) {
                let stats = m.stats();
                assert_eq!(stats.attempts, stats.successes + stats.failures);
                thread::sleep(Duration::from_millis(2));
            }
        }));
    }

    let mut writers = Vec::new();
    for writer in 0..20u32 {
        let m = Arc::clone(&manager);
        let zone = attacker_zone.clone();
        writers.push(thread::spawn(move || {
            let attacker = Car::new(
                writer + 1,
                0,
                Driver::new("Attacker", "ATK", 90),
                TireCompound::Soft,
            );
            let defender = Car::new(
                writer + 30,
                0,
                Driver::new("Defender", "DEF", 80),
                TireCompound::Hard,
            );
            for _ in 0..50 {
                m.attempt(&attacker, &defender, &zone, 400);
            }
        }));
    }
    for writer in writers {
        writer.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    let stats = manager.stats();
    assert_eq!(stats.attempts, 20 * 50);
    assert_eq!(stats.attempts, stats.successes + stats.failures);
}

#[test]
fn live_ordering_is_total_under_concurrent_mutation() {
    let data = Arc::new(RaceData::standard());
    let done = Arc::new(AtomicBool::new(false));

    let mut mutators = Vec::new();
    for offset in 0..4usize {
        let d = Arc::clone(&data);
        let stop = Arc::clone(&done);
        mutators.push(thread::spawn(move || {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            while !stop.load(Ordering::Acquire) {
                for car in d.cars.iter().skip(offset).step_by(4) {
                    car.set_current_segment(rng.gen_range(0..15));
                    car.set_progress(rng.gen::<f64>());
                    if rng.gen_bool(0.1) {
                        car.begin_lap();
                        car.close_lap(rng.gen_range(15_000..25_000));
                    }
                }
            }
        }));
    }

    let mut readers = Vec::new();
    for _ in 0..4 {
        let d = Arc::clone(&data);
        let stop = Arc::clone(&done);
        readers.push(thread::spawn(move || {
            while !stop.load(Ordering::Acquire) {
                let order = d.race_order();
                assert_eq!(order.len(), d.cars.len());
            }
        }));
    }

    thread::sleep(Duration::from_millis(300));
    done.store(true, Ordering::Release);
    for handle in mutators.into_iter().chain(readers) {
        handle.join().unwrap();
    }
}
