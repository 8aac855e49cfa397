use crate::core::race_data::RaceData;
use crate::post::race_result::ResultEntry;
use anyhow::Context;
use flume::Sender;

/// Events pushed from the core to whatever presentation is attached. The
/// view drains them from the channel and polls the shared race data for the
/// standings on its own timer.
#[derive(Debug, Clone)]
pub enum RaceEvent {
    /// Human-readable log line; the view may filter by substring.
    Log(String),
    /// Hint to re-read the live ordering.
    StandingsChanged,
    /// Start light n in 1..=5 switched on.
    StartLight(u8),
    /// All lights out, the field is released.
    StartReleased,
    /// Final ordered classification.
    RaceFinished(Vec<ResultEntry>),
}

/// Log sink handed to every worker at construction. Prints levelled lines to
/// the console and forwards race-significant lines over the event channel
/// when one is attached. Low-level synchronization traces stay at debug
/// level and are never forwarded.
#[derive(Debug, Clone)]
pub struct RaceLogger {
    tx: Option<Sender<RaceEvent>>,
    debug_enabled: bool,
}

impl RaceLogger {
    pub fn new(tx: Option<Sender<RaceEvent>>, debug_enabled: bool) -> RaceLogger {
        RaceLogger { tx, debug_enabled }
    }

    /// Sink without a channel, console only.
    pub fn console_only(debug_enabled: bool) -> RaceLogger {
        RaceLogger::new(None, debug_enabled)
    }

    pub fn info(&self, message: &str) {
        println!("INFO: {}", message);
        self.forward(RaceEvent::Log(message.to_owned()));
    }

    pub fn warning(&self, message: &str) {
        println!("WARNING: {}", message);
        self.forward(RaceEvent::Log(format!("WARNING: {}", message)));
    }

    pub fn error(&self, message: &str) {
        eprintln!("ERROR: {}", message);
        self.forward(RaceEvent::Log(format!("ERROR: {}", message)));
    }

    pub fn debug(&self, message: &str) {
        if self.debug_enabled {
            println!("DEBUG: {}", message);
        }
    }

    /// Synchronization trace, e.g. `sync("PERMIT_GRANTED", "Schumacher-S")`.
    pub fn sync(&self, event: &str, resource: &str) {
        if self.debug_enabled {
            println!("DEBUG: [SYNC] {}: {}", event, resource);
        }
    }

    /// Emits a non-log event (lights, standings hint, final results).
    pub fn event(&self, event: RaceEvent) {
        self.forward(event);
    }

    fn forward(&self, event: RaceEvent) {
        if let Some(tx) = &self.tx {
            // a disconnected view must never take the simulation down
            let _ = tx.send(event);
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// One row of the live standings, cheap to copy into a view.
#[derive(Debug, Clone)]
pub struct CarSnapshot {
    pub position: usize,
    pub car_no: u32,
    pub driver_initials: String,
    pub team_name: String,
    pub color: RgbColor,
    pub completed_laps: u32,
    pub current_segment: usize,
    pub progress: f64,
    pub status_label: &'static str,
    pub tire_label: &'static str,
    pub tire_wear_pct: f64,
    pub pit_stops: u32,
    pub display_xy: (f64, f64),
}

/// Current leaderboard as display rows, leader first. Reads the published
/// car fields through the live ordering.
pub fn standings_snapshot(data: &RaceData) -> anyhow::Result<Vec<CarSnapshot>> {
    let order = data.race_order();
    let mut rows = Vec::with_capacity(order.len());

    for (idx, car) in order.iter().enumerate() {
        let team = data.team(car.team_id);
        let parsed = team
            .color
            .parse::<css_color_parser::Color>()
            .context("Could not parse team color!")?;
        let tires = car.tires();
        let segment = data.track.segment(car.current_segment());

        rows.push(CarSnapshot {
            position: idx + 1,
            car_no: car.car_no,
            driver_initials: car.driver.initials.clone(),
            team_name: team.name.clone(),
            color: RgbColor {
                r: parsed.r,
                g: parsed.g,
                b: parsed.b,
            },
            completed_laps: car.completed_laps(),
            current_segment: car.current_segment(),
            progress: car.progress(),
            status_label: car.status().label(),
            tire_label: tires.compound.label(),
            tire_wear_pct: tires.wear_pct,
            pit_stops: car.pit_stop_count(),
            display_xy: segment.position_at(car.progress()),
        });
    }

    Ok(rows)
}
