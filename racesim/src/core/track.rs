/// * `kind` - Rodzaj odcinka (decyduje o synchronizacji i czasie przejazdu)
/// * `capacity` - Maksymalna liczba aut jednocześnie na odcinku
/// * `base_time_ms` - Bazowy czas przejazdu przy 1x i świeżych oponach
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    StartFinish,
    Straight,
    DrsZone,
    NormalCurve,
    TightCurve,
    Chicane,
    PitEntry,
    PitLane,
    PitExit,
}

/// Segments without an admission limit still need a finite capacity value
/// for display purposes.
pub const UNBOUNDED_CAPACITY: usize = 100;

impl SegmentKind {
    /// Default capacity per kind. Only kinds below UNBOUNDED_CAPACITY are
    /// guarded by a synchronization primitive.
    pub fn capacity(&self) -> usize {
        match self {
            SegmentKind::TightCurve => 1,
            SegmentKind::Chicane => 2,
            SegmentKind::PitEntry | SegmentKind::PitExit => 3,
            SegmentKind::PitLane => 1,
            _ => UNBOUNDED_CAPACITY,
        }
    }

    /// Bazowy czas przejazdu odcinka w milisekundach (przy 1x).
    pub fn base_time_ms(&self) -> u64 {
        match self {
            SegmentKind::StartFinish => 800,
            SegmentKind::Straight => 600,
            SegmentKind::DrsZone => 500,
            SegmentKind::NormalCurve => 1000,
            SegmentKind::TightCurve => 1200,
            SegmentKind::Chicane => 1500,
            SegmentKind::PitEntry => 1000,
            SegmentKind::PitLane => 3000,
            SegmentKind::PitExit => 1000,
        }
    }

    pub fn overtaking_allowed(&self) -> bool {
        matches!(self, SegmentKind::Straight | SegmentKind::DrsZone)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SegmentKind::StartFinish => "Start/Finish",
            SegmentKind::Straight => "Straight",
            SegmentKind::DrsZone => "DRS zone",
            SegmentKind::NormalCurve => "Curve",
            SegmentKind::TightCurve => "Tight curve",
            SegmentKind::Chicane => "Chicane",
            SegmentKind::PitEntry => "Pit entry",
            SegmentKind::PitLane => "Pit lane",
            SegmentKind::PitExit => "Pit exit",
        }
    }
}

/// A single portion of the circuit. Immutable once built; the display
/// coordinates are normalized to [0, 1] in both axes.
#[derive(Debug, Clone)]
pub struct Segment {
    pub id: usize,
    pub name: String,
    pub kind: SegmentKind,
    pub length_m: u32,
    pub capacity: usize,
    pub overtaking_allowed: bool,
    pub start_xy: (f64, f64),
    pub end_xy: (f64, f64),
}

impl Segment {
    pub fn new(
        id: usize,
        name: &str,
        kind: SegmentKind,
        length_m: u32,
        start_xy: (f64, f64),
        end_xy: (f64, f64),
    ) -> Segment {
        if name.trim().is_empty() {
            panic!("Segment name must not be empty!")
        }
        if length_m == 0 {
            panic!("Segment length must be > 0!")
        }
        Segment {
            id,
            name: name.to_owned(),
            kind,
            length_m,
            capacity: kind.capacity(),
            overtaking_allowed: kind.overtaking_allowed(),
            start_xy,
            end_xy,
        }
    }

    pub fn base_time_ms(&self) -> u64 {
        self.kind.base_time_ms()
    }

    /// A segment is critical when admission to it must be synchronized.
    pub fn is_critical(&self) -> bool {
        self.capacity < UNBOUNDED_CAPACITY
    }

    /// Interpolated display position for a progress value in [0, 1].
    pub fn position_at(&self, progress: f64) -> (f64, f64) {
        let p = progress.clamp(0.0, 1.0);
        (
            self.start_xy.0 + (self.end_xy.0 - self.start_xy.0) * p,
            self.start_xy.1 + (self.end_xy.1 - self.start_xy.1) * p,
        )
    }
}

/// Routing of the pit detour relative to the main ring.
/// * `entry_after` - Main segment after which the pit entry branches off
/// * `rejoin_at` - Main segment at which the pit exit rejoins
#[derive(Debug, Clone, Copy)]
pub struct PitLayout {
    pub entry_after: usize,
    pub entry_id: usize,
    pub lane_id: usize,
    pub exit_id: usize,
    pub rejoin_at: usize,
}

/// The circuit: an ordered ring of `main_segments` segments plus an optional
/// three-segment pit detour appended after the ring.
#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    pub segments: Vec<Segment>,
    pub main_segments: usize,
    pub pit: Option<PitLayout>,
}

impl Track {
    pub fn new(name: &str, segments: Vec<Segment>, main_segments: usize, pit: Option<PitLayout>) -> Track {
        if segments.is_empty() {
            panic!("Track must have at least one segment!")
        }
        if main_segments == 0 || main_segments > segments.len() {
            panic!("Main segment count {} is invalid for {} segments!", main_segments, segments.len())
        }
        for (i, segment) in segments.iter().enumerate() {
            if segment.id != i {
                panic!("Segment ids must be contiguous, but segment {} has id {}!", i, segment.id)
            }
        }
        Track {
            name: name.to_owned(),
            segments,
            main_segments,
            pit,
        }
    }

    pub fn segment(&self, id: usize) -> &Segment {
        match self.segments.get(id) {
            Some(segment) => segment,
            None => panic!("Unknown segment id {} on track {}!", id, self.name),
        }
    }

    pub fn total_length_m(&self) -> u32 {
        self.segments.iter().map(|s| s.length_m).sum()
    }

    pub fn critical_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| s.is_critical())
    }

    /// The Nürburgring GP ring: 15 main segments, pit entry branching after
    /// segment 13 and rejoining the ring at segment 2.
    pub fn nuerburgring() -> Track {
        let segments = vec![
            Segment::new(0, "Start/Finish", SegmentKind::StartFinish, 400, (0.15, 0.50), (0.35, 0.50)),
            Segment::new(1, "DRS zone 1", SegmentKind::DrsZone, 300, (0.35, 0.50), (0.50, 0.50)),
            Segment::new(2, "Yokohama-S", SegmentKind::TightCurve, 150, (0.50, 0.50), (0.55, 0.40)),
            Segment::new(3, "Mercedes-Arena", SegmentKind::NormalCurve, 250, (0.55, 0.40), (0.65, 0.35)),
            Segment::new(4, "Back straight", SegmentKind::Straight, 350, (0.65, 0.35), (0.80, 0.35)),
            Segment::new(5, "Ford-Kurve", SegmentKind::TightCurve, 180, (0.80, 0.35), (0.85, 0.45)),
            Segment::new(6, "Dunlop hairpin", SegmentKind::TightCurve, 120, (0.85, 0.45), (0.85, 0.55)),
            Segment::new(7, "Schumacher-S", SegmentKind::Chicane, 200, (0.85, 0.55), (0.80, 0.65)),
            Segment::new(8, "DRS zone 2", SegmentKind::DrsZone, 280, (0.80, 0.65), (0.65, 0.70)),
            Segment::new(9, "Bit-Kurve", SegmentKind::TightCurve, 140, (0.65, 0.70), (0.55, 0.75)),
            Segment::new(10, "Haseroeder-Kurve", SegmentKind::NormalCurve, 200, (0.55, 0.75), (0.45, 0.75)),
            Segment::new(11, "Coca-Cola-Kurve", SegmentKind::TightCurve, 160, (0.45, 0.75), (0.35, 0.70)),
            Segment::new(12, "DRS zone 3", SegmentKind::DrsZone, 450, (0.35, 0.70), (0.20, 0.60)),
            Segment::new(13, "Veedol chicane", SegmentKind::Chicane, 180, (0.20, 0.60), (0.15, 0.55)),
            Segment::new(14, "Final corner", SegmentKind::NormalCurve, 150, (0.15, 0.55), (0.15, 0.50)),
            Segment::new(15, "Pit entry", SegmentKind::PitEntry, 100, (0.20, 0.50), (0.25, 0.48)),
            Segment::new(16, "Pit lane", SegmentKind::PitLane, 300, (0.25, 0.48), (0.45, 0.48)),
            Segment::new(17, "Pit exit", SegmentKind::PitExit, 100, (0.45, 0.48), (0.50, 0.50)),
        ];

        Track::new(
            "Nuerburgring GP",
            segments,
            15,
            Some(PitLayout {
                entry_after: 13,
                entry_id: 15,
                lane_id: 16,
                exit_id: 17,
                rejoin_at: 2,
            }),
        )
    }
}
