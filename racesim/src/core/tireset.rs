/// Reifen zużywają się podczas wyścigu i obniżają tempo bolidu.
/// Powyżej progu krytycznego strateg powinien zarządzić pit stop.
pub const CRITICAL_WEAR_PCT: f64 = 80.0;
pub const MAX_WEAR_PCT: f64 = 100.0;

/// Tire compound with its base speed factor and wear rate. The wear rate is
/// applied once per traversed segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TireCompound {
    Soft,
    Medium,
    Hard,
}

impl TireCompound {
    /// * Soft - najszybsza mieszanka, najszybciej się zużywa
    /// * Hard - najwolniejsza, wytrzymuje najdłużej
    pub fn speed_factor(&self) -> f64 {
        match self {
            TireCompound::Soft => 1.0,
            TireCompound::Medium => 0.85,
            TireCompound::Hard => 0.7,
        }
    }

    pub fn wear_rate(&self) -> f64 {
        match self {
            TireCompound::Soft => 3.0,
            TireCompound::Medium => 2.0,
            TireCompound::Hard => 1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TireCompound::Soft => "Soft",
            TireCompound::Medium => "Medium",
            TireCompound::Hard => "Hard",
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            TireCompound::Soft => 0,
            TireCompound::Medium => 1,
            TireCompound::Hard => 2,
        }
    }

    pub fn from_u8(value: u8) -> TireCompound {
        match value {
            0 => TireCompound::Soft,
            1 => TireCompound::Medium,
            2 => TireCompound::Hard,
            other => panic!("Unknown tire compound code {}!", other),
        }
    }

    pub fn all() -> [TireCompound; 3] {
        [TireCompound::Soft, TireCompound::Medium, TireCompound::Hard]
    }
}

/// A mounted tire set. Wear is strictly non-decreasing between pit stops;
/// a compound change only happens through a fresh set.
#[derive(Debug, Clone, Copy)]
pub struct Tireset {
    pub compound: TireCompound,
    pub wear_pct: f64,
}

impl Tireset {
    pub fn new(compound: TireCompound) -> Tireset {
        Tireset {
            compound,
            wear_pct: 0.0,
        }
    }

    /// add_wear zwiększa zużycie o stawkę mieszanki (raz na odcinek).
    pub fn add_wear(&mut self) {
        self.wear_pct = (self.wear_pct + self.compound.wear_rate()).min(MAX_WEAR_PCT);
    }

    /// Current speed factor: the compound base degraded linearly with wear,
    /// floored at 0.5.
    pub fn speed_factor(&self) -> f64 {
        let wear_malus = (self.wear_pct / MAX_WEAR_PCT) * 0.3;
        (self.compound.speed_factor() - wear_malus).max(0.5)
    }

    pub fn is_critical(&self) -> bool {
        self.wear_pct >= CRITICAL_WEAR_PCT
    }

    pub fn is_worn_out(&self) -> bool {
        self.wear_pct >= MAX_WEAR_PCT
    }
}
