use crate::core::car::Car;
use crate::core::track::Segment;
use rand::Rng;
use std::sync::RwLock;

// Factor weights (they sum to 1.0 together with the unused damage slot).
const WEIGHT_TIRE_WEAR: f64 = 0.25;
const WEIGHT_COMPOUND: f64 = 0.15;
const WEIGHT_DRS: f64 = 0.20;
const WEIGHT_SLIPSTREAM: f64 = 0.15;
// Vehicle damage slot: reserved, the signal is always zero.
#[allow(dead_code)]
const WEIGHT_DAMAGE: f64 = 0.15;
const WEIGHT_SKILL: f64 = 0.10;

const BASE_PROBABILITY: f64 = 0.30;
const MIN_PROBABILITY: f64 = 0.05;
const MAX_PROBABILITY: f64 = 0.85;

/// Liczniki manewrów wyprzedzania. W każdym punkcie spoczynku zachodzi
/// attempts == successes + failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OvertakeStats {
    pub attempts: u32,
    pub successes: u32,
    pub failures: u32,
}

/// Arbiter wyprzedzania w strefach DRS i na prostych. Prawdopodobieństwo
/// sukcesu to ważona suma różnic (opony, mieszanka, DRS, tunel
/// aerodynamiczny, umiejętności); statystyki chroni blokada
/// czytelnicy-pisarz.
pub struct OvertakeManager {
    stats: RwLock<OvertakeStats>,
}

impl OvertakeManager {
    pub fn new() -> OvertakeManager {
        OvertakeManager {
            stats: RwLock::new(OvertakeStats::default()),
        }
    }

    /// Success probability of `attacker` against `defender` in `zone` with
    /// the given time gap. Pure; exposed for the view and for tests.
    pub fn success_probability(
        attacker: &Car,
        defender: &Car,
        zone: &Segment,
        gap_ms: u64,
    ) -> f64 {
        let attacker_tires = attacker.tires();
        let defender_tires = defender.tires();

        let mut probability = BASE_PROBABILITY;

        // tire condition: better-preserved rubber favours the attacker
        let wear_diff = defender_tires.wear_pct - attacker_tires.wear_pct;
        probability += (wear_diff / 100.0) * WEIGHT_TIRE_WEAR;

        // compound: a softer mix favours the attacker
        let compound_diff =
            attacker_tires.compound.speed_factor() - defender_tires.compound.speed_factor();
        probability += compound_diff * WEIGHT_COMPOUND;

        // fixed DRS bonus in overtaking zones
        if zone.overtaking_allowed {
            probability += WEIGHT_DRS;
        }

        // slipstream: full bonus under 1 s, fading linearly to zero at 2 s
        if gap_ms < 1000 {
            probability += WEIGHT_SLIPSTREAM;
        } else if gap_ms < 2000 {
            probability += WEIGHT_SLIPSTREAM * (2000 - gap_ms) as f64 / 1000.0;
        }

        // vehicle damage: reserved slot, contributes zero

        // driver skill
        let skill_diff = attacker.driver.skill_factor() - defender.driver.skill_factor();
        probability += skill_diff * WEIGHT_SKILL;

        probability.clamp(MIN_PROBABILITY, MAX_PROBABILITY)
    }

    /// Rolls the attempt and updates the counters under the write lock.
    /// Returns true when the manoeuvre succeeds.
    pub fn attempt(&self, attacker: &Car, defender: &Car, zone: &Segment, gap_ms: u64) -> bool {
        let probability = Self::success_probability(attacker, defender, zone, gap_ms);
        let roll: f64 = rand::thread_rng().gen();
        let success = roll < probability;

        let mut stats = self.stats.write().unwrap();
        stats.attempts += 1;
        if success {
            stats.successes += 1;
        } else {
            stats.failures += 1;
        }
        success
    }

    /// Snapshot of the counters under the shared lock.
    pub fn stats(&self) -> OvertakeStats {
        *self.stats.read().unwrap()
    }

    pub fn success_rate(&self) -> f64 {
        let stats = self.stats();
        if stats.attempts == 0 {
            0.0
        } else {
            stats.successes as f64 / stats.attempts as f64
        }
    }

    /// Zeruje statystyki przed nowym wyścigiem.
    pub fn reset(&self) {
        *self.stats.write().unwrap() = OvertakeStats::default();
    }
}

impl Default for OvertakeManager {
    fn default() -> Self {
        OvertakeManager::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::driver::Driver;
    use crate::core::tireset::TireCompound;
    use crate::core::track::SegmentKind;

    fn car(car_no: u32, skill: u8, compound: TireCompound) -> Car {
        Car::new(car_no, 0, Driver::new("Test Driver", "TST", skill), compound)
    }

    fn drs_zone() -> Segment {
        Segment::new(1, "DRS zone 1", SegmentKind::DrsZone, 300, (0.0, 0.0), (1.0, 0.0))
    }

    fn curve() -> Segment {
        Segment::new(3, "Mercedes-Arena", SegmentKind::NormalCurve, 250, (0.0, 0.0), (1.0, 0.0))
    }

    #[test]
    fn probability_stays_in_clamped_range() {
        let strong = car(1, 100, TireCompound::Soft);
        let weak = car(2, 0, TireCompound::Hard);
        for _ in 0..30 {
            weak.wear_tires();
        }
        let p = OvertakeManager::success_probability(&strong, &weak, &drs_zone(), 100);
        assert!(p <= MAX_PROBABILITY);
        let p = OvertakeManager::success_probability(&weak, &strong, &curve(), 5000);
        assert!(p >= MIN_PROBABILITY);
    }

    #[test]
    fn drs_zone_adds_fixed_bonus() {
        let a = car(1, 80, TireCompound::Medium);
        let d = car(2, 80, TireCompound::Medium);
        let with_drs = OvertakeManager::success_probability(&a, &d, &drs_zone(), 5000);
        let without = OvertakeManager::success_probability(&a, &d, &curve(), 5000);
        assert!((with_drs - without - WEIGHT_DRS).abs() < 1e-9);
    }

    #[test]
    fn slipstream_fades_linearly() {
        let a = car(1, 80, TireCompound::Medium);
        let d = car(2, 80, TireCompound::Medium);
        let zone = curve();
        let close = OvertakeManager::success_probability(&a, &d, &zone, 500);
        let mid = OvertakeManager::success_probability(&a, &d, &zone, 1500);
        let far = OvertakeManager::success_probability(&a, &d, &zone, 2500);
        assert!((close - far - WEIGHT_SLIPSTREAM).abs() < 1e-9);
        assert!((mid - far - WEIGHT_SLIPSTREAM / 2.0).abs() < 1e-9);
    }

    #[test]
    fn counters_stay_consistent() {
        let manager = OvertakeManager::new();
        let a = car(1, 90, TireCompound::Soft);
        let d = car(2, 70, TireCompound::Hard);
        let zone = drs_zone();
        for _ in 0..50 {
            manager.attempt(&a, &d, &zone, 400);
        }
        let stats = manager.stats();
        assert_eq!(stats.attempts, 50);
        assert_eq!(stats.attempts, stats.successes + stats.failures);
    }
}
