use crate::core::tireset::TireCompound;
use anyhow::Context;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::Path;

/// Dozwolone mnożniki prędkości symulacji.
pub const AVAILABLE_SPEED_FACTORS: [f64; 4] = [1.0, 2.0, 5.0, 10.0];

fn default_base_segment_time_ms() -> u64 { 1300 }
fn default_pit_service_min_ms() -> u64 { 2000 }
fn default_pit_service_max_ms() -> u64 { 4000 }
fn default_gui_update_interval_ms() -> u64 { 100 }
fn default_strategy_interval_ms() -> u64 { 1000 }
fn default_critical_tire_wear_pct() -> f64 { 80.0 }
fn default_mandatory_pit_earliest_lap() -> u32 { 8 }
fn default_mandatory_pit_laps_before_end() -> u32 { 5 }
fn default_start_light_interval_ms() -> u64 { 1000 }
fn default_start_release_jitter_min_ms() -> u64 { 500 }
fn default_start_release_jitter_max_ms() -> u64 { 3000 }
fn default_overtake_gap_threshold_ms() -> u64 { 1000 }
fn default_overtake_progress_bonus() -> f64 { 0.05 }
fn default_crew_wait_timeout_ms() -> u64 { 1000 }
fn default_settling_delay_ms() -> u64 { 500 }
fn default_ready_poll_interval_ms() -> u64 { 100 }

/// Wszystkie stałe czasowe i strategiczne symulacji w jednym rekordzie.
/// Czasy są podane dla prędkości 1x i dzielone przez mnożnik w miejscu
/// użycia (z podłogą 1 ms).
#[derive(Debug, Deserialize, Clone)]
pub struct SimConfig {
    #[serde(default = "default_base_segment_time_ms")]
    pub base_segment_time_ms: u64,
    #[serde(default = "default_pit_service_min_ms")]
    pub pit_service_min_ms: u64,
    #[serde(default = "default_pit_service_max_ms")]
    pub pit_service_max_ms: u64,
    #[serde(default = "default_gui_update_interval_ms")]
    pub gui_update_interval_ms: u64,
    #[serde(default = "default_strategy_interval_ms")]
    pub strategy_interval_ms: u64,
    #[serde(default = "default_critical_tire_wear_pct")]
    pub critical_tire_wear_pct: f64,
    #[serde(default = "default_mandatory_pit_earliest_lap")]
    pub mandatory_pit_earliest_lap: u32,
    #[serde(default = "default_mandatory_pit_laps_before_end")]
    pub mandatory_pit_laps_before_end: u32,
    #[serde(default = "default_start_light_interval_ms")]
    pub start_light_interval_ms: u64,
    #[serde(default = "default_start_release_jitter_min_ms")]
    pub start_release_jitter_min_ms: u64,
    #[serde(default = "default_start_release_jitter_max_ms")]
    pub start_release_jitter_max_ms: u64,
    #[serde(default = "default_overtake_gap_threshold_ms")]
    pub overtake_gap_threshold_ms: u64,
    #[serde(default = "default_overtake_progress_bonus")]
    pub overtake_progress_bonus: f64,
    #[serde(default = "default_crew_wait_timeout_ms")]
    pub crew_wait_timeout_ms: u64,
    #[serde(default = "default_settling_delay_ms")]
    pub settling_delay_ms: u64,
    #[serde(default = "default_ready_poll_interval_ms")]
    pub ready_poll_interval_ms: u64,
    /// Seed for the grid shuffle; None draws a fresh grid every race.
    #[serde(default)]
    pub grid_seed: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            base_segment_time_ms: default_base_segment_time_ms(),
            pit_service_min_ms: default_pit_service_min_ms(),
            pit_service_max_ms: default_pit_service_max_ms(),
            gui_update_interval_ms: default_gui_update_interval_ms(),
            strategy_interval_ms: default_strategy_interval_ms(),
            critical_tire_wear_pct: default_critical_tire_wear_pct(),
            mandatory_pit_earliest_lap: default_mandatory_pit_earliest_lap(),
            mandatory_pit_laps_before_end: default_mandatory_pit_laps_before_end(),
            start_light_interval_ms: default_start_light_interval_ms(),
            start_release_jitter_min_ms: default_start_release_jitter_min_ms(),
            start_release_jitter_max_ms: default_start_release_jitter_max_ms(),
            overtake_gap_threshold_ms: default_overtake_gap_threshold_ms(),
            overtake_progress_bonus: default_overtake_progress_bonus(),
            crew_wait_timeout_ms: default_crew_wait_timeout_ms(),
            settling_delay_ms: default_settling_delay_ms(),
            ready_poll_interval_ms: default_ready_poll_interval_ms(),
            grid_seed: None,
        }
    }
}

impl SimConfig {
    /// Latest lap on which the mandatory stop may still be taken.
    pub fn latest_pit_lap(&self, total_laps: u32) -> u32 {
        total_laps.saturating_sub(self.mandatory_pit_laps_before_end)
    }

    /// Okno pit stopu: [najwcześniejsza runda, runda końcowa - margines].
    pub fn is_in_pit_window(&self, lap: u32, total_laps: u32) -> bool {
        lap >= self.mandatory_pit_earliest_lap && lap <= self.latest_pit_lap(total_laps)
    }

    /// Compound choice by remaining laps: hard above 15, medium in 8..=15,
    /// soft below 8.
    pub fn compound_for_remaining_laps(&self, remaining: u32) -> TireCompound {
        if remaining > 15 {
            TireCompound::Hard
        } else if remaining >= 8 {
            TireCompound::Medium
        } else {
            TireCompound::Soft
        }
    }

    pub fn is_valid_speed_factor(factor: f64) -> bool {
        AVAILABLE_SPEED_FACTORS.iter().any(|&f| (f - factor).abs() < f64::EPSILON)
    }
}

/// read_sim_config reads the JSON file and decodes it into the simulation
/// configuration record. Missing fields fall back to their defaults.
pub fn read_sim_config(filepath: &Path) -> anyhow::Result<SimConfig> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open configuration file {}!",
            filepath.display()
        ))?;
    let config = serde_json::from_reader(&fh).context(format!(
        "Failed to parse configuration file {}!",
        filepath.display()
    ))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let config = SimConfig::default();
        assert_eq!(config.base_segment_time_ms, 1300);
        assert_eq!(config.pit_service_min_ms, 2000);
        assert_eq!(config.pit_service_max_ms, 4000);
        assert_eq!(config.gui_update_interval_ms, 100);
        assert_eq!(config.strategy_interval_ms, 1000);
        assert_eq!(config.critical_tire_wear_pct, 80.0);
        assert_eq!(config.overtake_gap_threshold_ms, 1000);
        assert_eq!(config.overtake_progress_bonus, 0.05);
    }

    #[test]
    fn pit_window_bounds() {
        let config = SimConfig::default();
        assert_eq!(config.latest_pit_lap(30), 25);
        assert!(!config.is_in_pit_window(7, 30));
        assert!(config.is_in_pit_window(8, 30));
        assert!(config.is_in_pit_window(25, 30));
        assert!(!config.is_in_pit_window(26, 30));
    }

    #[test]
    fn compound_choice_by_remaining_laps() {
        let config = SimConfig::default();
        assert_eq!(config.compound_for_remaining_laps(20), TireCompound::Hard);
        assert_eq!(config.compound_for_remaining_laps(16), TireCompound::Hard);
        assert_eq!(config.compound_for_remaining_laps(15), TireCompound::Medium);
        assert_eq!(config.compound_for_remaining_laps(8), TireCompound::Medium);
        assert_eq!(config.compound_for_remaining_laps(7), TireCompound::Soft);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SimConfig = serde_json::from_str(r#"{"strategy_interval_ms": 50}"#).unwrap();
        assert_eq!(config.strategy_interval_ms, 50);
        assert_eq!(config.base_segment_time_ms, 1300);
    }

    #[test]
    fn only_documented_speed_factors_are_valid() {
        assert!(SimConfig::is_valid_speed_factor(1.0));
        assert!(SimConfig::is_valid_speed_factor(10.0));
        assert!(!SimConfig::is_valid_speed_factor(3.0));
    }
}
