use helpers::general::{format_gap_ms, format_time_ms};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;

/// One row of the final classification.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ResultEntry {
    pub position: usize,
    pub car_no: u32,
    pub driver_name: String,
    pub driver_initials: String,
    pub team_name: String,
    pub total_time_ms: u64,
    pub best_lap_ms: u64,
    pub pit_stops: u32,
    pub gap_to_leader_ms: u64,
}

/// RaceResult contains everything required for post-processing a finished
/// race.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RaceResult {
    pub total_laps: u32,
    pub entries: Vec<ResultEntry>,
}

impl RaceResult {
    pub fn new(total_laps: u32, entries: Vec<ResultEntry>) -> RaceResult {
        RaceResult { total_laps, entries }
    }

    fn standings_table(&self) -> String {
        let mut table = String::new();
        writeln!(
            &mut table,
            "{:>3} | {:>3} | {:<22} | {:<16} | {:>9} | {:>9} | {:>4} | {:>10}",
            "Pos", "No", "Driver", "Team", "Total", "Best lap", "Pits", "Gap"
        )
        .unwrap();
        writeln!(&mut table, "{}", "-".repeat(95)).unwrap();

        for entry in &self.entries {
            writeln!(
                &mut table,
                "{:>3} | {:>3} | {:<22} | {:<16} | {:>9} | {:>9} | {:>4} | {:>10}",
                entry.position,
                entry.car_no,
                entry.driver_name,
                entry.team_name,
                format_time_ms(entry.total_time_ms),
                format_time_ms(entry.best_lap_ms),
                entry.pit_stops,
                format_gap_ms(entry.gap_to_leader_ms),
            )
            .unwrap();
        }
        table
    }

    /// print_standings prints the final classification to the console.
    pub fn print_standings(&self) {
        println!("RESULT: Final classification after {} laps", self.total_laps);
        println!("{}", self.standings_table());
    }

    /// write_standings_to_file writes the classification into output/.
    /// Returns the path of the written file.
    pub fn write_standings_to_file(
        &self,
        path: Option<&std::path::Path>,
    ) -> anyhow::Result<String> {
        let mut content = String::new();
        writeln!(
            &mut content,
            "RESULT: Final classification after {} laps",
            self.total_laps
        )?;
        writeln!(&mut content, "{}", self.standings_table())?;

        let out_dir = std::path::Path::new("output");
        std::fs::create_dir_all(out_dir)?;
        let out_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            out_dir.join("race_result.txt")
        };
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(content.as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }

    pub fn winner(&self) -> Option<&ResultEntry> {
        self.entries.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: usize, gap_ms: u64) -> ResultEntry {
        ResultEntry {
            position,
            car_no: position as u32,
            driver_name: format!("Driver {}", position),
            driver_initials: "DRV".to_string(),
            team_name: "Team".to_string(),
            total_time_ms: 600_000 + gap_ms,
            best_lap_ms: 19_500,
            pit_stops: 1,
            gap_to_leader_ms: gap_ms,
        }
    }

    #[test]
    fn table_lists_all_entries_in_order() {
        let result = RaceResult::new(30, vec![entry(1, 0), entry(2, 4_321)]);
        let table = result.standings_table();
        assert!(table.contains("Driver 1"));
        assert!(table.contains("Driver 2"));
        assert!(table.contains("+4.321s"));
        assert_eq!(result.winner().unwrap().position, 1);
    }
}
