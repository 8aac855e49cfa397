use std::time::Duration;

/// scale_time divides a base duration in milliseconds by the simulation-speed
/// factor. The result is floored at 1 ms so that sleeps never degenerate to
/// busy loops at high speed factors.
pub fn scale_time(base_ms: u64, speed_factor: f64) -> Duration {
    if speed_factor <= 0.0 {
        panic!("Speed factor must be > 0, but is {:.3}!", speed_factor)
    }
    let scaled = (base_ms as f64 / speed_factor) as u64;
    Duration::from_millis(scaled.max(1))
}

/// format_time_ms renders a millisecond duration as m:ss.mmm for result
/// tables and lap logs.
pub fn format_time_ms(time_ms: u64) -> String {
    let minutes = time_ms / 60_000;
    let seconds = (time_ms % 60_000) / 1000;
    let millis = time_ms % 1000;
    format!("{}:{:02}.{:03}", minutes, seconds, millis)
}

/// format_gap_ms renders a gap to the leader, "-" for the leader itself.
pub fn format_gap_ms(gap_ms: u64) -> String {
    if gap_ms == 0 {
        "-".to_string()
    } else {
        format!("+{}.{:03}s", gap_ms / 1000, gap_ms % 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_time_divides_by_factor() {
        assert_eq!(scale_time(1000, 1.0), Duration::from_millis(1000));
        assert_eq!(scale_time(1000, 2.0), Duration::from_millis(500));
        assert_eq!(scale_time(1300, 10.0), Duration::from_millis(130));
    }

    #[test]
    fn scale_time_floors_at_one_ms() {
        assert_eq!(scale_time(5, 10.0), Duration::from_millis(1));
        assert_eq!(scale_time(0, 1.0), Duration::from_millis(1));
    }

    #[test]
    #[should_panic]
    fn scale_time_rejects_non_positive_factor() {
        scale_time(1000, 0.0);
    }

    #[test]
    fn format_time_renders_minutes_seconds_millis() {
        assert_eq!(format_time_ms(83_456), "1:23.456");
        assert_eq!(format_time_ms(999), "0:00.999");
    }

    #[test]
    fn format_gap_marks_leader() {
        assert_eq!(format_gap_ms(0), "-");
        assert_eq!(format_gap_ms(12_345), "+12.345s");
    }
}
