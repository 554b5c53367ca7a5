use std::{fmt::Write, time::Duration};

/// Pretty-print the elapsed time (used in progress bars)
pub fn elapsed_subsec(state: &indicatif::ProgressState, writer: &mut dyn Write) {
    let seconds = state.elapsed().as_secs();
    let sub_seconds = (state.elapsed().as_millis() % 1000) / 100;
    let _ = writer.write_str(&format!("{}.{}s", seconds, sub_seconds));
}

/// Pretty-print a duration with the largest fitting unit (used in logs).
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();

    if duration < Duration::from_millis(1) {
        format!("{:.3}μs", duration.as_nanos() as f64 / 1_000.0)
    } else if duration < Duration::from_secs(1) {
        format!("{:.3}ms", secs * 1_000.0)
    } else if duration < Duration::from_secs(60) {
        format!("{:.3}s", secs)
    } else if duration < Duration::from_secs(3_600) {
        format!("{:.3}m", secs / 60.0)
    } else {
        format!("{:.3}h", secs / 3_600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_each_unit() {
        assert_eq!(format_duration(Duration::from_nanos(1_500)), "1.500μs");
        assert_eq!(format_duration(Duration::from_micros(2_250)), "2.250ms");
        assert_eq!(format_duration(Duration::from_millis(1_500)), "1.500s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.500m");
        assert_eq!(format_duration(Duration::from_secs(5_400)), "1.500h");
    }

    #[test]
    fn zero_is_microseconds() {
        assert_eq!(format_duration(Duration::ZERO), "0.000μs");
    }
}
