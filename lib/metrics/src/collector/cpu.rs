use std::time::Instant;
use sysinfo::{System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::{instrument, trace};

/// Reads global CPU usage from consecutive refreshes of a long-lived [`System`].
///
/// CPU usage is a diff between two refreshes, so the probe remembers when it
/// last refreshed and waits out the remainder of
/// [`MINIMUM_CPU_UPDATE_INTERVAL`] when called too early.
#[derive(Debug)]
pub(crate) struct CpuProbe {
    last_refresh: Instant,
}

impl CpuProbe {
    /// Takes the first reading so the next [`CpuProbe::read`] has a baseline.
    pub fn new(system: &mut System) -> Self {
        system.refresh_cpu();
        Self {
            last_refresh: Instant::now(),
        }
    }

    /// Must run on a blocking-capable thread: it may sleep.
    #[instrument(skip_all)]
    pub fn read(&mut self, system: &mut System) -> f64 {
        let since_last = self.last_refresh.elapsed();
        if since_last < MINIMUM_CPU_UPDATE_INTERVAL {
            trace!(?since_last, "Waiting for the minimum CPU update interval");
            std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL - since_last);
        }

        system.refresh_cpu();
        self.last_refresh = Instant::now();

        normalize_cpu(system.global_cpu_info().cpu_usage())
    }
}

/// Clamp into [0, 100] and round to two decimals; NaN becomes the `0` sentinel.
pub(crate) fn normalize_cpu(raw: f32) -> f64 {
    if !raw.is_finite() {
        return 0.0;
    }
    let clamped = f64::from(raw).clamp(0.0, 100.0);
    (clamped * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(normalize_cpu(12.345_6), 12.35);
        assert_eq!(normalize_cpu(0.0), 0.0);
    }

    #[test]
    fn clamps_out_of_range_readings() {
        assert_eq!(normalize_cpu(-3.0), 0.0);
        assert_eq!(normalize_cpu(100.7), 100.0);
    }

    #[test]
    fn nan_is_the_unavailable_sentinel() {
        assert_eq!(normalize_cpu(f32::NAN), 0.0);
        assert_eq!(normalize_cpu(f32::INFINITY), 0.0);
    }
}
