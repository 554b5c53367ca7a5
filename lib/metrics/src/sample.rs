use core::fmt;
use getset::CopyGetters;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use typed_builder::TypedBuilder;

/// Resource whose used/total pair is carried by a [`Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Ram,
    Disk,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Ram => write!(f, "RAM"),
            Resource::Disk => write!(f, "disk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("CPU usage {0} is outside [0, 100]")]
    CpuOutOfRange(f64),
    #[error("{resource} used ({used} MB) exceeds total ({total} MB)")]
    UsedExceedsTotal {
        resource: Resource,
        used: u64,
        total: u64,
    },
}

/// One snapshot of host utilisation, taken once per tick.
///
/// A `Sample` has no setters: once built it is only read. Zero is the
/// "unavailable" sentinel for every field, so [`Sample::unavailable`] is a valid
/// sample that plugins receive like any other.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, CopyGetters, TypedBuilder,
)]
#[getset(get_copy = "pub")]
pub struct Sample {
    /// Global CPU usage in percent, within [0, 100].
    #[builder(default)]
    cpu_usage_percent: f64,
    #[builder(default)]
    ram_used_mb: u64,
    #[builder(default)]
    ram_total_mb: u64,
    #[builder(default)]
    disk_used_mb: u64,
    #[builder(default)]
    disk_total_mb: u64,
}

impl Sample {
    /// The all-zero sample reported when nothing could be read.
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Check the data contract: CPU within [0, 100], and `used <= total` for
    /// each resource whenever both values are non-zero.
    pub fn validate(&self) -> Result<(), SampleError> {
        if !self.cpu_usage_percent.is_finite() || !(0.0..=100.0).contains(&self.cpu_usage_percent)
        {
            return Err(SampleError::CpuOutOfRange(self.cpu_usage_percent));
        }

        check_pair(Resource::Ram, self.ram_used_mb, self.ram_total_mb)?;
        check_pair(Resource::Disk, self.disk_used_mb, self.disk_total_mb)
    }
}

fn check_pair(resource: Resource, used: u64, total: u64) -> Result<(), SampleError> {
    if used != 0 && total != 0 && used > total {
        return Err(SampleError::UsedExceedsTotal {
            resource,
            used,
            total,
        });
    }
    Ok(())
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CPU Usage={:.2}%, RAM Usage={}/{}MB, Disk Usage={}/{}MB",
            self.cpu_usage_percent,
            self.ram_used_mb,
            self.ram_total_mb,
            self.disk_used_mb,
            self.disk_total_mb
        )
    }
}
