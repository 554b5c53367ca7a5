use crate::sample::Sample;
use crate::source::{CollectError, MetricsSource};
use async_trait::async_trait;
use core::fmt;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysinfo::{Disks, System};
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

pub mod cpu;
pub mod disk;
pub mod memory;

pub use disk::default_mount_point;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Handles to the OS counters, kept alive between ticks so CPU usage can be
/// computed from consecutive refreshes.
struct HostHandles {
    system: System,
    disks: Disks,
    cpu: cpu::CpuProbe,
}

/// A reference-counted, lock-protected reference to the host handles.
type HostHandlesRef = Arc<Mutex<HostHandles>>;

impl HostHandles {
    fn new() -> Self {
        let mut system = System::new();
        let cpu = cpu::CpuProbe::new(&mut system);

        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            cpu,
        }
    }

    fn read(&mut self, mount_point: &Path) -> Sample {
        let cpu_usage_percent = self.cpu.read(&mut self.system);
        let (ram_used_mb, ram_total_mb) = memory::read_memory(&mut self.system);
        let (disk_used_mb, disk_total_mb) = disk::read_disk(&mut self.disks, mount_point);

        Sample::builder()
            .cpu_usage_percent(cpu_usage_percent)
            .ram_used_mb(ram_used_mb)
            .ram_total_mb(ram_total_mb)
            .disk_used_mb(disk_used_mb)
            .disk_total_mb(disk_total_mb)
            .build()
    }
}

/// [`MetricsSource`] backed by `sysinfo`, which picks the right OS counters
/// for the platform it was built for.
///
/// Reads run on tokio's blocking pool and are joined before `sample` returns,
/// unless the run is cancelled first.
#[derive(Clone)]
pub struct SystemMetricsSource {
    handles: HostHandlesRef,
    mount_point: PathBuf,
}

impl SystemMetricsSource {
    /// Create a source reporting the disk mounted at `mount_point`, or the
    /// system root when `None`.
    pub fn new(mount_point: Option<PathBuf>) -> Self {
        let mount_point = mount_point.unwrap_or_else(default_mount_point);
        debug!(?mount_point, "Initializing system metrics source");

        Self {
            handles: Arc::new(Mutex::new(HostHandles::new())),
            mount_point,
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }
}

impl fmt::Debug for SystemMetricsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemMetricsSource")
            .field("mount_point", &self.mount_point)
            .finish()
    }
}

#[async_trait]
impl MetricsSource for SystemMetricsSource {
    #[inline]
    fn name(&self) -> String {
        "SystemMetricsSource".to_string()
    }

    #[instrument(skip_all)]
    async fn sample(&self, cancel: &CancellationToken) -> Result<Sample, CollectError> {
        let handles = self.handles.clone();
        let mount_point = self.mount_point.clone();
        let read = task::spawn_blocking(move || handles.lock().read(&mount_point));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CollectError::Cancelled),
            joined = read => Ok(joined?),
        }
    }
}

pub(crate) fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / BYTES_PER_MB
}

/// Enforce the `used <= total` contract on a freshly read pair. A missing total
/// makes the pair meaningless, so it collapses to the `(0, 0)` sentinel.
pub(crate) fn normalize_usage(used: u64, total: u64) -> (u64, u64) {
    if total == 0 {
        (0, 0)
    } else {
        (used.min(total), total)
    }
}
