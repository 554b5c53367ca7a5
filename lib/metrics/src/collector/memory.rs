use super::{bytes_to_mb, normalize_usage};
use sysinfo::System;
use tracing::warn;

/// Returns `(used_mb, total_mb)` of physical memory.
pub(crate) fn read_memory(system: &mut System) -> (u64, u64) {
    system.refresh_memory();

    let total = bytes_to_mb(system.total_memory());
    let used = bytes_to_mb(system.used_memory());
    if total == 0 {
        warn!("Total memory reported as zero, memory usage unavailable");
    }

    normalize_usage(used, total)
}
