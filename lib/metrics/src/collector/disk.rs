use super::{bytes_to_mb, normalize_usage};
use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::warn;

/// Mount point reported when none is configured: the system root.
pub fn default_mount_point() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

/// Returns `(used_mb, total_mb)` of the disk mounted at `mount_point`, or the
/// `(0, 0)` sentinel when no such disk is present.
pub(crate) fn read_disk(disks: &mut Disks, mount_point: &Path) -> (u64, u64) {
    disks.refresh_list();

    let usage = select_disk(
        disks
            .list()
            .iter()
            .map(|disk| (disk.mount_point(), disk.total_space(), disk.available_space())),
        mount_point,
    );

    usage.unwrap_or_else(|| {
        warn!(?mount_point, "No disk mounted at the configured mount point");
        (0, 0)
    })
}

/// Picks the entry `(mount_point, total_bytes, available_bytes)` mounted at
/// `mount_point` and converts it to `(used_mb, total_mb)`.
pub(crate) fn select_disk<'a, I>(entries: I, mount_point: &Path) -> Option<(u64, u64)>
where
    I: IntoIterator<Item = (&'a Path, u64, u64)>,
{
    entries
        .into_iter()
        .find(|(mount, _, _)| *mount == mount_point)
        .map(|(_, total, available)| {
            let total_mb = bytes_to_mb(total);
            let used_mb = bytes_to_mb(total.saturating_sub(available));
            normalize_usage(used_mb, total_mb)
        })
}
