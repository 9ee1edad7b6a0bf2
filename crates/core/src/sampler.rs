//! Point-in-time process resource snapshots.
//!
//! The pipeline samples once before and once after the encode step and
//! differences the two. Nothing isolates the encoder from other activity in
//! the process, so the delta is an estimate.

use serde::{Deserialize, Serialize};

/// CPU and memory usage of the current process at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// CPU time spent in user mode, seconds
    pub cpu_user_secs: f64,
    /// CPU time spent in kernel mode, seconds
    pub cpu_system_secs: f64,
    /// Resident set size, bytes
    pub rss_bytes: u64,
    /// Virtual memory size, bytes
    pub vms_bytes: u64,
}

/// Difference between two snapshots (`after - before`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceDelta {
    pub cpu_user_secs: f64,
    pub cpu_system_secs: f64,
    pub rss_bytes: i64,
    pub vms_bytes: i64,
}

impl ResourceSnapshot {
    /// Field-wise `after - self`. Memory deltas are signed.
    pub fn delta(&self, after: &ResourceSnapshot) -> ResourceDelta {
        ResourceDelta {
            cpu_user_secs: after.cpu_user_secs - self.cpu_user_secs,
            cpu_system_secs: after.cpu_system_secs - self.cpu_system_secs,
            rss_bytes: after.rss_bytes as i64 - self.rss_bytes as i64,
            vms_bytes: after.vms_bytes as i64 - self.vms_bytes as i64,
        }
    }
}

/// Source of resource snapshots.
pub trait ResourceSampler {
    fn sample(&self) -> ResourceSnapshot;
}

/// Samples the running process through the OS.
///
/// Linux reads `/proc/self/stat` and `/proc/self/statm`; elsewhere every
/// field is zero. Read failures also give zero fields rather than errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSampler;

impl ProcessSampler {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceSampler for ProcessSampler {
    fn sample(&self) -> ResourceSnapshot {
        #[cfg(target_os = "linux")]
        {
            let snapshot = procfs::capture();
            tracing::debug!(
                cpu_user_secs = snapshot.cpu_user_secs,
                rss_bytes = snapshot.rss_bytes,
                "sampled process resources"
            );
            snapshot
        }
        #[cfg(not(target_os = "linux"))]
        {
            ResourceSnapshot::default()
        }
    }
}

#[cfg(target_os = "linux")]
mod procfs {
    use super::ResourceSnapshot;

    /// USER_HZ; 100 on every mainstream Linux configuration
    const CLOCK_TICKS_PER_SEC: f64 = 100.0;
    /// typical
    const PAGE_SIZE: u64 = 4096;

    pub(super) fn capture() -> ResourceSnapshot {
        let (cpu_user_secs, cpu_system_secs) = std::fs::read_to_string("/proc/self/stat")
            .ok()
            .and_then(|stat| parse_stat_cpu(&stat))
            .unwrap_or_default();
        let (vms_bytes, rss_bytes) = std::fs::read_to_string("/proc/self/statm")
            .ok()
            .and_then(|statm| parse_statm(&statm))
            .unwrap_or_default();

        ResourceSnapshot {
            cpu_user_secs,
            cpu_system_secs,
            rss_bytes,
            vms_bytes,
        }
    }

    /// `(utime, stime)` in seconds from a `/proc/<pid>/stat` line.
    ///
    /// The command name (field 2) may contain spaces, so fields are counted
    /// from the closing parenthesis. utime and stime are fields 14 and 15.
    pub(super) fn parse_stat_cpu(stat: &str) -> Option<(f64, f64)> {
        let rest = &stat[stat.rfind(')')? + 1..];
        let mut fields = rest.split_whitespace().skip(11);
        let utime: u64 = fields.next()?.parse().ok()?;
        let stime: u64 = fields.next()?.parse().ok()?;
        Some((
            utime as f64 / CLOCK_TICKS_PER_SEC,
            stime as f64 / CLOCK_TICKS_PER_SEC,
        ))
    }

    /// `(vms, rss)` in bytes from `/proc/<pid>/statm` (sizes in pages).
    pub(super) fn parse_statm(statm: &str) -> Option<(u64, u64)> {
        let mut parts = statm.split_whitespace();
        let vms_pages: u64 = parts.next()?.parse().ok()?;
        let rss_pages: u64 = parts.next()?.parse().ok()?;
        Some((vms_pages * PAGE_SIZE, rss_pages * PAGE_SIZE))
    }
}

/// Sampler that always returns the same snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSampler(pub ResourceSnapshot);

impl ResourceSampler for FixedSampler {
    fn sample(&self) -> ResourceSnapshot {
        self.0
    }
}
