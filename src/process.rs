//! Read-only process figures: uptime and memory usage.

use std::time::Instant;

use once_cell::sync::Lazy;
use serde::Serialize;
use sysinfo::System;

static STARTED_AT: Lazy<Instant> = Lazy::new(Instant::now);

/// Pin the process start instant. Call once, early in `main`.
pub fn init() {
    Lazy::force(&STARTED_AT);
}

/// Seconds since process start (monotonic).
pub fn uptime() -> f64 {
    STARTED_AT.elapsed().as_secs_f64()
}

/// Memory usage snapshot, all figures in bytes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Resident set size of this process.
    pub rss: u64,
    /// Virtual memory size of this process.
    #[serde(rename = "virtual")]
    pub virtual_memory: u64,
    /// Total system memory.
    pub system_total: u64,
    /// Used system memory.
    pub system_used: u64,
}

/// Take a memory usage snapshot.
///
/// Process figures are zero when the platform does not expose them.
pub fn memory_usage() -> MemoryUsage {
    let mut system = System::new();
    system.refresh_memory();

    let mut usage = MemoryUsage {
        system_total: system.total_memory(),
        system_used: system.used_memory(),
        ..MemoryUsage::default()
    };

    if let Ok(pid) = sysinfo::get_current_pid() {
        if system.refresh_process(pid) {
            if let Some(process) = system.process(pid) {
                usage.rss = process.memory();
                usage.virtual_memory = process.virtual_memory();
            }
        }
    }

    usage
}
