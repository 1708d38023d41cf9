// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory, CPU, disk and temperature readings via sysinfo.
//!
//! Everything here blocks (the CPU reading needs two samples some time
//! apart), so callers run it on the blocking pool.

use std::path::Path;

use sysinfo::{Components, Disks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use tracing::debug;

use crate::snapshot::{
    percent, round2, CpuMetrics, DiskMetrics, RamMetrics, SwapMetrics, TemperatureMetrics,
    BYTES_PER_GB,
};

/// Sensor labels that usually describe the CPU package.
const CPU_SENSOR_HINTS: &[&str] = &["cpu", "package", "tdie", "tctl", "core", "soc"];

#[derive(Debug, Clone, Default)]
pub struct SystemReading {
    pub ram: RamMetrics,
    pub swap: SwapMetrics,
    pub cpu: CpuMetrics,
    pub disk: DiskMetrics,
    pub temperature: TemperatureMetrics,
}

/// Take one blocking reading of the local machine.
pub fn read_system(disk_mount: &Path) -> SystemReading {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_cpu_all();
    std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu_all();

    let reading = SystemReading {
        ram: ram(&sys),
        swap: swap(&sys),
        cpu: cpu(&sys),
        disk: disk(disk_mount),
        temperature: temperature(),
    };
    debug!(
        ram_percent = reading.ram.percent,
        cpu_percent = reading.cpu.percent,
        disk_percent = reading.disk.percent_used,
        "system sampled"
    );
    reading
}

fn ram(sys: &System) -> RamMetrics {
    let total = sys.total_memory();
    let available = sys.available_memory();
    RamMetrics {
        percent: percent(total.saturating_sub(available), total),
        used_gb: round2(sys.used_memory() as f64 / BYTES_PER_GB),
        total_gb: round2(total as f64 / BYTES_PER_GB),
        available_gb: round2(available as f64 / BYTES_PER_GB),
    }
}

fn swap(sys: &System) -> SwapMetrics {
    SwapMetrics {
        percent: percent(sys.used_swap(), sys.total_swap()),
        used_gb: round2(sys.used_swap() as f64 / BYTES_PER_GB),
        total_gb: round2(sys.total_swap() as f64 / BYTES_PER_GB),
    }
}

fn cpu(sys: &System) -> CpuMetrics {
    let load = System::load_average();
    CpuMetrics {
        load_1min: round2(load.one),
        load_5min: round2(load.five),
        load_15min: round2(load.fifteen),
        percent: round2(f64::from(sys.global_cpu_usage())),
        cores: sys.cpus().len(),
    }
}

fn disk(mount: &Path) -> DiskMetrics {
    let disks = Disks::new_with_refreshed_list();
    // The deepest mount point that contains `mount`.
    let Some(disk) = disks
        .list()
        .iter()
        .filter(|d| mount.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len())
    else {
        return DiskMetrics::default();
    };

    let total = disk.total_space();
    let free = disk.available_space();
    DiskMetrics {
        free_gb: round2(free as f64 / BYTES_PER_GB),
        total_gb: round2(total as f64 / BYTES_PER_GB),
        percent_used: percent(total.saturating_sub(free), total),
    }
}

fn temperature() -> TemperatureMetrics {
    let components = Components::new_with_refreshed_list();
    let readings: Vec<(String, f32)> = components
        .list()
        .iter()
        .filter_map(|c| c.temperature().map(|t| (c.label().to_lowercase(), t)))
        .filter(|(_, t)| t.is_finite() && *t > 0.0)
        .collect();

    let cpu = readings
        .iter()
        .find(|(label, _)| CPU_SENSOR_HINTS.iter().any(|hint| label.contains(hint)))
        .or_else(|| readings.first());

    TemperatureMetrics {
        cpu_temp_c: cpu.map(|(_, t)| round2(f64::from(*t))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_is_internally_consistent() {
        let reading = read_system(Path::new("/"));
        assert!((0.0..=100.0).contains(&reading.ram.percent));
        assert!((0.0..=100.0).contains(&reading.swap.percent));
        assert!(reading.ram.total_gb >= reading.ram.available_gb);
        assert!(reading.disk.percent_used <= 100.0);
    }
}
