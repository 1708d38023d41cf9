// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{TimeZone, Utc};
use kompas_core::HealthStatus;
use kompas_host::{
    CpuMetrics, DiskMetrics, HostSnapshot, ModelServerMetrics, RamMetrics, SwapMetrics,
    TemperatureMetrics, VectorIndexMetrics,
};

/// Builds deterministic host snapshots.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: HostSnapshot,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    /// A calm 16 GB machine with one local model.
    pub fn new() -> Self {
        Self {
            snapshot: HostSnapshot {
                timestamp: Utc.with_ymd_and_hms(2026, 2, 20, 9, 0, 0).single().unwrap_or_default(),
                ram: RamMetrics {
                    percent: 40.0,
                    used_gb: 6.4,
                    total_gb: 16.0,
                    available_gb: 9.6,
                },
                swap: SwapMetrics {
                    percent: 5.0,
                    used_gb: 0.1,
                    total_gb: 2.0,
                },
                cpu: CpuMetrics {
                    load_1min: 1.2,
                    load_5min: 1.0,
                    load_15min: 0.8,
                    percent: 12.5,
                    cores: 8,
                },
                disk: DiskMetrics {
                    free_gb: 200.0,
                    total_gb: 500.0,
                    percent_used: 60.0,
                },
                temperature: TemperatureMetrics { cpu_temp_c: None },
                ollama: ModelServerMetrics {
                    models: vec!["mistral-small3.1:24b".to_string()],
                    model_count: 1,
                    total_memory_gb: 14.0,
                    status: HealthStatus::Healthy,
                },
                vector_index: VectorIndexMetrics {
                    doc_count: 1200,
                    size_mb: 35.5,
                },
            },
        }
    }

    pub fn ram_percent(mut self, percent: f64) -> Self {
        self.snapshot.ram.percent = percent;
        self
    }

    pub fn swap_percent(mut self, percent: f64) -> Self {
        self.snapshot.swap.percent = percent;
        self
    }

    pub fn disk_percent(mut self, percent: f64) -> Self {
        self.snapshot.disk.percent_used = percent;
        self
    }

    pub fn cpu_temp(mut self, celsius: f64) -> Self {
        self.snapshot.temperature.cpu_temp_c = Some(celsius);
        self
    }

    pub fn model_server_down(mut self) -> Self {
        self.snapshot.ollama = ModelServerMetrics::unreachable("connection refused");
        self
    }

    pub fn build(self) -> HostSnapshot {
        self.snapshot
    }
}
