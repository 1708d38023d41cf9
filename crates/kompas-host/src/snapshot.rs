// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The host snapshot handed to the report assembler.

use chrono::{DateTime, Utc};
use kompas_core::HealthStatus;
use serde::{Deserialize, Serialize};

pub(crate) const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;
pub(crate) const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Round a gauge to two decimals for display.
pub(crate) fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round() / 100.0
    } else {
        0.0
    }
}

/// Percentage of `part` in `whole`; zero when `whole` is zero.
pub(crate) fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RamMetrics {
    pub percent: f64,
    pub used_gb: f64,
    pub total_gb: f64,
    pub available_gb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SwapMetrics {
    pub percent: f64,
    pub used_gb: f64,
    pub total_gb: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub load_1min: f64,
    pub load_5min: f64,
    pub load_15min: f64,
    pub percent: f64,
    pub cores: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub free_gb: f64,
    pub total_gb: f64,
    pub percent_used: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemperatureMetrics {
    /// Absent when no sensor is readable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_temp_c: Option<f64>,
}

/// Local model server state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelServerMetrics {
    pub models: Vec<String>,
    pub model_count: usize,
    pub total_memory_gb: f64,
    pub status: HealthStatus,
}

impl ModelServerMetrics {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            models: Vec::new(),
            model_count: 0,
            total_memory_gb: 0.0,
            status: HealthStatus::Unhealthy(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorIndexMetrics {
    pub doc_count: u64,
    pub size_mb: f64,
}

/// One reading of the machine the assistant runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub timestamp: DateTime<Utc>,
    pub ram: RamMetrics,
    pub swap: SwapMetrics,
    pub cpu: CpuMetrics,
    pub disk: DiskMetrics,
    pub temperature: TemperatureMetrics,
    pub ollama: ModelServerMetrics,
    pub vector_index: VectorIndexMetrics,
}
