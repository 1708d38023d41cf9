// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host metrics for the kompas report.
//!
//! [`HostSampler`] takes one [`HostSnapshot`] of the machine: memory, swap,
//! CPU load, disk, CPU temperature, the local model server and the local
//! vector index. Probe failures degrade the affected section to empty
//! values and are logged; only a panicking blocking task fails a sample.

pub mod model_server;
pub mod snapshot;
pub mod system;
pub mod vector_index;

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use kompas_config::model::HostConfig;
use kompas_core::KompasError;
use tracing::{info, warn};

pub use model_server::ModelServerProbe;
pub use snapshot::{
    CpuMetrics, DiskMetrics, HostSnapshot, ModelServerMetrics, RamMetrics, SwapMetrics,
    TemperatureMetrics, VectorIndexMetrics,
};

/// Samples the local machine and its AI services.
#[derive(Debug, Clone)]
pub struct HostSampler {
    disk_mount: PathBuf,
    model_server: ModelServerProbe,
    vector_index: Option<PathBuf>,
}

impl HostSampler {
    pub fn from_config(config: &HostConfig) -> Result<Self, KompasError> {
        Ok(Self {
            disk_mount: PathBuf::from(&config.disk_mount),
            model_server: ModelServerProbe::new(
                &config.ollama_url,
                Duration::from_secs(config.probe_timeout_secs),
            )?,
            vector_index: config.vector_index_path.as_ref().map(PathBuf::from),
        })
    }

    pub async fn sample(&self) -> Result<HostSnapshot, KompasError> {
        let mount = self.disk_mount.clone();
        let system = tokio::task::spawn_blocking(move || system::read_system(&mount));

        let index_path = self.vector_index.clone();
        let index = tokio::task::spawn_blocking(move || match index_path {
            Some(path) => vector_index::read_vector_index(&path),
            None => Ok(VectorIndexMetrics::default()),
        });

        let ollama = self.model_server.probe().await;

        let system = system
            .await
            .map_err(|e| KompasError::Internal(format!("system sampler panicked: {e}")))?;
        let vector_index = index
            .await
            .map_err(|e| KompasError::Internal(format!("vector index probe panicked: {e}")))?
            .unwrap_or_else(|e| {
                warn!(error = %e, "vector index probe failed");
                VectorIndexMetrics::default()
            });

        info!(
            ram_percent = system.ram.percent,
            models = ollama.model_count,
            documents = vector_index.doc_count,
            "host sampled"
        );

        Ok(HostSnapshot {
            timestamp: Utc::now(),
            ram: system.ram,
            swap: system.swap,
            cpu: system.cpu,
            disk: system.disk,
            temperature: system.temperature,
            ollama,
            vector_index,
        })
    }
}
