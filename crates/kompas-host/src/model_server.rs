// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Probe for the local model server's installed models.

use std::time::Duration;

use kompas_core::{HealthStatus, KompasError};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::snapshot::{round2, ModelServerMetrics, BYTES_PER_GB};

const PROBE: &str = "model_server";

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    #[serde(default)]
    name: Option<String>,
    /// Model size on disk in bytes.
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ModelServerProbe {
    client: reqwest::Client,
    base_url: String,
}

impl ModelServerProbe {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, KompasError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KompasError::HostProbe {
                probe: PROBE.to_string(),
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Query `/api/tags`. An unreachable server yields empty metrics
    /// marked unhealthy rather than an error.
    pub async fn probe(&self) -> ModelServerMetrics {
        match self.fetch().await {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "model server probe failed");
                ModelServerMetrics::unreachable(e.to_string())
            }
        }
    }

    async fn fetch(&self) -> Result<ModelServerMetrics, KompasError> {
        let url = format!("{}/api/tags", self.base_url);
        let probe_err = |message: String| KompasError::HostProbe {
            probe: PROBE.to_string(),
            message,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| probe_err(format!("request failed: {e}")))?;

        let status = response.status();
        debug!(status = %status, url = %url, "model server responded");
        if !status.is_success() {
            return Err(probe_err(format!("server returned {status}")));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| probe_err(format!("unexpected response body: {e}")))?;

        let total_bytes: u64 = tags.models.iter().filter_map(|m| m.size).sum();
        let models: Vec<String> = tags
            .models
            .into_iter()
            .map(|m| m.name.unwrap_or_else(|| "unknown".to_string()))
            .collect();

        Ok(ModelServerMetrics {
            model_count: models.len(),
            models,
            total_memory_gb: round2(total_bytes as f64 / BYTES_PER_GB),
            status: HealthStatus::Healthy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe(base_url: &str) -> ModelServerProbe {
        ModelServerProbe::new(base_url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn lists_installed_models() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "models": [
                {"name": "mistral-small3.1:24b", "size": 15_032_385_536_u64},
                {"name": "nomic-embed-text", "size": 274_302_450_u64},
                {}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let metrics = probe(&server.uri()).probe().await;
        assert_eq!(metrics.model_count, 3);
        assert_eq!(metrics.models[2], "unknown");
        assert_eq!(metrics.total_memory_gb, 14.26);
        assert!(metrics.status.is_healthy());
    }

    #[tokio::test]
    async fn server_error_is_unhealthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let metrics = probe(&server.uri()).probe().await;
        assert!(metrics.models.is_empty());
        assert!(matches!(metrics.status, HealthStatus::Unhealthy(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_unhealthy() {
        let metrics = probe("http://127.0.0.1:9").probe().await;
        assert_eq!(metrics.model_count, 0);
        assert!(!metrics.status.is_healthy());
    }
}
