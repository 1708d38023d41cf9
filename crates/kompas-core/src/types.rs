// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the kompas crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output format of a generated report.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable Dutch text.
    #[default]
    Text,
    /// Structured JSON carrying the same numbers as the text view.
    Json,
}

/// Health reported by a host probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum HealthStatus {
    /// Service is reachable and answered.
    Healthy,
    /// Service answered but something is off.
    Degraded(String),
    /// Service could not be reached.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}
