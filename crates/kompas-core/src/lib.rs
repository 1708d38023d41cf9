// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the kompas telemetry workspace.
//!
//! Holds the error taxonomy shared by every crate and the handful of small
//! types that cross crate boundaries (report format, probe health).

pub mod error;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KompasError;
pub use types::{HealthStatus, ReportFormat};
