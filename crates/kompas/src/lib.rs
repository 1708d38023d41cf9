// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report assembly and rendering behind the `kompas` binary.

pub mod assess;
pub mod format;
pub mod record;
pub mod render;
pub mod report;

pub use assess::{recommendations, HostStatus, Recommendation, Severity};
pub use record::{record_call, CallSpec};
pub use report::{server_report, usage_report, ServerReport};
