// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host status classification and recommendations.
//!
//! Only RAM, swap, disk usage and CPU temperature are interpreted; every
//! other gauge is shown as-is.

use kompas_config::model::ThresholdConfig;
use kompas_host::HostSnapshot;
use serde::Serialize;
use strum::Display;

/// Overall host state, driven by RAM pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    #[strum(serialize = "🟢 GEZOND")]
    Healthy,
    #[strum(serialize = "🟠 LET OP")]
    Caution,
    #[strum(serialize = "🔴 KRITIEK")]
    Critical,
}

impl HostStatus {
    pub fn classify(snapshot: &HostSnapshot, thresholds: &ThresholdConfig) -> Self {
        let ram = snapshot.ram.percent;
        if ram > thresholds.ram_critical {
            HostStatus::Critical
        } else if ram > thresholds.ram_caution {
            HostStatus::Caution
        } else {
            HostStatus::Healthy
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[strum(serialize = "✅")]
    Ok,
    #[strum(serialize = "ℹ️ ")]
    Info,
    #[strum(serialize = "⚠️ ")]
    Warning,
    #[strum(serialize = "🚨")]
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub severity: Severity,
    pub message: String,
}

impl Recommendation {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

/// Dutch advice for the current snapshot. Always yields at least the RAM line.
pub fn recommendations(snapshot: &HostSnapshot, thresholds: &ThresholdConfig) -> Vec<Recommendation> {
    let mut out = Vec::new();

    let ram = snapshot.ram.percent;
    out.push(if ram > thresholds.ram_warn {
        Recommendation::new(
            Severity::Warning,
            "RAM nadert de limiet: sluit zware applicaties zoals browsers",
        )
    } else if ram > thresholds.ram_moderate {
        Recommendation::new(Severity::Info, "RAM-gebruik gemiddeld: blijf monitoren")
    } else {
        Recommendation::new(Severity::Ok, "RAM-gebruik gezond")
    });

    let swap = snapshot.swap.percent;
    if swap > thresholds.swap_warn {
        out.push(Recommendation::new(
            Severity::Warning,
            format!("Swapgebruik {swap:.0}%: overweeg een RAM-upgrade"),
        ));
    }

    if snapshot.disk.percent_used > thresholds.disk_full {
        out.push(Recommendation::new(
            Severity::Critical,
            "Schijf bijna vol: opruimen nodig",
        ));
    }

    if let Some(temp) = snapshot.temperature.cpu_temp_c
        && temp > thresholds.cpu_temp_warn
    {
        out.push(Recommendation::new(
            Severity::Warning,
            format!("CPU-temperatuur {temp:.0}°C: controleer de koeling"),
        ));
    }

    out
}
