// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assembly of one full report cycle: host snapshot plus monthly usage.

use chrono::{DateTime, NaiveDate, Utc};
use kompas_config::KompasConfig;
use kompas_core::KompasError;
use kompas_host::{HostSampler, HostSnapshot};
use kompas_usage::{
    LedgerReader, Lookback, MonthPeriod, UsageAnalyzer, UsageReport, UsageSource,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::assess::{recommendations, HostStatus, Recommendation};

/// Structured form of `kompas report`; the text view renders the same fields.
#[derive(Debug, Clone, Serialize)]
pub struct ServerReport {
    pub timestamp: DateTime<Utc>,
    pub status: HostStatus,
    pub metrics: HostSnapshot,
    pub tokens: UsageReport,
    pub recommendations: Vec<Recommendation>,
}

impl ServerReport {
    pub fn new(snapshot: HostSnapshot, tokens: UsageReport, config: &KompasConfig) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            status: HostStatus::classify(&snapshot, &config.thresholds),
            recommendations: recommendations(&snapshot, &config.thresholds),
            metrics: snapshot,
            tokens,
        }
    }
}

/// Open the configured ledger read-only.
pub async fn open_ledger(config: &KompasConfig) -> Result<LedgerReader, KompasError> {
    debug!(path = %config.ledger.database_path, table = %config.ledger.table, "opening usage ledger");
    LedgerReader::open(&config.ledger.database_path, &config.ledger.table).await
}

/// Usage report for `period` from any source.
pub async fn usage_report<S: UsageSource>(
    source: S,
    config: &KompasConfig,
    period: MonthPeriod,
    today: NaiveDate,
) -> Result<UsageReport, KompasError> {
    UsageAnalyzer::from_config(source, config)
        .report(period, today, Lookback::from_config(&config.report))
        .await
}

/// Sample the host and read the ledger for one `kompas report` run.
///
/// A ledger failure fails the whole cycle; host probe failures only
/// degrade their section of the snapshot.
pub async fn server_report<S: UsageSource>(
    source: S,
    config: &KompasConfig,
    period: MonthPeriod,
    today: NaiveDate,
) -> Result<ServerReport, KompasError> {
    let sampler = HostSampler::from_config(&config.host)?;
    let (snapshot, tokens) = tokio::join!(
        sampler.sample(),
        usage_report(source, config, period, today)
    );
    let report = ServerReport::new(snapshot?, tokens?, config);
    info!(status = ?report.status, period = %period, "server report assembled");
    Ok(report)
}
