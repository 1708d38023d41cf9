// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only SQLite access to the usage ledger.
//!
//! Grouping and summation happen inside SQLite. Every numeric column goes
//! through the same zero-default expressions the in-memory path applies,
//! and costs are quantized to nano-units per record before summing, so the
//! two paths produce identical rows for the same record set.

use std::path::Path;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use kompas_core::KompasError;
use rusqlite::OpenFlags;
use tracing::debug;

use super::UsageSource;
use crate::calendar::{Window, SQL_INSTANT_FORMAT};
use crate::money::Amount;
use crate::record::{DailyRow, LedgerRow, UsageRecord};

const PROVIDER: &str = "COALESCE(NULLIF(CAST(provider AS TEXT), ''), 'unknown')";
const MODEL: &str = "COALESCE(NULLIF(CAST(model AS TEXT), ''), 'unknown')";
const PROJECT: &str = "COALESCE(NULLIF(CAST(project_id AS TEXT), ''), 'unknown')";
const INPUT_TOKENS: &str = "MAX(CAST(IFNULL(input_tokens, 0) AS INTEGER), 0)";
const OUTPUT_TOKENS: &str = "MAX(CAST(IFNULL(output_tokens, 0) AS INTEGER), 0)";
const COST: &str = "MAX(IFNULL(cost_eur, 0) * 1.0, 0.0)";
const COST_NANOS: &str = "CAST(ROUND(MAX(IFNULL(cost_eur, 0) * 1.0, 0.0) * 1000000000.0) AS INTEGER)";
const IN_WINDOW: &str = "datetime(timestamp) >= ?1 AND datetime(timestamp) < ?2";

/// Convert a tokio-rusqlite error into KompasError::Storage.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> KompasError {
    KompasError::Storage {
        source: Box::new(e),
    }
}

/// Whether `name` can be spliced into SQL as a table name.
pub(crate) fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Query layer over the ledger table. Holds one read-only connection.
pub struct LedgerReader {
    conn: tokio_rusqlite::Connection,
    table: String,
    location: String,
}

impl LedgerReader {
    /// Open the ledger file read-only.
    ///
    /// A missing file, an unopenable file or a missing table all yield
    /// [`KompasError::LedgerUnavailable`].
    pub async fn open(path: impl AsRef<Path>, table: &str) -> Result<Self, KompasError> {
        let path = path.as_ref();
        let location = path.display().to_string();
        if !path.is_file() {
            return Err(KompasError::LedgerUnavailable {
                path: location,
                reason: "no such file".to_string(),
            });
        }

        let conn = tokio_rusqlite::Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .await
        .map_err(|e| KompasError::LedgerUnavailable {
            path: location.clone(),
            reason: e.to_string(),
        })?;

        Self::with_location(conn, table, location).await
    }

    /// Wrap an existing connection, e.g. an in-memory database in tests.
    pub async fn from_connection(
        conn: tokio_rusqlite::Connection,
        table: &str,
    ) -> Result<Self, KompasError> {
        Self::with_location(conn, table, ":memory:".to_string()).await
    }

    async fn with_location(
        conn: tokio_rusqlite::Connection,
        table: &str,
        location: String,
    ) -> Result<Self, KompasError> {
        if !is_plain_identifier(table) {
            return Err(KompasError::Config(format!(
                "ledger table `{table}` is not a plain identifier"
            )));
        }

        let probe = format!("SELECT COUNT(*) FROM \"{table}\" LIMIT 1");
        let rows = conn
            .call(move |conn| -> Result<i64, rusqlite::Error> {
                let count: i64 = conn.query_row(&probe, [], |row| row.get(0))?;
                Ok(count)
            })
            .await
            .map_err(|e| KompasError::LedgerUnavailable {
                path: location.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %location, table, rows, "usage ledger opened");

        Ok(Self {
            conn,
            table: table.to_string(),
            location,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

#[async_trait]
impl UsageSource for LedgerReader {
    async fn records(&self, window: &Window) -> Result<Vec<UsageRecord>, KompasError> {
        let sql = format!(
            "SELECT datetime(timestamp), {PROVIDER}, {MODEL}, NULLIF(CAST(project_id AS TEXT), ''), \
             {INPUT_TOKENS}, {OUTPUT_TOKENS}, {COST} \
             FROM \"{}\" WHERE {IN_WINDOW} ORDER BY datetime(timestamp)",
            self.table
        );
        let (start, end) = window.sql_bounds();

        let records = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params![start, end], |row| {
                    let stamp: String = row.get(0)?;
                    let timestamp = NaiveDateTime::parse_from_str(&stamp, SQL_INSTANT_FORMAT)
                        .map_err(|e| {
                            rusqlite::Error::FromSqlConversionFailure(
                                0,
                                rusqlite::types::Type::Text,
                                Box::new(e),
                            )
                        })?;
                    Ok(UsageRecord {
                        timestamp,
                        provider: row.get(1)?,
                        model: row.get(2)?,
                        project_id: row.get(3)?,
                        input_tokens: non_negative(row.get(4)?),
                        output_tokens: non_negative(row.get(5)?),
                        cost_eur: row.get(6)?,
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await
            .map_err(map_tr_err)?;

        debug!(window = %window, count = records.len(), "ledger records read");
        Ok(records)
    }

    async fn project_rows(&self, window: &Window) -> Result<Vec<LedgerRow>, KompasError> {
        let sql = format!(
            "SELECT {PROVIDER}, {MODEL}, {PROJECT}, SUM({INPUT_TOKENS}), SUM({OUTPUT_TOKENS}), \
             SUM({COST_NANOS}) AS cost_nanos, COUNT(*) \
             FROM \"{}\" WHERE {IN_WINDOW} \
             GROUP BY 1, 2, 3 ORDER BY cost_nanos DESC, 1, 2, 3",
            self.table
        );
        let (start, end) = window.sql_bounds();

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params![start, end], |row| {
                    Ok(LedgerRow {
                        provider: row.get(0)?,
                        model: row.get(1)?,
                        project: row.get(2)?,
                        input_tokens: non_negative(row.get(3)?),
                        output_tokens: non_negative(row.get(4)?),
                        cost: Amount::from_nanos(non_negative(row.get(5)?)),
                        calls: non_negative(row.get(6)?),
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await
            .map_err(map_tr_err)?;

        debug!(window = %window, groups = rows.len(), "ledger grouped by project");
        Ok(rows)
    }

    async fn daily_rows(&self, window: &Window) -> Result<Vec<DailyRow>, KompasError> {
        let sql = format!(
            "SELECT date(timestamp), {PROVIDER}, {MODEL}, SUM({INPUT_TOKENS} + {OUTPUT_TOKENS}), \
             SUM({COST_NANOS}) AS cost_nanos, COUNT(*) \
             FROM \"{}\" WHERE {IN_WINDOW} \
             GROUP BY 1, 2, 3 ORDER BY 1, cost_nanos DESC, 2, 3",
            self.table
        );
        let (start, end) = window.sql_bounds();

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(rusqlite::params![start, end], |row| {
                    let day: String = row.get(0)?;
                    let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(DailyRow {
                        date,
                        provider: row.get(1)?,
                        model: row.get(2)?,
                        tokens: non_negative(row.get(3)?),
                        cost: Amount::from_nanos(non_negative(row.get(4)?)),
                        calls: non_negative(row.get(5)?),
                    })
                })?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await
            .map_err(map_tr_err)?;

        debug!(window = %window, groups = rows.len(), "ledger grouped by day");
        Ok(rows)
    }
}
