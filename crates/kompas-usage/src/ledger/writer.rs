// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Appending invocation records to the ledger.

use std::path::Path;

use kompas_core::KompasError;
use tracing::info;

use super::reader::is_plain_identifier;
use crate::record::UsageRecord;

/// Timestamp layout written to the ledger.
pub const LEDGER_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> KompasError {
    KompasError::Storage {
        source: Box::new(e),
    }
}

/// Write side of the ledger. Only ever inserts.
pub struct LedgerWriter {
    conn: tokio_rusqlite::Connection,
    table: String,
}

impl LedgerWriter {
    /// Open (or create) the ledger file and make sure the table exists.
    pub async fn open(path: impl AsRef<Path>, table: &str) -> Result<Self, KompasError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| KompasError::LedgerUnavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        }
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| KompasError::LedgerUnavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::from_connection(conn, table).await
    }

    pub async fn from_connection(
        conn: tokio_rusqlite::Connection,
        table: &str,
    ) -> Result<Self, KompasError> {
        if !is_plain_identifier(table) {
            return Err(KompasError::Config(format!(
                "ledger table `{table}` is not a plain identifier"
            )));
        }
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                provider TEXT NOT NULL,
                model TEXT NOT NULL,
                project_id TEXT,
                input_tokens INTEGER NOT NULL DEFAULT 0,
                output_tokens INTEGER NOT NULL DEFAULT 0,
                cost_eur REAL NOT NULL DEFAULT 0.0
            );
            CREATE INDEX IF NOT EXISTS \"idx_{table}_timestamp\" ON \"{table}\"(timestamp);"
        );
        conn.call(move |conn| {
            conn.execute_batch(&ddl)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    /// Append one record.
    pub async fn append(&self, record: &UsageRecord) -> Result<(), KompasError> {
        let sql = format!(
            "INSERT INTO \"{}\" (timestamp, provider, model, project_id, \
             input_tokens, output_tokens, cost_eur) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.table
        );
        let timestamp = record.timestamp.format(LEDGER_TIMESTAMP_FORMAT).to_string();
        let provider = record.provider.clone();
        let model = record.model.clone();
        let project_id = record.project_id.clone();
        let input_tokens = i64::try_from(record.input_tokens).unwrap_or(i64::MAX);
        let output_tokens = i64::try_from(record.output_tokens).unwrap_or(i64::MAX);
        let cost_eur = record.cost().to_f64();

        self.conn
            .call(move |conn| {
                conn.execute(
                    &sql,
                    rusqlite::params![
                        timestamp,
                        provider,
                        model,
                        project_id,
                        input_tokens,
                        output_tokens,
                        cost_eur,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;

        info!(
            provider = %record.provider,
            model = %record.model,
            input_tokens = record.input_tokens,
            output_tokens = record.output_tokens,
            cost_eur = record.cost_eur,
            "usage recorded"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::calendar::MonthPeriod;
    use crate::ledger::{LedgerReader, UsageSource};

    #[tokio::test]
    async fn appended_records_are_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token_usage.db");

        let writer = LedgerWriter::open(&path, "model_calls").await.unwrap();
        let at = NaiveDateTime::parse_from_str("2026-02-10T08:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        writer
            .append(&UsageRecord::new(at, "anthropic", "claude-sonnet", 1000, 500, 0.012).with_project("kompas"))
            .await
            .unwrap();
        writer
            .append(&UsageRecord::new(at, "ollama", "llama3", 10, 10, 0.0))
            .await
            .unwrap();

        let reader = LedgerReader::open(&path, "model_calls").await.unwrap();
        let window = MonthPeriod::new(2026, 2).unwrap().window();
        let records = reader.records(&window).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records.iter().map(|r| r.total_tokens()).sum::<u64>(), 1520);
    }

    #[tokio::test]
    async fn rejects_odd_table_names() {
        let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
        let err = LedgerWriter::from_connection(conn, "calls--").await.err().unwrap();
        assert!(matches!(err, KompasError::Config(_)));
    }
}
