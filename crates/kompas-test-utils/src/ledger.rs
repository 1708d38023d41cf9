// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A usage ledger in a temporary SQLite file.
//!
//! The table is created with every column nullable so tests can insert the
//! kind of incomplete rows older writers left behind.

use std::path::{Path, PathBuf};

use kompas_core::KompasError;
use tempfile::TempDir;

/// Table name used by the fixture.
pub const FIXTURE_TABLE: &str = "model_calls";

/// One row exactly as it will be inserted; `None` becomes SQL `NULL`.
#[derive(Debug, Clone, Default)]
pub struct FixtureRow {
    pub timestamp: String,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub project_id: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub cost_eur: Option<f64>,
}

impl FixtureRow {
    /// A row with only a timestamp.
    pub fn raw(timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            ..Self::default()
        }
    }

    /// A complete call record.
    pub fn call(timestamp: &str, provider: &str, model: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            provider: Some(provider.to_string()),
            model: Some(model.to_string()),
            input_tokens: Some(0),
            output_tokens: Some(0),
            cost_eur: Some(0.0),
            ..Self::default()
        }
    }

    pub fn tokens(mut self, input: i64, output: i64) -> Self {
        self.input_tokens = Some(input);
        self.output_tokens = Some(output);
        self
    }

    pub fn cost(mut self, cost_eur: f64) -> Self {
        self.cost_eur = Some(cost_eur);
        self
    }

    pub fn project(mut self, project_id: &str) -> Self {
        self.project_id = Some(project_id.to_string());
        self
    }
}

fn storage(e: impl std::error::Error + Send + Sync + 'static) -> KompasError {
    KompasError::Storage {
        source: Box::new(e),
    }
}

/// A ledger file that lives as long as the fixture.
pub struct LedgerFixture {
    _dir: TempDir,
    path: PathBuf,
    conn: tokio_rusqlite::Connection,
}

impl LedgerFixture {
    pub async fn new() -> Result<Self, KompasError> {
        let dir = TempDir::new().map_err(storage)?;
        let path = dir.path().join("token_usage.db");
        let conn = tokio_rusqlite::Connection::open(&path).await.map_err(storage)?;
        let ddl = format!(
            "CREATE TABLE {FIXTURE_TABLE} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT,
                provider TEXT,
                model TEXT,
                project_id TEXT,
                input_tokens INTEGER,
                output_tokens INTEGER,
                cost_eur REAL
            );"
        );
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(&ddl)?;
            Ok(())
        })
        .await
        .map_err(storage)?;

        Ok(Self {
            _dir: dir,
            path,
            conn,
        })
    }

    /// A fixture pre-filled with `rows`.
    pub async fn with_rows(rows: Vec<FixtureRow>) -> Result<Self, KompasError> {
        let fixture = Self::new().await?;
        fixture.insert_all(rows).await?;
        Ok(fixture)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &'static str {
        FIXTURE_TABLE
    }

    pub async fn insert(&self, row: FixtureRow) -> Result<(), KompasError> {
        self.insert_all(vec![row]).await
    }

    pub async fn insert_all(&self, rows: Vec<FixtureRow>) -> Result<(), KompasError> {
        let sql = format!(
            "INSERT INTO {FIXTURE_TABLE} (timestamp, provider, model, project_id, \
             input_tokens, output_tokens, cost_eur) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        );
        self.conn
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(&sql)?;
                    for row in &rows {
                        stmt.execute(rusqlite::params![
                            row.timestamp,
                            row.provider,
                            row.model,
                            row.project_id,
                            row.input_tokens,
                            row.output_tokens,
                            row.cost_eur,
                        ])?;
                    }
                }
                tx.commit()
            })
            .await
            .map_err(storage)
    }
}
