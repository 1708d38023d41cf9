// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document count and size of the local vector index.
//!
//! Two layouts are understood: a JSON export with a top-level `documents`
//! array, and a Chroma persistence directory holding `chroma.sqlite3`.

use std::path::Path;

use kompas_core::KompasError;
use rusqlite::OpenFlags;

use crate::snapshot::{round2, VectorIndexMetrics, BYTES_PER_MB};

const PROBE: &str = "vector_index";
const CHROMA_DB: &str = "chroma.sqlite3";

fn probe_err(message: impl Into<String>) -> KompasError {
    KompasError::HostProbe {
        probe: PROBE.to_string(),
        message: message.into(),
    }
}

/// Read the index at `path`. A path that does not exist reads as empty.
pub fn read_vector_index(path: &Path) -> Result<VectorIndexMetrics, KompasError> {
    if !path.exists() {
        return Ok(VectorIndexMetrics::default());
    }

    let sqlite = if path.is_dir() {
        Some(path.join(CHROMA_DB))
    } else if path.extension().is_some_and(|ext| ext == "sqlite3") {
        Some(path.to_path_buf())
    } else {
        None
    };

    match sqlite {
        Some(db) => read_chroma(&db),
        None => read_json(path),
    }
}

fn file_size_mb(path: &Path) -> Result<f64, KompasError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| probe_err(format!("cannot stat {}: {e}", path.display())))?;
    Ok(round2(meta.len() as f64 / BYTES_PER_MB))
}

fn read_json(path: &Path) -> Result<VectorIndexMetrics, KompasError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| probe_err(format!("cannot read {}: {e}", path.display())))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| probe_err(format!("{} is not valid JSON: {e}", path.display())))?;
    let doc_count = value
        .get("documents")
        .and_then(serde_json::Value::as_array)
        .map_or(0, |docs| docs.len() as u64);

    Ok(VectorIndexMetrics {
        doc_count,
        size_mb: file_size_mb(path)?,
    })
}

fn read_chroma(db: &Path) -> Result<VectorIndexMetrics, KompasError> {
    if !db.is_file() {
        return Ok(VectorIndexMetrics::default());
    }
    let conn = rusqlite::Connection::open_with_flags(db, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| probe_err(format!("cannot open {}: {e}", db.display())))?;
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM embeddings", [], |row| row.get(0))
        .map_err(|e| probe_err(format!("cannot count embeddings: {e}")))?;

    Ok(VectorIndexMetrics {
        doc_count: u64::try_from(count).unwrap_or(0),
        size_mb: file_size_mb(db)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = read_vector_index(&dir.path().join("nope.json")).unwrap();
        assert_eq!(metrics, VectorIndexMetrics::default());
    }

    #[test]
    fn counts_json_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, r#"{"documents": ["a", "b", "c"], "ids": [1, 2, 3]}"#).unwrap();
        let metrics = read_vector_index(&path).unwrap();
        assert_eq!(metrics.doc_count, 3);
    }

    #[test]
    fn counts_chroma_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        let conn = rusqlite::Connection::open(dir.path().join(CHROMA_DB)).unwrap();
        conn.execute_batch(
            "CREATE TABLE embeddings (id INTEGER PRIMARY KEY, embedding_id TEXT);
             INSERT INTO embeddings (embedding_id) VALUES ('a'), ('b');",
        )
        .unwrap();
        drop(conn);

        let metrics = read_vector_index(dir.path()).unwrap();
        assert_eq!(metrics.doc_count, 2);
        assert!(metrics.size_mb > 0.0);
    }

    #[test]
    fn garbage_json_is_a_probe_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "not json").unwrap();
        let err = read_vector_index(&path).unwrap_err();
        assert!(matches!(err, KompasError::HostProbe { .. }));
    }
}
