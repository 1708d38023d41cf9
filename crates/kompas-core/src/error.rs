// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the kompas workspace.

use thiserror::Error;

/// The primary error type returned by every kompas library crate.
///
/// Only `LedgerUnavailable`, `Storage` and `Internal` are fatal for a report
/// cycle. Malformed records and missing budget configuration are recovered
/// where they are read and never surface here.
#[derive(Debug, Error)]
pub enum KompasError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The usage ledger could not be opened.
    #[error("usage ledger unavailable at {path}: {reason}")]
    LedgerUnavailable { path: String, reason: String },

    /// Ledger query failures (malformed schema, busy database, I/O).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A host probe (model server, vector index, sensors) failed.
    #[error("host probe `{probe}` failed: {message}")]
    HostProbe { probe: String, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
