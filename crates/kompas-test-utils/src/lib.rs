// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for kompas integration tests.
//!
//! # Components
//!
//! - [`LedgerFixture`] - temp-file usage ledger that accepts raw, even malformed, rows
//! - [`SnapshotBuilder`] - host snapshots with chosen gauge values

pub mod ledger;
pub mod snapshot;

pub use ledger::{FixtureRow, LedgerFixture};
pub use snapshot::SnapshotBuilder;
