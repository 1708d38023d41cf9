// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Access to the append-only usage ledger.
//!
//! [`UsageSource`] is the seam between the aggregation layer and the store.
//! [`LedgerReader`] pushes the grouping down into SQLite; [`MemoryLedger`]
//! groups an in-memory record set and serves as the reference behaviour
//! the SQL path must match.

mod memory;
mod reader;
mod writer;

pub use memory::MemoryLedger;
pub use reader::LedgerReader;
pub use writer::LedgerWriter;

use async_trait::async_trait;
use kompas_core::KompasError;

use crate::calendar::Window;
use crate::record::{group_by_day, group_by_project, DailyRow, LedgerRow, UsageRecord};

/// Time-bounded, grouped queries over the usage ledger.
///
/// Implementations own no mutable state. A failure is fatal for the report
/// being generated and is surfaced without retry.
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// Every record whose timestamp falls inside `window`.
    async fn records(&self, window: &Window) -> Result<Vec<UsageRecord>, KompasError>;

    /// Records inside `window` grouped by provider, model and project.
    async fn project_rows(&self, window: &Window) -> Result<Vec<LedgerRow>, KompasError> {
        let records = self.records(window).await?;
        Ok(group_by_project(&records))
    }

    /// Records inside `window` grouped by calendar day, provider and model.
    async fn daily_rows(&self, window: &Window) -> Result<Vec<DailyRow>, KompasError> {
        let records = self.records(window).await?;
        Ok(group_by_day(&records))
    }
}
