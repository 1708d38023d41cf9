// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use async_trait::async_trait;
use kompas_core::KompasError;

use super::UsageSource;
use crate::calendar::Window;
use crate::record::UsageRecord;

/// A ledger held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    records: Vec<UsageRecord>,
}

impl MemoryLedger {
    pub fn new(records: Vec<UsageRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<UsageRecord> for MemoryLedger {
    fn from_iter<T: IntoIterator<Item = UsageRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl UsageSource for MemoryLedger {
    async fn records(&self, window: &Window) -> Result<Vec<UsageRecord>, KompasError> {
        Ok(self
            .records
            .iter()
            .filter(|r| window.contains(r.timestamp))
            .cloned()
            .collect())
    }
}
