// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger records and the grouped rows the aggregation layer consumes.
//!
//! Absent or malformed fields are defaulted here, at ingestion, so the
//! arithmetic downstream never sees a missing value.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::money::Amount;

/// Sentinel for a record without provider, model or project.
pub const UNKNOWN: &str = "unknown";

/// One model invocation as stored in the append-only ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub timestamp: NaiveDateTime,
    /// Local inference servers are providers with zero cost.
    pub provider: String,
    pub model: String,
    /// Absent means [`UNKNOWN`].
    pub project_id: Option<String>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Precomputed at write time; never repriced.
    pub cost_eur: f64,
}

impl UsageRecord {
    pub fn new(
        timestamp: NaiveDateTime,
        provider: impl Into<String>,
        model: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
        cost_eur: f64,
    ) -> Self {
        Self {
            timestamp,
            provider: provider.into(),
            model: model.into(),
            project_id: None,
            input_tokens,
            output_tokens,
            cost_eur,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Cost quantized to nano-units; negative or non-finite values count as zero.
    pub fn cost(&self) -> Amount {
        Amount::from_f64(self.cost_eur)
    }

    pub fn provider_key(&self) -> &str {
        or_unknown(&self.provider)
    }

    pub fn model_key(&self) -> &str {
        or_unknown(&self.model)
    }

    pub fn project_key(&self) -> &str {
        or_unknown(self.project_id.as_deref().unwrap_or(""))
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() { UNKNOWN } else { value }
}

/// Records of one window grouped by provider, model and project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub provider: String,
    pub model: String,
    pub project: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost: Amount,
    pub calls: u64,
}

impl LedgerRow {
    pub fn tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Records of one window grouped by calendar day, provider and model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub provider: String,
    pub model: String,
    pub tokens: u64,
    pub cost: Amount,
    pub calls: u64,
}

/// Group records the way the ledger query does.
///
/// Rows come out by descending cost, then provider, model and project, so
/// the in-memory path and the SQL path hand the aggregator identical input.
pub fn group_by_project<'a, I>(records: I) -> Vec<LedgerRow>
where
    I: IntoIterator<Item = &'a UsageRecord>,
{
    let mut index: HashMap<(String, String, String), usize> = HashMap::new();
    let mut rows: Vec<LedgerRow> = Vec::new();

    for record in records {
        let key = (
            record.provider_key().to_string(),
            record.model_key().to_string(),
            record.project_key().to_string(),
        );
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(LedgerRow {
                provider: key.0,
                model: key.1,
                project: key.2,
                input_tokens: 0,
                output_tokens: 0,
                cost: Amount::ZERO,
                calls: 0,
            });
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.input_tokens = row.input_tokens.saturating_add(record.input_tokens);
        row.output_tokens = row.output_tokens.saturating_add(record.output_tokens);
        row.cost += record.cost();
        row.calls += 1;
    }

    rows.sort_by(|a, b| {
        b.cost
            .cmp(&a.cost)
            .then_with(|| a.provider.cmp(&b.provider))
            .then_with(|| a.model.cmp(&b.model))
            .then_with(|| a.project.cmp(&b.project))
    });
    rows
}

/// Group records by day, oldest day first, then descending cost.
pub fn group_by_day<'a, I>(records: I) -> Vec<DailyRow>
where
    I: IntoIterator<Item = &'a UsageRecord>,
{
    let mut index: HashMap<(NaiveDate, String, String), usize> = HashMap::new();
    let mut rows: Vec<DailyRow> = Vec::new();

    for record in records {
        let key = (
            record.timestamp.date(),
            record.provider_key().to_string(),
            record.model_key().to_string(),
        );
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(DailyRow {
                date: key.0,
                provider: key.1,
                model: key.2,
                tokens: 0,
                cost: Amount::ZERO,
                calls: 0,
            });
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.tokens = row.tokens.saturating_add(record.total_tokens());
        row.cost += record.cost();
        row.calls += 1;
    }

    rows.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| b.cost.cmp(&a.cost))
            .then_with(|| a.provider.cmp(&b.provider))
            .then_with(|| a.model.cmp(&b.model))
    });
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn missing_keys_fall_back_to_unknown() {
        let record = UsageRecord::new(at("2026-02-01T10:00:00"), "", "", 1, 1, 0.0);
        assert_eq!(record.provider_key(), UNKNOWN);
        assert_eq!(record.model_key(), UNKNOWN);
        assert_eq!(record.project_key(), UNKNOWN);
        let named = record.with_project("kompas");
        assert_eq!(named.project_key(), "kompas");
    }

    #[test]
    fn negative_cost_counts_as_zero() {
        let record = UsageRecord::new(at("2026-02-01T10:00:00"), "openai", "gpt-4o", 1, 1, -3.0);
        assert_eq!(record.cost(), Amount::ZERO);
    }

    #[test]
    fn project_grouping_merges_and_orders_by_cost() {
        let records = vec![
            UsageRecord::new(at("2026-02-01T10:00:00"), "ollama", "llama3", 500, 500, 0.0),
            UsageRecord::new(at("2026-02-01T11:00:00"), "anthropic", "claude", 100, 50, 0.2)
                .with_project("a"),
            UsageRecord::new(at("2026-02-02T11:00:00"), "anthropic", "claude", 100, 50, 0.3)
                .with_project("a"),
        ];
        let rows = group_by_project(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].provider, "anthropic");
        assert_eq!(rows[0].calls, 2);
        assert_eq!(rows[0].tokens(), 300);
        assert_eq!(rows[0].cost, Amount::from_f64(0.5));
        assert_eq!(rows[1].project, UNKNOWN);
    }

    #[test]
    fn day_grouping_splits_days() {
        let records = vec![
            UsageRecord::new(at("2026-02-02T09:00:00"), "openai", "gpt-4o", 10, 10, 0.004),
            UsageRecord::new(at("2026-02-01T09:00:00"), "openai", "gpt-4o", 10, 10, 0.004),
            UsageRecord::new(at("2026-02-01T19:00:00"), "openai", "gpt-4o", 10, 10, 0.003),
        ];
        let rows = group_by_day(&records);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2026, 2, 1).unwrap());
        assert_eq!(rows[0].calls, 2);
        assert_eq!(rows[0].cost.rounded(), 0.01);
    }
}
