// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-model usage bucketed by calendar day, ISO week and month.
//!
//! Buckets come out oldest first. Inside a bucket, models are keyed
//! `provider/model` and ordered by descending cost. Costs are summed per
//! bucket in nano-units and rounded once, so two €0.004 + €0.003 calls on
//! one day show as €0.01.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{day_key, week_key, MonthPeriod};
use crate::money::Amount;
use crate::record::DailyRow;
use crate::rollup::RollupMap;

/// One model's usage inside one time bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelBucket {
    pub tokens: u64,
    pub cost_eur: f64,
    pub calls: u64,
    /// Distinct days with at least one call; weekly buckets only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_active: Option<u32>,
}

/// Bucket key to per-model breakdown.
pub type Timeline = RollupMap<RollupMap<ModelBucket>>;

/// Totals for one calendar day across all models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: String,
    pub tokens: u64,
    pub cost_eur: f64,
    pub calls: u64,
}

#[derive(Debug, Clone, Default)]
struct BucketTally {
    tokens: u64,
    cost: Amount,
    calls: u64,
    days: BTreeSet<NaiveDate>,
}

fn build<F>(rows: &[DailyRow], seed: &[String], key_of: F, track_days: bool) -> Timeline
where
    F: Fn(NaiveDate) -> String,
{
    let mut buckets: RollupMap<RollupMap<BucketTally>> = RollupMap::new();
    for key in seed {
        buckets.entry_or_default(key);
    }

    for row in rows {
        let model = format!("{}/{}", row.provider, row.model);
        let tally = buckets.entry_or_default(&key_of(row.date)).entry_or_default(&model);
        tally.tokens = tally.tokens.saturating_add(row.tokens);
        tally.cost += row.cost;
        tally.calls += row.calls;
        tally.days.insert(row.date);
    }

    // Every key format used here sorts lexically in time order.
    buckets.sort_keys();
    buckets.map_values(|mut models| {
        models.sort_keys();
        models.sort_by(|a, b| b.cost.cmp(&a.cost));
        models.map_values(|t| ModelBucket {
            tokens: t.tokens,
            cost_eur: t.cost.rounded(),
            calls: t.calls,
            days_active: track_days.then(|| t.days.len() as u32),
        })
    })
}

/// Calendar-day buckets, active days only.
pub fn daily(rows: &[DailyRow]) -> Timeline {
    build(rows, &[], day_key, false)
}

/// ISO-week buckets with `days_active`.
///
/// Every key in `weeks` appears in the result, even without activity.
pub fn weekly(rows: &[DailyRow], weeks: &[String]) -> Timeline {
    build(rows, weeks, week_key, true)
}

/// Calendar-month buckets; every month in `months` appears.
pub fn monthly(rows: &[DailyRow], months: &[MonthPeriod]) -> Timeline {
    let seed: Vec<String> = months.iter().map(MonthPeriod::label).collect();
    build(rows, &seed, |date| MonthPeriod::containing(date).label(), false)
}

/// Per-day totals across all models, newest day first.
pub fn daily_totals(rows: &[DailyRow]) -> Vec<DailyTotal> {
    let mut days: BTreeMap<NaiveDate, (u64, Amount, u64)> = BTreeMap::new();
    for row in rows {
        let day = days.entry(row.date).or_default();
        day.0 = day.0.saturating_add(row.tokens);
        day.1 += row.cost;
        day.2 += row.calls;
    }
    days.into_iter()
        .rev()
        .map(|(date, (tokens, cost, calls))| DailyTotal {
            date: day_key(date),
            tokens,
            cost_eur: cost.rounded(),
            calls,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, provider: &str, model: &str, tokens: u64, cost: f64) -> DailyRow {
        DailyRow {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            provider: provider.to_string(),
            model: model.to_string(),
            tokens,
            cost: Amount::from_f64(cost),
            calls: 1,
        }
    }

    #[test]
    fn daily_sums_before_rounding() {
        let rows = vec![
            row("2026-02-03", "openai", "gpt-4o", 10, 0.004),
            row("2026-02-03", "openai", "gpt-4o", 10, 0.003),
        ];
        let timeline = daily(&rows);
        let bucket = timeline.get("2026-02-03").unwrap().get("openai/gpt-4o").unwrap();
        assert_eq!(bucket.cost_eur, 0.01);
        assert_eq!(bucket.calls, 2);
        assert_eq!(bucket.days_active, None);
    }

    #[test]
    fn daily_is_chronological() {
        let rows = vec![
            row("2026-02-09", "openai", "gpt-4o", 10, 0.1),
            row("2026-02-01", "openai", "gpt-4o", 10, 0.1),
        ];
        let keys: Vec<String> = daily(&rows).keys().map(String::from).collect();
        assert_eq!(keys, vec!["2026-02-01", "2026-02-09"]);
    }

    #[test]
    fn weekly_counts_distinct_days() {
        // Monday to Wednesday of 2026-W08, two calls on Tuesday.
        let rows = vec![
            row("2026-02-16", "anthropic", "claude-sonnet", 100, 0.01),
            row("2026-02-17", "anthropic", "claude-sonnet", 100, 0.01),
            row("2026-02-17", "anthropic", "claude-sonnet", 100, 0.01),
            row("2026-02-18", "anthropic", "claude-sonnet", 100, 0.01),
        ];
        let weeks = vec!["2026-W07".to_string(), "2026-W08".to_string()];
        let timeline = weekly(&rows, &weeks);
        assert!(timeline.get("2026-W07").unwrap().is_empty());
        let bucket = timeline.get("2026-W08").unwrap().get("anthropic/claude-sonnet").unwrap();
        assert_eq!(bucket.days_active, Some(3));
        assert_eq!(bucket.calls, 4);
        assert_eq!(bucket.tokens, 400);
    }

    #[test]
    fn monthly_keeps_empty_months() {
        let months = MonthPeriod::new(2026, 3).unwrap().trailing(3);
        let rows = vec![row("2026-02-10", "gemini", "flash", 5, 0.02)];
        let timeline = monthly(&rows, &months);
        let keys: Vec<&str> = timeline.keys().collect();
        assert_eq!(keys, vec!["2026-01", "2026-02", "2026-03"]);
        assert!(timeline.get("2026-01").unwrap().is_empty());
        assert_eq!(timeline.get("2026-02").unwrap().get("gemini/flash").unwrap().tokens, 5);
    }

    #[test]
    fn empty_rows_give_empty_daily() {
        assert!(daily(&[]).is_empty());
        assert!(daily_totals(&[]).is_empty());
    }

    #[test]
    fn daily_totals_newest_first() {
        let rows = vec![
            row("2026-02-01", "openai", "gpt-4o", 10, 0.004),
            row("2026-02-01", "anthropic", "claude-sonnet", 10, 0.003),
            row("2026-02-02", "openai", "gpt-4o", 1, 0.5),
        ];
        let totals = daily_totals(&rows);
        assert_eq!(totals[0].date, "2026-02-02");
        assert_eq!(totals[1].tokens, 20);
        assert_eq!(totals[1].cost_eur, 0.01);
        assert_eq!(totals[1].calls, 2);
    }
}
