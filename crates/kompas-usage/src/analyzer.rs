// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The usage analyzer: one source, one aggregator, every view a report needs.
//!
//! Each call computes fresh value objects; the analyzer keeps no state
//! between calls beyond the source's connection.

use chrono::{Days, NaiveDate};
use kompas_config::model::ReportConfig;
use kompas_config::KompasConfig;
use kompas_core::KompasError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::{week_key, MonthPeriod, Window};
use crate::ledger::UsageSource;
use crate::rollup::{PeriodAggregate, RollupAggregator};
use crate::timeline::{self, DailyTotal, Timeline};

/// How far back the trend views reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback {
    pub weeks: u32,
    pub months: u32,
    pub trend_days: u32,
}

impl Default for Lookback {
    fn default() -> Self {
        Self::from_config(&ReportConfig::default())
    }
}

impl Lookback {
    pub fn from_config(config: &ReportConfig) -> Self {
        Self {
            weeks: config.weekly_lookback_weeks,
            months: config.monthly_lookback_months,
            trend_days: config.daily_trend_days,
        }
    }
}

/// The three timeline granularities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineSet {
    pub daily: Timeline,
    pub weekly: Timeline,
    pub monthly: Timeline,
}

/// A month's aggregate plus its timelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    #[serde(flatten)]
    pub aggregate: PeriodAggregate,
    pub timeline: TimelineSet,
    pub daily_trend: Vec<DailyTotal>,
}

pub struct UsageAnalyzer<S> {
    source: S,
    aggregator: RollupAggregator,
}

impl<S: UsageSource> UsageAnalyzer<S> {
    pub fn new(source: S, aggregator: RollupAggregator) -> Self {
        Self { source, aggregator }
    }

    pub fn from_config(source: S, config: &KompasConfig) -> Self {
        Self::new(source, RollupAggregator::from_config(config))
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Provider, model and project rollups plus budget for one month.
    pub async fn monthly_stats(&self, period: MonthPeriod) -> Result<PeriodAggregate, KompasError> {
        let window = period.window();
        let rows = self.source.project_rows(&window).await?;
        debug!(period = %period, groups = rows.len(), "aggregating month");
        Ok(self.aggregator.aggregate(period, &rows))
    }

    /// Active days of `period`, per model.
    pub async fn daily_timeline(&self, period: MonthPeriod) -> Result<Timeline, KompasError> {
        let rows = self.source.daily_rows(&period.window()).await?;
        Ok(timeline::daily(&rows))
    }

    /// The `weeks` ISO weeks ending with the one containing `today`.
    pub async fn weekly_timeline(&self, today: NaiveDate, weeks: u32) -> Result<Timeline, KompasError> {
        let window = Window::trailing_weeks(today, weeks);
        let keys: Vec<String> = (0..u64::from(weeks.max(1)))
            .filter_map(|i| window.first_day().checked_add_days(Days::new(i * 7)))
            .map(week_key)
            .collect();
        let rows = self.source.daily_rows(&window).await?;
        Ok(timeline::weekly(&rows, &keys))
    }

    /// The `months` calendar months ending with the one containing `today`.
    pub async fn monthly_trend(&self, today: NaiveDate, months: u32) -> Result<Timeline, KompasError> {
        let periods = MonthPeriod::containing(today).trailing(months);
        let (Some(first), Some(last)) = (periods.first(), periods.last()) else {
            return Ok(Timeline::new());
        };
        let window = Window::days(first.first_day(), last.last_day());
        let rows = self.source.daily_rows(&window).await?;
        Ok(timeline::monthly(&rows, &periods))
    }

    /// Per-day totals for the `days` days ending with `today`, newest first.
    pub async fn daily_trend(&self, today: NaiveDate, days: u32) -> Result<Vec<DailyTotal>, KompasError> {
        let rows = self
            .source
            .daily_rows(&Window::trailing_days(today, days))
            .await?;
        Ok(timeline::daily_totals(&rows))
    }

    /// Everything for one month.
    ///
    /// Trend views are anchored on `today`, or on the last day of `period`
    /// when reporting a month that has already ended.
    pub async fn report(
        &self,
        period: MonthPeriod,
        today: NaiveDate,
        lookback: Lookback,
    ) -> Result<UsageReport, KompasError> {
        let anchor = today.min(period.last_day());

        let aggregate = self.monthly_stats(period).await?;
        let timeline = TimelineSet {
            daily: self.daily_timeline(period).await?,
            weekly: self.weekly_timeline(anchor, lookback.weeks).await?,
            monthly: self.monthly_trend(anchor, lookback.months).await?,
        };
        let daily_trend = self.daily_trend(anchor, lookback.trend_days).await?;

        info!(
            period = %period,
            total_tokens = aggregate.total_tokens,
            total_cost_eur = aggregate.total_cost_eur,
            providers = aggregate.by_provider.len(),
            "usage report assembled"
        );

        Ok(UsageReport {
            aggregate,
            timeline,
            daily_trend,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::budget::BudgetEvaluator;
    use crate::ledger::MemoryLedger;
    use crate::record::UsageRecord;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn analyzer(records: Vec<UsageRecord>) -> UsageAnalyzer<MemoryLedger> {
        UsageAnalyzer::new(
            MemoryLedger::new(records),
            RollupAggregator::new(0.92, BudgetEvaluator::new(Some(25.0))),
        )
    }

    #[tokio::test]
    async fn empty_ledger_report_has_every_section() {
        let analyzer = analyzer(Vec::new());
        let period = MonthPeriod::new(2026, 2).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        let report = analyzer.report(period, today, Lookback::default()).await.unwrap();

        assert_eq!(report.aggregate.total_tokens, 0);
        assert_eq!(report.aggregate.budget_remaining_eur, 25.0);
        assert!(report.timeline.daily.is_empty());
        assert_eq!(report.timeline.weekly.len(), 4);
        assert!(report.timeline.weekly.values().all(|w| w.is_empty()));
        assert_eq!(report.timeline.monthly.len(), 3);
        assert!(report.daily_trend.is_empty());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total_cost_eur"], 0.0);
        assert_eq!(json["by_project"], serde_json::json!({}));
        assert_eq!(json["timeline"]["daily"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn past_month_anchors_trends_on_its_last_day() {
        let analyzer = analyzer(vec![
            UsageRecord::new(at("2026-01-30T10:00:00"), "openai", "gpt-4o", 10, 10, 0.1),
        ]);
        let period = MonthPeriod::new(2026, 1).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let report = analyzer.report(period, today, Lookback::default()).await.unwrap();

        assert_eq!(report.timeline.monthly.keys().last(), Some("2026-01"));
        assert_eq!(report.daily_trend[0].date, "2026-01-30");
        assert!(report.timeline.weekly.contains_key("2026-W05"));
    }

    #[tokio::test]
    async fn weekly_keys_are_oldest_first() {
        let analyzer = analyzer(Vec::new());
        let today = NaiveDate::from_ymd_opt(2026, 1, 7).unwrap();
        let weekly = analyzer.weekly_timeline(today, 3).await.unwrap();
        let keys: Vec<&str> = weekly.keys().collect();
        assert_eq!(keys, vec!["2025-W52", "2026-W01", "2026-W02"]);
    }
}
