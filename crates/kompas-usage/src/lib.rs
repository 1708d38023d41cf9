// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage aggregation engine for kompas.
//!
//! Reads the append-only ledger of model invocations and rolls it up by
//! provider, model, project and time bucket, with budget arithmetic on top.
//! All money is summed in fixed point and rounded to cents exactly once,
//! when a figure leaves the engine.

pub mod analyzer;
pub mod budget;
pub mod calendar;
pub mod ledger;
pub mod money;
pub mod pricing;
pub mod record;
pub mod rollup;
pub mod timeline;

pub use analyzer::{Lookback, TimelineSet, UsageAnalyzer, UsageReport};
pub use budget::{BudgetEvaluator, BudgetStatus};
pub use calendar::{MonthPeriod, Window};
pub use ledger::{LedgerReader, LedgerWriter, MemoryLedger, UsageSource};
pub use money::Amount;
pub use pricing::PriceTable;
pub use record::{UsageRecord, UNKNOWN};
pub use rollup::{ModelCost, PeriodAggregate, ProviderRollup, RollupAggregator, RollupMap, UsageTotals};
pub use timeline::{DailyTotal, ModelBucket, Timeline};
