// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-pass rollups of ledger rows along provider, model and project.
//!
//! Sums are carried as [`Amount`] nano-units and only turned into rounded
//! euro figures when a [`PeriodAggregate`] is built. Every map is ordered by
//! descending cost for display; ties keep the order of first appearance.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use kompas_config::KompasConfig;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::budget::{BudgetEvaluator, BudgetStatus};
use crate::calendar::MonthPeriod;
use crate::money::{eur_to_usd, Amount};
use crate::record::{group_by_project, LedgerRow, UsageRecord};

/// A string-keyed map that remembers insertion order.
///
/// Serializes as a JSON object in that order. Equality ignores order.
#[derive(Debug, Clone)]
pub struct RollupMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for RollupMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> RollupMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Insert or replace; a replaced key keeps its position.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    /// Mutable access to `key`, inserting `V::default()` on first sight.
    pub fn entry_or_default(&mut self, key: &str) -> &mut V
    where
        V: Default,
    {
        let i = match self.index.get(key) {
            Some(&i) => i,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), V::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[i].1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable sort; equal elements keep their relative order.
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&V, &V) -> std::cmp::Ordering,
    {
        self.entries.sort_by(|a, b| compare(&a.1, &b.1));
        self.reindex();
    }

    pub fn sort_keys(&mut self) {
        self.entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.reindex();
    }

    pub fn map_values<U, F>(self, mut f: F) -> RollupMap<U>
    where
        F: FnMut(V) -> U,
    {
        RollupMap {
            entries: self.entries.into_iter().map(|(k, v)| (k, f(v))).collect(),
            index: self.index,
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
    }
}

impl<V: PartialEq> PartialEq for RollupMap<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<V> IntoIterator for RollupMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<V> FromIterator<(String, V)> for RollupMap<V> {
    fn from_iter<T: IntoIterator<Item = (String, V)>>(iter: T) -> Self {
        let mut map = RollupMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for RollupMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for RollupMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RollupVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for RollupVisitor<V> {
            type Value = RollupMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = RollupMap::new();
                while let Some((k, v)) = access.next_entry::<String, V>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(RollupVisitor(PhantomData))
    }
}

/// Running sums for one rollup key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Tally {
    pub tokens: u64,
    pub cost: Amount,
    pub calls: u64,
}

impl Tally {
    pub fn add(&mut self, tokens: u64, cost: Amount, calls: u64) {
        self.tokens = self.tokens.saturating_add(tokens);
        self.cost += cost;
        self.calls += calls;
    }

    fn totals(self) -> UsageTotals {
        UsageTotals {
            tokens: self.tokens,
            cost_eur: self.cost.rounded(),
            calls: self.calls,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ProviderTally {
    tally: Tally,
    models: RollupMap<Tally>,
}

/// Order by descending cost; `sort_by` keeps first appearance on ties.
pub(crate) fn by_cost_desc(a: &Tally, b: &Tally) -> std::cmp::Ordering {
    b.cost.cmp(&a.cost)
}

impl<V> RollupMap<V> {
    /// Key order first, so the stable cost sort breaks ties alphabetically.
    fn sort_by_cost_desc(&mut self, cost: impl Fn(&V) -> &Tally) {
        self.sort_keys();
        self.sort_by(|a, b| by_cost_desc(cost(a), cost(b)));
    }
}

/// Tokens, cost and call count for one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub tokens: u64,
    pub cost_eur: f64,
    pub calls: u64,
}

/// Per-model figures nested under a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCost {
    pub tokens: u64,
    pub cost_eur: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderRollup {
    pub tokens: u64,
    pub cost_eur: f64,
    pub calls: u64,
    pub models: RollupMap<ModelCost>,
}

/// Everything known about one month's usage, rounded and ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAggregate {
    pub period: MonthPeriod,
    pub total_tokens: u64,
    pub total_calls: u64,
    pub total_cost_eur: f64,
    pub total_cost_usd: f64,
    pub by_provider: RollupMap<ProviderRollup>,
    /// Keyed `provider/model`.
    pub by_model: RollupMap<UsageTotals>,
    pub by_project: RollupMap<UsageTotals>,
    pub budget_remaining_eur: f64,
    pub budget_utilization_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_ceiling_eur: Option<f64>,
}

impl PeriodAggregate {
    pub fn budget(&self) -> BudgetStatus {
        BudgetStatus {
            ceiling_eur: self.budget_ceiling_eur,
            remaining_eur: self.budget_remaining_eur,
            utilization_pct: self.budget_utilization_pct,
            over_budget: self.budget_utilization_pct > 100.0,
        }
    }
}

/// Folds grouped ledger rows into a [`PeriodAggregate`].
#[derive(Debug, Clone)]
pub struct RollupAggregator {
    usd_to_eur: f64,
    budget: BudgetEvaluator,
}

impl RollupAggregator {
    pub fn new(usd_to_eur: f64, budget: BudgetEvaluator) -> Self {
        Self { usd_to_eur, budget }
    }

    pub fn from_config(config: &KompasConfig) -> Self {
        Self::new(
            config.currency.usd_to_eur,
            BudgetEvaluator::from_config(&config.budget),
        )
    }

    pub fn budget(&self) -> &BudgetEvaluator {
        &self.budget
    }

    /// Fold rows in one pass; each row updates all four rollups.
    pub fn aggregate<'a, I>(&self, period: MonthPeriod, rows: I) -> PeriodAggregate
    where
        I: IntoIterator<Item = &'a LedgerRow>,
    {
        let mut total = Tally::default();
        let mut providers: RollupMap<ProviderTally> = RollupMap::new();
        let mut models: RollupMap<Tally> = RollupMap::new();
        let mut projects: RollupMap<Tally> = RollupMap::new();

        for row in rows {
            let tokens = row.tokens();
            total.add(tokens, row.cost, row.calls);

            let provider = providers.entry_or_default(&row.provider);
            provider.tally.add(tokens, row.cost, row.calls);
            provider
                .models
                .entry_or_default(&row.model)
                .add(tokens, row.cost, row.calls);

            models
                .entry_or_default(&format!("{}/{}", row.provider, row.model))
                .add(tokens, row.cost, row.calls);
            projects
                .entry_or_default(&row.project)
                .add(tokens, row.cost, row.calls);
        }

        providers.sort_by_cost_desc(|p| &p.tally);
        models.sort_by_cost_desc(|t| t);
        projects.sort_by_cost_desc(|t| t);

        let by_provider = providers.map_values(|p| {
            let mut nested = p.models;
            nested.sort_by_cost_desc(|t| t);
            ProviderRollup {
                tokens: p.tally.tokens,
                cost_eur: p.tally.cost.rounded(),
                calls: p.tally.calls,
                models: nested.map_values(|m| ModelCost {
                    tokens: m.tokens,
                    cost_eur: m.cost.rounded(),
                }),
            }
        });

        let budget = self.budget.evaluate(total.cost);

        PeriodAggregate {
            period,
            total_tokens: total.tokens,
            total_calls: total.calls,
            total_cost_eur: total.cost.rounded(),
            total_cost_usd: eur_to_usd(total.cost, self.usd_to_eur),
            by_provider,
            by_model: models.map_values(Tally::totals),
            by_project: projects.map_values(Tally::totals),
            budget_remaining_eur: budget.remaining_eur,
            budget_utilization_pct: budget.utilization_pct,
            budget_ceiling_eur: budget.ceiling_eur,
        }
    }

    /// Group raw records first, then fold them.
    pub fn aggregate_records(&self, period: MonthPeriod, records: &[UsageRecord]) -> PeriodAggregate {
        self.aggregate(period, &group_by_project(records))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn february() -> MonthPeriod {
        MonthPeriod::new(2026, 2).unwrap()
    }

    fn aggregator(limit: Option<f64>) -> RollupAggregator {
        RollupAggregator::new(0.92, BudgetEvaluator::new(limit))
    }

    #[test]
    fn single_record_rolls_up_everywhere() {
        let records = vec![
            UsageRecord::new(at("2026-02-10T12:00:00"), "anthropic", "claude-sonnet", 1000, 500, 0.012),
        ];
        let agg = aggregator(None).aggregate_records(february(), &records);

        assert_eq!(agg.total_tokens, 1500);
        assert_eq!(agg.total_cost_eur, 0.01);
        assert_eq!(agg.total_cost_usd, 0.01);
        assert_eq!(agg.by_provider.get("anthropic").unwrap().tokens, 1500);
        assert_eq!(
            agg.by_provider.get("anthropic").unwrap().models.get("claude-sonnet").unwrap().tokens,
            1500
        );
        assert_eq!(agg.by_model.get("anthropic/claude-sonnet").unwrap().calls, 1);
        assert_eq!(agg.by_project.get("unknown").unwrap().tokens, 1500);
        assert_eq!(agg.budget_remaining_eur, 0.0);
    }

    #[test]
    fn empty_input_yields_zeroes_and_empty_maps() {
        let agg = aggregator(Some(50.0)).aggregate(february(), &Vec::<LedgerRow>::new());
        assert_eq!(agg.total_tokens, 0);
        assert_eq!(agg.total_cost_eur, 0.0);
        assert!(agg.by_provider.is_empty());
        assert!(agg.by_model.is_empty());
        assert!(agg.by_project.is_empty());
        assert_eq!(agg.budget_remaining_eur, 50.0);

        let json = serde_json::to_value(&agg).unwrap();
        assert_eq!(json["by_provider"], serde_json::json!({}));
        assert_eq!(json["by_model"], serde_json::json!({}));
        assert_eq!(json["by_project"], serde_json::json!({}));
        assert_eq!(json["period"], "2026-02");
    }

    #[test]
    fn maps_are_ordered_by_descending_cost_with_stable_ties() {
        let records = vec![
            UsageRecord::new(at("2026-02-01T08:00:00"), "ollama", "llama3", 100, 100, 0.0),
            UsageRecord::new(at("2026-02-01T09:00:00"), "openai", "gpt-4o", 10, 10, 0.50),
            UsageRecord::new(at("2026-02-01T10:00:00"), "anthropic", "claude-sonnet", 10, 10, 1.25),
            UsageRecord::new(at("2026-02-01T11:00:00"), "gemini", "flash", 10, 10, 0.0),
        ];
        let agg = aggregator(None).aggregate_records(february(), &records);
        let order: Vec<&str> = agg.by_provider.keys().collect();
        assert_eq!(order, vec!["anthropic", "openai", "gemini", "ollama"]);

        let json = serde_json::to_string(&agg.by_provider).unwrap();
        assert!(json.find("anthropic").unwrap() < json.find("openai").unwrap());
    }

    #[test]
    fn equal_provider_totals_order_alphabetically() {
        let records = vec![
            UsageRecord::new(at("2026-02-01T08:00:00"), "openai", "gpt-4o", 10, 10, 0.50),
            UsageRecord::new(at("2026-02-01T09:00:00"), "anthropic", "claude-haiku", 10, 10, 0.30),
            UsageRecord::new(at("2026-02-01T10:00:00"), "anthropic", "claude-sonnet", 10, 10, 0.20),
        ];
        let agg = aggregator(None).aggregate_records(february(), &records);
        let order: Vec<&str> = agg.by_provider.keys().collect();
        assert_eq!(order, vec!["anthropic", "openai"]);

        let mut reversed = records.clone();
        reversed.reverse();
        let again = aggregator(None).aggregate_records(february(), &reversed);
        assert_eq!(again.by_provider.keys().collect::<Vec<_>>(), order);
    }

    #[test]
    fn provider_and_flat_model_views_agree() {
        let records = vec![
            UsageRecord::new(at("2026-02-01T08:00:00"), "openai", "gpt-4o", 100, 50, 0.2).with_project("a"),
            UsageRecord::new(at("2026-02-02T08:00:00"), "openai", "gpt-4o-mini", 100, 50, 0.1).with_project("b"),
            UsageRecord::new(at("2026-02-03T08:00:00"), "openai", "gpt-4o", 100, 50, 0.2).with_project("b"),
        ];
        let agg = aggregator(None).aggregate_records(february(), &records);
        let openai = agg.by_provider.get("openai").unwrap();
        assert_eq!(openai.calls, 3);
        assert_eq!(openai.models.len(), 2);
        assert_eq!(agg.by_model.get("openai/gpt-4o").unwrap().tokens, 300);
        assert_eq!(agg.by_model.get("openai/gpt-4o").unwrap().cost_eur, 0.4);
        assert_eq!(agg.by_project.get("b").unwrap().calls, 2);
        assert_eq!(agg.total_cost_eur, 0.5);
    }

    #[test]
    fn budget_fields_follow_ceiling() {
        let records = vec![
            UsageRecord::new(at("2026-02-01T08:00:00"), "anthropic", "claude-opus", 1, 1, 12.345),
        ];
        let agg = aggregator(Some(10.0)).aggregate_records(february(), &records);
        assert_eq!(agg.budget_remaining_eur, 0.0);
        assert_eq!(agg.budget_utilization_pct, 123.45);
        assert!(agg.budget().over_budget);
        assert_eq!(agg.budget_ceiling_eur, Some(10.0));
    }

    #[test]
    fn rollup_map_equality_ignores_order() {
        let a: RollupMap<u32> = vec![("x".to_string(), 1), ("y".to_string(), 2)].into_iter().collect();
        let b: RollupMap<u32> = vec![("y".to_string(), 2), ("x".to_string(), 1)].into_iter().collect();
        assert_eq!(a, b);
        let parsed: RollupMap<u32> = serde_json::from_str(r#"{"y":2,"x":1}"#).unwrap();
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["y", "x"]);
    }
}
