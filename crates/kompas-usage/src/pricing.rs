// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call cost estimation from the configured price table.
//!
//! Prices are USD per million tokens. The table is only consulted when a
//! record is written; aggregation never reprices stored records.

use std::collections::BTreeMap;

use kompas_config::model::ModelPrice;
use kompas_config::KompasConfig;

#[derive(Debug, Clone)]
pub struct PriceTable {
    prices: BTreeMap<String, BTreeMap<String, ModelPrice>>,
    usd_to_eur: f64,
}

impl PriceTable {
    pub fn new(prices: BTreeMap<String, BTreeMap<String, ModelPrice>>, usd_to_eur: f64) -> Self {
        Self { prices, usd_to_eur }
    }

    pub fn from_config(config: &KompasConfig) -> Self {
        Self::new(config.pricing.clone(), config.currency.usd_to_eur)
    }

    /// Price for a model. An exact name wins; otherwise the longest
    /// configured name that prefixes `model` (dated snapshots like
    /// `gpt-4o-2024-08-06` resolve to `gpt-4o`).
    pub fn price(&self, provider: &str, model: &str) -> Option<&ModelPrice> {
        let models = self.prices.get(provider)?;
        models.get(model).or_else(|| {
            models
                .iter()
                .filter(|(name, _)| model.starts_with(name.as_str()))
                .max_by_key(|(name, _)| name.len())
                .map(|(_, price)| price)
        })
    }

    /// Unrounded USD cost of one call, `None` for an unpriced model.
    pub fn cost_usd(
        &self,
        provider: &str,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Option<f64> {
        let price = self.price(provider, model)?;
        Some(
            input_tokens as f64 / 1_000_000.0 * price.input
                + output_tokens as f64 / 1_000_000.0 * price.output,
        )
    }

    /// Unrounded EUR cost of one call at the fixed conversion rate.
    pub fn cost_eur(
        &self,
        provider: &str,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> Option<f64> {
        self.cost_usd(provider, model, input_tokens, output_tokens)
            .map(|usd| usd * self.usd_to_eur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PriceTable {
        PriceTable::from_config(&KompasConfig::default())
    }

    #[test]
    fn local_models_are_free() {
        assert_eq!(table().cost_eur("ollama", "nomic-embed-text", 10_000, 10_000), Some(0.0));
    }

    #[test]
    fn exact_name_beats_prefix() {
        let table = table();
        let mini = table.price("openai", "gpt-4o-mini").unwrap();
        assert_eq!(mini.input, 0.15);
        let dated = table.price("openai", "gpt-4o-mini-2024-07-18").unwrap();
        assert_eq!(dated.input, 0.15);
    }

    #[test]
    fn unknown_model_is_unpriced() {
        assert_eq!(table().cost_eur("nobody", "nothing", 1, 1), None);
    }

    #[test]
    fn converts_at_fixed_rate() {
        let mut prices = BTreeMap::new();
        prices.insert(
            "openai".to_string(),
            BTreeMap::from([(
                "gpt-4o".to_string(),
                ModelPrice {
                    input: 2.5,
                    output: 10.0,
                },
            )]),
        );
        let table = PriceTable::new(prices, 0.92);
        let usd = table.cost_usd("openai", "gpt-4o", 1_000_000, 500_000).unwrap();
        assert!((usd - 7.5).abs() < 1e-12);
        let eur = table.cost_eur("openai", "gpt-4o-2024-08-06", 1_000_000, 500_000).unwrap();
        assert!((eur - 6.9).abs() < 1e-12);
    }
}
