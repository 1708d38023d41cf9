// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kompas record`: append one model invocation to the ledger.

use chrono::NaiveDateTime;
use kompas_config::KompasConfig;
use kompas_core::KompasError;
use kompas_usage::{LedgerWriter, PriceTable, UsageRecord};
use tracing::warn;

/// What the caller knows about one call.
#[derive(Debug, Clone)]
pub struct CallSpec {
    pub provider: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub project: Option<String>,
    /// Overrides the price table when set.
    pub cost_eur: Option<f64>,
}

/// Build the ledger record, pricing it from `prices` unless a cost was given.
///
/// An unpriced model is recorded at zero cost with a warning.
pub fn price_call(call: &CallSpec, prices: &PriceTable, at: NaiveDateTime) -> UsageRecord {
    let cost = call.cost_eur.unwrap_or_else(|| {
        prices
            .cost_eur(&call.provider, &call.model, call.input_tokens, call.output_tokens)
            .unwrap_or_else(|| {
                warn!(
                    provider = %call.provider,
                    model = %call.model,
                    "no price configured, recording zero cost"
                );
                0.0
            })
    });

    let record = UsageRecord::new(
        at,
        &call.provider,
        &call.model,
        call.input_tokens,
        call.output_tokens,
        cost,
    );
    match &call.project {
        Some(project) => record.with_project(project),
        None => record,
    }
}

/// Price and append `call` to the configured ledger.
pub async fn record_call(
    config: &KompasConfig,
    call: &CallSpec,
    at: NaiveDateTime,
) -> Result<UsageRecord, KompasError> {
    let record = price_call(call, &PriceTable::from_config(config), at);
    let writer = LedgerWriter::open(&config.ledger.database_path, &config.ledger.table).await?;
    writer.append(&record).await?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2026-02-10T09:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn call(provider: &str, model: &str) -> CallSpec {
        CallSpec {
            provider: provider.into(),
            model: model.into(),
            input_tokens: 1_000_000,
            output_tokens: 1_000_000,
            project: None,
            cost_eur: None,
        }
    }

    #[test]
    fn prices_from_table() {
        let prices = PriceTable::from_config(&KompasConfig::default());
        let record = price_call(&call("openai", "gpt-4o-mini"), &prices, at());
        assert!((record.cost_eur - 0.75 * 0.92).abs() < 1e-9);
        assert_eq!(record.project_id, None);
    }

    #[test]
    fn explicit_cost_wins() {
        let prices = PriceTable::from_config(&KompasConfig::default());
        let mut call_spec = call("openai", "gpt-4o");
        call_spec.cost_eur = Some(0.01);
        call_spec.project = Some("kompas".into());
        let record = price_call(&call_spec, &prices, at());
        assert_eq!(record.cost_eur, 0.01);
        assert_eq!(record.project_id.as_deref(), Some("kompas"));
    }

    #[test]
    fn unpriced_model_costs_nothing() {
        let prices = PriceTable::from_config(&KompasConfig::default());
        let record = price_call(&call("acme", "mystery"), &prices, at());
        assert_eq!(record.cost_eur, 0.0);
    }
}
