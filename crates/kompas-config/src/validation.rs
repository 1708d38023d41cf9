// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express.
//! The budget ceiling is not checked here: a bad ceiling degrades to
//! "no ceiling" and never fails the load.

use crate::diagnostic::ConfigError;
use crate::model::KompasConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every violation instead of failing fast.
pub fn validate_config(config: &KompasConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.ledger.database_path.trim().is_empty() {
        errors.push(validation("ledger.database_path must not be empty".to_string()));
    }

    let table = config.ledger.table.as_str();
    if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        errors.push(validation(format!(
            "ledger.table `{table}` must be a plain SQL identifier"
        )));
    }

    let rate = config.currency.usd_to_eur;
    if !(rate.is_finite() && rate > 0.0) {
        errors.push(validation(format!(
            "currency.usd_to_eur must be greater than zero, got {rate}"
        )));
    }

    if config.report.weekly_lookback_weeks == 0 {
        errors.push(validation(
            "report.weekly_lookback_weeks must be at least 1".to_string(),
        ));
    }
    if config.report.monthly_lookback_months == 0 {
        errors.push(validation(
            "report.monthly_lookback_months must be at least 1".to_string(),
        ));
    }
    if config.report.daily_trend_days == 0 {
        errors.push(validation(
            "report.daily_trend_days must be at least 1".to_string(),
        ));
    }

    let t = &config.thresholds;
    for (name, value) in [
        ("ram_critical", t.ram_critical),
        ("ram_caution", t.ram_caution),
        ("ram_warn", t.ram_warn),
        ("ram_moderate", t.ram_moderate),
        ("swap_warn", t.swap_warn),
        ("disk_full", t.disk_full),
    ] {
        if !(0.0..=100.0).contains(&value) {
            errors.push(validation(format!(
                "thresholds.{name} must be a percentage between 0 and 100, got {value}"
            )));
        }
    }

    for (provider, models) in &config.pricing {
        for (model, price) in models {
            if price.input < 0.0 || price.output < 0.0 {
                errors.push(ConfigError::InvalidPrice {
                    entry: format!("{provider}.{model}"),
                    detail: "prices must be non-negative".to_string(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
