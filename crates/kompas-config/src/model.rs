// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the kompas reporter.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages. The one
//! exception to strictness is `[budget]`: anything malformed there degrades
//! to "no ceiling" instead of failing the whole load.

use std::collections::BTreeMap;

use kompas_core::ReportFormat;
use serde::{Deserialize, Deserializer, Serialize};

/// Top-level kompas configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KompasConfig {
    /// Log level settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Usage ledger location.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Monthly spending ceiling.
    #[serde(default)]
    pub budget: BudgetConfig,

    /// Fixed currency conversion.
    #[serde(default)]
    pub currency: CurrencyConfig,

    /// Report shape and lookback windows.
    #[serde(default)]
    pub report: ReportConfig,

    /// Host-metric thresholds used for recommendations.
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Host probe settings.
    #[serde(default)]
    pub host: HostConfig,

    /// Price per million tokens in USD, keyed by provider then model.
    #[serde(default = "default_pricing")]
    pub pricing: BTreeMap<String, BTreeMap<String, ModelPrice>>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Usage ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Path to the SQLite file holding the invocation ledger.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Table holding one row per model invocation.
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            table: default_table(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("kompas").join("token_usage.db"))
        .and_then(|p| p.to_str().map(String::from))
        .unwrap_or_else(|| "token_usage.db".to_string())
}

fn default_table() -> String {
    "model_calls".to_string()
}

/// Monthly budget configuration.
///
/// Never fails a load. A `budget` value that is not a table, an unknown key
/// or a limit that is not a number is logged and degrades to "no ceiling".
#[derive(Debug, Clone, Default, Serialize)]
pub struct BudgetConfig {
    /// Monthly ceiling in EUR. `None`, zero or negative means no ceiling.
    pub monthly_limit_eur: Option<f64>,
}

impl BudgetConfig {
    /// The ceiling to evaluate against, if one is configured.
    pub fn ceiling(&self) -> Option<f64> {
        self.monthly_limit_eur.filter(|limit| *limit > 0.0)
    }
}

const BUDGET_KEYS: &[&str] = &["monthly_limit_eur"];

#[derive(Deserialize)]
#[serde(untagged)]
enum LimitValue {
    Float(f64),
    Int(i64),
    Other(serde::de::IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BudgetSection {
    Table(BTreeMap<String, LimitValue>),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for BudgetConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let table = match BudgetSection::deserialize(deserializer)? {
            BudgetSection::Table(table) => table,
            BudgetSection::Other(_) => {
                tracing::warn!("`budget` is not a table; treating as no ceiling");
                return Ok(Self::default());
            }
        };

        let mut monthly_limit_eur = None;
        for (key, value) in table {
            if key != "monthly_limit_eur" {
                let suggestion = crate::diagnostic::suggest_key(&key, BUDGET_KEYS);
                tracing::warn!(
                    key = %key,
                    suggestion = suggestion.as_deref().unwrap_or("-"),
                    "unknown budget key ignored"
                );
                continue;
            }
            monthly_limit_eur = match value {
                LimitValue::Float(limit) if limit.is_finite() => Some(limit),
                LimitValue::Int(limit) => Some(limit as f64),
                _ => {
                    tracing::warn!(
                        "budget.monthly_limit_eur is not a number; treating as no ceiling"
                    );
                    None
                }
            };
        }

        Ok(Self { monthly_limit_eur })
    }
}

/// Currency conversion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CurrencyConfig {
    /// EUR received for one USD.
    #[serde(default = "default_usd_to_eur")]
    pub usd_to_eur: f64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            usd_to_eur: default_usd_to_eur(),
        }
    }
}

fn default_usd_to_eur() -> f64 {
    0.92
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// Default output format when `--format` is not given.
    #[serde(default)]
    pub format: ReportFormat,

    /// Number of ISO weeks in the weekly timeline, current week included.
    #[serde(default = "default_weekly_lookback")]
    pub weekly_lookback_weeks: u32,

    /// Number of calendar months in the monthly trend, current month included.
    #[serde(default = "default_monthly_lookback")]
    pub monthly_lookback_months: u32,

    /// Number of days in the daily spend trend.
    #[serde(default = "default_daily_trend_days")]
    pub daily_trend_days: u32,

    /// Number of projects listed in the text report.
    #[serde(default = "default_top_projects")]
    pub top_projects: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::default(),
            weekly_lookback_weeks: default_weekly_lookback(),
            monthly_lookback_months: default_monthly_lookback(),
            daily_trend_days: default_daily_trend_days(),
            top_projects: default_top_projects(),
        }
    }
}

fn default_weekly_lookback() -> u32 {
    4
}

fn default_monthly_lookback() -> u32 {
    3
}

fn default_daily_trend_days() -> u32 {
    30
}

fn default_top_projects() -> usize {
    10
}

/// Percent thresholds driving the status line and recommendations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdConfig {
    /// RAM percent above which the host is critical.
    #[serde(default = "default_ram_critical")]
    pub ram_critical: f64,

    /// RAM percent above which the host needs attention.
    #[serde(default = "default_ram_caution")]
    pub ram_caution: f64,

    /// RAM percent above which closing applications is advised.
    #[serde(default = "default_ram_warn")]
    pub ram_warn: f64,

    /// RAM percent above which usage is called moderate.
    #[serde(default = "default_ram_moderate")]
    pub ram_moderate: f64,

    /// Swap percent above which a RAM upgrade is suggested.
    #[serde(default = "default_swap_warn")]
    pub swap_warn: f64,

    /// Disk percent used above which cleanup is advised.
    #[serde(default = "default_disk_full")]
    pub disk_full: f64,

    /// CPU temperature in °C above which cooling is advised.
    #[serde(default = "default_cpu_temp_warn")]
    pub cpu_temp_warn: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ram_critical: default_ram_critical(),
            ram_caution: default_ram_caution(),
            ram_warn: default_ram_warn(),
            ram_moderate: default_ram_moderate(),
            swap_warn: default_swap_warn(),
            disk_full: default_disk_full(),
            cpu_temp_warn: default_cpu_temp_warn(),
        }
    }
}

fn default_ram_critical() -> f64 {
    90.0
}

fn default_ram_caution() -> f64 {
    75.0
}

fn default_ram_warn() -> f64 {
    85.0
}

fn default_ram_moderate() -> f64 {
    70.0
}

fn default_swap_warn() -> f64 {
    50.0
}

fn default_disk_full() -> f64 {
    90.0
}

fn default_cpu_temp_warn() -> f64 {
    85.0
}

/// Host probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Base URL of the local model server.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Timeout for each network probe.
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Local vector index: a JSON export file or a directory holding `chroma.sqlite3`.
    #[serde(default)]
    pub vector_index_path: Option<String>,

    /// Mount point whose free space is reported.
    #[serde(default = "default_disk_mount")]
    pub disk_mount: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            probe_timeout_secs: default_probe_timeout_secs(),
            vector_index_path: None,
            disk_mount: default_disk_mount(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    2
}

fn default_disk_mount() -> String {
    "/".to_string()
}

/// Price of one model in USD per million tokens.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelPrice {
    /// Cost per million input tokens.
    pub input: f64,
    /// Cost per million output tokens.
    pub output: f64,
}

/// Built-in price list; local inference is free.
pub fn default_pricing() -> BTreeMap<String, BTreeMap<String, ModelPrice>> {
    let table: &[(&str, &[(&str, f64, f64)])] = &[
        (
            "anthropic",
            &[
                ("claude-3-5-sonnet-20241022", 3.0, 15.0),
                ("claude-3-opus-20250219", 15.0, 75.0),
                ("claude-haiku-4-5-20251001", 0.8, 4.0),
            ],
        ),
        (
            "openai",
            &[
                ("gpt-4o", 5.0, 15.0),
                ("gpt-4o-mini", 0.15, 0.6),
                ("gpt-4-turbo", 10.0, 30.0),
            ],
        ),
        (
            "gemini",
            &[
                ("gemini-1.5-pro", 1.25, 5.0),
                ("gemini-1.5-flash", 0.075, 0.3),
            ],
        ),
        (
            "ollama",
            &[("mistral-small3.1:24b", 0.0, 0.0), ("nomic-embed-text", 0.0, 0.0)],
        ),
    ];

    table
        .iter()
        .map(|(provider, models)| {
            let models = models
                .iter()
                .map(|(model, input, output)| {
                    (
                        model.to_string(),
                        ModelPrice {
                            input: *input,
                            output: *output,
                        },
                    )
                })
                .collect();
            (provider.to_string(), models)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pricing_contains_local_models_at_zero() {
        let pricing = default_pricing();
        let ollama = &pricing["ollama"];
        assert!(ollama.values().all(|p| p.input == 0.0 && p.output == 0.0));
        assert_eq!(pricing["anthropic"]["claude-3-5-sonnet-20241022"].output, 15.0);
    }

    #[test]
    fn ceiling_ignores_zero_and_negative() {
        let mut budget = BudgetConfig::default();
        assert_eq!(budget.ceiling(), None);
        budget.monthly_limit_eur = Some(0.0);
        assert_eq!(budget.ceiling(), None);
        budget.monthly_limit_eur = Some(-5.0);
        assert_eq!(budget.ceiling(), None);
        budget.monthly_limit_eur = Some(100.0);
        assert_eq!(budget.ceiling(), Some(100.0));
    }

    #[test]
    fn integer_limit_is_accepted() {
        let config: KompasConfig = toml::from_str("[budget]\nmonthly_limit_eur = 100\n").unwrap();
        assert_eq!(config.budget.monthly_limit_eur, Some(100.0));
    }

    #[test]
    fn non_numeric_limit_degrades_to_none() {
        let config: KompasConfig =
            toml::from_str("[budget]\nmonthly_limit_eur = \"honderd\"\n").unwrap();
        assert_eq!(config.budget.monthly_limit_eur, None);
        assert_eq!(config.budget.ceiling(), None);
    }

    #[test]
    fn unknown_budget_key_is_ignored() {
        let config: KompasConfig =
            toml::from_str("[budget]\nmonthly_limit = 100\nmonthly_limit_eur = 40\n").unwrap();
        assert_eq!(config.budget.ceiling(), Some(40.0));
    }

    #[test]
    fn scalar_budget_degrades_to_none() {
        let config: KompasConfig = toml::from_str("budget = 100\n").unwrap();
        assert_eq!(config.budget.ceiling(), None);
    }

    #[test]
    fn report_format_parses_lowercase() {
        let config: KompasConfig = toml::from_str("[report]\nformat = \"json\"\n").unwrap();
        assert_eq!(config.report.format, ReportFormat::Json);
    }
}
