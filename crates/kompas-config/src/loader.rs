// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kompas.toml` > `~/.config/kompas/kompas.toml` > `/etc/kompas/kompas.toml`
//! with environment variable overrides via `KOMPAS_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KompasConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/kompas/kompas.toml";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "kompas.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kompas/kompas.toml` (system-wide)
/// 3. `~/.config/kompas/kompas.toml` (user XDG config)
/// 4. `./kompas.toml` (local directory)
/// 5. `KOMPAS_*` environment variables
pub fn load_config() -> Result<KompasConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KompasConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KompasConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KompasConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KompasConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Path of the per-user config file, if a config directory exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("kompas").join(LOCAL_CONFIG_FILE))
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KompasConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` because key names contain
/// underscores: `KOMPAS_BUDGET_MONTHLY_LIMIT_EUR` must map to
/// `budget.monthly_limit_eur`, not `budget.monthly.limit.eur`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("KOMPAS_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: &[&str] = &[
        "logging",
        "ledger",
        "budget",
        "currency",
        "report",
        "thresholds",
        "host",
    ];

    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(
            map_env_key("budget_monthly_limit_eur"),
            "budget.monthly_limit_eur"
        );
        assert_eq!(map_env_key("ledger_database_path"), "ledger.database_path");
        assert_eq!(map_env_key("host_ollama_url"), "host.ollama_url");
        assert_eq!(map_env_key("thresholds_ram_warn"), "thresholds.ram_warn");
    }

    #[test]
    fn unknown_section_is_left_alone() {
        assert_eq!(map_env_key("something_else"), "something_else");
    }
}
