// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors and validation failures become miette diagnostics that
//! speak in kompas terms: a misspelled section gets the closest section
//! name, a bad price entry names its `provider.model`, and keys are pointed
//! at inside the TOML file that defined them.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler score a candidate must beat to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Top-level sections of `kompas.toml`.
pub const SECTIONS: &[&str] = &[
    "logging",
    "ledger",
    "budget",
    "currency",
    "report",
    "thresholds",
    "host",
    "pricing",
];

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown section `[{section}]`")]
    #[diagnostic(
        code(kompas::config::unknown_section),
        help("{}", unknown_section_help(suggestion.as_deref()))
    )]
    UnknownSection {
        section: String,
        suggestion: Option<String>,
        #[label("not a kompas section")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("unknown key `{key}`")]
    #[diagnostic(
        code(kompas::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// Dotted path, e.g. `ledger.databse_path`.
        key: String,
        suggestion: Option<String>,
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` has the wrong type: found {found}")]
    #[diagnostic(code(kompas::config::invalid_value), help("expected {expected}"))]
    InvalidValue {
        key: String,
        found: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A `[pricing.<provider>.<model>]` entry that cannot be used.
    #[error("invalid price entry `pricing.{entry}`: {detail}")]
    #[diagnostic(
        code(kompas::config::invalid_price),
        help("prices are USD per million tokens, e.g. `input = 3.0` and `output = 15.0`")
    )]
    InvalidPrice { entry: String, detail: String },

    #[error("validation error: {message}")]
    #[diagnostic(code(kompas::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(kompas::config::other))]
    Other(String),
}

fn unknown_section_help(suggestion: Option<&str>) -> String {
    let sections = SECTIONS.join(", ");
    match suggestion {
        Some(s) => format!("did you mean `[{s}]`? kompas sections: {sections}"),
        None => format!("kompas sections: {sections}"),
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    match suggestion {
        Some(s) => format!("did you mean `{s}`? valid keys: {valid_keys}"),
        None => format!("valid keys: {valid_keys}"),
    }
}

/// The closest candidate to `unknown`, if any is similar enough.
pub fn suggest_key(unknown: &str, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .map(|candidate| (strsim::jaro_winkler(unknown, candidate), *candidate))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate.to_string())
}

/// TOML sources used to point diagnostics at the offending line.
struct Sources<'a>(&'a [(String, String)]);

impl Sources<'_> {
    /// The source an error came from. Inline strings carry no path, so a
    /// single source is assumed to be the one.
    fn for_error(&self, error: &figment::Error) -> Option<&(String, String)> {
        let file = error
            .metadata
            .as_ref()
            .and_then(|m| m.source.as_ref())
            .and_then(|s| match s {
                figment::Source::File(path) => Some(path.display().to_string()),
                _ => None,
            });
        match file {
            Some(file) => self.0.iter().find(|(path, _)| *path == file),
            None if self.0.len() == 1 => self.0.first(),
            None => None,
        }
    }

    fn locate(
        &self,
        error: &figment::Error,
        table: &[String],
        key: &str,
    ) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
        self.for_error(error)
            .and_then(|(path, content)| {
                let offset = key_offset(content, table, key)?;
                let len = if key.is_empty() {
                    table.last().map_or(0, String::len)
                } else {
                    key.len()
                };
                Some((
                    Some(SourceSpan::new(offset.into(), len)),
                    Some(NamedSource::new(path, content.clone())),
                ))
            })
            .unwrap_or((None, None))
    }
}

/// Convert a `figment::Error` (which may hold several) into diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    let sources = Sources(toml_sources);
    err.into_iter()
        .map(|error| convert(&error, &sources))
        .collect()
}

fn convert(error: &figment::Error, sources: &Sources<'_>) -> ConfigError {
    let path = error.path.as_slice();

    if path.first().map(String::as_str) == Some("pricing") {
        let entry = path[1..].join(".");
        let detail = match &error.kind {
            Kind::UnknownField(field, _) => format!("unknown key `{field}`"),
            Kind::MissingField(field) => format!("missing `{field}`"),
            Kind::InvalidType(found, expected) => format!("found {found}, expected {expected}"),
            other => other.to_string(),
        };
        return ConfigError::InvalidPrice { entry, detail };
    }

    match &error.kind {
        Kind::UnknownField(field, _) if path.is_empty() => {
            let (span, src) = sources.locate(error, &[field.clone()], "");
            ConfigError::UnknownSection {
                section: field.clone(),
                suggestion: suggest_key(field, SECTIONS),
                span,
                src,
            }
        }
        Kind::UnknownField(field, expected) => {
            let (span, src) = sources.locate(error, path, field);
            ConfigError::UnknownKey {
                key: format!("{}.{field}", path.join(".")),
                suggestion: suggest_key(field, expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::InvalidType(found, expected) | Kind::InvalidValue(found, expected) => {
            let (span, src) = match path.split_last() {
                Some((key, table)) => sources.locate(error, table, key),
                None => (None, None),
            };
            ConfigError::InvalidValue {
                key: path.join("."),
                found: found.to_string(),
                expected: expected.clone(),
                span,
                src,
            }
        }
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Split a table header body like `pricing.ollama."mistral-small3.1:24b"`
/// into its keys, honoring quotes.
fn header_keys(header: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut current = String::new();
    let mut quote = None;
    for ch in header.chars() {
        match (quote, ch) {
            (None, '"' | '\'') => quote = Some(ch),
            (Some(q), c) if c == q => quote = None,
            (None, '.') => keys.push(std::mem::take(&mut current).trim().to_string()),
            (_, c) => current.push(c),
        }
    }
    keys.push(current.trim().to_string());
    keys
}

/// Byte offset of `key` inside `[table]`, or of the `[table]` header itself
/// when `key` is empty. Keys before the first header belong to the root.
pub fn key_offset(content: &str, table: &[String], key: &str) -> Option<usize> {
    let mut current: Vec<String> = Vec::new();
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();
        let body = trimmed.trim_end();

        if let Some(inner) = body.strip_prefix('[').and_then(|b| b.strip_suffix(']')) {
            current = header_keys(inner.trim_matches(|c| c == '[' || c == ']'));
            if key.is_empty() && current == table {
                return Some(offset + indent + 1);
            }
        } else if !key.is_empty()
            && current == table
            && let Some((name, _)) = body.split_once('=')
            && name.trim().trim_matches('"') == key
        {
            return Some(offset + indent);
        }

        offset += line.len();
    }

    None
}

/// Print diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("fout: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn suggests_close_keys_only() {
        assert_eq!(
            suggest_key("databse_path", &["database_path", "table"]),
            Some("database_path".to_string())
        );
        assert_eq!(suggest_key("zzzzzz", &["level"]), None);
    }

    #[test]
    fn suggests_section_names() {
        assert_eq!(suggest_key("thresholdz", SECTIONS), Some("thresholds".to_string()));
        assert_eq!(suggest_key("prcing", SECTIONS), Some("pricing".to_string()));
    }

    #[test]
    fn key_offset_stays_inside_its_table() {
        let content = "[ledger]\ntable = \"a\"\n\n[report]\ntable = \"b\"\n";
        let o = key_offset(content, &keys(&["report"]), "table").unwrap();
        assert_eq!(&content[o..o + 11], "table = \"b\"");
        assert_eq!(key_offset(content, &keys(&["host"]), "table"), None);
    }

    #[test]
    fn key_offset_handles_quoted_model_headers() {
        let content = "[pricing.ollama.\"mistral-small3.1:24b\"]\ninput = 0.0\nouput = 0.0\n";
        let table = keys(&["pricing", "ollama", "mistral-small3.1:24b"]);
        let o = key_offset(content, &table, "ouput").unwrap();
        assert_eq!(&content[o..o + 5], "ouput");
    }

    #[test]
    fn key_offset_finds_section_header() {
        let content = "[logging]\nlevel = \"info\"\n[reprot]\nformat = \"json\"\n";
        let o = key_offset(content, &keys(&["reprot"]), "").unwrap();
        assert_eq!(&content[o..o + 6], "reprot");
    }

    #[test]
    fn header_keys_split_on_unquoted_dots() {
        assert_eq!(
            header_keys("pricing.ollama.\"mistral-small3.1:24b\""),
            keys(&["pricing", "ollama", "mistral-small3.1:24b"])
        );
    }
}
