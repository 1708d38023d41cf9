// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Kompas - resource and spend telemetry for a local AI-assistant host.
//!
//! This is the binary entry point.

use std::io::IsTerminal;
use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use kompas::{record_call, render, report, CallSpec};
use kompas_config::KompasConfig;
use kompas_core::{KompasError, ReportFormat};
use kompas_usage::MonthPeriod;

/// Kompas - resource and spend telemetry for a local AI-assistant host.
#[derive(Parser, Debug)]
#[command(name = "kompas", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the full server status report.
    Report {
        /// Month to report on (YYYY-MM); defaults to the current month.
        #[arg(long)]
        month: Option<MonthPeriod>,
        /// Output format (text or json).
        #[arg(long)]
        format: Option<ReportFormat>,
        /// Include per-model detail and timelines.
        #[arg(long)]
        verbose: bool,
        /// Generate the report immediately (always the case).
        #[arg(long)]
        now: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the token usage report only.
    Tokens {
        /// Month to report on (YYYY-MM); defaults to the current month.
        #[arg(long)]
        month: Option<MonthPeriod>,
        /// Output format (text or json).
        #[arg(long)]
        format: Option<ReportFormat>,
        /// Include per-model detail and timelines.
        #[arg(long)]
        verbose: bool,
    },
    /// Append one model call to the usage ledger.
    Record {
        #[arg(long)]
        provider: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        input_tokens: u64,
        #[arg(long)]
        output_tokens: u64,
        #[arg(long)]
        project: Option<String>,
        /// Cost in EUR; estimated from the price table when omitted.
        #[arg(long)]
        cost_eur: Option<f64>,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => kompas_config::load_and_validate_path(path),
        None => kompas_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            kompas_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);

    if let Err(e) = run(cli.command, &config).await {
        eprintln!("fout: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &KompasConfig) -> Result<(), KompasError> {
    let today = Local::now().date_naive();

    match command {
        Commands::Report {
            month,
            format,
            verbose,
            now: _,
            plain,
        } => {
            let period = month.unwrap_or_else(|| MonthPeriod::containing(today));
            let ledger = report::open_ledger(config).await?;
            let server = report::server_report(ledger, config, period, today).await?;
            match format.unwrap_or(config.report.format) {
                ReportFormat::Json => println!("{}", to_json(&server)?),
                ReportFormat::Text => {
                    let use_color = !plain && std::io::stdout().is_terminal();
                    println!("{}", render::server_report(&server, verbose, use_color));
                }
            }
        }
        Commands::Tokens {
            month,
            format,
            verbose,
        } => {
            let period = month.unwrap_or_else(|| MonthPeriod::containing(today));
            let ledger = report::open_ledger(config).await?;
            let usage = report::usage_report(ledger, config, period, today).await?;
            match format.unwrap_or(config.report.format) {
                ReportFormat::Json => println!("{}", to_json(&usage)?),
                ReportFormat::Text => println!(
                    "{}",
                    render::token_report(&usage, config.report.top_projects, verbose)
                ),
            }
        }
        Commands::Record {
            provider,
            model,
            input_tokens,
            output_tokens,
            project,
            cost_eur,
        } => {
            let call = CallSpec {
                provider,
                model,
                input_tokens,
                output_tokens,
                project,
                cost_eur,
            };
            let record = record_call(config, &call, Local::now().naive_local()).await?;
            println!(
                "geregistreerd: {}/{} {} tokens, €{:.4}",
                record.provider_key(),
                record.model_key(),
                record.total_tokens(),
                record.cost_eur
            );
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(config)
                .map_err(|e| KompasError::Internal(format!("config serialization failed: {e}")))?;
            print!("{rendered}");
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, KompasError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| KompasError::Internal(format!("json serialization failed: {e}")))
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so JSON on stdout stays parseable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kompas={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_report_flags() {
        let cli = Cli::try_parse_from([
            "kompas", "report", "--month", "2026-02", "--format", "json", "--verbose", "--now",
        ])
        .unwrap();
        match cli.command {
            Commands::Report {
                month,
                format,
                verbose,
                now,
                ..
            } => {
                assert_eq!(month, Some(MonthPeriod::new(2026, 2).unwrap()));
                assert_eq!(format, Some(ReportFormat::Json));
                assert!(verbose);
                assert!(now);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_month() {
        assert!(Cli::try_parse_from(["kompas", "tokens", "--month", "2026-13"]).is_err());
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from(["kompas", "config", "--config", "/tmp/k.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.toml")));
    }
}
