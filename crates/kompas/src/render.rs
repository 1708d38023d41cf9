// SPDX-FileCopyrightText: 2026 Kompas Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dutch plain-text rendering of the server and token reports.
//!
//! Renderers only format; every number arrives already rounded from the
//! usage engine.

use chrono::Local;
use kompas_host::HostSnapshot;
use kompas_usage::{DailyTotal, PeriodAggregate, Timeline, UsageReport};

use crate::assess::HostStatus;
use crate::format::{money, thousands};
use crate::report::ServerReport;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn header(lines: &mut Vec<String>, title: &str) {
    lines.push(String::new());
    lines.push(rule());
    lines.push(title.to_string());
    lines.push(rule());
}

fn footer(lines: &mut Vec<String>) {
    lines.push(String::new());
    lines.push(rule());
    lines.push(String::new());
}

fn status_line(status: HostStatus, use_color: bool) -> String {
    if !use_color {
        return status.to_string();
    }
    use colored::Colorize;
    let text = status.to_string();
    match status {
        HostStatus::Healthy => text.green().bold().to_string(),
        HostStatus::Caution => text.yellow().bold().to_string(),
        HostStatus::Critical => text.red().bold().to_string(),
    }
}

fn host_lines(lines: &mut Vec<String>, snapshot: &HostSnapshot) {
    let ram = &snapshot.ram;
    let swap = &snapshot.swap;
    lines.push(format!(
        "RAM:    {:6.1}% ({:5.1}GB / {:5.1}GB)",
        ram.percent, ram.used_gb, ram.total_gb
    ));
    lines.push(format!(
        "CPU:    {:6.2} load ({} cores, {:.0}%)",
        snapshot.cpu.load_1min, snapshot.cpu.cores, snapshot.cpu.percent
    ));
    lines.push(format!(
        "Swap:   {:6.1}% ({:5.1}GB / {:5.1}GB)",
        swap.percent, swap.used_gb, swap.total_gb
    ));
    lines.push(format!(
        "Schijf: {:6.1}% ({:5.1}GB vrij)",
        snapshot.disk.percent_used, snapshot.disk.free_gb
    ));
    if let Some(temp) = snapshot.temperature.cpu_temp_c {
        lines.push(format!("Temp:   {temp:6.1}°C"));
    }

    lines.push(String::new());
    lines.push("DIENSTEN:".to_string());
    let ollama = &snapshot.ollama;
    if ollama.status.is_healthy() {
        lines.push(format!(
            "  Ollama:      {} modellen ({:.1}GB)",
            ollama.model_count, ollama.total_memory_gb
        ));
    } else {
        lines.push("  Ollama:      onbereikbaar".to_string());
    }
    lines.push(format!(
        "  Vectorindex: {} docs ({:.1}MB)",
        snapshot.vector_index.doc_count, snapshot.vector_index.size_mb
    ));
}

fn budget_lines(lines: &mut Vec<String>, aggregate: &PeriodAggregate, indent: &str) {
    if aggregate.budget_remaining_eur > 0.0 {
        lines.push(format!(
            "{indent}Budget resterend: €{}",
            money(aggregate.budget_remaining_eur)
        ));
    }
    if let Some(ceiling) = aggregate.budget_ceiling_eur {
        lines.push(format!(
            "{indent}Budgetgebruik:    {:.2}% van €{}",
            aggregate.budget_utilization_pct,
            money(ceiling)
        ));
    }
}

fn timeline_lines(lines: &mut Vec<String>, title: &str, timeline: &Timeline) {
    lines.push(String::new());
    lines.push(format!("{title}:"));
    if timeline.is_empty() {
        lines.push("  (geen gebruik)".to_string());
        return;
    }
    for (bucket, models) in timeline.iter() {
        let tokens: u64 = models.values().map(|m| m.tokens).sum();
        let calls: u64 = models.values().map(|m| m.calls).sum();
        lines.push(format!(
            "  {bucket:<10} {:>12} tokens  ({calls} calls)",
            thousands(tokens)
        ));
        for (model, usage) in models.iter() {
            let active = usage
                .days_active
                .map(|d| format!(", {d} dagen actief"))
                .unwrap_or_default();
            lines.push(format!(
                "      • {model:<32} €{:>9}{active}",
                money(usage.cost_eur)
            ));
        }
    }
}

fn trend_lines(lines: &mut Vec<String>, trend: &[DailyTotal]) {
    lines.push(String::new());
    lines.push("📈 DAGTREND:".to_string());
    if trend.is_empty() {
        lines.push("  (geen gebruik)".to_string());
        return;
    }
    for day in trend {
        lines.push(format!(
            "  {}  {:>12} tokens  €{:>9}  ({} calls)",
            day.date,
            thousands(day.tokens),
            money(day.cost_eur),
            day.calls
        ));
    }
}

fn detail_lines(lines: &mut Vec<String>, usage: &UsageReport) {
    let aggregate = &usage.aggregate;
    lines.push(String::new());
    lines.push("🧠 PER MODEL:".to_string());
    for (model, totals) in aggregate.by_model.iter() {
        lines.push(format!(
            "  {model:<40} {:>12} tokens  €{:>9}  ({} calls)",
            thousands(totals.tokens),
            money(totals.cost_eur),
            totals.calls
        ));
    }
    timeline_lines(lines, "📅 PER DAG", &usage.timeline.daily);
    timeline_lines(lines, "📅 PER WEEK", &usage.timeline.weekly);
    timeline_lines(lines, "📅 PER MAAND", &usage.timeline.monthly);
    trend_lines(lines, &usage.daily_trend);
}

/// The combined server status report.
pub fn server_report(report: &ServerReport, verbose: bool, use_color: bool) -> String {
    let mut lines = Vec::new();
    let stamp = report.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M");
    header(&mut lines, &format!("📊 SERVERSTATUS · {stamp}"));

    lines.push(String::new());
    lines.push(status_line(report.status, use_color));
    host_lines(&mut lines, &report.metrics);

    let aggregate = &report.tokens.aggregate;
    lines.push(String::new());
    lines.push(format!("💰 TOKEN TELEMETRIE ({}):", aggregate.period));
    lines.push(format!(
        "  Totaal tokens:  {:>12}",
        thousands(aggregate.total_tokens)
    ));
    lines.push(format!(
        "  Totaal kosten:  €{:>11}",
        money(aggregate.total_cost_eur)
    ));

    lines.push(String::new());
    lines.push("  Per aanbieder:".to_string());
    for (provider, rollup) in aggregate.by_provider.iter() {
        if rollup.cost_eur <= 0.0 {
            continue;
        }
        lines.push(format!(
            "    {provider:<12}: €{:>8} ({:>8} tokens)",
            money(rollup.cost_eur),
            thousands(rollup.tokens)
        ));
        for (model, cost) in rollup.models.iter() {
            if cost.cost_eur > 0.0 {
                lines.push(format!("      • {model:<25}: €{}", money(cost.cost_eur)));
            }
        }
    }

    if aggregate.budget_remaining_eur > 0.0 || aggregate.budget_ceiling_eur.is_some() {
        lines.push(String::new());
        budget_lines(&mut lines, aggregate, "  ");
    }

    if verbose {
        detail_lines(&mut lines, &report.tokens);
    }

    lines.push(String::new());
    lines.push("⚙️ AANBEVELINGEN:".to_string());
    for rec in &report.recommendations {
        lines.push(format!("  {} {}", rec.severity, rec.message));
    }

    footer(&mut lines);
    lines.join("\n")
}

/// The token-only report of `kompas tokens`.
pub fn token_report(usage: &UsageReport, top_projects: usize, verbose: bool) -> String {
    let aggregate = &usage.aggregate;
    let mut lines = Vec::new();
    header(
        &mut lines,
        &format!("📊 TOKEN TELEMETRIE RAPPORT · {}", aggregate.period),
    );

    lines.push(String::new());
    lines.push("💰 TOTAAL:".to_string());
    lines.push(format!("  Tokens:    {:>15}", thousands(aggregate.total_tokens)));
    lines.push(format!("  USD:       ${:>14}", money(aggregate.total_cost_usd)));
    lines.push(format!("  EUR:       €{:>14}", money(aggregate.total_cost_eur)));

    lines.push(String::new());
    lines.push("🔌 PER AANBIEDER:".to_string());
    for (provider, rollup) in aggregate.by_provider.iter() {
        lines.push(String::new());
        lines.push(format!("  {}", provider.to_uppercase()));
        lines.push(format!("    Tokens: {:>10}", thousands(rollup.tokens)));
        lines.push(format!("    Kosten: €{:>9}", money(rollup.cost_eur)));
        for (model, cost) in rollup.models.iter() {
            lines.push(format!(
                "      • {model}: {:>8} tokens, €{}",
                thousands(cost.tokens),
                money(cost.cost_eur)
            ));
        }
    }

    lines.push(String::new());
    lines.push("📦 TOP PROJECTEN:".to_string());
    for (rank, (project, totals)) in aggregate.by_project.iter().take(top_projects).enumerate() {
        lines.push(format!(
            "  {:>2}. {project:<25} €{:>8}  ({} calls)",
            rank + 1,
            money(totals.cost_eur),
            totals.calls
        ));
    }

    if aggregate.budget_remaining_eur > 0.0 || aggregate.budget_ceiling_eur.is_some() {
        lines.push(String::new());
        lines.push("💳 BUDGET:".to_string());
        budget_lines(&mut lines, aggregate, "  ");
    }

    if verbose {
        detail_lines(&mut lines, usage);
    }

    footer(&mut lines);
    lines.join("\n")
}
