use std::collections::BTreeMap;

use anyhow::Result;
use serde::Serialize;
use spley_lib::summary::ranked;
use spley_lib::{DatasetSummary, RunStatistics, SamplerSummary, ValidationReport};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            "markdown" | "md" => OutputFormat::Markdown,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Tabled, Serialize)]
struct StatRow {
    #[tabled(rename = "Metric")]
    #[serde(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Tabled, Serialize)]
struct CountRow {
    #[tabled(rename = "Name")]
    #[serde(rename = "Name")]
    name: String,
    #[tabled(rename = "Bills")]
    #[serde(rename = "Bills")]
    count: usize,
    #[tabled(rename = "Share")]
    #[serde(rename = "Share")]
    share: String,
}

fn stat(metric: &str, value: impl ToString) -> StatRow {
    StatRow {
        metric: metric.to_string(),
        value: value.to_string(),
    }
}

// -- Row builders --

fn build_run_rows(stats: &RunStatistics, report: Option<&ValidationReport>) -> Vec<StatRow> {
    let mut rows = vec![
        stat("Pages scraped", stats.pages_scraped),
        stat("Bills found", stats.projects_found),
        stat("Errors", stats.errors_encountered),
        stat("Retries", stats.retries_performed),
        stat("Bills per page", format!("{:.1}", stats.projects_per_page())),
        stat(
            "Duration",
            stats
                .duration_secs()
                .map(|s| format!("{:.1}s", s))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    if let Some(report) = report {
        rows.push(stat("Rows extracted", report.total_records));
        rows.push(stat("Invalid rows", report.invalid_records));
        rows.push(stat("Warnings", report.total_warnings));
        rows.push(stat("Validity", format!("{:.1}%", report.validity_rate())));
    }
    rows
}

fn build_overview_rows(summary: &DatasetSummary) -> Vec<StatRow> {
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let top_author = summary
        .most_active_author
        .as_ref()
        .map(|(name, n)| format!("{} ({})", name, n))
        .unwrap_or_else(|| "-".to_string());
    vec![
        stat("Bills", summary.total_records),
        stat("First date", date(summary.first_date)),
        stat("Last date", date(summary.last_date)),
        stat("Authors per bill", format!("{:.2}", summary.average_authors)),
        stat("Most active author", top_author),
    ]
}

fn build_count_rows(counts: &BTreeMap<String, usize>, total: usize) -> Vec<CountRow> {
    ranked(counts)
        .into_iter()
        .map(|(name, count)| CountRow {
            name,
            count,
            share: format_share(count, total),
        })
        .collect()
}

fn build_resource_rows(summary: &SamplerSummary) -> Vec<StatRow> {
    vec![
        stat("Samples", summary.samples),
        stat(
            "CPU % (current/avg/max)",
            format!(
                "{:.1} / {:.1} / {:.1}",
                summary.current_cpu_percent, summary.avg_cpu_percent, summary.max_cpu_percent
            ),
        ),
        stat(
            "Memory MB (current/avg/max)",
            format!(
                "{:.1} / {:.1} / {:.1}",
                summary.current_memory_mb, summary.avg_memory_mb, summary.max_memory_mb
            ),
        ),
        stat("Threads (max)", summary.max_threads),
    ]
}

// -- Printers --

fn print_rows<T: Tabled + Serialize>(rows: &[T], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        OutputFormat::Json => print_json(&rows),
    }
    Ok(())
}

pub fn print_run_stats(
    stats: &RunStatistics,
    report: Option<&ValidationReport>,
    format: &OutputFormat,
) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(&serde_json::json!({ "stats": stats, "validation": report }));
        return Ok(());
    }
    print_rows(&build_run_rows(stats, report), format)
}

pub fn print_summary(summary: &DatasetSummary, format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(summary);
        return Ok(());
    }
    print_rows(&build_overview_rows(summary), format)?;
    let sections = [
        ("By party", &summary.by_party),
        ("By category", &summary.by_category),
        ("By region", &summary.by_region),
        ("By state", &summary.by_state),
    ];
    for (title, counts) in sections {
        if counts.is_empty() {
            continue;
        }
        println!("\n{}", title);
        print_rows(&build_count_rows(counts, summary.total_records), format)?;
    }
    Ok(())
}

pub fn print_resource_summary(summary: &SamplerSummary, format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        print_json(summary);
        return Ok(());
    }
    print_rows(&build_resource_rows(summary), format)
}

pub fn print_json<T: serde::Serialize>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}

fn format_share(count: usize, total: usize) -> String {
    if total == 0 {
        return "-".to_string();
    }
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
