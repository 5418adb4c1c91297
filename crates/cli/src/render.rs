//! Terminal rendering of research records.

use std::fmt::Write as _;

use delve_storage::ResearchRecord;

use crate::desk::{HistoryEntry, START_FRESH_LABEL};
use crate::OutputFormat;

/// Shown instead of a source list when the agent cited nothing.
pub(crate) const NO_SOURCES: &str = "No sources available";

/// Print a record in the requested format.
pub(crate) fn print_record(record: &ResearchRecord, output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Text => print!("{}", record_text(record)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
    }
    Ok(())
}

/// Print the continuation picker.
pub(crate) fn print_history(
    entries: &[HistoryEntry],
    output: OutputFormat,
) -> anyhow::Result<()> {
    match output {
        OutputFormat::Text => print!("{}", history_text(entries)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(entries)?),
    }
    Ok(())
}

pub(crate) fn record_text(record: &ResearchRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Research {} [{}]", record.id, record.status);
    let _ = writeln!(out, "Query: {}", record.query);
    if let Some(parent) = &record.parent_id {
        let _ = writeln!(out, "Continued from research ID: {parent}");
    }

    if let Some(report) = &record.report {
        section(&mut out, "Report");
        let _ = writeln!(out, "{}", report.trim_end());
    }
    if let Some(summary) = &record.summary {
        section(&mut out, "Summary");
        let _ = writeln!(out, "{}", summary.trim_end());
    }

    section(&mut out, "Usage");
    let _ = writeln!(out, "Input Tokens: {}", record.tokens.input_or_zero());
    let _ = writeln!(out, "Output Tokens: {}", record.tokens.output_or_zero());
    let _ = writeln!(out, "Estimated Cost: ${}", record.cost);

    section(&mut out, "Sources");
    if record.sources.is_empty() {
        let _ = writeln!(out, "{NO_SOURCES}");
    } else {
        for source in &record.sources {
            let _ = writeln!(out, "- {source}");
        }
    }

    if let Some(trace_id) = &record.trace_id {
        let _ = writeln!(out, "\nTrace ID: {trace_id}");
    }
    out
}

pub(crate) fn history_text(entries: &[HistoryEntry]) -> String {
    let mut out = format!("  {START_FRESH_LABEL}\n");
    for entry in entries {
        let _ = writeln!(out, "  {}  {}", entry.id, entry.label);
    }
    out
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}\n{}", "-".repeat(title.len()));
}
