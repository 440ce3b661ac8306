//! Console reporting - live diagnostics and the run summary

use console::style;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::core::diagnostics::{Diagnostic, Diagnostics};
use crate::eco::ExtractionStats;

/// Print one diagnostic as it is discovered
pub fn print_diagnostic(diagnostic: &Diagnostic) {
    let location = diagnostic
        .cell
        .as_ref()
        .map(|cell| format!("[{}] ", cell))
        .unwrap_or_default();

    if diagnostic.is_error() {
        eprintln!(
            "{} {}{}",
            style("✗").red(),
            style(location).dim(),
            diagnostic
        );
    } else {
        eprintln!(
            "{} {}{}",
            style("!").yellow(),
            style(location).dim(),
            diagnostic
        );
    }
}

/// Print a progress line
pub fn progress(message: impl std::fmt::Display) {
    println!("{} {}", style("→").blue(), message);
}

/// Print a success line
pub fn success(message: impl std::fmt::Display) {
    println!("{} {}", style("✓").green().bold(), message);
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Item")]
    label: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
}

/// Build the statistics table
pub fn summary_table(stats: &ExtractionStats, diags: &Diagnostics) -> String {
    let rows = vec![
        SummaryRow {
            label: "Configuration items",
            count: stats.total_items,
        },
        SummaryRow {
            label: "Changed items",
            count: stats.changed_items,
        },
        SummaryRow {
            label: "Skipped items",
            count: stats.skipped_items,
        },
        SummaryRow {
            label: "Media blocks",
            count: stats.blocks,
        },
        SummaryRow {
            label: "Errors",
            count: diags.error_count(),
        },
        SummaryRow {
            label: "Warnings",
            count: diags.warning_count(),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Print the end-of-run summary, repeating every error
pub fn print_summary(stats: &ExtractionStats, diags: &Diagnostics) {
    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Extraction Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", summary_table(stats, diags));

    if diags.has_errors() {
        println!();
        println!("{}", style("Errors").red().bold());
        for error in diags.errors() {
            match &error.cell {
                Some(cell) => println!("  {} [{}] {}", style("✗").red(), cell, error.message),
                None => println!("  {} {}", style("✗").red(), error.message),
            }
        }
    }

    println!();
}
