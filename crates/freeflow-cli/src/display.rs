//! Terminal presentation of free cash flow results.
//!
//! Values are magnitude-scaled with two decimals. The suffix is picked from
//! the unrounded magnitude, so 999 999 999 renders as `1000.00M`.

use std::io::IsTerminal;

use freeflow_core::MetricView;
use serde::Deserialize;

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";
const NOTE_MARKER: &str = "*";
const UNAVAILABLE: &str = "N/A";

/// One row of `data.results` as it appears in the envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultRow {
    pub symbol: String,
    #[serde(default)]
    pub strategy: Option<String>,
    pub fcf_ttm: MetricView,
}

pub fn format_compact(value: f64) -> String {
    let magnitude = value.abs();
    let (scaled, suffix) = if magnitude >= 1e9 {
        (value / 1e9, "B")
    } else if magnitude >= 1e6 {
        (value / 1e6, "M")
    } else if magnitude >= 1e3 {
        (value / 1e3, "K")
    } else {
        (value, "")
    };
    format!("{scaled:.2}{suffix}")
}

/// Colour only when stdout is a terminal and `NO_COLOR` is unset.
pub fn color_enabled() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

pub fn render_results(rows: &[ResultRow], color: bool, explain: bool) -> String {
    let cells: Vec<(String, bool)> = rows.iter().map(value_cell).collect();
    let symbol_width = rows
        .iter()
        .map(|row| row.symbol.len())
        .chain(std::iter::once("SYMBOL".len()))
        .max()
        .unwrap_or_default();
    let value_width = cells
        .iter()
        .map(|(cell, _)| cell.len())
        .chain(std::iter::once("FCF TTM".len()))
        .max()
        .unwrap_or_default();

    let mut lines = vec![format!(
        "{:<symbol_width$}  {:>value_width$}  STRATEGY",
        "SYMBOL", "FCF TTM"
    )];
    for (row, (cell, negative)) in rows.iter().zip(&cells) {
        let padded = format!("{cell:>value_width$}");
        let value = if color && *negative {
            format!("{RED}{padded}{RESET}")
        } else {
            padded
        };
        lines.push(format!(
            "{:<symbol_width$}  {value}  {}",
            row.symbol,
            row.strategy.as_deref().unwrap_or("-")
        ));
    }

    let notes: Vec<String> = rows
        .iter()
        .filter_map(|row| {
            row.fcf_ttm
                .note
                .as_ref()
                .map(|note| format!("{NOTE_MARKER} {}: {note}", row.symbol))
        })
        .collect();
    if !notes.is_empty() {
        lines.push(String::new());
        lines.extend(notes);
    }

    if explain {
        let details: Vec<String> = rows
            .iter()
            .filter_map(|row| {
                row.fcf_ttm
                    .error
                    .as_ref()
                    .map(|error| format!("  {}: {error}", row.symbol))
            })
            .collect();
        if !details.is_empty() {
            lines.push(String::new());
            lines.push(String::from("errors:"));
            lines.extend(details);
        }
    }

    lines.join("\n")
}

/// Rendered value and whether it is negative.
fn value_cell(row: &ResultRow) -> (String, bool) {
    let view = &row.fcf_ttm;
    match view.value {
        Some(value) if view.error.is_none() => {
            let marker = if view.note.is_some() { NOTE_MARKER } else { "" };
            (format!("{}{marker}", format_compact(value)), value < 0.0)
        }
        _ => (String::from(UNAVAILABLE), false),
    }
}
