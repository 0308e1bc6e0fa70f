//! Plain-text rendering of the form view for terminals.
//!
//! Rendering returns `String`s so it stays testable; colour is applied only
//! at print time.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use colored::Colorize;
use recommend::table::{self, COLUMNS};
use recommend::{FormView, RecommendationResult};

const PROGRESS_LINE: &str = "Loading recommendations...";

/// Terminal styling applied while sections are built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Style {
    pub color: bool,
}

#[derive(Clone, Copy)]
enum Tone {
    Heading,
    BannerLabel,
    Banner,
    Muted,
}

impl Style {
    pub const PLAIN: Self = Self { color: false };
    pub const COLOR: Self = Self { color: true };

    fn paint(self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_owned();
        }
        match tone {
            Tone::Heading => text.bold().to_string(),
            Tone::BannerLabel => text.red().bold().to_string(),
            Tone::Banner => text.red().to_string(),
            Tone::Muted => text.dimmed().to_string(),
        }
    }
}

/// Left-aligned text table with a header rule.
#[must_use]
pub fn render_table(result: &RecommendationResult, style: Style) -> String {
    let rows: Vec<[&str; 5]> = table::rows(result).iter().map(table::TableRow::cells).collect();

    let mut widths = COLUMNS.map(|h| h.chars().count());
    for cells in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = style.paint(&padded_line(&COLUMNS, &widths), Tone::Heading);
    out.push('\n');
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for cells in &rows {
        out.push_str(&padded_line(cells, &widths));
        out.push('\n');
    }
    out
}

fn padded_line(cells: &[&str; 5], widths: &[usize; 5]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    padded.join(" | ").trim_end().to_owned()
}

/// Explanation block followed by the results table.
#[must_use]
pub fn render_result(result: &RecommendationResult, style: Style) -> String {
    let mut out = style.paint("Explanation", Tone::Heading);
    out.push('\n');
    out.push_str(result.explanation.trim_end());
    out.push_str("\n\n");
    if result.recommendations.is_empty() {
        out.push_str("No matching assessments.\n");
    } else {
        out.push_str(&render_table(result, style));
    }
    out
}

/// Everything the form currently shows, in display order.
///
/// Progress, error banner and results are independent: a stale result is
/// still rendered below a progress line or an error banner. Service text
/// (explanation, cells) is never styled.
#[must_use]
pub fn render_view(view: &FormView<'_>, style: Style) -> String {
    let mut out = String::new();
    if view.show_progress {
        out.push_str(&style.paint(PROGRESS_LINE, Tone::Muted));
        out.push('\n');
    }
    if let Some(banner) = view.error_banner {
        out.push_str(&style.paint("error:", Tone::BannerLabel));
        out.push(' ');
        out.push_str(&style.paint(banner, Tone::Banner));
        out.push('\n');
    }
    if let Some(result) = view.result {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&render_result(result, style));
    }
    out
}
