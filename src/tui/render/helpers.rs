use ratatui::text::Span;
use regex::Regex;

use crate::model::task::TaskStatus;
use crate::ops::view::Availability;
use crate::util::unicode;

/// Status symbols (markdown checkbox style)
pub(super) fn status_symbol(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::InProgress => "[>]",
        TaskStatus::Completed => "[x]",
        TaskStatus::Failed => "[!]",
    }
}

/// Human label for a status
pub(super) fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::InProgress => "in progress",
        TaskStatus::Completed => "done",
        TaskStatus::Failed => "failed",
    }
}

/// Marker column for availability: ● ready, ⊘ blocked
pub(super) fn availability_symbol(availability: Availability) -> &'static str {
    match availability {
        Availability::Available => "\u{25CF}",
        Availability::Blocked => "\u{2298}",
        Availability::NotPending => " ",
    }
}

/// `width`-cell bar, filled in proportion to `percent`
pub(super) fn progress_bar(percent: u8, width: usize) -> String {
    let filled = ((percent.min(100) as usize * width) as f64 / 100.0).round() as usize;
    format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(width - filled)
    )
}

/// Byte ranges of case-insensitive matches of `query` in `text`
pub(super) fn match_ranges(text: &str, query: &str) -> Vec<(usize, usize)> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    match Regex::new(&format!("(?i){}", regex::escape(query))) {
        Ok(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
        Err(_) => Vec::new(),
    }
}

/// Compute total display width of a slice of spans
pub(super) fn spans_width(spans: &[Span]) -> usize {
    spans
        .iter()
        .map(|s| unicode::display_width(&s.content))
        .sum()
}
