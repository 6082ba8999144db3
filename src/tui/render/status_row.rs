use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, Mode, WatchState};
use crate::util::unicode::truncate_to_width;

use super::helpers::spans_width;

const MAX_ERROR_W: usize = 50;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;
    let dim = Style::default().fg(app.theme.dim).bg(bg);

    let (mut spans, hint) = match app.mode {
        Mode::Search => {
            // Search prompt: /pattern▌
            let spans = vec![
                Span::styled(
                    format!("/{}", app.criteria.search),
                    Style::default().fg(app.theme.text_bright).bg(bg),
                ),
                Span::styled("\u{258C}", Style::default().fg(app.theme.highlight).bg(bg)), // ▌ cursor
            ];
            (spans, "Enter keep  Esc clear")
        }
        Mode::Navigate => (navigate_spans(app), "? help"),
    };

    let content_width = spans_width(&spans);
    let hint_width = hint.chars().count();
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, dim));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

/// Watch state, load problems and the latest error
fn navigate_spans(app: &App) -> Vec<Span<'static>> {
    let bg = app.theme.background;
    let dim = Style::default().fg(app.theme.dim).bg(bg);
    let warn = Style::default().fg(app.theme.yellow).bg(bg);
    let red = Style::default().fg(app.theme.red).bg(bg);

    let mut spans = vec![match app.watch_state {
        WatchState::Watching => Span::styled(
            " \u{25C9} watching",
            Style::default().fg(app.theme.green).bg(bg),
        ),
        WatchState::Off => Span::styled(" \u{25CB} not watching", dim),
        WatchState::Failed => Span::styled(" \u{2717} watch failed", red),
    }];

    let warnings = app.graph.warnings().len();
    if warnings > 0 {
        spans.push(Span::styled(
            format!("   {} warning{}", warnings, if warnings == 1 { "" } else { "s" }),
            warn,
        ));
    }
    let cycles = app.graph.cycles().len();
    if cycles > 0 {
        spans.push(Span::styled(
            format!("   {} cycle{}", cycles, if cycles == 1 { "" } else { "s" }),
            red,
        ));
    }
    if let Some(err) = &app.last_error {
        spans.push(Span::styled(
            format!("   {}", truncate_to_width(err, MAX_ERROR_W)),
            red,
        ));
    }
    spans
}
