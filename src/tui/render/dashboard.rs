use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::io::project_io::{MARKER_DIR, TASKS_DIR};
use crate::ops::view::{Summary, TaskRow};
use crate::tui::app::App;
use crate::util::unicode::fit_to_width;

use super::helpers::{availability_symbol, progress_bar, spans_width, status_label};
use super::push_highlighted_spans;

const ID_W: usize = 7;
const STATUS_W: usize = 12;
const PRIORITY_W: usize = 9;
const DEPS_W: usize = 10;
const PROGRESS_W: usize = 20;

/// Render the overview: summary header above the task table
pub fn render_dashboard(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // summary + spacer
            Constraint::Length(1), // column header
            Constraint::Min(1),    // rows
        ])
        .split(area);

    // Clamp and scroll before borrowing the rows
    let visible_height = chunks[2].height as usize;
    let len = app.rows().rows.len();
    app.overview.clamp(len);
    app.overview.scroll_into_view(visible_height);

    let result = app.rows();
    render_summary(frame, app, &result.summary, chunks[0]);
    render_header(frame, app, chunks[1]);

    let bg = app.theme.background;
    if result.rows.is_empty() {
        let msg = if app.graph.tasks().is_empty() {
            format!(" No tasks yet. Add task files under {}/{}/", MARKER_DIR, TASKS_DIR)
        } else {
            " no matching tasks".to_string()
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(app.theme.dim).bg(bg));
        frame.render_widget(empty, chunks[2]);
        return;
    }

    let width = chunks[2].width as usize;
    let start = app.overview.scroll;
    let end = result.rows.len().min(start + visible_height);
    let lines: Vec<Line> = result.rows[start..end]
        .iter()
        .enumerate()
        .map(|(i, row)| task_row_line(app, row, start + i == app.overview.cursor, width))
        .collect();

    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(bg)),
        chunks[2],
    );
}

fn render_summary(frame: &mut Frame, app: &App, summary: &Summary, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let text = Style::default().fg(theme.text).bg(bg);
    let dim = Style::default().fg(theme.dim).bg(bg);
    let bright = Style::default()
        .fg(theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let health = summary.health();

    let counts = Line::from(vec![
        Span::styled(format!(" {} tasks", summary.total), bright),
        Span::styled("   ", text),
        Span::styled(
            format!("\u{2713} {} done", summary.by_status.completed),
            Style::default().fg(theme.green).bg(bg),
        ),
        Span::styled("   ", text),
        Span::styled(
            format!("\u{25B8} {} in progress", summary.by_status.in_progress),
            Style::default().fg(theme.yellow).bg(bg),
        ),
        Span::styled("   ", text),
        Span::styled(format!("\u{25CB} {} pending", summary.by_status.pending), text),
        Span::styled("   ", text),
        Span::styled(
            format!("\u{2717} {} failed", summary.by_status.failed),
            Style::default().fg(theme.red).bg(bg),
        ),
    ]);

    let progress = Line::from(vec![
        Span::styled(" Progress ", dim),
        Span::styled(
            progress_bar(summary.completion_percent, PROGRESS_W),
            Style::default().fg(theme.green).bg(bg),
        ),
        Span::styled(format!(" {}%", summary.completion_percent), bright),
        Span::styled("   Health ", dim),
        Span::styled(
            health.label(),
            Style::default()
                .fg(theme.health_color(health))
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let mut criteria = vec![
        Span::styled(format!(" {} available", summary.available), text),
        Span::styled("   ", text),
        Span::styled(
            format!("{} blocked", summary.blocked),
            if summary.blocked > 0 {
                Style::default().fg(theme.red).bg(bg)
            } else {
                text
            },
        ),
        Span::styled("   filter ", dim),
        Span::styled(app.criteria.status.as_str(), text),
        Span::styled("   sort ", dim),
        Span::styled(app.criteria.sort.as_str(), text),
    ];
    if !app.criteria.search.is_empty() {
        criteria.push(Span::styled("   search ", dim));
        criteria.push(Span::styled(
            format!("\"{}\"", app.criteria.search),
            Style::default().fg(theme.highlight).bg(bg),
        ));
    }

    let lines = vec![counts, progress, Line::from(criteria)];
    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let style = Style::default()
        .fg(app.theme.dim)
        .bg(app.theme.background)
        .add_modifier(Modifier::BOLD);
    let header = format!(
        "   {}{}{}{}TITLE",
        fit_to_width("ID", ID_W),
        fit_to_width("STATUS", STATUS_W),
        fit_to_width("PRIORITY", PRIORITY_W),
        fit_to_width("DEPS", DEPS_W),
    );
    frame.render_widget(Paragraph::new(Line::from(Span::styled(header, style))), area);
}

/// One table row. The selected row is drawn on the selection background.
fn task_row_line<'a>(app: &App, row: &TaskRow, selected: bool, width: usize) -> Line<'a> {
    let theme = &app.theme;
    let task = row.task;
    let bg = if selected {
        theme.selection_bg
    } else {
        theme.background
    };
    let base = Style::default().fg(theme.text).bg(bg);
    let avail_color = match row.availability {
        crate::ops::view::Availability::Blocked => theme.red,
        _ => theme.green,
    };
    let highlight = Style::default()
        .fg(theme.search_match_fg)
        .bg(theme.search_match_bg);

    let deps = if task.dependencies.is_empty() {
        "-".to_string()
    } else {
        task.dependencies
            .iter()
            .map(|d| d.as_str())
            .collect::<Vec<_>>()
            .join(",")
    };

    let mut spans: Vec<Span> = vec![
        Span::styled(if selected { "\u{258E}" } else { " " }, Style::default().fg(theme.highlight).bg(bg)),
        Span::styled(
            availability_symbol(row.availability),
            Style::default().fg(avail_color).bg(bg),
        ),
        Span::styled(" ", base),
    ];
    let id_style = if selected {
        base.fg(theme.text_bright).add_modifier(Modifier::BOLD)
    } else {
        base
    };
    push_highlighted_spans(
        &mut spans,
        &fit_to_width(task.id.as_str(), ID_W),
        id_style,
        highlight,
        &app.criteria.search,
    );
    spans.push(Span::styled(
        fit_to_width(status_label(task.status), STATUS_W),
        base.fg(theme.status_color(task.status)),
    ));
    spans.push(Span::styled(
        fit_to_width(task.priority.as_str(), PRIORITY_W),
        base.fg(theme.priority_color(task.priority)),
    ));
    spans.push(Span::styled(fit_to_width(&deps, DEPS_W), base.fg(theme.dim)));

    let title_w = width.saturating_sub(spans_width(&spans));
    let title_style = if selected {
        base.fg(theme.text_bright)
    } else {
        base
    };
    push_highlighted_spans(
        &mut spans,
        &fit_to_width(&task.title, title_w),
        title_style,
        highlight,
        &app.criteria.search,
    );

    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::render::test_helpers::*;
    use std::sync::Arc;

    fn render(app: &mut App) -> String {
        render_to_string(TERM_W, TERM_H, |frame, area| {
            render_dashboard(frame, app, area);
        })
    }

    #[test]
    fn overview_shows_summary_and_rows() {
        let mut app = sample_app();
        let output = render(&mut app);
        assert!(output.contains("4 tasks"));
        assert!(output.contains("25%"));
        assert!(output.contains("Health Needs Attention"));
        assert!(output.contains("1 available   1 blocked"));

        // Default sort is priority: critical task first
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[5].contains("Write parser"));
        assert!(lines[5].contains("critical"));
    }

    #[test]
    fn blocked_rows_are_marked() {
        let mut app = sample_app();
        let output = render(&mut app);
        let row = output
            .lines()
            .find(|l| l.contains("Render table"))
            .unwrap();
        assert!(row.contains('\u{2298}'));
    }

    #[test]
    fn filter_and_search_narrow_rows() {
        let mut app = sample_app();
        app.set_search("write".into());
        let output = render(&mut app);
        assert!(output.contains("Write parser"));
        assert!(output.contains("Write docs"));
        assert!(!output.contains("Render table"));
        assert!(output.contains("search \"write\""));
    }

    #[test]
    fn empty_project_has_hint() {
        let mut app = App::new(
            Arc::new(graph_of(Vec::new())),
            &crate::model::config::UiConfig::default(),
        );
        let output = render(&mut app);
        assert!(output.contains("0 tasks"));
        assert!(output.contains("0%"));
        assert!(output.contains("No tasks yet"));
    }

    #[test]
    fn no_matches_message() {
        let mut app = sample_app();
        app.set_search("zzz".into());
        let output = render(&mut app);
        assert!(output.contains("no matching tasks"));
    }
}
