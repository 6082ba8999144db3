use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::model::task::{Task, TaskStatus};
use crate::ops::deps;
use crate::ops::view::{self, Availability};
use crate::tui::app::App;
use crate::util::time::format_timestamp;
use crate::util::unicode::truncate_to_width;

use super::helpers::{status_label, status_symbol};

/// Render the detail view for the task in `app.view`.
///
/// `app.detail.cursor` indexes the link list (dependencies, then
/// dependents); `app.detail.scroll` is a line offset.
pub fn render_detail_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    let Some(task) = app.detail_task() else {
        let empty = Paragraph::new(" Task not found")
            .style(Style::default().fg(app.theme.dim).bg(bg));
        frame.render_widget(empty, area);
        return;
    };

    let width = area.width as usize;
    let (lines, selected_line) = detail_lines(app, task, width);
    let total = lines.len();
    let height = area.height as usize;

    let mut scroll = app.detail.scroll;
    if let Some(sel) = selected_line {
        if sel < scroll {
            scroll = sel;
        } else if sel >= scroll + height {
            scroll = sel + 1 - height;
        }
    }
    scroll = scroll.min(total.saturating_sub(height));

    let paragraph = Paragraph::new(lines)
        .style(Style::default().bg(bg))
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
    app.detail.scroll = scroll;
}

/// Build all lines of the detail view. Returns the lines and the index of
/// the line holding the selected link, if any.
fn detail_lines<'a>(app: &App, task: &Task, width: usize) -> (Vec<Line<'a>>, Option<usize>) {
    let theme = &app.theme;
    let bg = theme.background;
    let text = Style::default().fg(theme.text).bg(bg);
    let dim = Style::default().fg(theme.dim).bg(bg);
    let header = Style::default()
        .fg(theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();

    // Breadcrumb: Overview › older › … › current
    let mut crumb = vec![Span::styled(" Overview", dim)];
    for id in app.breadcrumbs.ids() {
        crumb.push(Span::styled(format!(" \u{203A} {}", id), dim));
    }
    crumb.push(Span::styled(format!(" \u{203A} {}", task.id), text));
    lines.push(Line::from(crumb));
    lines.push(Line::from(""));

    // Title
    lines.push(Line::from(vec![
        Span::styled(
            format!(" {} ", status_symbol(task.status)),
            Style::default().fg(theme.status_color(task.status)).bg(bg),
        ),
        Span::styled(format!("{}  ", task.id), header),
        Span::styled(truncate_to_width(&task.title, width.saturating_sub(12)), header),
    ]));

    // Metadata
    let mut meta = vec![
        Span::styled(" status ", dim),
        Span::styled(
            status_label(task.status),
            Style::default().fg(theme.status_color(task.status)).bg(bg),
        ),
        Span::styled("   priority ", dim),
        Span::styled(
            task.priority.as_str(),
            Style::default().fg(theme.priority_color(task.priority)).bg(bg),
        ),
    ];
    if !task.feature.is_empty() {
        meta.push(Span::styled("   feature ", dim));
        meta.push(Span::styled(task.feature.clone(), text));
    }
    lines.push(Line::from(meta));

    let mut dates = vec![
        Span::styled(" created ", dim),
        Span::styled(format_timestamp(&task.created_at), text),
    ];
    for (label, value) in [
        ("   started ", &task.started_at),
        ("   completed ", &task.completed_at),
    ] {
        if let Some(v) = value {
            dates.push(Span::styled(label, dim));
            dates.push(Span::styled(format_timestamp(v), text));
        }
    }
    if let Some(agent) = &task.assigned_agent {
        dates.push(Span::styled("   agent ", dim));
        dates.push(Span::styled(agent.clone(), text));
    }
    lines.push(Line::from(dates));

    match view::availability(&app.graph, task) {
        Availability::Available => lines.push(Line::from(Span::styled(
            " \u{25CF} ready to start",
            Style::default().fg(theme.green).bg(bg),
        ))),
        Availability::Blocked => {
            let waiting: Vec<&str> = task
                .dependencies
                .iter()
                .filter(|d| {
                    app.graph
                        .task(d)
                        .is_some_and(|t| t.status != TaskStatus::Completed)
                })
                .map(|d| d.as_str())
                .collect();
            lines.push(Line::from(Span::styled(
                format!(" \u{2298} blocked by {}", waiting.join(", ")),
                Style::default().fg(theme.red).bg(bg),
            )));
        }
        Availability::NotPending => {}
    }
    if let Some(err) = &task.error_log {
        lines.push(Line::from(vec![
            Span::styled(" error ", dim),
            Span::styled(err.clone(), Style::default().fg(theme.red).bg(bg)),
        ]));
    }

    // Body sections
    let section = |lines: &mut Vec<Line<'a>>, title: &str, body: &str| {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", title), header)));
        for l in body.lines() {
            lines.push(Line::from(Span::styled(format!("   {}", l), text)));
        }
    };
    if let Some(desc) = &task.description {
        section(&mut lines, "Description", desc);
    }
    if !task.details.is_empty() {
        let bullets: Vec<String> = task
            .details
            .iter()
            .map(|item| {
                let mut out = String::new();
                for (i, l) in item.lines().enumerate() {
                    if i > 0 {
                        out.push('\n');
                        out.push_str("  ");
                    } else {
                        out.push_str("\u{2022} ");
                    }
                    out.push_str(l);
                }
                out
            })
            .collect();
        section(&mut lines, "Details", &bullets.join("\n"));
    }
    if let Some(ts) = &task.test_strategy {
        section(&mut lines, "Test Strategy", ts);
    }
    if let Some(notes) = &task.agent_notes {
        section(&mut lines, "Agent Notes", notes);
    }

    // Links
    let mut link_idx = 0;
    let mut selected_line = None;
    let mut link_line = |lines: &mut Vec<Line<'a>>, indent: usize, linked: &Task| {
        let is_cursor = link_idx == app.detail.cursor;
        let row_bg = if is_cursor { theme.selection_bg } else { bg };
        if is_cursor {
            selected_line = Some(lines.len());
        }
        link_idx += 1;
        lines.push(Line::from(vec![
            Span::styled(" ".repeat(indent), Style::default().bg(row_bg)),
            Span::styled(
                format!("{} ", status_symbol(linked.status)),
                Style::default()
                    .fg(theme.status_color(linked.status))
                    .bg(row_bg),
            ),
            Span::styled(
                format!("{}  ", linked.id),
                Style::default().fg(theme.text_bright).bg(row_bg),
            ),
            Span::styled(linked.title.clone(), Style::default().fg(theme.text).bg(row_bg)),
        ]));
    };

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Depends on", header)));
    let tree = deps::dependency_tree(&app.graph, &task.id);
    for entry in &tree {
        link_line(&mut lines, 3 + entry.level * 2, entry.task);
    }
    let missing: Vec<&str> = task
        .dependencies
        .iter()
        .filter(|d| app.graph.task(d).is_none())
        .map(|d| d.as_str())
        .collect();
    for id in &missing {
        lines.push(Line::from(Span::styled(
            format!("   ? {}  (not found)", id),
            dim,
        )));
    }
    if tree.is_empty() && missing.is_empty() {
        lines.push(Line::from(Span::styled("   none", dim)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Required by", header)));
    let dependents = deps::dependents(&app.graph, &task.id);
    for t in &dependents {
        link_line(&mut lines, 3, t);
    }
    if dependents.is_empty() {
        lines.push(Line::from(Span::styled("   none", dim)));
    }

    (lines, selected_line)
}
