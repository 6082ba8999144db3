use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::io::project_io::{MARKER_DIR, PLANS_DIR};
use crate::model::plan::PlanKind;
use crate::tui::app::App;
use crate::util::unicode::fit_to_width;

const LIST_W: u16 = 30;

/// Render the plans view: plan list on the left, selected plan on the right
pub fn render_plans_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let bg = app.theme.background;
    if app.graph.plans().is_empty() {
        let msg = format!(" No plans. Add markdown files under {}/{}/", MARKER_DIR, PLANS_DIR);
        frame.render_widget(
            Paragraph::new(msg).style(Style::default().fg(app.theme.dim).bg(bg)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(LIST_W), Constraint::Min(1)])
        .split(area);

    app.plans.clamp(app.graph.plans().len());
    app.plans.scroll_into_view(chunks[0].height as usize);
    render_plan_list(frame, app, chunks[0]);
    render_plan_content(frame, app, chunks[1]);
}

fn render_plan_list(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let inner_w = area.width.saturating_sub(1) as usize;
    let start = app.plans.scroll;
    let lines: Vec<Line> = app
        .graph
        .plans()
        .iter()
        .enumerate()
        .skip(start)
        .take(area.height as usize)
        .map(|(i, plan)| {
            let selected = i == app.plans.cursor;
            let bg = if selected {
                theme.selection_bg
            } else {
                theme.background
            };
            let marker = match plan.kind {
                PlanKind::Global => "\u{25C6} ",
                PlanKind::Feature => "  ",
            };
            let mut style = Style::default().fg(theme.text).bg(bg);
            if selected {
                style = style.fg(theme.text_bright).add_modifier(Modifier::BOLD);
            }
            Line::from(vec![
                Span::styled(
                    if selected { "\u{258E}" } else { " " },
                    Style::default().fg(theme.highlight).bg(bg),
                ),
                Span::styled(marker, Style::default().fg(theme.purple).bg(bg)),
                Span::styled(fit_to_width(&plan.title, inner_w.saturating_sub(3)), style),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(theme.dim).bg(theme.background));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .style(Style::default().bg(theme.background)),
        area,
    );
}

fn render_plan_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let Some(plan) = app.graph.plans().get(app.plans.cursor) else {
        return;
    };

    let header = Style::default()
        .fg(theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let text = Style::default().fg(theme.text).bg(bg);
    let dim = Style::default().fg(theme.dim).bg(bg);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(format!(" {}", plan.title), header)),
        Line::from(Span::styled(
            format!(" {}", plan.source_path.display()),
            dim,
        )),
        Line::from(""),
    ];
    for l in plan.content.lines() {
        // Markdown headings stand out; everything else is shown as-is
        let style = if l.starts_with('#') { header } else { text };
        lines.push(Line::from(Span::styled(format!(" {}", l), style)));
    }

    let max_scroll = lines.len().saturating_sub(area.height as usize);
    let scroll = app.plan_scroll.min(max_scroll);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().bg(bg))
            .scroll((scroll as u16, 0)),
        area,
    );
    app.plan_scroll = scroll;
}
