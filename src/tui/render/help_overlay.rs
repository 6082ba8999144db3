use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, View};

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Center the overlay, leaving some margin
    let overlay_area = centered_rect(60, 80, area);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(" Key Bindings", header_style)));
    lines.push(Line::from(""));

    // Context-sensitive help
    match &app.view {
        View::Overview => {
            lines.push(Line::from(Span::styled(" Overview", header_style)));
            add_binding(&mut lines, " \u{2191}\u{2193}/jk", "Move cursor", key_style, desc_style);
            add_binding(&mut lines, " g/G", "Jump to top/bottom", key_style, desc_style);
            add_binding(&mut lines, " Enter", "Open task detail", key_style, desc_style);
            add_binding(&mut lines, " 1-5", "Filter by status (5 = all)", key_style, desc_style);
            add_binding(&mut lines, " f", "Cycle status filter", key_style, desc_style);
            add_binding(&mut lines, " s", "Cycle sort order", key_style, desc_style);
            add_binding(&mut lines, " /", "Search titles and ids", key_style, desc_style);
            add_binding(&mut lines, " Esc", "Clear search", key_style, desc_style);
        }
        View::Detail(_) => {
            lines.push(Line::from(Span::styled(" Task Detail", header_style)));
            add_binding(&mut lines, " \u{2191}\u{2193}/jk", "Select linked task", key_style, desc_style);
            add_binding(&mut lines, " Enter", "Open linked task", key_style, desc_style);
            add_binding(&mut lines, " Esc/Bksp", "Back to previous task", key_style, desc_style);
        }
        View::Plans => {
            lines.push(Line::from(Span::styled(" Plans", header_style)));
            add_binding(&mut lines, " \u{2191}\u{2193}/jk", "Select plan", key_style, desc_style);
            add_binding(&mut lines, " PgUp/PgDn", "Scroll plan", key_style, desc_style);
            add_binding(&mut lines, " Esc", "Back to overview", key_style, desc_style);
        }
    }
    lines.push(Line::from(""));

    // Global keys
    lines.push(Line::from(Span::styled(" Global", header_style)));
    add_binding(&mut lines, " o", "Overview", key_style, desc_style);
    add_binding(&mut lines, " p", "Plans", key_style, desc_style);
    add_binding(&mut lines, " r", "Reload project", key_style, desc_style);
    add_binding(&mut lines, " ?", "Toggle this help", key_style, desc_style);
    add_binding(&mut lines, " q/Ctrl+C", "Quit", key_style, desc_style);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.dim).bg(bg))
        .style(Style::default().bg(bg));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(bg));

    frame.render_widget(paragraph, overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let key_width = 14;
    let padded_key = format!("{:<width$}", key, width = key_width);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
