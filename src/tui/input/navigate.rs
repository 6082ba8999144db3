use crossterm::event::{KeyCode, KeyEvent};

use crate::model::task::TaskStatus;
use crate::ops::view::StatusFilter;
use crate::tui::app::{App, Mode, View};

/// Lines moved by PageUp/PageDown in scrollable text
const PAGE: usize = 10;

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    // Keys that mean the same thing in every view
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') => {
            app.show_help = true;
            return;
        }
        KeyCode::Char('r') => {
            app.reload_requested = true;
            return;
        }
        KeyCode::Char('o') => {
            app.show_overview();
            return;
        }
        KeyCode::Char('p') => {
            app.show_plans();
            return;
        }
        KeyCode::Char('/') => {
            if app.view != View::Overview {
                app.show_overview();
            }
            app.mode = Mode::Search;
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            app.set_filter(filter_for_digit(c));
            if app.view != View::Overview {
                app.show_overview();
            }
            return;
        }
        KeyCode::Char('f') => {
            app.cycle_filter();
            if app.view != View::Overview {
                app.show_overview();
            }
            return;
        }
        KeyCode::Char('s') => {
            app.cycle_sort();
            if app.view != View::Overview {
                app.show_overview();
            }
            return;
        }
        _ => {}
    }

    match app.view {
        View::Overview => handle_overview(app, key),
        View::Detail(_) => handle_detail(app, key),
        View::Plans => handle_plans(app, key),
    }
}

/// 1 pending, 2 in progress, 3 completed, 4 failed, 5 all
fn filter_for_digit(c: char) -> StatusFilter {
    match c {
        '1' => StatusFilter::Only(TaskStatus::Pending),
        '2' => StatusFilter::Only(TaskStatus::InProgress),
        '3' => StatusFilter::Only(TaskStatus::Completed),
        '4' => StatusFilter::Only(TaskStatus::Failed),
        _ => StatusFilter::All,
    }
}

fn handle_overview(app: &mut App, key: KeyEvent) {
    let len = app.rows().rows.len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.overview.move_by(1, len),
        KeyCode::Char('k') | KeyCode::Up => app.overview.move_by(-1, len),
        KeyCode::PageDown => app.overview.move_by(PAGE as isize, len),
        KeyCode::PageUp => app.overview.move_by(-(PAGE as isize), len),
        KeyCode::Char('g') | KeyCode::Home => app.overview.cursor = 0,
        KeyCode::Char('G') | KeyCode::End => app.overview.to_bottom(len),
        KeyCode::Enter => {
            if let Some(id) = app.selected_task().map(|t| t.id.clone()) {
                app.open_detail(id);
            }
        }
        KeyCode::Esc => {
            if !app.criteria.search.is_empty() {
                app.set_search(String::new());
            }
        }
        _ => {}
    }
}

fn handle_detail(app: &mut App, key: KeyEvent) {
    let links = app.detail_links().len();
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            if links == 0 {
                app.detail.scroll += 1;
            } else {
                app.detail.move_by(1, links);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if links == 0 {
                app.detail.scroll = app.detail.scroll.saturating_sub(1);
            } else {
                app.detail.move_by(-1, links);
            }
        }
        KeyCode::PageDown => app.detail.scroll += PAGE,
        KeyCode::PageUp => app.detail.scroll = app.detail.scroll.saturating_sub(PAGE),
        KeyCode::Char('g') | KeyCode::Home => {
            app.detail.cursor = 0;
            app.detail.scroll = 0;
        }
        KeyCode::Char('G') | KeyCode::End => app.detail.to_bottom(links),
        KeyCode::Enter => {
            let target = app
                .detail_links()
                .get(app.detail.cursor)
                .map(|t| t.id.clone());
            if let Some(id) = target {
                app.open_detail(id);
            }
        }
        KeyCode::Esc | KeyCode::Backspace => app.back(),
        _ => {}
    }
}

fn handle_plans(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_plan(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_plan(-1),
        KeyCode::Char('g') | KeyCode::Home => app.move_plan(isize::MIN / 2),
        KeyCode::Char('G') | KeyCode::End => app.move_plan(isize::MAX / 2),
        KeyCode::PageDown | KeyCode::Char(' ') => app.plan_scroll += PAGE,
        KeyCode::PageUp => app.plan_scroll = app.plan_scroll.saturating_sub(PAGE),
        KeyCode::Esc | KeyCode::Backspace => app.back(),
        _ => {}
    }
}
