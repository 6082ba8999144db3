use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::tui::app::{App, Mode};
use crate::util::unicode::pop_grapheme;

/// Search mode edits the query in place; the overview re-filters on every key.
pub(super) fn handle_search(app: &mut App, key: KeyEvent) {
    match (key.modifiers, key.code) {
        // Cancel: drop the query
        (_, KeyCode::Esc) => {
            app.set_search(String::new());
            app.mode = Mode::Navigate;
        }

        // Keep the query and go back to navigating the results
        (_, KeyCode::Enter) => {
            let trimmed = app.criteria.search.trim().to_string();
            if trimmed != app.criteria.search {
                app.set_search(trimmed);
            }
            app.mode = Mode::Navigate;
        }

        (_, KeyCode::Backspace) => {
            let mut query = app.criteria.search.clone();
            pop_grapheme(&mut query);
            app.set_search(query);
        }

        // Ctrl+U clears the line
        (m, KeyCode::Char('u')) if m.contains(KeyModifiers::CONTROL) => {
            app.set_search(String::new());
        }

        (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
            let mut query = app.criteria.search.clone();
            query.push(c);
            app.set_search(query);
        }

        _ => {}
    }
}
