use std::path::PathBuf;
use std::sync::Arc;

use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use crate::model::config::UiConfig;
use crate::model::plan::{Plan, PlanKind};
use crate::model::project::ProjectGraph;
use crate::model::task::{Priority, Task, TaskStatus};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

/// A graph rooted at `/tmp/demo` with the given tasks and one global plan.
pub fn graph_of(tasks: Vec<Task>) -> ProjectGraph {
    let plan = Plan {
        title: "Global Plan".into(),
        source_path: PathBuf::from("/tmp/demo/.ai/plans/PLAN.md"),
        content: "# Roadmap\n\nShip the dashboard.".into(),
        kind: PlanKind::Global,
    };
    ProjectGraph::new(
        PathBuf::from("/tmp/demo"),
        tasks,
        vec![plan],
        Vec::new(),
        Vec::new(),
    )
}

/// Four tasks: 1 done, 2 ready (needs 1), 3 blocked (needs 2), 4 in progress.
pub fn sample_tasks() -> Vec<Task> {
    let mut one = Task::new("1", "Set up repo")
        .with_status(TaskStatus::Completed)
        .with_priority(Priority::High);
    one.feature = "Core".into();
    one.created_at = "2025-01-01".into();

    let mut two = Task::new("2", "Write parser")
        .with_priority(Priority::Critical)
        .with_deps(["1"]);
    two.feature = "Core".into();
    two.created_at = "2025-01-02".into();
    two.description = Some("Parse the frontmatter.".into());
    two.details = vec!["Split on ---".into(), "Validate fields".into()];

    let mut three = Task::new("3", "Render table").with_deps(["2"]);
    three.feature = "UI".into();
    three.created_at = "2025-01-03".into();

    let mut four = Task::new("4", "Write docs")
        .with_status(TaskStatus::InProgress)
        .with_priority(Priority::Low);
    four.created_at = "2025-01-04".into();
    four.assigned_agent = Some("docs-bot".into());

    vec![one, two, three, four]
}

pub fn sample_graph() -> ProjectGraph {
    graph_of(sample_tasks())
}

pub fn sample_app() -> App {
    App::new(Arc::new(sample_graph()), &UiConfig::default())
}
