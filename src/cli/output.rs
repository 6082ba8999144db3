use serde::Serialize;

use crate::model::project::{CycleReport, LoadWarning, ProjectGraph};
use crate::model::task::{Priority, Task, TaskId, TaskStatus};
use crate::ops::deps::{self, DanglingDep, DepEntry};
use crate::ops::view::{self, Availability, Health, Summary, TaskRow};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskRowJson<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub availability: Availability,
}

#[derive(Serialize)]
pub struct TaskListJson<'a> {
    pub filter: &'static str,
    pub sort: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub search: &'a str,
    pub tasks: Vec<TaskRowJson<'a>>,
}

#[derive(Serialize)]
pub struct TaskBriefJson<'a> {
    pub id: &'a TaskId,
    pub title: &'a str,
    pub status: TaskStatus,
    pub priority: Priority,
}

#[derive(Serialize)]
pub struct StatsJson<'a> {
    #[serde(flatten)]
    pub summary: Summary,
    pub health: Health,
    pub next_available: Vec<TaskBriefJson<'a>>,
}

#[derive(Serialize)]
pub struct DepEntryJson<'a> {
    pub level: usize,
    #[serde(flatten)]
    pub task: TaskBriefJson<'a>,
}

#[derive(Serialize)]
pub struct ShowJson<'a> {
    pub task: &'a Task,
    pub availability: Availability,
    pub dependency_tree: Vec<DepEntryJson<'a>>,
    pub dependents: Vec<TaskBriefJson<'a>>,
}

#[derive(Serialize)]
pub struct CheckJson<'a> {
    pub valid: bool,
    pub warnings: &'a [LoadWarning],
    pub cycles: &'a [CycleReport],
    pub dangling_deps: Vec<DanglingDep>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn row_to_json<'a>(row: &TaskRow<'a>) -> TaskRowJson<'a> {
    TaskRowJson {
        task: row.task,
        availability: row.availability,
    }
}

pub fn task_brief(task: &Task) -> TaskBriefJson<'_> {
    TaskBriefJson {
        id: &task.id,
        title: &task.title,
        status: task.status,
        priority: task.priority,
    }
}

pub fn show_to_json<'a>(graph: &'a ProjectGraph, task: &'a Task) -> ShowJson<'a> {
    ShowJson {
        task,
        availability: view::availability(graph, task),
        dependency_tree: deps::dependency_tree(graph, &task.id)
            .into_iter()
            .map(|e| DepEntryJson {
                level: e.level,
                task: task_brief(e.task),
            })
            .collect(),
        dependents: deps::dependents(graph, &task.id)
            .into_iter()
            .map(task_brief)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Checkbox-style marker for a status
pub fn status_marker(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "[ ]",
        TaskStatus::InProgress => "[>]",
        TaskStatus::Completed => "[x]",
        TaskStatus::Failed => "[!]",
    }
}

/// Format a single task as a one-line summary
pub fn format_task_line(task: &Task, availability: Availability) -> String {
    let suffix = match availability {
        Availability::Blocked => "  (blocked)",
        _ => "",
    };
    format!(
        "{} {:<6} {:<8} {}{}",
        status_marker(task.status),
        task.id,
        task.priority,
        task.title,
        suffix
    )
}

/// Format the overall statistics block
pub fn format_summary(summary: &Summary) -> Vec<String> {
    vec![
        format!(
            "tasks: {}  pending: {}  in progress: {}  completed: {}  failed: {}",
            summary.total,
            summary.by_status.pending,
            summary.by_status.in_progress,
            summary.by_status.completed,
            summary.by_status.failed
        ),
        format!(
            "priority: {} critical, {} high, {} medium, {} low",
            summary.by_priority.critical,
            summary.by_priority.high,
            summary.by_priority.medium,
            summary.by_priority.low
        ),
        format!(
            "available: {}  blocked: {}",
            summary.available, summary.blocked
        ),
        format!(
            "progress: {}%  health: {}",
            summary.completion_percent,
            summary.health().label()
        ),
    ]
}

fn format_dep_entry(entry: &DepEntry) -> String {
    format!(
        "{}{} {} {}",
        "  ".repeat(entry.level + 1),
        status_marker(entry.task.status),
        entry.task.id,
        entry.task.title
    )
}

/// Format detailed task view
pub fn format_task_detail(graph: &ProjectGraph, task: &Task) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} {}",
        status_marker(task.status),
        task.id,
        task.title
    )];

    lines.push(format!("status: {}", task.status));
    lines.push(format!("priority: {}", task.priority));
    if !task.feature.is_empty() {
        lines.push(format!("feature: {}", task.feature));
    }
    lines.push(format!("created: {}", task.created_at));
    let optional = [
        ("agent", &task.assigned_agent),
        ("started", &task.started_at),
        ("completed", &task.completed_at),
        ("error", &task.error_log),
    ];
    for (label, value) in optional {
        if let Some(v) = value {
            lines.push(format!("{}: {}", label, v));
        }
    }
    if view::availability(graph, task) == Availability::Blocked {
        lines.push("blocked: waiting on dependencies".to_string());
    }

    if let Some(desc) = &task.description {
        lines.push(String::new());
        lines.push("description:".to_string());
        lines.extend(desc.lines().map(|l| format!("  {}", l)));
    }
    if !task.details.is_empty() {
        lines.push(String::new());
        lines.push("details:".to_string());
        for item in &task.details {
            let mut item_lines = item.lines();
            if let Some(first) = item_lines.next() {
                lines.push(format!("  - {}", first));
            }
            lines.extend(item_lines.map(|l| format!("    {}", l)));
        }
    }
    for (label, section) in [
        ("test strategy", &task.test_strategy),
        ("agent notes", &task.agent_notes),
    ] {
        if let Some(text) = section {
            lines.push(String::new());
            lines.push(format!("{}:", label));
            lines.extend(text.lines().map(|l| format!("  {}", l)));
        }
    }

    let tree = deps::dependency_tree(graph, &task.id);
    if !tree.is_empty() {
        lines.push(String::new());
        lines.push("depends on:".to_string());
        lines.extend(tree.iter().map(format_dep_entry));
    }
    let missing: Vec<&TaskId> = task
        .dependencies
        .iter()
        .filter(|d| graph.task(d).is_none())
        .collect();
    if !missing.is_empty() {
        lines.push(format!(
            "unknown deps: {}",
            missing
                .iter()
                .map(|d| d.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let dependents = deps::dependents(graph, &task.id);
    if !dependents.is_empty() {
        lines.push(String::new());
        lines.push("required by:".to_string());
        for t in dependents {
            lines.push(format!("  {} {} {}", status_marker(t.status), t.id, t.title));
        }
    }

    lines
}
