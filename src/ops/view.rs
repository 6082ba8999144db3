use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::model::project::ProjectGraph;
use crate::model::task::{Priority, Task, TaskStatus};

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Which statuses a view keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    /// Parse `all` or a status keyword
    pub fn parse(s: &str) -> Option<StatusFilter> {
        match s {
            "all" => Some(StatusFilter::All),
            other => TaskStatus::parse(other).map(StatusFilter::Only),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    pub fn matches(self, status: TaskStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => wanted == status,
        }
    }

    /// all → pending → inprogress → completed → failed → all
    pub fn next(self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Only(TaskStatus::Pending),
            StatusFilter::Only(TaskStatus::Pending) => StatusFilter::Only(TaskStatus::InProgress),
            StatusFilter::Only(TaskStatus::InProgress) => StatusFilter::Only(TaskStatus::Completed),
            StatusFilter::Only(TaskStatus::Completed) => StatusFilter::Only(TaskStatus::Failed),
            StatusFilter::Only(TaskStatus::Failed) => StatusFilter::All,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Row ordering for a view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Most urgent first
    #[default]
    Priority,
    /// Ascending dotted-numeric id
    Id,
    Status,
    Title,
}

impl SortKey {
    pub fn parse(s: &str) -> Option<SortKey> {
        match s {
            "priority" => Some(SortKey::Priority),
            "id" => Some(SortKey::Id),
            "status" => Some(SortKey::Status),
            "title" => Some(SortKey::Title),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Priority => "priority",
            SortKey::Id => "id",
            SortKey::Status => "status",
            SortKey::Title => "title",
        }
    }

    /// priority → id → status → title → priority
    pub fn next(self) -> SortKey {
        match self {
            SortKey::Priority => SortKey::Id,
            SortKey::Id => SortKey::Status,
            SortKey::Status => SortKey::Title,
            SortKey::Title => SortKey::Priority,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Filter, search and sort parameters for [`project`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCriteria {
    pub status: StatusFilter,
    /// Case-insensitive substring; blank means no search
    pub search: String,
    pub sort: SortKey,
}

// ---------------------------------------------------------------------------
// Availability
// ---------------------------------------------------------------------------

/// Whether a task can be picked up now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// Pending, and every known dependency is completed
    Available,
    /// Pending, with at least one known dependency not completed
    Blocked,
    /// Not pending
    NotPending,
}

/// Classify a task against the graph it belongs to. Dependencies that
/// don't resolve to a task count as satisfied.
pub fn availability(graph: &ProjectGraph, task: &Task) -> Availability {
    if task.status != TaskStatus::Pending {
        return Availability::NotPending;
    }
    let waiting = task.dependencies.iter().any(|dep| {
        graph
            .task(dep)
            .is_some_and(|d| d.status != TaskStatus::Completed)
    });
    if waiting {
        Availability::Blocked
    } else {
        Availability::Available
    }
}

/// Available tasks in graph order
pub fn available_tasks(graph: &ProjectGraph) -> Vec<&Task> {
    graph
        .tasks()
        .iter()
        .filter(|t| availability(graph, t) == Availability::Available)
        .collect()
}

/// Blocked tasks in graph order
pub fn blocked_tasks(graph: &ProjectGraph) -> Vec<&Task> {
    graph
        .tasks()
        .iter()
        .filter(|t| availability(graph, t) == Availability::Blocked)
        .collect()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    #[serde(rename = "inprogress")]
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Coarse project health derived from progress and blocked work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
}

impl Health {
    pub fn label(self) -> &'static str {
        match self {
            Health::Excellent => "Excellent",
            Health::Good => "Good",
            Health::Fair => "Fair",
            Health::NeedsAttention => "Needs Attention",
        }
    }
}

/// Whole-project statistics (independent of filters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub by_status: StatusCounts,
    pub by_priority: PriorityCounts,
    pub available: usize,
    pub blocked: usize,
    /// round(100 × completed / total), 0 for an empty project
    pub completion_percent: u8,
}

impl Summary {
    pub fn health(&self) -> Health {
        let pct = self.completion_percent;
        let blocked = self.blocked;
        if pct >= 80 && blocked == 0 {
            Health::Excellent
        } else if pct >= 60 && blocked <= 2 {
            Health::Good
        } else if pct >= 40 && blocked <= 5 {
            Health::Fair
        } else {
            Health::NeedsAttention
        }
    }
}

/// Count tasks by status and priority and compute progress
pub fn summarize(graph: &ProjectGraph) -> Summary {
    let mut summary = Summary {
        total: graph.tasks().len(),
        ..Summary::default()
    };

    for task in graph.tasks() {
        match task.status {
            TaskStatus::Pending => summary.by_status.pending += 1,
            TaskStatus::InProgress => summary.by_status.in_progress += 1,
            TaskStatus::Completed => summary.by_status.completed += 1,
            TaskStatus::Failed => summary.by_status.failed += 1,
        }
        match task.priority {
            Priority::Critical => summary.by_priority.critical += 1,
            Priority::High => summary.by_priority.high += 1,
            Priority::Medium => summary.by_priority.medium += 1,
            Priority::Low => summary.by_priority.low += 1,
        }
        match availability(graph, task) {
            Availability::Available => summary.available += 1,
            Availability::Blocked => summary.blocked += 1,
            Availability::NotPending => {}
        }
    }

    if summary.total > 0 {
        let ratio = summary.by_status.completed as f64 / summary.total as f64;
        summary.completion_percent = (ratio * 100.0).round() as u8;
    }
    summary
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// One displayable row
#[derive(Debug, Clone, Copy)]
pub struct TaskRow<'a> {
    pub task: &'a Task,
    pub availability: Availability,
}

/// The ordered task list for a set of criteria plus project statistics
#[derive(Debug, Clone)]
pub struct ViewResult<'a> {
    pub rows: Vec<TaskRow<'a>>,
    pub summary: Summary,
}

/// Filter, search and sort the graph's tasks.
///
/// Pure and deterministic: the sort is stable over the graph's id order, so
/// equal keys keep ascending id order.
pub fn project<'a>(graph: &'a ProjectGraph, criteria: &ViewCriteria) -> ViewResult<'a> {
    let searching = !criteria.search.trim().is_empty();
    let query = criteria.search.to_lowercase();

    let mut rows: Vec<TaskRow<'a>> = graph
        .tasks()
        .iter()
        .filter(|task| criteria.status.matches(task.status))
        .filter(|task| !searching || matches_query(task, &query))
        .map(|task| TaskRow {
            task,
            availability: availability(graph, task),
        })
        .collect();

    rows.sort_by(|a, b| compare(a.task, b.task, criteria.sort));

    ViewResult {
        rows,
        summary: summarize(graph),
    }
}

/// `query` must already be lowercased
fn matches_query(task: &Task, query: &str) -> bool {
    task.title.to_lowercase().contains(query)
        || task
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(query))
        || task.id.as_str().to_lowercase().contains(query)
}

fn compare(a: &Task, b: &Task, key: SortKey) -> Ordering {
    match key {
        SortKey::Priority => b.priority.rank().cmp(&a.priority.rank()),
        SortKey::Id => a.id.cmp(&b.id),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        SortKey::Title => a.title.cmp(&b.title),
    }
}
