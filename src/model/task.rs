use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    #[serde(rename = "inprogress")]
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Pending,
        TaskStatus::InProgress,
        TaskStatus::Completed,
        TaskStatus::Failed,
    ];

    /// The keyword used in task frontmatter
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "inprogress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Parse a frontmatter keyword into a status
    pub fn parse(s: &str) -> Option<TaskStatus> {
        match s {
            "pending" => Some(TaskStatus::Pending),
            "inprogress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Critical,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Priority> {
        match s {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Sort rank, higher is more urgent (critical = 4 … low = 1)
    pub fn rank(self) -> u8 {
        match self {
            Priority::Critical => 4,
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A task identifier such as `3` or `2.1`.
///
/// Ids are kept in their textual form. Ordering compares dotted numeric
/// segments (`2.1 < 2.2 < 2.10 < 3`); ids that are not dotted numbers sort
/// after all numeric ids. Ties are broken by the raw text so that the order
/// stays consistent with equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric segments of a dotted id (`"2.1"` → `[2, 1]`), or `None`
    /// when any segment is not a plain number.
    pub fn segments(&self) -> Option<Vec<u64>> {
        self.0
            .split('.')
            .map(|seg| {
                if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    seg.parse::<u64>().ok()
                }
            })
            .collect()
    }
}

impl Ord for TaskId {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_number = match (self.segments(), other.segments()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_number.then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for TaskId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        TaskId(s.to_string())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        TaskId(s)
    }
}

/// A unit of work loaded from a `task<id>_<slug>.md` file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Free-text grouping label
    pub feature: String,
    /// Ids this task requires, in file order, without repeats
    pub dependencies: Vec<TaskId>,
    pub assigned_agent: Option<String>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub error_log: Option<String>,

    // --- Body sections ---
    pub description: Option<String>,
    /// Bullet items from the `## Details` section
    pub details: Vec<String>,
    pub test_strategy: Option<String>,
    pub agent_notes: Option<String>,
}

impl Task {
    /// Create a pending, medium-priority task with no metadata
    pub fn new(id: impl Into<TaskId>, title: impl Into<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            status: TaskStatus::Pending,
            priority: Priority::Medium,
            feature: String::new(),
            dependencies: Vec::new(),
            assigned_agent: None,
            created_at: String::new(),
            started_at: None,
            completed_at: None,
            error_log: None,
            description: None,
            details: Vec::new(),
            test_strategy: None,
            agent_notes: None,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deps<I, T>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `id` appears in this task's dependency list
    pub fn depends_on(&self, id: &TaskId) -> bool {
        self.dependencies.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<TaskId> {
        raw.iter().map(|s| TaskId::from(*s)).collect()
    }

    #[test]
    fn dotted_ids_sort_by_full_value() {
        let mut list = ids(&["10", "2.2", "1", "2.1"]);
        list.sort();
        assert_eq!(list, ids(&["1", "2.1", "2.2", "10"]));
    }

    #[test]
    fn subtask_numbers_compare_numerically() {
        let mut list = ids(&["2.10", "3", "2.9", "2"]);
        list.sort();
        assert_eq!(list, ids(&["2", "2.9", "2.10", "3"]));
    }

    #[test]
    fn non_numeric_ids_sort_last() {
        let mut list = ids(&["beta", "4", "alpha", "1.5"]);
        list.sort();
        assert_eq!(list, ids(&["1.5", "4", "alpha", "beta"]));
    }

    #[test]
    fn leading_zero_does_not_collide() {
        let a = TaskId::from("01");
        let b = TaskId::from("1");
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn status_keywords_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("blocked"), None);
        assert_eq!(TaskStatus::parse("in_progress"), None);
    }

    #[test]
    fn priority_rank_descends() {
        let ranks: Vec<u8> = Priority::ALL.iter().map(|p| p.rank()).collect();
        assert_eq!(ranks, vec![4, 3, 2, 1]);
    }
}
