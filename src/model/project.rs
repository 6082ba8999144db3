use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::plan::Plan;
use super::task::{Task, TaskId};

/// A non-fatal problem found while loading a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadWarning {
    /// A task file failed to parse and was skipped
    SkippedTask { path: PathBuf, reason: String },
    /// A markdown file in the tasks directory doesn't follow `task<id>_<slug>.md`
    NonConventionalName { path: PathBuf },
    /// A file or directory could not be read
    Unreadable { path: PathBuf, reason: String },
    /// A second file declared an id that was already loaded
    DuplicateId { path: PathBuf, id: TaskId },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::SkippedTask { path, reason } => {
                write!(f, "skipped {}: {}", path.display(), reason)
            }
            LoadWarning::NonConventionalName { path } => {
                write!(f, "ignored {}: not named task<id>_<slug>.md", path.display())
            }
            LoadWarning::Unreadable { path, reason } => {
                write!(f, "could not read {}: {}", path.display(), reason)
            }
            LoadWarning::DuplicateId { path, id } => {
                write!(f, "skipped {}: task id {} is already defined", path.display(), id)
            }
        }
    }
}

/// One back edge found by cycle detection: `from` depends on `to`, and `to`
/// is already on the current dependency path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub from: TaskId,
    pub to: TaskId,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Circular dependency detected: Task {} -> Task {}",
            self.from, self.to
        )
    }
}

/// An immutable snapshot of a loaded project.
///
/// Snapshots are never edited: every reload produces a new graph that
/// replaces the previous one wholesale. Dependencies are stored as ids and
/// resolved through [`ProjectGraph::task`] at query time.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    root: PathBuf,
    valid: bool,
    tasks: Vec<Task>,
    plans: Vec<Plan>,
    warnings: Vec<LoadWarning>,
    cycles: Vec<CycleReport>,
    index: HashMap<TaskId, usize>,
}

impl ProjectGraph {
    /// Assemble a valid graph. Tasks are expected to have unique ids; on a
    /// repeat the first occurrence stays addressable by id.
    pub fn new(
        root: PathBuf,
        tasks: Vec<Task>,
        plans: Vec<Plan>,
        warnings: Vec<LoadWarning>,
        cycles: Vec<CycleReport>,
    ) -> Self {
        let mut index = HashMap::with_capacity(tasks.len());
        for (i, task) in tasks.iter().enumerate() {
            index.entry(task.id.clone()).or_insert(i);
        }
        ProjectGraph {
            root,
            valid: true,
            tasks,
            plans,
            warnings,
            cycles,
            index,
        }
    }

    /// The "no project here" result: invalid and empty
    pub fn not_found(start: &Path) -> Self {
        ProjectGraph {
            root: start.to_path_buf(),
            valid: false,
            tasks: Vec::new(),
            plans: Vec::new(),
            warnings: Vec::new(),
            cycles: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Project root (the directory containing the marker), or the start
    /// path when no project was found
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Tasks ordered by id
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    pub fn cycles(&self) -> &[CycleReport] {
        &self.cycles
    }

    /// Look up a task by id
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    /// Look up a task by its textual id
    pub fn find(&self, id: &str) -> Option<&Task> {
        self.task(&TaskId::from(id))
    }
}
