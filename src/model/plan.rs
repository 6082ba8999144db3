use std::path::PathBuf;

use serde::Serialize;

/// Where a plan document lives in the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanKind {
    /// `plans/PLAN.md`
    Global,
    /// Any markdown file under `plans/features/`
    Feature,
}

/// A read-only plan document. Plans have no relationship to tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub title: String,
    pub source_path: PathBuf,
    pub content: String,
    pub kind: PlanKind,
}
