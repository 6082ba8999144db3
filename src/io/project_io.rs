use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::model::plan::{Plan, PlanKind};
use crate::model::project::{LoadWarning, ProjectGraph};
use crate::model::task::Task;
use crate::ops::cycles::detect_cycles;
use crate::parse::{ParseError, parse_plan, parse_task};

/// Directory that marks a project root
pub const MARKER_DIR: &str = ".ai";
pub const TASKS_DIR: &str = "tasks";
pub const PLANS_DIR: &str = "plans";
pub const FEATURES_DIR: &str = "features";
pub const GLOBAL_PLAN_FILE: &str = "PLAN.md";
/// Aggregate task index. Never parsed; only its change events matter.
pub const INDEX_FILE: &str = "TASKS.md";

static TASK_FILE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^task(\d+(?:\.\d+)*)_(.+)\.md$").ok());

/// Error type for project I/O operations
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    TaskParseError { path: PathBuf, source: ParseError },
    #[error("could not parse {path}: {source}")]
    ConfigParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Walk up from `start` (inclusive) looking for a directory that contains
/// the `.ai/` marker. Returns `None` when the filesystem root is reached.
pub fn discover_project(start: &Path) -> Option<PathBuf> {
    let mut current = std::path::absolute(start).unwrap_or_else(|_| start.to_path_buf());
    loop {
        if current.join(MARKER_DIR).is_dir() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// The id embedded in a task file name (`task2.1_cycle_check.md` → `2.1`),
/// or `None` when the name doesn't follow the convention.
pub fn task_file_id(file_name: &str) -> Option<&str> {
    TASK_FILE_RE
        .as_ref()?
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Locate the project at or above `start` and load it.
///
/// Finding no project is an ordinary outcome and yields an invalid, empty
/// graph. Errors are returned only when the project's directories exist
/// but cannot be traversed.
pub fn build_project(start: &Path) -> Result<ProjectGraph, ProjectError> {
    match discover_project(start) {
        Some(root) => load_project(&root),
        None => {
            debug!(start = %start.display(), "no project found");
            Ok(ProjectGraph::not_found(start))
        }
    }
}

/// Load every task and plan under `root/.ai/`.
///
/// Individual files that can't be read or parsed are skipped and recorded
/// as warnings on the returned graph.
pub fn load_project(root: &Path) -> Result<ProjectGraph, ProjectError> {
    let marker = root.join(MARKER_DIR);
    if !marker.is_dir() {
        return Ok(ProjectGraph::not_found(root));
    }

    let mut warnings = Vec::new();
    let tasks = load_tasks(&marker.join(TASKS_DIR), &mut warnings)?;
    let plans = load_plans(&marker.join(PLANS_DIR), &mut warnings);
    let cycles = detect_cycles(&tasks);

    for warning in &warnings {
        warn!("{}", warning);
    }
    for cycle in &cycles {
        warn!("{}", cycle);
    }
    debug!(
        root = %root.display(),
        tasks = tasks.len(),
        plans = plans.len(),
        warnings = warnings.len(),
        "project loaded"
    );

    Ok(ProjectGraph::new(
        root.to_path_buf(),
        tasks,
        plans,
        warnings,
        cycles,
    ))
}

/// Read and parse a single task file
pub fn load_task_file(path: &Path) -> Result<Task, ProjectError> {
    let text = fs::read_to_string(path).map_err(|e| ProjectError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_task(&text).map_err(|e| ProjectError::TaskParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load all conventionally named task files, ordered by id.
/// Files are visited in name order so that the first of two files
/// declaring the same id wins.
fn load_tasks(tasks_dir: &Path, warnings: &mut Vec<LoadWarning>) -> Result<Vec<Task>, ProjectError> {
    if !tasks_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut tasks: Vec<Task> = Vec::new();
    for path in markdown_files(tasks_dir, warnings)? {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if task_file_id(name).is_none() {
            warnings.push(LoadWarning::NonConventionalName { path });
            continue;
        }

        match load_task_file(&path) {
            Ok(task) => {
                if tasks.iter().any(|t| t.id == task.id) {
                    warnings.push(LoadWarning::DuplicateId { path, id: task.id });
                } else {
                    tasks.push(task);
                }
            }
            Err(ProjectError::TaskParseError { source, .. }) => {
                warnings.push(LoadWarning::SkippedTask {
                    path,
                    reason: source.to_string(),
                });
            }
            Err(e) => {
                warnings.push(LoadWarning::Unreadable {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(tasks)
}

/// The global plan (if any) followed by feature plans in file-name order
fn load_plans(plans_dir: &Path, warnings: &mut Vec<LoadWarning>) -> Vec<Plan> {
    let mut plans = Vec::new();
    if !plans_dir.is_dir() {
        return plans;
    }

    let global = plans_dir.join(GLOBAL_PLAN_FILE);
    if global.is_file()
        && let Some(plan) = read_plan(&global, PlanKind::Global, warnings)
    {
        plans.push(plan);
    }

    let features = plans_dir.join(FEATURES_DIR);
    if features.is_dir() {
        match markdown_files(&features, warnings) {
            Ok(paths) => {
                for path in paths {
                    if let Some(plan) = read_plan(&path, PlanKind::Feature, warnings) {
                        plans.push(plan);
                    }
                }
            }
            Err(e) => warnings.push(LoadWarning::Unreadable {
                path: features,
                reason: e.to_string(),
            }),
        }
    }

    plans
}

fn read_plan(path: &Path, kind: PlanKind, warnings: &mut Vec<LoadWarning>) -> Option<Plan> {
    match fs::read_to_string(path) {
        Ok(text) => Some(parse_plan(&text, path, kind)),
        Err(e) => {
            warnings.push(LoadWarning::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            None
        }
    }
}

/// `.md` files directly inside `dir`, sorted by name. Entries that can't be
/// inspected become warnings; failing to list the directory is an error.
fn markdown_files(dir: &Path, warnings: &mut Vec<LoadWarning>) -> Result<Vec<PathBuf>, ProjectError> {
    let entries = fs::read_dir(dir).map_err(|e| ProjectError::ReadError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warnings.push(LoadWarning::Unreadable {
                    path: dir.to_path_buf(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{TaskId, TaskStatus};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn task_doc(id: &str, status: &str, deps: &str) -> String {
        format!(
            "---\nid: {id}\ntitle: Task {id}\nstatus: {status}\npriority: medium\nfeature: Core\ndependencies: {deps}\ncreated_at: 2025-01-01\n---\n\n## Description\n\nDoes thing {id}.\n"
        )
    }

    fn make_project(root: &Path) -> PathBuf {
        let marker = root.join(MARKER_DIR);
        fs::create_dir_all(marker.join(TASKS_DIR)).unwrap();
        marker
    }

    fn write_task(marker: &Path, file: &str, body: &str) {
        fs::write(marker.join(TASKS_DIR).join(file), body).unwrap();
    }

    fn ids(graph: &ProjectGraph) -> Vec<String> {
        graph.tasks().iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn discover_walks_upward() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path());
        let nested = tmp.path().join("src/deep/er");
        fs::create_dir_all(&nested).unwrap();
        let root = discover_project(&nested).unwrap();
        assert_eq!(root.canonicalize().unwrap(), tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn discover_is_inclusive() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path());
        assert_eq!(discover_project(tmp.path()).as_deref(), Some(tmp.path()));
    }

    #[test]
    fn marker_must_be_a_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("not-a-project");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MARKER_DIR), "file, not dir").unwrap();
        // An ancestor of the temp dir may itself be a project; only check
        // that the file marker isn't accepted.
        assert_ne!(discover_project(&dir).as_deref(), Some(dir.as_path()));
    }

    #[test]
    fn task_file_names() {
        assert_eq!(task_file_id("task1_setup.md"), Some("1"));
        assert_eq!(task_file_id("task2.1_cycle_check.md"), Some("2.1"));
        assert_eq!(task_file_id("task_setup.md"), None);
        assert_eq!(task_file_id("task3.md"), None);
        assert_eq!(task_file_id("notes.md"), None);
        assert_eq!(task_file_id("task4_setup.txt"), None);
    }

    #[test]
    fn loads_and_sorts_tasks() {
        let tmp = TempDir::new().unwrap();
        let marker = make_project(tmp.path());
        write_task(&marker, "task10_ship.md", &task_doc("10", "pending", "[2.2]"));
        write_task(&marker, "task2.2_b.md", &task_doc("\"2.2\"", "pending", "[]"));
        write_task(&marker, "task2.1_a.md", &task_doc("\"2.1\"", "completed", "[]"));
        write_task(&marker, "task1_start.md", &task_doc("1", "completed", "[]"));

        let graph = load_project(tmp.path()).unwrap();
        assert!(graph.is_valid());
        assert_eq!(ids(&graph), vec!["1", "2.1", "2.2", "10"]);
        assert!(graph.warnings().is_empty());
        assert!(graph.cycles().is_empty());
        assert_eq!(
            graph.find("10").unwrap().dependencies,
            vec![TaskId::from("2.2")]
        );
    }

    #[test]
    fn empty_tasks_dir_is_valid() {
        let tmp = TempDir::new().unwrap();
        make_project(tmp.path());
        let graph = build_project(tmp.path()).unwrap();
        assert!(graph.is_valid());
        assert!(graph.tasks().is_empty());
    }

    #[test]
    fn marker_without_tasks_dir_is_valid() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(MARKER_DIR)).unwrap();
        let graph = load_project(tmp.path()).unwrap();
        assert!(graph.is_valid());
        assert!(graph.tasks().is_empty());
        assert!(graph.plans().is_empty());
    }

    #[test]
    fn invalid_status_is_skipped_with_warning() {
        let tmp = TempDir::new().unwrap();
        let marker = make_project(tmp.path());
        write_task(&marker, "task1_ok.md", &task_doc("1", "pending", "[]"));
        write_task(&marker, "task2_bad.md", &task_doc("2", "blocked", "[]"));
        write_task(&marker, "task3_ok.md", &task_doc("3", "completed", "[1]"));

        let graph = load_project(tmp.path()).unwrap();
        assert_eq!(ids(&graph), vec!["1", "3"]);
        assert_eq!(graph.warnings().len(), 1);
        match &graph.warnings()[0] {
            LoadWarning::SkippedTask { path, reason } => {
                assert!(path.ends_with("task2_bad.md"));
                assert!(reason.contains("blocked"));
            }
            other => panic!("unexpected warning {:?}", other),
        }
    }

    #[test]
    fn non_conventional_names_are_warned_and_ignored() {
        let tmp = TempDir::new().unwrap();
        let marker = make_project(tmp.path());
        write_task(&marker, "notes.md", &task_doc("1", "pending", "[]"));
        write_task(&marker, "README.txt", "not markdown");

        let graph = load_project(tmp.path()).unwrap();
        assert!(graph.tasks().is_empty());
        assert_eq!(graph.warnings().len(), 1);
        assert!(matches!(
            &graph.warnings()[0],
            LoadWarning::NonConventionalName { path } if path.ends_with("notes.md")
        ));
    }

    #[test]
    fn duplicate_ids_keep_first_file() {
        let tmp = TempDir::new().unwrap();
        let marker = make_project(tmp.path());
        write_task(&marker, "task1_a.md", &task_doc("1", "pending", "[]"));
        write_task(&marker, "task1_b.md", &task_doc("1", "completed", "[]"));

        let graph = load_project(tmp.path()).unwrap();
        assert_eq!(graph.tasks().len(), 1);
        assert_eq!(graph.tasks()[0].status, TaskStatus::Pending);
        assert!(matches!(
            &graph.warnings()[0],
            LoadWarning::DuplicateId { path, .. } if path.ends_with("task1_b.md")
        ));
    }

    #[test]
    fn cycles_are_reported_not_rejected() {
        let tmp = TempDir::new().unwrap();
        let marker = make_project(tmp.path());
        write_task(&marker, "task1_a.md", &task_doc("1", "pending", "[2]"));
        write_task(&marker, "task2_b.md", &task_doc("2", "pending", "[3]"));
        write_task(&marker, "task3_c.md", &task_doc("3", "pending", "[1]"));

        let graph = load_project(tmp.path()).unwrap();
        assert!(graph.is_valid());
        assert_eq!(graph.tasks().len(), 3);
        assert!(!graph.cycles().is_empty());
    }

    #[test]
    fn plans_are_collected() {
        let tmp = TempDir::new().unwrap();
        let marker = make_project(tmp.path());
        let features = marker.join(PLANS_DIR).join(FEATURES_DIR);
        fs::create_dir_all(&features).unwrap();
        fs::write(marker.join(PLANS_DIR).join(GLOBAL_PLAN_FILE), "# Plan\n").unwrap();
        fs::write(features.join("zeta_feature.md"), "z").unwrap();
        fs::write(features.join("alpha_feature.md"), "a").unwrap();
        fs::write(features.join("sketch.txt"), "ignored").unwrap();

        let graph = load_project(tmp.path()).unwrap();
        let titles: Vec<&str> = graph.plans().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Global Plan", "alpha feature", "zeta feature"]);
        assert_eq!(graph.plans()[0].kind, PlanKind::Global);
        assert_eq!(graph.plans()[1].content, "a");
    }

    #[test]
    fn no_project_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let graph = load_project(tmp.path()).unwrap();
        assert!(!graph.is_valid());
        assert!(graph.tasks().is_empty());
    }

    #[test]
    fn single_file_errors_are_fatal_for_direct_loads() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("task9_gone.md");
        assert!(matches!(
            load_task_file(&missing),
            Err(ProjectError::ReadError { .. })
        ));

        let bad = tmp.path().join("task8_bad.md");
        fs::write(&bad, "no frontmatter").unwrap();
        assert!(matches!(
            load_task_file(&bad),
            Err(ProjectError::TaskParseError {
                source: ParseError::MissingFrontmatter,
                ..
            })
        ));
    }
}
