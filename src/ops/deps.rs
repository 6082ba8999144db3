use std::collections::HashSet;

use serde::Serialize;

use crate::model::project::ProjectGraph;
use crate::model::task::{Task, TaskId};

/// A transitive dependency with its distance from the root task
/// (0 = direct dependency)
#[derive(Debug, Clone, Copy)]
pub struct DepEntry<'a> {
    pub level: usize,
    pub task: &'a Task,
}

/// Walk the dependencies of `id` breadth-first.
///
/// Each task appears once, at the shallowest level it is reachable from,
/// so cycles terminate. Unknown ids are skipped. Entries are ordered by
/// level, then by id.
pub fn dependency_tree<'a>(graph: &'a ProjectGraph, id: &TaskId) -> Vec<DepEntry<'a>> {
    let Some(root) = graph.task(id) else {
        return Vec::new();
    };

    let mut seen: HashSet<&TaskId> = HashSet::new();
    seen.insert(&root.id);
    let mut entries = Vec::new();
    let mut frontier: Vec<&Task> = vec![root];
    let mut level = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for task in frontier {
            for dep_id in &task.dependencies {
                if let Some(dep) = graph.task(dep_id)
                    && seen.insert(&dep.id)
                {
                    entries.push(DepEntry { level, task: dep });
                    next.push(dep);
                }
            }
        }
        frontier = next;
        level += 1;
    }

    entries.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.task.id.cmp(&b.task.id)));
    entries
}

/// Tasks that list `id` among their dependencies, in graph order
pub fn dependents<'a>(graph: &'a ProjectGraph, id: &TaskId) -> Vec<&'a Task> {
    graph.tasks().iter().filter(|t| t.depends_on(id)).collect()
}

/// A dependency reference that doesn't resolve to any loaded task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingDep {
    pub task_id: TaskId,
    pub dep_id: TaskId,
}

/// Every dependency reference in the graph that points at a missing task.
/// These count as satisfied for availability; they are only reported.
pub fn missing_dependencies(graph: &ProjectGraph) -> Vec<DanglingDep> {
    graph
        .tasks()
        .iter()
        .flat_map(|task| {
            task.dependencies
                .iter()
                .filter(|dep| graph.task(dep).is_none())
                .map(|dep| DanglingDep {
                    task_id: task.id.clone(),
                    dep_id: dep.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn graph(tasks: Vec<Task>) -> ProjectGraph {
        ProjectGraph::new(PathBuf::from("/p"), tasks, Vec::new(), Vec::new(), Vec::new())
    }

    fn task(id: &str, deps: &[&str]) -> Task {
        Task::new(id, format!("Task {}", id)).with_deps(deps.iter().copied())
    }

    fn levels(entries: &[DepEntry]) -> Vec<(usize, String)> {
        entries
            .iter()
            .map(|e| (e.level, e.task.id.to_string()))
            .collect()
    }

    #[test]
    fn tree_lists_transitive_deps_by_level() {
        let g = graph(vec![
            task("1", &[]),
            task("2", &["1"]),
            task("3", &["1"]),
            task("4", &["3", "2"]),
        ]);
        let tree = dependency_tree(&g, &"4".into());
        assert_eq!(
            levels(&tree),
            vec![(0, "2".into()), (0, "3".into()), (1, "1".into())]
        );
    }

    #[test]
    fn tree_terminates_on_cycles() {
        let g = graph(vec![task("1", &["2"]), task("2", &["3"]), task("3", &["1"])]);
        let tree = dependency_tree(&g, &"1".into());
        assert_eq!(levels(&tree), vec![(0, "2".into()), (1, "3".into())]);
    }

    #[test]
    fn tree_of_unknown_task_is_empty() {
        let g = graph(vec![task("1", &[])]);
        assert!(dependency_tree(&g, &"7".into()).is_empty());
    }

    #[test]
    fn dependents_are_reverse_edges() {
        let g = graph(vec![task("1", &[]), task("2", &["1"]), task("3", &["2", "1"])]);
        let ids: Vec<String> = dependents(&g, &"1".into())
            .iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["2", "3"]);
        assert!(dependents(&g, &"3".into()).is_empty());
    }

    #[test]
    fn dangling_references_are_listed() {
        let g = graph(vec![task("1", &["9"]), task("2", &["1", "8"])]);
        assert_eq!(
            missing_dependencies(&g),
            vec![
                DanglingDep {
                    task_id: "1".into(),
                    dep_id: "9".into()
                },
                DanglingDep {
                    task_id: "2".into(),
                    dep_id: "8".into()
                },
            ]
        );
    }
}
