use std::collections::HashMap;

use crate::model::project::CycleReport;
use crate::model::task::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the current dependency path
    InProgress,
    Done,
}

/// Find dependency cycles with a depth-first walk over the `dependencies`
/// relation.
///
/// Every edge that reaches a task still on the current path is reported as
/// `from -> to`. Each task is finished at most once, so the walk is
/// O(tasks + edges) and terminates on self references and repeated ids.
/// Dependencies on ids that don't exist are not edges. An empty result
/// means the relation is acyclic.
pub fn detect_cycles(tasks: &[Task]) -> Vec<CycleReport> {
    let mut by_id: HashMap<&TaskId, &Task> = HashMap::with_capacity(tasks.len());
    for task in tasks {
        by_id.entry(&task.id).or_insert(task);
    }

    let mut marks: HashMap<&TaskId, Mark> = HashMap::with_capacity(tasks.len());
    let mut reports = Vec::new();

    for root in tasks {
        if marks.contains_key(&root.id) {
            continue;
        }
        marks.insert(&root.id, Mark::InProgress);
        let mut stack: Vec<(&Task, usize)> = vec![(root, 0)];

        while let Some(frame) = stack.last_mut() {
            let current = frame.0;
            let next = current.dependencies.get(frame.1);
            frame.1 += 1;

            let Some(dep) = next else {
                marks.insert(&current.id, Mark::Done);
                stack.pop();
                continue;
            };

            match marks.get(dep) {
                Some(Mark::InProgress) => reports.push(CycleReport {
                    from: current.id.clone(),
                    to: dep.clone(),
                }),
                Some(Mark::Done) => {}
                None => match by_id.get(dep) {
                    Some(&dep_task) => {
                        marks.insert(&dep_task.id, Mark::InProgress);
                        stack.push((dep_task, 0));
                    }
                    None => {
                        marks.insert(dep, Mark::Done);
                    }
                },
            }
        }
    }

    reports
}
