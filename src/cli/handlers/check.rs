use std::path::Path;

use crate::cli::output::CheckJson;
use crate::ops::deps;

use super::load_graph;

/// Report load warnings, dependency cycles and dangling dependencies.
/// Problems are reported, never turned into a failing exit code.
pub fn cmd_check(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (graph, _) = load_graph(start)?;
    let dangling = deps::missing_dependencies(&graph);

    if json {
        let output = CheckJson {
            valid: graph.warnings().is_empty() && graph.cycles().is_empty() && dangling.is_empty(),
            warnings: graph.warnings(),
            cycles: graph.cycles(),
            dangling_deps: dangling,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let mut sections = 0;
    if !graph.warnings().is_empty() {
        println!("Warnings:");
        for warning in graph.warnings() {
            println!("  {}", warning);
        }
        sections += 1;
    }
    if !graph.cycles().is_empty() {
        if sections > 0 {
            println!();
        }
        println!("Cycles:");
        for cycle in graph.cycles() {
            println!("  {}", cycle);
        }
        sections += 1;
    }
    if !dangling.is_empty() {
        if sections > 0 {
            println!();
        }
        println!("Dangling dependencies:");
        for d in &dangling {
            println!("  {} depends on unknown task {}", d.task_id, d.dep_id);
        }
        sections += 1;
    }
    if sections == 0 {
        println!("✓ {} tasks, no problems found", graph.tasks().len());
    }
    Ok(())
}
