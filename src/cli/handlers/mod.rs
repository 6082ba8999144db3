mod check;
pub use check::cmd_check;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::project_io::{self, MARKER_DIR};
use crate::model::config::{Config, UiConfig};
use crate::model::project::ProjectGraph;
use crate::model::task::TaskStatus;
use crate::ops::view::{self, SortKey, StatusFilter, ViewCriteria};
use crate::parse::serialize_task;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run a subcommand. The dashboard (no subcommand) is launched from main.rs.
pub fn dispatch(command: Commands, cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let start = resolve_start(cli.project_dir.as_deref())?;

    match command {
        Commands::List(args) => cmd_list(&start, args, json),
        Commands::Stats => cmd_stats(&start, json),
        Commands::Show(args) => cmd_show(&start, args, json),
        Commands::Check => cmd_check(&start, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Directory to start project discovery from: the -C override or the cwd
pub fn resolve_start(project_dir: Option<&str>) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match project_dir {
        Some(dir) => Ok(std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?),
        None => Ok(std::env::current_dir()?),
    }
}

/// Load the project at or above `start`, failing when there is none
pub fn load_graph(start: &Path) -> Result<(ProjectGraph, Config), Box<dyn std::error::Error>> {
    let graph = project_io::build_project(start)?;
    if !graph.is_valid() {
        return Err(format!(
            "no {}/ project found at or above {}",
            MARKER_DIR,
            start.display()
        )
        .into());
    }
    let config = config_io::read_config(graph.root())?;
    debug!(root = %graph.root().display(), tasks = graph.tasks().len(), "loaded project");
    Ok((graph, config))
}

/// Build view criteria from optional overrides, falling back to config
pub fn criteria_from(
    ui: &UiConfig,
    filter: Option<&str>,
    sort: Option<&str>,
    search: Option<&str>,
) -> Result<ViewCriteria, String> {
    let filter_text = filter.unwrap_or(&ui.default_filter);
    let status = StatusFilter::parse(filter_text).ok_or_else(|| {
        format!(
            "unknown filter '{}' (expected: all, pending, inprogress, completed, failed)",
            filter_text
        )
    })?;
    let sort_text = sort.unwrap_or(&ui.default_sort);
    let sort = SortKey::parse(sort_text).ok_or_else(|| {
        format!(
            "unknown sort '{}' (expected: priority, id, status, title)",
            sort_text
        )
    })?;
    Ok(ViewCriteria {
        status,
        search: search.unwrap_or_default().to_string(),
        sort,
    })
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(start: &Path, args: ListArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (graph, config) = load_graph(start)?;
    let criteria = criteria_from(
        &config.ui,
        args.filter.as_deref(),
        args.sort.as_deref(),
        args.search.as_deref(),
    )?;
    let result = view::project(&graph, &criteria);

    if json {
        let output = TaskListJson {
            filter: criteria.status.as_str(),
            sort: criteria.sort.as_str(),
            search: &criteria.search,
            tasks: result.rows.iter().map(row_to_json).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for row in &result.rows {
            println!("{}", format_task_line(row.task, row.availability));
        }
    }
    Ok(())
}

fn cmd_stats(start: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (graph, _) = load_graph(start)?;
    let summary = view::summarize(&graph);

    // Next up: highest priority first, then lowest id
    let next = view::project(
        &graph,
        &ViewCriteria {
            status: StatusFilter::Only(TaskStatus::Pending),
            ..ViewCriteria::default()
        },
    );
    let next: Vec<_> = next
        .rows
        .iter()
        .filter(|r| r.availability == view::Availability::Available)
        .take(3)
        .map(|r| r.task)
        .collect();

    if json {
        let output = StatsJson {
            summary,
            health: summary.health(),
            next_available: next.iter().map(|t| task_brief(t)).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for line in format_summary(&summary) {
            println!("{}", line);
        }
        if !next.is_empty() {
            println!();
            println!("next up:");
            for task in next {
                println!("  {}", format_task_line(task, view::Availability::Available));
            }
        }
    }
    Ok(())
}

fn cmd_show(start: &Path, args: ShowArgs, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (graph, _) = load_graph(start)?;
    let task = graph
        .find(&args.id)
        .ok_or_else(|| format!("task not found: {}", args.id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&show_to_json(&graph, task))?);
    } else if args.raw {
        print!("{}", serialize_task(task));
    } else {
        for line in format_task_detail(&graph, task) {
            println!("{}", line);
        }
    }
    Ok(())
}
