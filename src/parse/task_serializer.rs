use serde_yaml::{Mapping, Value};

use crate::model::task::Task;

/// Serialize a task to its canonical document form.
///
/// Emits the required frontmatter keys, then any optional metadata that is
/// set, then the body sections that have content. Parsing the output with
/// [`crate::parse::parse_task`] yields an equal task.
pub fn serialize_task(task: &Task) -> String {
    let mut map = Mapping::new();
    let mut put = |key: &str, value: Value| {
        map.insert(Value::from(key), value);
    };

    put("id", Value::from(task.id.as_str()));
    put("title", Value::from(task.title.as_str()));
    put("status", Value::from(task.status.as_str()));
    put("priority", Value::from(task.priority.as_str()));
    put("feature", Value::from(task.feature.as_str()));
    put(
        "dependencies",
        Value::Sequence(
            task.dependencies
                .iter()
                .map(|d| Value::from(d.as_str()))
                .collect(),
        ),
    );
    put("assigned_agent", optional(&task.assigned_agent));
    put("created_at", Value::from(task.created_at.as_str()));
    put("started_at", optional(&task.started_at));
    put("completed_at", optional(&task.completed_at));
    put("error_log", optional(&task.error_log));

    let yaml = serde_yaml::to_string(&Value::Mapping(map)).unwrap_or_default();

    let mut out = String::new();
    out.push_str("---\n");
    out.push_str(&yaml);
    if !yaml.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n\n");
    out.push_str(&format!("# Task: {}\n", task.title));

    if let Some(description) = &task.description {
        push_section(&mut out, "Description", description);
    }
    if !task.details.is_empty() {
        let bullets: Vec<String> = task
            .details
            .iter()
            .map(|d| format!("- {}", d.replace('\n', "\n  ")))
            .collect();
        push_section(&mut out, "Details", &bullets.join("\n"));
    }
    if let Some(strategy) = &task.test_strategy {
        push_section(&mut out, "Test Strategy", strategy);
    }
    if let Some(notes) = &task.agent_notes {
        push_section(&mut out, "Agent Notes", notes);
    }
    out
}

fn optional(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::from(s.as_str()),
        None => Value::Null,
    }
}

fn push_section(out: &mut String, heading: &str, content: &str) {
    out.push_str(&format!("\n## {}\n\n{}\n", heading, content.trim()));
}
