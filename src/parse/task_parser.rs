use serde_yaml::Value;

use crate::model::task::{Priority, Task, TaskId, TaskStatus};
use crate::parse::frontmatter::{
    ParseError, RawFrontmatter, decode_frontmatter, scalar_text, split_frontmatter,
};

/// Frontmatter keys every task must carry, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 7] = [
    "id",
    "title",
    "status",
    "priority",
    "feature",
    "dependencies",
    "created_at",
];

/// Parse a task document: frontmatter metadata followed by a markdown body.
pub fn parse_task(text: &str) -> Result<Task, ParseError> {
    let (yaml, body) = split_frontmatter(text)?;
    let raw = decode_frontmatter(&yaml)?;
    let mut task = validate_task(&raw)?;
    let sections = parse_task_body(&body);
    task.description = sections.description;
    task.details = sections.details;
    task.test_strategy = sections.test_strategy;
    task.agent_notes = sections.agent_notes;
    Ok(task)
}

/// Second parse phase: check the loose frontmatter map and coerce it into a
/// typed task (body sections left empty).
pub fn validate_task(raw: &RawFrontmatter) -> Result<Task, ParseError> {
    for field in REQUIRED_FIELDS {
        if !raw.contains_key(field) {
            return Err(ParseError::MissingField(field));
        }
    }

    let id = TaskId::new(required_text(raw, "id")?);
    let title = required_text(raw, "title")?;

    let status_text = enum_text(raw, "status")?;
    let status = TaskStatus::parse(&status_text).ok_or(ParseError::InvalidEnum {
        field: "status",
        value: status_text,
    })?;

    let priority_text = enum_text(raw, "priority")?;
    let priority = Priority::parse(&priority_text).ok_or(ParseError::InvalidEnum {
        field: "priority",
        value: priority_text,
    })?;

    let feature = required_text(raw, "feature")?;
    let dependencies = dependency_list(&raw["dependencies"])?;
    let created_at = required_text(raw, "created_at")?;

    Ok(Task {
        id,
        title,
        status,
        priority,
        feature,
        dependencies,
        assigned_agent: optional_text(raw, "assigned_agent")?,
        created_at,
        started_at: optional_text(raw, "started_at")?,
        completed_at: optional_text(raw, "completed_at")?,
        error_log: optional_text(raw, "error_log")?,
        description: None,
        details: Vec::new(),
        test_strategy: None,
        agent_notes: None,
    })
}

fn required_text(raw: &RawFrontmatter, field: &'static str) -> Result<String, ParseError> {
    raw.get(field)
        .and_then(scalar_text)
        .ok_or(ParseError::InvalidType(field))
}

/// Enum fields report any non-keyword value, including non-strings, as invalid
fn enum_text(raw: &RawFrontmatter, field: &'static str) -> Result<String, ParseError> {
    let value = &raw[field];
    match scalar_text(value) {
        Some(text) => Ok(text),
        None => Err(ParseError::InvalidEnum {
            field,
            value: render_value(value),
        }),
    }
}

fn optional_text(raw: &RawFrontmatter, field: &'static str) -> Result<Option<String>, ParseError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_text(value)
            .map(Some)
            .ok_or(ParseError::InvalidType(field)),
    }
}

fn dependency_list(value: &Value) -> Result<Vec<TaskId>, ParseError> {
    let Value::Sequence(items) = value else {
        return Err(ParseError::InvalidType("dependencies"));
    };
    let mut deps: Vec<TaskId> = Vec::with_capacity(items.len());
    for item in items {
        let id = TaskId::new(scalar_text(item).ok_or(ParseError::InvalidType("dependencies"))?);
        if !deps.contains(&id) {
            deps.push(id);
        }
    }
    Ok(deps)
}

fn render_value(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "?".to_string())
}

/// Optional free-text sections extracted from a task body
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TaskSections {
    pub description: Option<String>,
    pub details: Vec<String>,
    pub test_strategy: Option<String>,
    pub agent_notes: Option<String>,
}

/// Split a task body on `## ` headings and pick out the known sections.
/// Unknown headings and text before the first heading are ignored.
pub fn parse_task_body(body: &str) -> TaskSections {
    let mut sections = TaskSections::default();
    let mut heading: Option<&str> = None;
    let mut content: Vec<&str> = Vec::new();

    for line in body.lines() {
        if let Some(title) = line.strip_prefix("## ") {
            if let Some(h) = heading {
                apply_section(&mut sections, h, &content);
            }
            heading = Some(title.trim());
            content.clear();
        } else {
            content.push(line);
        }
    }
    if let Some(h) = heading {
        apply_section(&mut sections, h, &content);
    }
    sections
}

fn apply_section(sections: &mut TaskSections, heading: &str, lines: &[&str]) {
    let text = lines.join("\n").trim().to_string();
    let text_or_none = || (!text.is_empty()).then(|| text.clone());
    if heading.eq_ignore_ascii_case("Description") {
        sections.description = text_or_none();
    } else if heading.eq_ignore_ascii_case("Details") {
        sections.details = parse_bullets(&text);
    } else if heading.eq_ignore_ascii_case("Test Strategy") {
        sections.test_strategy = text_or_none();
    } else if heading.eq_ignore_ascii_case("Agent Notes") {
        sections.agent_notes = text_or_none();
    }
}

/// Split text into `- ` bullet items. Lines that don't start a bullet
/// continue the current item; leading prose becomes an item of its own.
fn parse_bullets(text: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(item) = trimmed.strip_prefix("- ").or_else(|| (trimmed == "-").then_some("")) {
            if let Some(done) = current.take() {
                items.push(done);
            }
            current = Some(item.trim().to_string());
        } else if !trimmed.is_empty() {
            match current.as_mut() {
                Some(item) if !item.is_empty() => {
                    item.push('\n');
                    item.push_str(trimmed);
                }
                Some(item) => item.push_str(trimmed),
                None => current = Some(trimmed.to_string()),
            }
        }
    }
    if let Some(done) = current {
        items.push(done);
    }
    items.retain(|item| !item.is_empty());
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL: &str = "\
---
id: 4
title: Wire up the watcher
status: inprogress
priority: high
feature: Live Reload
dependencies: [1, \"2.1\"]
assigned_agent: builder
created_at: 2025-05-01T10:00:00Z
started_at: 2025-05-02T09:00:00Z
completed_at: null
error_log: null
---

# Task: Wire up the watcher

## Description

Rebuild the project when files change.

## Details

- Debounce bursts of events
- Parse the touched file first
  and announce it
- Always rebuild afterwards

## Test Strategy

Touch five files quickly and count rebuilds.

## Agent Notes

Started on the notify backend.
";

    #[test]
    fn parses_full_document() {
        let task = parse_task(FULL).unwrap();
        assert_eq!(task.id, TaskId::from("4"));
        assert_eq!(task.title, "Wire up the watcher");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.feature, "Live Reload");
        assert_eq!(task.dependencies, vec![TaskId::from("1"), TaskId::from("2.1")]);
        assert_eq!(task.assigned_agent.as_deref(), Some("builder"));
        assert_eq!(task.created_at, "2025-05-01T10:00:00Z");
        assert_eq!(task.started_at.as_deref(), Some("2025-05-02T09:00:00Z"));
        assert_eq!(task.completed_at, None);
        assert_eq!(task.error_log, None);
        assert_eq!(
            task.description.as_deref(),
            Some("Rebuild the project when files change.")
        );
        assert_eq!(
            task.details,
            vec![
                "Debounce bursts of events".to_string(),
                "Parse the touched file first\nand announce it".to_string(),
                "Always rebuild afterwards".to_string(),
            ]
        );
        assert_eq!(
            task.test_strategy.as_deref(),
            Some("Touch five files quickly and count rebuilds.")
        );
        assert_eq!(task.agent_notes.as_deref(), Some("Started on the notify backend."));
    }

    fn doc(frontmatter: &str) -> String {
        format!("---\n{}\n---\n", frontmatter)
    }

    const BASE: &str = "id: 1\ntitle: T\nstatus: pending\npriority: low\nfeature: F\ndependencies: []\ncreated_at: today";

    #[test]
    fn minimal_document_has_empty_sections() {
        let task = parse_task(&doc(BASE)).unwrap();
        assert_eq!(task.description, None);
        assert!(task.details.is_empty());
        assert_eq!(task.test_strategy, None);
        assert_eq!(task.agent_notes, None);
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn each_required_field_is_checked() {
        for field in REQUIRED_FIELDS {
            let without: Vec<&str> = BASE
                .lines()
                .filter(|l| !l.starts_with(&format!("{}:", field)))
                .collect();
            assert_eq!(
                parse_task(&doc(&without.join("\n"))),
                Err(ParseError::MissingField(field)),
                "field {}",
                field
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let text = doc(&BASE.replace("status: pending", "status: blocked"));
        assert_eq!(
            parse_task(&text),
            Err(ParseError::InvalidEnum {
                field: "status",
                value: "blocked".to_string()
            })
        );
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let text = doc(&BASE.replace("priority: low", "priority: urgent"));
        assert_eq!(
            parse_task(&text),
            Err(ParseError::InvalidEnum {
                field: "priority",
                value: "urgent".to_string()
            })
        );
    }

    #[test]
    fn dependencies_must_be_a_sequence() {
        let text = doc(&BASE.replace("dependencies: []", "dependencies: 3"));
        assert_eq!(parse_task(&text), Err(ParseError::InvalidType("dependencies")));
        let text = doc(&BASE.replace("dependencies: []", "dependencies:"));
        assert_eq!(parse_task(&text), Err(ParseError::InvalidType("dependencies")));
    }

    #[test]
    fn repeated_dependencies_collapse() {
        let text = doc(&BASE.replace("dependencies: []", "dependencies: [2, 3, 2, \"3\"]"));
        let task = parse_task(&text).unwrap();
        assert_eq!(task.dependencies, vec![TaskId::from("2"), TaskId::from("3")]);
    }

    #[test]
    fn non_mapping_frontmatter() {
        assert_eq!(parse_task("---\n- a\n- b\n---\n"), Err(ParseError::NotAMapping));
    }

    #[test]
    fn no_frontmatter() {
        assert_eq!(
            parse_task("## Description\nNothing here"),
            Err(ParseError::MissingFrontmatter)
        );
    }

    #[test]
    fn body_starting_with_heading_is_read() {
        let sections = parse_task_body("## Description\nFirst thing");
        assert_eq!(sections.description.as_deref(), Some("First thing"));
    }

    #[test]
    fn unknown_headings_are_ignored() {
        let sections = parse_task_body("## Notes\nx\n## Test Strategy\nrun it\n## Misc\ny");
        assert_eq!(sections.description, None);
        assert_eq!(sections.test_strategy.as_deref(), Some("run it"));
    }

    #[test]
    fn third_level_headings_stay_in_section() {
        let sections = parse_task_body("## Description\nIntro\n### Sub\nMore");
        assert_eq!(sections.description.as_deref(), Some("Intro\n### Sub\nMore"));
    }

    #[test]
    fn empty_agent_notes_is_none() {
        let sections = parse_task_body("## Agent Notes\n\n");
        assert_eq!(sections.agent_notes, None);
    }
}
