use std::path::Path;

use crate::model::plan::{Plan, PlanKind};

/// Wrap a plan document. Plans are displayed verbatim, so the only
/// derived field is the title: "Global Plan" for the project plan, the
/// file stem with underscores turned into spaces for feature plans.
pub fn parse_plan(text: &str, source_path: &Path, kind: PlanKind) -> Plan {
    let title = match kind {
        PlanKind::Global => "Global Plan".to_string(),
        PlanKind::Feature => source_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .replace('_', " "),
    };
    Plan {
        title,
        source_path: source_path.to_path_buf(),
        content: text.to_string(),
        kind,
    }
}
