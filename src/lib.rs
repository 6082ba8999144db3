//! Terminal dashboard for `.ai/` task graphs.
//!
//! The pipeline runs one way: files under `.ai/` are parsed into records
//! ([`parse`]), assembled into an immutable [`ProjectGraph`] ([`io::build_project`]),
//! and projected into ordered rows for display ([`ops::project`]). A
//! [`ProjectWatcher`] republishes a fresh graph after every burst of edits.

pub mod cli;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod tui;
pub mod util;

pub use io::{ProjectEvent, ProjectWatcher, build_project};
pub use model::project::ProjectGraph;
pub use ops::{ViewCriteria, ViewResult, project};
