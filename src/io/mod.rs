pub mod config_io;
pub mod project_io;
pub mod reconciler;
pub mod watcher;

pub use project_io::{ProjectError, build_project, load_project};
pub use reconciler::{ChangeKind, ProjectEvent};
pub use watcher::{ProjectWatcher, WatchError};
