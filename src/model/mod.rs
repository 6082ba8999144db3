pub mod config;
pub mod plan;
pub mod project;
pub mod task;

pub use config::*;
pub use plan::*;
pub use project::*;
pub use task::*;
