pub mod cycles;
pub mod deps;
pub mod view;

pub use cycles::detect_cycles;
pub use view::{ViewCriteria, ViewResult, project};
