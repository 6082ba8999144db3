pub mod frontmatter;
pub mod plan_parser;
pub mod task_parser;
pub mod task_serializer;

pub use frontmatter::ParseError;
pub use plan_parser::parse_plan;
pub use task_parser::{parse_task, parse_task_body};
pub use task_serializer::serialize_task;
