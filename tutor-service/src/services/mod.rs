pub mod database;
pub mod grading;
pub mod llm;
pub mod metrics;
pub mod parsing;
pub mod providers;

pub use database::Database;
pub use llm::{Completion, LlmClient};
