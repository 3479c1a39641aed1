pub mod classifier;
pub mod retriever;
pub mod schema;
pub mod triage;

pub use crate::domain::model::{IssueData, IssueType, TriageVerdict};
pub use crate::domain::ports::IssueSource;
pub use crate::utils::error::Result;
