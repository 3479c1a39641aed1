pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::Cli;

pub use app::{router, serve, AppState};
pub use config::{GitHubConfig, ServiceConfig};
pub use core::{retriever::GitHubRetriever, triage::TriageEngine};
pub use domain::model::{IssueData, IssueType, TriageVerdict};
pub use utils::error::{Result, TriageError};
