use crate::domain::model::IssueData;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Anything that can fetch one issue's text given a repository URL and issue number.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn retrieve(&self, repository_url: &str, issue_number: u64) -> Result<IssueData>;
}
