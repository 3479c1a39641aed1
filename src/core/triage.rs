use crate::core::{classifier, schema, IssueSource, TriageVerdict};
use crate::utils::error::Result;

/// Runs one request through retrieve → classify → validate. Holds no
/// per-request state, so a single engine is shared by every request.
pub struct TriageEngine<S: IssueSource> {
    source: S,
}

impl<S: IssueSource> TriageEngine<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn run(&self, repository_url: &str, issue_number: u64) -> Result<TriageVerdict> {
        tracing::debug!("Retrieving issue #{} from {}", issue_number, repository_url.trim());
        let issue = self.source.retrieve(repository_url, issue_number).await?;
        tracing::debug!(
            "Retrieved issue with {} comments, classifying",
            issue.comments.len()
        );

        let candidate = classifier::classify(&issue);
        let verdict = schema::validate(candidate).map_err(|e| {
            tracing::error!("❌ Classifier produced an invalid verdict: {}", e);
            e
        })?;

        tracing::info!(
            "Issue #{} triaged as {} (priority {})",
            issue_number,
            verdict.issue_type,
            verdict.priority_score
        );
        Ok(verdict)
    }
}
