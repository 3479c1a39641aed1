use serde::{Deserialize, Serialize};
use std::fmt;

/// Issue text as retrieved from the hosting API. Missing fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueData {
    pub title: String,
    pub body: String,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Bug,
    FeatureRequest,
    Documentation,
    Question,
    Other,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueType::Bug => "bug",
            IssueType::FeatureRequest => "feature_request",
            IssueType::Documentation => "documentation",
            IssueType::Question => "question",
            IssueType::Other => "other",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured triage output returned by `GET /analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageVerdict {
    pub summary: String,
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub priority_score: u8,
    pub suggested_labels: Vec<String>,
    pub potential_impact: String,
}
