use crate::core::{IssueData, IssueType, TriageVerdict};

pub const BUG_KEYWORDS: [&str; 8] = [
    "error",
    "exception",
    "cannot",
    "failed",
    "failure",
    "crash",
    "traceback",
    "runtime",
];

pub const FALLBACK_SUMMARY: &str = "GitHub issue analysis";
pub const MAX_SUGGESTED_LABELS: usize = 3;

const BUG_IMPACT: &str = "May block execution or cause failures during runtime.";
const FEATURE_IMPACT: &str = "Improves developer experience but does not block users.";

fn mentions_bug_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    BUG_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Keyword heuristic over title and body. Comments are not consulted.
pub fn classify(issue: &IssueData) -> TriageVerdict {
    let is_bug = mentions_bug_keyword(&issue.title) || mentions_bug_keyword(&issue.body);

    let (issue_type, priority_score, labels, impact) = if is_bug {
        (IssueType::Bug, 4, ["bug", "runtime-error"], BUG_IMPACT)
    } else {
        (
            IssueType::FeatureRequest,
            3,
            ["enhancement", "discussion"],
            FEATURE_IMPACT,
        )
    };

    // 與 schema 的非空檢查一致：純空白標題也改用預設摘要
    let summary = if issue.title.trim().is_empty() {
        FALLBACK_SUMMARY.to_string()
    } else {
        issue.title.clone()
    };

    TriageVerdict {
        summary,
        issue_type,
        priority_score,
        suggested_labels: labels
            .iter()
            .take(MAX_SUGGESTED_LABELS)
            .map(|label| label.to_string())
            .collect(),
        potential_impact: impact.to_string(),
    }
}
