use crate::core::TriageVerdict;
use crate::utils::error::{Result, TriageError};
use std::fmt;
use std::ops::RangeInclusive;

pub const PRIORITY_RANGE: RangeInclusive<u8> = 1..=5;
pub const LABEL_COUNT_RANGE: RangeInclusive<usize> = 2..=3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    EmptySummary,
    EmptyImpact,
    PriorityOutOfRange(u8),
    LabelCountOutOfRange(usize),
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaViolation::EmptySummary => write!(f, "summary must not be empty"),
            SchemaViolation::EmptyImpact => write!(f, "potential_impact must not be empty"),
            SchemaViolation::PriorityOutOfRange(score) => write!(
                f,
                "priority_score {} is outside {}..={}",
                score,
                PRIORITY_RANGE.start(),
                PRIORITY_RANGE.end()
            ),
            SchemaViolation::LabelCountOutOfRange(count) => write!(
                f,
                "suggested_labels has {} entries, expected {} to {}",
                count,
                LABEL_COUNT_RANGE.start(),
                LABEL_COUNT_RANGE.end()
            ),
        }
    }
}

/// Collects every violation rather than stopping at the first. The `type`
/// field is a closed enum, so an out-of-vocabulary value cannot reach here.
pub fn violations(candidate: &TriageVerdict) -> Vec<SchemaViolation> {
    let mut found = Vec::new();

    if candidate.summary.trim().is_empty() {
        found.push(SchemaViolation::EmptySummary);
    }
    if candidate.potential_impact.trim().is_empty() {
        found.push(SchemaViolation::EmptyImpact);
    }
    if !PRIORITY_RANGE.contains(&candidate.priority_score) {
        found.push(SchemaViolation::PriorityOutOfRange(candidate.priority_score));
    }
    if !LABEL_COUNT_RANGE.contains(&candidate.suggested_labels.len()) {
        found.push(SchemaViolation::LabelCountOutOfRange(
            candidate.suggested_labels.len(),
        ));
    }

    found
}

pub fn validate(candidate: TriageVerdict) -> Result<TriageVerdict> {
    let found = violations(&candidate);
    if found.is_empty() {
        Ok(candidate)
    } else {
        Err(TriageError::Schema { violations: found })
    }
}

/// Parse a verdict from JSON and hold it to the same contract as [`validate`].
pub fn parse_verdict(json: &str) -> Result<TriageVerdict> {
    let candidate: TriageVerdict = serde_json::from_str(json)?;
    validate(candidate)
}
