use crate::core::schema::SchemaViolation;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid GitHub repository URL: {url}")]
    InvalidRepositoryUrl { url: String },

    #[error("Invalid issue number: {value} (must be a positive integer)")]
    InvalidIssueNumber { value: u64 },

    #[error("Invalid query parameters: {message}")]
    InvalidQuery { message: String },

    #[error("GitHub API returned {status} for {url}: {body}")]
    Upstream { status: u16, url: String, body: String },

    #[error("Unexpected GitHub API payload: {message}")]
    UpstreamPayload { message: String },

    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Triage verdict failed schema validation: {}", format_violations(.violations))]
    Schema { violations: Vec<SchemaViolation> },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Coarse grouping used by the HTTP layer and the CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Auth,
    Input,
    Upstream,
    Internal,
    Configuration,
}

impl TriageError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TriageError::Unauthorized => ErrorCategory::Auth,
            TriageError::InvalidRepositoryUrl { .. }
            | TriageError::InvalidIssueNumber { .. }
            | TriageError::InvalidQuery { .. } => ErrorCategory::Input,
            TriageError::Upstream { .. }
            | TriageError::UpstreamPayload { .. }
            | TriageError::Http(_) => ErrorCategory::Upstream,
            TriageError::Schema { .. }
            | TriageError::IoError(_)
            | TriageError::SerializationError(_) => ErrorCategory::Internal,
            TriageError::ConfigError { .. } | TriageError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TriageError::Http(e) if e.is_timeout())
    }
}

fn format_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, TriageError>;
