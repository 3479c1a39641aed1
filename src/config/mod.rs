#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_secret, validate_socket_addr,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_USER_AGENT: &str = "issue-triage";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// 兩次上游呼叫都要落在前端 120 秒的預算內
pub const MAX_TIMEOUT_SECONDS: u64 = 60;

#[derive(Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    pub api_key: String,
    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub token: Option<String>,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

fn default_api_base() -> String {
    DEFAULT_GITHUB_API_BASE.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
            token: None,
        }
    }
}

impl GitHubConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl ServiceConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: api_key.into(),
            github: GitHubConfig::default(),
        }
    }
}

impl Validate for GitHubConfig {
    fn validate(&self) -> Result<()> {
        validate_url("github.api_base", &self.api_base)?;
        validate_non_empty_string("github.user_agent", &self.user_agent)?;
        validate_range(
            "github.timeout_seconds",
            self.timeout_seconds,
            1,
            MAX_TIMEOUT_SECONDS,
        )?;
        if let Some(token) = &self.token {
            validate_secret("github.token", token)?;
        }
        Ok(())
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_socket_addr("bind_address", &self.bind_address)?;
        validate_secret("api_key", &self.api_key)?;
        self.github.validate()
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_address", &self.bind_address)
            .field("api_key", &"<redacted>")
            .field("github", &self.github)
            .finish()
    }
}

impl fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
