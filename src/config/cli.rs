use crate::config::{
    GitHubConfig, ServiceConfig, DEFAULT_BIND_ADDRESS, DEFAULT_GITHUB_API_BASE,
    DEFAULT_TIMEOUT_SECONDS, DEFAULT_USER_AGENT,
};
use crate::utils::error::{Result, TriageError};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "issue-triage")]
#[command(about = "Classify GitHub issues into structured triage verdicts")]
pub struct Cli {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Serve `GET /analyze` over HTTP
    Serve(ServeArgs),
    /// Triage a single issue and print the verdict as JSON
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Clone, Args)]
pub struct GitHubArgs {
    #[arg(long, env = "GITHUB_API_BASE", default_value = DEFAULT_GITHUB_API_BASE)]
    pub github_api_base: String,

    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECONDS)]
    pub timeout_seconds: u64,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// TOML config file; when given, the flags below are ignored
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long = "bind", env = "TRIAGE_BIND_ADDRESS", default_value = DEFAULT_BIND_ADDRESS)]
    pub bind_address: String,

    #[arg(long, env = "BACKEND_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, help = "Emit JSON log lines")]
    pub json_logs: bool,

    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    #[arg(long)]
    pub repo_url: String,

    #[arg(long)]
    pub issue_number: u64,

    #[command(flatten)]
    pub github: GitHubArgs,
}

impl From<GitHubArgs> for GitHubConfig {
    fn from(args: GitHubArgs) -> Self {
        Self {
            api_base: args.github_api_base,
            user_agent: args.user_agent,
            timeout_seconds: args.timeout_seconds,
            token: args.github_token,
        }
    }
}

impl ServeArgs {
    /// 設定檔優先，否則使用命令列參數與環境變數
    pub fn resolve(self) -> Result<ServiceConfig> {
        if let Some(path) = &self.config {
            return ServiceConfig::from_file(path);
        }

        let api_key = self.api_key.ok_or_else(|| TriageError::ConfigError {
            message: "--api-key or BACKEND_API_KEY is required".to_string(),
        })?;

        Ok(ServiceConfig {
            bind_address: self.bind_address,
            api_key,
            github: self.github.into(),
        })
    }
}
