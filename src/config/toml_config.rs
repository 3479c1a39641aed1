use crate::config::ServiceConfig;
use crate::utils::error::{Result, TriageError};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

impl ServiceConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(TriageError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TriageError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid"))
}

/// 替換環境變數 (例如 ${BACKEND_API_KEY})，找不到的變數原樣保留
fn substitute_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
}
