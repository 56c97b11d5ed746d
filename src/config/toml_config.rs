use crate::utils::error::{FedoraError, Result};
use crate::utils::validation::Validate;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub fedora: FedoraSection,
    pub checks: Option<ChecksSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FedoraSection {
    pub root: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksSection {
    pub concurrent_requests: Option<usize>,
    pub csv_file: Option<String>,
    pub checksum_type: Option<String>,
    pub timestamp_file: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(FedoraError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| FedoraError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FEDORA_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| FedoraError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn checks(&self) -> ChecksSection {
        self.checks.clone().unwrap_or_default()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(root) = &self.fedora.root {
            crate::utils::validation::validate_url("fedora.root", root)?;
        }

        if let Some(checks) = &self.checks {
            if let Some(concurrent) = checks.concurrent_requests {
                crate::utils::validation::validate_range(
                    "checks.concurrent_requests",
                    concurrent,
                    1,
                    64,
                )?;
            }
            if let Some(kind) = &checks.checksum_type {
                kind.parse::<crate::checksum::ChecksumType>()?;
            }
            if let Some(path) = &checks.csv_file {
                crate::utils::validation::validate_path("checks.csv_file", path)?;
            }
        }

        Ok(())
    }
}
