pub mod cli;
pub mod env;
pub mod toml_config;

use crate::checksum::ChecksumType;
use crate::config::env::EnvConfig;
use crate::config::toml_config::TomlConfig;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::time::Duration;

pub const DEFAULT_FEDORA_ROOT: &str = "http://localhost:8080/fedora/";

/// Connection flags shared by the checksum scripts.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ConnectionArgs {
    /// Fedora base URL, e.g. http://localhost:8080/fedora/
    #[arg(long, global = true)]
    pub fedora_root: Option<String>,

    #[arg(long, global = true)]
    pub fedora_user: Option<String>,

    #[arg(long, global = true)]
    pub fedora_password: Option<String>,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Retries for failed read requests
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Objects checked in parallel
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
}

/// Resolved settings: defaults < config file < environment < command line.
#[derive(Debug, Clone)]
pub struct FedoraSettings {
    pub root: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub concurrent_requests: usize,
    pub csv_file: Option<String>,
    pub checksum_type: Option<ChecksumType>,
    pub timestamp_file: Option<String>,
}

impl Default for FedoraSettings {
    fn default() -> Self {
        Self {
            root: DEFAULT_FEDORA_ROOT.to_string(),
            user: None,
            password: None,
            timeout: Duration::from_secs(30),
            retry_attempts: 2,
            retry_delay: Duration::from_secs(1),
            concurrent_requests: 5,
            csv_file: None,
            checksum_type: None,
            timestamp_file: None,
        }
    }
}

impl FedoraSettings {
    pub fn merge_toml(mut self, file: &TomlConfig) -> Result<Self> {
        let fedora = &file.fedora;
        if let Some(root) = &fedora.root {
            self.root = root.clone();
        }
        if fedora.user.is_some() {
            self.user = fedora.user.clone();
        }
        if fedora.password.is_some() {
            self.password = fedora.password.clone();
        }
        if let Some(secs) = fedora.timeout_seconds {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = fedora.retry_attempts {
            self.retry_attempts = attempts;
        }
        if let Some(secs) = fedora.retry_delay_seconds {
            self.retry_delay = Duration::from_secs(secs);
        }

        let checks = file.checks();
        if let Some(n) = checks.concurrent_requests {
            self.concurrent_requests = n;
        }
        if checks.csv_file.is_some() {
            self.csv_file = checks.csv_file;
        }
        if let Some(kind) = checks.checksum_type {
            self.checksum_type = Some(kind.parse()?);
        }
        if checks.timestamp_file.is_some() {
            self.timestamp_file = checks.timestamp_file;
        }
        Ok(self)
    }

    pub fn merge_env(mut self, env: &EnvConfig) -> Self {
        if let Some(root) = &env.root {
            self.root = root.clone();
        }
        if env.user.is_some() {
            self.user = env.user.clone();
        }
        if env.password.is_some() {
            self.password = env.password.clone();
        }
        self
    }

    #[cfg(feature = "cli")]
    pub fn merge_args(mut self, args: &ConnectionArgs) -> Self {
        if let Some(root) = &args.fedora_root {
            self.root = root.clone();
        }
        if args.fedora_user.is_some() {
            self.user = args.fedora_user.clone();
        }
        if args.fedora_password.is_some() {
            self.password = args.fedora_password.clone();
        }
        if let Some(secs) = args.timeout {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = args.retries {
            self.retry_attempts = retries;
        }
        if let Some(n) = args.concurrency {
            self.concurrent_requests = n;
        }
        self
    }

    /// 依優先順序載入：設定檔、環境變數、命令列
    #[cfg(feature = "cli")]
    pub fn load(args: &ConnectionArgs) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(path) = &args.config {
            tracing::info!("📁 Loading configuration from: {}", path);
            let file = TomlConfig::from_file(path)?;
            file.validate()?;
            settings = settings.merge_toml(&file)?;
        }
        let settings = settings
            .merge_env(&EnvConfig::from_env())
            .merge_args(args);
        settings.validate()?;
        Ok(settings)
    }
}

impl ConfigProvider for FedoraSettings {
    fn fedora_root(&self) -> &str {
        &self.root
    }

    fn fedora_user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    fn fedora_password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    fn request_timeout(&self) -> Duration {
        self.timeout
    }

    fn retry_attempts(&self) -> u32 {
        self.retry_attempts
    }

    fn retry_delay(&self) -> Duration {
        self.retry_delay
    }
}

impl Validate for FedoraSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("fedora.root", &self.root)?;
        validation::validate_range("concurrent_requests", self.concurrent_requests, 1, 64)?;
        validation::validate_range("retry_attempts", self.retry_attempts, 0, 10)?;
        if self.password.is_some() {
            validation::validate_required_field("fedora.user", &self.user)?;
        }
        if let Some(path) = &self.csv_file {
            validation::validate_path("csv_file", path)?;
        }
        Ok(())
    }
}
