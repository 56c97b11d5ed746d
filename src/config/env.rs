use std::env;

pub const ENV_ROOT: &str = "FEDORA_ROOT";
pub const ENV_USER: &str = "FEDORA_USER";
pub const ENV_PASSWORD: &str = "FEDORA_PASSWORD";

/// Connection settings read from `FEDORA_*` environment variables.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub root: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            root: read(ENV_ROOT),
            user: read(ENV_USER),
            password: read(ENV_PASSWORD),
        }
    }
}

// 空字串視為未設定
fn read(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
