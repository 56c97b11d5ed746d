use crate::domain::model::CheckOutcome;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

/// Where and how to reach Fedora.
pub trait ConfigProvider: Send + Sync {
    fn fedora_root(&self) -> &str;
    fn fedora_user(&self) -> Option<&str>;
    fn fedora_password(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
    fn retry_attempts(&self) -> u32;
    fn retry_delay(&self) -> Duration;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    /// 取得要檢查的物件 pid
    async fn extract(&self) -> Result<Vec<String>>;
    async fn transform(&self, pids: Vec<String>) -> Result<CheckOutcome>;
    /// 寫出報表，回傳報表路徑（若有）
    async fn load(&self, outcome: &CheckOutcome) -> Result<Option<String>>;
}
