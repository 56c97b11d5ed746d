use crate::core::concurrent::{check_objects, ProgressHook};
use crate::core::report::write_report;
use crate::core::{CheckOutcome, ChecksumStatus, DatastreamCheck, Pipeline, Storage};
use crate::domain::model::DatastreamProfile;
use crate::repository::Repository;
use crate::utils::error::Result;
use crate::utils::validation::validate_pid;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    /// 指定的物件；空的話從 Resource Index 取得全部物件
    pub pids: Vec<String>,
    pub all_versions: bool,
    pub since: Option<DateTime<Utc>>,
    pub max_objects: Option<usize>,
    pub csv_file: Option<String>,
    pub concurrency: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            pids: Vec::new(),
            all_versions: false,
            since: None,
            max_objects: None,
            csv_file: None,
            concurrency: 5,
        }
    }
}

/// Asks Fedora to validate the stored checksum of every datastream.
pub struct ValidatePipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) repository: Repository,
    pub(crate) options: ValidateOptions,
    pub(crate) progress: Option<ProgressHook>,
}

impl<S: Storage> ValidatePipeline<S> {
    pub fn new(storage: S, repository: Repository, options: ValidateOptions) -> Self {
        Self {
            storage,
            repository,
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, hook: ProgressHook) -> Self {
        self.progress = Some(hook);
        self
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for ValidatePipeline<S> {
    async fn extract(&self) -> Result<Vec<String>> {
        if !self.options.pids.is_empty() {
            let mut pids = Vec::with_capacity(self.options.pids.len());
            for pid in &self.options.pids {
                validate_pid("pid", pid)?;
                pids.push(pid.clone());
            }
            if let Some(max) = self.options.max_objects {
                pids.truncate(max);
            }
            return Ok(pids);
        }

        match &self.options.since {
            Some(since) => tracing::info!("🔍 Finding objects modified since {}", since),
            None => tracing::info!("🔍 Finding all objects in the Resource Index"),
        }
        self.repository
            .object_pids(self.options.since.as_ref(), self.options.max_objects)
            .await
    }

    async fn transform(&self, pids: Vec<String>) -> Result<CheckOutcome> {
        let repository = self.repository.clone();
        let all_versions = self.options.all_versions;
        let outcome = check_objects(
            pids,
            self.options.concurrency,
            self.progress.clone(),
            move |pid| validate_object(repository.clone(), pid, all_versions),
        )
        .await;
        Ok(outcome)
    }

    async fn load(&self, outcome: &CheckOutcome) -> Result<Option<String>> {
        match &self.options.csv_file {
            Some(path) => Ok(Some(write_report(&self.storage, path, outcome).await?)),
            None => Ok(None),
        }
    }
}

async fn validate_object(repository: Repository, pid: String, all_versions: bool) -> Result<Vec<DatastreamCheck>> {
    let object = repository.get_object(&pid);
    let dsids = object.dsids().await?;
    let mut checks = Vec::new();

    for dsid in dsids {
        let datastream = object.datastream(&dsid);
        if all_versions {
            // 以每個版本的建立時間作為 asOfDateTime
            for version in datastream.history().await? {
                let Some(created) = version.created else {
                    tracing::debug!("Skipping undated version of {}/{}", pid, dsid);
                    continue;
                };
                let (profile, status) = datastream.at_version(created).checksum_status().await?;
                checks.push(record(&pid, &profile, Some(created), status));
            }
        } else {
            let (profile, status) = datastream.checksum_status().await?;
            checks.push(record(&pid, &profile, profile.created, status));
        }
    }
    Ok(checks)
}

fn record(
    pid: &str,
    profile: &DatastreamProfile,
    version: Option<DateTime<Utc>>,
    status: ChecksumStatus,
) -> DatastreamCheck {
    match status {
        ChecksumStatus::Invalid => tracing::warn!(
            "❌ Invalid {} checksum: {}/{} ({})",
            profile.checksum_type,
            pid,
            profile.dsid,
            profile.version_id.as_deref().unwrap_or("current")
        ),
        ChecksumStatus::Missing => {
            tracing::info!("Missing checksum: {}/{}", pid, profile.dsid)
        }
        _ => {}
    }
    DatastreamCheck {
        pid: pid.to_string(),
        dsid: profile.dsid.clone(),
        version,
        status,
        checksum_type: profile.checksum_type,
        checksum: profile.checksum.clone(),
    }
}
