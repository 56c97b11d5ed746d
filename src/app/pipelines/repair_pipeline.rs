use crate::checksum::ChecksumType;
use crate::core::concurrent::{check_objects, ProgressHook};
use crate::core::report::write_report;
use crate::core::{CheckOutcome, ChecksumStatus, DatastreamCheck, Pipeline, Storage};
use crate::domain::model::ControlGroup;
use crate::models::Datastream;
use crate::repository::Repository;
use crate::utils::error::Result;
use crate::utils::validation::validate_pid;

const REPAIR_LOG_MESSAGE: &str = "Setting datastream checksum";

#[derive(Debug, Clone)]
pub struct RepairOptions {
    pub pids: Vec<String>,
    pub checksum_type: ChecksumType,
    pub dry_run: bool,
    /// 連已有 checksum 的 datastream 也重新設定
    pub force: bool,
    pub max_objects: Option<usize>,
    pub csv_file: Option<String>,
    pub concurrency: usize,
}

impl Default for RepairOptions {
    fn default() -> Self {
        Self {
            pids: Vec::new(),
            checksum_type: ChecksumType::Md5,
            dry_run: false,
            force: false,
            max_objects: None,
            csv_file: None,
            concurrency: 5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct RepairSettings {
    kind: ChecksumType,
    dry_run: bool,
    force: bool,
}

/// Sets a checksum on datastreams that lack one and confirms Fedora accepts it.
pub struct RepairPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) repository: Repository,
    pub(crate) options: RepairOptions,
    pub(crate) progress: Option<ProgressHook>,
}

impl<S: Storage> RepairPipeline<S> {
    pub fn new(storage: S, repository: Repository, options: RepairOptions) -> Self {
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
impl<S: Storage> Pipeline for RepairPipeline<S> {
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
        tracing::info!("🔍 Finding all objects in the Resource Index");
        self.repository
            .object_pids(None, self.options.max_objects)
            .await
    }

    async fn transform(&self, pids: Vec<String>) -> Result<CheckOutcome> {
        if !self.options.checksum_type.is_enabled() {
            return Err(crate::utils::error::FedoraError::InvalidConfigValueError {
                field: "checksum_type".to_string(),
                value: self.options.checksum_type.to_string(),
                reason: "a repair needs a real checksum algorithm".to_string(),
            });
        }
        if self.options.dry_run {
            tracing::info!("🧪 Dry run: no datastreams will be modified");
        }

        let repository = self.repository.clone();
        let settings = RepairSettings {
            kind: self.options.checksum_type,
            dry_run: self.options.dry_run,
            force: self.options.force,
        };
        let outcome = check_objects(
            pids,
            self.options.concurrency,
            self.progress.clone(),
            move |pid| repair_object(repository.clone(), pid, settings),
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

async fn repair_object(repository: Repository, pid: String, settings: RepairSettings) -> Result<Vec<DatastreamCheck>> {
    let object = repository.get_object(&pid);
    let mut checks = Vec::new();
    for dsid in object.dsids().await? {
        let datastream = object.datastream(&dsid);
        checks.push(repair_datastream(&datastream, settings).await);
    }
    Ok(checks)
}

/// 單一 datastream 的錯誤記錄為 failed，不影響同一物件的其他 datastream
async fn repair_datastream(datastream: &Datastream, settings: RepairSettings) -> DatastreamCheck {
    let profile = match datastream.profile().await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!(
                "❌ Could not read {}/{}: {}",
                datastream.pid(),
                datastream.dsid(),
                e
            );
            return DatastreamCheck {
                pid: datastream.pid().to_string(),
                dsid: datastream.dsid().to_string(),
                version: None,
                status: ChecksumStatus::Failed,
                checksum_type: ChecksumType::Disabled,
                checksum: None,
            };
        }
    };
    let mut check = DatastreamCheck {
        pid: datastream.pid().to_string(),
        dsid: datastream.dsid().to_string(),
        version: profile.created,
        status: ChecksumStatus::Skipped,
        checksum_type: profile.checksum_type,
        checksum: profile.checksum.clone(),
    };

    // E/R 的內容不在 Fedora 裡，無法計算 checksum
    if matches!(
        profile.control_group,
        Some(ControlGroup::External) | Some(ControlGroup::Redirect)
    ) {
        tracing::debug!("Skipping external datastream {}/{}", check.pid, check.dsid);
        return check;
    }
    if profile.has_checksum() && !settings.force {
        return check;
    }

    if settings.dry_run {
        tracing::info!(
            "Would set {} checksum on {}/{}",
            settings.kind,
            check.pid,
            check.dsid
        );
        check.status = ChecksumStatus::WouldRepair;
        return check;
    }

    if let Err(e) = datastream
        .set_checksum_type(settings.kind, Some(REPAIR_LOG_MESSAGE))
        .await
    {
        tracing::warn!("❌ Could not update {}/{}: {}", check.pid, check.dsid, e);
        check.status = ChecksumStatus::Failed;
        return check;
    }

    let (updated, status) = match datastream.checksum_status().await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(
                "❌ Could not re-validate {}/{}: {}",
                check.pid,
                check.dsid,
                e
            );
            check.status = ChecksumStatus::Failed;
            return check;
        }
    };
    check.checksum_type = updated.checksum_type;
    check.checksum = updated.checksum.clone();
    check.version = updated.created.or(check.version);
    check.status = if status == ChecksumStatus::Valid {
        tracing::info!("🔧 Set {} checksum on {}/{}", settings.kind, check.pid, check.dsid);
        ChecksumStatus::Repaired
    } else {
        tracing::warn!(
            "❌ Checksum on {}/{} is {} after repair",
            check.pid,
            check.dsid,
            status
        );
        ChecksumStatus::Failed
    };
    check
}
