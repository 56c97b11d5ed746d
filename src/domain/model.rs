use crate::checksum::{self, ChecksumType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectState {
    Active,
    Inactive,
    Deleted,
}

impl ObjectState {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "A" => Some(ObjectState::Active),
            "I" => Some(ObjectState::Inactive),
            "D" => Some(ObjectState::Deleted),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ObjectState::Active => "A",
            ObjectState::Inactive => "I",
            ObjectState::Deleted => "D",
        }
    }
}

/// X = inline XML, M = managed, E = external reference, R = redirect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlGroup {
    InlineXml,
    Managed,
    External,
    Redirect,
}

impl ControlGroup {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "X" => Some(ControlGroup::InlineXml),
            "M" => Some(ControlGroup::Managed),
            "E" => Some(ControlGroup::External),
            "R" => Some(ControlGroup::Redirect),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ControlGroup::InlineXml => "X",
            ControlGroup::Managed => "M",
            ControlGroup::External => "E",
            ControlGroup::Redirect => "R",
        }
    }

    /// E/R 內容存放在 Fedora 之外，無法可靠地計算 checksum
    pub fn is_stored_in_fedora(&self) -> bool {
        matches!(self, ControlGroup::InlineXml | ControlGroup::Managed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectProfile {
    pub pid: String,
    pub label: Option<String>,
    pub owner_ids: Vec<String>,
    pub models: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub state: Option<ObjectState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatastreamEntry {
    pub dsid: String,
    pub label: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatastreamProfile {
    pub dsid: String,
    pub label: Option<String>,
    pub version_id: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub state: Option<ObjectState>,
    pub mime_type: Option<String>,
    pub format_uri: Option<String>,
    pub control_group: Option<ControlGroup>,
    pub size: Option<u64>,
    pub versionable: bool,
    pub location: Option<String>,
    pub checksum_type: ChecksumType,
    pub checksum: Option<String>,
    /// 只有在要求 Fedora 驗證時才會有值
    pub checksum_valid: Option<bool>,
    pub alt_ids: Vec<String>,
}

impl DatastreamProfile {
    pub fn has_checksum(&self) -> bool {
        self.checksum_type.is_enabled() && checksum::has_checksum(self.checksum.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub pids: Vec<String>,
    pub session_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumStatus {
    Valid,
    Invalid,
    Missing,
    Repaired,
    WouldRepair,
    Skipped,
    Failed,
}

impl ChecksumStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChecksumStatus::Valid => "valid",
            ChecksumStatus::Invalid => "invalid",
            ChecksumStatus::Missing => "missing",
            ChecksumStatus::Repaired => "repaired",
            ChecksumStatus::WouldRepair => "would-repair",
            ChecksumStatus::Skipped => "skipped",
            ChecksumStatus::Failed => "failed",
        }
    }

    /// Rows worth putting in a report.
    pub fn is_problem(&self) -> bool {
        !matches!(self, ChecksumStatus::Valid | ChecksumStatus::Skipped)
    }
}

impl fmt::Display for ChecksumStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatastreamCheck {
    pub pid: String,
    pub dsid: String,
    pub version: Option<DateTime<Utc>>,
    pub status: ChecksumStatus,
    pub checksum_type: ChecksumType,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectFailure {
    pub pid: String,
    pub message: String,
}

/// Everything one checksum run found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckOutcome {
    pub objects: usize,
    pub checks: Vec<DatastreamCheck>,
    pub failures: Vec<ObjectFailure>,
}

impl CheckOutcome {
    pub fn count(&self, status: ChecksumStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    pub fn problems(&self) -> impl Iterator<Item = &DatastreamCheck> {
        self.checks.iter().filter(|c| c.status.is_problem())
    }

    /// 有不合格或尚未修復的 checksum，或修復失敗
    pub fn has_findings(&self) -> bool {
        self.checks.iter().any(|c| {
            matches!(
                c.status,
                ChecksumStatus::Invalid
                    | ChecksumStatus::Missing
                    | ChecksumStatus::WouldRepair
                    | ChecksumStatus::Failed
            )
        }) || !self.failures.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: CheckOutcome,
    pub report_path: Option<String>,
}
