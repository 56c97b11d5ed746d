use crate::domain::model::{CheckOutcome, ChecksumStatus};
use crate::domain::ports::Storage;
use crate::utils::error::{FedoraError, Result};
use crate::utils::time::{format_fedora_time, parse_fedora_time};
use chrono::{DateTime, Utc};

pub const REPORT_HEADER: [&str; 6] = [
    "pid",
    "datastream",
    "version",
    "status",
    "checksum_type",
    "checksum",
];

/// CSV of every non-valid datastream plus objects that could not be checked.
pub fn render_csv(outcome: &CheckOutcome) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;

    for check in outcome.problems() {
        let version = check.version.map(|v| format_fedora_time(&v)).unwrap_or_default();
        writer.write_record([
            check.pid.as_str(),
            check.dsid.as_str(),
            version.as_str(),
            check.status.as_str(),
            check.checksum_type.as_str(),
            check.checksum.as_deref().unwrap_or(""),
        ])?;
    }
    // 無法處理的物件以 error 狀態列出，訊息放在最後一欄
    for failure in &outcome.failures {
        writer.write_record([failure.pid.as_str(), "", "", "error", "", failure.message.as_str()])?;
    }

    writer
        .into_inner()
        .map_err(|e| FedoraError::IoError(e.into_error()))
}

pub async fn write_report<S: Storage>(storage: &S, path: &str, outcome: &CheckOutcome) -> Result<String> {
    let data = render_csv(outcome)?;
    tracing::debug!("Writing report ({} bytes) to {}", data.len(), path);
    storage.write_file(path, &data).await?;
    Ok(path.to_string())
}

/// Human readable totals for the end of a run.
pub fn summary_lines(outcome: &CheckOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "Checked {} object(s), {} datastream version(s)",
        outcome.objects,
        outcome.checks.len()
    )];
    let counted = [
        (ChecksumStatus::Invalid, "invalid checksum(s)"),
        (ChecksumStatus::Missing, "datastream(s) without a checksum"),
        (ChecksumStatus::Repaired, "checksum(s) repaired"),
        (ChecksumStatus::WouldRepair, "checksum(s) would be repaired"),
        (ChecksumStatus::Skipped, "datastream(s) skipped"),
        (ChecksumStatus::Failed, "repair(s) failed"),
    ];
    for (status, label) in counted {
        let n = outcome.count(status);
        if n > 0 {
            lines.push(format!("Found {} {}", n, label));
        }
    }
    if !outcome.failures.is_empty() {
        lines.push(format!(
            "{} object(s) could not be processed",
            outcome.failures.len()
        ));
    }
    lines
}

/// Last-run time stored by a previous successful run, if any.
pub async fn read_timestamp<S: Storage>(storage: &S, path: &str) -> Result<Option<DateTime<Utc>>> {
    if !storage.exists(path).await {
        return Ok(None);
    }
    let data = storage.read_file(path).await?;
    let text = String::from_utf8_lossy(&data);
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse_fedora_time(&text).map(Some)
}

pub async fn write_timestamp<S: Storage>(storage: &S, path: &str, when: &DateTime<Utc>) -> Result<()> {
    let line = format!("{}\n", format_fedora_time(when));
    storage.write_file(path, line.as_bytes()).await
}

/// Record `started` as the next cutoff, unless some objects could not be
/// processed; those must be picked up again by the next incremental run.
pub async fn record_run<S: Storage>(
    storage: &S,
    path: &str,
    started: &DateTime<Utc>,
    outcome: &CheckOutcome,
) -> Result<bool> {
    if !outcome.failures.is_empty() {
        tracing::warn!(
            "⚠️ {} object(s) failed; keeping the previous cutoff in {}",
            outcome.failures.len(),
            path
        );
        return Ok(false);
    }
    write_timestamp(storage, path, started).await?;
    Ok(true)
}
