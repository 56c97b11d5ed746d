//! Fedora timestamps are UTC with millisecond precision, e.g.
//! `2011-03-04T12:00:00.123Z`. Older servers drop the fraction or use
//! fewer digits, so parsing is lenient while formatting is exact.

use crate::utils::error::{FedoraError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

pub fn format_fedora_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_fedora_time(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    // 無時區資訊時視為 UTC
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(FedoraError::InvalidDate {
        value: value.to_string(),
    })
}

/// 命令列的 `--since` 可以是完整時間或單純日期
pub fn parse_since(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    parse_fedora_time(value)
}
