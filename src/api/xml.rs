//! Data binding for the XML documents the Fedora REST API returns.
//!
//! Every text field defaults to an empty string; empty means "absent" once
//! converted into the domain types.

use crate::checksum::ChecksumType;
use crate::domain::model::{
    ControlGroup, DatastreamEntry, DatastreamProfile, ObjectProfile, ObjectState, SearchPage,
};
use crate::utils::error::Result;
use crate::utils::time::parse_fedora_time;
use chrono::{DateTime, Utc};
use serde::Deserialize;

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn optional_time(value: &str) -> Result<Option<DateTime<Utc>>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_fedora_time(value).map(Some)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct ObjectProfileXml {
    #[serde(rename = "@pid", default)]
    pid: String,
    #[serde(rename = "objLabel", default)]
    label: String,
    #[serde(rename = "objOwnerId", default)]
    owner_id: String,
    #[serde(rename = "objModels", default)]
    models: ModelsXml,
    #[serde(rename = "objCreateDate", default)]
    created: String,
    #[serde(rename = "objLastModDate", default)]
    last_modified: String,
    #[serde(rename = "objState", default)]
    state: String,
}

#[derive(Debug, Default, Deserialize)]
struct ModelsXml {
    #[serde(rename = "model", default)]
    models: Vec<String>,
}

pub fn parse_object_profile(xml: &str) -> Result<ObjectProfile> {
    let raw: ObjectProfileXml = quick_xml::de::from_str(xml)?;
    Ok(ObjectProfile {
        pid: raw.pid,
        label: non_empty(raw.label),
        // 多個擁有者以逗號分隔
        owner_ids: raw
            .owner_id
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        models: raw
            .models
            .models
            .into_iter()
            .filter_map(non_empty)
            .collect(),
        created: optional_time(&raw.created)?,
        last_modified: optional_time(&raw.last_modified)?,
        state: ObjectState::from_code(&raw.state),
    })
}

#[derive(Debug, Deserialize)]
struct ObjectDatastreamsXml {
    #[serde(rename = "datastream", default)]
    datastreams: Vec<DatastreamEntryXml>,
}

#[derive(Debug, Deserialize)]
struct DatastreamEntryXml {
    #[serde(rename = "@dsid")]
    dsid: String,
    #[serde(rename = "@label", default)]
    label: String,
    #[serde(rename = "@mimeType", default)]
    mime_type: String,
}

pub fn parse_datastream_list(xml: &str) -> Result<Vec<DatastreamEntry>> {
    let raw: ObjectDatastreamsXml = quick_xml::de::from_str(xml)?;
    Ok(raw
        .datastreams
        .into_iter()
        .map(|ds| DatastreamEntry {
            dsid: ds.dsid,
            label: non_empty(ds.label),
            mime_type: non_empty(ds.mime_type),
        })
        .collect())
}

#[derive(Debug, Deserialize)]
struct DatastreamProfileXml {
    #[serde(rename = "@dsID", default)]
    dsid: String,
    #[serde(rename = "dsLabel", default)]
    label: String,
    #[serde(rename = "dsVersionID", default)]
    version_id: String,
    #[serde(rename = "dsCreateDate", default)]
    created: String,
    #[serde(rename = "dsState", default)]
    state: String,
    #[serde(rename = "dsMIME", default)]
    mime_type: String,
    #[serde(rename = "dsFormatURI", default)]
    format_uri: String,
    #[serde(rename = "dsControlGroup", default)]
    control_group: String,
    #[serde(rename = "dsSize", default)]
    size: String,
    #[serde(rename = "dsVersionable", default)]
    versionable: String,
    #[serde(rename = "dsLocation", default)]
    location: String,
    #[serde(rename = "dsChecksumType", default)]
    checksum_type: String,
    #[serde(rename = "dsChecksum", default)]
    checksum: String,
    #[serde(rename = "dsChecksumValid", default)]
    checksum_valid: String,
    #[serde(rename = "dsAltID", default)]
    alt_ids: Vec<String>,
}

impl DatastreamProfileXml {
    fn into_profile(self, fallback_dsid: &str) -> Result<DatastreamProfile> {
        let dsid = if self.dsid.is_empty() {
            fallback_dsid.to_string()
        } else {
            self.dsid
        };
        Ok(DatastreamProfile {
            dsid,
            label: non_empty(self.label),
            version_id: non_empty(self.version_id),
            created: optional_time(&self.created)?,
            state: ObjectState::from_code(&self.state),
            mime_type: non_empty(self.mime_type),
            format_uri: non_empty(self.format_uri),
            control_group: ControlGroup::from_code(&self.control_group),
            size: self.size.trim().parse().ok(),
            // Fedora 預設為可版本化
            versionable: parse_bool(&self.versionable).unwrap_or(true),
            location: non_empty(self.location),
            checksum_type: self.checksum_type.parse().unwrap_or(ChecksumType::Disabled),
            checksum: non_empty(self.checksum),
            checksum_valid: parse_bool(&self.checksum_valid),
            alt_ids: self.alt_ids.into_iter().filter_map(non_empty).collect(),
        })
    }
}

pub fn parse_datastream_profile(xml: &str, dsid: &str) -> Result<DatastreamProfile> {
    let raw: DatastreamProfileXml = quick_xml::de::from_str(xml)?;
    raw.into_profile(dsid)
}

#[derive(Debug, Deserialize)]
struct DatastreamHistoryXml {
    #[serde(rename = "datastreamProfile", default)]
    versions: Vec<DatastreamProfileXml>,
}

/// Versions newest first, the order Fedora returns them in.
pub fn parse_datastream_history(xml: &str, dsid: &str) -> Result<Vec<DatastreamProfile>> {
    let raw: DatastreamHistoryXml = quick_xml::de::from_str(xml)?;
    raw.versions
        .into_iter()
        .map(|v| v.into_profile(dsid))
        .collect()
}

#[derive(Debug, Deserialize)]
struct ObjectHistoryXml {
    #[serde(rename = "objectChangeDate", default)]
    changes: Vec<String>,
}

pub fn parse_object_history(xml: &str) -> Result<Vec<DateTime<Utc>>> {
    let raw: ObjectHistoryXml = quick_xml::de::from_str(xml)?;
    raw.changes.iter().map(|c| parse_fedora_time(c)).collect()
}

#[derive(Debug, Deserialize)]
struct SearchResultsXml {
    #[serde(rename = "listSession", default)]
    list_session: Option<ListSessionXml>,
    #[serde(rename = "resultList", default)]
    result_list: ResultListXml,
}

#[derive(Debug, Default, Deserialize)]
struct ListSessionXml {
    #[serde(default)]
    token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ResultListXml {
    #[serde(rename = "objectFields", default)]
    object_fields: Vec<ObjectFieldsXml>,
}

#[derive(Debug, Deserialize)]
struct ObjectFieldsXml {
    #[serde(default)]
    pid: String,
}

pub fn parse_search_results(xml: &str) -> Result<SearchPage> {
    let raw: SearchResultsXml = quick_xml::de::from_str(xml)?;
    Ok(SearchPage {
        pids: raw
            .result_list
            .object_fields
            .into_iter()
            .filter_map(|f| non_empty(f.pid))
            .collect(),
        session_token: raw.list_session.and_then(|s| non_empty(s.token)),
    })
}

#[derive(Debug, Deserialize)]
struct PidListXml {
    #[serde(rename = "pid", default)]
    pids: Vec<String>,
}

pub fn parse_pid_list(xml: &str) -> Result<Vec<String>> {
    let raw: PidListXml = quick_xml::de::from_str(xml)?;
    Ok(raw.pids.into_iter().filter_map(non_empty).collect())
}
