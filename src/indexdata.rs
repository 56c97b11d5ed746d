//! Documents for feeding repository objects to a search index.

use crate::domain::model::ObjectProfile;
use crate::models::Datastream;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexData {
    pub pid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub owner: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub content_model: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    pub dsids: Vec<String>,
    pub relations: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl IndexData {
    pub fn new(
        profile: &ObjectProfile,
        dsids: Vec<String>,
        relations: BTreeMap<String, Vec<String>>,
    ) -> Self {
        Self {
            pid: profile.pid.clone(),
            label: profile.label.clone(),
            owner: profile.owner_ids.clone(),
            state: profile.state.map(|s| s.code().to_string()),
            content_model: profile.models.clone(),
            created: profile.created,
            last_modified: profile.last_modified,
            dsids,
            relations,
            text: None,
        }
    }

    pub fn with_text(mut self, text: String) -> Self {
        let trimmed = text.trim();
        self.text = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Text for indexing from a datastream, when its MIME type has any.
pub async fn datastream_text(ds: &Datastream) -> Result<Option<String>> {
    let mime = ds.profile().await?.mime_type.clone().unwrap_or_default();
    if mime.starts_with("text/") || mime == "application/xml" {
        let content = ds.content().await?;
        return Ok(Some(String::from_utf8_lossy(&content).into_owned()));
    }
    #[cfg(feature = "indexdata")]
    {
        if mime == "application/pdf" {
            let content = ds.content().await?;
            return pdf_to_text(&content).map(Some);
        }
    }
    tracing::debug!("No text extraction for {}/{} ({})", ds.pid(), ds.dsid(), mime);
    Ok(None)
}

/// 擷取 PDF 每一頁的文字
#[cfg(feature = "indexdata")]
pub fn pdf_to_text(data: &[u8]) -> Result<String> {
    let document = lopdf::Document::load_mem(data)?;
    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }
    Ok(document.extract_text(&pages)?)
}
