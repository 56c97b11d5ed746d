//! Object-level access on top of the REST client.
//!
//! Profiles are fetched lazily and cached for the life of the value, so a
//! `DigitalObject` reflects the repository as of its first lookup.

use crate::api::{DatastreamOptions, RestApi};
use crate::checksum::{self, ChecksumType};
use crate::domain::model::{
    ChecksumStatus, ControlGroup, DatastreamEntry, DatastreamProfile, ObjectProfile, ObjectState,
};
use crate::indexdata::IndexData;
use crate::rdf::{self, Graph, Term};
use crate::utils::error::{FedoraError, Result};
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;

pub const RELS_EXT: &str = "RELS-EXT";

#[derive(Debug)]
pub struct DigitalObject {
    api: RestApi,
    pid: String,
    profile: OnceCell<ObjectProfile>,
    datastreams: OnceCell<Vec<DatastreamEntry>>,
}

impl DigitalObject {
    pub fn new(api: RestApi, pid: &str) -> Self {
        Self {
            api,
            pid: pid.to_string(),
            profile: OnceCell::new(),
            datastreams: OnceCell::new(),
        }
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn uri(&self) -> String {
        rdf::pid_to_uri(&self.pid)
    }

    pub async fn profile(&self) -> Result<&ObjectProfile> {
        self.profile
            .get_or_try_init(|| self.api.get_object_profile(&self.pid, None))
            .await
    }

    pub async fn exists(&self) -> Result<bool> {
        match self.profile().await {
            Ok(_) => Ok(true),
            Err(FedoraError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn label(&self) -> Result<Option<String>> {
        Ok(self.profile().await?.label.clone())
    }

    pub async fn owner_ids(&self) -> Result<Vec<String>> {
        Ok(self.profile().await?.owner_ids.clone())
    }

    pub async fn state(&self) -> Result<Option<ObjectState>> {
        Ok(self.profile().await?.state)
    }

    pub async fn created(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.profile().await?.created)
    }

    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.profile().await?.last_modified)
    }

    pub async fn content_models(&self) -> Result<Vec<String>> {
        Ok(self.profile().await?.models.clone())
    }

    pub async fn has_model(&self, model: &str) -> Result<bool> {
        let uri = rdf::pid_to_uri(model);
        Ok(self.profile().await?.models.iter().any(|m| *m == uri))
    }

    pub async fn history(&self) -> Result<Vec<DateTime<Utc>>> {
        self.api.get_object_history(&self.pid).await
    }

    pub async fn datastream_list(&self) -> Result<&[DatastreamEntry]> {
        let list = self
            .datastreams
            .get_or_try_init(|| self.api.list_datastreams(&self.pid, None))
            .await?;
        Ok(list.as_slice())
    }

    pub async fn dsids(&self) -> Result<Vec<String>> {
        Ok(self
            .datastream_list()
            .await?
            .iter()
            .map(|ds| ds.dsid.clone())
            .collect())
    }

    pub fn datastream(&self, dsid: &str) -> Datastream {
        Datastream::new(self.api.clone(), &self.pid, dsid)
    }

    /// RELS-EXT 關係圖；物件沒有 RELS-EXT 時回傳 None
    pub async fn rels_ext(&self) -> Result<Option<Graph>> {
        if !self.dsids().await?.iter().any(|d| d == RELS_EXT) {
            return Ok(None);
        }
        let content = self.datastream(RELS_EXT).content().await?;
        let text = String::from_utf8_lossy(&content);
        Graph::parse_rdf_xml(&text).map(Some)
    }

    pub async fn save_rels_ext(&self, graph: &Graph, log_message: Option<&str>) -> Result<()> {
        let content = graph.to_rdf_xml()?.into_bytes();
        let options = DatastreamOptions {
            label: Some("External Relations".to_string()),
            mime_type: Some("application/rdf+xml".to_string()),
            format_uri: Some("info:fedora/fedora-system:FedoraRELSExt-1.0".to_string()),
            checksum_type: Some(ChecksumType::Md5),
            log_message: log_message.map(str::to_string),
            ..Default::default()
        };
        if self.dsids().await?.iter().any(|d| d == RELS_EXT) {
            self.api
                .modify_datastream(&self.pid, RELS_EXT, &options, Some(content))
                .await
        } else {
            let options = DatastreamOptions {
                control_group: Some(ControlGroup::InlineXml),
                ..options
            };
            self.api
                .add_datastream(&self.pid, RELS_EXT, &options, Some(content))
                .await
        }
    }

    /// Add a relation to RELS-EXT, creating it if needed.
    pub async fn add_relationship(&self, predicate: &str, object: Term) -> Result<()> {
        let mut graph = self.rels_ext().await?.unwrap_or_default();
        graph.add(Term::Uri(self.uri()), predicate, object);
        self.save_rels_ext(&graph, Some("add relationship")).await
    }

    pub async fn index_data(&self) -> Result<IndexData> {
        let profile = self.profile().await?;
        let dsids = self.dsids().await?;
        let relations = match self.rels_ext().await? {
            Some(graph) => graph.relations(&Term::Uri(self.uri())),
            None => Default::default(),
        };
        Ok(IndexData::new(profile, dsids, relations))
    }
}

#[derive(Debug)]
pub struct Datastream {
    api: RestApi,
    pid: String,
    dsid: String,
    as_of: Option<DateTime<Utc>>,
    profile: OnceCell<DatastreamProfile>,
}

impl Datastream {
    pub fn new(api: RestApi, pid: &str, dsid: &str) -> Self {
        Self {
            api,
            pid: pid.to_string(),
            dsid: dsid.to_string(),
            as_of: None,
            profile: OnceCell::new(),
        }
    }

    /// The version of this datastream current at `as_of`.
    pub fn at_version(&self, as_of: DateTime<Utc>) -> Self {
        Self {
            api: self.api.clone(),
            pid: self.pid.clone(),
            dsid: self.dsid.clone(),
            as_of: Some(as_of),
            profile: OnceCell::new(),
        }
    }

    pub fn pid(&self) -> &str {
        &self.pid
    }

    pub fn dsid(&self) -> &str {
        &self.dsid
    }

    pub fn as_of(&self) -> Option<&DateTime<Utc>> {
        self.as_of.as_ref()
    }

    pub async fn profile(&self) -> Result<&DatastreamProfile> {
        self.profile
            .get_or_try_init(|| {
                self.api
                    .get_datastream(&self.pid, &self.dsid, self.as_of.as_ref(), false)
            })
            .await
    }

    /// Fresh profile with Fedora's own checksum verdict.
    pub async fn validate_checksum(&self) -> Result<DatastreamProfile> {
        self.api
            .compare_datastream_checksum(&self.pid, &self.dsid, self.as_of.as_ref())
            .await
    }

    pub async fn checksum_status(&self) -> Result<(DatastreamProfile, ChecksumStatus)> {
        let profile = self.validate_checksum().await?;
        let status = checksum_status(&profile);
        Ok((profile, status))
    }

    pub async fn content(&self) -> Result<Vec<u8>> {
        self.api
            .get_datastream_dissemination(&self.pid, &self.dsid, self.as_of.as_ref())
            .await
    }

    pub async fn history(&self) -> Result<Vec<DatastreamProfile>> {
        self.api.get_datastream_history(&self.pid, &self.dsid).await
    }

    /// 下載內容並在本地比對 checksum；沒有 checksum 時回傳 None
    pub async fn verify_content(&self) -> Result<Option<bool>> {
        let profile = self.profile().await?;
        if !profile.has_checksum() {
            return Ok(None);
        }
        let Some(expected) = profile.checksum.as_deref() else {
            return Ok(None);
        };
        let content = self.content().await?;
        let actual = checksum::digest_bytes(profile.checksum_type, &content).unwrap_or_default();
        let matches = checksum::checksums_match(expected, &actual);
        if !matches {
            tracing::warn!(
                "❌ {}/{} content digest {} does not match recorded {}",
                self.pid,
                self.dsid,
                actual,
                expected
            );
        }
        Ok(Some(matches))
    }

    /// Have Fedora (re)compute this datastream's checksum with `kind`.
    pub async fn set_checksum_type(&self, kind: ChecksumType, log_message: Option<&str>) -> Result<()> {
        let options = DatastreamOptions {
            checksum_type: Some(kind),
            log_message: log_message.map(str::to_string),
            ..Default::default()
        };
        self.api
            .modify_datastream(&self.pid, &self.dsid, &options, None)
            .await
    }
}

/// Classify a profile fetched with `validateChecksum=true`.
pub fn checksum_status(profile: &DatastreamProfile) -> ChecksumStatus {
    if !profile.has_checksum() {
        ChecksumStatus::Missing
    } else if profile.checksum_valid == Some(false) {
        ChecksumStatus::Invalid
    } else {
        ChecksumStatus::Valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn profile_with(kind: ChecksumType, sum: Option<&str>, valid: Option<bool>) -> DatastreamProfile {
        DatastreamProfile {
            dsid: "DC".to_string(),
            label: None,
            version_id: None,
            created: None,
            state: None,
            mime_type: None,
            format_uri: None,
            control_group: Some(ControlGroup::InlineXml),
            size: None,
            versionable: true,
            location: None,
            checksum_type: kind,
            checksum: sum.map(str::to_string),
            checksum_valid: valid,
            alt_ids: vec![],
        }
    }

    #[test]
    fn test_checksum_status_classification() {
        assert_eq!(
            checksum_status(&profile_with(ChecksumType::Md5, Some("abc"), Some(true))),
            ChecksumStatus::Valid
        );
        assert_eq!(
            checksum_status(&profile_with(ChecksumType::Md5, Some("abc"), Some(false))),
            ChecksumStatus::Invalid
        );
        assert_eq!(
            checksum_status(&profile_with(ChecksumType::Disabled, Some("none"), None)),
            ChecksumStatus::Missing
        );
        assert_eq!(
            checksum_status(&profile_with(ChecksumType::Md5, Some("none"), Some(true))),
            ChecksumStatus::Missing
        );
    }

    #[tokio::test]
    async fn test_profile_is_cached() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:1");
            then.status(200).body(
                r#"<objectProfile pid="demo:1"><objLabel>Cached</objLabel><objModels><model>info:fedora/demo:CModel</model></objModels></objectProfile>"#,
            );
        });

        let obj = DigitalObject::new(RestApi::new(&server.url("/fedora/")).unwrap(), "demo:1");
        assert_eq!(obj.label().await.unwrap().as_deref(), Some("Cached"));
        assert!(obj.has_model("demo:CModel").await.unwrap());
        assert!(obj.exists().await.unwrap());
        assert!(obj.owner_ids().await.unwrap().is_empty());

        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn test_verify_content_detects_corruption() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects/demo:1/datastreams/TEXT")
                .query_param("format", "xml");
            then.status(200).body(
                r#"<datastreamProfile pid="demo:1" dsID="TEXT"><dsControlGroup>M</dsControlGroup><dsChecksumType>MD5</dsChecksumType><dsChecksum>b1946ac92492d2347c6235b4d2611184</dsChecksum></datastreamProfile>"#,
            );
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects/demo:1/datastreams/TEXT/content");
            then.status(200).body("hello, world\n");
        });

        let ds = Datastream::new(RestApi::new(&server.url("/fedora/")).unwrap(), "demo:1", "TEXT");
        assert_eq!(ds.verify_content().await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn test_rels_ext_absent() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:1/datastreams");
            then.status(200).body(
                r#"<objectDatastreams pid="demo:1"><datastream dsid="DC" label="Dublin Core" mimeType="text/xml"/></objectDatastreams>"#,
            );
        });

        let obj = DigitalObject::new(RestApi::new(&server.url("/fedora/")).unwrap(), "demo:1");
        assert_eq!(obj.dsids().await.unwrap(), vec!["DC"]);
        assert!(obj.rels_ext().await.unwrap().is_none());
    }
    #[tokio::test]
    async fn test_index_data_collects_relations() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:7");
            then.status(200).body(
                r#"<objectProfile pid="demo:7"><objLabel>Letters</objLabel><objOwnerId>archivist</objOwnerId><objState>A</objState><objModels><model>info:fedora/demo:CModel</model></objModels></objectProfile>"#,
            );
        });
        server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:7/datastreams");
            then.status(200).body(
                r#"<objectDatastreams pid="demo:7"><datastream dsid="DC" label="Dublin Core" mimeType="text/xml"/><datastream dsid="RELS-EXT" label="Relationships" mimeType="application/rdf+xml"/></objectDatastreams>"#,
            );
        });
        let rels = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects/demo:7/datastreams/RELS-EXT/content");
            then.status(200).body(
                r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:rel="info:fedora/fedora-system:def/relations-external#">
  <rdf:Description rdf:about="info:fedora/demo:7">
    <rel:isMemberOfCollection rdf:resource="info:fedora/demo:collection"/>
  </rdf:Description>
</rdf:RDF>"#,
            );
        });

        let obj = DigitalObject::new(RestApi::new(&server.url("/fedora/")).unwrap(), "demo:7");
        let data = obj.index_data().await.unwrap();

        rels.assert();
        assert_eq!(data.pid, "demo:7");
        assert_eq!(data.label.as_deref(), Some("Letters"));
        assert_eq!(data.owner, vec!["archivist"]);
        assert_eq!(data.dsids, vec!["DC", "RELS-EXT"]);
        assert_eq!(
            data.relations.get(rdf::IS_MEMBER_OF_COLLECTION),
            Some(&vec!["info:fedora/demo:collection".to_string()])
        );
    }
}
