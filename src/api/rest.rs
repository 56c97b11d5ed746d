use crate::api::xml;
use crate::checksum::{self, ChecksumType};
use crate::domain::model::{
    ControlGroup, DatastreamEntry, DatastreamProfile, ObjectProfile, ObjectState, SearchPage,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{FedoraError, Result};
use crate::utils::time::format_fedora_time;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use url::Url;

type Query = Vec<(&'static str, String)>;

/// Search criteria for `findObjects`.
#[derive(Debug, Clone)]
pub enum FindQuery {
    /// 關鍵字搜尋，例如 `demo*`
    Terms(String),
    /// 欄位條件，例如 `pid~demo:* state=A`
    Query(String),
}

/// Optional settings for `addDatastream` / `modifyDatastream`.
#[derive(Debug, Clone, Default)]
pub struct DatastreamOptions {
    pub label: Option<String>,
    pub mime_type: Option<String>,
    pub control_group: Option<ControlGroup>,
    pub checksum_type: Option<ChecksumType>,
    pub checksum: Option<String>,
    pub state: Option<ObjectState>,
    pub versionable: Option<bool>,
    pub format_uri: Option<String>,
    pub location: Option<String>,
    pub alt_ids: Vec<String>,
    pub log_message: Option<String>,
}

impl DatastreamOptions {
    fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(label) = &self.label {
            query.push(("dsLabel", label.clone()));
        }
        if let Some(mime) = &self.mime_type {
            query.push(("mimeType", mime.clone()));
        }
        if let Some(group) = self.control_group {
            query.push(("controlGroup", group.code().to_string()));
        }
        if let Some(kind) = self.checksum_type {
            query.push(("checksumType", kind.as_str().to_string()));
        }
        if let Some(sum) = &self.checksum {
            query.push(("checksum", sum.clone()));
        }
        if let Some(state) = self.state {
            query.push(("dsState", state.code().to_string()));
        }
        if let Some(versionable) = self.versionable {
            query.push(("versionable", versionable.to_string()));
        }
        if let Some(format) = &self.format_uri {
            query.push(("formatURI", format.clone()));
        }
        if let Some(location) = &self.location {
            query.push(("dsLocation", location.clone()));
        }
        for alt in &self.alt_ids {
            query.push(("altIDs", alt.clone()));
        }
        if let Some(message) = &self.log_message {
            query.push(("logMessage", message.clone()));
        }
        query
    }
}

/// Client for the Fedora 3 REST API.
#[derive(Debug, Clone)]
pub struct RestApi {
    client: Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl RestApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(base_url, Client::new())
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let mut api = Self::build(config.fedora_root(), client)?;
        api.username = config.fedora_user().map(str::to_string);
        api.password = config.fedora_password().map(str::to_string);
        api.retry_attempts = config.retry_attempts();
        api.retry_delay = config.retry_delay();
        Ok(api)
    }

    fn build(base_url: &str, client: Client) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| FedoraError::InvalidConfigValueError {
            field: "fedora.root".to_string(),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(FedoraError::InvalidConfigValueError {
                field: "fedora.root".to_string(),
                value: base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            base,
            username: None,
            password: None,
            retry_attempts: 0,
            retry_delay: Duration::from_millis(500),
        })
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(username.to_string());
        self.password = Some(password.to_string());
        self
    }

    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url, query: &Query) -> RequestBuilder {
        let mut request = self.client.request(method, url).query(query);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_ref());
        }
        request
    }

    /// 送出請求並把 HTTP 狀態轉換為錯誤
    async fn send(&self, request: RequestBuilder, target: &Target<'_>) -> Result<Response> {
        let response = request.send().await?;
        check_status(response, target).await
    }

    /// GET with retries on connection errors and 5xx responses.
    pub(crate) async fn get(&self, segments: &[&str], query: Query, target: &Target<'_>) -> Result<Response> {
        let url = self.url(segments);
        let mut attempt = 0u32;
        loop {
            tracing::debug!("GET {} (attempt {})", url, attempt + 1);
            let result = self.request(Method::GET, url.clone(), &query).send().await;
            let retryable = match &result {
                Ok(response) => response.status().is_server_error(),
                Err(e) => e.is_connect() || e.is_timeout(),
            };
            if retryable && attempt < self.retry_attempts {
                attempt += 1;
                tracing::warn!(
                    "⚠️ Request to {} failed, retrying in {:?} ({}/{})",
                    url,
                    self.retry_delay,
                    attempt,
                    self.retry_attempts
                );
                tokio::time::sleep(self.retry_delay).await;
                continue;
            }
            return check_status(result?, target).await;
        }
    }

    pub(crate) async fn get_text(&self, segments: &[&str], query: Query, target: &Target<'_>) -> Result<String> {
        Ok(self.get(segments, query, target).await?.text().await?)
    }

    // ---- API-A ----

    pub async fn find_objects(
        &self,
        query: &FindQuery,
        max_results: Option<usize>,
        session_token: Option<&str>,
    ) -> Result<SearchPage> {
        let mut params: Query = vec![("pid", "true".to_string()), ("resultFormat", "xml".to_string())];
        match query {
            FindQuery::Terms(terms) => params.push(("terms", terms.clone())),
            FindQuery::Query(q) => params.push(("query", q.clone())),
        }
        if let Some(max) = max_results {
            params.push(("maxResults", max.to_string()));
        }
        if let Some(token) = session_token {
            params.push(("sessionToken", token.to_string()));
        }
        let body = self.get_text(&["objects"], params, &Target::search()).await?;
        xml::parse_search_results(&body)
    }

    pub async fn get_object_profile(
        &self,
        pid: &str,
        as_of: Option<&DateTime<Utc>>,
    ) -> Result<ObjectProfile> {
        let mut params: Query = vec![("format", "xml".to_string())];
        push_as_of(&mut params, as_of);
        let body = self
            .get_text(&["objects", pid], params, &Target::object(pid))
            .await?;
        xml::parse_object_profile(&body)
    }

    pub async fn get_object_history(&self, pid: &str) -> Result<Vec<DateTime<Utc>>> {
        let params: Query = vec![("format", "xml".to_string())];
        let body = self
            .get_text(&["objects", pid, "versions"], params, &Target::object(pid))
            .await?;
        xml::parse_object_history(&body)
    }

    pub async fn get_object_xml(&self, pid: &str) -> Result<String> {
        self.get_text(&["objects", pid, "objectXML"], Query::new(), &Target::object(pid))
            .await
    }

    /// `format` 例如 `info:fedora/fedora-system:FOXML-1.1`，`context` 為 public/migrate/archive
    pub async fn export(&self, pid: &str, format: Option<&str>, context: Option<&str>) -> Result<String> {
        let mut params = Query::new();
        if let Some(format) = format {
            params.push(("format", format.to_string()));
        }
        if let Some(context) = context {
            params.push(("context", context.to_string()));
        }
        self.get_text(&["objects", pid, "export"], params, &Target::object(pid))
            .await
    }

    pub async fn list_datastreams(
        &self,
        pid: &str,
        as_of: Option<&DateTime<Utc>>,
    ) -> Result<Vec<DatastreamEntry>> {
        let mut params: Query = vec![("format", "xml".to_string())];
        push_as_of(&mut params, as_of);
        let body = self
            .get_text(&["objects", pid, "datastreams"], params, &Target::object(pid))
            .await?;
        xml::parse_datastream_list(&body)
    }

    pub async fn get_datastream(
        &self,
        pid: &str,
        dsid: &str,
        as_of: Option<&DateTime<Utc>>,
        validate_checksum: bool,
    ) -> Result<DatastreamProfile> {
        let mut params: Query = vec![("format", "xml".to_string())];
        push_as_of(&mut params, as_of);
        if validate_checksum {
            params.push(("validateChecksum", "true".to_string()));
        }
        let body = self
            .get_text(
                &["objects", pid, "datastreams", dsid],
                params,
                &Target::datastream(pid, dsid),
            )
            .await?;
        xml::parse_datastream_profile(&body, dsid)
    }

    /// Ask Fedora to recompute the stored checksum of one datastream version.
    pub async fn compare_datastream_checksum(
        &self,
        pid: &str,
        dsid: &str,
        as_of: Option<&DateTime<Utc>>,
    ) -> Result<DatastreamProfile> {
        self.get_datastream(pid, dsid, as_of, true).await
    }

    pub async fn get_datastream_history(&self, pid: &str, dsid: &str) -> Result<Vec<DatastreamProfile>> {
        let params: Query = vec![("format", "xml".to_string())];
        let body = self
            .get_text(
                &["objects", pid, "datastreams", dsid, "history"],
                params,
                &Target::datastream(pid, dsid),
            )
            .await?;
        xml::parse_datastream_history(&body, dsid)
    }

    pub async fn get_datastream_dissemination(
        &self,
        pid: &str,
        dsid: &str,
        as_of: Option<&DateTime<Utc>>,
    ) -> Result<Vec<u8>> {
        let mut params = Query::new();
        push_as_of(&mut params, as_of);
        let response = self
            .get(
                &["objects", pid, "datastreams", dsid, "content"],
                params,
                &Target::datastream(pid, dsid),
            )
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- API-M ----

    /// 若指定 checksum 類型但未提供值，會先在本地計算，讓 Fedora 驗證傳輸內容
    pub async fn add_datastream(
        &self,
        pid: &str,
        dsid: &str,
        options: &DatastreamOptions,
        content: Option<Vec<u8>>,
    ) -> Result<()> {
        let options = with_local_checksum(options, content.as_deref());
        self.write_datastream(Method::POST, pid, dsid, &options, content)
            .await?;
        tracing::info!("➕ Added datastream {}/{}", pid, dsid);
        Ok(())
    }

    pub async fn modify_datastream(
        &self,
        pid: &str,
        dsid: &str,
        options: &DatastreamOptions,
        content: Option<Vec<u8>>,
    ) -> Result<()> {
        let options = with_local_checksum(options, content.as_deref());
        self.write_datastream(Method::PUT, pid, dsid, &options, content)
            .await?;
        tracing::debug!("Modified datastream {}/{}", pid, dsid);
        Ok(())
    }

    async fn write_datastream(
        &self,
        method: Method,
        pid: &str,
        dsid: &str,
        options: &DatastreamOptions,
        content: Option<Vec<u8>>,
    ) -> Result<Response> {
        let url = self.url(&["objects", pid, "datastreams", dsid]);
        let mut request = self.request(method, url, &options.to_query());
        if let Some(bytes) = content {
            if let Some(mime) = &options.mime_type {
                request = request.header(reqwest::header::CONTENT_TYPE, mime.as_str());
            }
            request = request.body(bytes);
        }
        self.send(request, &Target::datastream(pid, dsid)).await
    }

    pub async fn purge_datastream(
        &self,
        pid: &str,
        dsid: &str,
        start: Option<&DateTime<Utc>>,
        end: Option<&DateTime<Utc>>,
        log_message: Option<&str>,
    ) -> Result<()> {
        let mut params = Query::new();
        if let Some(start) = start {
            params.push(("startDT", format_fedora_time(start)));
        }
        if let Some(end) = end {
            params.push(("endDT", format_fedora_time(end)));
        }
        if let Some(message) = log_message {
            params.push(("logMessage", message.to_string()));
        }
        let url = self.url(&["objects", pid, "datastreams", dsid]);
        let request = self.request(Method::DELETE, url, &params);
        self.send(request, &Target::datastream(pid, dsid)).await?;
        tracing::info!("🗑️ Purged datastream {}/{}", pid, dsid);
        Ok(())
    }

    /// Ingest a FOXML document; returns the pid Fedora assigned.
    pub async fn ingest(&self, foxml: &str, pid: Option<&str>, log_message: Option<&str>) -> Result<String> {
        let mut params = Query::new();
        if let Some(message) = log_message {
            params.push(("logMessage", message.to_string()));
        }
        let target_pid = pid.unwrap_or("new");
        let url = self.url(&["objects", target_pid]);
        let request = self
            .request(Method::POST, url, &params)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(foxml.to_string());
        let response = self.send(request, &Target::object(target_pid)).await?;
        let new_pid = response.text().await?.trim().to_string();
        tracing::info!("📥 Ingested {}", new_pid);
        Ok(new_pid)
    }

    pub async fn modify_object(
        &self,
        pid: &str,
        label: Option<&str>,
        owner_id: Option<&str>,
        state: Option<ObjectState>,
        log_message: Option<&str>,
    ) -> Result<()> {
        let mut params = Query::new();
        if let Some(label) = label {
            params.push(("label", label.to_string()));
        }
        if let Some(owner) = owner_id {
            params.push(("ownerId", owner.to_string()));
        }
        if let Some(state) = state {
            params.push(("state", state.code().to_string()));
        }
        if let Some(message) = log_message {
            params.push(("logMessage", message.to_string()));
        }
        let url = self.url(&["objects", pid]);
        let request = self.request(Method::PUT, url, &params);
        self.send(request, &Target::object(pid)).await?;
        Ok(())
    }

    pub async fn purge_object(&self, pid: &str, log_message: Option<&str>) -> Result<()> {
        let mut params = Query::new();
        if let Some(message) = log_message {
            params.push(("logMessage", message.to_string()));
        }
        let url = self.url(&["objects", pid]);
        let request = self.request(Method::DELETE, url, &params);
        self.send(request, &Target::object(pid)).await?;
        tracing::info!("🗑️ Purged object {}", pid);
        Ok(())
    }

    pub async fn get_next_pid(&self, namespace: Option<&str>, count: usize) -> Result<Vec<String>> {
        let mut params: Query = vec![
            ("numPIDs", count.to_string()),
            ("format", "xml".to_string()),
        ];
        if let Some(ns) = namespace {
            params.push(("namespace", ns.to_string()));
        }
        let url = self.url(&["objects", "nextPID"]);
        let request = self.request(Method::POST, url, &params);
        let response = self.send(request, &Target::search()).await?;
        xml::parse_pid_list(&response.text().await?)
    }

    /// Multipart upload; the returned `uploaded://` id can be used as a `dsLocation`.
    pub async fn upload(&self, data: Vec<u8>, filename: &str) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(data).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let url = self.url(&["upload"]);
        let request = self.request(Method::POST, url, &Query::new()).multipart(form);
        let response = self.send(request, &Target::search()).await?;
        Ok(response.text().await?.trim().to_string())
    }
}

fn push_as_of(params: &mut Query, as_of: Option<&DateTime<Utc>>) {
    if let Some(when) = as_of {
        params.push(("asOfDateTime", format_fedora_time(when)));
    }
}

fn with_local_checksum(options: &DatastreamOptions, content: Option<&[u8]>) -> DatastreamOptions {
    let mut options = options.clone();
    if options.checksum.is_none() {
        if let (Some(kind), Some(bytes)) = (options.checksum_type, content) {
            options.checksum = checksum::digest_bytes(kind, bytes);
        }
    }
    options
}

/// What a request was about, for error reporting.
pub(crate) struct Target<'a> {
    pid: Option<&'a str>,
    dsid: Option<&'a str>,
}

impl<'a> Target<'a> {
    pub(crate) fn search() -> Self {
        Self { pid: None, dsid: None }
    }

    pub(crate) fn object(pid: &'a str) -> Self {
        Self { pid: Some(pid), dsid: None }
    }

    pub(crate) fn datastream(pid: &'a str, dsid: &'a str) -> Self {
        Self {
            pid: Some(pid),
            dsid: Some(dsid),
        }
    }

    fn describe(&self) -> String {
        match (self.pid, self.dsid) {
            (Some(pid), Some(dsid)) => format!("{}/{}", pid, dsid),
            (Some(pid), None) => pid.to_string(),
            _ => "resource".to_string(),
        }
    }
}

async fn check_status(response: Response, target: &Target<'_>) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    tracing::debug!("Fedora returned {} for {}: {}", status, url, body.trim());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(FedoraError::PermissionDenied { url }),
        StatusCode::NOT_FOUND => Err(FedoraError::NotFound {
            what: target.describe(),
        }),
        StatusCode::INTERNAL_SERVER_ERROR if body.to_lowercase().contains("checksum mismatch") => {
            Err(FedoraError::ChecksumMismatch {
                pid: target.pid.unwrap_or_default().to_string(),
                dsid: target.dsid.unwrap_or_default().to_string(),
            })
        }
        _ => {
            let reason = body
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            Err(FedoraError::RequestFailed {
                status: status.as_u16(),
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use httpmock::prelude::*;

    const PROFILE: &str = r#"<objectProfile pid="demo:1"><objLabel>Demo</objLabel><objState>A</objState></objectProfile>"#;

    #[test]
    fn test_url_building_keeps_base_path() {
        let api = RestApi::new("http://localhost:8080/fedora").unwrap();
        assert_eq!(
            api.url(&["objects", "demo:1", "datastreams", "DC"]).as_str(),
            "http://localhost:8080/fedora/objects/demo:1/datastreams/DC"
        );
        assert!(RestApi::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_get_object_profile_with_auth() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects/demo:1")
                .query_param("format", "xml")
                .header_exists("authorization");
            then.status(200)
                .header("Content-Type", "text/xml")
                .body(PROFILE);
        });

        let api = RestApi::new(&server.url("/fedora/"))
            .unwrap()
            .with_credentials("fedoraAdmin", "secret");
        let profile = api.get_object_profile("demo:1", None).await.unwrap();

        mock.assert();
        assert_eq!(profile.label.as_deref(), Some("Demo"));
        assert_eq!(profile.state, Some(ObjectState::Active));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:missing");
            then.status(404).body("Object not found");
        });
        server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:locked");
            then.status(401);
        });

        let api = RestApi::new(&server.url("/fedora/")).unwrap();
        let missing = api.get_object_profile("demo:missing", None).await;
        assert!(matches!(missing, Err(FedoraError::NotFound { .. })));

        let locked = api.get_object_profile("demo:locked", None).await;
        assert!(matches!(locked, Err(FedoraError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn test_checksum_mismatch_on_add() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/fedora/objects/demo:1/datastreams/TEXT")
                .query_param("checksumType", "MD5")
                .query_param("checksum", "b1946ac92492d2347c6235b4d2611184");
            then.status(500)
                .body("Checksum Mismatch: b1946ac92492d2347c6235b4d2611184");
        });

        let api = RestApi::new(&server.url("/fedora/")).unwrap();
        let options = DatastreamOptions {
            checksum_type: Some(ChecksumType::Md5),
            control_group: Some(ControlGroup::Managed),
            mime_type: Some("text/plain".to_string()),
            ..Default::default()
        };
        let result = api
            .add_datastream("demo:1", "TEXT", &options, Some(b"hello\n".to_vec()))
            .await;

        mock.assert();
        assert!(matches!(result, Err(FedoraError::ChecksumMismatch { ref dsid, .. }) if dsid == "TEXT"));
    }

    #[tokio::test]
    async fn test_get_retries_server_errors() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:1");
            then.status(503).body("Service Unavailable");
        });

        let api = RestApi::new(&server.url("/fedora/"))
            .unwrap()
            .with_retries(2, Duration::from_millis(1));
        let result = api.get_object_profile("demo:1", None).await;

        mock.assert_hits(3);
        assert!(matches!(result, Err(FedoraError::RequestFailed { status: 503, .. })));
    }
    #[tokio::test]
    async fn test_object_lifecycle_calls() {
        let server = MockServer::start();
        let ingest = server.mock(|when, then| {
            when.method(POST)
                .path("/fedora/objects/new")
                .query_param("logMessage", "import")
                .body_contains("<foxml:digitalObject");
            then.status(201).body("demo:42\n");
        });
        let modify = server.mock(|when, then| {
            when.method(PUT)
                .path("/fedora/objects/demo:42")
                .query_param("label", "Renamed")
                .query_param("state", "I");
            then.status(200);
        });
        let purge = server.mock(|when, then| {
            when.method(DELETE)
                .path("/fedora/objects/demo:42")
                .query_param("logMessage", "cleanup");
            then.status(200);
        });

        let api = RestApi::new(&server.url("/fedora/")).unwrap();
        let pid = api
            .ingest(r#"<foxml:digitalObject VERSION="1.1"/>"#, None, Some("import"))
            .await
            .unwrap();
        assert_eq!(pid, "demo:42");
        api.modify_object(&pid, Some("Renamed"), None, Some(ObjectState::Inactive), None)
            .await
            .unwrap();
        api.purge_object(&pid, Some("cleanup")).await.unwrap();

        ingest.assert();
        modify.assert();
        purge.assert();
    }

    #[tokio::test]
    async fn test_purge_datastream_version_range() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/fedora/objects/demo:1/datastreams/OCR")
                .query_param("startDT", "2012-01-01T00:00:00.000Z")
                .query_param("endDT", "2013-01-01T00:00:00.000Z");
            then.status(200).body("[]");
        });

        let api = RestApi::new(&server.url("/fedora/")).unwrap();
        let start = Utc.with_ymd_and_hms(2012, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        api.purge_datastream("demo:1", "OCR", Some(&start), Some(&end), None)
            .await
            .unwrap();

        mock.assert();
    }

    #[tokio::test]
    async fn test_get_next_pid() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/fedora/objects/nextPID")
                .query_param("numPIDs", "2")
                .query_param("namespace", "demo")
                .query_param("format", "xml");
            then.status(200)
                .body(r#"<pidList><pid>demo:1</pid><pid>demo:2</pid></pidList>"#);
        });

        let api = RestApi::new(&server.url("/fedora/")).unwrap();
        let pids = api.get_next_pid(Some("demo"), 2).await.unwrap();

        mock.assert();
        assert_eq!(pids, vec!["demo:1", "demo:2"]);
    }

    #[tokio::test]
    async fn test_upload_is_multipart() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/fedora/upload")
                .body_contains("name=\"file\"")
                .body_contains("filename=\"scan.tif\"")
                .body_contains("image bytes");
            then.status(202).body("uploaded:///tmp/upload-1\n");
        });

        let api = RestApi::new(&server.url("/fedora/")).unwrap();
        let location = api
            .upload(b"image bytes".to_vec(), "scan.tif")
            .await
            .unwrap();

        mock.assert();
        assert_eq!(location, "uploaded:///tmp/upload-1");
    }

    #[tokio::test]
    async fn test_object_xml_export_and_history() {
        let server = MockServer::start();
        let object_xml = server.mock(|when, then| {
            when.method(GET).path("/fedora/objects/demo:1/objectXML");
            then.status(200).body("<foxml:digitalObject PID=\"demo:1\"/>");
        });
        let export = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects/demo:1/export")
                .query_param("format", "info:fedora/fedora-system:FOXML-1.1")
                .query_param("context", "archive");
            then.status(200).body("<foxml:digitalObject PID=\"demo:1\">archived</foxml:digitalObject>");
        });
        let versions = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects/demo:1/versions")
                .query_param("format", "xml");
            then.status(200).body(
                r#"<fedoraObjectHistory pid="demo:1"><objectChangeDate>2011-01-01T00:00:00.000Z</objectChangeDate><objectChangeDate>2012-06-15T12:30:00.000Z</objectChangeDate></fedoraObjectHistory>"#,
            );
        });

        let api = RestApi::new(&server.url("/fedora/")).unwrap();
        let xml = api.get_object_xml("demo:1").await.unwrap();
        assert!(xml.contains("PID=\"demo:1\""));

        let exported = api
            .export("demo:1", Some("info:fedora/fedora-system:FOXML-1.1"), Some("archive"))
            .await
            .unwrap();
        assert!(exported.contains("archived"));

        let history = api.get_object_history("demo:1").await.unwrap();
        assert_eq!(
            history,
            vec![
                Utc.with_ymd_and_hms(2011, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2012, 6, 15, 12, 30, 0).unwrap(),
            ]
        );

        object_xml.assert();
        export.assert();
        versions.assert();
    }
}
