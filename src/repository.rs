use crate::api::{FindQuery, ResourceIndex, RestApi};
use crate::domain::ports::ConfigProvider;
use crate::models::DigitalObject;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

/// Entry point for working with a Fedora repository.
#[derive(Debug, Clone)]
pub struct Repository {
    api: RestApi,
    risearch: ResourceIndex,
}

impl Repository {
    pub fn new(api: RestApi) -> Self {
        let risearch = ResourceIndex::new(api.clone());
        Self { api, risearch }
    }

    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        Ok(Self::new(RestApi::from_config(config)?))
    }

    pub fn api(&self) -> &RestApi {
        &self.api
    }

    pub fn risearch(&self) -> &ResourceIndex {
        &self.risearch
    }

    pub fn get_object(&self, pid: &str) -> DigitalObject {
        DigitalObject::new(self.api.clone(), pid)
    }

    /// 依序取得所有分頁結果，直到沒有 session token 或達到上限
    pub async fn find_objects(&self, query: &FindQuery, limit: Option<usize>) -> Result<Vec<String>> {
        let mut pids = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self
                .api
                .find_objects(query, limit, token.as_deref())
                .await?;
            pids.extend(page.pids);
            if let Some(max) = limit {
                if pids.len() >= max {
                    pids.truncate(max);
                    break;
                }
            }
            match page.session_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }
        tracing::debug!("findObjects returned {} pid(s)", pids.len());
        Ok(pids)
    }

    /// All object pids known to the Resource Index.
    pub async fn object_pids(&self, since: Option<&DateTime<Utc>>, limit: Option<usize>) -> Result<Vec<String>> {
        self.risearch.object_pids(since, limit).await
    }

    pub async fn ingest(&self, foxml: &str, log_message: Option<&str>) -> Result<DigitalObject> {
        let pid = self.api.ingest(foxml, None, log_message).await?;
        Ok(self.get_object(&pid))
    }

    pub async fn purge_object(&self, pid: &str, log_message: Option<&str>) -> Result<()> {
        self.api.purge_object(pid, log_message).await
    }

    pub async fn get_next_pid(&self, namespace: Option<&str>, count: usize) -> Result<Vec<String>> {
        self.api.get_next_pid(namespace, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::prelude::HttpMockRequest;

    fn has_session_token(req: &HttpMockRequest) -> bool {
        req.query_params
            .as_ref()
            .map_or(false, |params| params.iter().any(|(k, _)| k == "sessionToken"))
    }

    #[tokio::test]
    async fn test_find_objects_follows_session_token() {
        let server = MockServer::start();
        let first = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects")
                .query_param("terms", "demo*")
                .matches(|req| !has_session_token(req));
            then.status(200).body(
                r#"<result><listSession><token>abc</token></listSession><resultList><objectFields><pid>demo:1</pid></objectFields><objectFields><pid>demo:2</pid></objectFields></resultList></result>"#,
            );
        });
        let second = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects")
                .query_param("terms", "demo*")
                .query_param("sessionToken", "abc");
            then.status(200).body(
                r#"<result><resultList><objectFields><pid>demo:3</pid></objectFields></resultList></result>"#,
            );
        });

        let repository = Repository::new(RestApi::new(&server.url("/fedora/")).unwrap());
        let pids = repository
            .find_objects(&FindQuery::Terms("demo*".to_string()), None)
            .await
            .unwrap();

        first.assert_hits(1);
        second.assert_hits(1);
        assert_eq!(pids, vec!["demo:1", "demo:2", "demo:3"]);
    }

    #[tokio::test]
    async fn test_find_objects_stops_at_limit() {
        let server = MockServer::start();
        let page = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/objects")
                .query_param("maxResults", "2");
            then.status(200).body(
                r#"<result><listSession><token>more</token></listSession><resultList><objectFields><pid>demo:1</pid></objectFields><objectFields><pid>demo:2</pid></objectFields></resultList></result>"#,
            );
        });

        let repository = Repository::new(RestApi::new(&server.url("/fedora/")).unwrap());
        let pids = repository
            .find_objects(&FindQuery::Query("pid~demo:*".to_string()), Some(2))
            .await
            .unwrap();

        page.assert_hits(1);
        assert_eq!(pids, vec!["demo:1", "demo:2"]);
    }
}
