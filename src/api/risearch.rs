use crate::api::rest::{RestApi, Target};
use crate::rdf::{self, Graph};
use crate::utils::error::{FedoraError, Result};
use crate::utils::time::format_fedora_time;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

const FEDORA_OBJECT_MODEL: &str = "info:fedora/fedora-system:FedoraObject-3.0";

/// Client for the Fedora Resource Index search endpoint (`risearch`).
#[derive(Debug, Clone)]
pub struct ResourceIndex {
    api: RestApi,
    flush: bool,
}

impl ResourceIndex {
    pub fn new(api: RestApi) -> Self {
        Self { api, flush: false }
    }

    /// 查詢前先要求 Fedora 將待寫入的三元組寫進索引
    pub fn with_flush(mut self, flush: bool) -> Self {
        self.flush = flush;
        self
    }

    fn base_params(&self, kind: &str, lang: &str, format: &str, query: &str) -> Vec<(&'static str, String)> {
        vec![
            ("type", kind.to_string()),
            ("lang", lang.to_string()),
            ("format", format.to_string()),
            ("query", query.to_string()),
            ("flush", self.flush.to_string()),
        ]
    }

    /// SPARQL tuple query; each row maps variable name to value.
    pub async fn sparql_query(&self, query: &str, limit: Option<usize>) -> Result<Vec<HashMap<String, String>>> {
        let mut params = self.base_params("tuples", "sparql", "CSV", query);
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        tracing::debug!("risearch sparql: {}", query);
        let body = self.api.get_text(&["risearch"], params, &Target::search()).await?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(body.as_bytes());
        let headers = reader.headers()?.clone();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }

    /// SPO pattern query, e.g. `<info:fedora/demo:1> * *`.
    pub async fn find_statements(&self, spo: &str, limit: Option<usize>) -> Result<Graph> {
        let mut params = self.base_params("triples", "spo", "N-Triples", spo);
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        let body = self.api.get_text(&["risearch"], params, &Target::search()).await?;
        Graph::parse_ntriples(&body)
    }

    pub async fn count_statements(&self, spo: &str) -> Result<u64> {
        let params = self.base_params("triples", "spo", "count", spo);
        let body = self.api.get_text(&["risearch"], params, &Target::search()).await?;
        body.trim().parse().map_err(|_| FedoraError::ProcessingError {
            message: format!("risearch returned a non-numeric count: {}", body.trim()),
        })
    }

    /// Pids of every object, optionally only those modified since `since`.
    pub async fn object_pids(&self, since: Option<&DateTime<Utc>>, limit: Option<usize>) -> Result<Vec<String>> {
        let query = object_pids_query(since);
        let rows = self.sparql_query(&query, limit).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove("pid"))
            .map(|uri| rdf::uri_to_pid(&uri).to_string())
            .collect())
    }

    /// Subjects that have the given predicate pointing at `object_uri`.
    pub async fn get_subjects(&self, predicate: &str, object_uri: &str) -> Result<Vec<String>> {
        let spo = format!("* <{}> <{}>", predicate, object_uri);
        let graph = self.find_statements(&spo, None).await?;
        Ok(graph
            .triples()
            .iter()
            .map(|t| t.subject.as_str().to_string())
            .collect())
    }
}

fn object_pids_query(since: Option<&DateTime<Utc>>) -> String {
    let mut query = format!(
        "SELECT ?pid WHERE {{ ?pid <{}> <{}> .",
        rdf::HAS_MODEL,
        FEDORA_OBJECT_MODEL
    );
    if let Some(since) = since {
        query.push_str(&format!(
            " ?pid <info:fedora/fedora-system:def/view#lastModifiedDate> ?modified . \
             FILTER (?modified >= \"{}\"^^<http://www.w3.org/2001/XMLSchema#dateTime>)",
            format_fedora_time(since)
        ));
    }
    query.push_str(" }");
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use httpmock::prelude::*;

    #[test]
    fn test_object_pids_query_with_since() {
        let since = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let query = object_pids_query(Some(&since));
        assert!(query.contains("lastModifiedDate"));
        assert!(query.contains("2024-01-02T03:04:05.000Z"));
        assert!(!object_pids_query(None).contains("FILTER"));
    }

    #[tokio::test]
    async fn test_object_pids_parses_csv() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/risearch")
                .query_param("type", "tuples")
                .query_param("lang", "sparql")
                .query_param("format", "CSV")
                .query_param("limit", "10");
            then.status(200)
                .header("Content-Type", "text/plain")
                .body("\"pid\"\ninfo:fedora/demo:1\ninfo:fedora/demo:2\n");
        });

        let index = ResourceIndex::new(RestApi::new(&server.url("/fedora/")).unwrap());
        let pids = index.object_pids(None, Some(10)).await.unwrap();

        mock.assert();
        assert_eq!(pids, vec!["demo:1", "demo:2"]);
    }

    #[tokio::test]
    async fn test_count_and_find_statements() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/risearch")
                .query_param("format", "count");
            then.status(200).body("42\n");
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/fedora/risearch")
                .query_param("format", "N-Triples");
            then.status(200).body(
                "<info:fedora/demo:2> <info:fedora/fedora-system:def/relations-external#isMemberOf> <info:fedora/demo:1> .\n",
            );
        });

        let index = ResourceIndex::new(RestApi::new(&server.url("/fedora/")).unwrap());
        assert_eq!(index.count_statements("* * *").await.unwrap(), 42);

        let members = index
            .get_subjects(rdf::IS_MEMBER_OF, &rdf::pid_to_uri("demo:1"))
            .await
            .unwrap();
        assert_eq!(members, vec!["info:fedora/demo:2"]);
    }
}
