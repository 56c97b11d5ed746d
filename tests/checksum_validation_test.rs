use chrono::{TimeZone, Utc};
use fedora_access::core::report::{read_timestamp, record_run, write_timestamp};
use fedora_access::core::ChecksumStatus;
use fedora_access::{CheckEngine, LocalStorage, Repository, RestApi, ValidateOptions, ValidatePipeline};
use httpmock::prelude::*;
use tempfile::TempDir;

fn repository(server: &MockServer) -> Repository {
    Repository::new(RestApi::new(&server.url("/fedora/")).unwrap())
}

#[tokio::test]
async fn test_end_to_end_validation_with_report() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();
    let server = MockServer::start();

    let risearch = server.mock(|when, then| {
        when.method(GET)
            .path("/fedora/risearch")
            .query_param("lang", "sparql");
        then.status(200)
            .header("Content-Type", "text/csv")
            .body("\"pid\"\ninfo:fedora/demo:1\ninfo:fedora/demo:2\n");
    });
    server.mock(|when, then| {
        when.method(GET).path("/fedora/objects/demo:1/datastreams");
        then.status(200).body(
            r#"<objectDatastreams pid="demo:1"><datastream dsid="DC" label="Dublin Core" mimeType="text/xml"/><datastream dsid="TIFF" label="Master" mimeType="image/tiff"/><datastream dsid="THUMB" label="Thumbnail" mimeType="image/jpeg"/></objectDatastreams>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/fedora/objects/demo:1/datastreams/DC");
        then.status(200).body(
            r#"<datastreamProfile pid="demo:1" dsID="DC"><dsCreateDate>2012-05-01T10:00:00.000Z</dsCreateDate><dsControlGroup>X</dsControlGroup><dsChecksumType>MD5</dsChecksumType><dsChecksum>6bd5cab7e3a1b4b5a93d1f0ea08e5a4f</dsChecksum><dsChecksumValid>true</dsChecksumValid></datastreamProfile>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/fedora/objects/demo:1/datastreams/TIFF");
        then.status(200).body(
            r#"<datastreamProfile pid="demo:1" dsID="TIFF"><dsCreateDate>2012-05-01T10:00:01.000Z</dsCreateDate><dsControlGroup>M</dsControlGroup><dsChecksumType>SHA-1</dsChecksumType><dsChecksum>2fd4e1c67a2d28fced849ee1bb76e7391b93eb12</dsChecksum><dsChecksumValid>false</dsChecksumValid></datastreamProfile>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/fedora/objects/demo:1/datastreams/THUMB");
        then.status(200).body(
            r#"<datastreamProfile pid="demo:1" dsID="THUMB"><dsControlGroup>M</dsControlGroup><dsChecksumType>DISABLED</dsChecksumType><dsChecksum>none</dsChecksum></datastreamProfile>"#,
        );
    });
    server.mock(|when, then| {
        when.method(GET).path("/fedora/objects/demo:2/datastreams");
        then.status(404).body("Object not found in low-level storage: demo:2");
    });

    let storage = LocalStorage::new(output_path.clone());
    let options = ValidateOptions {
        csv_file: Some("checksums.csv".to_string()),
        concurrency: 2,
        ..Default::default()
    };
    let pipeline = ValidatePipeline::new(storage.clone(), repository(&server), options);
    let report = CheckEngine::new(pipeline).run().await.unwrap();

    risearch.assert();
    let outcome = &report.outcome;
    assert_eq!(outcome.objects, 1);
    assert_eq!(outcome.checks.len(), 3);
    assert_eq!(outcome.count(ChecksumStatus::Valid), 1);
    assert_eq!(outcome.count(ChecksumStatus::Invalid), 1);
    assert_eq!(outcome.count(ChecksumStatus::Missing), 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].pid, "demo:2");
    assert!(outcome.has_findings());

    assert_eq!(report.report_path.as_deref(), Some("checksums.csv"));
    let csv = std::fs::read_to_string(temp_dir.path().join("checksums.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "pid,datastream,version,status,checksum_type,checksum");
    assert!(lines.contains(&"demo:1,THUMB,,missing,DISABLED,"));
    assert!(lines.contains(
        &"demo:1,TIFF,2012-05-01T10:00:01.000Z,invalid,SHA-1,2fd4e1c67a2d28fced849ee1bb76e7391b93eb12"
    ));
    assert!(lines.iter().any(|l| l.starts_with("demo:2,,,error,")));
    assert!(!csv.contains("demo:1,DC"));

    // demo:2 失敗，下次增量執行仍需從舊的時間點開始
    let recorded = record_run(&storage, "last-run.txt", &Utc::now(), outcome)
        .await
        .unwrap();
    assert!(!recorded);
    assert!(!temp_dir.path().join("last-run.txt").exists());
}

#[tokio::test]
async fn test_all_versions_are_checked_by_creation_date() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/fedora/objects/demo:5/datastreams");
        then.status(200).body(
            r#"<objectDatastreams pid="demo:5"><datastream dsid="DC" label="Dublin Core" mimeType="text/xml"/></objectDatastreams>"#,
        );
    });
    let history = server.mock(|when, then| {
        when.method(GET).path("/fedora/objects/demo:5/datastreams/DC/history");
        then.status(200).body(
            r#"<datastreamHistory pid="demo:5" dsID="DC">
  <datastreamProfile pid="demo:5" dsID="DC"><dsVersionID>DC.1</dsVersionID><dsCreateDate>2014-01-01T00:00:00.000Z</dsCreateDate><dsChecksumType>MD5</dsChecksumType><dsChecksum>bbb</dsChecksum></datastreamProfile>
  <datastreamProfile pid="demo:5" dsID="DC"><dsVersionID>DC.0</dsVersionID><dsCreateDate>2010-01-01T00:00:00.000Z</dsCreateDate><dsChecksumType>MD5</dsChecksumType><dsChecksum>aaa</dsChecksum></datastreamProfile>
</datastreamHistory>"#,
        );
    });
    let old = server.mock(|when, then| {
        when.method(GET)
            .path("/fedora/objects/demo:5/datastreams/DC")
            .query_param("asOfDateTime", "2010-01-01T00:00:00.000Z")
            .query_param("validateChecksum", "true");
        then.status(200).body(
            r#"<datastreamProfile pid="demo:5" dsID="DC"><dsVersionID>DC.0</dsVersionID><dsCreateDate>2010-01-01T00:00:00.000Z</dsCreateDate><dsChecksumType>MD5</dsChecksumType><dsChecksum>aaa</dsChecksum><dsChecksumValid>false</dsChecksumValid></datastreamProfile>"#,
        );
    });
    let new = server.mock(|when, then| {
        when.method(GET)
            .path("/fedora/objects/demo:5/datastreams/DC")
            .query_param("asOfDateTime", "2014-01-01T00:00:00.000Z")
            .query_param("validateChecksum", "true");
        then.status(200).body(
            r#"<datastreamProfile pid="demo:5" dsID="DC"><dsVersionID>DC.1</dsVersionID><dsCreateDate>2014-01-01T00:00:00.000Z</dsCreateDate><dsChecksumType>MD5</dsChecksumType><dsChecksum>bbb</dsChecksum><dsChecksumValid>true</dsChecksumValid></datastreamProfile>"#,
        );
    });

    let temp_dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let options = ValidateOptions {
        pids: vec!["demo:5".to_string()],
        all_versions: true,
        ..Default::default()
    };
    let pipeline = ValidatePipeline::new(storage, repository(&server), options);
    let report = CheckEngine::new(pipeline).run().await.unwrap();

    history.assert();
    old.assert();
    new.assert();
    let checks = &report.outcome.checks;
    assert_eq!(checks.len(), 2);
    // 依版本時間排序，舊版在前
    assert_eq!(checks[0].version, Some(Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap()));
    assert_eq!(checks[0].status, ChecksumStatus::Invalid);
    assert_eq!(checks[1].status, ChecksumStatus::Valid);
    assert!(report.report_path.is_none());
}

#[tokio::test]
async fn test_timestamp_file_round_trip_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

    assert!(read_timestamp(&storage, "last-run.txt").await.unwrap().is_none());

    let started = Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, 0).unwrap();
    write_timestamp(&storage, "last-run.txt", &started).await.unwrap();

    let on_disk = std::fs::read_to_string(temp_dir.path().join("last-run.txt")).unwrap();
    assert_eq!(on_disk.trim(), "2024-03-01T06:00:00.000Z");
    assert_eq!(
        read_timestamp(&storage, "last-run.txt").await.unwrap(),
        Some(started)
    );
}
