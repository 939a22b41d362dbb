//! End-to-end tests against mocked Aquabrowser and Summon services

use library_search::config::Settings;
use library_search::engines::BackendRegistry;
use library_search::metrics::Metrics;
use library_search::network::HttpClient;
use library_search::search::{Aggregator, LibrarySearch, SearchError};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TENANT: &str = "cam";

const SRU_EMPTY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<srw:searchRetrieveResponse xmlns:srw="http://www.loc.gov/zing/srw/">
  <srw:version>1.1</srw:version>
  <srw:numberOfRecords>0</srw:numberOfRecords>
  <srw:records/>
</srw:searchRetrieveResponse>"#;

const SRU_DARWIN: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<srw:searchRetrieveResponse xmlns:srw="http://www.loc.gov/zing/srw/" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <srw:numberOfRecords>412</srw:numberOfRecords>
  <srw:records>
    <srw:record>
      <srw:recordData>
        <dc:title>On the origin of species</dc:title>
        <dc:creator>Darwin, Charles</dc:creator>
        <dc:date>1859</dc:date>
        <dc:format>book</dc:format>
      </srw:recordData>
      <srw:extraRecordData>
        <recordURL>http://search.lib.cam.ac.uk/?itemid=1</recordURL>
        <branch>UL: Main Library</branch>
      </srw:extraRecordData>
    </srw:record>
  </srw:records>
</srw:searchRetrieveResponse>"#;

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings.set_value(TENANT, "librarysearch", "enabled", true);
    settings
}

fn enable_aquabrowser(settings: &mut Settings, endpoint: &str) {
    settings.set_value(TENANT, "aquabrowser", "enabled", true);
    settings.set_value(TENANT, "aquabrowser", "endpoint", endpoint);
}

fn enable_summon(settings: &mut Settings, endpoint: &str) {
    settings.set_value(TENANT, "summon", "enabled", true);
    settings.set_value(TENANT, "summon", "endpoint", endpoint);
    settings.set_value(TENANT, "summon", "appid", "cam");
    settings.set_value(TENANT, "summon", "appsecret", "secret");
}

fn sru_endpoint(server: &MockServer) -> String {
    format!("{}/sru.ashx?", server.uri())
}

fn service(settings: Settings) -> Arc<LibrarySearch> {
    let metrics = Arc::new(Metrics::new());
    let aggregator = Aggregator::new(
        HttpClient::new().unwrap(),
        Arc::new(BackendRegistry::with_defaults()),
        metrics.clone(),
    );
    Arc::new(LibrarySearch::new(Arc::new(settings), aggregator, metrics))
}

async fn mount_sru(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/sru.ashx"))
        .and(query_param("operation", "searchRetrieve"))
        .and(query_param("recordSchema", "dc"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_summon(server: &MockServer, response: ResponseTemplate, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/2.0.0/search"))
        .respond_with(response)
        .expect(expected)
        .mount(server)
        .await;
}

// ────────────────────────────────────────────────────────────────────────────
// Query gate
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_feature_disabled_calls_nothing() {
    let aquabrowser = MockServer::start().await;
    let summon = MockServer::start().await;
    mount_sru(&aquabrowser, ResponseTemplate::new(200), 0).await;
    mount_summon(&summon, ResponseTemplate::new(200), 0).await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));
    enable_summon(&mut settings, &summon.uri());
    settings.set_value(TENANT, "librarysearch", "enabled", false);

    let result = service(settings).perform_search(TENANT, "darwin").await;
    assert_eq!(result.unwrap_err(), SearchError::FeatureDisabled);
}

#[tokio::test]
async fn test_whitespace_query_calls_nothing() {
    let aquabrowser = MockServer::start().await;
    mount_sru(&aquabrowser, ResponseTemplate::new(200), 0).await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));

    let result = service(settings).perform_search(TENANT, " \t ").await;
    assert_eq!(result.unwrap_err(), SearchError::InvalidQuery);
}

#[test]
fn test_all_backends_disabled() {
    let search = service(settings());

    let result = tokio_test::block_on(search.perform_search(TENANT, "darwin"));

    let err = result.unwrap_err();
    assert_eq!(err, SearchError::NoBackendsEnabled);
    assert_eq!(err.code(), 403);
    assert_eq!(search.metrics().rejected_searches(), 1);
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregation
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_only_enabled_backends_are_called() {
    let aquabrowser = MockServer::start().await;
    let summon = MockServer::start().await;
    mount_sru(&aquabrowser, ResponseTemplate::new(200).set_body_string(SRU_DARWIN), 1).await;
    mount_summon(&summon, ResponseTemplate::new(200), 0).await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));
    settings.set_value(TENANT, "summon", "endpoint", summon.uri());

    let aggregate = service(settings)
        .perform_search(TENANT, "darwin")
        .await
        .unwrap();

    assert_eq!(aggregate.keys().collect::<Vec<_>>(), vec!["aquabrowser"]);

    let results = aggregate.get("aquabrowser").unwrap().results().unwrap();
    assert_eq!(results.total, 412);
    assert_eq!(results.records[0].title(), Some("On the origin of species"));
    assert_eq!(results.records[0].branch(), Some("UL: Main Library"));
}

#[tokio::test]
async fn test_darwin_with_no_matches() {
    let aquabrowser = MockServer::start().await;
    let summon = MockServer::start().await;
    mount_sru(&aquabrowser, ResponseTemplate::new(200).set_body_string(SRU_EMPTY), 1).await;
    mount_summon(
        &summon,
        ResponseTemplate::new(200).set_body_json(json!({"recordCount": 0, "documents": []})),
        1,
    )
    .await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));
    enable_summon(&mut settings, &summon.uri());

    let aggregate = service(settings)
        .perform_search(TENANT, "darwin")
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&aggregate).unwrap(),
        json!({
            "aquabrowser": {"total": 0, "results": []},
            "summon": {"total": 0, "results": []}
        })
    );
}

#[tokio::test]
async fn test_failure_is_isolated_and_callback_fires_once() {
    let aquabrowser = MockServer::start().await;
    let summon = MockServer::start().await;
    mount_sru(&aquabrowser, ResponseTemplate::new(200).set_body_string(SRU_DARWIN), 1).await;
    mount_summon(&summon, ResponseTemplate::new(500), 1).await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));
    enable_summon(&mut settings, &summon.uri());

    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = tokio::sync::oneshot::channel();
    let counter = calls.clone();

    let handle = service(settings).spawn_search(TENANT, "darwin", move |result| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(result);
    });
    handle.await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let aggregate = rx.await.unwrap().unwrap();
    assert_eq!(aggregate.len(), 2);
    assert_eq!(aggregate.get("aquabrowser").unwrap().results().unwrap().total, 412);

    let error = aggregate.get("summon").unwrap().error().unwrap();
    assert_eq!(error.code, 400);
    assert_eq!(error.message, "An error occured while parsing Summon data");
    assert_eq!(aggregate.failed(), vec!["summon"]);
}

#[tokio::test]
async fn test_malformed_bodies() {
    let aquabrowser = MockServer::start().await;
    let summon = MockServer::start().await;
    mount_sru(
        &aquabrowser,
        ResponseTemplate::new(200).set_body_string("<srw:searchRetrieveResponse><srw:records>"),
        1,
    )
    .await;
    mount_summon(&summon, ResponseTemplate::new(200).set_body_string("{\"recordCount\": "), 1).await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));
    enable_summon(&mut settings, &summon.uri());

    let aggregate = service(settings)
        .perform_search(TENANT, "darwin")
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&aggregate).unwrap(),
        json!({
            "aquabrowser": {"error": {"code": 500, "msg": "An error occured while parsing Aquabrowser data"}},
            "summon": {"error": {"code": 400, "msg": "An error occured while parsing Summon data"}}
        })
    );
}

#[tokio::test]
async fn test_unreachable_backend_fails_alone() {
    let summon = MockServer::start().await;
    mount_summon(
        &summon,
        ResponseTemplate::new(200).set_body_json(json!({
            "recordCount": 1,
            "documents": [{"Title": ["The <h>Voyage</h> of the Beagle"], "PublicationDate": ["1839"]}]
        })),
        1,
    )
    .await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, "http://127.0.0.1:9/sru.ashx?");
    enable_summon(&mut settings, &summon.uri());

    let aggregate = service(settings)
        .perform_search(TENANT, "darwin")
        .await
        .unwrap();

    assert_eq!(aggregate.get("aquabrowser").unwrap().error().unwrap().code, 500);

    let results = aggregate.get("summon").unwrap().results().unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.records[0].title(), Some("The Voyage of the Beagle"));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let aquabrowser = MockServer::start().await;
    let summon = MockServer::start().await;
    mount_sru(
        &aquabrowser,
        ResponseTemplate::new(200)
            .set_body_string(SRU_DARWIN)
            .set_delay(Duration::from_secs(3)),
        1,
    )
    .await;
    mount_summon(
        &summon,
        ResponseTemplate::new(200).set_body_json(json!({"recordCount": 0})),
        1,
    )
    .await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));
    settings.set_value(TENANT, "aquabrowser", "timeout", 200u64);
    enable_summon(&mut settings, &summon.uri());

    let start = Instant::now();
    let aggregate = service(settings)
        .perform_search(TENANT, "darwin")
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(3));
    assert!(aggregate.get("aquabrowser").unwrap().is_failure());
    assert!(aggregate.get("summon").unwrap().is_success());
}

#[tokio::test]
async fn test_backends_are_called_concurrently() {
    let aquabrowser = MockServer::start().await;
    let summon = MockServer::start().await;
    let delay = Duration::from_millis(800);
    mount_sru(
        &aquabrowser,
        ResponseTemplate::new(200).set_body_string(SRU_EMPTY).set_delay(delay),
        1,
    )
    .await;
    mount_summon(
        &summon,
        ResponseTemplate::new(200)
            .set_body_json(json!({"recordCount": 0}))
            .set_delay(delay),
        1,
    )
    .await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));
    enable_summon(&mut settings, &summon.uri());

    let start = Instant::now();
    let aggregate = service(settings)
        .perform_search(TENANT, "darwin")
        .await
        .unwrap();

    assert_eq!(aggregate.len(), 2);
    assert!(start.elapsed() < delay * 2);
}

// ────────────────────────────────────────────────────────────────────────────
// Wire format
// ────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_sru_request_parameters() {
    let aquabrowser = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sru.ashx"))
        .and(query_param("operation", "searchRetrieve"))
        .and(query_param("version", "1.1"))
        .and(query_param("query", "charles darwin"))
        .and(query_param("maximumRecords", "20"))
        .and(query_param("recordSchema", "dc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SRU_EMPTY))
        .expect(1)
        .mount(&aquabrowser)
        .await;

    let mut settings = settings();
    enable_aquabrowser(&mut settings, &sru_endpoint(&aquabrowser));

    let aggregate = service(settings)
        .perform_search(TENANT, "charles darwin")
        .await
        .unwrap();
    assert!(aggregate.get("aquabrowser").unwrap().is_success());
}

#[tokio::test]
async fn test_summon_request_is_signed() {
    let summon = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2.0.0/search"))
        .and(query_param("s.q", "charles darwin"))
        .and(header("Accept", "application/json"))
        .and(header("Version", "/2.0.0/search"))
        .and(header("Query", "s.q=charles darwin"))
        .and(header_exists("x-summon-date"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"recordCount": "7"})))
        .expect(1)
        .mount(&summon)
        .await;

    let mut settings = settings();
    enable_summon(&mut settings, &summon.uri());

    let aggregate = service(settings)
        .perform_search(TENANT, "charles darwin")
        .await
        .unwrap();
    assert_eq!(aggregate.get("summon").unwrap().results().unwrap().total, 7);
}
