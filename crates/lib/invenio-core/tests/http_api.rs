use std::time::Duration;

use invenio_core::control::{DraftControlPlane, ErrorKind};
use invenio_core::store::{ApiError, HttpApiConfig, HttpRecordsApi, RecordsApi, RetryPolicy};
use invenio_model::Record;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";

fn http_api(server: &MockServer) -> HttpRecordsApi {
    let base_url = Url::parse(&format!("{}/api", server.uri())).expect("valid mock url");
    let config = HttpApiConfig::new(base_url, TOKEN)
        .with_session_cookie(Some("session=abc123".to_string()))
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy::none());
    HttpRecordsApi::new(config).expect("client builds")
}

/// Client whose timeout is far shorter than `SLOW_RESPONSE`, retrying twice.
fn impatient_api(server: &MockServer) -> HttpRecordsApi {
    let base_url = Url::parse(&format!("{}/api", server.uri())).expect("valid mock url");
    let config = HttpApiConfig::new(base_url, TOKEN)
        .with_timeout(Duration::from_millis(200))
        .with_retry(RetryPolicy::new(2, Duration::from_millis(1)));
    HttpRecordsApi::new(config).expect("client builds")
}

const SLOW_RESPONSE: Duration = Duration::from_millis(800);

fn slow() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(draft_body())
        .set_delay(SLOW_RESPONSE)
}

fn draft_body() -> Value {
    json!({
        "id": "abcd-1234",
        "metadata": {
            "title": "Old title",
            "publisher": "CERN",
            "resource_type": {"id": "software"}
        },
        "access": {"record": "public", "files": "public"},
        "files": {"enabled": true},
        "links": {
            "self": "https://repo.example/api/records/abcd-1234/draft",
            "self_html": "https://repo.example/uploads/abcd-1234"
        }
    })
}

#[tokio::test]
async fn requests_carry_token_and_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records/abcd-1234/draft"))
        .and(header("authorization", "Bearer test-token"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(draft_body()))
        .expect(1)
        .mount(&server)
        .await;

    let draft = http_api(&server)
        .get_draft("abcd-1234")
        .await
        .expect("fetch succeeds");

    assert_eq!(draft.id, "abcd-1234");
    assert_eq!(draft.title(), Some("Old title"));
}

#[tokio::test]
async fn set_title_writes_back_the_full_draft() {
    let server = MockServer::start().await;
    let mut expected = draft_body();
    expected["metadata"]["title"] = json!("New title");

    Mock::given(method("GET"))
        .and(path("/api/records/abcd-1234/draft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(draft_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/records/abcd-1234/draft"))
        .and(body_json(&expected))
        .respond_with(ResponseTemplate::new(200).set_body_json(&expected))
        .expect(1)
        .mount(&server)
        .await;

    let control = DraftControlPlane::new(http_api(&server));
    let update = control
        .set_title("abcd-1234", "New title")
        .await
        .expect("set_title succeeds");

    assert_eq!(update.message, "Title set to 'New title' for draft abcd-1234");
    assert!(update.field_errors.is_empty());
}

#[tokio::test]
async fn field_errors_in_update_response_are_returned() {
    let server = MockServer::start().await;
    let mut response = draft_body();
    response["errors"] = json!([
        {"field": "metadata.creators", "messages": ["Missing data for required field."]}
    ]);

    Mock::given(method("GET"))
        .and(path("/api/records/abcd-1234/draft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(draft_body()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/records/abcd-1234/draft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .mount(&server)
        .await;

    let update = DraftControlPlane::new(http_api(&server))
        .set_description("abcd-1234", "Text")
        .await
        .expect("update accepted");

    assert_eq!(update.field_errors.len(), 1);
    assert_eq!(update.field_errors[0].field, "metadata.creators");
}

#[tokio::test]
async fn not_found_on_fetch_skips_the_write() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records/missing/draft"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"status": 404, "message": "The persistent identifier does not exist."})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = DraftControlPlane::new(http_api(&server))
        .set_title("missing", "Nope")
        .await
        .expect_err("draft is unknown");

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn server_error_maps_to_remote_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = http_api(&server)
        .list_records()
        .await
        .expect_err("service unavailable");

    assert_eq!(
        err,
        ApiError::Remote {
            status: 503,
            message: "maintenance".to_string()
        }
    );
}

#[tokio::test]
async fn malformed_success_body_is_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = http_api(&server)
        .list_records()
        .await
        .expect_err("hits are missing");

    assert!(matches!(err, ApiError::Remote { status: 200, .. }));
}

#[tokio::test]
async fn list_records_returns_inner_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {"hits": [{"id": "r1"}, {"id": "r2"}], "total": 2}
        })))
        .mount(&server)
        .await;

    let records = http_api(&server).list_records().await.expect("list succeeds");

    assert_eq!(records, vec![json!({"id": "r1"}), json!({"id": "r2"})]);
}

#[tokio::test]
async fn create_then_publish_returns_matching_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/records"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(201).set_body_json(draft_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/records/abcd-1234/draft/actions/publish"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "abcd-1234",
            "metadata": {"title": "Old title"},
            "links": {"self_html": "https://repo.example/records/abcd-1234"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let control = DraftControlPlane::new(http_api(&server));
    let created = control.create_draft().await.expect("create succeeds");
    let published = control
        .publish_draft(&created.id)
        .await
        .expect("publish succeeds");

    assert_eq!(created.id, "abcd-1234");
    assert_eq!(created.url, "https://repo.example/uploads/abcd-1234");
    assert_eq!(published.id, created.id);
    assert_eq!(published.url, "https://repo.example/records/abcd-1234");
}

#[tokio::test]
async fn publish_rejection_carries_remote_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/records/abcd-1234/draft/actions/publish"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "message": "A validation error occurred.",
            "errors": [{"field": "metadata.creators", "messages": ["Missing data for required field."]}]
        })))
        .mount(&server)
        .await;

    let err = DraftControlPlane::new(http_api(&server))
        .publish_draft("abcd-1234")
        .await
        .expect_err("metadata incomplete");

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("metadata.creators: Missing data for required field."));
}

#[tokio::test]
async fn vocabulary_search_sends_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/vocabularies/resourcetypes"))
        .and(query_param("q", "image photo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": {"hits": [{"id": "image-photo", "title": {"en": "Photo"}}]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let hits = http_api(&server)
        .search_resource_types("image photo")
        .await
        .expect("search succeeds");

    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "image-photo");
}

#[tokio::test]
async fn file_upload_uses_three_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/records/abcd-1234/draft/files"))
        .and(body_json(json!([{"key": "data.csv"}])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"entries": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/records/abcd-1234/draft/files/data.csv/content"))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/records/abcd-1234/draft/files/data.csv/commit"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = http_api(&server);
    api.init_file("abcd-1234", "data.csv").await.expect("init");
    api.upload_file_content("abcd-1234", "data.csv", b"a,b\n".to_vec())
        .await
        .expect("content");
    api.commit_file("abcd-1234", "data.csv").await.expect("commit");
}

#[tokio::test]
async fn connection_failure_is_transport_error() {
    // Nothing listens on the discard port of localhost in the test environment.
    let base_url = Url::parse("http://127.0.0.1:9/api").expect("valid url");
    let api = HttpRecordsApi::new(
        HttpApiConfig::new(base_url, TOKEN)
            .with_timeout(Duration::from_secs(2))
            .with_retry(RetryPolicy::new(1, Duration::from_millis(1))),
    )
    .expect("client builds");

    let err = api.get_draft("abcd-1234").await.expect_err("no server");

    assert!(err.is_transient(), "{err}");
    assert!(!err.to_string().contains(TOKEN));
}

#[tokio::test]
async fn draft_without_metadata_is_never_written_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records/x/draft"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x", "links": {}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = DraftControlPlane::new(http_api(&server))
        .set_title("x", "T")
        .await
        .expect_err("draft body has no metadata");

    assert_eq!(err.kind(), ErrorKind::Remote);
}

#[tokio::test]
async fn timed_out_reads_and_writes_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/records/abcd-1234/draft"))
        .respond_with(slow())
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/records/abcd-1234/draft"))
        .respond_with(slow())
        .expect(3)
        .mount(&server)
        .await;

    let api = impatient_api(&server);
    let draft: Record = serde_json::from_value(draft_body()).expect("draft decodes");

    let read = api.get_draft("abcd-1234").await.expect_err("every GET times out");
    let write = api.update_draft(&draft).await.expect_err("every PUT times out");

    assert!(read.is_transient(), "{read}");
    assert!(write.is_transient(), "{write}");
}

#[tokio::test]
async fn timed_out_posts_are_sent_once() {
    let server = MockServer::start().await;
    for endpoint in [
        "/api/records",
        "/api/records/abcd-1234/draft/actions/publish",
        "/api/records/abcd-1234/draft/files",
        "/api/records/abcd-1234/draft/files/data.csv/commit",
    ] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(slow())
            .expect(1)
            .mount(&server)
            .await;
    }

    let api = impatient_api(&server);

    let results = [
        api.create_draft().await.map(drop),
        api.publish_draft("abcd-1234").await.map(drop),
        api.init_file("abcd-1234", "data.csv").await,
        api.commit_file("abcd-1234", "data.csv").await,
    ];

    for result in results {
        let err = result.expect_err("every POST times out");
        assert!(err.is_transient(), "{err}");
    }
}
