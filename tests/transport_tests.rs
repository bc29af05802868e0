//! Backend client and controller against a mock backend.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pubsummary::config::Config;
use pubsummary::controller::{
    Controller, Tab, MSG_BULK_FAILED, MSG_DOWNLOAD_FAILED, MSG_MISSING_NAME, MSG_SINGLE_FAILED,
};
use pubsummary::model::{Publication, SearchOutcome};
use pubsummary::transport::{Backend, BackendClient, DownloadFormat, RawReply, RosterFile};
use pubsummary::PubSummaryError;

fn client_for(server: &MockServer) -> BackendClient {
    let config = Config::new(&server.uri()).expect("config");
    BackendClient::new(config).expect("client")
}

const RESULTS_HTML: &str = r#"<!DOCTYPE html>
<html><body>
  <div class="profile-card">
    <div class="profile-details"><h2>Grace Hopper</h2><p>Yale University</p></div>
  </div>
  <table class="results-table">
    <thead><tr><th>Title</th><th>Year</th><th>Type</th><th>Venue</th></tr></thead>
    <tbody>
      <tr><td>A</td><td>2020</td><td>Journal</td><td>X</td></tr>
      <tr><td>B</td><td>2019</td><td>Conference</td><td>Y</td></tr>
    </tbody>
  </table>
</body></html>"#;

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn test_search_sends_form_and_reads_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("name=Grace+Hopper"))
        .and(body_string_contains("institution=Yale"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "profile": {"name": "Grace Hopper", "affiliation": "Yale"},
            "results": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .search_author("Grace Hopper", Some("Yale"))
        .await
        .expect("search");
    assert!(matches!(reply, RawReply::Json(_)));
}

#[tokio::test]
async fn test_search_omits_blank_institution() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"profile": {}})))
        .mount(&server)
        .await;

    client_for(&server)
        .search_author("Ada", Some("  "))
        .await
        .expect("search");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body).to_string();
    assert_eq!(body, "name=Ada");
}

#[tokio::test]
async fn test_every_request_prefers_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"profile": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.search_author("Ada", None).await.expect("search");
    let file = RosterFile::new("roster.xls", b"xls".to_vec()).expect("roster");
    client.upload_roster(&file).await.expect("upload");
    client.download(DownloadFormat::Excel).await.expect("download");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);
    for request in &requests {
        let accept = request
            .headers
            .get("accept")
            .and_then(|v| v.to_str().ok());
        assert_eq!(accept, Some("application/json, text/html;q=0.9"), "{}", request.url);
    }
}

#[tokio::test]
async fn test_search_reads_html() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(RESULTS_HTML),
        )
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .search_author("grace", None)
        .await
        .expect("search");
    assert!(matches!(reply, RawReply::Html(_)));
}

#[tokio::test]
async fn test_upload_sends_multipart_file() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"roster.csv\""))
        .and(body_string_contains("Name,Institution"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"faculty_results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let file = RosterFile::new("roster.csv", b"Name,Institution\nAda,London\n".to_vec())
        .expect("roster");
    let reply = client_for(&server).upload_roster(&file).await.expect("upload");
    assert!(matches!(reply, RawReply::Json(_)));
}

#[tokio::test]
async fn test_non_success_is_backend_error_with_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "No data found for the given professor. Please check the name and institution."
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .search_author("Nobody", None)
        .await
        .expect_err("404");
    match err {
        PubSummaryError::Backend { status, message } => {
            assert_eq!(status, 404);
            assert!(message.starts_with("No data found"), "{message}");
        }
        other => panic!("expected backend error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_html_error_page_carries_no_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(502)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body><h1>Bad gateway</h1></body></html>"),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .search_author("Ada", None)
        .await
        .expect_err("502");
    assert_eq!(err.backend_message(), None);
    assert_eq!(err.to_string(), "Backend error: 502 - Bad Gateway");
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Grab a free port and release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);

    let config = Config::new(&format!("http://127.0.0.1:{}", port)).expect("config");
    let client = BackendClient::new(config).expect("client");
    let err = client.search_author("Ada", None).await.expect_err("refused");
    assert!(matches!(err, PubSummaryError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_download_uses_format_and_attachment_name() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/download"))
        .and(query_param("format", "csv"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "content-disposition",
                    "attachment; filename=faculty_publications.csv",
                )
                .set_body_string("Title,Year\nA,2020\n"),
        )
        .mount(&server)
        .await;

    let export = client_for(&server)
        .download(DownloadFormat::Csv)
        .await
        .expect("download");
    assert_eq!(export.file_name, "faculty_publications.csv");
    assert_eq!(export.bytes, b"Title,Year\nA,2020\n");
}

// =============================================================================
// Controller end to end
// =============================================================================

#[tokio::test]
async fn test_controller_single_html_flow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(RESULTS_HTML),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = Controller::new(client_for(&server));
    controller.submit_single("grace", Some("")).await;

    let state = controller.state();
    assert_eq!(state.error, None);
    assert_eq!(state.active_tab, Tab::Single);
    let SearchOutcome::Single(result) = &state.outcome else {
        panic!("expected single outcome");
    };
    assert_eq!(result.profile.name, "Grace Hopper");
    assert_eq!(
        result.publications,
        vec![
            Publication::new("A", "2020", "Journal", "X"),
            Publication::new("B", "2019", "Conference", "Y"),
        ]
    );
}

#[tokio::test]
async fn test_controller_blank_name_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut controller = Controller::new(client_for(&server));
    controller.submit_single("", None).await;
    assert_eq!(controller.state().error.as_deref(), Some(MSG_MISSING_NAME));
}

#[tokio::test]
async fn test_controller_bulk_json_flow() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "faculty_results": [
                {
                    "profile": {"name": "A", "h_index": "5", "i10_index": "2"},
                    "publications": [{"Title": "P"}]
                },
                {"profile": {"name": "B"}, "publications": []}
            ]
        })))
        .mount(&server)
        .await;

    let mut controller = Controller::new(client_for(&server));
    let file = RosterFile::new("staff.xlsx", b"xlsx".to_vec()).expect("roster");
    controller.submit_bulk(Some(file)).await;

    let state = controller.state();
    assert_eq!(state.active_tab, Tab::Bulk);
    assert_eq!(state.outcome.faculty().len(), 2);
    assert_eq!(state.outcome.faculty()[0].profile.indices(), Some((5, 2)));
    assert!(controller.select_faculty(1).is_ok());
    assert!(controller.select_faculty(2).is_err());
}

#[tokio::test]
async fn test_controller_html_error_page_shows_generic_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(502)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body><h1>Bad gateway</h1></body></html>"),
        )
        .mount(&server)
        .await;

    let mut controller = Controller::new(client_for(&server));
    controller.submit_single("Ada", None).await;

    assert_eq!(controller.state().error.as_deref(), Some(MSG_SINGLE_FAILED));
    assert!(!controller.state().is_loading);
    assert!(controller.state().outcome.is_empty());
}

#[tokio::test]
async fn test_controller_empty_error_body_shows_generic_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let mut controller = Controller::new(client_for(&server));
    controller.submit_single("Ada", None).await;
    assert_eq!(controller.state().error.as_deref(), Some(MSG_SINGLE_FAILED));

    let file = RosterFile::new("staff.csv", b"Name\nAda\n".to_vec()).expect("roster");
    controller.submit_bulk(Some(file)).await;
    assert_eq!(controller.state().error.as_deref(), Some(MSG_BULK_FAILED));
}

#[tokio::test]
async fn test_controller_download_failure_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "No data available for download"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut controller = Controller::new(client_for(&server));
    let saved = controller.download(DownloadFormat::Excel, dir.path()).await;

    assert!(saved.is_none());
    assert_eq!(controller.state().error.as_deref(), Some(MSG_DOWNLOAD_FAILED));
    assert!(controller.state().outcome.is_empty());
    assert!(!controller.state().is_loading);
}
