//! Integration tests for the HTTPS transport against a mock API server.

use std::sync::Arc;

use ikfetch_core::api::{ApiClient, DocLimits, HttpTransport, RetryPolicy, RetryingCaller};
use ikfetch_core::{FetchContext, Transport};
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_api_or_skip;
use support::test_settings;

macro_rules! require_mock_server {
    () => {{
        let Some(mock_server) = start_mock_api_or_skip().await else {
            return;
        };
        mock_server
    }};
}

fn transport_for(uri: &str) -> HttpTransport {
    HttpTransport::with_base_url(uri, "secret", 5, 5).unwrap()
}

// ==================== Request Shape Tests ====================

#[tokio::test]
async fn test_send_posts_with_token_and_accept_headers() {
    let mock_server = require_mock_server!();
    Mock::given(method("POST"))
        .and(path("/doc/42/"))
        .and(header("Authorization", "Token secret"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"title":"T"}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport = transport_for(&mock_server.uri());
    let response = transport.send("/doc/42/").await.unwrap();

    assert_eq!(response.status, Some(200));
    assert_eq!(response.body, r#"{"title":"T"}"#);
}

#[tokio::test]
async fn test_error_status_body_is_returned() {
    let mock_server = require_mock_server!();
    Mock::given(method("POST"))
        .and(path("/search/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("error code: 502"))
        .mount(&mock_server)
        .await;

    let transport = transport_for(&format!("{}/", mock_server.uri()));
    let response = transport.send("/search/?formInput=x").await.unwrap();

    assert_eq!(response.status, Some(502));
    assert_eq!(response.body, "error code: 502");
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    // Port 9 (discard) on localhost is not expected to accept HTTP.
    let transport = transport_for("http://127.0.0.1:9");
    assert!(transport.send("/doc/1/").await.is_err());
}

// ==================== Client Stack Tests ====================

#[tokio::test]
async fn test_search_query_is_form_encoded() {
    let mock_server = require_mock_server!();
    Mock::given(method("POST"))
        .and(path("/search/"))
        .and(query_param("formInput", "income tax sortby: mostrecent"))
        .and(query_param("pagenum", "0"))
        .and(query_param("maxpages", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"docs":[]}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport: Arc<dyn Transport> = Arc::new(transport_for(&mock_server.uri()));
    let client = ApiClient::new(
        RetryingCaller::new(transport, RetryPolicy::default()),
        DocLimits::default(),
    );
    let body = client.search("income tax sortby: mostrecent", 0, 1).await.unwrap();

    assert_eq!(body, r#"{"docs":[]}"#);
}

#[tokio::test]
async fn test_detail_limits_sent_as_query_parameters() {
    let mock_server = require_mock_server!();
    Mock::given(method("POST"))
        .and(path("/doc/7/"))
        .and(query_param("maxcites", "5"))
        .and(query_param("maxcitedby", "9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"title":"T"}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport: Arc<dyn Transport> = Arc::new(transport_for(&mock_server.uri()));
    let limits = DocLimits {
        max_cites: 5,
        max_cited_by: 9,
    };
    let client = ApiClient::new(RetryingCaller::new(transport, RetryPolicy::default()), limits);

    client.fetch_doc(7).await.unwrap();
}

#[tokio::test]
async fn test_document_download_over_http() {
    let mock_server = require_mock_server!();
    let body = r#"{"title":"A v. B","courtcopy":false,"doc":"<p/>"}"#;
    Mock::given(method("POST"))
        .and(path("/doc/11/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let settings = test_settings(dir.path());
    let transport: Arc<dyn Transport> = Arc::new(transport_for(&mock_server.uri()));
    let ctx = FetchContext::new(&settings, transport);

    ctx.downloader().download(11, dir.path()).await;
    ctx.downloader().download(11, dir.path()).await;

    assert_eq!(std::fs::read_to_string(dir.path().join("11.json")).unwrap(), body);
}
