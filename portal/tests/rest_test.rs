//! HTTP-level tests against a wiremock server: query parameters on the wire,
//! error statuses, and a context-built controller end to end.

use std::time::Duration;

use portal::{
    ListEndpoint, ListSource, PageOptions, PortalConfig, PortalContext, PortalError,
    PortalHttpClient, SortKey, TableState,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LEARNERS_PATH: &str = "/enterprise/api/v1/enterprise-customer/ent-1/unenrolled-registered-learners/";

fn learners_body() -> serde_json::Value {
    json!({
        "count": 26,
        "num_pages": 2,
        "next": null,
        "results": [
            {
                "enterprise_customer_user_id": 11,
                "lms_user_id": 4021,
                "user_email": "grace@example.com",
                "lms_user_created": "2024-02-01T09:30:00Z"
            }
        ]
    })
}

fn test_config(server: &MockServer) -> PortalConfig {
    PortalConfig {
        api_base_url: server.uri(),
        debounce: Duration::from_millis(20),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_get_page_sends_pagination_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LEARNERS_PATH))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "25"))
        .and(query_param("ordering", "-lms_user_created,user_email"))
        .and(query_param("search", "grace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(learners_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = PortalHttpClient::new(&format!("{}/", server.uri()));
    let mut options = PageOptions::new(2, 25);
    options.ordering = vec![SortKey::desc("lms_user_created"), SortKey::asc("user_email")];
    options.search = Some("grace".into());

    let body = client
        .get_unenrolled_registered_learners("ent-1", &options)
        .await
        .unwrap();
    assert_eq!(body["count"], 26);
    assert_eq!(body["results"][0]["user_email"], "grace@example.com");
}

#[tokio::test]
async fn test_error_status_maps_to_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LEARNERS_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let endpoint =
        ListEndpoint::unenrolled_registered_learners(PortalHttpClient::new(&server.uri()), "ent-1");
    assert_eq!(endpoint.path(), LEARNERS_PATH);

    let err = endpoint
        .fetch_page(&PageOptions::new(1, 50))
        .await
        .unwrap_err();
    match err {
        PortalError::Http { status, message } => {
            assert_eq!(status, 403);
            assert_eq!(message, "forbidden");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_context_controller_fetches_and_normalizes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LEARNERS_PATH))
        .and(query_param("page", "2"))
        .and(query_param("ordering", "-lms_user_created"))
        .respond_with(ResponseTemplate::new(200).set_body_json(learners_body()))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = PortalContext::new(test_config(&server));
    let ctl = ctx.registered_learners_controller("ent-1");
    ctl.request_fetch(TableState::new(1, 25).with_sort("lmsUserCreated", true));

    let state = tokio::time::timeout(Duration::from_secs(5), ctl.settled())
        .await
        .expect("controller did not settle");
    assert!(!state.is_loading());
    assert_eq!(state.result.item_count, 26);
    assert_eq!(state.result.page_count, 2);
    let learner = &state.result.results[0];
    assert_eq!(learner.user_email, "grace@example.com");
    assert_eq!(learner.lms_user_id, Some(4021));
    assert_eq!(state.options.as_ref().map(|o| o.page), Some(2));
}

#[tokio::test]
async fn test_server_error_leaves_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(LEARNERS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ctx = PortalContext::new(test_config(&server));
    let ctl = ctx.registered_learners_controller("ent-1");
    ctl.request_fetch(TableState::new(0, 50));

    let state = tokio::time::timeout(Duration::from_secs(5), ctl.settled())
        .await
        .expect("controller did not settle");
    assert!(!state.is_loading());
    assert!(state.result.results.is_empty());
    assert!(state.last_error.is_some());
}

#[tokio::test]
async fn test_context_shutdown_stops_controllers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(learners_body()))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = PortalContext::new(test_config(&server));
    let ctl = ctx.registered_learners_controller("ent-1");
    ctx.shutdown();
    assert!(ctx.is_shut_down());

    ctl.request_fetch(TableState::new(0, 50));
    tokio::time::sleep(Duration::from_millis(100)).await;
    let state = ctl.settled().await;
    assert_eq!(state.completed, 0);
}
