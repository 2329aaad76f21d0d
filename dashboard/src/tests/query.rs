use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::{Dashboard, DashboardOptions, FetchOutcome, FilterCriteria, HttpLogService};

fn log(id: &str, user: &str, level: &str) -> Value {
    json!({
        "id": id,
        "timestamp": "2024-05-01T12:00:00Z",
        "level": level,
        "message": format!("message {id}"),
        "stakeUsername": user,
        "appVersion": "1.4.0",
        "platform": "android",
    })
}

fn dashboard(server: &MockServer, page_size: Option<u32>) -> Dashboard {
    let service = HttpLogService::new(&server.uri(), Duration::from_secs(5)).unwrap();
    Dashboard::new(
        service,
        DashboardOptions {
            page_size,
            sort: None,
            ..DashboardOptions::default()
        },
    )
}

async fn ids(dashboard: &Dashboard) -> Vec<String> {
    dashboard.logs().await.into_iter().map(|l| l.id).collect()
}

#[tokio::test]
async fn sends_only_present_criteria() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/logs"))
        .and(query_param("level", "error"))
        .and(query_param_is_missing("stakeUsername"))
        .and(query_param_is_missing("page"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log("1", "alice", "error")])))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, None);
    let outcome = dashboard.set_filter(FilterCriteria::new("", "error")).await;

    assert_eq!(outcome, FetchOutcome::Applied);
    assert_eq!(ids(&dashboard).await, ["1"]);
}

#[tokio::test]
async fn stale_response_does_not_overwrite_newer_criteria() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("stakeUsername", "alice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([log("a1", "alice", "info")]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("stakeUsername", "bob"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log("b1", "bob", "info")])))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, None);
    let slow = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move {
            dashboard
                .set_filter(FilterCriteria::by_username("alice"))
                .await
        })
    };

    // Let the alice request reach the server first.
    while server.received_requests().await.unwrap_or_default().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let fast = dashboard.set_filter(FilterCriteria::by_username("bob")).await;
    assert_eq!(fast, FetchOutcome::Applied);
    assert_eq!(slow.await.unwrap(), FetchOutcome::Stale);

    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.filter.stake_username.as_deref(), Some("bob"));
    assert_eq!(ids(&dashboard).await, ["b1"]);
}

#[tokio::test]
async fn failed_fetch_keeps_previous_collection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log("1", "alice", "info")])))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, None);
    assert_eq!(dashboard.refresh().await, FetchOutcome::Applied);

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    assert_eq!(
        dashboard.set_filter(FilterCriteria::by_level("error")).await,
        FetchOutcome::Failed
    );
    assert_eq!(ids(&dashboard).await, ["1"]);

    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;
    assert_eq!(dashboard.refresh().await, FetchOutcome::Failed);
    assert_eq!(ids(&dashboard).await, ["1"]);
}

#[tokio::test]
async fn load_more_appends_and_filter_change_replaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param_is_missing("stakeUsername"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([log("1", "alice", "info"), log("2", "bob", "info")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param_is_missing("stakeUsername"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log("3", "alice", "warn")])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("stakeUsername", "bob"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log("2", "bob", "info")])))
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, Some(2));
    assert_eq!(dashboard.refresh().await, FetchOutcome::Applied);
    assert_eq!(dashboard.load_more().await, FetchOutcome::Applied);
    assert_eq!(ids(&dashboard).await, ["1", "2", "3"]);
    assert_eq!(dashboard.snapshot().await.page.map(|p| p.number), Some(2));

    assert_eq!(
        dashboard.set_filter(FilterCriteria::by_username("bob")).await,
        FetchOutcome::Applied
    );
    assert_eq!(ids(&dashboard).await, ["2"]);
    assert_eq!(dashboard.snapshot().await.page.map(|p| p.number), Some(1));
}

#[tokio::test]
async fn failed_filter_change_leaves_paging_on_previous_criteria() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("stakeUsername", "alice"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log("1", "alice", "info")])))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("stakeUsername", "bob"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("stakeUsername", "alice"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([log("2", "alice", "warn")])))
        .expect(1)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, Some(1));
    assert_eq!(
        dashboard.set_filter(FilterCriteria::by_username("alice")).await,
        FetchOutcome::Applied
    );
    assert_eq!(
        dashboard.set_filter(FilterCriteria::by_username("bob")).await,
        FetchOutcome::Failed
    );

    let snapshot = dashboard.snapshot().await;
    assert_eq!(snapshot.filter.stake_username.as_deref(), Some("alice"));
    assert_eq!(snapshot.page.map(|p| p.number), Some(1));

    assert_eq!(dashboard.load_more().await, FetchOutcome::Applied);
    assert_eq!(ids(&dashboard).await, ["1", "2"]);
    assert_eq!(dashboard.snapshot().await.page.map(|p| p.number), Some(2));

    assert_eq!(dashboard.refresh().await, FetchOutcome::Applied);
    assert_eq!(ids(&dashboard).await, ["1"]);
}

#[tokio::test]
async fn load_more_is_skipped_without_paging() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let dashboard = dashboard(&server, None);
    assert_eq!(dashboard.load_more().await, FetchOutcome::Skipped);
}

#[tokio::test]
async fn active_sort_orders_fetched_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "B", "timestamp": "2024-05-01T12:00:01Z", "level": "info", "message": "b" },
            { "id": "A", "timestamp": "2024-05-01T12:00:02Z", "level": "error", "message": "a" },
        ])))
        .mount(&server)
        .await;

    let service = HttpLogService::new(&server.uri(), Duration::from_secs(5)).unwrap();
    let dashboard = Dashboard::new(service, DashboardOptions::default());
    dashboard.refresh().await;
    assert_eq!(ids(&dashboard).await, ["A", "B"]);

    let spec = dashboard.request_sort(crate::SortField::Timestamp).await;
    assert_eq!(spec.direction, crate::SortDirection::Ascending);
    assert_eq!(ids(&dashboard).await, ["B", "A"]);
}
