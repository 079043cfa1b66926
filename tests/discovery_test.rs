//! End-to-end discovery tests
//!
//! Loads the taxonomy over HTTP, drives the cascading filter, and checks the
//! search bar to content list handshake through the engine.

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use strategist_engine::config::Config;
use strategist_engine::error::FilterError;
use strategist_engine::feed::ReportQuery;
use strategist_engine::filter::FilterLevel;
use strategist_engine::search::ProjectSummary;
use strategist_engine::Engine;

async fn mount_taxonomy(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Energy"},
            {"id": 2, "name": "Health"}
        ])))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/category/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 10, "name": "Grid", "categoryId": 1},
            {"id": 11, "name": "Solar", "categoryId": 1}
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/category/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"id": 20, "name": "Clinics"}])),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fields/project/10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 100, "name": "Transmission", "projectId": 10},
            {"id": 101, "name": "Storage", "projectId": 10}
        ])))
        .mount(server)
        .await;
    for project in ["11", "20"] {
        Mock::given(method("GET"))
            .and(path(format!("/fields/project/{}", project)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(server)
            .await;
    }
}

fn create_engine(base_url: &str) -> Engine {
    let mut config = Config::default();
    config.api.base_url = base_url.to_string();
    Engine::new(config).expect("Failed to create engine")
}

#[tokio::test]
async fn test_taxonomy_loads_and_cascade_resets() {
    let server = MockServer::start().await;
    mount_taxonomy(&server).await;

    let engine = create_engine(&server.uri());
    let nodes = engine.hierarchy.load_all().await.unwrap();
    assert_eq!(nodes.len(), 7);

    let mut filter = engine.filter();
    let projects = filter.set_category("1").unwrap();
    assert_eq!(
        projects.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
        vec!["Grid", "Solar"]
    );

    let fields = filter.set_project("10").unwrap();
    assert_eq!(fields.len(), 2);
    filter.set_field("101").unwrap();
    assert_eq!(filter.level(), FilterLevel::CategoryProjectField);

    // Reselecting the same category still resets everything below it.
    filter.set_category("1").unwrap();
    assert_eq!(filter.level(), FilterLevel::Category);
    assert_eq!(filter.selection().project_id, None);
    assert_eq!(filter.selection().field_id, None);

    assert_eq!(
        filter.set_project("20"),
        Err(FilterError::NotAChild {
            id: "20".to_string(),
            parent_id: "1".to_string(),
        })
    );
    assert_eq!(filter.level(), FilterLevel::Category);
}

#[tokio::test]
async fn test_filter_before_load_is_rejected() {
    let server = MockServer::start().await;
    let engine = create_engine(&server.uri());

    let mut filter = engine.filter();
    assert_eq!(filter.set_category("1"), Err(FilterError::NotLoaded));
}

#[tokio::test]
async fn test_project_pick_requeries_feed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/reports"))
        .and(query_param("projectId", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 500,
            "title": "Grid outlook",
            "projectId": 10,
            "authorId": 2,
            "createdAt": "2024-05-01T09:00:00Z"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let engine = create_engine(&server.uri());
    let mut listener = engine.feed_listener(ReportQuery::default());

    engine.search.select_project(&ProjectSummary {
        id: "10".to_string(),
        name: "Grid".to_string(),
        category_id: None,
    });

    let query = listener.drain().expect("Query should change");
    let reports = engine.reports.refresh(&query).await.unwrap();

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].id, "500");
    assert_eq!(engine.reports.reports(), reports);
}
