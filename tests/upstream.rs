//! Client and service tests against a throwaway upstream portal.
//!
//! The fake portal listens on `127.0.0.1:0` and answers the aggregation,
//! filter, search and journal endpoints with canned JSON.

use std::collections::HashMap;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower::ServiceExt;

use ocaportal::client::{ClientError, PortalClient};
use ocaportal::filters::{FilterMap, IndicatorRequest};
use ocaportal::journal::JournalProfileState;
use ocaportal::payload::ParseError;
use ocaportal::server::{create_router, AppState};
use ocaportal::Settings;

fn filtered_payload() -> Value {
    json!({
        "years": ["2020", "2021"],
        "breakdown_variable": "country",
        "breakdown_keys": ["BR", "PT"],
        "series": [
            {"name": "BR (Documents)", "data": [5, 6]},
            {"name": "PT (Documents)", "data": [1, 0]},
            {"name": "BR (Citations)", "data": [10, 12]},
            {"name": "PT (Citations)", "data": [2, 0]},
        ],
        "ndocs_per_year": [6, 6],
        "total_citations_per_year": [12, 12],
    })
}

fn baseline_payload() -> Value {
    json!({
        "years": ["2020", "2021"],
        "breakdown_variable": "country",
        "breakdown_keys": ["BR", "PT"],
        "series": [
            {"name": "BR (Documents)", "data": [10, 12]},
            {"name": "PT (Documents)", "data": [4, 4]},
            {"name": "BR (Citations)", "data": [20, 30]},
            {"name": "PT (Citations)", "data": [8, 2]},
        ],
        "ndocs_per_year": [14, 16],
        "total_citations_per_year": [28, 32],
    })
}

async fn indicator_data(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if headers.get("x-csrftoken").and_then(|v| v.to_str().ok()) != Some("tok") {
        return (StatusCode::FORBIDDEN, Json(json!({"detail": "CSRF"})));
    }
    let filters = &body["filters"];
    if filters["collection"] == "broken" {
        return (StatusCode::OK, Json(json!({"error": "index unavailable"})));
    }
    let unfiltered = filters.as_object().map(|o| o.is_empty()).unwrap_or(true);
    let payload = if unfiltered {
        baseline_payload()
    } else {
        filtered_payload()
    };
    (StatusCode::OK, Json(payload))
}

async fn journal(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({
        "years": ["2019", "2020"],
        "journal_title": params.get("journal_title"),
        "journal_issn": params.get("journal_issn"),
        "journal_publications_count_per_year": [10, 12],
        "journal_citations_total_per_year": [30, 20],
        "selected_category_level": params.get("category_level"),
        "annual_snapshots": [
            {"publication_year": 2020, "journal_publications_count": 12, "is_scielo": true}
        ],
    }))
}

async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/indicators/data/", post(indicator_data))
        .route(
            "/search-gateway/filters/",
            get(|| async {
                Json(json!({
                    "country": [{"key": "PT", "label": "PT"}, {"key": "BR", "label": "BR"}],
                    "document_language": [{"key": "pt", "label": "pt"}, {"key": "", "label": ""}],
                }))
            }),
        )
        .route(
            "/search-gateway/search-item/",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                let level = params.get("category_level").cloned().unwrap_or_default();
                Json(json!({
                    "results": [{"key": format!("{}:{}", params["q"], level), "label": "Medicine"}]
                }))
            }),
        )
        .route("/indicators/journal-metrics/timeseries/", get(journal))
        .route(
            "/search/api/filters/",
            get(|| async {
                Json(json!({
                    "filters": {"country": [{"key": "BR", "label": "BR"}]},
                    "filter_metadata": {"country": {"label": "Country", "multiple_selection": true}},
                }))
            }),
        )
        .route(
            "/search/api/search-results-list/",
            get(|Query(params): Query<Vec<(String, String)>>| async move {
                let country = params
                    .iter()
                    .find(|(k, _)| k == "country")
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default();
                Json(json!({
                    "total_results": 1,
                    "results": [{
                        "title": "<script>alert(1)</script>",
                        "url": "https://example.org/doc",
                        "authors": ["Silva, A."],
                        "source": country,
                        "year": 2021,
                    }],
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake upstream");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake upstream failed");
    });
    format!("http://{}", addr)
}

fn settings(base_url: &str) -> Settings {
    Settings {
        base_url: base_url.to_string(),
        csrf_token: Some("tok".to_string()),
        request_timeout: 5,
        ..Settings::default()
    }
}

fn request(filters: &[(&str, &str)]) -> IndicatorRequest {
    IndicatorRequest::new("document", FilterMap::from_pairs(filters.iter().copied()))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

// ============================================================================
// PortalClient
// ============================================================================

#[tokio::test]
async fn client_fetches_indicator_data_with_csrf_header() {
    let base = spawn_upstream().await;
    let client = PortalClient::new(&settings(&base)).unwrap();

    let payload = client
        .indicator_data("scielo", &request(&[("country", "BR"), ("breakdown_variable", "country")]))
        .await
        .unwrap();
    assert_eq!(payload.years, vec!["2020", "2021"]);
    assert_eq!(payload.series.len(), 4);
    assert!(payload.has_breakdown());

    let baseline = client
        .indicator_baseline("scielo", &request(&[("country", "BR")]))
        .await
        .unwrap();
    assert_eq!(baseline.ndocs_per_year, vec![14.0, 16.0]);
}

#[tokio::test]
async fn client_reports_http_status() {
    let base = spawn_upstream().await;
    let client = PortalClient::new(&Settings {
        csrf_token: None,
        ..settings(&base)
    })
    .unwrap();

    let err = client
        .indicator_data("scielo", &request(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 403, .. }));
}

#[tokio::test]
async fn client_surfaces_backend_error_field() {
    let base = spawn_upstream().await;
    let client = PortalClient::new(&settings(&base)).unwrap();

    let err = client
        .indicator_data("scielo", &request(&[("collection", "broken")]))
        .await
        .unwrap_err();
    match err {
        ClientError::Backend(ParseError::Backend(message)) => {
            assert_eq!(message, "index unavailable")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn client_connection_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = PortalClient::new(&settings(&format!("http://{}", addr))).unwrap();
    let err = client.fetch_filters("scielo").await.unwrap_err();
    assert!(matches!(err, ClientError::Connection(_)));
}

#[tokio::test]
async fn client_fetches_catalogue_and_suggestions() {
    let base = spawn_upstream().await;
    let client = PortalClient::new(&settings(&base)).unwrap();

    let catalogue = client.fetch_filters("scielo").await.unwrap();
    assert_eq!(catalogue.get("country").map(|o| o.len()), Some(2));
    assert_eq!(catalogue.get("document_language").map(|o| o.len()), Some(1));

    let suggestions = client
        .search_item("scielo", "category_id", "med", Some("field"))
        .await
        .unwrap();
    assert_eq!(suggestions[0].key, "med:field");
    assert_eq!(suggestions[0].text(), "Medicine");

    let suggestions = client
        .search_item("scielo", "country", "bra", Some("field"))
        .await
        .unwrap();
    assert_eq!(suggestions[0].key, "bra:");
}

#[tokio::test]
async fn client_fetches_journal_timeseries() {
    let base = spawn_upstream().await;
    let client = PortalClient::new(&settings(&base)).unwrap();

    let mut state = JournalProfileState::default();
    state.select_journal("Revista & Saúde", "1234-5678", None);
    let payload = client.journal_timeseries(&state).await.unwrap();

    assert_eq!(payload.journal_title.as_deref(), Some("Revista & Saúde"));
    assert_eq!(payload.selected_category_level.as_deref(), Some("field"));
    assert_eq!(payload.journal_publications_count_per_year, vec![10.0, 12.0]);
}

// ============================================================================
// HTTP service
// ============================================================================

async fn app() -> Router {
    let base = spawn_upstream().await;
    create_router(AppState::new(&settings(&base)).unwrap())
}

#[tokio::test]
async fn service_health() {
    let response = app()
        .await
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "ok");
}

#[tokio::test]
async fn service_builds_indicator_charts() {
    let body = json!({
        "study_unit": "document",
        "breakdown_variable": "country",
        "country": ["BR", "PT"],
    });
    let response = app()
        .await
        .oneshot(
            Request::post("/api/indicators/charts?data_source=scielo&width=600")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = json_body(response).await;
    assert_eq!(page["breakdown_label"], "country");
    assert_eq!(page["charts"]["primary"][0]["container"], "docs-chart");
    assert_eq!(page["charts"]["shares_visible"], true);
    assert!(page["outer_chart"].is_object());
    assert_eq!(page["main_chart"]["title"]["text"], "Breakdown by country");

    let names: Vec<&str> = page["main_chart"]["series"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["name"].as_str())
        .collect();
    assert!(names.contains(&"Brazil (Documents)"));
    assert!(page["applied_filters_html"]
        .as_str()
        .unwrap()
        .contains("Brazil"));
}

#[tokio::test]
async fn service_labels_year_bounds_without_expanding_them() {
    let body = json!({
        "study_unit": "document",
        "country": "BR",
        "document_publication_year_start": "-2000000000",
        "document_publication_year_end": "2000000000",
    });
    let response = app()
        .await
        .oneshot(
            Request::post("/api/indicators/charts?data_source=scielo")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = json_body(response).await;
    let html = page["applied_filters_html"].as_str().unwrap();
    assert!(html.contains("Publication Year"));
    assert!(html.contains("-2000000000 to 2000000000"));
    assert!(html.contains("Country (Author)"));
}

#[tokio::test]
async fn service_maps_upstream_failure_to_banner() {
    let response = app()
        .await
        .oneshot(
            Request::post("/api/indicators/charts")
                .header("content-type", "application/json")
                .body(Body::from(json!({"collection": "broken"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        json_body(response).await["error"],
        "Error loading indicator data."
    );
}

#[tokio::test]
async fn service_standardizes_filter_labels() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/filters?data_source=scielo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let catalogue = json_body(response).await;
    assert_eq!(catalogue["country"][0]["label"], "Brazil");
    assert_eq!(catalogue["country"][1]["label"], "Portugal");
    assert_eq!(catalogue["document_language"][0]["label"], "Portuguese");
}

#[tokio::test]
async fn service_renders_escaped_search_results() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/search?index_name=scielo&search=malaria&country=BR")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let page = json_body(response).await;
    let html = page["results_html"].as_str().unwrap();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
    assert!(html.contains("Silva, A."));
    assert_eq!(page["total_results"], 1);
    assert_eq!(page["active_filter_count"], 1);
}

#[tokio::test]
async fn service_journal_profile() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/journal/profile?journal_title=Revista+X&journal_issn=1234-5678")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let profile = json_body(response).await;
    assert_eq!(profile["summary"]["title"], "Revista X");
    assert_eq!(profile["summary"]["year_label"], "Publication year: 2020");
    assert_eq!(profile["charts"].as_array().unwrap().len(), 6);
    assert_eq!(profile["state"]["selected_category_level"], "field");
}

#[tokio::test]
async fn service_journal_profile_requires_title() {
    let response = app()
        .await
        .oneshot(
            Request::get("/api/journal/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
