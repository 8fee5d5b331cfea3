//! HTTP-level tests of the backend router with canned platform sources.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use rustacademic::error::{AcademicError, Result};
use rustacademic::export::SpreadsheetExporter;
use rustacademic::models::{Platform, Profile, Publication};
use rustacademic::normalize::flatten;
use rustacademic::search::SearchService;
use rustacademic::server::build_router;
use rustacademic::source::{ResearchSource, SourceResults};
use rustacademic::stats;
use rustacademic::store::JsonFileStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct CannedSource {
    platform: Platform,
    results: Option<SourceResults>,
}

#[async_trait]
impl ResearchSource for CannedSource {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn search_author(&self, _name: &str, _max_results: usize) -> Result<SourceResults> {
        self.answer()
    }

    async fn search_topic(&self, _topic: &str, _max_results: usize) -> Result<SourceResults> {
        self.answer()
    }

    async fn profile(&self, _reference: &str, _max_publications: usize) -> Result<SourceResults> {
        self.answer()
    }
}

impl CannedSource {
    fn answer(&self) -> Result<SourceResults> {
        self.results.clone().ok_or(AcademicError::Challenge {
            platform: self.platform,
            marker: "captcha".to_string(),
        })
    }
}

fn maria() -> SourceResults {
    SourceResults::from_profile(Profile {
        name: "Maria Silva".into(),
        institution: Some("Universidade de Brasília".into()),
        h_index: Some(12),
        i10_index: Some(15),
        publications: vec![
            Publication {
                title: "Envelhecimento ativo no Brasil".into(),
                citations: Some(7),
                year: Some(2019),
                ..Default::default()
            },
            Publication {
                title: "Graph neural networks".into(),
                citations: Some(3),
                ..Default::default()
            },
        ],
        ..Default::default()
    })
}

async fn build_test_app(dir: &TempDir) -> axum::Router {
    let store = JsonFileStore::open(dir.path().join("research.json"))
        .await
        .expect("open store");
    let service = SearchService::new(Arc::new(store), SpreadsheetExporter::new(dir.path().join("exports")))
        .expect("service")
        .with_source(Arc::new(CannedSource {
            platform: Platform::Scholar,
            results: Some(maria()),
        }))
        .with_source(Arc::new(CannedSource {
            platform: Platform::Lattes,
            results: None,
        }))
        .with_source(Arc::new(CannedSource {
            platform: Platform::Orcid,
            results: Some(SourceResults {
                profiles: vec![Profile {
                    name: "Maria Silva".into(),
                    orcid_id: Some("0000-0002-1825-0097".into()),
                    ..Default::default()
                }],
                ..Default::default()
            }),
        }));
    build_router(service)
}

async fn send(app: &axum::Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec();
    (status, bytes)
}

async fn get_json(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = send(app, Method::GET, uri).await;
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn health_reports_platforms() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_test_app(&dir).await;
    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["platforms"], json!(["scholar", "lattes", "orcid"]));
}

#[tokio::test]
async fn author_search_normalizes_and_counts() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_test_app(&dir).await;
    let (status, body) = get_json(&app, "/search/author/scholar?author=Maria%20Silva&max_results=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["total_results"], json!(3));

    let items = flatten(&body);
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item.platform == Platform::Scholar));

    let stats = stats::compute(&body);
    assert_eq!(stats.total_publications, 2);
    assert_eq!(stats.total_citations, 10);
    assert_eq!(stats.max_h_index, 12);
    assert!(stats.can_export());
}

#[tokio::test]
async fn unknown_platform_is_bad_request() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_test_app(&dir).await;
    let (status, body) = get_json(&app, "/search/topic/arxiv?topic=aging").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn comprehensive_reports_platform_stats() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_test_app(&dir).await;
    let (status, body) = get_json(&app, "/search/comprehensive?query=Maria%20Silva&platforms=all&max_results=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["successful_platforms"], json!(2));
    assert_eq!(body["total_results"], json!(4));
    assert_eq!(body["expected_total"], json!(15));
    assert!(body["platform_stats"]["lattes"]["error"].is_string());
    assert!(body["results_by_platform"]["lattes"]["challenge"].is_object());

    let items = flatten(&body);
    assert_eq!(items.len(), 4);
    assert_eq!(items.iter().filter(|i| i.platform == Platform::Orcid).count(), 1);
}

#[tokio::test]
async fn profile_is_routed_by_url_host() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_test_app(&dir).await;
    let (_, body) = get_json(&app, "/search/author/profile?profile_url=http://lattes.cnpq.br/1234567890123456").await;
    assert_eq!(body["platform"], json!("lattes"));
    assert_eq!(body["success"], json!(false));
    assert!(body["challenge"]["instructions"].is_string());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/search/author/profile")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"profile_url": "https://orcid.org/0000-0002-1825-0097"}"#))
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("response");
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["platform"], json!("orcid"));
    assert_eq!(body["data"]["profiles"][0]["kind"], json!("profile"));
}

#[tokio::test]
async fn persisted_searches_feed_store_endpoints() {
    let dir = TempDir::new().expect("tempdir");
    let app = build_test_app(&dir).await;

    let (status, body) = send(&app, Method::GET, "/export/consolidated").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(body["success"], json!(false));

    let (_, body) = get_json(&app, "/search/author/scholar?author=Maria%20Silva&filter_keywords=true&export=true").await;
    assert_eq!(body["filtered_by_keywords"], json!(true));
    assert_eq!(body["original_total"], json!(2));
    assert!(body["database_id"].is_string());
    assert!(body["excel_file"].is_string());

    let (_, stats) = get_json(&app, "/mongodb/stats").await;
    assert_eq!(stats["total_searches"], json!(1));
    assert_eq!(stats["filtered_searches"], json!(1));
    assert_eq!(stats["total_publications"], json!(1));

    let (_, researchers) = get_json(&app, "/mongodb/researchers").await;
    assert_eq!(researchers["researchers"][0]["id"], json!("maria-silva"));

    let (_, research) = get_json(&app, "/mongodb/research?limit=5").await;
    assert_eq!(research["total"], json!(1));

    let (status, csv) = send(&app, Method::GET, "/export/consolidated").await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(csv).expect("utf8");
    assert!(csv.contains("Envelhecimento ativo no Brasil"));

    let (status, body) = send(&app, Method::DELETE, "/mongodb/researcher/maria-silva").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(body["deleted_records"], json!(1));

    let (status, _) = send(&app, Method::DELETE, "/mongodb/researcher/maria-silva").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::DELETE, "/mongodb/clear").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).expect("json body");
    assert_eq!(body["deleted_count"], json!(0));
}
