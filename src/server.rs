//! HTTP surface of the backend.

use crate::error::AcademicError;
use crate::models::Platform;
use crate::response::{SearchResponse, SearchType};
use crate::search::{parse_platforms, SearchOptions, SearchService, DEFAULT_MAX_RESULTS};
use crate::store::{ResearchRecord, StoreStats};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub type SharedState = Arc<SearchService>;

/// Build the full router around `service`.
pub fn build_router(service: SearchService) -> Router {
    let state: SharedState = Arc::new(service);

    Router::new()
        .route("/health", get(health_handler))
        // Searches
        .route("/search/author/publications/{author_id}", get(author_publications_handler))
        .route("/search/author/profile", get(profile_get_handler).post(profile_post_handler))
        .route("/search/author/{platform}", get(author_handler))
        .route("/search/topic/{platform}", get(topic_handler))
        .route("/search/comprehensive", get(comprehensive_handler))
        .route("/search/authors/scholar", get(scholar_authors_handler))
        // Export
        .route("/export/consolidated", get(consolidated_handler))
        // Store
        .route("/mongodb/stats", get(store_stats_handler))
        .route("/mongodb/researchers", get(researchers_handler))
        .route("/mongodb/research", get(research_handler))
        .route("/mongodb/researcher/{id}", delete(delete_researcher_handler))
        .route("/mongodb/clear", delete(clear_handler))
        // Middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Error body of the non-search endpoints.
pub struct ApiError(AcademicError);

impl From<AcademicError> for ApiError {
    fn from(err: AcademicError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AcademicError::NotFound(_) | AcademicError::Export(_) => StatusCode::NOT_FOUND,
            AcademicError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = json!({ "success": false, "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

fn default_max() -> usize {
    DEFAULT_MAX_RESULTS
}

fn bad_request(query: &str, search_type: SearchType, err: &AcademicError) -> Response {
    (StatusCode::BAD_REQUEST, Json(SearchResponse::failure(query, None, search_type, err))).into_response()
}

/// Health check endpoint
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "platforms": Platform::ALL,
    }))
}

#[derive(Debug, Deserialize)]
struct AuthorParams {
    #[serde(default)]
    author: String,
    #[serde(default = "default_max")]
    max_results: usize,
    #[serde(default)]
    export: bool,
    #[serde(default)]
    persist: bool,
    #[serde(default)]
    filter_keywords: bool,
}

async fn author_handler(
    State(service): State<SharedState>,
    Path(platform): Path<String>,
    Query(params): Query<AuthorParams>,
) -> Response {
    let platform = match platform.parse::<Platform>() {
        Ok(p) => p,
        Err(e) => return bad_request(&params.author, SearchType::Author, &e),
    };
    info!(platform = %platform, author = %params.author, "Author search request");
    let options = SearchOptions {
        export: params.export,
        persist: params.persist,
        filter_keywords: params.filter_keywords,
    };
    Json(
        service
            .search_author(platform, &params.author, params.max_results, options)
            .await,
    )
    .into_response()
}

#[derive(Debug, Deserialize)]
struct TopicParams {
    #[serde(default)]
    topic: String,
    #[serde(default = "default_max")]
    max_results: usize,
    #[serde(default)]
    export: bool,
    #[serde(default)]
    persist: bool,
    #[serde(default)]
    filter_keywords: bool,
}

async fn topic_handler(
    State(service): State<SharedState>,
    Path(platform): Path<String>,
    Query(params): Query<TopicParams>,
) -> Response {
    let platform = match platform.parse::<Platform>() {
        Ok(p) => p,
        Err(e) => return bad_request(&params.topic, SearchType::Topic, &e),
    };
    info!(platform = %platform, topic = %params.topic, "Topic search request");
    let options = SearchOptions {
        export: params.export,
        persist: params.persist,
        filter_keywords: params.filter_keywords,
    };
    Json(
        service
            .search_topic(platform, &params.topic, params.max_results, options)
            .await,
    )
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ComprehensiveParams {
    #[serde(default)]
    query: String,
    #[serde(default)]
    search_type: Option<String>,
    #[serde(default)]
    platforms: Option<String>,
    #[serde(default = "default_max")]
    max_results: usize,
    #[serde(default)]
    export: bool,
}

async fn comprehensive_handler(
    State(service): State<SharedState>,
    Query(params): Query<ComprehensiveParams>,
) -> Response {
    let search_type = match params.search_type.as_deref().map(str::parse::<SearchType>) {
        None => SearchType::Author,
        Some(Ok(t)) => t,
        Some(Err(e)) => return bad_request(&params.query, SearchType::Author, &e),
    };
    let platforms = match parse_platforms(params.platforms.as_deref().unwrap_or("all")) {
        Ok(p) => p,
        Err(e) => return bad_request(&params.query, search_type, &e),
    };
    Json(
        service
            .comprehensive(&params.query, search_type, &platforms, params.max_results, params.export)
            .await,
    )
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ScholarAuthorsParams {
    #[serde(default)]
    name: String,
    #[serde(default = "default_max")]
    max_results: usize,
}

async fn scholar_authors_handler(
    State(service): State<SharedState>,
    Query(params): Query<ScholarAuthorsParams>,
) -> Response {
    Json(service.scholar_authors(&params.name, params.max_results).await).into_response()
}

#[derive(Debug, Deserialize)]
struct PublicationsParams {
    author_name: Option<String>,
    #[serde(default = "default_max")]
    max_results: usize,
    #[serde(default)]
    export: bool,
    #[serde(default)]
    persist: bool,
    #[serde(default)]
    filter_keywords: bool,
}

async fn author_publications_handler(
    State(service): State<SharedState>,
    Path(author_id): Path<String>,
    Query(params): Query<PublicationsParams>,
) -> Response {
    let options = SearchOptions {
        export: params.export,
        persist: params.persist,
        filter_keywords: params.filter_keywords,
    };
    Json(
        service
            .author_publications(&author_id, params.author_name.as_deref(), params.max_results, options)
            .await,
    )
    .into_response()
}

#[derive(Debug, Deserialize)]
struct ProfileParams {
    #[serde(default)]
    profile_url: String,
    platform: Option<String>,
    #[serde(default = "default_max_publications")]
    max_publications: usize,
    #[serde(default)]
    export: bool,
    #[serde(default)]
    persist: bool,
    #[serde(default)]
    filter_keywords: bool,
}

fn default_max_publications() -> usize {
    100
}

async fn profile(service: &SearchService, params: ProfileParams) -> Response {
    let platform = match params.platform.as_deref().map(str::parse::<Platform>) {
        None => None,
        Some(Ok(p)) => Some(p),
        Some(Err(e)) => return bad_request(&params.profile_url, SearchType::Profile, &e),
    };
    let options = SearchOptions {
        export: params.export,
        persist: params.persist,
        filter_keywords: params.filter_keywords,
    };
    Json(
        service
            .profile(&params.profile_url, platform, params.max_publications, options)
            .await,
    )
    .into_response()
}

async fn profile_get_handler(State(service): State<SharedState>, Query(params): Query<ProfileParams>) -> Response {
    profile(&service, params).await
}

async fn profile_post_handler(State(service): State<SharedState>, Json(params): Json<ProfileParams>) -> Response {
    profile(&service, params).await
}

/// Every stored record as one spreadsheet attachment.
async fn consolidated_handler(State(service): State<SharedState>) -> Result<Response, ApiError> {
    let records = service.store().records().await?;
    let (filename, bytes) = service.exporter().export_consolidated(&records)?;
    info!(filename = %filename, bytes = bytes.len(), "Serving consolidated export");

    let disposition = format!("attachment; filename=\"{}\"", filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

#[derive(Serialize)]
struct StatsBody {
    success: bool,
    #[serde(flatten)]
    stats: StoreStats,
}

async fn store_stats_handler(State(service): State<SharedState>) -> Result<Json<StatsBody>, ApiError> {
    let stats = service.store().stats().await?;
    Ok(Json(StatsBody { success: true, stats }))
}

async fn researchers_handler(State(service): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    let researchers = service.store().researchers().await?;
    Ok(Json(json!({
        "success": true,
        "total": researchers.len(),
        "researchers": researchers,
    })))
}

#[derive(Debug, Deserialize)]
struct ResearchParams {
    limit: Option<usize>,
}

/// Stored records, newest first.
async fn research_handler(
    State(service): State<SharedState>,
    Query(params): Query<ResearchParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut records: Vec<ResearchRecord> = service.store().records().await?;
    records.reverse();
    if let Some(limit) = params.limit {
        records.truncate(limit);
    }
    Ok(Json(json!({
        "success": true,
        "total": records.len(),
        "records": records,
    })))
}

async fn delete_researcher_handler(
    State(service): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted = service.store().delete_researcher(&id).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Deleted {} records of '{}'", deleted.deleted_records, id),
        "deleted_records": deleted.deleted_records,
        "deleted_publications": deleted.deleted_publications,
    })))
}

async fn clear_handler(State(service): State<SharedState>) -> Result<Json<serde_json::Value>, ApiError> {
    let deleted_count = service.store().clear().await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Deleted {} records", deleted_count),
        "deleted_count": deleted_count,
    })))
}
