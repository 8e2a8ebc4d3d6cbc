//! JSON HTTP API over the audits and the report store

use crate::analyzers::{
    accessibility::analyze_accessibility, broken::LinkChecker, performance::measure_performance,
    security::analyze_security, seo::audit_seo, theme_plugin::analyze_theme_plugin,
    users::enumerate_users,
};
use crate::content::aggregate_content;
use crate::error::Error;
use crate::export::to_csv_string;
use crate::report::ReportGroup;
use crate::site::Site;
use crate::store::ReportStore;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// State shared with every handler
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReportStore>,
    /// Permit audits of loopback and private-network hosts
    pub allow_private: bool,
}

impl AppState {
    pub fn new(store: ReportStore, allow_private: bool) -> Self {
        Self {
            store: Arc::new(store),
            allow_private,
        }
    }
}

/// Body of every `/analyze/*` call except `broken`
#[derive(Debug, Default, Deserialize)]
pub struct AuditRequest {
    #[serde(default)]
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Extra pages for theme/plugin fingerprinting
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Body carrying content report groups
#[derive(Debug, Default, Deserialize)]
pub struct GroupsRequest {
    #[serde(default)]
    pub groups: Vec<ReportGroup>,
}

/// Error response as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::InvalidUrl(_) | Error::InvalidReportKey(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

impl AuditRequest {
    async fn site(&self, state: &AppState) -> crate::Result<Site> {
        Site::builder(&self.url)
            .credentials(self.username.clone(), self.password.clone())
            .allow_private(state.allow_private)
            .build()
            .await
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze/content", post(analyze_content))
        .route("/analyze/seo", post(analyze_seo))
        .route("/analyze/accessibility", post(analyze_accessibility_route))
        .route("/analyze/security", post(analyze_security_route))
        .route("/analyze/theme-plugin", post(analyze_theme_plugin_route))
        .route("/analyze/users", post(analyze_users))
        .route("/analyze/performance", post(analyze_performance))
        .route("/analyze/broken", post(analyze_broken))
        .route("/reports/:domain", get(list_reports).post(save_report))
        .route(
            "/reports/:domain/:filename",
            get(download_report).delete(delete_report),
        )
        .route("/download_csv", post(download_csv))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::Server)?;
    info!(%addr, reports = %state.store.root().display(), "listening");
    axum::serve(listener, router(state))
        .await
        .map_err(Error::Server)
}

async fn analyze_content(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let site = req.site(&state).await?;
    Ok(Json(aggregate_content(&site).await))
}

async fn analyze_seo(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let site = req.site(&state).await?;
    Ok(Json(audit_seo(&site).await?))
}

async fn analyze_accessibility_route(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let site = req.site(&state).await?;
    Ok(Json(analyze_accessibility(&site).await?))
}

async fn analyze_security_route(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let site = req.site(&state).await?;
    Ok(Json(analyze_security(&site).await?))
}

async fn analyze_theme_plugin_route(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let site = req.site(&state).await?;
    Ok(Json(analyze_theme_plugin(&site, &req.urls).await))
}

async fn analyze_users(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let site = req.site(&state).await?;
    Ok(Json(enumerate_users(&site).await?))
}

async fn analyze_performance(
    State(state): State<AppState>,
    Json(req): Json<AuditRequest>,
) -> ApiResult<impl IntoResponse> {
    let site = req.site(&state).await?;
    Ok(Json(measure_performance(&site).await?))
}

async fn analyze_broken(
    State(state): State<AppState>,
    Json(req): Json<GroupsRequest>,
) -> ApiResult<impl IntoResponse> {
    let checker = LinkChecker::new(state.allow_private)?;
    Ok(Json(checker.find_broken(&req.groups).await))
}

async fn list_reports(
    State(state): State<AppState>,
    Path(domain): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.store.list(&domain)?))
}

async fn save_report(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(report): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let filename = state.store.save(&domain, &report)?;
    Ok(Json(json!({ "saved": true, "filename": filename })))
}

async fn download_report(
    State(state): State<AppState>,
    Path((domain, filename)): Path<(String, String)>,
) -> ApiResult<Response> {
    let Some(report) = state.store.load(&domain, &filename)? else {
        return Ok((StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response());
    };
    let body = serde_json::to_string_pretty(&report).map_err(Error::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response())
}

async fn delete_report(
    State(state): State<AppState>,
    Path((domain, filename)): Path<(String, String)>,
) -> ApiResult<impl IntoResponse> {
    let deleted = state.store.delete(&domain, &filename)?;
    let status = if deleted {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(json!({ "deleted": deleted }))))
}

async fn download_csv(Json(req): Json<GroupsRequest>) -> ApiResult<impl IntoResponse> {
    let csv = to_csv_string(&req.groups)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=content.csv"),
        ],
        csv,
    ))
}
