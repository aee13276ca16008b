//! JSON HTTP server.
//!
//! Exposes the directory, one-shot smart search, the assistant and the
//! preference store to browser or script clients.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/tools?category=` | Catalog, grouped by category |
//! | `POST` | `/search` | Resolve `{query, category?}` once |
//! | `POST` | `/chat` | Reply to `{history, message}` |
//! | `GET`  | `/prefs` | Current user preferences |
//! | `POST` | `/prefs/favorites/{id}` | Toggle a favorite |
//! | `POST` | `/prefs/usage/{id}` | Record that a tool was opened |
//! | `GET`  | `/stats/hot?limit=` | Most-clicked tools |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "unknown category: 'x'" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `internal` (500).
//! Assistant failures are not errors: `/chat` always answers with a reply.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use nexus_core::group::{group_by_category, Group};
use nexus_core::models::{CategoryFilter, ChatMessage, UserPreferences};
use nexus_core::prefs::DEFAULT_HOT_LIMIT;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::app::App;
use crate::config::Config;
use crate::search::{search, SearchResponse};
use crate::tools::{hot_tools, open_tool, toggle_favorite, HotTool};

/// Shared state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    app: Arc<App>,
}

/// Starts the HTTP server on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = Arc::new(App::from_config(config)?);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        tools = app.catalog.len(),
        "river nexus listening"
    );
    serve(listener, app).await
}

/// Serve `app` on an already-bound listener.
pub async fn serve(listener: TcpListener, app: Arc<App>) -> anyhow::Result<()> {
    axum::serve(listener, router(app)).await?;
    Ok(())
}

/// The full route table with CORS applied.
pub fn router(app: Arc<App>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/tools", get(handle_tools))
        .route("/search", post(handle_search))
        .route("/chat", post(handle_chat))
        .route("/prefs", get(handle_prefs))
        .route("/prefs/favorites/{id}", post(handle_toggle_favorite))
        .route("/prefs/usage/{id}", post(handle_usage))
        .route("/stats/hot", get(handle_hot))
        .layer(cors)
        .with_state(AppState { app })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: format!("{:#}", err),
    }
}

fn parse_category(raw: Option<&str>) -> Result<CategoryFilter, AppError> {
    match raw {
        Some(raw) => raw.parse::<CategoryFilter>().map_err(bad_request),
        None => Ok(CategoryFilter::All),
    }
}

/// Run preference-store work on the blocking pool; the file store does
/// synchronous I/O.
async fn with_store<T, F>(state: &AppState, work: F) -> Result<T, AppError>
where
    F: FnOnce(&App) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let app = Arc::clone(&state.app);
    tokio::task::spawn_blocking(move || work(&app))
        .await
        .map_err(|e| internal(e.into()))?
        .map_err(internal)
}

fn ensure_known(state: &AppState, id: &str) -> Result<(), AppError> {
    match state.app.item(id) {
        Some(_) => Ok(()),
        None => Err(not_found(format!("tool not found: {}", id))),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /tools ============

#[derive(Deserialize)]
struct ToolsQuery {
    category: Option<String>,
}

#[derive(Serialize)]
struct ToolsResponse {
    category: CategoryFilter,
    count: usize,
    groups: Vec<Group>,
}

async fn handle_tools(
    State(state): State<AppState>,
    query: Result<Query<ToolsQuery>, QueryRejection>,
) -> Result<Json<ToolsResponse>, AppError> {
    let Query(query) = query?;
    let category = parse_category(query.category.as_deref())?;
    let items = state.app.catalog.by_category(category);

    Ok(Json(ToolsResponse {
        category,
        count: items.len(),
        groups: group_by_category(&items, category),
    }))
}

// ============ POST /search ============

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
    category: Option<String>,
}

async fn handle_search(
    State(state): State<AppState>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Json(req) = body?;
    let category = parse_category(req.category.as_deref())?;
    Ok(Json(search(&state.app, &req.query, category).await))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    history: Vec<ChatMessage>,
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    reply: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = body?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err(bad_request("message must not be empty"));
    }
    let reply = crate::chat::reply(&state.app, &req.history, message).await;
    Ok(Json(ChatResponse { reply }))
}

// ============ Preferences ============

async fn handle_prefs(State(state): State<AppState>) -> Result<Json<UserPreferences>, AppError> {
    let prefs = with_store(&state, |app| Ok(app.prefs.load())).await?;
    Ok(Json(prefs))
}

#[derive(Serialize)]
struct FavoriteResponse {
    id: String,
    favorite: bool,
}

async fn handle_toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FavoriteResponse>, AppError> {
    ensure_known(&state, &id)?;
    let tool_id = id.clone();
    let favorite = with_store(&state, move |app| toggle_favorite(app, &tool_id)).await?;
    Ok(Json(FavoriteResponse { id, favorite }))
}

async fn handle_usage(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserPreferences>, AppError> {
    ensure_known(&state, &id)?;
    let prefs = with_store(&state, move |app| open_tool(app, &id)).await?;
    Ok(Json(prefs))
}

// ============ GET /stats/hot ============

#[derive(Deserialize)]
struct HotQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct HotResponse {
    tools: Vec<HotTool>,
}

async fn handle_hot(
    State(state): State<AppState>,
    query: Result<Query<HotQuery>, QueryRejection>,
) -> Result<Json<HotResponse>, AppError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_HOT_LIMIT);
    let tools = with_store(&state, move |app| Ok(hot_tools(app, limit))).await?;
    Ok(Json(HotResponse { tools }))
}
