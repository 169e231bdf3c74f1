//! HTTP server for the item registry.
//!
//! Exposes item reporting, lookup, and the matcher over a small JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/items` | All items, insertion order |
//! | `POST`   | `/items` | Report an item; responds with the item and its matches |
//! | `GET`    | `/items/{id}` | One item |
//! | `PUT`    | `/items/{id}` | Merge the given fields into an item |
//! | `DELETE` | `/items/{id}` | Remove an item |
//! | `GET`    | `/items/{id}/matches` | Ranked potential matches with score breakdown |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "item not found: 42" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `conflict` (409),
//! `internal` (500).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use finditnow_core::error::{MatchError, RegistryError};
use finditnow_core::matching::{find_matches_in, MatchResult};
use finditnow_core::models::{Item, ItemUpdate, NewItem};
use finditnow_core::store::ItemStore;

use crate::config::Config;
use crate::items;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn ItemStore>,
}

/// Build the API router over any [`ItemStore`].
pub fn router(store: Arc<dyn ItemStore>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/items", get(handle_list_items).post(handle_create_item))
        .route(
            "/items/{id}",
            get(handle_get_item)
                .put(handle_update_item)
                .delete(handle_delete_item),
        )
        .route("/items/{id}/matches", get(handle_matches))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { store })
}

/// Starts the HTTP server on `[server].bind` backed by the SQLite store.
///
/// Runs until Ctrl+C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = items::open_store(config).await?;
    let app = router(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "item registry listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::warn!(error = %e, "could not install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
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

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(message = %self.message, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
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

fn conflict(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::CONFLICT,
        code: "conflict",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::ItemNotFound(_) => not_found(err.to_string()),
            MatchError::Store(e) => internal(e.to_string()),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => not_found(err.to_string()),
            RegistryError::Invalid(_) => bad_request(err.to_string()),
            RegistryError::Duplicate(_) => conflict(err.to_string()),
        }
    }
}

/// Typed errors carried in the chain pick the status; anything else is a
/// server fault.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(registry_err) = err.downcast_ref::<RegistryError>() {
            return registry_err.clone().into();
        }
        if let Some(MatchError::ItemNotFound(id)) = err.downcast_ref::<MatchError>() {
            return not_found(format!("item not found: {}", id));
        }
        internal(format!("{:#}", err))
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

// ============ /items ============

async fn handle_list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, AppError> {
    let items = state.store.list_items().await?;
    Ok(Json(items))
}

/// JSON response body for `POST /items`.
#[derive(Serialize)]
struct CreateItemResponse {
    item: Item,
    matches: Vec<MatchResult>,
}

async fn handle_create_item(
    State(state): State<AppState>,
    payload: Result<Json<NewItem>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateItemResponse>), AppError> {
    let Json(new_item) = payload.map_err(|e| bad_request(e.body_text()))?;
    let (item, matches) = items::create_item(state.store.as_ref(), new_item).await?;
    Ok((StatusCode::CREATED, Json(CreateItemResponse { item, matches })))
}

async fn handle_get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, AppError> {
    let item = items::get_item(state.store.as_ref(), &id).await?;
    Ok(Json(item))
}

async fn handle_update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ItemUpdate>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let Json(update) = payload.map_err(|e| bad_request(e.body_text()))?;
    let item = items::update_item(state.store.as_ref(), &id, update).await?;
    Ok(Json(item))
}

async fn handle_delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    items::delete_item(state.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============ GET /items/{id}/matches ============

async fn handle_matches(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<MatchResult>>, AppError> {
    let matches = find_matches_in(state.store.as_ref(), &id).await?;
    Ok(Json(matches))
}
