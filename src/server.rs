//! Web server module for packetlog.
//!
//! Provides the read API over stored records and serves static files.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::storage::{ListQuery, RecordReader};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub reader: RecordReader,
    /// Directory served for any path not matched by the API.
    pub static_dir: PathBuf,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
}

/// Query parameters for the record listing.
///
/// Kept as strings so malformed numbers fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub offset: Option<String>,
    pub limit: Option<String>,
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    let app_state = Arc::new(state);

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/data", get(list_handler))
        .route("/data/{id}", get(payload_handler))
        .fallback_service(static_files)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        db: None,
    })
}

/// Readiness probe that checks the record store answers queries.
async fn readyz_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.reader.count().await {
        Ok(_) => Json(HealthResponse {
            status: "ok".to_string(),
            db: Some("ready".to_string()),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not_ready".to_string(),
                    db: Some("unavailable".to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Record listing, newest first, as indented JSON.
async fn list_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Response {
    let query = ListQuery::from_params(params.offset.as_deref(), params.limit.as_deref());

    let records = match state.reader.list(query).await {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(
                error = %e,
                offset = query.offset(),
                limit = query.limit(),
                "Unable to list records"
            );
            return (StatusCode::NOT_FOUND, "Error listing records").into_response();
        }
    };

    match serde_json::to_string_pretty(&records) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error converting data to JSON: {e}"),
        )
            .into_response(),
    }
}

/// Raw payload of one record.
async fn payload_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    let Ok(record_id) = id.parse::<i64>() else {
        return (StatusCode::BAD_REQUEST, "Invalid id").into_response();
    };

    match state.reader.get(record_id).await {
        Ok(record) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            record.payload,
        )
            .into_response(),
        Err(e) => {
            if e.is_not_found() {
                tracing::debug!(id = record_id, "Record not found");
            } else {
                tracing::error!(error = %e, id = record_id, "Record lookup failed");
            }
            (StatusCode::NOT_FOUND, format!("Data {id} not found")).into_response()
        }
    }
}
