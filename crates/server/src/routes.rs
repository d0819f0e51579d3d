use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;
use service::counter::SharedCounterStore;
use service::observability;

use crate::errors::{self, ApiError};

pub mod clicks;

/// Shared router state; the store is the only piece of it.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedCounterStore,
}

pub async fn health() -> Json<Health> {
    Json(Health::healthy())
}

async fn metrics() -> Response {
    match observability::encode_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => ApiError::internal(format!("metrics encode error: {e}")).into_response(),
    }
}

/// Build the full application router: click API, health and metrics.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/api/clicks", get(clicks::get_clicks).post(clicks::add_clicks))
        .route("/api/health", get(health))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(CatchPanicLayer::custom(errors::handle_panic))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx and panics
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
