//! HTTP route handlers for the coordinator API.
//!
//! Each handler translates one request into exactly one registry call and
//! renders the result. Handlers own no state.

use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use ssi_common::CoordinatorError;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

mod cluster;
mod endpoints;
mod health;
mod nodes;
mod pages;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = if state.config.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/metrics", get(health::metrics))

        // Cluster lifecycle
        .route(
            "/cluster",
            get(cluster::get_cluster)
                .post(cluster::create_cluster)
                .delete(cluster::destroy_cluster),
        )

        // Membership
        .route("/nodes", get(nodes::list_nodes).post(nodes::add_node))
        .route("/nodes/{node_id}", get(nodes::get_node).delete(nodes::remove_node))

        // Transport endpoint directory
        .route(
            "/nodes/{node_id}/endpoint",
            get(endpoints::get_endpoint).post(endpoints::register_endpoint),
        )
        .route("/endpoints", get(endpoints::list_endpoints))

        // Page ownership
        .route("/pages/{gpa}", get(pages::get_page_info))

        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)

        // Add shared state
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
}

/// Registry error rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(CoordinatorError);

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        tracing::debug!(status = %status, error = %self.0, "Request rejected");

        let body = ErrorResponse {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;
