//! HTTP API handlers and routing.

pub mod error;
mod health;
pub mod request_context;
mod v1;

use axum::{
    http::{header, HeaderName, Method},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::state::AppState;
use request_context::{MakeRequestUlid, REQUEST_ID_HEADER};

/// Create the main API router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static(REQUEST_ID_HEADER);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, request_id_header.clone()])
        .allow_origin(Any);

    Router::new()
        .merge(health::routes())
        .nest("/v1", v1::routes())
        // Layers run bottom-up: the id is set before tracing sees the request.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUlid))
        .with_state(state)
}
