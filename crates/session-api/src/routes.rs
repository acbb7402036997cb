use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::handlers::{health, session};
use crate::middleware::session_start;
use crate::state::SessionLayer;

pub fn build_router(layer: SessionLayer) -> Router {
    // Public routes (no session)
    let public_routes = Router::new().route("/health", get(health::health_check));

    // Session routes
    let session_routes = Router::new()
        .route("/api/session", get(session::show).delete(session::destroy))
        .route("/api/session/visit", post(session::visit))
        .route("/api/session/data/{key}", put(session::put_value))
        .layer(middleware::from_fn_with_state(layer, session_start));

    Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
