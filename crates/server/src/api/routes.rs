use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, publish};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Routes behind the configured authenticator
    let protected = Router::new()
        .route("/config", get(handlers::get_config))
        .route("/beats/publish", post(publish::publish_beat))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
