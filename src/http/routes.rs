use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the admin HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/tracks", get(handlers::list_tracks))
        // Session inspection and control
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/sweep", post(handlers::sweep_sessions))
        .route(
            "/sessions/:session_id",
            get(handlers::get_session).delete(handlers::abandon_session),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
