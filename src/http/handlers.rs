use super::state::AppState;
use crate::session::{SessionId, SessionSnapshot, Track};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub expired: Vec<SessionId>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(session_id: &SessionId) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Session {} not found", session_id),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tracks
/// List the configured vacancies
pub async fn list_tracks(State(state): State<AppState>) -> impl IntoResponse {
    let tracks: Vec<Track> = state.sessions.catalog().tracks().cloned().collect();
    (StatusCode::OK, Json(tracks))
}

/// GET /sessions
/// Snapshot of every active session
pub async fn list_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let snapshots: Vec<SessionSnapshot> = state.sessions.snapshots().await;
    (StatusCode::OK, Json(snapshots))
}

/// GET /sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> impl IntoResponse {
    match state.sessions.snapshot(&session_id).await {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => not_found(&session_id),
    }
}

/// DELETE /sessions/:session_id
/// Abandon a session without storing anything
pub async fn abandon_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> impl IntoResponse {
    info!("Abandon requested for session: {}", session_id);

    if state.sessions.abandon(&session_id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&session_id)
    }
}

/// POST /sessions/sweep
/// Expire idle sessions now instead of waiting for the sweeper
pub async fn sweep_sessions(State(state): State<AppState>) -> impl IntoResponse {
    let expired = state.sessions.sweep_expired().await;
    (StatusCode::OK, Json(SweepResponse { expired }))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
