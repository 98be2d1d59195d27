//! Admin HTTP API for operators
//!
//! - GET /health - Health check
//! - GET /tracks - Configured vacancies
//! - GET /sessions - Snapshots of active sessions
//! - GET /sessions/:id - One session
//! - DELETE /sessions/:id - Abandon a session
//! - POST /sessions/sweep - Expire idle sessions now

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
