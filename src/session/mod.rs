//! Conversation session management
//!
//! This module provides the `SessionManager` that tracks, per chat:
//! - Track (vacancy) selection
//! - Progress through the track's questions and the collected answers
//! - Voice capture and the final persistence of the application
//! - Idle expiry of abandoned conversations

mod clock;
mod config;
mod manager;
mod state;
mod stats;
mod sweeper;
mod track;

pub use clock::Clock;
pub use config::{Prompts, SessionConfig};
pub use manager::{Outcome, SessionManager, SubmissionReceipt};
pub use state::{
    Answer, AttachmentRef, IgnoreReason, InvalidSessionId, Phase, PhaseKind, Prompt, Session,
    SessionId, MAX_SESSION_ID_LEN,
};
pub use stats::SessionSnapshot;
pub use sweeper::spawn_sweeper;
pub use track::{default_tracks, Track, TrackCatalog};
