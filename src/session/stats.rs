use super::state::{Answer, PhaseKind, Session, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a session, as served by the admin API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,

    pub phase: PhaseKind,

    /// Name of the selected track, if any
    pub track: Option<String>,

    /// Index of the next question to answer
    pub question_cursor: usize,

    /// Question count of the selected track (0 before selection)
    pub question_count: usize,

    pub answers: Vec<Answer>,

    pub awaiting_voice: bool,

    /// Voice attachment id, present only while it is being finalized
    pub voice_attachment: Option<String>,

    pub finalized: bool,

    pub started_at: DateTime<Utc>,

    pub last_activity: DateTime<Utc>,
}

impl From<&Session> for SessionSnapshot {
    fn from(session: &Session) -> Self {
        let track = session.selected_track();

        Self {
            session_id: session.id().clone(),
            phase: session.phase().kind(),
            track: track.map(|t| t.name.clone()),
            question_cursor: session.question_cursor(),
            question_count: track.map(|t| t.question_count()).unwrap_or(0),
            answers: session.answers().to_vec(),
            awaiting_voice: session.awaiting_voice(),
            voice_attachment: session.voice().map(|v| v.to_string()),
            finalized: session.is_finalized(),
            started_at: session.started_at(),
            last_activity: session.last_activity(),
        }
    }
}
