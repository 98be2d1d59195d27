use super::track::Track;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque per-chat conversation identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

/// Longest identifier accepted from the wire
pub const MAX_SESSION_ID_LEN: usize = 64;

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Accept `id` only if it is usable as a path component and a NATS token
    pub fn parse(id: impl Into<String>) -> Result<Self, InvalidSessionId> {
        let id = id.into();
        if is_well_formed(&id) {
            Ok(Self(id))
        } else {
            Err(InvalidSessionId(id))
        }
    }

    /// Non-empty, at most [`MAX_SESSION_ID_LEN`] chars of `[A-Za-z0-9_-]`
    pub fn is_well_formed(&self) -> bool {
        is_well_formed(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_well_formed(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Identifier rejected by [`SessionId::parse`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid session id {0:?}: expected 1-64 characters of [A-Za-z0-9_-]")]
pub struct InvalidSessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for SessionId {
    fn from(chat_id: i64) -> Self {
        Self(chat_id.to_string())
    }
}

/// Gateway-side handle of a voice recording, resolved only at finalize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(String);

impl AttachmentRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: String,
}

/// Where a conversation currently is
#[derive(Debug, Clone)]
pub enum Phase {
    SelectingTrack,
    Answering { track: Arc<Track> },
    AwaitingVoice { track: Arc<Track> },
    Finalized { track: Arc<Track> },
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::SelectingTrack => PhaseKind::SelectingTrack,
            Phase::Answering { .. } => PhaseKind::Answering,
            Phase::AwaitingVoice { .. } => PhaseKind::AwaitingVoice,
            Phase::Finalized { .. } => PhaseKind::Finalized,
        }
    }

    pub fn track(&self) -> Option<&Arc<Track>> {
        match self {
            Phase::SelectingTrack => None,
            Phase::Answering { track }
            | Phase::AwaitingVoice { track }
            | Phase::Finalized { track } => Some(track),
        }
    }
}

/// Data-free mirror of [`Phase`] for logs, outcomes and the admin API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    SelectingTrack,
    Answering,
    AwaitingVoice,
    Finalized,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhaseKind::SelectingTrack => "selecting_track",
            PhaseKind::Answering => "answering",
            PhaseKind::AwaitingVoice => "awaiting_voice",
            PhaseKind::Finalized => "finalized",
        };
        f.write_str(name)
    }
}

/// Why an inbound event left the session untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NoSession,
    UnrecognizedTrack,
    TextWhileAwaitingVoice,
    VoiceOutOfSequence,
    AlreadyFinalized,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            IgnoreReason::NoSession => "no active session",
            IgnoreReason::UnrecognizedTrack => "text matches no track",
            IgnoreReason::TextWhileAwaitingVoice => "text received while awaiting voice",
            IgnoreReason::VoiceOutOfSequence => "voice received out of sequence",
            IgnoreReason::AlreadyFinalized => "session already finalized",
        };
        f.write_str(reason)
    }
}

/// What the applicant must be asked after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Question(String),
    VoiceRequest,
}

/// Per-chat conversation state
///
/// The question cursor is the number of collected answers, so the two can
/// never disagree.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    phase: Phase,
    answers: Vec<Answer>,
    voice: Option<AttachmentRef>,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            phase: Phase::SelectingTrack,
            answers: Vec::new(),
            voice: None,
            started_at: now,
            last_activity: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn selected_track(&self) -> Option<&Arc<Track>> {
        self.phase.track()
    }

    pub fn question_cursor(&self) -> usize {
        self.answers.len()
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn awaiting_voice(&self) -> bool {
        matches!(self.phase, Phase::AwaitingVoice { .. })
    }

    pub fn voice(&self) -> Option<&AttachmentRef> {
        self.voice.as_ref()
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.phase, Phase::Finalized { .. })
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Fix the track for this conversation and return its first prompt
    pub fn select_track(
        &mut self,
        track: Arc<Track>,
        now: DateTime<Utc>,
    ) -> Result<Prompt, IgnoreReason> {
        match self.phase {
            Phase::SelectingTrack => {}
            Phase::Finalized { .. } => return Err(IgnoreReason::AlreadyFinalized),
            // Once chosen the track is fixed; a track name is just an answer now
            _ => return Err(IgnoreReason::UnrecognizedTrack),
        }

        self.phase = Phase::Answering { track };
        self.last_activity = now;
        Ok(self.advance())
    }

    /// Store `text` as the answer to the current question
    pub fn record_answer(
        &mut self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Prompt, IgnoreReason> {
        let question = match &self.phase {
            Phase::Answering { track } => track.question(self.answers.len()).map(str::to_string),
            Phase::SelectingTrack => return Err(IgnoreReason::UnrecognizedTrack),
            Phase::AwaitingVoice { .. } => return Err(IgnoreReason::TextWhileAwaitingVoice),
            Phase::Finalized { .. } => return Err(IgnoreReason::AlreadyFinalized),
        };

        if let Some(question) = question {
            self.answers.push(Answer {
                question,
                answer: text.to_string(),
            });
        }
        self.last_activity = now;
        Ok(self.advance())
    }

    /// Accept the voice recording; only valid while awaiting voice
    pub fn attach_voice(
        &mut self,
        attachment: AttachmentRef,
        now: DateTime<Utc>,
    ) -> Result<(), IgnoreReason> {
        match self.phase {
            Phase::AwaitingVoice { .. } => {
                self.voice = Some(attachment);
                self.last_activity = now;
                Ok(())
            }
            Phase::Finalized { .. } => Err(IgnoreReason::AlreadyFinalized),
            _ => Err(IgnoreReason::VoiceOutOfSequence),
        }
    }

    /// Drop a voice reference that could not be persisted
    pub fn clear_voice(&mut self) {
        self.voice = None;
    }

    pub fn mark_finalized(&mut self) {
        if let Phase::AwaitingVoice { track } = &self.phase {
            let track = Arc::clone(track);
            self.phase = Phase::Finalized { track };
        }
    }

    /// Next question, or switch to voice capture when none is left
    fn advance(&mut self) -> Prompt {
        let track = match &self.phase {
            Phase::Answering { track } => match track.question(self.answers.len()) {
                Some(question) => return Prompt::Question(question.to_string()),
                None => Arc::clone(track),
            },
            _ => return Prompt::VoiceRequest,
        };

        self.phase = Phase::AwaitingVoice { track };
        Prompt::VoiceRequest
    }
}
