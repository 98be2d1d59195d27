use crate::session::{Answer, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage key `<session_id>_<unix millis>`
///
/// The timestamp keeps repeated submissions from one chat apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionKey(String);

impl SubmissionKey {
    pub fn new(session_id: &SessionId, at: DateTime<Utc>) -> Self {
        Self(format!("{}_{}", session_id, at.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render answers as `Question:`/`Answer:` blocks separated by blank lines
pub fn format_answers(answers: &[Answer]) -> String {
    answers
        .iter()
        .map(|a| format!("Question: {}\nAnswer: {}\n", a.question, a.answer))
        .collect::<Vec<_>>()
        .join("\n")
}
