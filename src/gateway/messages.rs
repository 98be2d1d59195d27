use crate::session::{AttachmentRef, SessionId};
use serde::{Deserialize, Deserializer, Serialize};

/// Command text that (re)starts a conversation
pub const BEGIN_COMMAND: &str = "/start";

/// Message received from the chat platform adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Text {
        #[serde(deserialize_with = "chat_id")]
        chat_id: SessionId,
        text: String,
    },
    Voice {
        #[serde(deserialize_with = "chat_id")]
        chat_id: SessionId,
        file_id: String,
    },
}

/// Chat ids arrive as JSON numbers from some adapters, strings from others.
/// Ids that are not safe as a file name and subject token are rejected.
fn chat_id<'de, D>(deserializer: D) -> Result<SessionId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(id) => Ok(SessionId::from(id)),
        Raw::Text(id) => SessionId::parse(id).map_err(<D::Error as serde::de::Error>::custom),
    }
}

/// Message published for delivery to a chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: SessionId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
    pub timestamp: String, // RFC3339 timestamp
}

/// Reply keyboard shown under a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
    /// Hide the keyboard after one press
    pub one_time: bool,
    pub resize: bool,
}

impl Keyboard {
    /// One-shot keyboard with one button per row
    pub fn one_time_choice<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            rows: labels.into_iter().map(|l| vec![l.to_string()]).collect(),
            one_time: true,
            resize: true,
        }
    }
}

/// Request for the bytes behind a file id
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentRequest {
    pub file_id: String,
}

/// Reply to an [`AttachmentRequest`]
#[derive(Debug, Serialize, Deserialize)]
pub struct AttachmentReply {
    pub file_id: String,
    /// Base64-encoded file content
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Event driving the session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Begin {
        session_id: SessionId,
    },
    Text {
        session_id: SessionId,
        text: String,
    },
    Voice {
        session_id: SessionId,
        attachment: AttachmentRef,
    },
}

impl InboundEvent {
    pub fn session_id(&self) -> &SessionId {
        match self {
            InboundEvent::Begin { session_id }
            | InboundEvent::Text { session_id, .. }
            | InboundEvent::Voice { session_id, .. } => session_id,
        }
    }
}

impl From<InboundMessage> for InboundEvent {
    fn from(msg: InboundMessage) -> Self {
        match msg {
            InboundMessage::Text { chat_id, text } if text.trim_start().starts_with(BEGIN_COMMAND) => {
                InboundEvent::Begin {
                    session_id: chat_id,
                }
            }
            InboundMessage::Text { chat_id, text } => InboundEvent::Text {
                session_id: chat_id,
                text,
            },
            InboundMessage::Voice { chat_id, file_id } => InboundEvent::Voice {
                session_id: chat_id,
                attachment: AttachmentRef::new(file_id),
            },
        }
    }
}
