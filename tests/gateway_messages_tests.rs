use base64::Engine;
use vacancy_intake::gateway::messages::{AttachmentReply, AttachmentRequest, OutboundMessage};
use vacancy_intake::{Keyboard, SessionId};

#[test]
fn test_outbound_message_serialization() {
    let msg = OutboundMessage {
        chat_id: SessionId::from(42_i64),
        text: "Welcome!".to_string(),
        keyboard: Some(Keyboard::one_time_choice(["Frontend Developer", "Project Manager"])),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"chat_id\":\"42\""));
    assert!(json.contains("\"rows\":[[\"Frontend Developer\"],[\"Project Manager\"]]"));
    assert!(json.contains("\"resize\":true"));

    let deserialized: OutboundMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.chat_id.as_str(), "42");
    assert_eq!(deserialized.keyboard.unwrap().rows.len(), 2);
}

#[test]
fn test_outbound_without_keyboard() {
    let msg = OutboundMessage {
        chat_id: "S1".into(),
        text: "What is your work experience?".to_string(),
        keyboard: None,
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"keyboard\":null"));
}

#[test]
fn test_attachment_request_shape() {
    let json = serde_json::to_string(&AttachmentRequest {
        file_id: "AwACAgIAAxkBAAIB".to_string(),
    })
    .unwrap();
    assert_eq!(json, r#"{"file_id":"AwACAgIAAxkBAAIB"}"#);
}

#[test]
fn test_attachment_reply_with_data() {
    let encoded = base64::engine::general_purpose::STANDARD.encode(b"OggS\x00\x02");
    let json = format!(r#"{{"file_id":"f1","data":"{}"}}"#, encoded);

    let reply: AttachmentReply = serde_json::from_str(&json).unwrap();
    assert_eq!(reply.file_id, "f1");
    assert!(reply.error.is_none());

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(reply.data.unwrap())
        .unwrap();
    assert_eq!(decoded, b"OggS\x00\x02".to_vec());
}

#[test]
fn test_attachment_reply_with_error() {
    let reply: AttachmentReply =
        serde_json::from_str(r#"{"file_id":"f1","error":"file is too big"}"#).unwrap();
    assert!(reply.data.is_none());
    assert_eq!(reply.error.as_deref(), Some("file is too big"));
}
