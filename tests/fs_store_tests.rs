// Integration tests for the filesystem submission store
//
// These tests verify the on-disk layout `<root>/<session>_<millis>/`.

mod common;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use vacancy_intake::session::{default_tracks, SessionConfig};
use vacancy_intake::gateway::InboundMessage;
use vacancy_intake::store::{ANSWERS_FILE, VOICE_FILE};
use vacancy_intake::{
    AttachmentRef, Clock, FsSubmissionStore, Outcome, SessionId, SessionManager, SubmissionKey,
    SubmissionStore, TrackCatalog,
};

#[tokio::test]
async fn test_writes_both_artifacts_under_key_directory() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let store = FsSubmissionStore::new(temp_dir.path().join("applications"));
    let at = DateTime::<Utc>::from_timestamp_millis(1_700_000_000_500).unwrap();
    let key = SubmissionKey::new(&SessionId::from(123_i64), at);

    let answers_path = store.write_text(&key, "Question: q\nAnswer: a\n").await?;
    let voice_path = store.write_binary(&key, &[1, 2, 3, 4]).await?;

    let dir = temp_dir.path().join("applications").join("123_1700000000500");
    assert_eq!(answers_path, dir.join(ANSWERS_FILE));
    assert_eq!(voice_path, dir.join(VOICE_FILE));
    assert_eq!(fs::read_to_string(&answers_path)?, "Question: q\nAnswer: a\n");
    assert_eq!(fs::read(&voice_path)?, vec![1, 2, 3, 4]);

    Ok(())
}

#[tokio::test]
async fn test_write_fails_when_root_is_a_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let blocker = temp_dir.path().join("applications");
    fs::write(&blocker, b"not a directory")?;

    let store = FsSubmissionStore::new(&blocker);
    let key = SubmissionKey::new(&SessionId::from("S1"), Utc::now());

    assert!(store.write_text(&key, "text").await.is_err());

    Ok(())
}

#[tokio::test]
async fn test_finalized_session_lands_on_disk() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let gateway = Arc::new(common::RecordingGateway::default());
    gateway.add_attachment("voice-1", b"OggS");
    let store = Arc::new(FsSubmissionStore::new(temp_dir.path()));

    let manager = SessionManager::new(
        TrackCatalog::new(default_tracks())?,
        gateway.clone(),
        store,
        SessionConfig::default(),
    )
    .with_clock(Clock::manual(common::fixed_start()));

    let id = SessionId::from("S1");
    manager.begin_session(&id).await;
    for text in ["Backend Developer", "3 years", "Rust, Go", "Payments platform"] {
        manager.handle_text(&id, text).await;
    }
    let outcome = manager
        .handle_voice(&id, AttachmentRef::new("voice-1"))
        .await?;
    assert!(matches!(outcome, Outcome::Finalized(_)));

    let dir = temp_dir
        .path()
        .join(format!("S1_{}", common::fixed_start().timestamp_millis()));
    let answers = fs::read_to_string(dir.join(ANSWERS_FILE))?;
    assert_eq!(
        answers,
        "Question: What is your work experience?\nAnswer: 3 years\n\n\
         Question: Which programming languages do you use?\nAnswer: Rust, Go\n\n\
         Question: Tell us about a challenging project you worked on\nAnswer: Payments platform\n"
    );
    assert_eq!(fs::read(dir.join(VOICE_FILE))?, b"OggS".to_vec());

    Ok(())
}

#[tokio::test]
async fn test_keys_outside_the_root_are_refused() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let outside = TempDir::new()?;
    let store = FsSubmissionStore::new(temp_dir.path().join("applications"));
    let at = DateTime::<Utc>::from_timestamp_millis(1).unwrap();

    let escapes = [
        format!("{}/evil", outside.path().display()),
        "../evil".to_string(),
        "nested/evil".to_string(),
    ];
    for id in escapes {
        let key = SubmissionKey::new(&SessionId::from(id.as_str()), at);
        assert!(store.submission_dir(&key).is_err(), "{:?} accepted", key);
        assert!(store.write_text(&key, "text").await.is_err());
        assert!(store.write_binary(&key, b"OggS").await.is_err());
    }

    assert!(fs::read_dir(outside.path())?.next().is_none());
    assert!(!temp_dir.path().join("evil_1").exists());

    let key = SubmissionKey::new(&SessionId::from("-100123"), at);
    assert_eq!(
        store.submission_dir(&key)?,
        temp_dir.path().join("applications").join("-100123_1")
    );

    Ok(())
}

#[test]
fn test_path_like_chat_id_never_reaches_the_store() {
    let outside = TempDir::new().unwrap();
    let json = serde_json::json!({
        "type": "text",
        "chat_id": format!("{}/evil", outside.path().display()),
        "text": "/start",
    });

    assert!(serde_json::from_value::<InboundMessage>(json).is_err());
}
