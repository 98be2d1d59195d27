// Test doubles for the messaging gateway and the submission store

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vacancy_intake::session::{default_tracks, SessionConfig};
use vacancy_intake::{
    AttachmentRef, Clock, Keyboard, MessagingGateway, SessionId, SessionManager, SubmissionKey,
    SubmissionStore, TrackCatalog,
};

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub session_id: SessionId,
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

/// Gateway that records outgoing messages and serves canned attachments
#[derive(Default)]
pub struct RecordingGateway {
    sent: Mutex<Vec<SentMessage>>,
    attachments: Mutex<HashMap<String, Vec<u8>>>,
    fail_fetch: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
}

impl RecordingGateway {
    pub fn add_attachment(&self, file_id: &str, bytes: &[u8]) {
        self.attachments
            .lock()
            .unwrap()
            .insert(file_id.to_string(), bytes.to_vec());
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    /// Make every attachment download take `delay`
    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, session_id: &str) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.session_id.as_str() == session_id)
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|m| m.text.clone())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_message(
        &self,
        session_id: &SessionId,
        text: &str,
        keyboard: Option<Keyboard>,
    ) -> Result<()> {
        self.sent.lock().unwrap().push(SentMessage {
            session_id: session_id.clone(),
            text: text.to_string(),
            keyboard,
        });
        Ok(())
    }

    async fn fetch_attachment(&self, attachment: &AttachmentRef) -> Result<Vec<u8>> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(anyhow!("download of {} failed", attachment));
        }
        self.attachments
            .lock()
            .unwrap()
            .get(attachment.as_str())
            .cloned()
            .ok_or_else(|| anyhow!("unknown attachment {}", attachment))
    }
}

#[derive(Debug, Clone, Default)]
pub struct StoredSubmission {
    pub text: Option<String>,
    pub voice: Option<Vec<u8>>,
}

/// In-memory submission store
#[derive(Default)]
pub struct MemoryStore {
    submissions: Mutex<HashMap<String, StoredSubmission>>,
    fail_binary: AtomicBool,
}

impl MemoryStore {
    pub fn set_fail_binary(&self, fail: bool) {
        self.fail_binary.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, key: &str) -> Option<StoredSubmission> {
        self.submissions.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.submissions.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait::async_trait]
impl SubmissionStore for MemoryStore {
    async fn write_text(&self, key: &SubmissionKey, content: &str) -> Result<PathBuf> {
        self.submissions
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .text = Some(content.to_string());
        Ok(PathBuf::from(key.as_str()).join("answers.txt"))
    }

    async fn write_binary(&self, key: &SubmissionKey, bytes: &[u8]) -> Result<PathBuf> {
        if self.fail_binary.load(Ordering::SeqCst) {
            return Err(anyhow!("disk full"));
        }
        self.submissions
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .voice = Some(bytes.to_vec());
        Ok(PathBuf::from(key.as_str()).join("voice_message.ogg"))
    }
}

/// 2023-11-14T22:13:20Z
pub fn fixed_start() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
}

pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub gateway: Arc<RecordingGateway>,
    pub store: Arc<MemoryStore>,
    pub clock: Clock,
}

/// Manager over the default tracks with a manual clock at [`fixed_start`]
pub fn harness() -> Harness {
    harness_with(TrackCatalog::new(default_tracks()).unwrap(), SessionConfig::default())
}

pub fn harness_with(catalog: TrackCatalog, config: SessionConfig) -> Harness {
    let gateway = Arc::new(RecordingGateway::default());
    let store = Arc::new(MemoryStore::default());
    let clock = Clock::manual(fixed_start());

    let manager = SessionManager::new(catalog, gateway.clone(), store.clone(), config)
        .with_clock(clock.clone());

    Harness {
        manager: Arc::new(manager),
        gateway,
        store,
        clock,
    }
}
