use super::clock::Clock;
use super::config::SessionConfig;
use super::state::{AttachmentRef, IgnoreReason, PhaseKind, Prompt, Session, SessionId};
use super::stats::SessionSnapshot;
use super::track::TrackCatalog;
use crate::error::FinalizeError;
use crate::gateway::{InboundEvent, Keyboard, MessagingGateway};
use crate::store::{format_answers, SubmissionKey, SubmissionStore};
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info, warn};

type SessionEntry = Arc<Mutex<Session>>;

/// Result of feeding one event into the state machine
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A fresh session replaced whatever was there
    Started,
    /// Nothing changed
    Ignored(IgnoreReason),
    /// The session moved on and is now in this phase
    Advanced(PhaseKind),
    /// The application was stored and the session removed
    Finalized(SubmissionReceipt),
}

/// Where a finalized application was written
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub key: SubmissionKey,
    pub answers_path: PathBuf,
    pub voice_path: PathBuf,
    pub answer_count: usize,
}

/// Owns every active conversation and drives its transitions
///
/// Each session sits behind its own mutex, held for the whole handling of
/// an event (finalize I/O included), so a session has one writer at a time.
/// Lock order is session, then map; the map is never held while awaiting a
/// session lock.
pub struct SessionManager {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    catalog: TrackCatalog,
    gateway: Arc<dyn MessagingGateway>,
    store: Arc<dyn SubmissionStore>,
    clock: Clock,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        catalog: TrackCatalog,
        gateway: Arc<dyn MessagingGateway>,
        store: Arc<dyn SubmissionStore>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            catalog,
            gateway,
            store,
            clock: Clock::system(),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    /// Route an inbound event to the matching operation
    pub async fn handle_event(&self, event: InboundEvent) -> Result<Outcome, FinalizeError> {
        match event {
            InboundEvent::Begin { session_id } => Ok(self.begin_session(&session_id).await),
            InboundEvent::Text { session_id, text } => {
                Ok(self.handle_text(&session_id, &text).await)
            }
            InboundEvent::Voice {
                session_id,
                attachment,
            } => self.handle_voice(&session_id, attachment).await,
        }
    }

    /// Start over for `session_id` and offer the track keyboard
    pub async fn begin_session(&self, session_id: &SessionId) -> Outcome {
        let session = Session::new(session_id.clone(), self.clock.now());

        let replaced = {
            let mut sessions = self.sessions.write().await;
            sessions
                .insert(session_id.clone(), Arc::new(Mutex::new(session)))
                .is_some()
        };

        info!(
            "Session {} started{}",
            session_id,
            if replaced { " (replaced previous)" } else { "" }
        );

        let keyboard = Keyboard::one_time_choice(self.catalog.names());
        self.notify(session_id, &self.config.prompts.welcome, Some(keyboard))
            .await;

        Outcome::Started
    }

    /// Track selection while none is chosen, otherwise the next answer
    pub async fn handle_text(&self, session_id: &SessionId, text: &str) -> Outcome {
        let Some((_, mut session)) = self.lock_current(session_id).await else {
            return self.ignored(session_id, IgnoreReason::NoSession);
        };

        let now = self.clock.now();
        let result = if session.selected_track().is_none() {
            match self.catalog.find(text) {
                Some(track) => {
                    info!("Session {} selected track '{}'", session_id, track.name);
                    session.select_track(track, now)
                }
                None => Err(IgnoreReason::UnrecognizedTrack),
            }
        } else {
            session.record_answer(text, now)
        };

        match result {
            Ok(prompt) => {
                let phase = session.phase().kind();
                debug!(
                    "Session {} at question {} ({})",
                    session_id,
                    session.question_cursor(),
                    phase
                );
                self.ask(session_id, prompt).await;
                Outcome::Advanced(phase)
            }
            Err(reason) => self.ignored(session_id, reason),
        }
    }

    /// Accept the voice recording and persist the application
    ///
    /// On error the session stays in the voice step with the reference
    /// cleared and the applicant is asked to send the recording again.
    pub async fn handle_voice(
        &self,
        session_id: &SessionId,
        attachment: AttachmentRef,
    ) -> Result<Outcome, FinalizeError> {
        let Some((entry, mut session)) = self.lock_current(session_id).await else {
            return Ok(self.ignored(session_id, IgnoreReason::NoSession));
        };

        if let Err(reason) = session.attach_voice(attachment, self.clock.now()) {
            return Ok(self.ignored(session_id, reason));
        }

        match self.finalize(&entry, &mut session).await {
            Ok(receipt) => Ok(Outcome::Finalized(receipt)),
            Err(e) => {
                error!("Failed to finalize session {}: {}", session_id, e);
                session.clear_voice();
                self.notify(session_id, &self.config.prompts.finalize_failed, None)
                    .await;
                Err(e)
            }
        }
    }

    /// Persist answers and voice, confirm, and drop the session
    async fn finalize(
        &self,
        entry: &SessionEntry,
        session: &mut Session,
    ) -> Result<SubmissionReceipt, FinalizeError> {
        let voice = session.voice().cloned().ok_or(FinalizeError::MissingVoice)?;
        let key = SubmissionKey::new(session.id(), self.clock.now());

        info!("Finalizing session {} as {}", session.id(), key);

        let bytes = self
            .gateway
            .fetch_attachment(&voice)
            .await
            .map_err(FinalizeError::Fetch)?;

        let answers_path = self
            .store
            .write_text(&key, &format_answers(session.answers()))
            .await
            .map_err(FinalizeError::Store)?;

        let voice_path = self
            .store
            .write_binary(&key, &bytes)
            .await
            .map_err(FinalizeError::Store)?;

        session.mark_finalized();

        let receipt = SubmissionReceipt {
            key,
            answers_path,
            voice_path,
            answer_count: session.answers().len(),
        };

        self.notify(session.id(), &self.config.prompts.confirmation, None)
            .await;
        self.remove_if_current(session.id(), entry).await;

        info!(
            "Session {} finalized ({} answers stored under {})",
            session.id(),
            receipt.answer_count,
            receipt.key
        );

        Ok(receipt)
    }

    /// Copy of the session state, if active
    pub async fn snapshot(&self, session_id: &SessionId) -> Option<SessionSnapshot> {
        let entry = self.sessions.read().await.get(session_id).cloned()?;
        let session = entry.lock().await;
        Some(SessionSnapshot::from(&*session))
    }

    /// Copies of every active session, ordered by id
    pub async fn snapshots(&self) -> Vec<SessionSnapshot> {
        let entries: Vec<SessionEntry> = self.sessions.read().await.values().cloned().collect();

        let mut snapshots = Vec::with_capacity(entries.len());
        for entry in entries {
            let session = entry.lock().await;
            snapshots.push(SessionSnapshot::from(&*session));
        }
        snapshots.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        snapshots
    }

    /// Drop a session without persisting anything
    pub async fn abandon(&self, session_id: &SessionId) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!("Session {} abandoned", session_id);
        }
        removed
    }

    /// Remove sessions idle for longer than the configured TTL
    ///
    /// Sessions busy with an event are skipped; they are active by definition.
    pub async fn sweep_expired(&self) -> Vec<SessionId> {
        let Ok(ttl) = chrono::Duration::from_std(self.config.ttl) else {
            warn!("Session TTL out of range, skipping sweep");
            return Vec::new();
        };
        let cutoff = self.clock.now() - ttl;

        let mut sessions = self.sessions.write().await;
        let expired: Vec<SessionId> = sessions
            .iter()
            .filter_map(|(id, entry)| {
                let session = entry.try_lock().ok()?;
                (session.last_activity() < cutoff).then(|| id.clone())
            })
            .collect();

        for id in &expired {
            sessions.remove(id);
        }

        if !expired.is_empty() {
            info!("Expired {} idle session(s)", expired.len());
        }

        expired
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Lock the session registered for `session_id`
    ///
    /// Returns `None` if the entry was replaced or removed while waiting.
    async fn lock_current(
        &self,
        session_id: &SessionId,
    ) -> Option<(SessionEntry, OwnedMutexGuard<Session>)> {
        let entry = self.sessions.read().await.get(session_id).cloned()?;
        let guard = Arc::clone(&entry).lock_owned().await;

        let current = self
            .sessions
            .read()
            .await
            .get(session_id)
            .is_some_and(|e| Arc::ptr_eq(e, &entry));

        current.then_some((entry, guard))
    }

    /// Remove `entry` unless a newer session already took its place
    async fn remove_if_current(&self, session_id: &SessionId, entry: &SessionEntry) {
        let mut sessions = self.sessions.write().await;
        if sessions
            .get(session_id)
            .is_some_and(|e| Arc::ptr_eq(e, entry))
        {
            sessions.remove(session_id);
        }
    }

    async fn ask(&self, session_id: &SessionId, prompt: Prompt) {
        match prompt {
            Prompt::Question(question) => self.notify(session_id, &question, None).await,
            Prompt::VoiceRequest => {
                self.notify(session_id, &self.config.prompts.voice_request, None)
                    .await
            }
        }
    }

    /// Send a message; transport failures are logged, never fatal
    async fn notify(&self, session_id: &SessionId, text: &str, keyboard: Option<Keyboard>) {
        if let Err(e) = self.gateway.send_message(session_id, text, keyboard).await {
            error!("Failed to send message to {}: {:#}", session_id, e);
        }
    }

    fn ignored(&self, session_id: &SessionId, reason: IgnoreReason) -> Outcome {
        debug!("Ignoring event for {}: {}", session_id, reason);
        Outcome::Ignored(reason)
    }
}
