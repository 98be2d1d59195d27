//! Per-session event ordering
//!
//! Inbound events are queued per session id and handled by one worker task
//! per session, so a session sees its events in arrival order while
//! different sessions run concurrently.

use crate::gateway::InboundEvent;
use crate::session::{Outcome, SessionId, SessionManager};
use futures::stream::{Stream, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Event type without its payload, for logs
#[derive(Debug)]
enum EventKind {
    Begin,
    Text,
    Voice,
}

impl EventKind {
    fn of(event: &InboundEvent) -> Self {
        match event {
            InboundEvent::Begin { .. } => EventKind::Begin,
            InboundEvent::Text { .. } => EventKind::Text,
            InboundEvent::Voice { .. } => EventKind::Voice,
        }
    }
}

struct Worker {
    tx: mpsc::Sender<InboundEvent>,
    handle: JoinHandle<()>,
}

/// Fans inbound events out to per-session workers
pub struct Dispatcher {
    manager: Arc<SessionManager>,
    workers: HashMap<SessionId, Worker>,
    queue_capacity: usize,
    idle_timeout: Duration,
}

impl Dispatcher {
    pub fn new(manager: Arc<SessionManager>, queue_capacity: usize, idle_timeout: Duration) -> Self {
        Self {
            manager,
            workers: HashMap::new(),
            queue_capacity: queue_capacity.max(1),
            idle_timeout,
        }
    }

    /// Consume events until the stream ends, then wait for queued work
    pub async fn run<S>(mut self, events: S)
    where
        S: Stream<Item = InboundEvent>,
    {
        info!("Dispatcher started");

        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            self.dispatch(event).await;
        }

        info!("Inbound stream closed");
        self.shutdown().await;
    }

    /// Queue `event` behind earlier events of the same session
    ///
    /// Never waits on a session's worker: when its queue is full the event
    /// is dropped, so one stalled session cannot hold up the others.
    pub async fn dispatch(&mut self, event: InboundEvent) {
        let session_id = event.session_id().clone();
        let mut event = event;

        if let Some(worker) = self.workers.get(&session_id) {
            match worker.tx.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(dropped)) => {
                    warn!(
                        "Queue for {} is full, dropping {:?}",
                        session_id,
                        EventKind::of(&dropped)
                    );
                    return;
                }
                // Worker went idle and closed its queue
                Err(TrySendError::Closed(returned)) => event = returned,
            }
        }

        let previous = self.workers.remove(&session_id).map(|w| w.handle);
        let worker = self.spawn_worker(session_id.clone(), previous);
        if worker.tx.try_send(event).is_err() {
            error!("Worker for {} stopped before its first event", session_id);
        }
        self.workers.insert(session_id, worker);

        self.workers.retain(|_, w| !w.handle.is_finished());
    }

    /// Number of live workers
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Close every queue and wait for the workers to drain them
    pub async fn shutdown(self) {
        let handles: Vec<JoinHandle<()>> = self
            .workers
            .into_values()
            .map(|Worker { tx, handle }| {
                drop(tx);
                handle
            })
            .collect();

        info!("Waiting for {} session worker(s)", handles.len());

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Session worker panicked: {}", e);
            }
        }
    }

    fn spawn_worker(&self, session_id: SessionId, previous: Option<JoinHandle<()>>) -> Worker {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let manager = Arc::clone(&self.manager);
        let idle_timeout = self.idle_timeout;

        let handle = tokio::spawn(async move {
            // The previous worker may still be draining its queue
            if let Some(previous) = previous {
                if let Err(e) = previous.await {
                    error!("Previous worker for {} panicked: {}", session_id, e);
                }
            }
            run_worker(manager, session_id, rx, idle_timeout).await;
        });

        Worker { tx, handle }
    }
}

async fn run_worker(
    manager: Arc<SessionManager>,
    session_id: SessionId,
    mut rx: mpsc::Receiver<InboundEvent>,
    idle_timeout: Duration,
) {
    debug!("Worker for {} started", session_id);

    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(event)) => handle(&manager, event).await,
            Ok(None) => break,
            Err(_) => {
                rx.close();
                while let Ok(event) = rx.try_recv() {
                    handle(&manager, event).await;
                }
                break;
            }
        }
    }

    debug!("Worker for {} stopped", session_id);
}

async fn handle(manager: &SessionManager, event: InboundEvent) {
    let session_id = event.session_id().clone();

    match manager.handle_event(event).await {
        Ok(Outcome::Finalized(receipt)) => {
            info!("Application from {} stored as {}", session_id, receipt.key);
        }
        Ok(outcome) => debug!("Event for {} -> {:?}", session_id, outcome),
        Err(e) => warn!("Voice submission from {} not stored: {}", session_id, e),
    }
}
