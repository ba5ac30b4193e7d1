//! Host-bridged speech engine
//!
//! For embeddings where the platform owns the recognizer (a browser's Web
//! Speech API, a mobile speech framework). The manager side holds a
//! [`HostBackend`]; the host side holds a [`HostBridge`], receives
//! [`HostCommand`]s, and reports engine callbacks tagged with the session id it
//! was handed in `Start`.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use super::engine::{
    BackendKind, EngineEvent, ErrorCode, EventSink, RecognitionBackend, SessionId, StartRequest,
    TranscriptEvent,
};
use crate::error::BackendError;
use crate::state::AuthorizationState;

/// Requests sent to the host
#[derive(Debug)]
pub enum HostCommand {
    Start(StartRequest),
    Stop(SessionId),
    Abort(SessionId),
    RequestPermission {
        reply: oneshot::Sender<AuthorizationState>,
    },
}

#[derive(Debug, Default)]
struct Shared {
    /// Sink of the most recent start; callbacks are retagged onto its channel
    sink: Option<EventSink>,
}

/// Manager-side half
#[derive(Debug)]
pub struct HostBackend {
    commands: flume::Sender<HostCommand>,
    shared: Arc<Mutex<Shared>>,
    available: bool,
}

/// Host-side half
#[derive(Debug, Clone)]
pub struct HostBridge {
    commands: flume::Receiver<HostCommand>,
    shared: Arc<Mutex<Shared>>,
}

/// Create a connected backend/bridge pair. `available` is whether the host
/// platform has a speech engine at all.
pub fn host_backend(available: bool) -> (HostBackend, HostBridge) {
    let (tx, rx) = flume::unbounded();
    let shared = Arc::new(Mutex::new(Shared::default()));
    (
        HostBackend {
            commands: tx,
            shared: Arc::clone(&shared),
            available,
        },
        HostBridge {
            commands: rx,
            shared,
        },
    )
}

impl HostBridge {
    /// Next request from the manager; `None` once the backend is dropped
    pub async fn next_command(&self) -> Option<HostCommand> {
        self.commands.recv_async().await.ok()
    }

    pub fn try_command(&self) -> Option<HostCommand> {
        self.commands.try_recv().ok()
    }

    pub fn on_start(&self, session: SessionId) -> bool {
        self.send(session, EngineEvent::Started)
    }

    pub fn on_result(&self, session: SessionId, text: &str, confidence: f32, is_final: bool) -> bool {
        self.send(
            session,
            EngineEvent::Result(TranscriptEvent::new(text, confidence, is_final)),
        )
    }

    /// `code` is the engine's error string, e.g. "no-speech"
    pub fn on_error(&self, session: SessionId, code: &str) -> bool {
        self.send(session, EngineEvent::Error(ErrorCode::parse(code)))
    }

    pub fn on_end(&self, session: SessionId) -> bool {
        self.send(session, EngineEvent::Ended)
    }

    fn send(&self, session: SessionId, event: EngineEvent) -> bool {
        let shared = self.shared.lock();
        match shared.sink.as_ref() {
            Some(sink) => sink.retagged(session).send(event),
            None => {
                tracing::trace!("Host callback before any start, dropping {:?}", event);
                false
            }
        }
    }
}

#[async_trait]
impl RecognitionBackend for HostBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Host
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn request_permission(&mut self) -> Result<AuthorizationState, BackendError> {
        if !self.available {
            return Err(BackendError::Unavailable);
        }
        let (reply, answer) = oneshot::channel();
        self.commands
            .send(HostCommand::RequestPermission { reply })
            .map_err(|_| BackendError::Disconnected)?;
        answer
            .await
            .map_err(|_| BackendError::Permission("host dropped the request".into()))
    }

    async fn start(&mut self, request: StartRequest, sink: EventSink) -> Result<(), BackendError> {
        self.shared.lock().sink = Some(sink);
        self.commands
            .send(HostCommand::Start(request))
            .map_err(|_| BackendError::Disconnected)
    }

    async fn stop(&mut self, session: SessionId) {
        if self.commands.send(HostCommand::Stop(session)).is_err() {
            tracing::warn!("Host bridge gone, cannot stop session {}", session);
        }
    }

    async fn abort(&mut self, session: SessionId) {
        if self.commands.send(HostCommand::Abort(session)).is_err() {
            tracing::warn!("Host bridge gone, cannot abort session {}", session);
        }
    }
}
