//! Recognition session driver
//!
//! Owns the backend, the session machine and the timers. Engine events arrive
//! on one flume channel; timers live in a deadline map and the earliest one is
//! raced against the channel. Callers pull [`SessionUpdate`]s with
//! [`SessionManager::next_update`].

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::Ordering;

use tokio::time::{Instant, sleep_until};

use super::engine::{
    BackendKind, ErrorCode, EventSink, ListenMode, RecognitionBackend, StartRequest, TaggedEvent,
};
use super::machine::{Effect, SessionConfig, SessionMachine, SessionSnapshot, SessionUpdate, TimerKind};
use crate::error::{BackendError, RecognitionError, VoiceError};
use crate::locale::Language;
use crate::state::{AuthorizationState, SessionStatus, SharedState};

pub struct SessionManager {
    backend: Box<dyn RecognitionBackend>,
    machine: SessionMachine,
    state: SharedState,
    language: Language,
    interim_results: bool,
    events_tx: flume::Sender<TaggedEvent>,
    events_rx: flume::Receiver<TaggedEvent>,
    timers: BTreeMap<TimerKind, Instant>,
    pending: VecDeque<SessionUpdate>,
}

impl SessionManager {
    pub fn new(
        backend: Box<dyn RecognitionBackend>,
        config: SessionConfig,
        state: SharedState,
        language: Language,
        interim_results: bool,
    ) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        let machine = SessionMachine::new(config, state.confidence_threshold());
        tracing::debug!("Session manager using {} backend ({})", backend.kind(), language);
        Self {
            backend,
            machine,
            state,
            language,
            interim_results,
            events_tx,
            events_rx,
            timers: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.machine.status()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.machine.snapshot()
    }

    pub fn is_active(&self) -> bool {
        self.machine.is_active()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Applies from the next engine start
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    pub async fn request_authorization(&mut self) -> Result<AuthorizationState, VoiceError> {
        if !self.backend.is_available() {
            self.mark_unsupported();
            return Err(VoiceError::EnvironmentUnsupported);
        }

        self.machine.begin_authorization();
        self.sync_state();
        let answer = self.backend.request_permission().await;

        let result = match answer {
            Ok(AuthorizationState::Authorized) => {
                tracing::info!("Speech recognition authorized");
                self.state.set_authorization(AuthorizationState::Authorized);
                self.machine.finish_authorization(true);
                Ok(AuthorizationState::Authorized)
            }
            Ok(other) => {
                tracing::warn!("Speech recognition permission: {}", other);
                self.state.set_authorization(other);
                self.machine.finish_authorization(false);
                Err(VoiceError::PermissionDenied(other))
            }
            Err(BackendError::Unavailable) => {
                self.machine.finish_authorization(false);
                self.mark_unsupported();
                Err(VoiceError::EnvironmentUnsupported)
            }
            Err(e) => {
                tracing::error!("Permission request failed: {}", e);
                self.machine.finish_authorization(false);
                Err(VoiceError::Backend(e))
            }
        };
        self.sync_state();
        result
    }

    /// Request authorization unless it is already granted
    pub async fn ensure_authorized(&mut self) -> Result<(), VoiceError> {
        if self.state.is_authorized() {
            return Ok(());
        }
        self.request_authorization().await.map(|_| ())
    }

    fn mark_unsupported(&self) {
        tracing::warn!("No speech engine on this platform");
        self.state.recognition_available.store(false, Ordering::SeqCst);
        self.state.set_authorization(AuthorizationState::Restricted);
    }

    // ========================================================================
    // Session control
    // ========================================================================

    pub async fn start_single_shot(&mut self) -> Result<(), VoiceError> {
        self.start(ListenMode::SingleShot).await
    }

    pub async fn start_continuous(&mut self) -> Result<(), VoiceError> {
        self.start(ListenMode::Continuous).await
    }

    /// Begin a new activation, replacing any running one
    pub async fn start(&mut self, mode: ListenMode) -> Result<(), VoiceError> {
        if !self.state.is_authorized() {
            return Err(VoiceError::NotAuthorized);
        }
        self.pending.clear();
        self.machine.set_threshold(self.state.confidence_threshold());
        let effects = self.machine.begin(mode);
        self.apply(effects).await?;
        tracing::info!("Listening ({}, {})", mode, self.language.speech_locale());
        Ok(())
    }

    /// Cancel the activation and every pending timer. Returns false when
    /// nothing was running.
    pub async fn stop(&mut self) -> bool {
        let effects = self.machine.stop();
        if effects.is_empty() {
            self.sync_state();
            return false;
        }
        self.pending.clear();
        if let Err(e) = self.apply(effects).await {
            tracing::warn!("Engine error while stopping: {}", e);
        }
        true
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Next update for the caller. Returns `None` once the activation is over
    /// and every update has been delivered.
    pub async fn next_update(&mut self) -> Option<SessionUpdate> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                return Some(update);
            }
            if let Ok(tagged) = self.events_rx.try_recv() {
                self.handle_event(tagged).await;
                continue;
            }
            if !self.machine.is_active() && self.timers.is_empty() {
                return None;
            }

            let next_timer = self
                .timers
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(timer, at)| (*timer, *at));
            let deadline = next_timer.map(|(_, at)| at).unwrap_or_else(Instant::now);
            let events = self.events_rx.clone();

            tokio::select! {
                biased;
                received = events.recv_async() => match received {
                    Ok(tagged) => self.handle_event(tagged).await,
                    Err(_) => return None,
                },
                _ = sleep_until(deadline), if next_timer.is_some() => {
                    if let Some((timer, _)) = next_timer {
                        self.timers.remove(&timer);
                        self.fire(timer).await;
                    }
                }
            }
        }
    }

    async fn handle_event(&mut self, tagged: TaggedEvent) {
        self.machine.set_threshold(self.state.confidence_threshold());
        let effects = self.machine.on_event(tagged);
        self.apply_or_report(effects).await;
    }

    async fn fire(&mut self, timer: TimerKind) {
        tracing::trace!("Timer fired: {:?}", timer);
        self.machine.set_threshold(self.state.confidence_threshold());
        let effects = self.machine.on_timer(timer);
        self.apply_or_report(effects).await;
    }

    /// Engine starts outside a user call have nobody to return an error to
    async fn apply_or_report(&mut self, effects: Vec<Effect>) {
        if let Err(e) = self.apply(effects).await {
            self.pending.push_back(SessionUpdate::Failed(RecognitionError::Fatal(
                ErrorCode::Other(e.to_string()),
            )));
        }
    }

    async fn apply(&mut self, effects: Vec<Effect>) -> Result<(), BackendError> {
        let mut outcome = Ok(());
        for effect in effects {
            match effect {
                Effect::StartEngine { session, mode } => {
                    let request = StartRequest {
                        session,
                        mode,
                        locale: self.language.speech_locale().to_string(),
                        interim_results: self.interim_results,
                    };
                    let sink = EventSink::new(self.events_tx.clone(), session);
                    if let Err(e) = self.backend.start(request, sink).await {
                        tracing::error!("Failed to start engine session {}: {}", session, e);
                        for followup in self.machine.start_failed(session) {
                            self.bookkeep(followup);
                        }
                        outcome = Err(e);
                        // Anything after a start belongs to the session that never ran
                        break;
                    }
                }
                Effect::StopEngine(session) => self.backend.stop(session).await,
                Effect::AbortEngine(session) => self.backend.abort(session).await,
                other => self.bookkeep(other),
            }
        }
        self.sync_state();
        outcome
    }

    fn bookkeep(&mut self, effect: Effect) {
        match effect {
            Effect::Arm { timer, after } => {
                self.timers.insert(timer, Instant::now() + after);
            }
            Effect::Disarm(timer) => {
                self.timers.remove(&timer);
            }
            Effect::DisarmAll => self.timers.clear(),
            Effect::Emit(update) => {
                match &update {
                    SessionUpdate::Transcript(transcript)
                    | SessionUpdate::LowConfidence { transcript, .. } => {
                        self.state.set_last_confidence(transcript.confidence);
                    }
                    _ => {}
                }
                self.pending.push_back(update);
            }
            engine => tracing::debug!("Ignoring {:?} outside the engine path", engine),
        }
    }

    fn sync_state(&self) {
        self.state.set_status(self.machine.status());
        self.state
            .listening
            .store(self.machine.live_session().is_some(), Ordering::SeqCst);
        self.state.continuous.store(
            self.machine.mode() == Some(ListenMode::Continuous),
            Ordering::SeqCst,
        );
    }
}
