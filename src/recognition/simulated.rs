//! Simulated speech engine
//!
//! Plays scripted event batches, one batch per engine start, so the session
//! manager and orchestrator can be exercised without a microphone. A
//! [`SimulatorHandle`] lets tests push events into the live session and
//! inspect how the manager drove the engine.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::engine::{
    BackendKind, EngineEvent, ErrorCode, EventSink, RecognitionBackend, SessionId,
    StartRequest, TranscriptEvent,
};
use crate::error::BackendError;
use crate::state::AuthorizationState;

/// One scripted step
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Result { text: String, confidence: f32, is_final: bool },
    Error(ErrorCode),
    End,
}

impl ScriptStep {
    pub fn final_result(text: impl Into<String>, confidence: f32) -> Self {
        ScriptStep::Result {
            text: text.into(),
            confidence,
            is_final: true,
        }
    }

    fn into_event(self) -> EngineEvent {
        match self {
            ScriptStep::Result {
                text,
                confidence,
                is_final,
            } => EngineEvent::Result(TranscriptEvent::new(text, confidence, is_final)),
            ScriptStep::Error(code) => EngineEvent::Error(code),
            ScriptStep::End => EngineEvent::Ended,
        }
    }
}

/// Parse a script: `final <conf> <text>`, `partial <conf> <text>`,
/// `error <code>`, `end`, and `---` between per-start batches. Blank lines
/// and `#` comments are skipped.
pub fn parse_script(script: &str) -> Result<Vec<Vec<ScriptStep>>, String> {
    let mut batches = vec![Vec::new()];
    for (n, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line == "---" {
            batches.push(Vec::new());
            continue;
        }
        let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
        let step = match word {
            "final" | "partial" => {
                let (conf, text) = rest
                    .trim()
                    .split_once(' ')
                    .ok_or_else(|| format!("line {}: expected '{} <confidence> <text>'", n + 1, word))?;
                let confidence: f32 = conf
                    .parse()
                    .map_err(|_| format!("line {}: bad confidence '{}'", n + 1, conf))?;
                ScriptStep::Result {
                    text: text.trim().to_string(),
                    confidence,
                    is_final: word == "final",
                }
            }
            "error" => ScriptStep::Error(ErrorCode::parse(rest)),
            "end" => ScriptStep::End,
            other => return Err(format!("line {}: unknown step '{}'", n + 1, other)),
        };
        if let Some(batch) = batches.last_mut() {
            batch.push(step);
        }
    }
    batches.retain(|batch| !batch.is_empty());
    Ok(batches)
}

#[derive(Debug, Default)]
struct SimState {
    available: bool,
    permission: AuthorizationState,
    fail_start: Option<String>,
    script: VecDeque<Vec<ScriptStep>>,
    active: Option<(SessionId, EventSink)>,
    starts: Vec<StartRequest>,
    stops: Vec<SessionId>,
    aborts: Vec<SessionId>,
    max_concurrent: usize,
}

/// Shared view of a [`SimulatedBackend`]
#[derive(Debug, Clone)]
pub struct SimulatorHandle {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatorHandle {
    /// Queue a batch of events for a future engine start
    pub fn push_batch(&self, steps: Vec<ScriptStep>) {
        self.inner.lock().script.push_back(steps);
    }

    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }

    pub fn set_permission(&self, permission: AuthorizationState) {
        self.inner.lock().permission = permission;
    }

    /// Make the next start fail
    pub fn fail_next_start(&self, reason: impl Into<String>) {
        self.inner.lock().fail_start = Some(reason.into());
    }

    pub fn emit_result(&self, text: &str, confidence: f32, is_final: bool) -> bool {
        self.emit(EngineEvent::Result(TranscriptEvent::new(text, confidence, is_final)))
    }

    pub fn emit_error(&self, code: ErrorCode) -> bool {
        self.emit(EngineEvent::Error(code))
    }

    /// End the live session as the engine would after silence
    pub fn end(&self) -> bool {
        let mut state = self.inner.lock();
        match state.active.take() {
            Some((_, sink)) => sink.ended(),
            None => false,
        }
    }

    /// Send an event tagged with an arbitrary (possibly retired) session
    pub fn emit_for(&self, session: SessionId, event: EngineEvent) -> bool {
        let state = self.inner.lock();
        let Some((_, sink)) = state.active.as_ref() else {
            return false;
        };
        sink.retagged(session).send(event)
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.inner.lock().active.as_ref().map(|(id, _)| *id)
    }

    /// Scripted batches not yet played
    pub fn remaining_batches(&self) -> usize {
        self.inner.lock().script.len()
    }

    pub fn starts(&self) -> Vec<StartRequest> {
        self.inner.lock().starts.clone()
    }

    pub fn start_count(&self) -> usize {
        self.inner.lock().starts.len()
    }

    pub fn stops(&self) -> Vec<SessionId> {
        self.inner.lock().stops.clone()
    }

    pub fn aborts(&self) -> Vec<SessionId> {
        self.inner.lock().aborts.clone()
    }

    /// Most engine sessions ever active at once
    pub fn max_concurrent(&self) -> usize {
        self.inner.lock().max_concurrent
    }

    fn emit(&self, event: EngineEvent) -> bool {
        let state = self.inner.lock();
        match state.active.as_ref() {
            Some((_, sink)) => sink.send(event),
            None => false,
        }
    }
}

/// Scripted [`RecognitionBackend`]
#[derive(Debug)]
pub struct SimulatedBackend {
    inner: Arc<Mutex<SimState>>,
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBackend {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                available: true,
                permission: AuthorizationState::Authorized,
                ..SimState::default()
            })),
        }
    }

    pub fn with_script(batches: Vec<Vec<ScriptStep>>) -> Self {
        let backend = Self::new();
        backend.inner.lock().script.extend(batches);
        backend
    }

    pub fn handle(&self) -> SimulatorHandle {
        SimulatorHandle {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl RecognitionBackend for SimulatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    fn is_available(&self) -> bool {
        self.inner.lock().available
    }

    async fn request_permission(&mut self) -> Result<AuthorizationState, BackendError> {
        let state = self.inner.lock();
        if !state.available {
            return Err(BackendError::Unavailable);
        }
        Ok(state.permission)
    }

    async fn start(&mut self, request: StartRequest, sink: EventSink) -> Result<(), BackendError> {
        let mut state = self.inner.lock();
        if let Some(reason) = state.fail_start.take() {
            return Err(BackendError::Start(reason));
        }

        let concurrent = if state.active.is_some() { 2 } else { 1 };
        state.max_concurrent = state.max_concurrent.max(concurrent);
        state.starts.push(request.clone());
        tracing::debug!(
            "Simulated engine start {} ({}, {})",
            request.session,
            request.mode,
            request.locale
        );

        sink.started();
        let batch = state.script.pop_front().unwrap_or_default();
        let mut ended = false;
        for step in batch {
            ended = step == ScriptStep::End;
            sink.send(step.into_event());
            if ended {
                break;
            }
        }
        state.active = if ended { None } else { Some((request.session, sink)) };
        Ok(())
    }

    async fn stop(&mut self, session: SessionId) {
        let mut state = self.inner.lock();
        state.stops.push(session);
        if state.active.as_ref().is_some_and(|(id, _)| *id == session) {
            if let Some((_, sink)) = state.active.take() {
                sink.ended();
            }
        }
    }

    async fn abort(&mut self, session: SessionId) {
        let mut state = self.inner.lock();
        state.aborts.push(session);
        if state.active.as_ref().is_some_and(|(id, _)| *id == session) {
            if let Some((_, sink)) = state.active.take() {
                sink.error(ErrorCode::Aborted);
                sink.ended();
            }
        }
    }
}
