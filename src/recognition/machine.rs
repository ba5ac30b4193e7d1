//! Recognition session state machine
//!
//! Pure transition table: every input (user start/stop, engine event, timer
//! expiry) returns a list of [`Effect`]s for the driver to carry out. The
//! machine never touches the engine, the clock or a channel itself, which keeps
//! every retry, restart and rotation rule testable without a runtime.
//!
//! Invariants held here:
//! - at most one live engine session; it is retired before a new one is issued
//! - events tagged with anything but the live session are dropped
//! - `stop` disarms every timer in the same call

use std::time::Duration;

use super::engine::{EngineEvent, ErrorCode, ListenMode, SessionId, TaggedEvent, TranscriptEvent};
use crate::error::RecognitionError;
use crate::state::SessionStatus;

/// Retry, restart and rotation timing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub max_retries: u32,
    pub no_speech_backoff: Duration,
    pub end_backoff: Duration,
    pub network_backoff: Duration,
    pub restart_delay: Duration,
    pub max_session: Duration,
    pub single_shot_timeout: Option<Duration>,
    /// Single-shot: how long the engine gets to end after a transcript is accepted
    pub wind_down: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            no_speech_backoff: Duration::from_millis(600),
            end_backoff: Duration::from_millis(500),
            network_backoff: Duration::from_millis(3000),
            restart_delay: Duration::from_millis(1000),
            max_session: Duration::from_secs(55),
            single_shot_timeout: Some(Duration::from_secs(10)),
            wind_down: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKind {
    /// Single-shot re-issue after a recoverable failure
    Retry,
    /// Continuous restart after a natural end
    Restart,
    /// Continuous forced session rotation
    Rotation,
    /// Single-shot silence timeout
    Deadline,
    /// Single-shot: engine still running after an accepted transcript
    WindDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Single-shot accepted a transcript
    Completed,
    /// Single-shot heard nothing usable before its deadline
    TimedOut,
    /// Single-shot ran out of retries without an error to report
    NoResult,
    /// Stopped by the caller
    Stopped,
}

/// What the caller of the session manager sees
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The engine reported it is capturing
    Listening { session: SessionId, mode: ListenMode },
    /// Interim result, for display only
    Partial(TranscriptEvent),
    /// Final result at or above the confidence threshold
    Transcript(TranscriptEvent),
    /// Final result below the threshold; never dispatched
    LowConfidence {
        transcript: TranscriptEvent,
        threshold: f32,
    },
    /// Recoverable problem, shown softly
    Transient(RecognitionError),
    /// A single-shot pass is being re-issued
    Retrying { attempt: u32, max: u32, after: Duration },
    /// Session stopped on an error
    Failed(RecognitionError),
    Ended(EndReason),
}

impl SessionUpdate {
    /// Retry prompt for a low-confidence transcript
    pub fn low_confidence_hint(confidence: f32) -> String {
        format!(
            "Low recognition confidence ({:.0}%), please try again or speak more clearly",
            confidence * 100.0
        )
    }
}

/// Instructions for the driver
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartEngine { session: SessionId, mode: ListenMode },
    /// Graceful stop; pending results may still arrive but will be stale
    StopEngine(SessionId),
    AbortEngine(SessionId),
    /// (Re)arm a timer, replacing any pending one of the same kind
    Arm { timer: TimerKind, after: Duration },
    Disarm(TimerKind),
    DisarmAll,
    Emit(SessionUpdate),
}

/// Point-in-time view of the machine
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub mode: Option<ListenMode>,
    pub status: SessionStatus,
    pub session: Option<SessionId>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub max_session: Duration,
}

#[derive(Debug)]
pub struct SessionMachine {
    config: SessionConfig,
    threshold: f32,
    status: SessionStatus,
    /// Active activation; None when idle or after a terminal error
    mode: Option<ListenMode>,
    /// Engine session events are accepted from
    live: Option<SessionId>,
    last_issued: SessionId,
    retry_count: u32,
    last_error: Option<ErrorCode>,
    /// Single-shot: a transcript was accepted, waiting for the engine to end
    accepted: bool,
    /// Continuous: delay override for the next restart
    pending_backoff: Option<Duration>,
}

impl SessionMachine {
    pub fn new(config: SessionConfig, threshold: f32) -> Self {
        Self {
            config,
            threshold,
            status: SessionStatus::Idle,
            mode: None,
            live: None,
            last_issued: SessionId::default(),
            retry_count: 0,
            last_error: None,
            accepted: false,
            pending_backoff: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn mode(&self) -> Option<ListenMode> {
        self.mode
    }

    pub fn live_session(&self) -> Option<SessionId> {
        self.live
    }

    /// An activation is in progress (possibly between engine sessions)
    pub fn is_active(&self) -> bool {
        self.mode.is_some() || self.live.is_some()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode,
            status: self.status,
            session: self.live,
            retry_count: self.retry_count,
            max_retries: self.config.max_retries,
            max_session: self.config.max_session,
        }
    }

    // ========================================================================
    // Authorization
    // ========================================================================

    pub fn begin_authorization(&mut self) {
        if !self.is_active() {
            self.status = SessionStatus::Authorizing;
        }
    }

    pub fn finish_authorization(&mut self, granted: bool) {
        if self.status == SessionStatus::Authorizing {
            self.status = if granted {
                SessionStatus::Idle
            } else {
                SessionStatus::Error
            };
        }
    }

    // ========================================================================
    // User commands
    // ========================================================================

    /// Start a new activation, retiring whatever was running
    pub fn begin(&mut self, mode: ListenMode) -> Vec<Effect> {
        let mut effects = vec![Effect::DisarmAll];
        if let Some(old) = self.live.take() {
            tracing::debug!("Replacing live session {}", old);
            effects.push(Effect::AbortEngine(old));
        }
        self.mode = Some(mode);
        self.retry_count = 0;
        self.last_error = None;
        self.pending_backoff = None;
        self.launch(&mut effects);
        effects
    }

    /// Cancel everything. Idempotent: a second call yields no effects.
    pub fn stop(&mut self) -> Vec<Effect> {
        if !self.is_active() {
            self.status = SessionStatus::Idle;
            return Vec::new();
        }
        let mut effects = vec![Effect::DisarmAll];
        if let Some(id) = self.live.take() {
            effects.push(Effect::AbortEngine(id));
        }
        self.reset(SessionStatus::Idle);
        tracing::debug!("Session stopped");
        effects.push(Effect::Emit(SessionUpdate::Ended(EndReason::Stopped)));
        effects
    }

    /// The engine refused to start `session`; the activation is over
    pub fn start_failed(&mut self, session: SessionId) -> Vec<Effect> {
        if self.live != Some(session) {
            return Vec::new();
        }
        self.live = None;
        self.reset(SessionStatus::Error);
        vec![Effect::DisarmAll]
    }

    // ========================================================================
    // Engine events
    // ========================================================================

    pub fn on_event(&mut self, tagged: TaggedEvent) -> Vec<Effect> {
        let Some(id) = self.live.filter(|live| *live == tagged.session) else {
            tracing::trace!(session = %tagged.session, event = ?tagged.event, "Dropping stale engine event");
            return Vec::new();
        };
        let Some(mode) = self.mode else {
            return Vec::new();
        };

        match tagged.event {
            EngineEvent::Started => {
                tracing::debug!("Engine session {} listening ({})", id, mode);
                vec![Effect::Emit(SessionUpdate::Listening { session: id, mode })]
            }
            EngineEvent::Result(transcript) => self.on_result(id, mode, transcript),
            EngineEvent::Error(code) => self.on_error(id, mode, code),
            EngineEvent::Ended => self.on_ended(mode),
        }
    }

    fn on_result(&mut self, id: SessionId, mode: ListenMode, transcript: TranscriptEvent) -> Vec<Effect> {
        if mode == ListenMode::SingleShot && self.accepted {
            return Vec::new();
        }
        if !transcript.is_final {
            return vec![Effect::Emit(SessionUpdate::Partial(transcript))];
        }
        if transcript.confidence < self.threshold {
            tracing::debug!(
                "Confidence {:.2} below threshold {:.2}, asking to retry",
                transcript.confidence,
                self.threshold
            );
            return vec![Effect::Emit(SessionUpdate::LowConfidence {
                transcript,
                threshold: self.threshold,
            })];
        }

        let mut effects = vec![Effect::Emit(SessionUpdate::Transcript(transcript))];
        if mode == ListenMode::SingleShot {
            self.accepted = true;
            self.status = SessionStatus::Processing;
            effects.push(Effect::Disarm(TimerKind::Deadline));
            effects.push(Effect::StopEngine(id));
            effects.push(Effect::Arm {
                timer: TimerKind::WindDown,
                after: self.config.wind_down,
            });
        }
        effects
    }

    fn on_error(&mut self, id: SessionId, mode: ListenMode, code: ErrorCode) -> Vec<Effect> {
        if mode == ListenMode::SingleShot && self.accepted {
            return Vec::new();
        }
        if !code.is_transient() {
            tracing::warn!("Recognition failed on session {}: {}", id, code);
            self.live = None;
            self.reset(SessionStatus::Error);
            return vec![
                Effect::DisarmAll,
                Effect::AbortEngine(id),
                Effect::Emit(SessionUpdate::Failed(RecognitionError::Fatal(code))),
            ];
        }
        match code {
            ErrorCode::NoSpeech => match mode {
                // The engine ends right after; the restart covers it
                ListenMode::Continuous => Vec::new(),
                ListenMode::SingleShot => {
                    self.retry_or_fail(Some(id), Some(code), self.config.no_speech_backoff)
                }
            },
            ErrorCode::Network => {
                let mut effects = vec![Effect::Emit(SessionUpdate::Transient(
                    RecognitionError::Transient(code.clone()),
                ))];
                match mode {
                    ListenMode::Continuous => {
                        self.pending_backoff = Some(self.config.network_backoff);
                    }
                    ListenMode::SingleShot => effects.extend(self.retry_or_fail(
                        Some(id),
                        Some(code),
                        self.config.network_backoff,
                    )),
                }
                effects
            }
            // Aborted: expected on stop and restart
            _ => {
                tracing::debug!("Engine session {} aborted", id);
                Vec::new()
            }
        }
    }

    fn on_ended(&mut self, mode: ListenMode) -> Vec<Effect> {
        self.live = None;
        match mode {
            ListenMode::SingleShot if self.accepted => {
                self.reset(SessionStatus::Idle);
                vec![
                    Effect::DisarmAll,
                    Effect::Emit(SessionUpdate::Ended(EndReason::Completed)),
                ]
            }
            ListenMode::SingleShot => self.retry_or_fail(None, None, self.config.end_backoff),
            ListenMode::Continuous => {
                let delay = self
                    .pending_backoff
                    .take()
                    .unwrap_or(self.config.restart_delay);
                tracing::debug!("Engine session ended, restarting in {:?}", delay);
                vec![
                    Effect::Disarm(TimerKind::Rotation),
                    Effect::Arm {
                        timer: TimerKind::Restart,
                        after: delay,
                    },
                ]
            }
        }
    }

    /// Single-shot recovery: re-issue after `backoff` while under the retry
    /// ceiling, otherwise report the last error. `live` is the session to
    /// retire if the engine has not ended yet.
    fn retry_or_fail(
        &mut self,
        live: Option<SessionId>,
        code: Option<ErrorCode>,
        backoff: Duration,
    ) -> Vec<Effect> {
        if code.is_some() {
            self.last_error = code;
        }
        let mut effects = vec![Effect::Disarm(TimerKind::Deadline)];
        if let Some(id) = live {
            self.live = None;
            effects.push(Effect::StopEngine(id));
        }

        if self.retry_count < self.config.max_retries {
            self.retry_count += 1;
            tracing::info!(
                "Retrying recognition ({}/{}) in {:?}",
                self.retry_count,
                self.config.max_retries,
                backoff
            );
            effects.push(Effect::Arm {
                timer: TimerKind::Retry,
                after: backoff,
            });
            effects.push(Effect::Emit(SessionUpdate::Retrying {
                attempt: self.retry_count,
                max: self.config.max_retries,
                after: backoff,
            }));
            return effects;
        }

        let attempts = self.retry_count + 1;
        effects.push(Effect::DisarmAll);
        match self.last_error.take() {
            Some(last) => {
                tracing::warn!("Giving up after {} attempts: {}", attempts, last);
                self.reset(SessionStatus::Error);
                effects.push(Effect::Emit(SessionUpdate::Failed(
                    RecognitionError::RetriesExhausted { last, attempts },
                )));
            }
            None => {
                tracing::info!("No result after {} attempts", attempts);
                self.reset(SessionStatus::Idle);
                effects.push(Effect::Emit(SessionUpdate::Ended(EndReason::NoResult)));
            }
        }
        effects
    }

    // ========================================================================
    // Timers
    // ========================================================================

    pub fn on_timer(&mut self, timer: TimerKind) -> Vec<Effect> {
        let Some(mode) = self.mode else {
            return Vec::new();
        };
        match (timer, mode) {
            (TimerKind::Retry, ListenMode::SingleShot) | (TimerKind::Restart, ListenMode::Continuous)
                if self.live.is_none() =>
            {
                let mut effects = Vec::new();
                self.launch(&mut effects);
                effects
            }
            (TimerKind::Rotation, ListenMode::Continuous) => {
                let mut effects = vec![Effect::Disarm(TimerKind::Restart)];
                if let Some(old) = self.live.take() {
                    tracing::info!(
                        "Rotating session {} after {:?}",
                        old,
                        self.config.max_session
                    );
                    effects.push(Effect::AbortEngine(old));
                }
                self.launch(&mut effects);
                effects
            }
            (TimerKind::WindDown, ListenMode::SingleShot) if self.accepted => {
                let mut effects = vec![Effect::DisarmAll];
                if let Some(id) = self.live.take() {
                    tracing::debug!("Engine session {} never ended, aborting", id);
                    effects.push(Effect::AbortEngine(id));
                }
                self.reset(SessionStatus::Idle);
                effects.push(Effect::Emit(SessionUpdate::Ended(EndReason::Completed)));
                effects
            }
            (TimerKind::Deadline, ListenMode::SingleShot) if !self.accepted => {
                tracing::info!("No command heard before the deadline");
                let mut effects = vec![Effect::DisarmAll];
                if let Some(id) = self.live.take() {
                    effects.push(Effect::AbortEngine(id));
                }
                self.reset(SessionStatus::Idle);
                effects.push(Effect::Emit(SessionUpdate::Ended(EndReason::TimedOut)));
                effects
            }
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn launch(&mut self, effects: &mut Vec<Effect>) {
        let Some(mode) = self.mode else {
            return;
        };
        let id = self.last_issued.next();
        self.last_issued = id;
        self.live = Some(id);
        self.accepted = false;
        self.status = SessionStatus::Listening;
        effects.push(Effect::StartEngine { session: id, mode });
        match mode {
            ListenMode::Continuous => effects.push(Effect::Arm {
                timer: TimerKind::Rotation,
                after: self.config.max_session,
            }),
            ListenMode::SingleShot => {
                if let Some(timeout) = self.config.single_shot_timeout {
                    effects.push(Effect::Arm {
                        timer: TimerKind::Deadline,
                        after: timeout,
                    });
                }
            }
        }
    }

    fn reset(&mut self, status: SessionStatus) {
        self.mode = None;
        self.status = status;
        self.accepted = false;
        self.pending_backoff = None;
        self.retry_count = 0;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SessionMachine {
        SessionMachine::new(SessionConfig::default(), 0.7)
    }

    fn ev(session: SessionId, event: EngineEvent) -> TaggedEvent {
        TaggedEvent { session, event }
    }

    fn result(text: &str, confidence: f32) -> EngineEvent {
        EngineEvent::Result(TranscriptEvent::new(text, confidence, true))
    }

    fn emitted(effects: &[Effect]) -> Vec<SessionUpdate> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Emit(update) => Some(update.clone()),
                _ => None,
            })
            .collect()
    }

    fn started(effects: &[Effect]) -> Option<SessionId> {
        effects.iter().find_map(|e| match e {
            Effect::StartEngine { session, .. } => Some(*session),
            _ => None,
        })
    }

    #[test]
    fn test_single_shot_happy_path() {
        let mut m = machine();
        let effects = m.begin(ListenMode::SingleShot);
        let id = started(&effects).unwrap();
        assert!(effects.contains(&Effect::Arm {
            timer: TimerKind::Deadline,
            after: Duration::from_secs(10)
        }));
        assert_eq!(m.status(), SessionStatus::Listening);

        let effects = m.on_event(ev(id, result("play", 0.9)));
        assert!(matches!(&emitted(&effects)[..], [SessionUpdate::Transcript(t)] if t.text == "play"));
        assert!(effects.contains(&Effect::StopEngine(id)));
        assert_eq!(m.status(), SessionStatus::Processing);

        let effects = m.on_event(ev(id, EngineEvent::Ended));
        assert_eq!(emitted(&effects), vec![SessionUpdate::Ended(EndReason::Completed)]);
        assert_eq!(m.status(), SessionStatus::Idle);
        assert!(!m.is_active());
    }

    #[test]
    fn test_low_confidence_keeps_listening() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();

        let effects = m.on_event(ev(id, result("play", 0.5)));
        assert!(matches!(
            &emitted(&effects)[..],
            [SessionUpdate::LowConfidence { threshold, .. }] if *threshold == 0.7
        ));
        assert!(!effects.iter().any(|e| matches!(e, Effect::StopEngine(_))));
        assert_eq!(m.status(), SessionStatus::Listening);
    }

    #[test]
    fn test_threshold_boundary_accepted() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::Continuous)).unwrap();
        let effects = m.on_event(ev(id, result("pause", 0.7)));
        assert!(matches!(&emitted(&effects)[..], [SessionUpdate::Transcript(_)]));
    }

    #[test]
    fn test_partial_results_not_gated() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::Continuous)).unwrap();
        let effects = m.on_event(ev(
            id,
            EngineEvent::Result(TranscriptEvent::new("pl", 0.1, false)),
        ));
        assert!(matches!(&emitted(&effects)[..], [SessionUpdate::Partial(_)]));
    }

    #[test]
    fn test_no_speech_retries_then_gives_up() {
        let mut m = machine();
        let mut id = started(&m.begin(ListenMode::SingleShot)).unwrap();

        for attempt in 1..=2 {
            let effects = m.on_event(ev(id, EngineEvent::Error(ErrorCode::NoSpeech)));
            assert!(effects.contains(&Effect::StopEngine(id)));
            assert!(effects.contains(&Effect::Arm {
                timer: TimerKind::Retry,
                after: Duration::from_millis(600)
            }));
            assert!(emitted(&effects).contains(&SessionUpdate::Retrying {
                attempt,
                max: 2,
                after: Duration::from_millis(600)
            }));

            // The retired session's end is stale
            assert!(m.on_event(ev(id, EngineEvent::Ended)).is_empty());

            let effects = m.on_timer(TimerKind::Retry);
            let next = started(&effects).unwrap();
            assert!(next > id);
            id = next;
        }

        let effects = m.on_event(ev(id, EngineEvent::Error(ErrorCode::NoSpeech)));
        assert_eq!(
            emitted(&effects),
            vec![SessionUpdate::Failed(RecognitionError::RetriesExhausted {
                last: ErrorCode::NoSpeech,
                attempts: 3
            })]
        );
        assert_eq!(m.status(), SessionStatus::Error);
        assert!(m.on_timer(TimerKind::Retry).is_empty());
    }

    #[test]
    fn test_unexpected_end_retries_with_shorter_backoff() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        let effects = m.on_event(ev(id, EngineEvent::Ended));
        assert!(effects.contains(&Effect::Arm {
            timer: TimerKind::Retry,
            after: Duration::from_millis(500)
        }));
        assert!(!effects.iter().any(|e| matches!(e, Effect::StopEngine(_))));
    }

    #[test]
    fn test_silent_ends_exhaust_to_no_result() {
        let mut m = machine();
        let mut id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        for _ in 0..2 {
            m.on_event(ev(id, EngineEvent::Ended));
            id = started(&m.on_timer(TimerKind::Retry)).unwrap();
        }
        let effects = m.on_event(ev(id, EngineEvent::Ended));
        assert_eq!(emitted(&effects), vec![SessionUpdate::Ended(EndReason::NoResult)]);
        assert_eq!(m.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_fatal_error_stops_session() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::Continuous)).unwrap();
        let effects = m.on_event(ev(id, EngineEvent::Error(ErrorCode::AudioCapture)));
        assert!(effects.contains(&Effect::DisarmAll));
        assert!(effects.contains(&Effect::AbortEngine(id)));
        assert_eq!(
            emitted(&effects),
            vec![SessionUpdate::Failed(RecognitionError::Fatal(ErrorCode::AudioCapture))]
        );
        assert_eq!(m.status(), SessionStatus::Error);
        assert!(!m.is_active());
        // No restart after the engine's trailing end
        assert!(m.on_event(ev(id, EngineEvent::Ended)).is_empty());
        assert!(m.on_timer(TimerKind::Restart).is_empty());
    }

    #[test]
    fn test_aborted_is_silent() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        assert!(m.on_event(ev(id, EngineEvent::Error(ErrorCode::Aborted))).is_empty());
        assert_eq!(m.status(), SessionStatus::Listening);
    }

    #[test]
    fn test_continuous_restart_after_natural_end() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::Continuous)).unwrap();
        assert!(m.on_event(ev(id, EngineEvent::Error(ErrorCode::NoSpeech))).is_empty());

        let effects = m.on_event(ev(id, EngineEvent::Ended));
        assert_eq!(
            effects,
            vec![
                Effect::Disarm(TimerKind::Rotation),
                Effect::Arm {
                    timer: TimerKind::Restart,
                    after: Duration::from_secs(1)
                }
            ]
        );
        assert!(m.is_active());

        let effects = m.on_timer(TimerKind::Restart);
        assert!(started(&effects).unwrap() > id);
    }

    #[test]
    fn test_continuous_network_uses_longer_restart() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::Continuous)).unwrap();
        let effects = m.on_event(ev(id, EngineEvent::Error(ErrorCode::Network)));
        assert_eq!(
            emitted(&effects),
            vec![SessionUpdate::Transient(RecognitionError::Transient(
                ErrorCode::Network
            ))]
        );

        let effects = m.on_event(ev(id, EngineEvent::Ended));
        assert!(effects.contains(&Effect::Arm {
            timer: TimerKind::Restart,
            after: Duration::from_secs(3)
        }));
    }

    #[test]
    fn test_single_shot_network_retries_with_network_backoff() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        let effects = m.on_event(ev(id, EngineEvent::Error(ErrorCode::Network)));
        assert!(emitted(&effects).contains(&SessionUpdate::Transient(
            RecognitionError::Transient(ErrorCode::Network)
        )));
        assert!(effects.contains(&Effect::Arm {
            timer: TimerKind::Retry,
            after: Duration::from_secs(3)
        }));
    }

    #[test]
    fn test_rotation_replaces_live_session() {
        let mut m = machine();
        let first = started(&m.begin(ListenMode::Continuous)).unwrap();
        let effects = m.on_timer(TimerKind::Rotation);
        let second = started(&effects).unwrap();

        let abort_at = effects.iter().position(|e| *e == Effect::AbortEngine(first)).unwrap();
        let start_at = effects
            .iter()
            .position(|e| matches!(e, Effect::StartEngine { .. }))
            .unwrap();
        assert!(abort_at < start_at);
        assert!(effects.contains(&Effect::Arm {
            timer: TimerKind::Rotation,
            after: Duration::from_secs(55)
        }));

        // Results from the rotated-out session are ignored
        assert!(m.on_event(ev(first, result("play", 0.99))).is_empty());
        assert!(!m.on_event(ev(second, result("play", 0.99))).is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::Continuous)).unwrap();

        let effects = m.stop();
        assert_eq!(
            effects,
            vec![
                Effect::DisarmAll,
                Effect::AbortEngine(id),
                Effect::Emit(SessionUpdate::Ended(EndReason::Stopped)),
            ]
        );
        assert!(m.stop().is_empty());
        assert_eq!(m.status(), SessionStatus::Idle);
        assert!(m.on_timer(TimerKind::Restart).is_empty());
        assert!(m.on_event(ev(id, EngineEvent::Ended)).is_empty());
    }

    #[test]
    fn test_stop_during_retry_backoff() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        m.on_event(ev(id, EngineEvent::Error(ErrorCode::NoSpeech)));

        let effects = m.stop();
        assert_eq!(emitted(&effects), vec![SessionUpdate::Ended(EndReason::Stopped)]);
        assert!(m.on_timer(TimerKind::Retry).is_empty());
    }

    #[test]
    fn test_begin_retires_previous_session() {
        let mut m = machine();
        let first = started(&m.begin(ListenMode::Continuous)).unwrap();
        let effects = m.begin(ListenMode::SingleShot);
        assert_eq!(effects[0], Effect::DisarmAll);
        assert_eq!(effects[1], Effect::AbortEngine(first));
        assert!(started(&effects).unwrap() > first);
        assert_eq!(m.mode(), Some(ListenMode::SingleShot));
    }

    #[test]
    fn test_deadline_times_out_single_shot() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        let effects = m.on_timer(TimerKind::Deadline);
        assert!(effects.contains(&Effect::AbortEngine(id)));
        assert_eq!(emitted(&effects), vec![SessionUpdate::Ended(EndReason::TimedOut)]);
        assert_eq!(m.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_wind_down_settles_when_engine_never_ends() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        let effects = m.on_event(ev(id, result("play", 0.9)));
        assert!(effects.contains(&Effect::Arm {
            timer: TimerKind::WindDown,
            after: Duration::from_secs(2)
        }));
        assert!(m.is_active());

        let effects = m.on_timer(TimerKind::WindDown);
        assert!(effects.contains(&Effect::AbortEngine(id)));
        assert_eq!(emitted(&effects), vec![SessionUpdate::Ended(EndReason::Completed)]);
        assert_eq!(m.status(), SessionStatus::Idle);
        assert!(!m.is_active());
        // The late end is stale now
        assert!(m.on_event(ev(id, EngineEvent::Ended)).is_empty());
        assert!(started(&m.begin(ListenMode::SingleShot)).unwrap() > id);
    }

    #[test]
    fn test_wind_down_ignored_while_listening() {
        let mut m = machine();
        started(&m.begin(ListenMode::SingleShot)).unwrap();
        assert!(m.on_timer(TimerKind::WindDown).is_empty());
        assert_eq!(m.status(), SessionStatus::Listening);
    }

    #[test]
    fn test_unknown_error_codes_are_fatal() {
        for code in [
            ErrorCode::NotAllowed,
            ErrorCode::ServiceNotAllowed,
            ErrorCode::LanguageNotSupported,
            ErrorCode::parse("bad-grammar"),
        ] {
            let mut m = machine();
            let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
            let effects = m.on_event(ev(id, EngineEvent::Error(code.clone())));
            assert_eq!(
                emitted(&effects),
                vec![SessionUpdate::Failed(RecognitionError::Fatal(code))]
            );
            assert!(!m.is_active());
        }
    }

    #[test]
    fn test_start_failure_resets() {
        let mut m = machine();
        let id = started(&m.begin(ListenMode::SingleShot)).unwrap();
        assert_eq!(m.start_failed(id), vec![Effect::DisarmAll]);
        assert_eq!(m.status(), SessionStatus::Error);
        assert!(!m.is_active());
    }

    #[test]
    fn test_authorization_status() {
        let mut m = machine();
        m.begin_authorization();
        assert_eq!(m.status(), SessionStatus::Authorizing);
        m.finish_authorization(false);
        assert_eq!(m.status(), SessionStatus::Error);
        m.begin_authorization();
        m.finish_authorization(true);
        assert_eq!(m.status(), SessionStatus::Idle);
    }
}
