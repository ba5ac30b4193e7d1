//! Speech engine contract - the events an engine reports and the backend trait
//! the session manager drives.
//!
//! Engines never call back into the manager. They push [`TaggedEvent`]s onto a
//! single flume channel through an [`EventSink`]; every event carries the
//! [`SessionId`] it was started with so late events from a retired session can
//! be recognized and dropped.

use std::fmt;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::state::AuthorizationState;

/// Monotonic tag handed to the engine on every start
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SessionId(pub u64);

impl SessionId {
    pub fn next(self) -> SessionId {
        SessionId(self.0 + 1)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenMode {
    /// One recognition pass, returns to idle after a final result
    SingleShot,
    /// Restart after every natural end until stopped
    Continuous,
}

impl fmt::Display for ListenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenMode::SingleShot => write!(f, "single-shot"),
            ListenMode::Continuous => write!(f, "continuous"),
        }
    }
}

/// Engine error codes, named after the Web Speech API codes the host engines use
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NoSpeech,
    Aborted,
    Network,
    AudioCapture,
    NotAllowed,
    ServiceNotAllowed,
    LanguageNotSupported,
    Other(String),
}

impl ErrorCode {
    pub fn parse(code: &str) -> ErrorCode {
        match code.trim() {
            "no-speech" => ErrorCode::NoSpeech,
            "aborted" => ErrorCode::Aborted,
            "network" => ErrorCode::Network,
            "audio-capture" => ErrorCode::AudioCapture,
            "not-allowed" => ErrorCode::NotAllowed,
            "service-not-allowed" => ErrorCode::ServiceNotAllowed,
            "language-not-supported" => ErrorCode::LanguageNotSupported,
            other => ErrorCode::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::NoSpeech => "no-speech",
            ErrorCode::Aborted => "aborted",
            ErrorCode::Network => "network",
            ErrorCode::AudioCapture => "audio-capture",
            ErrorCode::NotAllowed => "not-allowed",
            ErrorCode::ServiceNotAllowed => "service-not-allowed",
            ErrorCode::LanguageNotSupported => "language-not-supported",
            ErrorCode::Other(code) => code,
        }
    }

    /// Recovered internally; everything else stops the session
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ErrorCode::NoSpeech | ErrorCode::Aborted | ErrorCode::Network
        )
    }

    /// Status line shown to the user
    pub fn user_message(&self) -> String {
        match self {
            ErrorCode::NoSpeech => "No speech detected".to_string(),
            ErrorCode::Aborted => "Recognition aborted".to_string(),
            ErrorCode::Network => {
                "Network error. Please check your internet connection.".to_string()
            }
            ErrorCode::AudioCapture => "Microphone access denied or not available".to_string(),
            ErrorCode::NotAllowed => {
                "Microphone permission denied. Please allow microphone access.".to_string()
            }
            ErrorCode::ServiceNotAllowed => "Speech recognition service not available".to_string(),
            ErrorCode::LanguageNotSupported => {
                "Selected language not supported for speech recognition".to_string()
            }
            ErrorCode::Other(code) => format!("Speech recognition error: {}", code),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recognition result
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEvent {
    pub text: String,
    /// In [0, 1]; engines that report nothing use 0
    pub confidence: f32,
    pub is_final: bool,
}

impl TranscriptEvent {
    pub fn new(text: impl Into<String>, confidence: f32, is_final: bool) -> Self {
        Self {
            text: text.into(),
            confidence: sanitize_confidence(confidence),
            is_final,
        }
    }
}

fn sanitize_confidence(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Engine callbacks as data
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Started,
    Result(TranscriptEvent),
    Error(ErrorCode),
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub session: SessionId,
    pub event: EngineEvent,
}

/// Sending half given to a backend for one session
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: flume::Sender<TaggedEvent>,
    session: SessionId,
}

impl EventSink {
    pub fn new(tx: flume::Sender<TaggedEvent>, session: SessionId) -> Self {
        Self { tx, session }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Same channel, different session tag
    pub fn retagged(&self, session: SessionId) -> EventSink {
        EventSink::new(self.tx.clone(), session)
    }

    /// Returns false once the manager is gone
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx
            .send(TaggedEvent {
                session: self.session,
                event,
            })
            .is_ok()
    }

    pub fn started(&self) -> bool {
        self.send(EngineEvent::Started)
    }

    pub fn result(&self, text: impl Into<String>, confidence: f32, is_final: bool) -> bool {
        self.send(EngineEvent::Result(TranscriptEvent::new(
            text, confidence, is_final,
        )))
    }

    pub fn error(&self, code: ErrorCode) -> bool {
        self.send(EngineEvent::Error(code))
    }

    pub fn ended(&self) -> bool {
        self.send(EngineEvent::Ended)
    }
}

/// Parameters for one engine start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRequest {
    pub session: SessionId,
    pub mode: ListenMode,
    /// Speech locale, e.g. "zh-TW"
    pub locale: String,
    pub interim_results: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// On-device microphone + model
    Native,
    /// Browser or mobile engine driven by an embedding host
    Host,
    /// Scripted events, for tests and demos
    Simulated,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native"),
            BackendKind::Host => write!(f, "host"),
            BackendKind::Simulated => write!(f, "simulated"),
        }
    }
}

/// A physical speech engine. At most one session is started at a time; the
/// manager always stops or aborts the previous one first.
#[async_trait]
pub trait RecognitionBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Whether an engine exists on this platform at all
    fn is_available(&self) -> bool;

    /// Check or request microphone + speech permission
    async fn request_permission(&mut self) -> Result<AuthorizationState, BackendError>;

    /// Begin recognizing; events for this session go to `sink`
    async fn start(&mut self, request: StartRequest, sink: EventSink) -> Result<(), BackendError>;

    /// Graceful stop; the engine still delivers its pending result and `Ended`
    async fn stop(&mut self, session: SessionId);

    /// Immediate cancel; the engine reports `aborted` and `Ended`
    async fn abort(&mut self, session: SessionId);
}
