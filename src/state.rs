//! Shared runtime state - process-wide, thread-safe view of the voice pipeline
//!
//! The session manager is the only writer of session status; UI code and the
//! CLI read from here without holding a reference to the manager.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::config::Config;

/// Microphone + speech recognition permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AuthorizationState {
    #[default]
    NotDetermined = 0,
    Denied = 1,
    /// Blocked by policy or parental controls
    Restricted = 2,
    Authorized = 3,
}

impl From<u8> for AuthorizationState {
    fn from(v: u8) -> Self {
        match v {
            1 => AuthorizationState::Denied,
            2 => AuthorizationState::Restricted,
            3 => AuthorizationState::Authorized,
            _ => AuthorizationState::NotDetermined,
        }
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationState::NotDetermined => write!(f, "notDetermined"),
            AuthorizationState::Denied => write!(f, "denied"),
            AuthorizationState::Restricted => write!(f, "restricted"),
            AuthorizationState::Authorized => write!(f, "authorized"),
        }
    }
}

/// Recognition session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SessionStatus {
    #[default]
    Idle = 0,
    Authorizing = 1,
    Listening = 2,
    /// Final transcript accepted, engine winding down
    Processing = 3,
    Error = 4,
}

impl From<u8> for SessionStatus {
    fn from(v: u8) -> Self {
        match v {
            1 => SessionStatus::Authorizing,
            2 => SessionStatus::Listening,
            3 => SessionStatus::Processing,
            4 => SessionStatus::Error,
            _ => SessionStatus::Idle,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "idle"),
            SessionStatus::Authorizing => write!(f, "authorizing"),
            SessionStatus::Listening => write!(f, "listening"),
            SessionStatus::Processing => write!(f, "processing"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}

/// Thread-safe f32 using bit casting to AtomicU32
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(v: f32) -> Self {
        Self(AtomicU32::new(v.to_bits()))
    }

    pub fn load(&self, order: Ordering) -> f32 {
        f32::from_bits(self.0.load(order))
    }

    pub fn store(&self, v: f32, order: Ordering) {
        self.0.store(v.to_bits(), order);
    }
}

/// Shared runtime state - accessible from all components
///
/// All fields use atomic operations for thread-safe access without locks.
pub struct RuntimeState {
    // ========================================================================
    // Permission
    // ========================================================================
    authorization: AtomicU8,
    /// Set false once the platform reports no speech engine
    pub recognition_available: AtomicBool,

    // ========================================================================
    // Session
    // ========================================================================
    status: AtomicU8,
    /// An engine session is live
    pub listening: AtomicBool,
    /// Continuous mode is enabled
    pub continuous: AtomicBool,

    // ========================================================================
    // Confidence
    // ========================================================================
    confidence_threshold: AtomicF32,
    /// Confidence of the most recent final transcript (0.0-1.0)
    last_confidence: AtomicF32,
}

impl RuntimeState {
    /// Create new RuntimeState initialized from config
    pub fn new(config: &Config) -> Arc<Self> {
        Arc::new(Self::with_threshold(config.recognition.confidence_threshold))
    }

    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            authorization: AtomicU8::new(AuthorizationState::NotDetermined as u8),
            recognition_available: AtomicBool::new(true),
            status: AtomicU8::new(SessionStatus::Idle as u8),
            listening: AtomicBool::new(false),
            continuous: AtomicBool::new(false),
            confidence_threshold: AtomicF32::new(clamp_unit(threshold)),
            last_confidence: AtomicF32::new(0.0),
        }
    }

    // ========================================================================
    // Permission helpers
    // ========================================================================

    pub fn authorization(&self) -> AuthorizationState {
        AuthorizationState::from(self.authorization.load(Ordering::SeqCst))
    }

    pub fn set_authorization(&self, state: AuthorizationState) {
        self.authorization.store(state as u8, Ordering::SeqCst);
    }

    pub fn is_authorized(&self) -> bool {
        self.authorization() == AuthorizationState::Authorized
    }

    // ========================================================================
    // Session helpers
    // ========================================================================

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from(self.status.load(Ordering::SeqCst))
    }

    pub fn set_status(&self, status: SessionStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Confidence helpers
    // ========================================================================

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold.load(Ordering::SeqCst)
    }

    /// Set the acceptance threshold, clamped to [0, 1]; returns the stored value
    pub fn set_confidence_threshold(&self, threshold: f32) -> f32 {
        let threshold = clamp_unit(threshold);
        self.confidence_threshold.store(threshold, Ordering::SeqCst);
        threshold
    }

    pub fn last_confidence(&self) -> f32 {
        self.last_confidence.load(Ordering::SeqCst)
    }

    pub fn set_last_confidence(&self, confidence: f32) {
        self.last_confidence.store(confidence, Ordering::SeqCst);
    }
}

impl Default for RuntimeState {
    fn default() -> Self {
        Self::with_threshold(crate::config::DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

impl fmt::Debug for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeState")
            .field("authorization", &self.authorization())
            .field(
                "recognition_available",
                &self.recognition_available.load(Ordering::SeqCst),
            )
            .field("status", &self.status())
            .field("listening", &self.is_listening())
            .field("continuous", &self.is_continuous())
            .field("confidence_threshold", &self.confidence_threshold())
            .field("last_confidence", &self.last_confidence())
            .finish()
    }
}

/// Type alias for shared state
pub type SharedState = Arc<RuntimeState>;
