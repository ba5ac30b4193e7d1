//! Speech recognition sessions
//!
//! - `engine`: the backend trait and the events engines report
//! - `machine`: retry, restart and rotation rules as a pure state machine
//! - `manager`: tokio driver wiring a backend to the machine
//! - `simulated`, `host`, `native`: backends

pub mod engine;
pub mod host;
pub mod machine;
pub mod manager;
#[cfg(feature = "native")]
pub mod native;
pub mod simulated;

pub use engine::{
    BackendKind, EngineEvent, ErrorCode, EventSink, ListenMode, RecognitionBackend, SessionId,
    StartRequest, TaggedEvent, TranscriptEvent,
};
pub use host::{HostBackend, HostBridge, HostCommand, host_backend};
pub use machine::{EndReason, SessionConfig, SessionSnapshot, SessionUpdate};
pub use manager::SessionManager;
pub use simulated::{ScriptStep, SimulatedBackend, SimulatorHandle, parse_script};
