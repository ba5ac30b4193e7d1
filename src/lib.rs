//! Voice control for a video player.
//!
//! - [`source`] classifies video URLs and rewrites them into playable references
//! - [`command`] maps transcripts to player commands in twelve UI languages
//! - [`recognition`] runs speech sessions with retries, restarts and rotation
//! - [`orchestrator`] ties a session to a [`control::VideoControl`] surface

pub mod command;
pub mod config;
pub mod control;
pub mod error;
pub mod locale;
pub mod orchestrator;
pub mod recognition;
pub mod source;
pub mod state;
pub mod store;

pub use command::{CommandGrammar, CommandId, CustomCommandOverlay};
pub use config::Config;
pub use control::{ControlAction, RecordingPlayer, VideoControl};
pub use error::{DispatchError, RecognitionError, SourceError, VoiceError};
pub use locale::Language;
pub use orchestrator::{CommandResult, VoiceController, VoiceOutcome};
pub use source::{PlayableReference, SourceDescriptor, SupportTier};
pub use state::{AuthorizationState, RuntimeState, SessionStatus, SharedState};
