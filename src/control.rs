//! Video control surface - the player operations voice commands drive
//!
//! The real player lives outside this crate. [`RecordingPlayer`] is an
//! in-memory surface that tracks playback state and records every call; the
//! CLI simulator and the tests drive it.

use crate::error::{ControlError, SourceError};
use crate::source::{self, PlayableReference, SourceDescriptor};

const VOLUME_STEP_EPSILON: f32 = 1e-4;

/// Playback primitives exposed by a player
pub trait VideoControl {
    /// Currently loaded video, if any
    fn uri(&self) -> Option<&str>;
    /// Whether a usable player instance exists
    fn has_player(&self) -> bool;
    /// Current volume (0.0-1.0)
    fn volume(&self) -> f32;

    fn play(&mut self) -> Result<(), ControlError>;
    fn pause(&mut self) -> Result<(), ControlError>;
    fn stop(&mut self) -> Result<(), ControlError>;
    /// Relative seek in seconds (negative rewinds)
    fn seek(&mut self, delta_secs: f64) -> Result<(), ControlError>;
    fn set_volume(&mut self, volume: f32) -> Result<(), ControlError>;
    fn set_speed(&mut self, multiplier: f32) -> Result<(), ControlError>;
    fn toggle_fullscreen(&mut self) -> Result<(), ControlError>;
    fn add_bookmark(&mut self) -> Result<(), ControlError>;
    fn toggle_favorite(&mut self) -> Result<(), ControlError>;
}

/// The single surface operation a command maps to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    Play,
    Pause,
    Stop,
    Seek(f64),
    /// Relative volume change, clamped to [0, 1]
    AdjustVolume(f32),
    SetVolume(f32),
    /// Restore the current volume, or full volume if muted
    Unmute,
    SetSpeed(f32),
    ToggleFullscreen,
    AddBookmark,
    ToggleFavorite,
}

impl ControlAction {
    pub fn perform(self, surface: &mut dyn VideoControl) -> Result<(), ControlError> {
        match self {
            ControlAction::Play => surface.play(),
            ControlAction::Pause => surface.pause(),
            ControlAction::Stop => surface.stop(),
            ControlAction::Seek(delta) => surface.seek(delta),
            ControlAction::AdjustVolume(delta) => {
                let volume = (surface.volume() + delta).clamp(0.0, 1.0);
                surface.set_volume(round_volume(volume))
            }
            ControlAction::SetVolume(volume) => surface.set_volume(volume),
            ControlAction::Unmute => {
                let current = surface.volume();
                surface.set_volume(if current > 0.0 { current } else { 1.0 })
            }
            ControlAction::SetSpeed(speed) => surface.set_speed(speed),
            ControlAction::ToggleFullscreen => surface.toggle_fullscreen(),
            ControlAction::AddBookmark => surface.add_bookmark(),
            ControlAction::ToggleFavorite => surface.toggle_favorite(),
        }
    }
}

// Keep repeated 0.1 steps from drifting (0.30000001 etc.)
fn round_volume(v: f32) -> f32 {
    let rounded = (v * 100.0).round() / 100.0;
    if (rounded - v).abs() < VOLUME_STEP_EPSILON { rounded } else { v }
}

// ============================================================================
// Recording player
// ============================================================================

/// A recorded surface call
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCall {
    Play,
    Pause,
    Stop,
    Seek(f64),
    SetVolume(f32),
    SetSpeed(f32),
    ToggleFullscreen,
    AddBookmark,
    ToggleFavorite,
}

impl ControlCall {
    fn operation(&self) -> &'static str {
        match self {
            ControlCall::Play => "play",
            ControlCall::Pause => "pause",
            ControlCall::Stop => "stop",
            ControlCall::Seek(_) => "seek",
            ControlCall::SetVolume(_) => "setVolume",
            ControlCall::SetSpeed(_) => "setSpeed",
            ControlCall::ToggleFullscreen => "toggleFullscreen",
            ControlCall::AddBookmark => "addBookmark",
            ControlCall::ToggleFavorite => "toggleFavorite",
        }
    }
}

/// In-memory player that tracks state and records calls
#[derive(Debug, Clone)]
pub struct RecordingPlayer {
    reference: Option<PlayableReference>,
    descriptor: Option<SourceDescriptor>,
    player_ready: bool,
    playing: bool,
    position_secs: f64,
    volume: f32,
    speed: f32,
    fullscreen: bool,
    favorite: bool,
    bookmarks: Vec<f64>,
    calls: Vec<ControlCall>,
    fail_next: Option<(&'static str, String)>,
}

impl Default for RecordingPlayer {
    fn default() -> Self {
        Self {
            reference: None,
            descriptor: None,
            player_ready: false,
            playing: false,
            position_secs: 0.0,
            volume: 1.0,
            speed: 1.0,
            fullscreen: false,
            favorite: false,
            bookmarks: Vec::new(),
            calls: Vec::new(),
            fail_next: None,
        }
    }
}

impl RecordingPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and load a URL; unsupported sources are rejected
    pub fn load(&mut self, url: &str) -> Result<&SourceDescriptor, SourceError> {
        let reference = source::to_playable_reference(url)?;
        tracing::info!(url = %reference.url(), embed = reference.needs_embed(), "Loaded video");
        self.reference = Some(reference);
        self.player_ready = true;
        self.playing = false;
        self.position_secs = 0.0;
        let descriptor = self.descriptor.insert(source::classify(url));
        Ok(&*descriptor)
    }

    pub fn unload(&mut self) {
        self.reference = None;
        self.descriptor = None;
        self.player_ready = false;
        self.playing = false;
    }

    /// Simulate a player that has a video but no usable instance
    pub fn set_player_ready(&mut self, ready: bool) {
        self.player_ready = ready;
    }

    /// Make the next call to `operation` fail with `reason`
    pub fn fail_next(&mut self, operation: &'static str, reason: impl Into<String>) {
        self.fail_next = Some((operation, reason.into()));
    }

    pub fn reference(&self) -> Option<&PlayableReference> {
        self.reference.as_ref()
    }

    pub fn descriptor(&self) -> Option<&SourceDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn calls(&self) -> &[ControlCall] {
        &self.calls
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position_secs(&self) -> f64 {
        self.position_secs
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn is_favorite(&self) -> bool {
        self.favorite
    }

    pub fn bookmarks(&self) -> &[f64] {
        &self.bookmarks
    }

    fn record(&mut self, call: ControlCall) -> Result<(), ControlError> {
        let operation = call.operation();
        self.calls.push(call);
        match self.fail_next.take() {
            Some((op, reason)) if op == operation => Err(ControlError::Failed { operation, reason }),
            other => {
                self.fail_next = other;
                Ok(())
            }
        }
    }
}

impl VideoControl for RecordingPlayer {
    fn uri(&self) -> Option<&str> {
        self.reference.as_ref().map(|r| r.url())
    }

    fn has_player(&self) -> bool {
        self.player_ready
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn play(&mut self) -> Result<(), ControlError> {
        self.record(ControlCall::Play)?;
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), ControlError> {
        self.record(ControlCall::Pause)?;
        self.playing = false;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ControlError> {
        self.record(ControlCall::Stop)?;
        self.playing = false;
        self.position_secs = 0.0;
        Ok(())
    }

    fn seek(&mut self, delta_secs: f64) -> Result<(), ControlError> {
        self.record(ControlCall::Seek(delta_secs))?;
        self.position_secs = (self.position_secs + delta_secs).max(0.0);
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), ControlError> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(ControlError::InvalidArgument {
                name: "volume",
                value: volume as f64,
            });
        }
        self.record(ControlCall::SetVolume(volume))?;
        self.volume = volume;
        Ok(())
    }

    fn set_speed(&mut self, multiplier: f32) -> Result<(), ControlError> {
        if !(multiplier > 0.0 && multiplier.is_finite()) {
            return Err(ControlError::InvalidArgument {
                name: "speed",
                value: multiplier as f64,
            });
        }
        self.record(ControlCall::SetSpeed(multiplier))?;
        self.speed = multiplier;
        Ok(())
    }

    fn toggle_fullscreen(&mut self) -> Result<(), ControlError> {
        self.record(ControlCall::ToggleFullscreen)?;
        self.fullscreen = !self.fullscreen;
        Ok(())
    }

    fn add_bookmark(&mut self) -> Result<(), ControlError> {
        self.record(ControlCall::AddBookmark)?;
        self.bookmarks.push(self.position_secs);
        Ok(())
    }

    fn toggle_favorite(&mut self) -> Result<(), ControlError> {
        self.record(ControlCall::ToggleFavorite)?;
        self.favorite = !self.favorite;
        Ok(())
    }
}
