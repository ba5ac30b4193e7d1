//! Voice control orchestrator
//!
//! Glue between the session manager, the command grammar and a video control
//! surface. Nothing here returns an error to the caller: every failure is
//! folded into a [`CommandResult`] so a bad transcript or a failing player
//! never tears down the session.

use std::sync::Arc;

use serde::Serialize;

use crate::command::{CommandGrammar, CommandId, CustomCommandOverlay};
use crate::config::Config;
use crate::control::VideoControl;
use crate::error::{DispatchError, StoreError};
use crate::recognition::{
    ListenMode, RecognitionBackend, SessionManager, SessionUpdate, TranscriptEvent,
};
use crate::state::{RuntimeState, SharedState};
use crate::store::{self, SettingsStore, VoiceSettings};

/// Outcome of a voice action, for UI feedback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
    pub success: bool,
    pub message: String,
    #[serde(rename = "commandId", skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandId>,
}

impl CommandResult {
    pub fn success(message: impl Into<String>, command: Option<CommandId>) -> Self {
        Self {
            success: true,
            message: message.into(),
            command,
        }
    }

    pub fn failure(message: impl Into<String>, command: Option<CommandId>) -> Self {
        Self {
            success: false,
            message: message.into(),
            command,
        }
    }
}

/// What one step of the voice loop produced
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceOutcome {
    /// Session progress that needs no dispatch
    Update(SessionUpdate),
    /// An accepted transcript and what dispatching it did
    Command {
        transcript: TranscriptEvent,
        result: CommandResult,
    },
}

pub struct VoiceController {
    manager: SessionManager,
    grammar: CommandGrammar,
    store: Box<dyn SettingsStore>,
    state: SharedState,
}

impl VoiceController {
    pub fn new(
        manager: SessionManager,
        grammar: CommandGrammar,
        store: Box<dyn SettingsStore>,
    ) -> Self {
        let state = Arc::clone(manager.state());
        Self {
            manager,
            grammar,
            store,
            state,
        }
    }

    /// Wire a controller from configuration and apply persisted settings
    pub fn from_config(
        config: &Config,
        backend: Box<dyn RecognitionBackend>,
        store: Box<dyn SettingsStore>,
    ) -> Self {
        let state = RuntimeState::new(config);
        let manager = SessionManager::new(
            backend,
            config.recognition.session_config(),
            state,
            config.language(),
            config.recognition.interim_results,
        );
        let grammar = CommandGrammar::new(config.commands.overlay())
            .with_builtin(config.commands.enable_builtin);
        let mut controller = Self::new(manager, grammar, store);
        controller.load_settings();
        controller
    }

    /// A stored overlay replaces the configured seed; a stored threshold
    /// replaces the configured one.
    pub fn load_settings(&mut self) {
        let settings = VoiceSettings::load(self.store.as_ref());
        if let Some(overlay) = settings.custom_commands {
            tracing::debug!("Loaded {} custom commands", overlay.len());
            *self.grammar.overlay_mut() = overlay;
        }
        if let Some(threshold) = settings.confidence_threshold {
            tracing::debug!("Loaded confidence threshold {:.2}", threshold);
            self.state.set_confidence_threshold(threshold);
        }
    }

    pub fn manager(&self) -> &SessionManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SessionManager {
        &mut self.manager
    }

    pub fn grammar(&self) -> &CommandGrammar {
        &self.grammar
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    // ========================================================================
    // Control flow
    // ========================================================================

    /// Authorize if needed, then start listening. Never fails; the result
    /// carries the reason.
    pub async fn execute_control_flow(&mut self, mode: ListenMode) -> CommandResult {
        if let Err(e) = self.manager.ensure_authorized().await {
            tracing::warn!("Voice control unavailable: {}", e);
            return CommandResult::failure(e.to_string(), None);
        }
        match self.manager.start(mode).await {
            Ok(()) => CommandResult::success("voice recognition started", None),
            Err(e) => {
                tracing::warn!("Failed to start voice recognition: {}", e);
                CommandResult::failure(e.to_string(), None)
            }
        }
    }

    /// Match `text` and run the command on `surface`
    pub fn process_transcript(&self, text: &str, surface: &mut dyn VideoControl) -> CommandResult {
        match self.dispatch(text, surface) {
            Ok(command) => {
                tracing::info!("Executed voice command {}", command);
                CommandResult::success(format!("executed: {}", command), Some(command))
            }
            Err((command, e)) => {
                tracing::debug!("Voice command not executed: {}", e);
                CommandResult::failure(e.to_string(), command)
            }
        }
    }

    fn dispatch(
        &self,
        text: &str,
        surface: &mut dyn VideoControl,
    ) -> Result<CommandId, (Option<CommandId>, DispatchError)> {
        let text = text.trim();
        if text.is_empty() {
            return Err((None, DispatchError::Empty));
        }
        let Some(found) = self.grammar.matches(text) else {
            return Err((None, DispatchError::Unrecognized(text.to_string())));
        };
        let command = found.command;

        if surface.uri().is_none() {
            return Err((Some(command), DispatchError::NoVideoLoaded));
        }
        if !surface.has_player() {
            return Err((Some(command), DispatchError::PlayerUnavailable));
        }
        command
            .action()
            .perform(surface)
            .map_err(|e| (Some(command), DispatchError::Control(e)))?;
        Ok(command)
    }

    /// Wait for the next session update, dispatching accepted transcripts.
    /// `None` once the session is over.
    pub async fn next_outcome(&mut self, surface: &mut dyn VideoControl) -> Option<VoiceOutcome> {
        match self.manager.next_update().await? {
            SessionUpdate::Transcript(transcript) => {
                let result = self.process_transcript(&transcript.text, surface);
                Some(VoiceOutcome::Command { transcript, result })
            }
            update => Some(VoiceOutcome::Update(update)),
        }
    }

    /// Drive the session to completion, reporting every outcome
    pub async fn run<F>(&mut self, surface: &mut dyn VideoControl, mut on_outcome: F)
    where
        F: FnMut(&VoiceOutcome),
    {
        while let Some(outcome) = self.next_outcome(surface).await {
            on_outcome(&outcome);
        }
    }

    pub async fn stop(&mut self) -> bool {
        self.manager.stop().await
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Bind `trigger` to `command` and persist the overlay
    pub fn save_custom_command(&mut self, command: CommandId, trigger: &str) -> Result<(), StoreError> {
        let trigger = trigger.trim();
        if trigger.is_empty() {
            return Err(StoreError::InvalidValue {
                key: command.as_str().to_string(),
                value: trigger.to_string(),
            });
        }
        self.grammar.overlay_mut().set(command, trigger);
        store::save_custom_commands(self.store.as_ref(), self.grammar.overlay())
    }

    pub fn remove_custom_command(&mut self, command: CommandId) -> Result<Option<String>, StoreError> {
        let removed = self.grammar.overlay_mut().remove(command);
        if removed.is_some() {
            store::save_custom_commands(self.store.as_ref(), self.grammar.overlay())?;
        }
        Ok(removed)
    }

    pub fn reset_custom_commands(&mut self) -> Result<(), StoreError> {
        *self.grammar.overlay_mut() = CustomCommandOverlay::new();
        store::save_custom_commands(self.store.as_ref(), self.grammar.overlay())
    }

    /// Clamp to [0, 1], apply to the live session, and persist. Returns the
    /// value actually stored.
    pub fn set_confidence_threshold(&self, threshold: f32) -> Result<f32, StoreError> {
        let stored = self.state.set_confidence_threshold(threshold);
        store::save_confidence_threshold(self.store.as_ref(), stored)?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlCall, RecordingPlayer};
    use crate::recognition::{ScriptStep, SimulatedBackend};
    use crate::state::AuthorizationState;
    use crate::store::{CONFIDENCE_THRESHOLD_KEY, CUSTOM_COMMANDS_KEY, MemoryStore};

    fn controller(store: MemoryStore) -> (VoiceController, crate::recognition::SimulatorHandle) {
        let backend = SimulatedBackend::new();
        let handle = backend.handle();
        let controller =
            VoiceController::from_config(&Config::default(), Box::new(backend), Box::new(store));
        (controller, handle)
    }

    fn loaded_player() -> RecordingPlayer {
        let mut player = RecordingPlayer::new();
        player.load("https://cdn.example.com/clip.mp4").unwrap();
        player
    }

    #[test]
    fn test_process_transcript_executes() {
        let (c, _) = controller(MemoryStore::new());
        let mut player = loaded_player();
        let result = c.process_transcript("please pause the video", &mut player);
        assert_eq!(
            result,
            CommandResult::success("executed: pause", Some(CommandId::Pause))
        );
        assert_eq!(player.calls(), &[ControlCall::Pause]);
    }

    #[test]
    fn test_process_transcript_unrecognized() {
        let (c, _) = controller(MemoryStore::new());
        let mut player = loaded_player();
        let result = c.process_transcript("tell me a joke", &mut player);
        assert!(!result.success);
        assert_eq!(result.message, "unrecognized: tell me a joke");
        assert_eq!(result.command, None);
        assert!(player.calls().is_empty());

        let result = c.process_transcript("   ", &mut player);
        assert_eq!(result.message, "no voice command received");
    }

    #[test]
    fn test_preconditions_reported() {
        let (c, _) = controller(MemoryStore::new());
        let mut player = RecordingPlayer::new();
        let result = c.process_transcript("play", &mut player);
        assert_eq!(
            result,
            CommandResult::failure("no video loaded", Some(CommandId::Play))
        );

        let mut player = loaded_player();
        player.set_player_ready(false);
        let result = c.process_transcript("play", &mut player);
        assert_eq!(result.message, "player unavailable");
        assert!(player.calls().is_empty());
    }

    #[test]
    fn test_surface_failure_reported() {
        let (c, _) = controller(MemoryStore::new());
        let mut player = loaded_player();
        player.fail_next("play", "decoder stalled");
        let result = c.process_transcript("play", &mut player);
        assert!(!result.success);
        assert_eq!(result.message, "play failed: decoder stalled");
        assert_eq!(result.command, Some(CommandId::Play));
    }

    #[test]
    fn test_custom_commands_persist() {
        let store = MemoryStore::new();
        let (mut c, _) = controller(store.clone());
        c.save_custom_command(CommandId::Bookmark, "  remember this ").unwrap();
        assert!(c.save_custom_command(CommandId::Play, "  ").is_err());

        let mut player = loaded_player();
        let result = c.process_transcript("Remember this moment", &mut player);
        assert_eq!(result.command, Some(CommandId::Bookmark));
        assert_eq!(
            store.get(CUSTOM_COMMANDS_KEY).unwrap().as_deref(),
            Some(r#"{"bookmark":"remember this"}"#)
        );

        // A fresh controller over the same store picks the overlay up
        let (reloaded, _) = controller(store.clone());
        assert_eq!(reloaded.grammar().overlay().get(CommandId::Bookmark), Some("remember this"));

        assert_eq!(
            c.remove_custom_command(CommandId::Bookmark).unwrap().as_deref(),
            Some("remember this")
        );
        assert_eq!(store.get(CUSTOM_COMMANDS_KEY).unwrap().as_deref(), Some("{}"));
        c.save_custom_command(CommandId::Stop, "halt").unwrap();
        c.reset_custom_commands().unwrap();
        assert!(c.grammar().overlay().is_empty());
    }

    #[test]
    fn test_threshold_clamped_and_persisted() {
        let store = MemoryStore::new();
        let (c, _) = controller(store.clone());
        assert_eq!(c.set_confidence_threshold(1.3).unwrap(), 1.0);
        assert_eq!(c.state().confidence_threshold(), 1.0);
        assert_eq!(store.get(CONFIDENCE_THRESHOLD_KEY).unwrap().as_deref(), Some("1"));

        store.set(CONFIDENCE_THRESHOLD_KEY, "0.55").unwrap();
        let (reloaded, _) = controller(store);
        assert_eq!(reloaded.state().confidence_threshold(), 0.55);
    }

    #[tokio::test]
    async fn test_control_flow_reports_denial() {
        let (mut c, handle) = controller(MemoryStore::new());
        handle.set_permission(AuthorizationState::Denied);
        let result = c.execute_control_flow(ListenMode::SingleShot).await;
        assert!(!result.success);
        assert!(result.message.contains("denied"));
        assert_eq!(handle.start_count(), 0);
    }

    #[tokio::test]
    async fn test_control_flow_dispatches_transcript() {
        let (mut c, handle) = controller(MemoryStore::new());
        handle.push_batch(vec![ScriptStep::final_result("mute", 0.92)]);
        let result = c.execute_control_flow(ListenMode::SingleShot).await;
        assert_eq!(result, CommandResult::success("voice recognition started", None));

        let mut player = loaded_player();
        let mut outcomes = Vec::new();
        c.run(&mut player, |o| outcomes.push(o.clone())).await;

        assert!(outcomes.iter().any(|o| matches!(
            o,
            VoiceOutcome::Command { result, .. } if result.command == Some(CommandId::Mute) && result.success
        )));
        assert_eq!(player.calls(), &[ControlCall::SetVolume(0.0)]);
    }

    #[test]
    fn test_result_serializes_for_ui() {
        let json = serde_json::to_string(&CommandResult::success(
            "executed: volumeUp",
            Some(CommandId::VolumeUp),
        ))
        .unwrap();
        assert_eq!(
            json,
            r#"{"success":true,"message":"executed: volumeUp","commandId":"volumeUp"}"#
        );
        let json = serde_json::to_string(&CommandResult::failure("no video loaded", None)).unwrap();
        assert_eq!(json, r#"{"success":false,"message":"no video loaded"}"#);
    }
}
