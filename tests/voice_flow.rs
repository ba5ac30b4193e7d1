use std::sync::Arc;
use std::time::Duration;

use voxplay::command::{CommandGrammar, CommandId};
use voxplay::config::Config;
use voxplay::control::{ControlCall, RecordingPlayer};
use voxplay::error::RecognitionError;
use voxplay::locale::Language;
use voxplay::orchestrator::{VoiceController, VoiceOutcome};
use voxplay::recognition::{
    EndReason, EngineEvent, ErrorCode, HostCommand, ListenMode, ScriptStep, SessionConfig,
    SessionId, SessionManager, SessionUpdate, SimulatedBackend, SimulatorHandle, TranscriptEvent,
    host_backend,
};
use voxplay::source::{self, SupportTier};
use voxplay::state::{AuthorizationState, RuntimeState, SessionStatus, SharedState};
use voxplay::store::MemoryStore;

fn controller(batches: Vec<Vec<ScriptStep>>) -> (VoiceController, SimulatorHandle) {
    let backend = SimulatedBackend::with_script(batches);
    let handle = backend.handle();
    let controller = VoiceController::from_config(
        &Config::default(),
        Box::new(backend),
        Box::new(MemoryStore::new()),
    );
    (controller, handle)
}

fn manager(batches: Vec<Vec<ScriptStep>>) -> (SessionManager, SimulatorHandle, SharedState) {
    let backend = SimulatedBackend::with_script(batches);
    let handle = backend.handle();
    let state: SharedState = Arc::new(RuntimeState::default());
    let manager = SessionManager::new(
        Box::new(backend),
        SessionConfig::default(),
        Arc::clone(&state),
        Language::ZhTw,
        true,
    );
    (manager, handle, state)
}

async fn collect(controller: &mut VoiceController, player: &mut RecordingPlayer) -> Vec<VoiceOutcome> {
    let mut outcomes = Vec::new();
    controller.run(player, |o| outcomes.push(o.clone())).await;
    outcomes
}

fn commands(outcomes: &[VoiceOutcome]) -> Vec<(String, bool)> {
    outcomes
        .iter()
        .filter_map(|o| match o {
            VoiceOutcome::Command { result, .. } => Some((result.message.clone(), result.success)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_direct_file_play_end_to_end() {
    let url = "https://media.example.org/trailers/teaser.mp4";
    let descriptor = source::classify(url);
    assert_eq!(descriptor.tier, SupportTier::Supported);
    assert_eq!(descriptor.platform, "Direct Video");
    assert_eq!(source::to_playable_reference(url).unwrap().url(), url);

    let (mut controller, _) = controller(vec![vec![ScriptStep::final_result("play", 0.9)]]);
    let mut player = RecordingPlayer::new();
    player.load(url).unwrap();

    let started = controller.execute_control_flow(ListenMode::SingleShot).await;
    assert!(started.success);
    let outcomes = collect(&mut controller, &mut player).await;

    assert_eq!(commands(&outcomes), vec![("executed: play".to_string(), true)]);
    assert_eq!(player.calls(), &[ControlCall::Play]);
    assert!(outcomes.contains(&VoiceOutcome::Update(SessionUpdate::Ended(EndReason::Completed))));
    assert_eq!(controller.state().status(), SessionStatus::Idle);
}

#[tokio::test]
async fn test_traditional_chinese_seek() {
    let (mut controller, _) = controller(vec![vec![ScriptStep::final_result("快轉10秒", 0.95)]]);
    let mut player = RecordingPlayer::new();
    player.load("https://example.com/lecture.webm").unwrap();

    controller.execute_control_flow(ListenMode::SingleShot).await;
    let outcomes = collect(&mut controller, &mut player).await;

    assert!(outcomes.iter().any(|o| matches!(
        o,
        VoiceOutcome::Command { result, .. } if result.command == Some(CommandId::Forward10)
    )));
    assert_eq!(player.calls(), &[ControlCall::Seek(10.0)]);
    assert_eq!(player.position_secs(), 10.0);
}

#[tokio::test(start_paused = true)]
async fn test_low_confidence_never_dispatches() {
    let (mut controller, _) = controller(vec![vec![ScriptStep::final_result("play", 0.5)]]);
    let mut player = RecordingPlayer::new();
    player.load("https://example.com/a.mp4").unwrap();

    controller.execute_control_flow(ListenMode::SingleShot).await;
    let outcomes = collect(&mut controller, &mut player).await;

    assert!(player.calls().is_empty());
    assert!(commands(&outcomes).is_empty());
    assert!(outcomes.iter().any(|o| matches!(
        o,
        VoiceOutcome::Update(SessionUpdate::LowConfidence { threshold, .. }) if *threshold == 0.7
    )));
    // Still listening after the hint, so the pass ends on its silence deadline
    assert_eq!(
        outcomes.last(),
        Some(&VoiceOutcome::Update(SessionUpdate::Ended(EndReason::TimedOut)))
    );
}

#[tokio::test]
async fn test_threshold_change_applies_to_live_session() {
    let (mut controller, handle) = controller(vec![vec![]]);
    let mut player = RecordingPlayer::new();
    player.load("https://example.com/a.mp4").unwrap();
    controller.execute_control_flow(ListenMode::Continuous).await;

    controller.set_confidence_threshold(0.4).unwrap();
    handle.emit_result("pause", 0.5, true);
    handle.emit_result("ignored", 0.2, true);

    let mut seen = Vec::new();
    while seen.len() < 3 {
        seen.push(controller.next_outcome(&mut player).await.unwrap());
    }
    assert!(matches!(seen[0], VoiceOutcome::Update(SessionUpdate::Listening { .. })));
    assert!(matches!(&seen[1], VoiceOutcome::Command { result, .. } if result.success));
    assert!(matches!(seen[2], VoiceOutcome::Update(SessionUpdate::LowConfidence { .. })));
    assert_eq!(player.calls(), &[ControlCall::Pause]);
    controller.stop().await;
}

#[tokio::test]
async fn test_stop_twice_is_a_no_op() {
    let (mut manager, handle, state) = manager(vec![vec![]]);
    manager.ensure_authorized().await.unwrap();
    manager.start_continuous().await.unwrap();
    assert!(matches!(manager.next_update().await, Some(SessionUpdate::Listening { .. })));

    assert!(manager.stop().await);
    assert!(!manager.stop().await);

    let mut updates = Vec::new();
    while let Some(update) = manager.next_update().await {
        updates.push(update);
    }
    assert_eq!(updates, vec![SessionUpdate::Ended(EndReason::Stopped)]);
    assert_eq!(handle.aborts(), vec![SessionId(1)]);
    assert!(!state.is_listening());
}

#[tokio::test]
async fn test_restart_keeps_one_engine() {
    let (mut manager, handle, _) = manager(vec![vec![], vec![]]);
    manager.ensure_authorized().await.unwrap();
    manager.start_continuous().await.unwrap();
    manager.start_single_shot().await.unwrap();

    assert_eq!(handle.start_count(), 2);
    assert_eq!(handle.aborts(), vec![SessionId(1)]);
    assert_eq!(handle.max_concurrent(), 1);
    assert_eq!(handle.active_session(), Some(SessionId(2)));
    assert_eq!(handle.starts()[1].locale, "zh-TW");

    // Only the replacement session's events surface
    assert_eq!(
        manager.next_update().await,
        Some(SessionUpdate::Listening {
            session: SessionId(2),
            mode: ListenMode::SingleShot
        })
    );
    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_retry_ceiling() {
    let no_speech = || vec![ScriptStep::Error(ErrorCode::NoSpeech)];
    let (mut manager, handle, state) = manager(vec![no_speech(), no_speech(), no_speech()]);
    manager.ensure_authorized().await.unwrap();
    manager.start_single_shot().await.unwrap();

    let mut updates = Vec::new();
    while let Some(update) = manager.next_update().await {
        updates.push(update);
    }

    let retries: Vec<u32> = updates
        .iter()
        .filter_map(|u| match u {
            SessionUpdate::Retrying { attempt, .. } => Some(*attempt),
            _ => None,
        })
        .collect();
    assert_eq!(retries, vec![1, 2]);
    assert_eq!(
        updates.last(),
        Some(&SessionUpdate::Failed(RecognitionError::RetriesExhausted {
            last: ErrorCode::NoSpeech,
            attempts: 3
        }))
    );
    assert_eq!(handle.start_count(), 3);
    assert_eq!(state.status(), SessionStatus::Error);
}

#[tokio::test(start_paused = true)]
async fn test_continuous_restart_and_rotation() {
    let (mut manager, handle, _) = manager(vec![
        vec![ScriptStep::End],
        vec![],
    ]);
    manager.ensure_authorized().await.unwrap();
    let began = tokio::time::Instant::now();
    manager.start_continuous().await.unwrap();

    let mut listening = Vec::new();
    while listening.len() < 3 {
        if let Some(SessionUpdate::Listening { session, .. }) = manager.next_update().await {
            listening.push((session, began.elapsed()));
        }
    }

    // Natural end: restart after the 1 s delay
    assert_eq!(listening[1].0, SessionId(2));
    assert!(listening[1].1 >= Duration::from_secs(1));
    // Forced rotation of the long-lived second session
    assert_eq!(listening[2].0, SessionId(3));
    assert!(listening[2].1 >= Duration::from_secs(56));
    assert_eq!(handle.aborts(), vec![SessionId(2)]);
    assert_eq!(handle.max_concurrent(), 1);
    manager.stop().await;
}

#[tokio::test]
async fn test_stale_events_are_dropped() {
    let (mut manager, handle, _) = manager(vec![vec![], vec![]]);
    manager.ensure_authorized().await.unwrap();
    manager.start_continuous().await.unwrap();
    manager.start_continuous().await.unwrap();

    handle.emit_for(
        SessionId(1),
        EngineEvent::Result(TranscriptEvent::new("stop", 0.99, true)),
    );
    handle.emit_result("pause", 0.99, true);

    let mut transcripts = Vec::new();
    while transcripts.is_empty() {
        if let Some(SessionUpdate::Transcript(t)) = manager.next_update().await {
            transcripts.push(t.text);
        }
    }
    assert_eq!(transcripts, vec!["pause".to_string()]);
    manager.stop().await;
}

#[tokio::test]
async fn test_permission_denied_blocks_activation() {
    let (mut controller, handle) = controller(vec![]);
    handle.set_permission(AuthorizationState::Denied);

    let result = controller.execute_control_flow(ListenMode::Continuous).await;
    assert!(!result.success);
    assert_eq!(result.message, "Microphone permission denied (denied)");
    assert_eq!(handle.start_count(), 0);
    assert_eq!(controller.state().authorization(), AuthorizationState::Denied);
}

#[tokio::test]
async fn test_missing_engine_blocks_activation() {
    let (mut controller, handle) = controller(vec![]);
    handle.set_available(false);

    let result = controller.execute_control_flow(ListenMode::SingleShot).await;
    assert!(!result.success);
    assert_eq!(
        result.message,
        "Speech recognition is not available on this platform"
    );
}

#[tokio::test]
async fn test_fatal_error_surfaces_and_stops() {
    let (mut controller, handle) =
        controller(vec![vec![ScriptStep::Error(ErrorCode::AudioCapture)]]);
    let mut player = RecordingPlayer::new();
    controller.execute_control_flow(ListenMode::Continuous).await;
    let outcomes = collect(&mut controller, &mut player).await;

    let failure = outcomes.iter().find_map(|o| match o {
        VoiceOutcome::Update(SessionUpdate::Failed(e)) => Some(e.to_string()),
        _ => None,
    });
    assert_eq!(
        failure.as_deref(),
        Some("Microphone access denied or not available")
    );
    assert_eq!(handle.start_count(), 1);
    assert_eq!(controller.state().status(), SessionStatus::Error);
}

#[test]
fn test_custom_grammar_without_builtin() {
    let overlay = [(CommandId::Play, "go go".to_string())].into_iter().collect();
    let grammar = CommandGrammar::new(overlay).with_builtin(false);
    assert_eq!(grammar.matches("go go now").map(|m| m.command), Some(CommandId::Play));
    assert_eq!(grammar.matches("pause"), None);
}

#[tokio::test(start_paused = true)]
async fn test_single_shot_settles_when_host_never_ends() {
    let (backend, bridge) = host_backend(true);
    let state: SharedState = Arc::new(RuntimeState::default());
    let mut manager = SessionManager::new(
        Box::new(backend),
        SessionConfig::default(),
        Arc::clone(&state),
        Language::En,
        true,
    );

    let (authorized, _) = tokio::join!(manager.ensure_authorized(), async {
        if let Some(HostCommand::RequestPermission { reply }) = bridge.next_command().await {
            reply.send(AuthorizationState::Authorized).ok();
        }
    });
    authorized.unwrap();

    manager.start_single_shot().await.unwrap();
    assert!(matches!(bridge.try_command(), Some(HostCommand::Start(_))));
    bridge.on_start(SessionId(1));
    bridge.on_result(SessionId(1), "play", 0.9, true);

    let began = tokio::time::Instant::now();
    let mut updates = Vec::new();
    while let Some(update) = manager.next_update().await {
        updates.push(update);
    }

    assert!(matches!(updates[1], SessionUpdate::Transcript(ref t) if t.text == "play"));
    assert_eq!(updates.last(), Some(&SessionUpdate::Ended(EndReason::Completed)));
    assert!(began.elapsed() >= Duration::from_secs(2));
    assert!(began.elapsed() < Duration::from_secs(10));
    assert_eq!(state.status(), SessionStatus::Idle);
    assert!(!manager.is_active());

    // The host was asked to stop, then aborted once the grace period ran out
    assert!(matches!(bridge.try_command(), Some(HostCommand::Stop(SessionId(1)))));
    assert!(matches!(bridge.try_command(), Some(HostCommand::Abort(SessionId(1)))));

    // The engine is free for the next pass
    manager.start_single_shot().await.unwrap();
    assert!(matches!(
        bridge.try_command(),
        Some(HostCommand::Start(ref request)) if request.session == SessionId(2)
    ));
    manager.stop().await;
}
