//! On-device speech engine: microphone capture, energy VAD, and a Parakeet
//! model transcribing each utterance.
//!
//! Every engine session runs on its own thread (cpal streams are not `Send`).
//! The thread ends the session itself after `no_speech_secs` of silence, on
//! stop (after transcribing what it already heard), or on abort.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use transcribe_rs::{
    TranscriptionEngine,
    engines::parakeet::{ParakeetEngine, ParakeetModelParams},
};

use super::engine::{
    BackendKind, ErrorCode, EventSink, ListenMode, RecognitionBackend, SessionId, StartRequest,
};
use crate::config::NativeConfig;
use crate::error::BackendError;
use crate::state::AuthorizationState;

pub const TARGET_RATE: usize = 16000;
const VAD_FRAME_SAMPLES: usize = 480;
const ENERGY_THRESHOLD: f32 = 0.01;
const ENERGY_THRESHOLD_END: f32 = 0.006;
/// Shortest trailing buffer worth transcribing on stop
const MIN_FLUSH_SAMPLES: usize = TARGET_RATE / 2;

// ============================================================================
// Audio helpers
// ============================================================================

pub fn resample(samples: &[f32], from_rate: usize, to_rate: usize) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }
    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio) as usize;
    (0..new_len)
        .map(|i| {
            let src_idx = i as f64 / ratio;
            let idx = src_idx as usize;
            let frac = src_idx - idx as f64;
            if idx + 1 < samples.len() {
                samples[idx] * (1.0 - frac as f32) + samples[idx + 1] * frac as f32
            } else {
                samples.get(idx).copied().unwrap_or(0.0)
            }
        })
        .collect()
}

/// RMS gate with a lower threshold once speech has started
fn is_speech(frame: &[f32], currently_speaking: bool) -> bool {
    if frame.is_empty() {
        return false;
    }
    let threshold = if currently_speaking {
        ENERGY_THRESHOLD_END
    } else {
        ENERGY_THRESHOLD
    };
    let rms = (frame.iter().map(|&s| s * s).sum::<f32>() / frame.len() as f32).sqrt();
    rms > threshold
}

/// Splits a 16 kHz stream into utterances closed by trailing silence
#[derive(Debug)]
pub struct Utterances {
    silence_frames_needed: u32,
    frame_buf: Vec<f32>,
    speech_buf: Vec<f32>,
    in_speech: bool,
    silence_frames: u32,
}

impl Utterances {
    pub fn new(silence_ms: u32) -> Self {
        let frames = (silence_ms as usize * TARGET_RATE) / (1000 * VAD_FRAME_SAMPLES);
        Self {
            silence_frames_needed: frames.max(1) as u32,
            frame_buf: Vec::new(),
            speech_buf: Vec::new(),
            in_speech: false,
            silence_frames: 0,
        }
    }

    pub fn in_speech(&self) -> bool {
        self.in_speech
    }

    /// Feed samples; returns every utterance completed by them
    pub fn push(&mut self, samples: &[f32]) -> Vec<Vec<f32>> {
        self.frame_buf.extend_from_slice(samples);
        let mut done = Vec::new();
        while self.frame_buf.len() >= VAD_FRAME_SAMPLES {
            let frame: Vec<f32> = self.frame_buf.drain(..VAD_FRAME_SAMPLES).collect();
            if is_speech(&frame, self.in_speech) {
                self.in_speech = true;
                self.silence_frames = 0;
                self.speech_buf.extend_from_slice(&frame);
            } else if self.in_speech {
                self.silence_frames += 1;
                self.speech_buf.extend_from_slice(&frame);
                if self.silence_frames >= self.silence_frames_needed {
                    self.in_speech = false;
                    self.silence_frames = 0;
                    done.push(std::mem::take(&mut self.speech_buf));
                }
            }
        }
        done
    }

    /// Whatever speech is buffered, if long enough to transcribe
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        self.in_speech = false;
        let buf = std::mem::take(&mut self.speech_buf);
        (buf.len() >= MIN_FLUSH_SAMPLES).then_some(buf)
    }
}

// ============================================================================
// Backend
// ============================================================================

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Run = 0,
    Stop = 1,
    Abort = 2,
}

struct Live {
    session: SessionId,
    control: Arc<AtomicU8>,
}

pub struct NativeBackend {
    config: NativeConfig,
    engine: Arc<Mutex<Option<ParakeetEngine>>>,
    live: Option<Live>,
}

impl NativeBackend {
    pub fn new(config: NativeConfig) -> Self {
        Self {
            config,
            engine: Arc::new(Mutex::new(None)),
            live: None,
        }
    }

    fn has_input_device() -> bool {
        use cpal::traits::HostTrait;
        cpal::default_host().default_input_device().is_some()
    }

    fn signal(&mut self, session: SessionId, control: Control) {
        if let Some(live) = self.live.as_ref().filter(|live| live.session == session) {
            live.control.store(control as u8, Ordering::SeqCst);
            self.live = None;
        }
    }
}

#[async_trait]
impl RecognitionBackend for NativeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn is_available(&self) -> bool {
        Path::new(&self.config.model_path).exists() && Self::has_input_device()
    }

    /// Desktop capture has no permission prompt; an openable input device
    /// counts as authorized.
    async fn request_permission(&mut self) -> Result<AuthorizationState, BackendError> {
        if !Path::new(&self.config.model_path).exists() {
            tracing::warn!("Speech model not found at {}", self.config.model_path);
            return Err(BackendError::Unavailable);
        }
        if !Self::has_input_device() {
            return Err(BackendError::Unavailable);
        }
        Ok(AuthorizationState::Authorized)
    }

    async fn start(&mut self, request: StartRequest, sink: EventSink) -> Result<(), BackendError> {
        if let Some(old) = self.live.take() {
            old.control.store(Control::Abort as u8, Ordering::SeqCst);
        }
        let control = Arc::new(AtomicU8::new(Control::Run as u8));
        let session = EngineSession {
            mode: request.mode,
            config: SessionTuning::from(&self.config),
            model_path: self.config.model_path.clone(),
            engine: Arc::clone(&self.engine),
            control: Arc::clone(&control),
            sink,
        };
        std::thread::Builder::new()
            .name(format!("speech-{}", request.session.0))
            .spawn(move || session.run())
            .map_err(|e| BackendError::Start(e.to_string()))?;
        self.live = Some(Live {
            session: request.session,
            control,
        });
        Ok(())
    }

    async fn stop(&mut self, session: SessionId) {
        self.signal(session, Control::Stop);
    }

    async fn abort(&mut self, session: SessionId) {
        self.signal(session, Control::Abort);
    }
}

#[derive(Debug, Clone, Copy)]
struct SessionTuning {
    assumed_confidence: f32,
    silence_ms: u32,
    no_speech: Duration,
}

impl From<&NativeConfig> for SessionTuning {
    fn from(config: &NativeConfig) -> Self {
        Self {
            assumed_confidence: config.assumed_confidence,
            silence_ms: config.silence_ms,
            no_speech: Duration::from_secs(config.no_speech_secs),
        }
    }
}

struct EngineSession {
    mode: ListenMode,
    config: SessionTuning,
    model_path: String,
    engine: Arc<Mutex<Option<ParakeetEngine>>>,
    control: Arc<AtomicU8>,
    sink: EventSink,
}

impl EngineSession {
    fn control(&self) -> Control {
        match self.control.load(Ordering::SeqCst) {
            0 => Control::Run,
            1 => Control::Stop,
            _ => Control::Abort,
        }
    }

    fn run(self) {
        if let Err(e) = self.ensure_model() {
            tracing::error!("Failed to load speech model: {}", e);
            self.sink.error(ErrorCode::ServiceNotAllowed);
            self.sink.ended();
            return;
        }

        let (tx, rx) = flume::unbounded::<Vec<f32>>();
        let running = Arc::new(AtomicBool::new(true));
        let capture_running = Arc::clone(&running);
        let capture = std::thread::spawn(move || capture_mic(tx, capture_running));

        self.sink.started();
        let mut utterances = Utterances::new(self.config.silence_ms);
        let mut last_voice = Instant::now();

        loop {
            match self.control() {
                Control::Abort => {
                    self.sink.error(ErrorCode::Aborted);
                    break;
                }
                Control::Stop => {
                    if let Some(samples) = utterances.flush() {
                        self.transcribe(&samples);
                    }
                    break;
                }
                Control::Run => {}
            }

            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(samples) => {
                    for samples in utterances.push(&samples) {
                        self.transcribe(&samples);
                    }
                    if utterances.in_speech() {
                        last_voice = Instant::now();
                    }
                }
                Err(flume::RecvTimeoutError::Timeout) => {}
                Err(flume::RecvTimeoutError::Disconnected) => {
                    self.sink.error(ErrorCode::AudioCapture);
                    break;
                }
            }

            if !utterances.in_speech() && last_voice.elapsed() >= self.config.no_speech {
                self.sink.error(ErrorCode::NoSpeech);
                break;
            }
        }

        running.store(false, Ordering::SeqCst);
        match capture.join() {
            Ok(Err(e)) => tracing::warn!("Microphone capture failed: {}", e),
            Err(_) => tracing::warn!("Microphone capture thread panicked"),
            Ok(Ok(())) => {}
        }
        self.sink.ended();
    }

    fn ensure_model(&self) -> Result<(), String> {
        let mut engine = self.engine.lock();
        if engine.is_some() {
            return Ok(());
        }
        tracing::info!("Loading speech model from {}", self.model_path);
        let mut loaded = ParakeetEngine::new();
        loaded
            .load_model_with_params(Path::new(&self.model_path), ParakeetModelParams::int8())
            .map_err(|e| e.to_string())?;
        *engine = Some(loaded);
        Ok(())
    }

    fn transcribe(&self, samples: &[f32]) {
        let mut guard = self.engine.lock();
        let Some(engine) = guard.as_mut() else {
            return;
        };
        match engine.transcribe_samples(samples.to_vec(), None) {
            Ok(result) => {
                let text = result.text.trim();
                if text.is_empty() {
                    return;
                }
                tracing::debug!("Heard ({}): {}", self.mode, text);
                self.sink.result(text, self.config.assumed_confidence, true);
            }
            Err(e) => tracing::warn!("Transcription failed: {}", e),
        }
    }
}

fn capture_mic(
    tx: flume::Sender<Vec<f32>>,
    running: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

    let host = cpal::default_host();
    let device = host.default_input_device().ok_or("No input device")?;
    let supported = device.default_input_config()?;
    let sample_rate = u32::from(supported.sample_rate()) as usize;
    let channels = supported.channels() as usize;

    tracing::debug!("Mic: {}Hz {}ch", sample_rate, channels);

    let stream = device.build_input_stream(
        &supported.config(),
        move |data: &[f32], _| {
            let mono: Vec<f32> = if channels == 1 {
                data.to_vec()
            } else {
                data.chunks(channels)
                    .map(|c| c.iter().sum::<f32>() / channels as f32)
                    .collect()
            };
            let _ = tx.send(resample(&mono, sample_rate, TARGET_RATE));
        },
        |e| tracing::warn!("Mic error: {}", e),
        None,
    )?;
    stream.play()?;

    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(samples: usize, amplitude: f32) -> Vec<f32> {
        (0..samples)
            .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
            .collect()
    }

    #[test]
    fn test_resample_halves_length() {
        let out = resample(&tone(3200, 0.5), 32000, 16000);
        assert_eq!(out.len(), 1600);
        assert_eq!(resample(&[0.1, 0.2], 16000, 16000), vec![0.1, 0.2]);
    }

    #[test]
    fn test_utterance_closed_by_silence() {
        let mut utterances = Utterances::new(60);
        assert!(utterances.push(&tone(VAD_FRAME_SAMPLES * 4, 0.2)).is_empty());
        assert!(utterances.in_speech());

        let done = utterances.push(&vec![0.0; VAD_FRAME_SAMPLES * 2]);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].len(), VAD_FRAME_SAMPLES * 6);
        assert!(!utterances.in_speech());
    }

    #[test]
    fn test_silence_alone_yields_nothing() {
        let mut utterances = Utterances::new(500);
        assert!(utterances.push(&vec![0.001; TARGET_RATE]).is_empty());
        assert!(utterances.flush().is_none());
    }

    #[test]
    fn test_flush_keeps_long_speech_only() {
        let mut utterances = Utterances::new(500);
        utterances.push(&tone(VAD_FRAME_SAMPLES * 5, 0.2));
        assert!(utterances.flush().is_none());

        utterances.push(&tone(TARGET_RATE, 0.2));
        assert!(utterances.flush().is_some());
    }
}
