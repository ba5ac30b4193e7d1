use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{CommandId, CustomCommandOverlay};
use crate::error::ConfigError;
use crate::locale::Language;
use crate::recognition::SessionConfig;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// UI language code, selects the speech locale
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            recognition: RecognitionConfig::default(),
            commands: CommandsConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn default_language() -> String {
    "en".into()
}

// ============================================================================
// Recognition Config
// ============================================================================

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    /// Scripted engine (default, needs no hardware)
    #[default]
    Simulated,
    /// Engine driven by an embedding host over a channel
    Host,
    /// Microphone + on-device model (requires the `native` feature)
    Native,
}

#[derive(Debug, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default)]
    pub backend: BackendChoice,

    /// Final transcripts below this confidence are not dispatched (0.0-1.0)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Single-shot retries after no-speech / unexpected end / network
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    #[serde(default = "default_end_retry_backoff_ms")]
    pub end_retry_backoff_ms: u64,

    #[serde(default = "default_network_backoff_ms")]
    pub network_backoff_ms: u64,

    /// Continuous mode: delay before restarting after a natural end
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// Continuous mode: rotate the engine session after this long
    #[serde(default = "default_max_session_secs")]
    pub max_session_secs: u64,

    /// Single-shot: give up after this long without a final result (0 disables)
    #[serde(default = "default_single_shot_timeout_secs")]
    pub single_shot_timeout_secs: u64,

    /// Single-shot: grace period for the engine to end after a command is heard
    #[serde(default = "default_wind_down_ms")]
    pub wind_down_ms: u64,

    #[serde(default = "default_interim_results")]
    pub interim_results: bool,

    #[serde(default)]
    pub native: NativeConfig,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::default(),
            confidence_threshold: default_confidence_threshold(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
            end_retry_backoff_ms: default_end_retry_backoff_ms(),
            network_backoff_ms: default_network_backoff_ms(),
            restart_delay_ms: default_restart_delay_ms(),
            max_session_secs: default_max_session_secs(),
            single_shot_timeout_secs: default_single_shot_timeout_secs(),
            wind_down_ms: default_wind_down_ms(),
            interim_results: default_interim_results(),
            native: NativeConfig::default(),
        }
    }
}

impl RecognitionConfig {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_retries: self.max_retries,
            no_speech_backoff: Duration::from_millis(self.retry_backoff_ms),
            end_backoff: Duration::from_millis(self.end_retry_backoff_ms),
            network_backoff: Duration::from_millis(self.network_backoff_ms),
            restart_delay: Duration::from_millis(self.restart_delay_ms),
            max_session: Duration::from_secs(self.max_session_secs),
            single_shot_timeout: (self.single_shot_timeout_secs > 0)
                .then(|| Duration::from_secs(self.single_shot_timeout_secs)),
            wind_down: Duration::from_millis(self.wind_down_ms),
        }
    }
}

fn default_confidence_threshold() -> f32 {
    DEFAULT_CONFIDENCE_THRESHOLD
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    600
}

fn default_end_retry_backoff_ms() -> u64 {
    500
}

fn default_network_backoff_ms() -> u64 {
    3000
}

fn default_restart_delay_ms() -> u64 {
    1000
}

fn default_max_session_secs() -> u64 {
    55
}

fn default_single_shot_timeout_secs() -> u64 {
    10
}

fn default_wind_down_ms() -> u64 {
    2000
}

fn default_interim_results() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct NativeConfig {
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Confidence attached to native transcripts (the model reports none)
    #[serde(default = "default_assumed_confidence")]
    pub assumed_confidence: f32,
    /// Trailing silence that closes an utterance
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u32,
    /// Report no-speech when nothing is heard for this long
    #[serde(default = "default_no_speech_secs")]
    pub no_speech_secs: u64,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            assumed_confidence: default_assumed_confidence(),
            silence_ms: default_silence_ms(),
            no_speech_secs: default_no_speech_secs(),
        }
    }
}

fn default_model_path() -> String {
    "models/parakeet-tdt-0.6b-v3-int8".into()
}

fn default_assumed_confidence() -> f32 {
    0.9
}

fn default_silence_ms() -> u32 {
    500
}

fn default_no_speech_secs() -> u64 {
    8
}

// ============================================================================
// Commands Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CommandsConfig {
    /// Enable the built-in phrase table
    #[serde(default = "default_enable_builtin")]
    pub enable_builtin: bool,

    /// Custom trigger phrases seeded into the overlay
    #[serde(default)]
    pub custom: Vec<CustomCommand>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            enable_builtin: default_enable_builtin(),
            custom: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CustomCommand {
    pub command: String,
    pub phrase: String,
}

fn default_enable_builtin() -> bool {
    true
}

impl CommandsConfig {
    /// Overlay seeded from `[[commands.custom]]`, skipping unknown command ids
    pub fn overlay(&self) -> CustomCommandOverlay {
        let mut overlay = CustomCommandOverlay::new();
        for custom in &self.custom {
            match custom.command.parse::<CommandId>() {
                Ok(id) => overlay.set(id, custom.phrase.clone()),
                Err(e) => tracing::warn!("Ignoring custom command in config: {}", e),
            }
        }
        overlay
    }
}

// ============================================================================
// Storage / Logging Config
// ============================================================================

#[derive(Debug, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON settings file; defaults to <config dir>/voxplay/settings.json
    #[serde(default)]
    pub settings_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_settings_path(&self) -> PathBuf {
        if let Some(path) = &self.settings_path {
            return path.clone();
        }
        dirs::config_dir()
            .map(|dir| dir.join("voxplay").join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("settings.json"))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults.
    /// A file that fails to load comes back as the diagnostic so the caller
    /// can report it once logging is up.
    pub fn load() -> (Self, Option<ConfigError>) {
        Self::load_or_default("config.toml")
    }

    /// A missing file is not an error; a broken one yields defaults plus the error
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        let path = path.as_ref();
        if !path.exists() {
            return (Config::default(), None);
        }
        match Self::from_path(path) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn language(&self) -> Language {
        Language::from_code(&self.language)
    }
}
