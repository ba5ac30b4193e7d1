//! Persisted voice settings
//!
//! A plain string key-value contract so the same settings can live in a JSON
//! file, in memory, or in whatever storage an embedding host provides.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::CustomCommandOverlay;
use crate::error::StoreError;

pub const CUSTOM_COMMANDS_KEY: &str = "customCommands";
pub const CONFIDENCE_THRESHOLD_KEY: &str = "voiceConfidenceThreshold";

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// ============================================================================
// Memory store
// ============================================================================

/// In-memory store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// JSON file store
// ============================================================================

/// Whole-file JSON object, rewritten on every `set`
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open `path`; a missing file starts empty
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!("Settings file {} ({} keys)", path.display(), values.len());
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&*values)?)?;
        Ok(())
    }
}

// ============================================================================
// Typed view
// ============================================================================

/// The two persisted voice settings. Anything unreadable is treated as unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceSettings {
    pub custom_commands: Option<CustomCommandOverlay>,
    pub confidence_threshold: Option<f32>,
}

impl VoiceSettings {
    pub fn load(store: &dyn SettingsStore) -> Self {
        let custom_commands = read(store, CUSTOM_COMMANDS_KEY).and_then(|raw| {
            serde_json::from_str::<CustomCommandOverlay>(&raw)
                .map_err(|e| tracing::warn!("Ignoring stored custom commands: {}", e))
                .ok()
        });
        let confidence_threshold = read(store, CONFIDENCE_THRESHOLD_KEY).and_then(|raw| {
            let parsed = parse_threshold(&raw);
            if parsed.is_none() {
                tracing::warn!("Ignoring stored confidence threshold '{}'", raw);
            }
            parsed
        });
        Self {
            custom_commands,
            confidence_threshold,
        }
    }
}

fn read(store: &dyn SettingsStore, key: &str) -> Option<String> {
    store
        .get(key)
        .map_err(|e| tracing::warn!("Failed to read {}: {}", key, e))
        .ok()
        .flatten()
}

/// Accepts only finite values in [0, 1]
pub fn parse_threshold(raw: &str) -> Option<f32> {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite() && (0.0..=1.0).contains(v))
}

pub fn save_custom_commands(
    store: &dyn SettingsStore,
    overlay: &CustomCommandOverlay,
) -> Result<(), StoreError> {
    store.set(CUSTOM_COMMANDS_KEY, &serde_json::to_string(overlay)?)
}

pub fn save_confidence_threshold(store: &dyn SettingsStore, threshold: f32) -> Result<(), StoreError> {
    if !threshold.is_finite() {
        return Err(StoreError::InvalidValue {
            key: CONFIDENCE_THRESHOLD_KEY.to_string(),
            value: threshold.to_string(),
        });
    }
    store.set(CONFIDENCE_THRESHOLD_KEY, &threshold.clamp(0.0, 1.0).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandId;

    #[test]
    fn test_threshold_parsing() {
        assert_eq!(parse_threshold("0.85"), Some(0.85));
        assert_eq!(parse_threshold(" 1 "), Some(1.0));
        assert_eq!(parse_threshold("1.5"), None);
        assert_eq!(parse_threshold("-0.1"), None);
        assert_eq!(parse_threshold("NaN"), None);
        assert_eq!(parse_threshold("high"), None);
    }

    #[test]
    fn test_malformed_values_are_unset() {
        let store = MemoryStore::new();
        store.set(CUSTOM_COMMANDS_KEY, "{not json").unwrap();
        store.set(CONFIDENCE_THRESHOLD_KEY, "2.0").unwrap();
        assert_eq!(VoiceSettings::load(&store), VoiceSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let store = MemoryStore::new();
        let overlay: CustomCommandOverlay = [
            (CommandId::Play, "go".to_string()),
            (CommandId::Pause, "hold on".to_string()),
        ]
        .into_iter()
        .collect();
        save_custom_commands(&store, &overlay).unwrap();
        save_confidence_threshold(&store, 1.4).unwrap();

        assert_eq!(
            store.get(CUSTOM_COMMANDS_KEY).unwrap().as_deref(),
            Some(r#"{"play":"go","pause":"hold on"}"#)
        );
        let settings = VoiceSettings::load(&store);
        assert_eq!(settings.custom_commands, Some(overlay));
        assert_eq!(settings.confidence_threshold, Some(1.0));
        assert!(save_confidence_threshold(&store, f32::NAN).is_err());
    }

    #[test]
    fn test_json_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get(CONFIDENCE_THRESHOLD_KEY).unwrap(), None);
        store.set(CONFIDENCE_THRESHOLD_KEY, "0.6").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get(CONFIDENCE_THRESHOLD_KEY).unwrap().as_deref(),
            Some("0.6")
        );
    }

    #[test]
    fn test_json_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(StoreError::Json(_))));
    }
}
