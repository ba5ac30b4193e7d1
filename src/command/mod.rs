//! Command grammar - maps free-text transcripts to playback commands
//!
//! Matching is substring containment over a lowercased, trimmed transcript:
//! 1. Custom overlay triggers (user-chosen, any language) in insertion order
//! 2. Built-in phrase table in table order, all languages at once
//!
//! Containment tolerates natural phrasing ("please play the video") at the
//! cost of false positives on compound phrases; the first hit wins.

mod phrases;

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::control::ControlAction;
use crate::locale::Language;
use phrases::BUILTIN_PHRASES;

/// Canonical command identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandId {
    Play,
    Pause,
    Stop,
    Forward10,
    Forward20,
    Forward30,
    Backward10,
    Backward20,
    Backward30,
    VolumeUp,
    VolumeDown,
    VolumeMax,
    Mute,
    Unmute,
    Speed05,
    Speed1,
    Speed125,
    Speed15,
    Speed2,
    Fullscreen,
    ExitFullscreen,
    Bookmark,
    Favorite,
}

impl CommandId {
    pub const ALL: [CommandId; 23] = [
        CommandId::Play,
        CommandId::Pause,
        CommandId::Stop,
        CommandId::Forward10,
        CommandId::Forward20,
        CommandId::Forward30,
        CommandId::Backward10,
        CommandId::Backward20,
        CommandId::Backward30,
        CommandId::VolumeUp,
        CommandId::VolumeDown,
        CommandId::VolumeMax,
        CommandId::Mute,
        CommandId::Unmute,
        CommandId::Speed05,
        CommandId::Speed1,
        CommandId::Speed125,
        CommandId::Speed15,
        CommandId::Speed2,
        CommandId::Fullscreen,
        CommandId::ExitFullscreen,
        CommandId::Bookmark,
        CommandId::Favorite,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandId::Play => "play",
            CommandId::Pause => "pause",
            CommandId::Stop => "stop",
            CommandId::Forward10 => "forward10",
            CommandId::Forward20 => "forward20",
            CommandId::Forward30 => "forward30",
            CommandId::Backward10 => "backward10",
            CommandId::Backward20 => "backward20",
            CommandId::Backward30 => "backward30",
            CommandId::VolumeUp => "volumeUp",
            CommandId::VolumeDown => "volumeDown",
            CommandId::VolumeMax => "volumeMax",
            CommandId::Mute => "mute",
            CommandId::Unmute => "unmute",
            CommandId::Speed05 => "speed05",
            CommandId::Speed1 => "speed1",
            CommandId::Speed125 => "speed125",
            CommandId::Speed15 => "speed15",
            CommandId::Speed2 => "speed2",
            CommandId::Fullscreen => "fullscreen",
            CommandId::ExitFullscreen => "exitFullscreen",
            CommandId::Bookmark => "bookmark",
            CommandId::Favorite => "favorite",
        }
    }

    /// The single control-surface operation this command performs
    pub fn action(self) -> ControlAction {
        match self {
            CommandId::Play => ControlAction::Play,
            CommandId::Pause => ControlAction::Pause,
            CommandId::Stop => ControlAction::Stop,
            CommandId::Forward10 => ControlAction::Seek(10.0),
            CommandId::Forward20 => ControlAction::Seek(20.0),
            CommandId::Forward30 => ControlAction::Seek(30.0),
            CommandId::Backward10 => ControlAction::Seek(-10.0),
            CommandId::Backward20 => ControlAction::Seek(-20.0),
            CommandId::Backward30 => ControlAction::Seek(-30.0),
            CommandId::VolumeUp => ControlAction::AdjustVolume(0.1),
            CommandId::VolumeDown => ControlAction::AdjustVolume(-0.1),
            CommandId::VolumeMax => ControlAction::SetVolume(1.0),
            CommandId::Mute => ControlAction::SetVolume(0.0),
            CommandId::Unmute => ControlAction::Unmute,
            CommandId::Speed05 => ControlAction::SetSpeed(0.5),
            CommandId::Speed1 => ControlAction::SetSpeed(1.0),
            CommandId::Speed125 => ControlAction::SetSpeed(1.25),
            CommandId::Speed15 => ControlAction::SetSpeed(1.5),
            CommandId::Speed2 => ControlAction::SetSpeed(2.0),
            CommandId::Fullscreen | CommandId::ExitFullscreen => ControlAction::ToggleFullscreen,
            CommandId::Bookmark => ControlAction::AddBookmark,
            CommandId::Favorite => ControlAction::ToggleFavorite,
        }
    }

    /// Built-in trigger phrases for one language
    pub fn phrases(self, language: Language) -> &'static [&'static str] {
        let language = language.phrase_language();
        BUILTIN_PHRASES
            .iter()
            .find(|(id, _)| *id == self)
            .and_then(|(_, rows)| rows.iter().find(|(lang, _)| *lang == language))
            .map(|(_, phrases)| *phrases)
            .unwrap_or(&[])
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // Older builds stored two-digit speed ids
        match s {
            "speed10" => return Ok(CommandId::Speed1),
            "speed20" => return Ok(CommandId::Speed2),
            _ => {}
        }
        CommandId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown command '{}'", s))
    }
}

// ============================================================================
// Custom command overlay
// ============================================================================

/// User-chosen trigger phrases, one per command, checked before the built-in
/// table. Insertion order is match priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomCommandOverlay {
    entries: Vec<(CommandId, String)>,
}

impl CustomCommandOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a trigger; rebinding an existing command keeps its position
    pub fn set(&mut self, command: CommandId, trigger: impl Into<String>) {
        let trigger = trigger.into();
        match self.entries.iter_mut().find(|(id, _)| *id == command) {
            Some(entry) => entry.1 = trigger,
            None => self.entries.push((command, trigger)),
        }
    }

    pub fn remove(&mut self, command: CommandId) -> Option<String> {
        let pos = self.entries.iter().position(|(id, _)| *id == command)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, command: CommandId) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| *id == command)
            .map(|(_, trigger)| trigger.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (CommandId, &str)> {
        self.entries.iter().map(|(id, trigger)| (*id, trigger.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose trigger is contained in the normalized transcript.
    /// Blank triggers never match.
    fn find(&self, normalized: &str) -> Option<CommandId> {
        self.entries.iter().find_map(|(id, trigger)| {
            let trigger = trigger.trim().to_lowercase();
            (!trigger.is_empty() && normalized.contains(&trigger)).then_some(*id)
        })
    }
}

impl FromIterator<(CommandId, String)> for CustomCommandOverlay {
    fn from_iter<I: IntoIterator<Item = (CommandId, String)>>(iter: I) -> Self {
        let mut overlay = CustomCommandOverlay::new();
        for (id, trigger) in iter {
            overlay.set(id, trigger);
        }
        overlay
    }
}

// Persisted as a JSON object `{ "play": "go", ... }` in insertion order

impl Serialize for CustomCommandOverlay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, trigger) in &self.entries {
            map.serialize_entry(id.as_str(), trigger)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CustomCommandOverlay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OverlayVisitor;

        impl<'de> Visitor<'de> for OverlayVisitor {
            type Value = CustomCommandOverlay;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of command ids to trigger phrases")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut overlay = CustomCommandOverlay::new();
                while let Some((key, trigger)) = access.next_entry::<String, String>()? {
                    match key.parse::<CommandId>() {
                        Ok(id) => overlay.set(id, trigger),
                        Err(e) => tracing::warn!("Skipping stored custom command: {}", e),
                    }
                }
                Ok(overlay)
            }
        }

        deserializer.deserialize_map(OverlayVisitor)
    }
}

// ============================================================================
// Grammar
// ============================================================================

/// Where a match came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Custom,
    Builtin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandMatch {
    pub command: CommandId,
    pub source: MatchSource,
}

/// Command grammar - overlay first, then the built-in phrase table
#[derive(Debug, Clone)]
pub struct CommandGrammar {
    overlay: CustomCommandOverlay,
    builtin_enabled: bool,
}

impl Default for CommandGrammar {
    fn default() -> Self {
        Self::new(CustomCommandOverlay::new())
    }
}

impl CommandGrammar {
    pub fn new(overlay: CustomCommandOverlay) -> Self {
        Self {
            overlay,
            builtin_enabled: true,
        }
    }

    pub fn with_builtin(mut self, enabled: bool) -> Self {
        self.builtin_enabled = enabled;
        self
    }

    pub fn overlay(&self) -> &CustomCommandOverlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut CustomCommandOverlay {
        &mut self.overlay
    }

    /// Match a transcript; `None` means "unrecognized", not an error
    pub fn matches(&self, transcript: &str) -> Option<CommandMatch> {
        let normalized = normalize(transcript);
        if normalized.is_empty() {
            return None;
        }

        if let Some(command) = self.overlay.find(&normalized) {
            return Some(CommandMatch {
                command,
                source: MatchSource::Custom,
            });
        }

        if !self.builtin_enabled {
            return None;
        }

        builtin_match(&normalized).map(|command| CommandMatch {
            command,
            source: MatchSource::Builtin,
        })
    }

    /// One line per command with its phrases in `language`, plus any custom trigger
    pub fn help(&self, language: Language) -> String {
        let mut out = String::new();
        for id in CommandId::ALL {
            let phrases = id.phrases(language).join(" / ");
            out.push_str(&format!("  {:<16} {}", id.as_str(), phrases));
            if let Some(trigger) = self.overlay.get(id) {
                out.push_str(&format!("  [custom: \"{}\"]", trigger));
            }
            out.push('\n');
        }
        out
    }
}

/// Match `transcript` against `overlay` and the built-in table
pub fn match_command(transcript: &str, overlay: &CustomCommandOverlay) -> Option<CommandId> {
    let normalized = normalize(transcript);
    if normalized.is_empty() {
        return None;
    }
    overlay
        .find(&normalized)
        .or_else(|| builtin_match(&normalized))
}

fn normalize(transcript: &str) -> String {
    transcript.trim().to_lowercase()
}

fn builtin_match(normalized: &str) -> Option<CommandId> {
    BUILTIN_PHRASES.iter().find_map(|(id, rows)| {
        rows.iter()
            .flat_map(|(_, phrases)| phrases.iter())
            .any(|phrase| normalized.contains(phrase))
            .then_some(*id)
    })
}
