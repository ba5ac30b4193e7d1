//! UI language codes and the speech-recognition locale each one maps to.

use std::fmt;
use std::str::FromStr;

/// Languages the player UI can run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    ZhTw,
    ZhCn,
    Es,
    Pt,
    PtBr,
    De,
    Fr,
    Ru,
    Ar,
    Ja,
    Ko,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::En,
        Language::ZhTw,
        Language::ZhCn,
        Language::Es,
        Language::Pt,
        Language::PtBr,
        Language::De,
        Language::Fr,
        Language::Ru,
        Language::Ar,
        Language::Ja,
        Language::Ko,
    ];

    /// Parse a UI language code, falling back to English for anything unknown
    pub fn from_code(code: &str) -> Self {
        code.parse().unwrap_or_default()
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::ZhTw => "zh-TW",
            Language::ZhCn => "zh-CN",
            Language::Es => "es",
            Language::Pt => "pt",
            Language::PtBr => "pt-BR",
            Language::De => "de",
            Language::Fr => "fr",
            Language::Ru => "ru",
            Language::Ar => "ar",
            Language::Ja => "ja",
            Language::Ko => "ko",
        }
    }

    /// Locale handed to the speech engine
    pub fn speech_locale(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::ZhTw => "zh-TW",
            Language::ZhCn => "zh-CN",
            Language::Es => "es-ES",
            Language::Pt => "pt-PT",
            Language::PtBr => "pt-BR",
            Language::De => "de-DE",
            Language::Fr => "fr-FR",
            Language::Ru => "ru-RU",
            Language::Ar => "ar-SA",
            Language::Ja => "ja-JP",
            Language::Ko => "ko-KR",
        }
    }

    /// Language whose rows in the built-in phrase table cover this one.
    /// Brazilian Portuguese shares the Portuguese phrases.
    pub fn phrase_language(self) -> Language {
        match self {
            Language::PtBr => Language::Pt,
            other => other,
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown language code '{}'", s))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
