use lingua::{Language, LanguageDetector, LanguageDetectorBuilder};
use serde::{Deserialize, Serialize};

/// Characters inspected when guessing the language of a long text
const DETECTION_SAMPLE_CHARS: usize = 2000;

/// ISO 639-1 language codes we have a preferred voice for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageCode {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "pt")]
    Portuguese,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 6] = [
        LanguageCode::English,
        LanguageCode::Spanish,
        LanguageCode::French,
        LanguageCode::German,
        LanguageCode::Italian,
        LanguageCode::Portuguese,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageCode::English => "en",
            LanguageCode::Spanish => "es",
            LanguageCode::French => "fr",
            LanguageCode::German => "de",
            LanguageCode::Italian => "it",
            LanguageCode::Portuguese => "pt",
        }
    }

    fn to_lingua(self) -> Language {
        match self {
            LanguageCode::English => Language::English,
            LanguageCode::Spanish => Language::Spanish,
            LanguageCode::French => Language::French,
            LanguageCode::German => Language::German,
            LanguageCode::Italian => Language::Italian,
            LanguageCode::Portuguese => Language::Portuguese,
        }
    }

    /// Convert lingua Language to LanguageCode
    pub fn from_lingua(language: Language) -> Option<Self> {
        LanguageCode::ALL
            .into_iter()
            .find(|code| code.to_lingua() == language)
    }

    /// Speech API voice that suits this language
    pub fn voice(&self) -> &'static str {
        match self {
            LanguageCode::English => "alloy",
            LanguageCode::Spanish => "echo",
            LanguageCode::French => "nova",
            LanguageCode::German => "onyx",
            LanguageCode::Italian => "fable",
            LanguageCode::Portuguese => "shimmer",
        }
    }
}

impl std::fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Voices the speech API accepts
pub const SUPPORTED_VOICES: [&str; 6] = ["alloy", "echo", "fable", "onyx", "nova", "shimmer"];

pub const FALLBACK_VOICE: &str = "alloy";

/// Canonical name of `voice`, or the fallback voice when it is not supported
pub fn supported_voice(voice: &str) -> &'static str {
    let wanted = voice.trim().to_lowercase();
    match SUPPORTED_VOICES.iter().find(|v| **v == wanted) {
        Some(known) => known,
        None => {
            tracing::warn!(voice = %wanted, fallback = FALLBACK_VOICE, "Unknown voice, falling back");
            FALLBACK_VOICE
        }
    }
}

pub fn build_detector() -> LanguageDetector {
    let languages: Vec<Language> = LanguageCode::ALL.iter().map(|c| c.to_lingua()).collect();
    LanguageDetectorBuilder::from_languages(&languages).build()
}

/// Detect the language of the given text, defaulting to English
pub fn detect_language(detector: &LanguageDetector, text: &str) -> LanguageCode {
    let sample: String = text.chars().take(DETECTION_SAMPLE_CHARS).collect();
    match detector.detect_language_of(sample) {
        Some(language) => LanguageCode::from_lingua(language).unwrap_or(LanguageCode::English),
        None => {
            tracing::warn!("Could not detect language, falling back to English");
            LanguageCode::English
        }
    }
}
