//! The fixed language table for generation and speech synthesis.
//!
//! One selection drives both stages: the display name is interpolated into
//! generation directives ("Summarize … in Hindi"), and the synthesis code is
//! what the speech engine expects ("hi"). Keeping both on a single enum makes
//! it impossible to generate in one language and synthesize in another.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A target language for generated content and synthesized speech.
///
/// The set is fixed and enumerable ([`Language::ALL`]) so embedding
/// applications can populate a selection control directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    /// English (default).
    #[default]
    English,
    Hindi,
    Gujarati,
    Marathi,
    Tamil,
    Telugu,
    Kannada,
    Bengali,
    Malayalam,
    Punjabi,
    Urdu,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Language; 11] = [
        Language::English,
        Language::Hindi,
        Language::Gujarati,
        Language::Marathi,
        Language::Tamil,
        Language::Telugu,
        Language::Kannada,
        Language::Bengali,
        Language::Malayalam,
        Language::Punjabi,
        Language::Urdu,
    ];

    /// Human-readable name, used in generation directives and UI controls.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Gujarati => "Gujarati",
            Language::Marathi => "Marathi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Kannada => "Kannada",
            Language::Bengali => "Bengali",
            Language::Malayalam => "Malayalam",
            Language::Punjabi => "Punjabi",
            Language::Urdu => "Urdu",
        }
    }

    /// The code the speech-synthesis engine expects for this language.
    pub fn synthesis_code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Gujarati => "gu",
            Language::Marathi => "mr",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Kannada => "kn",
            Language::Bengali => "bn",
            Language::Malayalam => "ml",
            Language::Punjabi => "pa",
            Language::Urdu => "ur",
        }
    }

    /// Look a language up by display name or synthesis code, case-insensitive.
    pub fn from_name(name: &str) -> Option<Language> {
        let needle = name.trim();
        Language::ALL.iter().copied().find(|l| {
            l.display_name().eq_ignore_ascii_case(needle)
                || l.synthesis_code().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::from_name(s).ok_or_else(|| {
            let names: Vec<&str> = Language::ALL.iter().map(|l| l.display_name()).collect();
            format!("unknown language '{}'. Supported: {}", s, names.join(", "))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_english_plus_ten_others() {
        assert_eq!(Language::ALL.len(), 11);
        assert!(Language::ALL.contains(&Language::English));
    }

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<&str> = Language::ALL.iter().map(|l| l.synthesis_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 11);
    }

    #[test]
    fn lookup_by_name_and_code() {
        assert_eq!(Language::from_name("hindi"), Some(Language::Hindi));
        assert_eq!(Language::from_name("TA"), Some(Language::Tamil));
        assert_eq!(Language::from_name(" Urdu "), Some(Language::Urdu));
        assert_eq!(Language::from_name("klingon"), None);
    }

    #[test]
    fn from_str_error_lists_languages() {
        let err = "xx".parse::<Language>().unwrap_err();
        assert!(err.contains("Bengali"));
    }
}
