//! Spoken-language patterns shared by the scorer, the classifier and the query builder.
//!
//! Each language matches both its romanized name and its native script, since
//! provider listings mix the two freely ("Hindi Dubbed", "हिंदी डब").

use lazy_static::lazy_static;
use regex::Regex;

/// A language the engine can detect in free text
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub pattern: Regex,
}

impl Language {
    fn new(code: &'static str, name: &'static str, pattern: &str) -> Self {
        Self {
            code,
            name,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

lazy_static! {
    /// Fixed iteration order: classification takes the first hit
    pub static ref LANGUAGES: Vec<Language> = vec![
        Language::new("hi", "Hindi", r"(?i)\bhindi\b|हिंदी|हिन्दी"),
        Language::new("ta", "Tamil", r"(?i)\btamil\b|தமிழ்"),
        Language::new("te", "Telugu", r"(?i)\btelugu\b|తెలుగు"),
        Language::new("ml", "Malayalam", r"(?i)\bmalayalam\b|മലയാളം"),
        Language::new("kn", "Kannada", r"(?i)\bkannada\b|ಕನ್ನಡ"),
        Language::new("bn", "Bengali", r"(?i)\b(bengali|bangla)\b|বাংলা"),
        Language::new("mr", "Marathi", r"(?i)\bmarathi\b|मराठी"),
        Language::new("pa", "Punjabi", r"(?i)\bpunjabi\b|ਪੰਜਾਬੀ"),
        Language::new("en", "English", r"(?i)\benglish\b"),
    ];

    pub static ref DUAL_AUDIO: Regex = Regex::new(r"(?i)\bdual(?:[\s._-]?audio)?\b").unwrap();
    pub static ref MULTI_AUDIO: Regex = Regex::new(r"(?i)\bmulti(?:[\s._-]?audio)?\b").unwrap();
}

/// Look a language up by its code (case-insensitive)
pub fn by_code(code: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

/// Look a language up by its English name (case-insensitive)
pub fn by_name(name: &str) -> Option<&'static Language> {
    LANGUAGES.iter().find(|l| l.name.eq_ignore_ascii_case(name))
}

/// Human-readable name for a code, falling back to the code itself
pub fn display_name(code: &str) -> String {
    by_code(code)
        .map(|l| l.name.to_string())
        .unwrap_or_else(|| code.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_and_romanized_forms() {
        let hindi = by_code("hi").unwrap();
        assert!(hindi.matches("Pathaan 2023 Hindi 720p"));
        assert!(hindi.matches("पठान हिंदी"));
        assert!(!hindi.matches("Pathaan 2023 Tamil"));

        let tamil = by_code("TA").unwrap();
        assert!(tamil.matches("Jailer (தமிழ்)"));
    }

    #[test]
    fn test_audio_markers() {
        assert!(DUAL_AUDIO.is_match("Dune [Dual Audio] 1080p"));
        assert!(DUAL_AUDIO.is_match("dune.dual-audio.720p"));
        assert!(MULTI_AUDIO.is_match("Oppenheimer Multi Audio"));
        assert!(!DUAL_AUDIO.is_match("individual"));
        assert!(!MULTI_AUDIO.is_match("multiverse"));
    }

    #[test]
    fn test_lookups() {
        assert_eq!(by_name("telugu").map(|l| l.code), Some("te"));
        assert_eq!(display_name("ml"), "Malayalam");
        assert_eq!(display_name("xx"), "XX");
    }
}
