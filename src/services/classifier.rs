use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{AudioLang, QualityTier, ReleaseType};
use crate::services::language::{self, DUAL_AUDIO, LANGUAGES, MULTI_AUDIO};

lazy_static! {
    // ============ RELEASE TYPES (earliest leaks first) ============
    static ref RELEASE_PATTERNS: Vec<(ReleaseType, Regex)> = vec![
        (ReleaseType::HdCam, Regex::new(r"(?i)\bhd[\s._-]?cam(?:rip)?\b").unwrap()),
        (ReleaseType::Cam, Regex::new(r"(?i)\bcam(?:rip)?\b").unwrap()),
        (ReleaseType::HdTs, Regex::new(r"(?i)\bhd[\s._-]?ts\b").unwrap()),
        (ReleaseType::Telesync, Regex::new(r"(?i)\b(?:telesync|ts)\b").unwrap()),
        (ReleaseType::HdTc, Regex::new(r"(?i)\bhd[\s._-]?tc\b").unwrap()),
        (ReleaseType::Telecine, Regex::new(r"(?i)\b(?:telecine|tc)\b").unwrap()),
        (ReleaseType::PreDvd, Regex::new(r"(?i)\bpre[\s._-]?dvd(?:rip)?\b").unwrap()),
        (ReleaseType::DvdScr, Regex::new(r"(?i)\bdvd[\s._-]?scr(?:eener)?\b").unwrap()),
        (ReleaseType::HdRip, Regex::new(r"(?i)\bhd[\s._-]?rip\b").unwrap()),
        (ReleaseType::WebRip, Regex::new(r"(?i)\bweb[\s._-]?rip\b").unwrap()),
        (ReleaseType::WebDl, Regex::new(r"(?i)\bweb[\s._-]?dl\b").unwrap()),
        (ReleaseType::BluRay, Regex::new(r"(?i)\b(?:blu[\s._-]?ray|bdrip|brrip)\b").unwrap()),
    ];

    // ============ QUALITY (best first) ============
    static ref QUALITY_PATTERNS: Vec<(QualityTier, Regex)> = vec![
        (QualityTier::Uhd2160, Regex::new(r"(?i)\b(?:2160p|4k|uhd)\b").unwrap()),
        (QualityTier::Fhd1080, Regex::new(r"(?i)\b(?:1080p|fhd)\b").unwrap()),
        (QualityTier::Hd720, Regex::new(r"(?i)\b720p\b").unwrap()),
        (QualityTier::Sd480, Regex::new(r"(?i)\b480p\b").unwrap()),
    ];
}

/// Result of classifying a page or listing text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub release_type: Option<ReleaseType>,
    pub quality_tier: QualityTier,
    pub audio_lang: AudioLang,
    pub audio_label: String,
}

/// Audio / quality / release-type detection from free text.
/// Never fails: anything unrecognised falls back to defaults.
pub struct AudioQualityClassifier;

impl AudioQualityClassifier {
    /// Classify a landing page's visible text
    pub fn classify(text: &str) -> Classification {
        let (audio_lang, audio_label) = Self::detect_audio(text);
        Classification {
            release_type: Self::detect_release(text),
            quality_tier: Self::detect_quality(text),
            audio_lang,
            audio_label,
        }
    }

    /// First release marker in priority order
    pub fn detect_release(text: &str) -> Option<ReleaseType> {
        RELEASE_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(release, _)| *release)
    }

    /// Highest resolution keyword present, else `auto`
    pub fn detect_quality(text: &str) -> QualityTier {
        QUALITY_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(text))
            .map(|(tier, _)| *tier)
            .unwrap_or_default()
    }

    /// Quality declared by a structured source; bare numbers mean lines
    /// ("1080" -> 1080p)
    pub fn quality_from_hint(hint: &str) -> QualityTier {
        let hint = hint.trim();
        if !hint.is_empty() && hint.chars().all(|c| c.is_ascii_digit()) {
            return Self::detect_quality(&format!("{}p", hint));
        }
        Self::detect_quality(hint)
    }

    /// Dual first, then multi, then each known language in table order
    pub fn detect_audio(text: &str) -> (AudioLang, String) {
        if DUAL_AUDIO.is_match(text) {
            return (AudioLang::Dual, "Dual Audio".to_string());
        }
        if MULTI_AUDIO.is_match(text) {
            return (AudioLang::Multi, "Multi Audio".to_string());
        }
        for lang in LANGUAGES.iter() {
            if lang.matches(text) {
                return (AudioLang::Language(lang.code.to_string()), lang.name.to_string());
            }
        }
        (AudioLang::Original, "Original".to_string())
    }

    /// Interpret a declared audio hint ("hi", "Hindi", "dual", ...) from a
    /// structured source. Unknown hints fall back to free-text detection.
    pub fn audio_from_hint(hint: &str) -> (AudioLang, String) {
        let hint = hint.trim();
        match hint.to_lowercase().as_str() {
            "" | "original" | "unknown" => return (AudioLang::Original, "Original".to_string()),
            "dual" => return (AudioLang::Dual, "Dual Audio".to_string()),
            "multi" => return (AudioLang::Multi, "Multi Audio".to_string()),
            _ => {}
        }
        if let Some(lang) = language::by_code(hint).or_else(|| language::by_name(hint)) {
            return (AudioLang::Language(lang.code.to_string()), lang.name.to_string());
        }
        Self::detect_audio(hint)
    }
}
