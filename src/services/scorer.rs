//! Relevance scoring of provider search results against the wanted title.
//!
//! Base score is the Jaccard similarity of the normalized token sets; year,
//! language and audio-track signals add fixed increments on top. The result
//! is clamped to `[0, 1]`. Increments are empirical and kept as-is.

use lazy_static::lazy_static;
use regex::Regex;

use crate::services::language::{self, DUAL_AUDIO, MULTI_AUDIO};
use crate::services::normalizer::normalize;

/// Score at which a search stops trying further candidates and variants
pub const HIGH_CONFIDENCE: f64 = 0.75;

const EXACT_YEAR_BONUS: f64 = 0.20;
const OTHER_YEAR_BONUS: f64 = 0.05;
const LANGUAGE_BONUS: f64 = 0.25;
const DUAL_AUDIO_BONUS: f64 = 0.20;
const MULTI_AUDIO_BONUS: f64 = 0.15;

lazy_static! {
    static ref YEAR_TOKEN: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").unwrap();
}

/// Relevance of `candidate_text` for the wanted title, in `[0, 1]`
pub fn score(
    candidate_text: &str,
    wanted_title: &str,
    wanted_year: &str,
    requested_languages: &[String],
) -> f64 {
    let candidate = normalize(candidate_text);
    let wanted = normalize(wanted_title);
    if candidate.is_empty() || wanted.is_empty() {
        return 0.0;
    }

    let intersection = candidate.intersection(&wanted).count();
    let union = candidate.union(&wanted).count();
    let mut total = intersection as f64 / union as f64;

    let wanted_year = wanted_year.trim();
    let years: Vec<&str> = YEAR_TOKEN.find_iter(candidate_text).map(|m| m.as_str()).collect();
    if !wanted_year.is_empty() && years.contains(&wanted_year) {
        total += EXACT_YEAR_BONUS;
    } else if !years.is_empty() {
        total += OTHER_YEAR_BONUS;
    }

    for code in requested_languages {
        if let Some(lang) = language::by_code(code) {
            if lang.matches(candidate_text) {
                total += LANGUAGE_BONUS;
            }
        }
    }

    if DUAL_AUDIO.is_match(candidate_text) {
        total += DUAL_AUDIO_BONUS;
    }
    if MULTI_AUDIO.is_match(candidate_text) {
        total += MULTI_AUDIO_BONUS;
    }

    total.min(1.0)
}
