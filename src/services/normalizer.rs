//! Free-text title tokenizer used for relevance scoring

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Release/format noise that says nothing about which title a listing is
pub const STOP_WORDS: &[&str] = &[
    "full", "movie", "movies", "film", "download", "watch", "online", "free", "hd", "fhd", "uhd",
    "4k", "2160p", "1080p", "720p", "480p", "360p", "dual", "multi", "audio", "dubbed", "dub",
    "org", "webrip", "web", "dl", "webdl", "bluray", "brrip", "bdrip", "hdrip", "dvdrip",
    "hdcam", "camrip", "hdts", "predvd", "x264", "x265", "hevc", "10bit", "aac", "esub",
    "esubs", "mkv", "mp4", "the", "and",
];

lazy_static! {
    static ref PUNCTUATION: Regex = Regex::new(r"[^\p{L}\p{M}\p{N}\s]+").unwrap();
    static ref STOP_SET: HashSet<&'static str> = STOP_WORDS.iter().copied().collect();
}

/// Lower-case, strip punctuation and split into meaningful tokens.
/// Tokens of one character and stop words are dropped.
pub fn normalize(text: &str) -> HashSet<String> {
    let lowered = text.to_lowercase();
    let cleaned = PUNCTUATION.replace_all(&lowered, " ");

    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !STOP_SET.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        let mut v: Vec<String> = normalize(text).into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn test_strips_noise_and_punctuation() {
        assert_eq!(
            tokens("Dune: Part Two (2024) Full Movie Download 1080p WEBRip [Dual Audio]"),
            vec!["2024", "dune", "part", "two"]
        );
    }

    #[test]
    fn test_empty_and_short_tokens() {
        assert!(normalize("").is_empty());
        assert!(normalize("  a - b . c ").is_empty());
        assert_eq!(tokens("K.G.F Chapter 2"), vec!["chapter"]);
    }

    #[test]
    fn test_never_emits_stop_words_or_single_chars() {
        let samples = [
            "The Movie HD 720p x264 AAC ESub",
            "Oppenheimer.2023.1080p.WEB-DL.Multi.Audio",
            "RRR (2022) Hindi Dubbed HDRip — Watch Online Free",
            "a b c d full movie",
        ];
        for sample in samples {
            for token in normalize(sample) {
                assert!(token.chars().count() > 1, "short token {token:?} from {sample:?}");
                assert!(
                    !STOP_WORDS.contains(&token.as_str()),
                    "stop word {token:?} from {sample:?}"
                );
            }
        }
    }

    #[test]
    fn test_keeps_native_script() {
        assert_eq!(tokens("पठान (हिंदी)"), vec!["पठान", "हिंदी"]);
    }
}
