//! Search query construction for text-search providers

use crate::services::language;

/// Ordered, duplicate-free search strings for a title.
///
/// Plain "{title} {year}" and "{title}" come first. When a dub is wanted,
/// per-language "{title} {Language} Dubbed" / "{title} {year} {Language} Dubbed"
/// follow, then the generic dual/multi audio forms.
pub fn build_variants(
    title: &str,
    year: &str,
    requested_languages: &[String],
    want_dubbed: bool,
) -> Vec<String> {
    let title = collapse(title);
    if title.is_empty() {
        return Vec::new();
    }
    let year = year.trim();

    let mut variants: Vec<String> = Vec::new();
    let mut push = |v: String| {
        let v = collapse(&v);
        if !variants.contains(&v) {
            variants.push(v);
        }
    };

    push(format!("{} {}", title, year));
    push(title.clone());

    if want_dubbed {
        for code in requested_languages {
            let name = language::display_name(code);
            push(format!("{} {} Dubbed", title, name));
            push(format!("{} {} {} Dubbed", title, year, name));
        }
        push(format!("{} Dual Audio", title));
        push(format!("{} Multi Audio", title));
    }

    variants
}

/// Language words stripped from free-text queries. English and the other
/// table languages stay in the title ("Johnny English").
const LANGUAGE_KEYWORDS: &[&str] = &["hindi", "tamil", "telugu", "malayalam", "kannada", "bengali"];

/// Language intent pulled out of a free-text query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageHints {
    pub base_title: String,
    pub languages: Vec<String>,
    pub dubbed: bool,
}

/// Strip language words from a user query ("Dune hindi dubbed" -> "Dune").
/// If nothing but language words remain, the query is kept as the title.
pub fn split_language_hints(query: &str) -> LanguageHints {
    let words: Vec<&str> = query.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(words.len());
    let mut languages: Vec<String> = Vec::new();
    let mut dubbed = false;

    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        let lower = word.to_lowercase();
        let next_is_audio = words
            .get(i + 1)
            .map(|w| w.eq_ignore_ascii_case("audio"))
            .unwrap_or(false);

        if LANGUAGE_KEYWORDS.contains(&lower.as_str()) {
            if let Some(lang) = language::by_name(&lower) {
                if !languages.iter().any(|l| l == lang.code) {
                    languages.push(lang.code.to_string());
                }
            }
            dubbed = true;
        } else if lower == "dubbed" {
            dubbed = true;
        } else if lower == "dual" && next_is_audio {
            dubbed = true;
            i += 1;
        } else {
            kept.push(word);
        }
        i += 1;
    }

    let base_title = if kept.is_empty() {
        collapse(query)
    } else {
        kept.join(" ")
    };

    LanguageHints {
        base_title,
        languages,
        dubbed,
    }
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
