use serde::{Deserialize, Serialize};

/// Kind of catalog entry a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl MediaKind {
    /// Path segment used by catalog and provider URLs ("movie" / "tv")
    pub fn path_segment(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Series => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::Series => write!(f, "series"),
        }
    }
}

/// What the caller wants links for. Built once per request by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaIdentity {
    pub canonical_id: String,
    pub title: String,
    /// Four digit year, empty when the catalog has none
    pub year: String,
    pub media_kind: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// IMDb-style id, when the catalog knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl MediaIdentity {
    pub fn movie(id: impl Into<String>, title: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            canonical_id: id.into(),
            title: title.into(),
            year: year.into(),
            media_kind: MediaKind::Movie,
            season: None,
            episode: None,
            external_id: None,
        }
    }

    pub fn episode(
        id: impl Into<String>,
        title: impl Into<String>,
        year: impl Into<String>,
        season: u32,
        episode: u32,
    ) -> Self {
        Self {
            canonical_id: id.into(),
            title: title.into(),
            year: year.into(),
            media_kind: MediaKind::Series,
            season: Some(season),
            episode: Some(episode),
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, external_id: Option<String>) -> Self {
        self.external_id = external_id;
        self
    }

    /// Key used by the manual override table
    pub fn override_key(&self) -> String {
        match self.media_kind {
            MediaKind::Movie => format!("movie:{}", self.canonical_id),
            MediaKind::Series => format!(
                "tv:{}:{}:{}",
                self.canonical_id,
                self.season.unwrap_or(1),
                self.episode.unwrap_or(1)
            ),
        }
    }
}

/// Per-request preferences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Ordered, duplicate-free language codes ("hi", "ta", ...)
    pub requested_languages: Vec<String>,
    pub want_dubbed: bool,
    pub strict_language: bool,
}

impl RequestOptions {
    pub fn new(languages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut options = Self::default();
        for lang in languages {
            options.push_language(lang);
        }
        options
    }

    pub fn dubbed(mut self, want_dubbed: bool) -> Self {
        self.want_dubbed = want_dubbed;
        self
    }

    pub fn strict(mut self, strict_language: bool) -> Self {
        self.strict_language = strict_language;
        self
    }

    /// Append a language code, keeping the set ordered and unique
    pub fn push_language(&mut self, lang: impl Into<String>) {
        let lang = lang.into().trim().to_lowercase();
        if !lang.is_empty() && !self.requested_languages.contains(&lang) {
            self.requested_languages.push(lang);
        }
    }
}
