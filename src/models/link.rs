use serde::{Serialize, Serializer};

/// Resolution tier, declared from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum QualityTier {
    #[serde(rename = "2160p")]
    Uhd2160,
    #[serde(rename = "1080p")]
    Fhd1080,
    #[serde(rename = "720p")]
    Hd720,
    #[serde(rename = "480p")]
    Sd480,
    #[serde(rename = "auto")]
    Auto,
}

impl Default for QualityTier {
    fn default() -> Self {
        Self::Auto
    }
}

/// Provenance class of a capture.
/// Declaration order is the detection priority: earliest leaks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReleaseType {
    #[serde(rename = "HDCAM")]
    HdCam,
    #[serde(rename = "CAM")]
    Cam,
    #[serde(rename = "HDTS")]
    HdTs,
    #[serde(rename = "TS")]
    Telesync,
    #[serde(rename = "HDTC")]
    HdTc,
    #[serde(rename = "TC")]
    Telecine,
    #[serde(rename = "PreDVD")]
    PreDvd,
    #[serde(rename = "DVDScr")]
    DvdScr,
    #[serde(rename = "HDRip")]
    HdRip,
    #[serde(rename = "WEBRip")]
    WebRip,
    #[serde(rename = "WEB-DL")]
    WebDl,
    #[serde(rename = "BluRay")]
    BluRay,
}

impl ReleaseType {
    /// Theatre captures and screeners rank below everything else
    pub fn is_low_quality(&self) -> bool {
        matches!(
            self,
            ReleaseType::HdCam
                | ReleaseType::Cam
                | ReleaseType::HdTs
                | ReleaseType::Telesync
                | ReleaseType::HdTc
                | ReleaseType::Telecine
                | ReleaseType::PreDvd
                | ReleaseType::DvdScr
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkKind {
    Embed,
    DirectStream,
}

/// Audio track classification of a link
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AudioLang {
    /// A single dubbed/spoken language, by code ("hi", "ta", ...)
    Language(String),
    Dual,
    Multi,
    Original,
}

impl AudioLang {
    pub fn as_str(&self) -> &str {
        match self {
            AudioLang::Language(code) => code,
            AudioLang::Dual => "dual",
            AudioLang::Multi => "multi",
            AudioLang::Original => "original",
        }
    }

    /// Whether this track satisfies a request for any of `languages`
    pub fn satisfies(&self, languages: &[String]) -> bool {
        match self {
            AudioLang::Dual | AudioLang::Multi => true,
            AudioLang::Language(code) => languages.iter().any(|l| l == code),
            AudioLang::Original => false,
        }
    }
}

impl Default for AudioLang {
    fn default() -> Self {
        Self::Original
    }
}

impl Serialize for AudioLang {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Unscored search result; lives only inside one search call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub display_text: String,
    pub target_url: String,
    pub provider_name: String,
}

/// A playable link returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLink {
    pub url: String,
    #[serde(rename = "source")]
    pub source_label: String,
    #[serde(rename = "kind")]
    pub link_kind: LinkKind,
    #[serde(rename = "quality")]
    pub quality_tier: QualityTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_type: Option<ReleaseType>,
    pub audio_lang: AudioLang,
    pub audio_label: String,
    #[serde(rename = "note", skip_serializing_if = "Option::is_none")]
    pub advisory_note: Option<String>,
}

impl ResolvedLink {
    /// An embed link with no classification yet
    pub fn embed(url: impl Into<String>, source_label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source_label: source_label.into(),
            link_kind: LinkKind::Embed,
            quality_tier: QualityTier::Auto,
            release_type: None,
            audio_lang: AudioLang::Original,
            audio_label: "Original".to_string(),
            advisory_note: None,
        }
    }

    pub fn with_kind(mut self, kind: LinkKind) -> Self {
        self.link_kind = kind;
        self
    }

    pub fn with_audio(mut self, lang: AudioLang, label: impl Into<String>) -> Self {
        self.audio_lang = lang;
        self.audio_label = label.into();
        self
    }

    pub fn with_quality(mut self, tier: QualityTier) -> Self {
        self.quality_tier = tier;
        self
    }

    pub fn with_release(mut self, release: Option<ReleaseType>) -> Self {
        self.release_type = release;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_order_best_first() {
        assert!(QualityTier::Uhd2160 < QualityTier::Fhd1080);
        assert!(QualityTier::Sd480 < QualityTier::Auto);
    }

    #[test]
    fn test_audio_satisfies() {
        let wanted = vec!["hi".to_string()];
        assert!(AudioLang::Dual.satisfies(&wanted));
        assert!(AudioLang::Language("hi".into()).satisfies(&wanted));
        assert!(!AudioLang::Language("ta".into()).satisfies(&wanted));
        assert!(!AudioLang::Original.satisfies(&wanted));
    }

    #[test]
    fn test_link_serialization_shape() {
        let link = ResolvedLink::embed("https://host.example/e/1", "vidsrc - Server 1")
            .with_quality(QualityTier::Hd720)
            .with_release(Some(ReleaseType::HdCam))
            .with_audio(AudioLang::Language("hi".into()), "Hindi");
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["quality"], "720p");
        assert_eq!(json["releaseType"], "HDCAM");
        assert_eq!(json["audioLang"], "hi");
        assert_eq!(json["kind"], "embed");
        assert!(json.get("note").is_none());
    }
}
