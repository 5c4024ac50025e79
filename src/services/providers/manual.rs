//! Operator-curated links, keyed by `movie:{id}` or `tv:{id}:{season}:{episode}`

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use super::LinkProvider;
use crate::models::{MediaIdentity, RequestOptions, ResolvedLink};
use crate::services::classifier::AudioQualityClassifier;
use crate::services::error::ProviderError;
use crate::services::providers::extract::absolutize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManualEntry {
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ManualOverrides {
    entries: HashMap<String, Vec<ManualEntry>>,
}

impl ManualOverrides {
    pub fn new(entries: HashMap<String, Vec<ManualEntry>>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let entries: HashMap<String, Vec<ManualEntry>> =
            serde_json::from_str(json).context("manual links must map keys to link arrays")?;
        Ok(Self::new(entries))
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading manual links from {}", path.display()))?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl LinkProvider for ManualOverrides {
    fn name(&self) -> &str {
        "manual"
    }

    async fn fetch_links(
        &self,
        identity: &MediaIdentity,
        _options: &RequestOptions,
    ) -> Result<Vec<ResolvedLink>, ProviderError> {
        let entries = self
            .entries
            .get(&identity.override_key())
            .ok_or(ProviderError::NoCandidateMatch)?;

        Ok(entries
            .iter()
            .filter_map(|entry| {
                let url = absolutize(&entry.url, &entry.url)?;
                let lang = entry.lang.as_deref().unwrap_or_default();
                let (audio_lang, audio_label) = AudioQualityClassifier::audio_from_hint(lang);
                let quality = entry.quality.as_deref().unwrap_or_default();
                let source = entry.source.clone().unwrap_or_else(|| "Manual".to_string());
                Some(
                    ResolvedLink::embed(url, source)
                        .with_quality(AudioQualityClassifier::quality_from_hint(quality))
                        .with_release(AudioQualityClassifier::detect_release(quality))
                        .with_audio(audio_lang, audio_label),
                )
            })
            .collect())
    }
}
