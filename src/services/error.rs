//! Error taxonomy of the resolution engine.
//!
//! Provider-local errors never leave the aggregator: each one is logged and
//! turned into an empty result for that provider. Only an exhausted fallback
//! chain reaches the HTTP layer, as a "not found" response.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure, timeout or non-success status
    #[error("provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// Search produced nothing relevant; a normal outcome
    #[error("no candidate matched")]
    NoCandidateMatch,

    /// Expected page or payload structure was missing
    #[error("page structure changed: {0}")]
    ParseStructureChanged(String),

    /// Provider has no base address configured at all
    #[error("no reachable mirror for {0}")]
    NoReachableMirror(String),

    /// Provider cannot serve this kind of request (e.g. missing external id)
    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),
}

impl ProviderError {
    /// Outcomes that are expected in normal operation and logged quietly
    pub fn is_no_match(&self) -> bool {
        matches!(
            self,
            ProviderError::NoCandidateMatch | ProviderError::UnsupportedMedia(_)
        )
    }

    /// Short label for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::ProviderUnreachable(_) => "unreachable",
            ProviderError::NoCandidateMatch => "no_match",
            ProviderError::ParseStructureChanged(_) => "structure_changed",
            ProviderError::NoReachableMirror(_) => "no_mirror",
            ProviderError::UnsupportedMedia(_) => "unsupported",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::ProviderUnreachable(format!("timeout: {}", err))
        } else {
            ProviderError::ProviderUnreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::ParseStructureChanged(err.to_string())
    }
}

/// Outcome surfaced to the caller of the engine
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no links found")]
    AllLayersExhausted,
}

/// Failures of the catalog collaborator
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog API key is not configured")]
    NotConfigured,

    #[error("{0} not found in catalog")]
    NotFound(String),

    #[error("catalog request failed: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Upstream(err.to_string())
    }
}
