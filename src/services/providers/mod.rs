//! Provider adapters
//!
//! Every content source implements [`LinkProvider`]. Two strategies exist:
//!
//! - **Identifier-based** ([`identifier::IdentifierProvider`]): a URL is
//!   formatted from the catalog id, optionally followed by one page fetch to
//!   pull embeds out of it.
//! - **Search-based** ([`search::SearchProvider`]): query variants are
//!   submitted to a provider's search page, results are scored against the
//!   wanted title and the best landing page is scraped for embeds.
//!
//! Structured sources (the manual override table and the primary aggregation
//! API) implement the same trait so the aggregator treats them uniformly.

pub mod api;
pub mod extract;
pub mod identifier;
pub mod manual;
pub mod registry;
pub mod search;

use async_trait::async_trait;

use crate::models::{MediaIdentity, RequestOptions, ResolvedLink};
use crate::services::error::ProviderError;

pub use api::{AggregationApiConfig, AggregationApiProvider};
pub use identifier::{EmbedStrategy, IdentifierProvider, IdentifierProviderConfig};
pub use manual::ManualOverrides;
pub use registry::{build_layers, ProvidersConfig};
pub use search::{SearchProvider, SearchProviderConfig};

/// One content source able to produce links for a media identity
#[async_trait]
pub trait LinkProvider: Send + Sync {
    /// Stable provider name, used in labels, logs and metrics
    fn name(&self) -> &str;

    /// Produce links for `identity`. Errors are absorbed by the aggregator.
    async fn fetch_links(
        &self,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Result<Vec<ResolvedLink>, ProviderError>;
}
