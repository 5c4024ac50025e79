//! Outbound HTTP for provider adapters and mirror probing.
//!
//! All provider traffic goes through the [`Fetch`] trait so adapters can be
//! exercised against in-memory pages in tests.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::services::error::ProviderError;

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
const DEFAULT_REFERER: &str = "https://www.google.com/";

/// Page and status access used by every provider
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET a page body; non-success statuses are errors
    async fn get_text(&self, url: &str, referer: Option<&str>) -> Result<String, ProviderError>;

    /// GET without following redirects and report the status code
    async fn probe(&self, url: &str) -> Result<u16, ProviderError>;
}

/// Success or redirect counts as a live mirror
pub fn is_reachable_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// reqwest-backed [`Fetch`] with a browser-like header profile
pub struct HttpFetcher {
    http: Client,
    probe_http: Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static(DEFAULT_REFERER));

        let http = Client::builder()
            .timeout(Duration::from_millis(config.provider_timeout_ms))
            .user_agent(&config.user_agent)
            .default_headers(headers.clone())
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        let probe_http = Client::builder()
            .timeout(Duration::from_millis(config.probe_timeout_ms))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { http, probe_http })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_text(&self, url: &str, referer: Option<&str>) -> Result<String, ProviderError> {
        debug!(url = url, "provider request");

        let mut request = self.http.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ProviderUnreachable(format!(
                "HTTP {} from {}",
                status.as_u16(),
                url
            )));
        }

        Ok(response.text().await?)
    }

    async fn probe(&self, url: &str) -> Result<u16, ProviderError> {
        let response = self.probe_http.get(url).send().await?;
        Ok(response.status().as_u16())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reachable_statuses() {
        assert!(is_reachable_status(200));
        assert!(is_reachable_status(301));
        assert!(is_reachable_status(302));
        assert!(!is_reachable_status(403));
        assert!(!is_reachable_status(503));
    }
}
