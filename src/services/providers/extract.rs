//! HTML extraction helpers shared by the scraping adapters.
//!
//! Everything here is synchronous and returns owned data; parsed documents
//! are not `Send` and must never be held across an await.

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::Candidate;
use crate::services::error::ProviderError;

fn selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| {
        ProviderError::ParseStructureChanged(format!("bad selector {:?}: {:?}", css, e))
    })
}

/// Resolve `href` against `base`, keeping only http(s) results
pub fn absolutize(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Whether `url`'s host is one of `allowed` or a subdomain of one
pub fn host_allowed(url: &str, allowed: &[String]) -> bool {
    let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
        Some(host) => host,
        None => return false,
    };
    allowed.iter().any(|domain| {
        let domain = domain.trim().trim_start_matches("www.").to_lowercase();
        !domain.is_empty() && (host == domain || host.ends_with(&format!(".{}", domain)))
    })
}

/// Host part of a URL, for labels
pub fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
        .unwrap_or_default()
}

fn collapse_text(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse up to `limit` (display text, url) pairs from a search results page.
///
/// `result_selector` matches either the anchors themselves or containers
/// holding one; the text falls back to the anchor's `title` attribute.
pub fn parse_candidates(
    html: &str,
    page_url: &str,
    result_selector: &str,
    provider_name: &str,
    limit: usize,
) -> Result<Vec<Candidate>, ProviderError> {
    let document = Html::parse_document(html);
    let results = selector(result_selector)?;
    let anchor = selector("a[href]")?;

    let mut candidates: Vec<Candidate> = Vec::new();
    for element in document.select(&results) {
        if candidates.len() >= limit {
            break;
        }
        let link = if element.value().name() == "a" {
            element
        } else {
            match element.select(&anchor).next() {
                Some(link) => link,
                None => continue,
            }
        };

        let href = match link.value().attr("href").and_then(|h| absolutize(page_url, h)) {
            Some(href) => href,
            None => continue,
        };
        let mut text = collapse_text(&element);
        if text.is_empty() {
            text = link.value().attr("title").unwrap_or_default().trim().to_string();
        }
        if text.is_empty() || candidates.iter().any(|c| c.target_url == href) {
            continue;
        }

        candidates.push(Candidate {
            display_text: text,
            target_url: href,
            provider_name: provider_name.to_string(),
        });
    }

    Ok(candidates)
}

/// Iframe sources and outbound anchors pointing at allow-listed hosts,
/// absolute and in document order without duplicates
pub fn extract_embeds(html: &str, page_url: &str, allowed_hosts: &[String]) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut found: Vec<String> = Vec::new();

    let sources = [
        ("iframe[src]", "src"),
        ("iframe[data-src]", "data-src"),
        ("a[href]", "href"),
    ];
    for (css, attr) in sources {
        let sel = match Selector::parse(css) {
            Ok(sel) => sel,
            Err(_) => continue,
        };
        for element in document.select(&sel) {
            let Some(url) = element.value().attr(attr).and_then(|v| absolutize(page_url, v)) else {
                continue;
            };
            if host_allowed(&url, allowed_hosts) && !found.contains(&url) {
                found.push(url);
            }
        }
    }

    found
}

/// Text a visitor would read: everything except script/style content
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<String> = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element().map(|el| el.name().to_string()))
            .map(|name| matches!(name.as_str(), "script" | "style" | "noscript" | "template"))
            .unwrap_or(false);
        let trimmed = text.trim();
        if !hidden && !trimmed.is_empty() {
            parts.push(trimmed.to_string());
        }
    }

    parts.join(" ")
}

/// Server tabs of an embed page: (tab name, hash attribute value)
pub fn server_tabs(
    html: &str,
    tab_selector: &str,
    hash_attr: &str,
) -> Result<Vec<(String, String)>, ProviderError> {
    let document = Html::parse_document(html);
    let tabs = selector(tab_selector)?;

    Ok(document
        .select(&tabs)
        .filter_map(|tab| {
            let hash = tab.value().attr(hash_attr)?.trim();
            if hash.is_empty() {
                return None;
            }
            Some((collapse_text(&tab), hash.to_string()))
        })
        .collect())
}
