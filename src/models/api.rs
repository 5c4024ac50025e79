use serde::{Deserialize, Serialize};

use super::{MediaKind, RequestOptions, ResolvedLink};
use crate::services::query::split_language_hints;

/// Query string shared by the link endpoints
#[derive(Debug, Default, Deserialize)]
pub struct LinkQuery {
    /// Comma separated language codes ("hi,ta")
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub dubbed: Option<bool>,
    #[serde(default)]
    pub strict: Option<bool>,
    /// Free-text query the user typed; language words in it count as requested languages
    #[serde(default)]
    pub q: Option<String>,
}

impl LinkQuery {
    pub fn to_options(&self) -> RequestOptions {
        let mut options = RequestOptions::default();
        if let Some(ref langs) = self.lang {
            for code in langs.split(',') {
                options.push_language(code);
            }
        }
        let mut dubbed = self.dubbed.unwrap_or(false);
        if let Some(ref q) = self.q {
            let hints = split_language_hints(q);
            for code in hints.languages {
                options.push_language(code);
            }
            dubbed |= hints.dubbed;
        }
        options.want_dubbed = dubbed;
        options.strict_language = self.strict.unwrap_or(false);
        options
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodesQuery {
    pub tmdb_id: Option<String>,
    pub season: Option<u32>,
}

/// One catalog search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub title: String,
    pub year: String,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub season_number: u32,
    pub name: String,
    pub episode_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonsResponse {
    pub title: String,
    pub seasons: Vec<SeasonSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub episode_number: u32,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinksResponse {
    pub links: Vec<ResolvedLink>,
}

#[derive(Debug, Serialize)]
pub struct EpisodeLinks {
    pub episode: u32,
    pub title: String,
    pub links: Vec<ResolvedLink>,
}

#[derive(Debug, Serialize)]
pub struct EpisodesResponse {
    pub season: u32,
    pub episodes: Vec<EpisodeLinks>,
}
