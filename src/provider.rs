//! Metadata provider abstraction.
//!
//! The indexing workflow only needs two things from the outside world:
//! "search by title, ranked" and "fetch details by id". [`MetadataProvider`]
//! is that seam; [`TmdbClient`](crate::tmdb::TmdbClient) is the production
//! implementation.
//!
//! Every call returns a [`ProviderResult`] so callers can tell a record
//! that does not exist ([`ProviderError::NotFound`](crate::error::ProviderError::NotFound))
//! from a provider that could not be reached
//! ([`ProviderError::Unavailable`](crate::error::ProviderError::Unavailable)).
//! An empty search result is `Ok(vec![])`.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ProviderResult;
use crate::models::MediaKind;

/// One ranked search hit, movie or series.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub kind: MediaKind,
    pub external_id: i64,
    pub title: String,
    /// Release date (`YYYY-MM-DD`) for movies, first air date for series.
    pub date: Option<String>,
}

impl Candidate {
    /// `"Title (2009)"`, or `"Title (N/A)"` when the date is unknown.
    pub fn label(&self) -> String {
        format!("{} ({})", self.title, year_label(self.date.as_deref()))
    }
}

/// First four characters of a non-empty date, else `N/A`.
pub fn year_label(date: Option<&str>) -> String {
    match date.filter(|d| !d.is_empty()) {
        Some(d) => d.chars().take(4).collect(),
        None => "N/A".to_string(),
    }
}

/// Year of a non-empty date as a number, if it parses.
pub fn year_of(date: Option<&str>) -> Option<i32> {
    let prefix: String = date?.chars().take(4).collect();
    prefix.parse().ok()
}

/// Movie search hit as returned by `/search/movie`.
#[derive(Debug, Clone, Deserialize)]
pub struct MovieSummary {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
}

impl From<MovieSummary> for Candidate {
    fn from(m: MovieSummary) -> Self {
        Candidate {
            kind: MediaKind::Movie,
            external_id: m.id,
            title: m.title.unwrap_or_else(|| "Unknown".to_string()),
            date: m.release_date,
        }
    }
}

/// Series search hit as returned by `/search/tv`.
#[derive(Debug, Clone, Deserialize)]
pub struct SeriesSummary {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

impl From<SeriesSummary> for Candidate {
    fn from(s: SeriesSummary) -> Self {
        Candidate {
            kind: MediaKind::Series,
            external_id: s.id,
            title: s.name.unwrap_or_else(|| "Unknown".to_string()),
            date: s.first_air_date,
        }
    }
}

/// `/movie/{id}` payload. Fields the captions don't use are ignored.
///
/// `vote_average` is kept as a JSON number so it renders exactly as sent
/// (`7.0` stays `7.0`, `0` stays `0`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<serde_json::Number>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub runtime: Option<i64>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// `/tv/{id}` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesDetails {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<serde_json::Number>,
    #[serde(default)]
    pub number_of_seasons: Option<i64>,
    #[serde(default)]
    pub number_of_episodes: Option<i64>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// `/tv/{id}/season/{n}` payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonDetails {
    #[serde(default)]
    pub season_number: i32,
    #[serde(default)]
    pub episodes: Vec<SeasonEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeasonEpisode {
    pub episode_number: i32,
    #[serde(default)]
    pub name: Option<String>,
}

impl SeasonDetails {
    pub fn episode_name(&self, episode: i32) -> Option<&str> {
        self.episodes
            .iter()
            .find(|e| e.episode_number == episode)
            .and_then(|e| e.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}

/// Search and lookup against an external metadata source.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Ranked movie matches for `query`, best first.
    async fn search_movies(&self, query: &str) -> ProviderResult<Vec<Candidate>>;

    /// Ranked series matches for `query`, best first.
    async fn search_series(&self, query: &str) -> ProviderResult<Vec<Candidate>>;

    async fn movie_details(&self, external_id: i64) -> ProviderResult<MovieDetails>;

    async fn series_details(&self, external_id: i64) -> ProviderResult<SeriesDetails>;

    async fn season_details(&self, series_id: i64, season: i32) -> ProviderResult<SeasonDetails>;
}
