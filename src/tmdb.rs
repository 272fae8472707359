//! TMDB implementation of [`MetadataProvider`].
//!
//! Calls the v3 REST API with the configured language on every request.
//! There is no retry or backoff: a failed call surfaces immediately as
//! [`ProviderError::Unavailable`] and the admin decides whether to try
//! again.
//!
//! | Operation | Endpoint |
//! |-----------|----------|
//! | search movies | `GET /search/movie?query=` |
//! | search series | `GET /search/tv?query=` |
//! | movie details | `GET /movie/{id}` |
//! | series details | `GET /tv/{id}` |
//! | season details | `GET /tv/{id}/season/{n}` |

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::TmdbConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{
    Candidate, MetadataProvider, MovieDetails, MovieSummary, SeasonDetails, SeriesDetails,
    SeriesSummary,
};

#[derive(Debug, Deserialize)]
struct SearchPage<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

/// HTTP client for the TMDB API.
pub struct TmdbClient {
    http: Client,
    api_key: String,
    base_url: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig, api_key: String) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, &str)],
    ) -> ProviderResult<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!(path = %path, "TMDB request");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(extra)
            .send()
            .await
            .map_err(|e| {
                // The API key travels in the query string.
                let e = e.without_url();
                warn!(path = %path, error = %e, "TMDB request failed");
                ProviderError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(path = %path, status = %status, "TMDB returned an error");
            return Err(ProviderError::Unavailable(format!(
                "TMDB returned {}: {}",
                status, body
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ProviderError::Decode(e.without_url().to_string()))
    }
}

#[async_trait]
impl MetadataProvider for TmdbClient {
    async fn search_movies(&self, query: &str) -> ProviderResult<Vec<Candidate>> {
        let page: SearchPage<MovieSummary> =
            self.get_json("/search/movie", &[("query", query)]).await?;
        Ok(page.results.into_iter().map(Candidate::from).collect())
    }

    async fn search_series(&self, query: &str) -> ProviderResult<Vec<Candidate>> {
        let page: SearchPage<SeriesSummary> =
            self.get_json("/search/tv", &[("query", query)]).await?;
        Ok(page.results.into_iter().map(Candidate::from).collect())
    }

    async fn movie_details(&self, external_id: i64) -> ProviderResult<MovieDetails> {
        self.get_json(&format!("/movie/{}", external_id), &[]).await
    }

    async fn series_details(&self, external_id: i64) -> ProviderResult<SeriesDetails> {
        self.get_json(&format!("/tv/{}", external_id), &[]).await
    }

    async fn season_details(&self, series_id: i64, season: i32) -> ProviderResult<SeasonDetails> {
        self.get_json(&format!("/tv/{}/season/{}", series_id, season), &[])
            .await
    }
}
