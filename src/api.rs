//! Spotify Web API client
//!
//! Thin reqwest wrapper over the two endpoints the pipeline needs: the
//! paginated "recently played" listing and the per-artist detail lookup.
//! Both are exposed behind traits so the fetch and enrichment loops can be
//! driven by in-memory sources in tests.
//!
//! Authentication is out of scope here: a pre-authorized bearer token is
//! read from the environment variable named in the configuration.

use crate::config::ApiConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::env;

/// One page of the recently-played listing, newest first.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentlyPlayedPage {
    #[serde(default)]
    pub items: Vec<PlayHistoryItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayHistoryItem {
    pub track: TrackObject,
    /// ISO-8601 UTC with `Z` suffix.
    pub played_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
    #[serde(default)]
    pub popularity: i32,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ArtistDetail {
    #[serde(default)]
    genres: Vec<String>,
}

/// Paginated play-history retrieval, walking backward in time via the
/// `before` cursor (milliseconds since epoch).
#[async_trait]
pub trait PlayHistorySource {
    async fn recently_played(&self, limit: u32, before: Option<i64>)
        -> Result<RecentlyPlayedPage>;
}

/// Artist genre lookup. Callers treat failures as "no genres"; the trait
/// itself surfaces them so that policy stays in one place (the enricher).
#[async_trait]
pub trait GenreSource {
    async fn artist_genres(&self, artist_id: &str) -> Result<Vec<String>>;
}

pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl SpotifyClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Build a client from the configured base URL and token environment
    /// variable.
    pub fn from_env(config: &ApiConfig) -> Result<Self> {
        let token = env::var(&config.token_env).with_context(|| {
            format!(
                "missing access token: set the {} environment variable",
                config.token_env
            )
        })?;
        Ok(Self::new(config.base_url.clone(), token))
    }
}

#[async_trait]
impl PlayHistorySource for SpotifyClient {
    async fn recently_played(
        &self,
        limit: u32,
        before: Option<i64>,
    ) -> Result<RecentlyPlayedPage> {
        let url = format!("{}/me/player/recently-played", self.base_url);
        let mut request = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("limit", limit.to_string())]);
        if let Some(before) = before {
            request = request.query(&[("before", before.to_string())]);
        }

        let response = request
            .send()
            .await
            .context("recently-played request failed")?
            .error_for_status()
            .context("recently-played returned an error status")?;

        response
            .json()
            .await
            .context("failed to decode recently-played page")
    }
}

#[async_trait]
impl GenreSource for SpotifyClient {
    async fn artist_genres(&self, artist_id: &str) -> Result<Vec<String>> {
        let url = format!("{}/artists/{}", self.base_url, artist_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("artist request failed")?
            .error_for_status()
            .context("artist lookup returned an error status")?;

        let detail: ArtistDetail = response
            .json()
            .await
            .context("failed to decode artist detail")?;
        Ok(detail.genres)
    }
}
