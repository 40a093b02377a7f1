use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::models::{Movie, MovieListPage};

const REGION: &str = "CA";
const LANGUAGE: &str = "en-US";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TMDB access key is not configured")]
    MissingAccessKey,
    #[error("TMDB access key is not a valid header value")]
    InvalidAccessKey,
    #[error("Failed to build TMDB HTTP client")]
    Client(#[source] reqwest::Error),
    #[error("Failed to fetch {listing} movies")]
    Fetch {
        listing: Listing,
        #[source]
        source: anyhow::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listing {
    NowPlaying,
    Popular,
}

impl Listing {
    fn path(&self) -> &'static str {
        match self {
            Listing::NowPlaying => "movie/now_playing",
            Listing::Popular => "movie/popular",
        }
    }
}

impl fmt::Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Listing::NowPlaying => f.write_str("now playing"),
            Listing::Popular => f.write_str("popular"),
        }
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_now_playing(&self) -> Result<MovieListPage, CatalogError>;
    async fn fetch_popular(&self) -> Result<MovieListPage, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_base: String,
}

impl TmdbClient {
    pub fn new(
        access_key: Option<&str>,
        api_base: &str,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let key = access_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(CatalogError::MissingAccessKey)?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {key}"))
            .map_err(|_| CatalogError::InvalidAccessKey)?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let user_agent = format!("nowplaying/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(CatalogError::Client)?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        Self::new(
            config.access_key.as_deref(),
            &config.api_base,
            config.timeout,
        )
    }

    pub async fn fetch_listing(&self, listing: Listing) -> Result<MovieListPage, CatalogError> {
        let page = self
            .get_page(listing)
            .await
            .map_err(|source| CatalogError::Fetch { listing, source })?;
        info!(
            "Fetched {} movies: page {} of {}, {} results",
            listing,
            page.page,
            page.total_pages,
            page.results.len()
        );
        Ok(page)
    }

    async fn get_page(&self, listing: Listing) -> anyhow::Result<MovieListPage> {
        let url = format!("{}/{}", self.api_base, listing.path());
        debug!("GET {}", url);
        let res = self
            .client
            .get(&url)
            .query(&[("region", REGION), ("language", LANGUAGE)])
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res
            .text()
            .await
            .context("reading body failed")?;
        if !status.is_success() {
            anyhow::bail!("{} -> {}: {}", url, status, text);
        }
        decode_page(&text)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn fetch_now_playing(&self) -> Result<MovieListPage, CatalogError> {
        self.fetch_listing(Listing::NowPlaying).await
    }

    async fn fetch_popular(&self) -> Result<MovieListPage, CatalogError> {
        self.fetch_listing(Listing::Popular).await
    }
}

// Empty and `null` bodies fail like malformed JSON.
pub fn decode_page(body: &str) -> anyhow::Result<MovieListPage> {
    if body.trim().is_empty() {
        anyhow::bail!("empty response body");
    }
    let wire: Option<WirePage> = serde_json::from_str(body).context("JSON parse failed")?;
    let wire = wire.ok_or_else(|| anyhow::anyhow!("null response body"))?;
    Ok(wire.into())
}

// TMDB wire format (snake_case). Converted into `Movie` field by field.
#[derive(Debug, Deserialize)]
struct WirePage {
    page: i32,
    #[serde(default)]
    results: Vec<WireMovie>,
    total_pages: i32,
    total_results: i32,
}

#[derive(Debug, Deserialize)]
struct WireMovie {
    id: i32,
    #[serde(default)]
    adult: bool,
    backdrop_path: Option<String>,
    #[serde(default)]
    genre_ids: Vec<i32>,
    original_language: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    #[serde(default)]
    popularity: f32,
    poster_path: Option<String>,
    release_date: Option<String>,
    title: Option<String>,
    #[serde(default)]
    video: bool,
    #[serde(default)]
    vote_average: f32,
    #[serde(default)]
    vote_count: i32,
}

impl From<WireMovie> for Movie {
    fn from(w: WireMovie) -> Self {
        Movie {
            id: w.id,
            title: w.title,
            original_title: w.original_title,
            original_language: w.original_language,
            overview: w.overview,
            poster_path: w.poster_path,
            backdrop_path: w.backdrop_path,
            release_date: w.release_date,
            genre_ids: w.genre_ids,
            popularity: w.popularity,
            vote_average: w.vote_average,
            vote_count: w.vote_count,
            adult: w.adult,
            video: w.video,
        }
    }
}

impl From<WirePage> for MovieListPage {
    fn from(w: WirePage) -> Self {
        MovieListPage {
            page: w.page,
            results: w
                .results
                .into_iter()
                .map(|m| Movie::from(m).with_display_poster())
                .collect(),
            total_pages: w.total_pages,
            total_results: w.total_results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PLACEHOLDER_POSTER, POSTER_BASE};

    const SAMPLE: &str = r#"{
        "page": 1,
        "results": [
            {
                "adult": false,
                "backdrop_path": "/back.jpg",
                "genre_ids": [28, 12],
                "id": 550,
                "original_language": "en",
                "original_title": "Fight Club",
                "overview": "An insomniac office worker...",
                "popularity": 61.4,
                "poster_path": "/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg",
                "release_date": "1999-10-15",
                "title": "Fight Club",
                "video": false,
                "vote_average": 8.4,
                "vote_count": 26280
            },
            { "id": 551, "title": "No Poster", "poster_path": null },
            { "id": 552, "title": "Empty Poster", "poster_path": "" }
        ],
        "total_pages": 3,
        "total_results": 55
    }"#;

    #[test]
    fn decodes_snake_case_fields() {
        let page = decode_page(SAMPLE).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_results, 55);
        let first = &page.results[0];
        assert_eq!(first.id, 550);
        assert_eq!(first.original_title.as_deref(), Some("Fight Club"));
        assert_eq!(first.original_language.as_deref(), Some("en"));
        assert_eq!(first.backdrop_path.as_deref(), Some("/back.jpg"));
        assert_eq!(first.release_date.as_deref(), Some("1999-10-15"));
        assert_eq!(first.genre_ids, vec![28, 12]);
        assert_eq!(first.vote_count, 26280);
        assert!((first.vote_average - 8.4).abs() < f32::EPSILON);
    }

    #[test]
    fn every_result_has_a_display_poster() {
        let page = decode_page(SAMPLE).unwrap();
        assert_eq!(
            page.results[0].poster_path.as_deref(),
            Some("https://image.tmdb.org/t/p/w500/pB8BM7pdSp6B6Ih7QZ4DrQ3PmJK.jpg")
        );
        assert_eq!(page.results[1].poster_path.as_deref(), Some(PLACEHOLDER_POSTER));
        assert_eq!(page.results[2].poster_path.as_deref(), Some(PLACEHOLDER_POSTER));
        for movie in &page.results {
            let poster = movie.poster_path.as_deref().unwrap_or_default();
            assert!(poster == PLACEHOLDER_POSTER || poster.starts_with(POSTER_BASE));
        }
    }

    #[test]
    fn empty_and_null_bodies_are_errors() {
        assert!(decode_page("").is_err());
        assert!(decode_page("   ").is_err());
        assert!(decode_page("null").is_err());
        assert!(decode_page("{\"page\": 1}").is_err());
        assert!(decode_page("<html>").is_err());
    }

    #[test]
    fn missing_key_fails_construction() {
        let none = TmdbClient::new(None, "http://127.0.0.1:1", Duration::from_secs(1));
        let empty = TmdbClient::new(Some(""), "http://127.0.0.1:1", Duration::from_secs(1));
        let blank = TmdbClient::new(Some("   "), "http://127.0.0.1:1", Duration::from_secs(1));
        assert!(matches!(none, Err(CatalogError::MissingAccessKey)));
        assert!(matches!(empty, Err(CatalogError::MissingAccessKey)));
        assert!(matches!(blank, Err(CatalogError::MissingAccessKey)));
    }

    #[test]
    fn control_characters_in_key_are_rejected() {
        let res = TmdbClient::new(Some("bad\nkey"), "http://127.0.0.1:1", Duration::from_secs(1));
        assert!(matches!(res, Err(CatalogError::InvalidAccessKey)));
    }

    #[test]
    fn from_config_uses_configured_key() {
        let config = Config {
            access_key: Some("token".to_string()),
            ..Config::default()
        };
        assert!(TmdbClient::from_config(&config).is_ok());
        assert!(matches!(
            TmdbClient::from_config(&Config::default()),
            Err(CatalogError::MissingAccessKey)
        ));
    }

    #[test]
    fn fetch_error_message_names_listing() {
        let err = CatalogError::Fetch {
            listing: Listing::NowPlaying,
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.to_string(), "Failed to fetch now playing movies");
        let err = CatalogError::Fetch {
            listing: Listing::Popular,
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(err.to_string(), "Failed to fetch popular movies");
    }
}
