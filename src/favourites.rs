//! Favourite movies kept under a single storage key.
//!
//! Every mutation reads the whole list, changes it and writes the whole list
//! back. Nothing serializes concurrent callers, so two overlapping adds can
//! lose one of them (last writer wins).

use std::error::Error as _;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::Movie;
use crate::storage::KeyValueStore;

pub const FAVOURITES_KEY: &str = "favourites";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read favourites")]
    Read(#[source] anyhow::Error),
    #[error("Failed to write favourites")]
    Write(#[source] anyhow::Error),
    #[error("Stored favourites are not valid JSON")]
    Decode(#[source] serde_json::Error),
    #[error("Failed to encode favourites")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    pub fn full_message(&self) -> String {
        let mut message = self.to_string();
        let mut cause = self.source();
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = err.source();
        }
        message
    }
}

pub trait FailureReporter: Send + Sync {
    fn report(&self, operation: &'static str, error: &StoreError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, operation: &'static str, error: &StoreError) {
        warn!(operation, "Recovered from favourites failure: {}", error.full_message());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Saved,
    Unchanged,
    Failed,
}

pub struct FavouritesStore<S> {
    store: S,
    reporter: Arc<dyn FailureReporter>,
}

impl<S: KeyValueStore> FavouritesStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_reporter(store, Arc::new(TracingReporter))
    }

    pub fn with_reporter(store: S, reporter: Arc<dyn FailureReporter>) -> Self {
        Self { store, reporter }
    }

    pub fn backend(&self) -> &S {
        &self.store
    }

    // Empty when nothing is stored or the stored value cannot be read.
    pub async fn list_favourites(&self) -> Vec<Movie> {
        let result = self.try_list_favourites().await;
        self.recover("list favourites", result, Vec::new())
    }

    pub async fn save_favourites(&self, movies: &[Movie]) {
        self.persist(movies).await;
    }

    // Not an upsert: an existing entry keeps its old fields.
    pub async fn add_favourite(&self, movie: &Movie) -> Mutation {
        let mut current = self.list_favourites().await;
        if current.iter().any(|m| m.same_movie(movie)) {
            debug!("Movie {} is already a favourite", movie.id);
            return Mutation::Unchanged;
        }
        current.push(movie.clone());
        if !self.persist(&current).await {
            return Mutation::Failed;
        }
        info!("Added favourite {} '{}'", movie.id, movie.display_title());
        Mutation::Saved
    }

    pub async fn remove_favourite(&self, movie: &Movie) -> Mutation {
        let mut current = self.list_favourites().await;
        let before = current.len();
        current.retain(|m| !m.same_movie(movie));
        if current.len() == before {
            debug!("Movie {} is not a favourite", movie.id);
            return Mutation::Unchanged;
        }
        if !self.persist(&current).await {
            return Mutation::Failed;
        }
        info!("Removed favourite {}", movie.id);
        Mutation::Saved
    }

    pub async fn is_favourite(&self, movie: &Movie) -> bool {
        self.list_favourites()
            .await
            .iter()
            .any(|m| m.same_movie(movie))
    }

    pub async fn try_list_favourites(&self) -> Result<Vec<Movie>, StoreError> {
        let raw = self
            .store
            .get_item(FAVOURITES_KEY)
            .await
            .map_err(StoreError::Read)?;
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let movies: Option<Vec<Movie>> = serde_json::from_str(&raw).map_err(StoreError::Decode)?;
        Ok(movies.unwrap_or_default())
    }

    pub async fn try_save_favourites(&self, movies: &[Movie]) -> Result<(), StoreError> {
        let json = serde_json::to_string(movies).map_err(StoreError::Encode)?;
        self.store
            .set_item(FAVOURITES_KEY, &json)
            .await
            .map_err(StoreError::Write)
    }

    async fn persist(&self, movies: &[Movie]) -> bool {
        let result = self.try_save_favourites(movies).await.map(|()| true);
        self.recover("save favourites", result, false)
    }

    fn recover<T>(&self, operation: &'static str, result: Result<T, StoreError>, default: T) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.reporter.report(operation, &e);
                default
            }
        }
    }
}
