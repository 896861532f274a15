//! Catalog API client for Gamedex
//!
//! Talks to a RAWG-compatible game catalog: paginated game listings, single
//! games, screenshots, and the genre/platform lookup lists. Failures are
//! returned as [`ApiError`] unchanged; there is no retry logic here.

mod client;
pub mod mock;
mod model;

pub use client::{CatalogClient, error_message};
pub use model::{Game, GameId, GamePage, MAX_REMOTE_ID, NamedRef, PlatformEntry};

use std::future::Future;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid game ID: {0}")]
    InvalidArgument(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid URL: {0}")]
    Url(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Whether the server answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }
}

/// Operations the library needs from the remote catalog
///
/// The returned futures are not required to be `Send`: the library runs on a
/// single-threaded executor.
pub trait CatalogApi {
    /// Fetch one page of the catalog (1-based)
    fn fetch_games(&self, page: u32) -> impl Future<Output = Result<GamePage, ApiError>>;

    /// Fetch a single game; local ids fail with [`ApiError::InvalidArgument`]
    fn fetch_game(&self, id: GameId) -> impl Future<Output = Result<Game, ApiError>>;

    /// Fetch screenshot image URLs for a game, in server order
    fn fetch_screenshots(&self, id: GameId)
    -> impl Future<Output = Result<Vec<String>, ApiError>>;

    /// Fetch the genre list
    fn fetch_genres(&self) -> impl Future<Output = Result<Vec<NamedRef>, ApiError>>;

    /// Fetch the parent platform list
    fn fetch_platforms(&self) -> impl Future<Output = Result<Vec<NamedRef>, ApiError>>;
}

/// Validate an id before any request is made
pub fn require_remote(id: GameId) -> Result<u64, ApiError> {
    match id {
        GameId::Remote(raw) if raw > 0 && raw <= MAX_REMOTE_ID as u64 => Ok(raw),
        other => Err(ApiError::InvalidArgument(other.to_string())),
    }
}
