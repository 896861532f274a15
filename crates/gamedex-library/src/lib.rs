//! Game collection state for Gamedex
//!
//! Holds the games seen so far, the user's favorites, and locally-created
//! games, keeps them in sync with persistence, and fetches favorites that
//! are missing from the local cache while the favorites view is open.
//!
//! [`Catalog`] is the entry point; the stores underneath are usable on their
//! own for finer-grained control.

mod catalog;
mod favorites;
mod games;
mod persistence;
mod reconcile;

pub use catalog::{Catalog, GameDetails, GameDraft, View};
pub use favorites::FavoritesStore;
pub use games::{FavoritesBatch, FetchState, FetchStatus, GamesStore, fetch_remote_games};
pub use persistence::{CREATED_GAMES_KEY, FAVORITE_GAMES_KEY, FAVORITES_KEY, Persistence};
pub use reconcile::{ReconcilePlan, Reconciler, favorites_key};

use gamedex_api::{ApiError, GameId};
use gamedex_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Invalid game: {0}")]
    InvalidGame(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
