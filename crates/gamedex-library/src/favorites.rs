//! Favorites store
//!
//! The favorited id list plus a cache of the favorited games, most recently
//! toggled first. Every mutation writes both slices through to persistence
//! before returning.

use crate::Persistence;
use gamedex_api::{Game, GameId};
use std::collections::HashSet;

pub struct FavoritesStore {
    favorites: Vec<GameId>,
    favorite_games: Vec<Game>,
    persistence: Persistence,
}

impl FavoritesStore {
    /// Create a store and load the persisted favorites
    pub fn new(persistence: Persistence) -> Self {
        let mut store = Self {
            favorites: Vec::new(),
            favorite_games: Vec::new(),
            persistence,
        };
        store.load_from_storage();
        store
    }

    /// Favorited ids in the order they were added
    pub fn favorites(&self) -> &[GameId] {
        &self.favorites
    }

    /// Cached favorite games, most recently toggled first
    pub fn favorite_games(&self) -> &[Game] {
        &self.favorite_games
    }

    pub fn is_favorite(&self, id: GameId) -> bool {
        self.favorites.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Flip the favorite state of `id`. When adding, `game` (if given) goes
    /// to the front of the cache. Returns whether `id` is now a favorite.
    pub fn toggle_favorite(&mut self, id: GameId, game: Option<Game>) -> bool {
        let now_favorite = if self.is_favorite(id) {
            self.favorites.retain(|f| *f != id);
            self.favorite_games.retain(|g| g.id != id);
            false
        } else {
            self.favorites.push(id);
            if let Some(game) = game.filter(|g| g.id == id) {
                self.favorite_games.retain(|g| g.id != id);
                self.favorite_games.insert(0, game);
            }
            true
        };

        tracing::debug!("Favorite {} -> {}", id, now_favorite);
        self.persist();
        now_favorite
    }

    /// Remove `id` and its cached game together
    pub fn remove_favorite(&mut self, id: GameId) -> bool {
        let was_favorite = self.is_favorite(id);
        self.favorites.retain(|f| *f != id);
        self.favorite_games.retain(|g| g.id != id);
        self.persist();
        was_favorite
    }

    /// Replace the cache without touching the id list. Games that are not
    /// favorites, and repeated ids, are dropped.
    pub fn set_favorite_games(&mut self, games: Vec<Game>) {
        let mut seen = HashSet::new();
        self.favorite_games = games
            .into_iter()
            .filter(|g| self.favorites.contains(&g.id) && seen.insert(g.id))
            .collect();
        self.persist();
    }

    /// Re-read both slices, picking up writes made by another session
    pub fn load_from_storage(&mut self) {
        self.favorites = self.persistence.load_favorite_ids();

        let ids: HashSet<GameId> = self.favorites.iter().copied().collect();
        self.favorite_games = self
            .persistence
            .load_favorite_games()
            .into_iter()
            .filter(|g| ids.contains(&g.id))
            .collect();

        tracing::debug!(
            "Loaded {} favorites ({} cached)",
            self.favorites.len(),
            self.favorite_games.len()
        );
    }

    fn persist(&self) {
        if let Err(e) = self.persistence.save_favorite_ids(&self.favorites) {
            tracing::warn!("Failed to persist favorites: {}", e);
        }
        if let Err(e) = self.persistence.save_favorite_games(&self.favorite_games) {
            tracing::warn!("Failed to persist favorite games: {}", e);
        }
    }
}
