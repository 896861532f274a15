//! Typed persistence on top of a key-value store
//!
//! Three JSON blobs live under fixed keys. Reads are defensive: anything that
//! does not parse is dropped instead of raised, so a corrupted or
//! foreign-shaped blob degrades to an empty collection.

use crate::LibraryError;
use gamedex_api::{Game, GameId};
use gamedex_storage::{KeyValueStore, MemoryStore};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

/// Favorited ids, an array of integers
pub const FAVORITES_KEY: &str = "favorites";
/// Cached favorite games, an array of games
pub const FAVORITE_GAMES_KEY: &str = "favoritesGames";
/// User-created games, an array of local games
pub const CREATED_GAMES_KEY: &str = "createdGames";

/// Persistence capability shared by both stores
#[derive(Clone)]
pub struct Persistence {
    store: Arc<dyn KeyValueStore>,
}

impl Persistence {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn load_favorite_ids(&self) -> Vec<GameId> {
        let mut seen = HashSet::new();
        self.read_array(FAVORITES_KEY)
            .iter()
            .filter_map(integral_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    pub fn save_favorite_ids(&self, ids: &[GameId]) -> Result<(), LibraryError> {
        self.write(FAVORITES_KEY, &serde_json::to_string(ids)?)
    }

    pub fn load_favorite_games(&self) -> Vec<Game> {
        dedup_games(self.read_games(FAVORITE_GAMES_KEY))
    }

    pub fn save_favorite_games(&self, games: &[Game]) -> Result<(), LibraryError> {
        self.write(FAVORITE_GAMES_KEY, &serde_json::to_string(games)?)
    }

    /// Created games; anything outside the local id range is ignored
    pub fn load_created_games(&self) -> Vec<Game> {
        let games = self
            .read_games(CREATED_GAMES_KEY)
            .into_iter()
            .filter(|g| g.id.is_local())
            .collect();
        dedup_games(games)
    }

    /// Write the local subset of `games`
    pub fn save_created_games<'a>(
        &self,
        games: impl IntoIterator<Item = &'a Game>,
    ) -> Result<(), LibraryError> {
        let local: Vec<&Game> = games.into_iter().filter(|g| g.id.is_local()).collect();
        self.write(CREATED_GAMES_KEY, &serde_json::to_string(&local)?)
    }

    fn write(&self, key: &str, json: &str) -> Result<(), LibraryError> {
        self.store.set(key, json)?;
        tracing::trace!("Persisted {} ({} bytes)", key, json.len());
        Ok(())
    }

    fn read_array(&self, key: &str) -> Vec<Value> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                tracing::warn!("Ignoring {}: stored value is not an array", key);
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring {}: {}", key, e);
                Vec::new()
            }
        }
    }

    fn read_games(&self, key: &str) -> Vec<Game> {
        self.read_array(key)
            .into_iter()
            .filter_map(|item| serde_json::from_value::<Game>(item).ok())
            .collect()
    }
}

/// Accept integers and integral floats, drop everything else
fn integral_id(value: &Value) -> Option<GameId> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(raw) = number.as_i64() {
        return Some(GameId::from_raw(raw));
    }
    let float = number.as_f64()?;
    let in_range = float.is_finite()
        && float.fract() == 0.0
        && float >= i64::MIN as f64
        && float <= i64::MAX as f64;
    in_range.then(|| GameId::from_raw(float as i64))
}

fn dedup_games(games: Vec<Game>) -> Vec<Game> {
    let mut seen = HashSet::new();
    games.into_iter().filter(|g| seen.insert(g.id)).collect()
}
