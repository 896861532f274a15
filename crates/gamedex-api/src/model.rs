//! Catalog data model
//!
//! Field names follow the RAWG JSON layout so the same types serve the wire
//! format and the local persistence blobs.

use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Largest id the remote catalog hands out
pub const MAX_REMOTE_ID: i64 = 1_000_000;

/// Identifier of a game, tagged with where it came from
///
/// Serialized as a plain integer. Raw values in `(0, MAX_REMOTE_ID]` are
/// remote catalog ids; everything else was synthesized on this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum GameId {
    /// Assigned by the remote catalog, fetchable over the API
    Remote(u64),
    /// Created locally, only resolvable from local state
    Local(i64),
}

impl GameId {
    /// Classify a raw integer id
    pub fn from_raw(raw: i64) -> Self {
        if raw > 0 && raw <= MAX_REMOTE_ID {
            GameId::Remote(raw as u64)
        } else {
            GameId::Local(raw)
        }
    }

    /// The integer used on the wire and in storage
    pub fn raw(self) -> i64 {
        match self {
            GameId::Remote(id) => id as i64,
            GameId::Local(id) => id,
        }
    }

    pub fn is_local(self) -> bool {
        matches!(self, GameId::Local(_))
    }

    pub fn is_remote(self) -> bool {
        matches!(self, GameId::Remote(_))
    }
}

impl From<i64> for GameId {
    fn from(raw: i64) -> Self {
        GameId::from_raw(raw)
    }
}

impl From<GameId> for i64 {
    fn from(id: GameId) -> Self {
        id.raw()
    }
}

/// Orders by raw value. A `Remote` built outside the remote range can
/// share a raw value with a `Local`; the variant breaks the tie so the
/// ordering agrees with `Eq`.
impl Ord for GameId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.raw(), self.is_local()).cmp(&(other.raw(), other.is_local()))
    }
}

impl PartialOrd for GameId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw())
    }
}

/// An `{id, name, slug}` reference (genre, platform, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Entry of a game's `platforms` array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub platform: NamedRef,
}

/// A game in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub metacritic: Option<i32>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub platforms: Vec<PlatformEntry>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<NamedRef>,
    #[serde(default)]
    pub description_raw: Option<String>,
    /// Screenshot URLs carried by locally-created games
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshots: Option<Vec<String>>,
}

impl Game {
    /// Create a game with only an id and a title
    pub fn new(id: GameId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slug: None,
            background_image: None,
            released: None,
            rating: None,
            metacritic: None,
            platforms: Vec::new(),
            genres: Vec::new(),
            description_raw: None,
            screenshots: None,
        }
    }

    /// Platform names in catalog order
    pub fn platform_names(&self) -> Vec<&str> {
        self.platforms
            .iter()
            .map(|p| p.platform.name.as_str())
            .collect()
    }

    /// Genre names in catalog order
    pub fn genre_names(&self) -> Vec<&str> {
        self.genres.iter().map(|g| g.name.as_str()).collect()
    }
}

/// One page of `GET /games`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GamePage {
    #[serde(default)]
    pub results: Vec<Game>,
    /// Total number of games the catalog reports
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Screenshot {
    pub image: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultList<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_classification() {
        assert_eq!(GameId::from_raw(1), GameId::Remote(1));
        assert_eq!(GameId::from_raw(MAX_REMOTE_ID), GameId::Remote(1_000_000));
        assert_eq!(GameId::from_raw(MAX_REMOTE_ID + 1), GameId::Local(1_000_001));
        assert_eq!(GameId::from_raw(0), GameId::Local(0));
        assert_eq!(
            GameId::from_raw(-1_700_000_000_000),
            GameId::Local(-1_700_000_000_000)
        );
        // Bare timestamp ids are local too
        assert!(GameId::from_raw(1_700_000_000_000).is_local());
    }

    #[test]
    fn test_id_serializes_as_integer() {
        let ids = vec![GameId::Remote(5), GameId::Local(-3)];
        let json = serde_json::to_string(&ids).unwrap();
        assert_eq!(json, "[5,-3]");

        let parsed: Vec<GameId> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ids);
    }

    #[test]
    fn test_id_ordering_follows_raw_value() {
        let mut ids = vec![GameId::Remote(5), GameId::Local(-10), GameId::Local(2_000_000)];
        ids.sort();
        assert_eq!(
            ids,
            vec![GameId::Local(-10), GameId::Remote(5), GameId::Local(2_000_000)]
        );
    }

    #[test]
    fn test_id_ordering_agrees_with_eq() {
        let out_of_range = GameId::Remote(5_000_000);
        let local = GameId::from_raw(5_000_000);

        assert_ne!(out_of_range, local);
        assert_ne!(out_of_range.cmp(&local), Ordering::Equal);
        assert_eq!(local.cmp(&GameId::Local(5_000_000)), Ordering::Equal);
    }

    #[test]
    fn test_parse_rawg_game() {
        let json = r#"{
            "id": 3498,
            "slug": "grand-theft-auto-v",
            "name": "Grand Theft Auto V",
            "released": "2013-09-17",
            "background_image": "https://media.rawg.io/gta.jpg",
            "rating": 4.47,
            "metacritic": 92,
            "platforms": [{"platform": {"id": 4, "name": "PC", "slug": "pc"}, "released_at": "2013-09-17"}],
            "genres": [{"id": 4, "name": "Action", "slug": "action", "games_count": 1}],
            "tags": []
        }"#;

        let game: Game = serde_json::from_str(json).unwrap();
        assert_eq!(game.id, GameId::Remote(3498));
        assert_eq!(game.platform_names(), vec!["PC"]);
        assert_eq!(game.genre_names(), vec!["Action"]);
        assert_eq!(game.metacritic, Some(92));
        assert_eq!(game.screenshots, None);
    }

    #[test]
    fn test_parse_game_with_null_lists() {
        let json = r#"{"id": 7, "name": "Sparse", "platforms": null, "genres": null}"#;
        let game: Game = serde_json::from_str(json).unwrap();
        assert!(game.platforms.is_empty());
        assert!(game.genres.is_empty());
    }

    #[test]
    fn test_local_game_keeps_screenshots() {
        let mut game = Game::new(GameId::Local(-1), "Homebrew");
        game.screenshots = Some(vec!["file:///shot.png".into()]);

        let json = serde_json::to_string(&game).unwrap();
        let parsed: Game = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, game);
    }
}
