//! Mock catalog for testing without a live server
//!
//! [`MockCatalog`] serves games from memory and records every request that
//! would have reached the network, so tests can assert exactly which ids
//! were fetched.
//!
//! # Usage
//!
//! ```
//! use gamedex_api::mock::MockCatalog;
//! use gamedex_api::GameId;
//!
//! // 45 remote games, served 20 per page
//! let catalog = MockCatalog::with_remote_games(45, 20);
//! catalog.fail_game(GameId::Remote(7));
//! assert_eq!(catalog.call_count(), 0);
//! ```

use crate::model::{Game, GameId, GamePage, NamedRef};
use crate::{ApiError, CatalogApi, require_remote};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard};
use std::task::{Context, Poll};

/// A request the mock received
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Games { page: u32 },
    Game(GameId),
    Screenshots(GameId),
    Genres,
    Platforms,
}

#[derive(Debug, Default)]
struct MockState {
    games: Vec<Game>,
    screenshots: HashMap<GameId, Vec<String>>,
    failing_ids: HashSet<GameId>,
    fail_pages: bool,
    total_override: Option<u64>,
    game_pause: usize,
    calls: Vec<MockCall>,
}

/// In-memory [`CatalogApi`]
#[derive(Debug)]
pub struct MockCatalog {
    page_size: u32,
    state: Mutex<MockState>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new(20)
    }
}

impl MockCatalog {
    /// Empty catalog with the given page size
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Catalog holding games `1..=count` named `Game {id}`
    pub fn with_remote_games(count: u64, page_size: u32) -> Self {
        let catalog = Self::new(page_size);
        for id in 1..=count {
            catalog.add_game(Game::new(GameId::Remote(id), format!("Game {}", id)));
        }
        catalog
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a game to the catalog
    pub fn add_game(&self, game: Game) {
        self.state().games.push(game);
    }

    /// Make every request for `id` answer 404
    pub fn fail_game(&self, id: GameId) {
        self.state().failing_ids.insert(id);
    }

    /// Make page requests answer 500
    pub fn set_fail_pages(&self, fail: bool) {
        self.state().fail_pages = fail;
    }

    /// Report a different total than the number of stored games
    pub fn set_total(&self, total: u64) {
        self.state().total_override = Some(total);
    }

    pub fn set_screenshots(&self, id: GameId, images: Vec<String>) {
        self.state().screenshots.insert(id, images);
    }

    /// Make each later `fetch_game` return `Pending` for `polls` polls after
    /// recording the call, so several requests can be in flight at once
    pub fn pause_game_fetches(&self, polls: usize) {
        self.state().game_pause = polls;
    }

    /// Every request received so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Ids requested through `fetch_game`, in order
    pub fn game_calls(&self) -> Vec<GameId> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Game(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn not_found(id: GameId) -> ApiError {
        ApiError::Api {
            status: 404,
            message: format!(r#"{{"detail":"Not found.","id":{}}}"#, id),
        }
    }
}

impl CatalogApi for MockCatalog {
    async fn fetch_games(&self, page: u32) -> Result<GamePage, ApiError> {
        let mut state = self.state();
        state.calls.push(MockCall::Games { page });

        if state.fail_pages {
            return Err(ApiError::Api {
                status: 500,
                message: "Internal Server Error".into(),
            });
        }

        let size = self.page_size as usize;
        let start = (page.max(1) as usize - 1) * size;
        let results = state.games.iter().skip(start).take(size).cloned().collect();
        let count = state
            .total_override
            .unwrap_or(state.games.len() as u64);

        Ok(GamePage { results, count })
    }

    async fn fetch_game(&self, id: GameId) -> Result<Game, ApiError> {
        require_remote(id)?;
        let polls = {
            let mut state = self.state();
            state.calls.push(MockCall::Game(id));
            state.game_pause
        };
        pause(polls).await;

        let state = self.state();
        if state.failing_ids.contains(&id) {
            return Err(Self::not_found(id));
        }

        state
            .games
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn fetch_screenshots(&self, id: GameId) -> Result<Vec<String>, ApiError> {
        require_remote(id)?;
        let mut state = self.state();
        state.calls.push(MockCall::Screenshots(id));

        if state.failing_ids.contains(&id) {
            return Err(Self::not_found(id));
        }

        Ok(state.screenshots.get(&id).cloned().unwrap_or_default())
    }

    async fn fetch_genres(&self) -> Result<Vec<NamedRef>, ApiError> {
        self.state().calls.push(MockCall::Genres);
        Ok(vec![
            NamedRef {
                id: 4,
                name: "Action".into(),
                slug: Some("action".into()),
            },
            NamedRef {
                id: 51,
                name: "Indie".into(),
                slug: Some("indie".into()),
            },
        ])
    }

    async fn fetch_platforms(&self) -> Result<Vec<NamedRef>, ApiError> {
        self.state().calls.push(MockCall::Platforms);
        Ok(vec![NamedRef {
            id: 1,
            name: "PC".into(),
            slug: Some("pc".into()),
        }])
    }
}

/// Future that returns `Pending` a fixed number of times, waking itself
/// each time
#[derive(Debug)]
pub struct Pause {
    remaining: usize,
}

/// Yield to the executor `polls` times before completing
pub fn pause(polls: usize) -> Pause {
    Pause { remaining: polls }
}

impl Future for Pause {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.remaining == 0 {
            return Poll::Ready(());
        }
        self.remaining -= 1;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
