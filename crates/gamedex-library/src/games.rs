//! Games collection store
//!
//! Keeps every game seen so far (remote pages, favorites fetched by id, and
//! locally-created games) plus the page currently on display. Network calls
//! happen outside the store: `begin_*` marks a fetch pending, `finish_*`
//! applies its outcome, so the coordinator never holds the store across an
//! await.

use crate::Persistence;
use futures_util::future::join_all;
use gamedex_api::{ApiError, CatalogApi, Game, GameId, GamePage};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifecycle of one kind of fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Pending,
    Fulfilled,
    Rejected,
}

/// Status and last error of one kind of fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    pub status: FetchStatus,
    pub error: Option<String>,
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Pending
    }

    fn start(&mut self) {
        self.status = FetchStatus::Pending;
        self.error = None;
    }

    fn succeed(&mut self) {
        self.status = FetchStatus::Fulfilled;
    }

    fn fail(&mut self, message: String) {
        self.status = FetchStatus::Rejected;
        self.error = Some(message);
    }

    /// Drop a pending flag without an outcome
    fn reset(&mut self) {
        if self.status == FetchStatus::Pending {
            self.status = FetchStatus::Idle;
        }
    }
}

/// Work split out of a favorites request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoritesBatch {
    /// Games already known locally: local ids first, then cached remote ids
    pub resolved: Vec<Game>,
    /// Remote ids that need a network call
    pub to_fetch: Vec<GameId>,
}

/// Accumulated catalog state
pub struct GamesStore {
    all_games: Vec<Game>,
    current_games: Vec<Game>,
    current_page: u32,
    total: u64,
    page_fetch: FetchState,
    favorites_fetch: FetchState,
    /// Favorites batches begun and not yet finished
    favorites_batches: usize,
    persistence: Persistence,
}

impl GamesStore {
    /// Create a store seeded with the persisted created games
    pub fn new(persistence: Persistence) -> Self {
        let all_games = persistence.load_created_games();
        if !all_games.is_empty() {
            tracing::debug!("Restored {} created games", all_games.len());
        }

        Self {
            all_games,
            current_games: Vec::new(),
            current_page: 1,
            total: 0,
            page_fetch: FetchState::default(),
            favorites_fetch: FetchState::default(),
            favorites_batches: 0,
            persistence,
        }
    }

    pub fn all_games(&self) -> &[Game] {
        &self.all_games
    }

    pub fn current_games(&self) -> &[Game] {
        &self.current_games
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Total reported by the remote catalog
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn page_fetch(&self) -> &FetchState {
        &self.page_fetch
    }

    pub fn favorites_fetch(&self) -> &FetchState {
        &self.favorites_fetch
    }

    /// Number of favorites batches still running
    pub fn pending_favorites_batches(&self) -> usize {
        self.favorites_batches
    }

    pub fn game(&self, id: GameId) -> Option<&Game> {
        self.all_games.iter().find(|g| g.id == id)
    }

    pub fn contains(&self, id: GameId) -> bool {
        self.game(id).is_some()
    }

    /// Locally-created games, in collection order
    pub fn local_games(&self) -> impl Iterator<Item = &Game> {
        self.all_games.iter().filter(|g| g.id.is_local())
    }

    // --- Paginated fetch ---

    /// Fetch a catalog page and apply the outcome
    pub async fn fetch_page<A: CatalogApi>(&mut self, api: &A, page: u32) {
        self.begin_page_fetch();
        let result = api.fetch_games(page).await;
        self.finish_page_fetch(page, result);
    }

    pub fn begin_page_fetch(&mut self) {
        self.page_fetch.start();
    }

    pub fn finish_page_fetch(&mut self, page: u32, result: Result<GamePage, ApiError>) {
        match result {
            Ok(data) => self.apply_page(page, data),
            Err(e) => {
                tracing::warn!("Failed to load catalog page {}: {}", page, e);
                self.page_fetch.fail(e.to_string());
            }
        }
    }

    fn apply_page(&mut self, page: u32, data: GamePage) {
        let mut page_ids = HashSet::new();
        let fetched: Vec<Game> = data
            .results
            .into_iter()
            .filter(|g| page_ids.insert(g.id))
            .collect();

        let added = self.merge(fetched.iter().cloned());
        self.total = data.count;
        self.current_page = page;
        self.page_fetch.succeed();

        // Created games stay visible at the top of the first page
        self.current_games = if page == 1 {
            self.local_games()
                .filter(|g| !page_ids.contains(&g.id))
                .cloned()
                .chain(fetched)
                .collect()
        } else {
            fetched
        };

        tracing::info!(
            "Loaded page {} ({} new games, {} known, total {})",
            page,
            added,
            self.all_games.len(),
            self.total
        );
    }

    // --- Favorites batch fetch ---

    /// Resolve favorites, fetching only remote ids that are not cached.
    /// A failed id is left out of the result.
    pub async fn fetch_favorites_by_ids<A: CatalogApi>(
        &mut self,
        api: &A,
        ids: &[GameId],
    ) -> Vec<Game> {
        let batch = self.begin_favorites_fetch(ids);
        let fetched = fetch_remote_games(api, &batch.to_fetch).await;
        self.finish_favorites_fetch(batch, fetched)
    }

    /// Mark the favorites fetch pending and split `ids` into what is known
    /// and what must be fetched. Every call must be paired with
    /// [`finish_favorites_fetch`](Self::finish_favorites_fetch).
    pub fn begin_favorites_fetch(&mut self, ids: &[GameId]) -> FavoritesBatch {
        self.favorites_batches += 1;
        self.favorites_fetch.start();

        let mut seen = HashSet::new();
        let requested: Vec<GameId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        let local = requested
            .iter()
            .filter(|id| id.is_local())
            .filter_map(|id| self.game(*id).cloned());
        let cached_remote = requested
            .iter()
            .filter(|id| id.is_remote())
            .filter_map(|id| self.game(*id).cloned());
        let resolved: Vec<Game> = local.chain(cached_remote).collect();

        let to_fetch: Vec<GameId> = requested
            .iter()
            .copied()
            .filter(|id| id.is_remote() && !self.contains(*id))
            .collect();

        tracing::debug!(
            "Favorites batch: {} requested, {} resolved locally, {} to fetch",
            requested.len(),
            resolved.len(),
            to_fetch.len()
        );

        FavoritesBatch { resolved, to_fetch }
    }

    /// Merge fetched games and return everything resolved by the batch.
    /// The favorites fetch stays pending until the last outstanding batch
    /// finishes.
    pub fn finish_favorites_fetch(
        &mut self,
        batch: FavoritesBatch,
        fetched: Vec<Game>,
    ) -> Vec<Game> {
        let fetched: Vec<Game> = fetched.into_iter().filter(|g| g.id.is_remote()).collect();
        self.merge(fetched.iter().cloned());

        self.favorites_batches = self.favorites_batches.saturating_sub(1);
        if self.favorites_batches == 0 {
            self.favorites_fetch.succeed();
        }

        let mut resolved = batch.resolved;
        resolved.extend(fetched);
        resolved
    }

    /// Clear the favorites loading flag when nothing needs fetching. Has no
    /// effect while a batch is still running.
    pub fn reset_favorites_loading(&mut self) {
        if self.favorites_batches == 0 {
            self.favorites_fetch.reset();
        }
    }

    // --- Local edits ---

    /// Insert a created game at the front and jump back to the first page.
    /// Returns `false` if the id is already known.
    pub fn add_created_game(&mut self, game: Game) -> bool {
        if self.contains(game.id) {
            return false;
        }

        tracing::info!("Adding created game {} ({})", game.id, game.name);
        self.current_games.insert(0, game.clone());
        self.all_games.insert(0, game);
        self.current_page = 1;
        self.persist_created();
        true
    }

    /// Remove a game from the collection and the current page
    pub fn remove_game(&mut self, id: GameId) -> bool {
        let before = self.all_games.len();
        self.all_games.retain(|g| g.id != id);
        self.current_games.retain(|g| g.id != id);
        let removed = self.all_games.len() != before;

        if removed {
            tracing::info!("Removed game {}", id);
        }
        self.persist_created();
        removed
    }

    /// Allocate an unused local id: the negated current time in
    /// milliseconds, stepping down past ids already taken
    pub fn next_local_id(&self) -> GameId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let mut candidate = -millis.max(1);
        while self.contains(GameId::Local(candidate)) {
            candidate -= 1;
        }
        GameId::Local(candidate)
    }

    /// Append games whose ids are not known yet; returns how many were added
    fn merge(&mut self, games: impl IntoIterator<Item = Game>) -> usize {
        let mut known: HashSet<GameId> = self.all_games.iter().map(|g| g.id).collect();
        let before = self.all_games.len();
        for game in games {
            if known.insert(game.id) {
                self.all_games.push(game);
            }
        }
        self.all_games.len() - before
    }

    fn persist_created(&self) {
        if let Err(e) = self.persistence.save_created_games(&self.all_games) {
            tracing::warn!("Failed to persist created games: {}", e);
        }
    }
}

/// Fetch games one by one, concurrently, dropping ids that fail
pub async fn fetch_remote_games<A: CatalogApi>(api: &A, ids: &[GameId]) -> Vec<Game> {
    if ids.is_empty() {
        return Vec::new();
    }

    let results = join_all(ids.iter().map(|id| api.fetch_game(*id))).await;

    ids.iter()
        .zip(results)
        .filter_map(|(id, result)| match result {
            Ok(game) => Some(game),
            Err(e) => {
                tracing::warn!("Skipping favorite {}: {}", id, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamedex_api::mock::MockCatalog;
    use tokio_test::block_on;

    fn ids(games: &[Game]) -> Vec<GameId> {
        games.iter().map(|g| g.id).collect()
    }

    fn remote(id: u64) -> Game {
        Game::new(GameId::Remote(id), format!("Game {}", id))
    }

    #[test]
    fn test_first_page() {
        let api = MockCatalog::with_remote_games(45, 20);
        let mut store = GamesStore::new(Persistence::in_memory());

        block_on(store.fetch_page(&api, 1));

        assert_eq!(store.current_games().len(), 20);
        assert_eq!(store.all_games().len(), 20);
        assert_eq!(store.total(), 45);
        assert_eq!(store.current_page(), 1);
        assert_eq!(store.page_fetch().status, FetchStatus::Fulfilled);
    }

    #[test]
    fn test_pages_never_duplicate() {
        let api = MockCatalog::new(3);
        for id in [1, 2, 3, 3, 4, 1] {
            api.add_game(remote(id));
        }
        let mut store = GamesStore::new(Persistence::in_memory());

        block_on(store.fetch_page(&api, 1));
        block_on(store.fetch_page(&api, 2));
        block_on(store.fetch_page(&api, 1));

        let mut all = ids(store.all_games());
        let len = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), len);
        assert_eq!(len, 4);

        block_on(store.fetch_page(&api, 2));
        assert_eq!(
            ids(store.current_games()),
            vec![GameId::Remote(3), GameId::Remote(4), GameId::Remote(1)]
        );
    }

    #[test]
    fn test_page_failure_keeps_data() {
        let api = MockCatalog::with_remote_games(10, 5);
        let mut store = GamesStore::new(Persistence::in_memory());
        block_on(store.fetch_page(&api, 1));

        api.set_fail_pages(true);
        block_on(store.fetch_page(&api, 2));

        assert_eq!(store.page_fetch().status, FetchStatus::Rejected);
        assert!(store.page_fetch().error.as_deref().unwrap().contains("500"));
        assert_eq!(store.current_page(), 1);
        assert_eq!(ids(store.current_games()).len(), 5);

        api.set_fail_pages(false);
        block_on(store.fetch_page(&api, 2));
        assert_eq!(store.page_fetch().error, None);
        assert_eq!(store.current_page(), 2);
    }

    #[test]
    fn test_begin_marks_pending() {
        let mut store = GamesStore::new(Persistence::in_memory());
        store.begin_page_fetch();
        assert!(store.page_fetch().is_loading());
        assert!(!store.favorites_fetch().is_loading());

        let batch = store.begin_favorites_fetch(&[]);
        assert!(store.favorites_fetch().is_loading());
        store.finish_favorites_fetch(batch, Vec::new());
        assert!(!store.favorites_fetch().is_loading());
        assert!(store.page_fetch().is_loading());
    }

    #[test]
    fn test_created_game_pinned_to_first_page() {
        let api = MockCatalog::with_remote_games(40, 20);
        let mut store = GamesStore::new(Persistence::in_memory());

        let local = Game::new(GameId::Local(-1), "Mine");
        assert!(store.add_created_game(local.clone()));
        assert_eq!(store.current_games()[0].id, local.id);

        block_on(store.fetch_page(&api, 1));
        assert_eq!(store.current_games()[0].id, local.id);
        assert_eq!(store.current_games().len(), 21);

        block_on(store.fetch_page(&api, 2));
        assert!(!store.current_games().iter().any(|g| g.id == local.id));

        block_on(store.fetch_page(&api, 1));
        assert_eq!(store.current_games()[0].id, local.id);
    }

    #[test]
    fn test_add_created_game_resets_page() {
        let api = MockCatalog::with_remote_games(40, 20);
        let mut store = GamesStore::new(Persistence::in_memory());
        block_on(store.fetch_page(&api, 2));
        assert_eq!(store.current_page(), 2);

        store.add_created_game(Game::new(GameId::Local(-9), "New"));
        assert_eq!(store.current_page(), 1);
        assert_eq!(store.all_games()[0].id, GameId::Local(-9));
    }

    #[test]
    fn test_add_existing_game_is_noop() {
        let mut store = GamesStore::new(Persistence::in_memory());
        assert!(store.add_created_game(Game::new(GameId::Local(-1), "First")));
        assert!(!store.add_created_game(Game::new(GameId::Local(-1), "Again")));
        assert_eq!(store.all_games().len(), 1);
        assert_eq!(store.all_games()[0].name, "First");
    }

    #[test]
    fn test_created_games_persist_across_stores() {
        let persistence = Persistence::in_memory();
        {
            let mut store = GamesStore::new(persistence.clone());
            store.add_created_game(Game::new(GameId::Local(-1), "One"));
            store.add_created_game(Game::new(GameId::Local(-2), "Two"));
            store.remove_game(GameId::Local(-1));
        }

        let store = GamesStore::new(persistence);
        assert_eq!(ids(store.all_games()), vec![GameId::Local(-2)]);
    }

    #[test]
    fn test_remove_game() {
        let api = MockCatalog::with_remote_games(5, 5);
        let mut store = GamesStore::new(Persistence::in_memory());
        block_on(store.fetch_page(&api, 1));

        assert!(store.remove_game(GameId::Remote(3)));
        assert!(!store.contains(GameId::Remote(3)));
        assert!(!store.current_games().iter().any(|g| g.id == GameId::Remote(3)));
        assert!(!store.remove_game(GameId::Remote(3)));
    }

    #[test]
    fn test_favorites_skip_cached_and_local() {
        let api = MockCatalog::with_remote_games(30, 10);
        let mut store = GamesStore::new(Persistence::in_memory());
        block_on(store.fetch_page(&api, 1));
        store.add_created_game(Game::new(GameId::Local(-4), "Mine"));
        api.clear_calls();

        let resolved = block_on(store.fetch_favorites_by_ids(
            &api,
            &[GameId::Remote(2), GameId::Local(-4), GameId::Remote(25)],
        ));

        assert_eq!(api.game_calls(), vec![GameId::Remote(25)]);
        assert_eq!(
            ids(&resolved),
            vec![GameId::Local(-4), GameId::Remote(2), GameId::Remote(25)]
        );
        assert!(store.contains(GameId::Remote(25)));
        assert_eq!(store.favorites_fetch().status, FetchStatus::Fulfilled);
    }

    #[test]
    fn test_favorites_partial_failure() {
        let api = MockCatalog::with_remote_games(10, 10);
        api.fail_game(GameId::Remote(3));
        let mut store = GamesStore::new(Persistence::in_memory());

        let requested = [GameId::Remote(1), GameId::Remote(3), GameId::Remote(5)];
        let resolved = block_on(store.fetch_favorites_by_ids(&api, &requested));

        assert_eq!(ids(&resolved), vec![GameId::Remote(1), GameId::Remote(5)]);
        assert_eq!(api.game_calls().len(), 3);
        assert_eq!(store.favorites_fetch().status, FetchStatus::Fulfilled);
        assert_eq!(store.favorites_fetch().error, None);
    }

    #[test]
    fn test_favorites_unknown_local_id_needs_no_network() {
        let api = MockCatalog::with_remote_games(10, 10);
        let mut store = GamesStore::new(Persistence::in_memory());

        let resolved = block_on(store.fetch_favorites_by_ids(
            &api,
            &[GameId::Remote(5), GameId::Local(-1_700_000_000_000)],
        ));

        assert_eq!(api.game_calls(), vec![GameId::Remote(5)]);
        assert_eq!(api.call_count(), 1);
        assert_eq!(ids(&resolved), vec![GameId::Remote(5)]);
    }

    #[test]
    fn test_favorites_duplicate_ids_fetched_once() {
        let api = MockCatalog::with_remote_games(10, 10);
        let mut store = GamesStore::new(Persistence::in_memory());

        let resolved = block_on(store.fetch_favorites_by_ids(
            &api,
            &[GameId::Remote(7), GameId::Remote(7)],
        ));

        assert_eq!(api.game_calls(), vec![GameId::Remote(7)]);
        assert_eq!(resolved.len(), 1);
    }

    #[test]
    fn test_overlapping_batches_stay_loading() {
        let mut store = GamesStore::new(Persistence::in_memory());

        let first = store.begin_favorites_fetch(&[GameId::Remote(1)]);
        let second = store.begin_favorites_fetch(&[GameId::Remote(2)]);
        assert_eq!(store.pending_favorites_batches(), 2);

        store.reset_favorites_loading();
        assert!(store.favorites_fetch().is_loading());

        store.finish_favorites_fetch(second, vec![remote(2)]);
        assert!(store.favorites_fetch().is_loading());

        store.finish_favorites_fetch(first, vec![remote(1)]);
        assert!(!store.favorites_fetch().is_loading());
        assert_eq!(store.favorites_fetch().status, FetchStatus::Fulfilled);
        assert_eq!(store.pending_favorites_batches(), 0);
    }

    #[test]
    fn test_next_local_id_is_unused() {
        let mut store = GamesStore::new(Persistence::in_memory());
        let first = store.next_local_id();
        assert!(first.is_local());
        assert!(first.raw() < 0);

        store.add_created_game(Game::new(first, "Taken"));
        let second = store.next_local_id();
        assert_ne!(first, second);
        assert!(!store.contains(second));
    }
}
