//! Catalog coordinator
//!
//! Owns the API client, both stores and the reconciler, and sequences calls
//! between them. Methods take `&self`; store borrows are never held across
//! an await, so several operations can be polled together on one thread and
//! interleave only at network calls.

use crate::favorites::FavoritesStore;
use crate::games::{FetchState, GamesStore, fetch_remote_games};
use crate::reconcile::{ReconcilePlan, Reconciler};
use crate::{LibraryError, Persistence};
use futures_util::future::join;
use gamedex_api::{CatalogApi, Game, GameId, NamedRef, PlatformEntry};
use std::cell::{Cell, Ref, RefCell};
use std::collections::HashSet;

/// Which list is on display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    All,
    Favorites,
}

/// User input for a new local game
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameDraft {
    pub name: String,
    pub background_image: Option<String>,
    pub released: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub platforms: Vec<String>,
    pub description: Option<String>,
    pub screenshots: Vec<String>,
}

impl GameDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn into_game(self, id: GameId) -> Game {
        let named = |(index, name): (usize, String)| NamedRef {
            id: index as i64 + 1,
            name,
            slug: None,
        };

        let mut game = Game::new(id, self.name.trim());
        game.background_image = self.background_image;
        game.released = self.released;
        game.rating = self.rating;
        game.description_raw = self.description;
        game.genres = self.genres.into_iter().enumerate().map(named).collect();
        game.platforms = self
            .platforms
            .into_iter()
            .enumerate()
            .map(|entry| PlatformEntry {
                platform: named(entry),
            })
            .collect();
        game.screenshots = Some(self.screenshots);
        game
    }
}

/// A game with its screenshots
#[derive(Debug, Clone, PartialEq)]
pub struct GameDetails {
    pub game: Game,
    pub screenshots: Vec<String>,
}

impl GameDetails {
    fn from_known(game: Game) -> Self {
        let screenshots = game.screenshots.clone().unwrap_or_default();
        Self { game, screenshots }
    }
}

pub struct Catalog<A: CatalogApi> {
    api: A,
    games: RefCell<GamesStore>,
    favorites: RefCell<FavoritesStore>,
    reconciler: RefCell<Reconciler>,
    view: Cell<View>,
    page: Cell<u32>,
}

impl<A: CatalogApi> Catalog<A> {
    /// Build both stores from `persistence`
    pub fn new(api: A, persistence: Persistence) -> Self {
        Self {
            api,
            games: RefCell::new(GamesStore::new(persistence.clone())),
            favorites: RefCell::new(FavoritesStore::new(persistence)),
            reconciler: RefCell::new(Reconciler::new()),
            view: Cell::new(View::All),
            page: Cell::new(1),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn games(&self) -> Ref<'_, GamesStore> {
        self.games.borrow()
    }

    pub fn favorites(&self) -> Ref<'_, FavoritesStore> {
        self.favorites.borrow()
    }

    pub fn reconciler(&self) -> Ref<'_, Reconciler> {
        self.reconciler.borrow()
    }

    pub fn view(&self) -> View {
        self.view.get()
    }

    /// Requested page of the catalog view
    pub fn page(&self) -> u32 {
        self.page.get()
    }

    // --- Catalog view ---

    pub async fn fetch_page(&self, page: u32) {
        self.games.borrow_mut().begin_page_fetch();
        let result = self.api.fetch_games(page).await;
        self.games.borrow_mut().finish_page_fetch(page, result);
    }

    /// Move to `page`, loading it when the catalog view is open
    pub async fn set_page(&self, page: u32) {
        let page = page.max(1);
        self.page.set(page);
        if self.view.get() == View::All {
            self.fetch_page(page).await;
        }
    }

    /// Switch to the catalog view and load the requested page
    pub async fn show_all(&self) {
        if self.view.replace(View::All) == View::Favorites {
            self.reconciler.borrow_mut().leave();
        }
        self.fetch_page(self.page.get()).await;
    }

    // --- Favorites view ---

    /// Switch to the favorites view: reload persisted favorites, then fetch
    /// whatever is still missing
    pub async fn show_favorites(&self) {
        self.view.set(View::Favorites);
        self.reconciler.borrow_mut().enter();
        self.favorites.borrow_mut().load_from_storage();
        self.games.borrow_mut().reset_favorites_loading();
        self.reconcile_favorites().await;
    }

    /// Fetch favorites that have no cached game yet
    pub async fn reconcile_favorites(&self) {
        let plan = {
            let favorites = self.favorites.borrow();
            let resolved: HashSet<GameId> =
                favorites.favorite_games().iter().map(|g| g.id).collect();
            self.reconciler
                .borrow_mut()
                .plan(favorites.favorites(), &resolved)
        };

        match plan {
            ReconcilePlan::Inactive | ReconcilePlan::Unchanged => {}
            ReconcilePlan::Empty | ReconcilePlan::Complete => {
                self.games.borrow_mut().reset_favorites_loading();
            }
            ReconcilePlan::Fetch { ids, generation } => {
                let batch = self.games.borrow_mut().begin_favorites_fetch(&ids);
                let fetched = fetch_remote_games(&self.api, &batch.to_fetch).await;
                let resolved = self
                    .games
                    .borrow_mut()
                    .finish_favorites_fetch(batch, fetched);

                self.cache_favorite_games(resolved);
                self.reconciler.borrow_mut().finish(generation, &ids);
            }
        }
    }

    /// Add freshly resolved games behind the existing cache entries
    fn cache_favorite_games(&self, resolved: Vec<Game>) {
        if resolved.is_empty() {
            return;
        }
        let mut favorites = self.favorites.borrow_mut();
        let mut games = favorites.favorite_games().to_vec();
        let known: HashSet<GameId> = games.iter().map(|g| g.id).collect();
        games.extend(resolved.into_iter().filter(|g| !known.contains(&g.id)));
        favorites.set_favorite_games(games);
    }

    // --- User actions ---

    /// Flip the favorite state of `id`, caching the game if it is known
    pub fn toggle_favorite(&self, id: GameId) -> bool {
        let game = self.games.borrow().game(id).cloned();
        self.favorites.borrow_mut().toggle_favorite(id, game)
    }

    /// Delete a game everywhere, including from favorites
    pub fn delete_game(&self, id: GameId) {
        self.games.borrow_mut().remove_game(id);
        self.favorites.borrow_mut().remove_favorite(id);
    }

    /// Create a local game and show it at the top of the first page
    pub fn create_game(&self, draft: GameDraft) -> Result<Game, LibraryError> {
        if draft.name.trim().is_empty() {
            return Err(LibraryError::InvalidGame("name is required".into()));
        }

        let mut games = self.games.borrow_mut();
        let game = draft.into_game(games.next_local_id());
        games.add_created_game(game.clone());
        self.page.set(1);
        Ok(game)
    }

    // --- Read side ---

    /// Games for the current view
    pub fn displayed_games(&self) -> Vec<Game> {
        match self.view.get() {
            View::Favorites => {
                let favorites = self.favorites.borrow();
                favorites
                    .favorite_games()
                    .iter()
                    .filter(|g| favorites.is_favorite(g.id))
                    .cloned()
                    .collect()
            }
            View::All => self.games.borrow().current_games().to_vec(),
        }
    }

    fn fetch_state(&self) -> FetchState {
        let games = self.games.borrow();
        match self.view.get() {
            View::Favorites => games.favorites_fetch().clone(),
            View::All => games.page_fetch().clone(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.fetch_state().is_loading()
    }

    /// Last fetch error of the current view
    pub fn error(&self) -> Option<String> {
        self.fetch_state().error
    }

    pub fn is_empty(&self) -> bool {
        self.displayed_games().is_empty()
    }

    pub fn total(&self) -> u64 {
        self.games.borrow().total()
    }

    pub fn is_favorite(&self, id: GameId) -> bool {
        self.favorites.borrow().is_favorite(id)
    }

    /// Load a game with its screenshots. Local games come from memory; for
    /// remote games a failed request falls back to any copy held locally.
    pub async fn game_details(&self, id: GameId) -> Result<GameDetails, LibraryError> {
        let known = self.known_game(id);

        if id.is_local() {
            return known
                .map(GameDetails::from_known)
                .ok_or(LibraryError::GameNotFound(id));
        }

        let (game, screenshots) =
            join(self.api.fetch_game(id), self.api.fetch_screenshots(id)).await;

        match (game, screenshots) {
            (Ok(game), Ok(screenshots)) => Ok(GameDetails { game, screenshots }),
            (Err(e), _) | (_, Err(e)) => {
                if e.is_not_found() {
                    tracing::info!("Game {} is not in the remote catalog", id);
                } else {
                    tracing::warn!("Failed to load details for {}: {}", id, e);
                }
                known
                    .map(GameDetails::from_known)
                    .ok_or(LibraryError::GameNotFound(id))
            }
        }
    }

    /// Genre list of the remote catalog
    pub async fn genres(&self) -> Result<Vec<NamedRef>, LibraryError> {
        Ok(self.api.fetch_genres().await?)
    }

    /// Parent platform list of the remote catalog
    pub async fn platforms(&self) -> Result<Vec<NamedRef>, LibraryError> {
        Ok(self.api.fetch_platforms().await?)
    }

    fn known_game(&self, id: GameId) -> Option<Game> {
        if let Some(game) = self.games.borrow().game(id) {
            return Some(game.clone());
        }
        self.favorites
            .borrow()
            .favorite_games()
            .iter()
            .find(|g| g.id == id)
            .cloned()
    }
}
