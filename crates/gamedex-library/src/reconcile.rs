//! Favorites reconciliation bookkeeping
//!
//! Decides which favorited ids still lack a game object while the favorites
//! view is open, and makes sure an id is never requested twice at once.
//! Work is only planned when the *set* of favorite ids changes.

use gamedex_api::GameId;
use std::collections::HashSet;

/// What the coordinator should do after a planning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePlan {
    /// The favorites view is not open
    Inactive,
    /// Same id set as the last planning step
    Unchanged,
    /// No favorites at all
    Empty,
    /// Every favorite is resolved or already being fetched
    Complete,
    /// Fetch these ids; report back with the same generation
    Fetch { ids: Vec<GameId>, generation: u64 },
}

/// Order-independent identity of a favorites list
pub fn favorites_key(ids: &[GameId]) -> Vec<GameId> {
    let mut key = ids.to_vec();
    key.sort();
    key.dedup();
    key
}

#[derive(Debug, Default)]
pub struct Reconciler {
    active: bool,
    in_flight: HashSet<GameId>,
    last_key: Option<Vec<GameId>>,
    generation: u64,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_in_flight(&self, id: GameId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// The favorites view opened
    pub fn enter(&mut self) {
        self.active = true;
    }

    /// The favorites view closed: forget everything so a later visit starts
    /// clean, and invalidate fetches still running
    pub fn leave(&mut self) {
        self.active = false;
        self.in_flight.clear();
        self.last_key = None;
        self.generation += 1;
    }

    /// Compute the fetch needed for `favorites`, given the ids that already
    /// have a game object
    pub fn plan(&mut self, favorites: &[GameId], resolved: &HashSet<GameId>) -> ReconcilePlan {
        if !self.active {
            return ReconcilePlan::Inactive;
        }

        let key = favorites_key(favorites);
        if self.last_key.as_ref() == Some(&key) {
            return ReconcilePlan::Unchanged;
        }
        self.last_key = Some(key);

        // In-flight marks are only dropped by `finish` and `leave`
        if favorites.is_empty() {
            return ReconcilePlan::Empty;
        }

        let mut seen = HashSet::new();
        let missing: Vec<GameId> = favorites
            .iter()
            .copied()
            .filter(|id| !resolved.contains(id) && !self.in_flight.contains(id))
            .filter(|id| seen.insert(*id))
            .collect();

        if missing.is_empty() {
            return ReconcilePlan::Complete;
        }

        self.in_flight.extend(missing.iter().copied());
        tracing::debug!(
            "Reconcile: fetching {} missing favorites (generation {})",
            missing.len(),
            self.generation
        );

        ReconcilePlan::Fetch {
            ids: missing,
            generation: self.generation,
        }
    }

    /// A planned fetch settled, successfully or not. Results from an older
    /// generation leave the current bookkeeping alone.
    pub fn finish(&mut self, generation: u64, ids: &[GameId]) {
        if generation != self.generation {
            tracing::debug!(
                "Ignoring settled fetch from generation {} (now {})",
                generation,
                self.generation
            );
            return;
        }
        for id in ids {
            self.in_flight.remove(id);
        }
    }
}
