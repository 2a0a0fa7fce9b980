//! Match storage with optimistic versioning.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crease_engine::Match;
use crease_types::MatchId;

use crate::error::{ServiceError, ServiceResult};

/// Persistence boundary for matches.
///
/// `save` is an optimistic compare-and-swap: it succeeds only when the stored
/// version still equals `expected_version`.
pub trait MatchStore: Send + Sync {
    fn get(&self, id: MatchId) -> ServiceResult<Option<Arc<Match>>>;

    fn insert(&self, game: Match) -> ServiceResult<Arc<Match>>;

    fn save(&self, game: Match, expected_version: u64) -> ServiceResult<Arc<Match>>;

    fn ids(&self) -> ServiceResult<Vec<MatchId>>;

    fn len(&self) -> ServiceResult<usize>;

    fn is_empty(&self) -> ServiceResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// In-memory match store for tests, local play, and embedding.
pub struct InMemoryMatchStore {
    max_matches: usize,
    inner: RwLock<HashMap<MatchId, Arc<Match>>>,
}

impl InMemoryMatchStore {
    pub fn new(max_matches: usize) -> Self {
        Self {
            max_matches,
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryMatchStore {
    fn default() -> Self {
        Self::new(1024)
    }
}

fn poisoned(kind: &str) -> ServiceError {
    ServiceError::Internal(format!("match store {kind} lock poisoned"))
}

impl MatchStore for InMemoryMatchStore {
    fn get(&self, id: MatchId) -> ServiceResult<Option<Arc<Match>>> {
        let inner = self.inner.read().map_err(|_| poisoned("read"))?;
        Ok(inner.get(&id).cloned())
    }

    fn insert(&self, game: Match) -> ServiceResult<Arc<Match>> {
        let mut inner = self.inner.write().map_err(|_| poisoned("write"))?;
        if inner.len() >= self.max_matches {
            return Err(ServiceError::CapacityExceeded(self.max_matches));
        }
        let id = game.id();
        if let Some(existing) = inner.get(&id) {
            return Err(ServiceError::VersionConflict {
                id,
                expected: 0,
                actual: existing.version(),
            });
        }
        let game = Arc::new(game);
        inner.insert(id, Arc::clone(&game));
        Ok(game)
    }

    fn save(&self, game: Match, expected_version: u64) -> ServiceResult<Arc<Match>> {
        let mut inner = self.inner.write().map_err(|_| poisoned("write"))?;
        let id = game.id();
        let stored = inner.get(&id).ok_or(ServiceError::MatchNotFound(id))?;
        if stored.version() != expected_version {
            return Err(ServiceError::VersionConflict {
                id,
                expected: expected_version,
                actual: stored.version(),
            });
        }
        let game = Arc::new(game);
        inner.insert(id, Arc::clone(&game));
        Ok(game)
    }

    fn ids(&self) -> ServiceResult<Vec<MatchId>> {
        let inner = self.inner.read().map_err(|_| poisoned("read"))?;
        let mut ids: Vec<MatchId> = inner.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn len(&self) -> ServiceResult<usize> {
        let inner = self.inner.read().map_err(|_| poisoned("read"))?;
        Ok(inner.len())
    }
}
