//! In-process session repository.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::convert::Infallible;

use crate::engine::Repository;
use crate::session::SessionState;
use crate::state::SessionId;

/// Repository that keeps snapshots in a map behind a mutex.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    /// Stored session ids in sorted order.
    #[must_use]
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn remove(&self, id: &str) -> Option<SessionState> {
        self.sessions.lock().remove(id)
    }
}

impl Repository for MemoryRepository {
    type Error = Infallible;

    fn load(&self, id: &str) -> Result<Option<SessionState>, Self::Error> {
        Ok(self.sessions.lock().get(id).cloned())
    }

    fn save(&self, state: &SessionState) -> Result<(), Self::Error> {
        self.sessions
            .lock()
            .insert(state.id.clone(), state.clone());
        Ok(())
    }
}
