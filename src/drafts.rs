//! In-memory staging area for generated courses awaiting commit or discard.
//!
//! Keys are independent: operations on distinct course ids never contend.
//! Each entry sits behind its own slot lock so that commit, discard and
//! reads of the same id are linearizable. A slot emptied by a successful
//! commit is treated as absent even before it is unlinked from the map.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{CourseError, CourseResult};
use crate::models::DraftEntry;

type Slot = Arc<Mutex<Option<DraftEntry>>>;

/// Process-wide draft store. Cloning shares the underlying map.
#[derive(Clone, Default)]
pub struct DraftCache {
    entries: Arc<DashMap<Uuid, Slot>>,
}

impl DraftCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `entry` under `id`, replacing any previous entry.
    pub fn put(&self, id: Uuid, entry: DraftEntry) {
        self.entries.insert(id, Arc::new(Mutex::new(Some(entry))));
        tracing::debug!(course_id = %id, staged = self.entries.len(), "Staged draft");
    }

    pub fn get(&self, id: Uuid) -> Option<DraftEntry> {
        let slot = self.slot(id)?;
        let guard = lock_slot(&slot);
        guard.clone()
    }

    /// Evict `id` and hand back whatever was staged there.
    pub fn remove(&self, id: Uuid) -> Option<DraftEntry> {
        let (_, slot) = self.entries.remove(&id)?;
        let mut guard = lock_slot(&slot);
        guard.take()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the staged entry with `persist`, then evict it.
    ///
    /// The entry stays staged when `persist` fails so the commit can be
    /// retried under the same id. Concurrent commits of one id run `persist`
    /// at most once; the losers see `NotFound`.
    pub fn commit_and_remove<T, F>(&self, id: Uuid, persist: F) -> CourseResult<T>
    where
        F: FnOnce(&DraftEntry) -> anyhow::Result<T>,
    {
        let slot = self
            .slot(id)
            .ok_or_else(|| CourseError::not_found(format!("Draft {}", id)))?;
        let mut guard = lock_slot(&slot);

        let Some(entry) = guard.as_ref() else {
            return Err(CourseError::not_found(format!("Draft {}", id)));
        };

        let persisted = persist(entry).map_err(|e| {
            tracing::error!(course_id = %id, "Commit failed, draft kept for retry: {:#}", e);
            CourseError::Persistence(e)
        })?;

        *guard = None;
        self.entries.remove_if(&id, |_, current| Arc::ptr_eq(current, &slot));
        drop(guard);

        tracing::info!(course_id = %id, "Draft committed and evicted");
        Ok(persisted)
    }

    /// Evict the staged entry without persisting anything.
    pub fn discard_and_remove(&self, id: Uuid) -> CourseResult<()> {
        match self.remove(id) {
            Some(_) => {
                tracing::info!(course_id = %id, "Draft discarded");
                Ok(())
            }
            None => Err(CourseError::not_found(format!("Draft {}", id))),
        }
    }

    fn slot(&self, id: Uuid) -> Option<Slot> {
        self.entries.get(&id).map(|e| Arc::clone(e.value()))
    }
}

// A panicking `persist` leaves the entry untouched, so a poisoned slot still
// holds a usable value.
fn lock_slot(slot: &Mutex<Option<DraftEntry>>) -> MutexGuard<'_, Option<DraftEntry>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
