//! Per-participant memory.
//!
//! Each participant owns an append-only ordered log of short text notes,
//! consulted on every response. Notes are added only through the explicit
//! [`MemoryStore::remember`] operation; the transcript never leaks into
//! memory implicitly.
//!
//! Capacity overflow is recoverable by contract: callers drop the note and
//! log a warning rather than failing the round.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::MemoryError;
use crate::types::ParticipantId;

// ============================================================================
// MEMORY STORE TRAIT
// ============================================================================

/// Store of per-participant notes.
///
/// Implementations can use various backends; sessions only require the
/// in-memory one. Notes for distinct participants are independent, which is
/// what allows pre-seeding to run as unordered concurrent tasks.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Append a note to a participant's memory.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::Capacity`] when the participant's log is full.
    async fn remember(&self, participant: &ParticipantId, note: String)
        -> Result<(), MemoryError>;

    /// All notes for a participant, in insertion order.
    async fn notes(&self, participant: &ParticipantId) -> Vec<String>;

    /// Drop all notes for a participant.
    async fn clear(&self, participant: &ParticipantId);

    /// Drop all notes for everyone.
    async fn clear_all(&self);
}

/// Arc-wrapped memory store for sharing across a session.
pub type SharedMemoryStore = Arc<dyn MemoryStore>;

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// In-memory [`MemoryStore`] with a per-participant capacity bound.
///
/// Does not persist across restarts; the workshop keeps it alive across
/// sessions instead.
pub struct InMemoryStore {
    notes: RwLock<HashMap<ParticipantId, Vec<String>>>,
    max_notes: usize,
}

impl InMemoryStore {
    /// Default per-participant note capacity.
    pub const DEFAULT_MAX_NOTES: usize = 100;

    /// Create a store with the default capacity.
    pub fn new() -> Self {
        Self {
            notes: RwLock::new(HashMap::new()),
            max_notes: Self::DEFAULT_MAX_NOTES,
        }
    }

    /// Set the per-participant note capacity.
    #[must_use]
    pub fn with_max_notes(mut self, max: usize) -> Self {
        self.max_notes = max;
        self
    }

    /// Convenience constructor for a shareable store.
    pub fn shared() -> SharedMemoryStore {
        Arc::new(Self::new())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn remember(
        &self,
        participant: &ParticipantId,
        note: String,
    ) -> Result<(), MemoryError> {
        let mut notes = self
            .notes
            .write()
            .map_err(|e| MemoryError::Storage(e.to_string()))?;

        let log = notes.entry(participant.clone()).or_default();
        if log.len() >= self.max_notes {
            return Err(MemoryError::Capacity {
                participant: participant.clone(),
                limit: self.max_notes,
            });
        }

        log.push(note);
        Ok(())
    }

    async fn notes(&self, participant: &ParticipantId) -> Vec<String> {
        self.notes
            .read()
            .ok()
            .and_then(|notes| notes.get(participant).cloned())
            .unwrap_or_default()
    }

    async fn clear(&self, participant: &ParticipantId) {
        if let Ok(mut notes) = self.notes.write() {
            notes.remove(participant);
        }
    }

    async fn clear_all(&self) {
        if let Ok(mut notes) = self.notes.write() {
            notes.clear();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remember_and_recall() {
        let store = InMemoryStore::new();
        let writer = ParticipantId::new("story_writer");

        store
            .remember(&writer, "Always write vivid stories.".into())
            .await
            .unwrap();
        store
            .remember(&writer, "Keep pacing tight.".into())
            .await
            .unwrap();

        let notes = store.notes(&writer).await;
        assert_eq!(
            notes,
            vec!["Always write vivid stories.", "Keep pacing tight."]
        );
    }

    #[tokio::test]
    async fn test_notes_are_per_participant() {
        let store = InMemoryStore::new();
        let writer = ParticipantId::new("writer");
        let reviewer = ParticipantId::new("reviewer");

        store.remember(&writer, "note for writer".into()).await.unwrap();

        assert_eq!(store.notes(&writer).await.len(), 1);
        assert!(store.notes(&reviewer).await.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_overflow() {
        let store = InMemoryStore::new().with_max_notes(2);
        let id = ParticipantId::new("writer");

        store.remember(&id, "one".into()).await.unwrap();
        store.remember(&id, "two".into()).await.unwrap();
        let err = store.remember(&id, "three".into()).await.unwrap_err();

        assert!(matches!(err, MemoryError::Capacity { limit: 2, .. }));
        // The overflowing note was dropped, the log is intact.
        assert_eq!(store.notes(&id).await, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = InMemoryStore::new();
        let writer = ParticipantId::new("writer");
        let reviewer = ParticipantId::new("reviewer");

        store.remember(&writer, "a".into()).await.unwrap();
        store.remember(&reviewer, "b".into()).await.unwrap();

        store.clear(&writer).await;
        assert!(store.notes(&writer).await.is_empty());
        assert_eq!(store.notes(&reviewer).await.len(), 1);

        store.clear_all().await;
        assert!(store.notes(&reviewer).await.is_empty());
    }
}
