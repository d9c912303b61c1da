// libs/shared/database/src/sequence.rs
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::store::{CollectionStore, StoreError};

/// Highest id ever handed out for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMark {
    pub last_id: i64,
}

/// Id source for one collection. The mark only moves forward, so removing
/// the record with the highest id never frees that id for reuse.
pub struct IdSequence {
    store: Arc<dyn CollectionStore<SequenceMark>>,
    last_id: Mutex<i64>,
}

impl IdSequence {
    /// `floor` is the highest id present in the collection right now. It
    /// covers collections written before a mark was stored.
    pub async fn load(
        store: Arc<dyn CollectionStore<SequenceMark>>,
        floor: i64,
    ) -> Result<Self, StoreError> {
        let stored = store
            .load()
            .await?
            .iter()
            .map(|mark| mark.last_id)
            .max()
            .unwrap_or(0);
        let last_id = stored.max(floor).max(0);
        debug!("Id sequence starts after {}", last_id);

        Ok(Self {
            store,
            last_id: Mutex::new(last_id),
        })
    }

    /// Reserves the next id. The new mark is persisted before the id is
    /// returned; a failed save leaves the mark where it was.
    pub async fn next_id(&self) -> Result<i64, StoreError> {
        let mut last_id = self.last_id.lock().await;
        let next = last_id
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable("id sequence exhausted".to_string()))?;

        self.store.save(&[SequenceMark { last_id: next }]).await?;
        *last_id = next;
        Ok(next)
    }

    pub async fn last_id(&self) -> i64 {
        *self.last_id.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_starts_after_floor_or_stored_mark() {
        let store = Arc::new(InMemoryStore::with_items(vec![SequenceMark { last_id: 9 }]));

        let sequence = IdSequence::load(store.clone(), 4).await.unwrap();
        assert_eq!(sequence.next_id().await.unwrap(), 10);

        let sequence = IdSequence::load(Arc::new(InMemoryStore::new()), 4).await.unwrap();
        assert_eq!(sequence.next_id().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_mark_survives_reload() {
        let store = Arc::new(InMemoryStore::<SequenceMark>::new());
        let sequence = IdSequence::load(store.clone(), 0).await.unwrap();
        sequence.next_id().await.unwrap();
        sequence.next_id().await.unwrap();

        // The collection is empty again, but ids 1 and 2 are spent.
        let reloaded = IdSequence::load(store.clone(), 0).await.unwrap();
        assert_eq!(reloaded.next_id().await.unwrap(), 3);
        assert_eq!(store.snapshot().await, vec![SequenceMark { last_id: 3 }]);
    }

    #[tokio::test]
    async fn test_failed_save_does_not_advance() {
        let store = Arc::new(InMemoryStore::<SequenceMark>::new());
        let sequence = IdSequence::load(store.clone(), 0).await.unwrap();

        store.set_fail_saves(true);
        assert_matches!(sequence.next_id().await, Err(StoreError::Unavailable(_)));
        assert_eq!(sequence.last_id().await, 0);

        store.set_fail_saves(false);
        assert_eq!(sequence.next_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_sequence_errors() {
        let sequence = IdSequence::load(Arc::new(InMemoryStore::new()), i64::MAX)
            .await
            .unwrap();

        assert_matches!(sequence.next_id().await, Err(StoreError::Unavailable(_)));
    }
}
