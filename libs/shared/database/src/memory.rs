// libs/shared/database/src/memory.rs
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::store::{CollectionStore, StoreError};

/// Keeps the "persisted" collection in memory. Used by tests and by
/// callers that do not need durability.
pub struct InMemoryStore<T> {
    items: Mutex<Vec<T>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl<T> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(items),
            fail_saves: AtomicBool::new(false),
            save_count: AtomicUsize::new(0),
        }
    }

    /// Make every following `save` fail until switched back.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }
}

impl<T: Clone> InMemoryStore<T> {
    pub async fn snapshot(&self) -> Vec<T> {
        self.items.lock().await.clone()
    }
}

#[async_trait]
impl<T> CollectionStore<T> for InMemoryStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, StoreError> {
        Ok(self.items.lock().await.clone())
    }

    async fn save(&self, items: &[T]) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store rejected save".to_string()));
        }

        *self.items.lock().await = items.to_vec();
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
