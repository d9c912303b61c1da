// libs/shared/database/src/store.rs
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Port for loading and saving one whole entity collection.
///
/// Engines keep the authoritative copy in memory and call `save` with the
/// full collection after every mutation; adapters never merge per record.
#[async_trait]
pub trait CollectionStore<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    /// Load the stored collection. A store that has never been written
    /// yields an empty collection.
    async fn load(&self) -> Result<Vec<T>, StoreError>;

    /// Replace the stored collection with `items`.
    async fn save(&self, items: &[T]) -> Result<(), StoreError>;
}
