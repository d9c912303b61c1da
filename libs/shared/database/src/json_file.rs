// libs/shared/database/src/json_file.rs
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::store::{CollectionStore, StoreError};

/// Stores a collection as a pretty-printed JSON array in a single file.
pub struct JsonFileStore<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl<T> CollectionStore<T> for JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        match serde_json::from_slice::<Vec<T>>(&raw) {
            Ok(items) => {
                debug!("Loaded {} records from {}", items.len(), self.path.display());
                Ok(items)
            }
            Err(e) => {
                warn!("{} is corrupt ({}), starting empty", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(items)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        // Write next to the target and rename so readers never see a torn file.
        let mut tmp_name = self.path.clone().into_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, body)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!("Saved {} records to {}", items.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Entry {
        id: i64,
        label: String,
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFileStore<Entry> = JsonFileStore::new(dir.path().join("entries.json"));

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        std::fs::write(&path, b"{ not json").unwrap();
        let store: JsonFileStore<Entry> = JsonFileStore::new(&path);

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFileStore<Entry> =
            JsonFileStore::new(dir.path().join("nested").join("entries.json"));
        let entries = vec![
            Entry { id: 1, label: "first".to_string() },
            Entry { id: 2, label: "second".to_string() },
        ];

        store.save(&entries).await.unwrap();

        assert_eq!(store.load().await.unwrap(), entries);
        assert!(!dir.path().join("nested").join("entries.json.tmp").exists());
    }
}
