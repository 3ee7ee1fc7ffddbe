//! In-memory artifact store (process lifetime only).

use crate::csv_store::{names_exhausted, MAX_NAME_ATTEMPTS};
use crate::{artifact_file_name, encode_csv};
use async_trait::async_trait;
use scrape_types::{ArtifactError, ArtifactHandle, ArtifactStore, ProductRecord};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct InMemoryArtifactStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryArtifactStore {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }
}

impl Default for InMemoryArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn save(
        &self,
        query: &str,
        records: &[ProductRecord],
    ) -> Result<ArtifactHandle, ArtifactError> {
        let bytes = encode_csv(records)?;
        let mut files = self.files.write().await;
        for _ in 0..MAX_NAME_ATTEMPTS {
            let file_name = artifact_file_name(query);
            let location = format!("memory://{}", file_name);
            if let Entry::Vacant(slot) = files.entry(location.clone()) {
                slot.insert(bytes);
                return Ok(ArtifactHandle {
                    location,
                    file_name,
                });
            }
        }
        Err(names_exhausted())
    }

    async fn load(&self, handle: &ArtifactHandle) -> Result<Vec<u8>, ArtifactError> {
        self.files
            .read()
            .await
            .get(&handle.location)
            .cloned()
            .ok_or_else(|| ArtifactError::NotFound(handle.location.clone()))
    }
}
