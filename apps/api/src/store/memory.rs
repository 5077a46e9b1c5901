//! In-memory stores for handler and engine tests.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::profile::{Profile, StoredDocument};
use crate::store::{DocumentPayloadStore, ProfileStore};

#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryProfileStore {
    pub async fn insert(&self, user_id: Uuid, profile: Profile) {
        self.profiles.write().await.insert(user_id, profile);
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, StoredDocument>>,
}

impl MemoryDocumentStore {
    pub async fn insert(&self, key: &str, document: StoredDocument) {
        self.documents.write().await.insert(key.to_string(), document);
    }
}

#[async_trait]
impl DocumentPayloadStore for MemoryDocumentStore {
    async fn fetch(&self, key: &str) -> Result<StoredDocument> {
        self.documents
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No document stored under '{key}'"))
    }
}
