//! Collaborators the engine reads from but never owns: the applicant profile record
//! and the stored resume payload.

#[cfg(test)]
pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::profile::{Profile, StoredDocument};

// ────────────────────────────────────────────────────────────────────────────
// Traits
// ────────────────────────────────────────────────────────────────────────────

/// Read side of the structured applicant record.
///
/// Carried in `AppState` as `Arc<dyn ProfileStore>`.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load(&self, user_id: Uuid) -> Result<Option<Profile>>;
}

/// Resolves an opaque document reference to its encoded bytes and metadata.
#[async_trait]
pub trait DocumentPayloadStore: Send + Sync {
    async fn fetch(&self, key: &str) -> Result<StoredDocument>;
}

/// Inlines the resume payload when the profile only carries a reference to it.
pub async fn hydrate_resume(
    profile: &mut Profile,
    documents: &dyn DocumentPayloadStore,
) -> Result<()> {
    if profile.resume.is_some() {
        return Ok(());
    }
    if let Some(key) = profile.resume_key.as_deref() {
        debug!("Fetching resume payload {key}");
        profile.resume = Some(documents.fetch(key).await?);
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// PostgreSQL profile store
// ────────────────────────────────────────────────────────────────────────────

/// Profiles live as one JSONB document per user in `applicant_profiles`.
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn load(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row: Option<Json<Profile>> =
            sqlx::query_scalar("SELECT data FROM applicant_profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await
                .with_context(|| format!("Failed to load profile for user {user_id}"))?;
        Ok(row.map(|Json(profile)| profile))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// S3 document store
// ────────────────────────────────────────────────────────────────────────────

pub struct S3DocumentStore {
    s3: S3Client,
    bucket: String,
}

impl S3DocumentStore {
    pub fn new(s3: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl DocumentPayloadStore for S3DocumentStore {
    async fn fetch(&self, key: &str) -> Result<StoredDocument> {
        let object = self
            .s3
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 download failed: {e}"))?;

        let media_type = object
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| anyhow::anyhow!("S3 body read failed: {e}"))?
            .into_bytes();

        info!(
            "Downloaded s3://{}/{} ({} bytes)",
            self.bucket,
            key,
            bytes.len()
        );
        Ok(StoredDocument::from_bytes(
            file_name_of(key),
            &media_type,
            &bytes,
        ))
    }
}

fn file_name_of(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}
