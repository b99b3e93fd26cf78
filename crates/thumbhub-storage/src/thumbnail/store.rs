//! Thumbnail byte store addressed by thumbnail metadata.

use std::sync::Arc;

use bytes::Bytes;

use thumbhub_core::error::{AppError, ErrorKind};
use thumbhub_core::result::AppResult;
use thumbhub_core::traits::storage::StorageProvider;
use thumbhub_entity::thumbnail::ThumbnailMetadata;

/// Reads and writes compressed thumbnail bytes.
///
/// Each metadata row owns exactly one object at
/// `{output_dir}/{pixels_id}/{thumbnail_id}.{ext}`.
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    /// Storage provider holding the bytes.
    provider: Arc<dyn StorageProvider>,
    /// Thumbnail directory within the provider.
    output_dir: String,
}

impl ThumbnailStore {
    /// Create a new thumbnail store.
    pub fn new(provider: Arc<dyn StorageProvider>, output_dir: &str) -> Self {
        Self {
            provider,
            output_dir: output_dir.trim_end_matches('/').to_string(),
        }
    }

    /// Storage path of the bytes described by `metadata`.
    pub fn path_for(&self, metadata: &ThumbnailMetadata) -> String {
        format!(
            "{}/{}/{}.{}",
            self.output_dir,
            metadata.pixels_id,
            metadata.id,
            metadata.extension()
        )
    }

    /// Whether bytes exist for `metadata`.
    ///
    /// An I/O failure here is a resource error: the caller cannot decide
    /// whether a cached thumbnail is servable.
    pub async fn thumbnail_exists(&self, metadata: &ThumbnailMetadata) -> AppResult<bool> {
        let path = self.path_for(metadata);
        self.provider.exists(&path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Resource,
                format!("Cannot check thumbnail bytes for pixels {}", metadata.pixels_id),
                e,
            )
        })
    }

    /// Read the bytes described by `metadata`.
    pub async fn read(&self, metadata: &ThumbnailMetadata) -> AppResult<Bytes> {
        self.provider.read_bytes(&self.path_for(metadata)).await
    }

    /// Write the bytes described by `metadata`, replacing previous bytes.
    pub async fn write(&self, metadata: &ThumbnailMetadata, data: Bytes) -> AppResult<()> {
        if data.is_empty() {
            return Err(AppError::validation("Refusing to store an empty thumbnail"));
        }
        let path = self.path_for(metadata);
        self.provider.write(&path, data).await?;

        tracing::debug!(
            pixels_id = %metadata.pixels_id,
            thumbnail_id = %metadata.id,
            output = %path,
            "Stored thumbnail bytes"
        );
        Ok(())
    }
}
