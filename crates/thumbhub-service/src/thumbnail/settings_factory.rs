//! Creation of default rendering settings.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use thumbhub_core::result::AppResult;
use thumbhub_core::types::{PixelsId, UserId};
use thumbhub_database::ThumbnailPersistence;
use thumbhub_entity::pixels::Pixels;
use thumbhub_entity::rendering::NewRenderingSettings;

/// Creates default rendering settings for pixel sets that have none.
#[async_trait]
pub trait RenderingSettingsFactory: Send + Sync + 'static {
    /// Create default settings owned by `owner_id` for `pixels`.
    ///
    /// Returns the pixel sets that gained a settings record.
    async fn reset_default_settings(
        &self,
        owner_id: UserId,
        pixels: &[Pixels],
    ) -> AppResult<Vec<PixelsId>>;
}

/// Factory writing [`NewRenderingSettings::defaults_for`] rows through the
/// persistence layer.
#[derive(Clone)]
pub struct PersistedSettingsFactory {
    persistence: Arc<dyn ThumbnailPersistence>,
}

impl std::fmt::Debug for PersistedSettingsFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSettingsFactory").finish()
    }
}

impl PersistedSettingsFactory {
    /// Create the factory.
    pub fn new(persistence: Arc<dyn ThumbnailPersistence>) -> Self {
        Self { persistence }
    }
}

#[async_trait]
impl RenderingSettingsFactory for PersistedSettingsFactory {
    async fn reset_default_settings(
        &self,
        owner_id: UserId,
        pixels: &[Pixels],
    ) -> AppResult<Vec<PixelsId>> {
        let rows: Vec<NewRenderingSettings> = pixels
            .iter()
            .map(|p| NewRenderingSettings::defaults_for(p, owner_id))
            .collect();
        let created = self.persistence.insert_settings(&rows).await?;

        info!(
            owner_id = %owner_id,
            requested = rows.len(),
            created = created.len(),
            "Created default rendering settings"
        );
        Ok(created)
    }
}
