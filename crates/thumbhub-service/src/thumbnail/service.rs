//! Thumbnail retrieval built on the preparation context.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use thumbhub_auth::PermissionOracle;
use thumbhub_core::config::ThumbnailConfig;
use thumbhub_core::error::AppError;
use thumbhub_core::result::AppResult;
use thumbhub_core::types::PixelsId;
use thumbhub_database::ThumbnailPersistence;
use thumbhub_entity::thumbnail::Dimensions;
use thumbhub_storage::ThumbnailStore;

use crate::context::RequestContext;

use super::context::ThumbnailContext;
use super::dimensions;
use super::renderer::ThumbnailRenderer;
use super::settings_factory::RenderingSettingsFactory;

/// Serves thumbnails, from the thumbnail store when the cached bytes are
/// valid and from the renderer otherwise.
#[derive(Clone)]
pub struct ThumbnailService {
    /// Persistence for pixel sets, settings, and metadata.
    persistence: Arc<dyn ThumbnailPersistence>,
    /// Default rendering settings factory.
    factory: Arc<dyn RenderingSettingsFactory>,
    /// Stored thumbnail bytes.
    store: ThumbnailStore,
    /// Rendering engine.
    renderer: Arc<dyn ThumbnailRenderer>,
    /// Preparation limits and defaults.
    config: ThumbnailConfig,
}

impl std::fmt::Debug for ThumbnailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailService")
            .field("store", &self.store)
            .finish()
    }
}

impl ThumbnailService {
    /// Creates a new thumbnail service.
    pub fn new(
        persistence: Arc<dyn ThumbnailPersistence>,
        factory: Arc<dyn RenderingSettingsFactory>,
        store: ThumbnailStore,
        renderer: Arc<dyn ThumbnailRenderer>,
        config: ThumbnailConfig,
    ) -> Self {
        Self {
            persistence,
            factory,
            store,
            renderer,
            config,
        }
    }

    /// A fresh preparation context for `ctx.user_id` under `oracle`.
    pub fn context(
        &self,
        ctx: &RequestContext,
        oracle: Arc<dyn PermissionOracle>,
    ) -> ThumbnailContext {
        ThumbnailContext::new(
            Arc::clone(&self.persistence),
            oracle,
            Arc::clone(&self.factory),
            self.store.clone(),
            self.config.clone(),
            ctx.user_id,
        )
    }

    /// Thumbnails for a batch of pixel sets sized by longest side.
    ///
    /// Pixel sets that fail individually are logged and left out of the
    /// result.
    pub async fn thumbnail_set(
        &self,
        ctx: &RequestContext,
        oracle: Arc<dyn PermissionOracle>,
        longest_side: Option<u32>,
        pixels_ids: &[PixelsId],
    ) -> AppResult<HashMap<PixelsId, Bytes>> {
        let longest_side = longest_side.unwrap_or(self.config.default_longest_side);
        let longest = dimensions::validate_longest_side(longest_side, self.config.max_longest_side)?;

        let mut tc = self.context(ctx, oracle);
        tc.prepare_settings(pixels_ids).await?;
        tc.ensure_settings_exist(pixels_ids).await?;
        tc.prepare_metadata_by_longest_side(pixels_ids, longest_side)
            .await?;

        let mut thumbnails = HashMap::with_capacity(pixels_ids.len());
        for &pixels_id in pixels_ids {
            if thumbnails.contains_key(&pixels_id) {
                continue;
            }
            let Some(pixels) = tc.pixels(pixels_id) else {
                continue;
            };
            let size = dimensions::calculate_xy_widths(pixels, longest);
            match self.produce(&tc, pixels_id, size).await {
                Ok(Some(bytes)) => {
                    thumbnails.insert(pixels_id, bytes);
                }
                Ok(None) => {}
                Err(e) => warn!(pixels_id = %pixels_id, error = %e, "Thumbnail failed"),
            }
        }

        debug!(
            user_id = %ctx.user_id,
            session_id = %ctx.session_id,
            requested = pixels_ids.len(),
            served = thumbnails.len(),
            "Served thumbnail set"
        );
        Ok(thumbnails)
    }

    /// Thumbnail of one pixel set at fixed dimensions.
    pub async fn thumbnail(
        &self,
        ctx: &RequestContext,
        oracle: Arc<dyn PermissionOracle>,
        pixels_id: PixelsId,
        size: Dimensions,
    ) -> AppResult<Bytes> {
        let mut tc = self.context(ctx, oracle);
        tc.prepare_settings(&[pixels_id]).await?;
        tc.ensure_settings_exist(&[pixels_id]).await?;
        tc.prepare_metadata(&[pixels_id], size, true).await?;

        self.produce(&tc, pixels_id, size).await?.ok_or_else(|| {
            AppError::resource(format!("No rendering settings for pixel set {pixels_id}"))
        })
    }

    /// Bytes for one prepared pixel set; `None` when it has no settings.
    async fn produce(
        &self,
        tc: &ThumbnailContext,
        pixels_id: PixelsId,
        size: Dimensions,
    ) -> AppResult<Option<Bytes>> {
        let (Some(pixels), Some(settings)) = (tc.pixels(pixels_id), tc.settings(pixels_id)) else {
            warn!(pixels_id = %pixels_id, "Skipping thumbnail: no rendering settings");
            return Ok(None);
        };

        let metadata = match tc.metadata(pixels_id) {
            Ok(metadata) => metadata,
            Err(e) if e.is_no_thumbnail() => {
                debug!(pixels_id = %pixels_id, "No thumbnail metadata, rendering directly");
                return self.renderer.render(pixels, settings, size).await.map(Some);
            }
            Err(e) => return Err(e),
        };

        if tc.is_thumbnail_cached(pixels_id).await? {
            return self.store.read(metadata).await.map(Some);
        }

        let bytes = self
            .renderer
            .render(pixels, settings, metadata.dimensions())
            .await?;
        if !tc.is_extended_critical(&[pixels_id]) {
            self.store.write(metadata, bytes.clone()).await?;
            self.persistence.touch_metadata(metadata.id).await?;
        }
        Ok(Some(bytes))
    }
}
