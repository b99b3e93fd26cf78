//! Per-request thumbnail preparation context.
//!
//! A [`ThumbnailContext`] is created for one request with a target user,
//! populated by one or more preparation calls, read by the caller, and then
//! dropped. It holds no locks and shares no state across requests: whether a
//! cached thumbnail is still valid is decided purely from the persisted
//! rendering-settings and metadata timestamps.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use thumbhub_auth::PermissionOracle;
use thumbhub_core::config::ThumbnailConfig;
use thumbhub_core::error::AppError;
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{ImageId, PixelsId, RenderingSettingsId, UserId};
use thumbhub_database::ThumbnailPersistence;
use thumbhub_entity::OwnerSelector;
use thumbhub_entity::pixels::Pixels;
use thumbhub_entity::rendering::RenderingSettings;
use thumbhub_entity::thumbnail::{Dimensions, NewThumbnail, ThumbnailMetadata};
use thumbhub_storage::ThumbnailStore;

use super::cache_policy::{self, CacheFacts, CacheVerdict};
use super::criticality;
use super::dimensions::{self, DimensionPools};
use super::settings_factory::RenderingSettingsFactory;

/// A pixel set together with the rendering settings chosen for it.
#[derive(Debug, Clone)]
struct PreparedPixels {
    pixels: Pixels,
    settings: Option<RenderingSettings>,
}

/// Batch preparation of rendering settings and thumbnail metadata for one
/// request.
///
/// Settings and metadata are looked up for the target user first. When the
/// session may not write on behalf of a pixel set's owner, the owner's
/// records are used instead and nothing new is created.
pub struct ThumbnailContext {
    persistence: Arc<dyn ThumbnailPersistence>,
    oracle: Arc<dyn PermissionOracle>,
    factory: Arc<dyn RenderingSettingsFactory>,
    store: ThumbnailStore,
    config: ThumbnailConfig,
    target_user: UserId,
    prepared: HashMap<PixelsId, PreparedPixels>,
    metadata: HashMap<PixelsId, ThumbnailMetadata>,
}

impl std::fmt::Debug for ThumbnailContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailContext")
            .field("target_user", &self.target_user)
            .field("pixels", &self.prepared.len())
            .field("metadata", &self.metadata.len())
            .finish()
    }
}

impl ThumbnailContext {
    /// Create an empty context preparing thumbnails for `target_user`.
    pub fn new(
        persistence: Arc<dyn ThumbnailPersistence>,
        oracle: Arc<dyn PermissionOracle>,
        factory: Arc<dyn RenderingSettingsFactory>,
        store: ThumbnailStore,
        config: ThumbnailConfig,
        target_user: UserId,
    ) -> Self {
        Self {
            persistence,
            oracle,
            factory,
            store,
            config,
            target_user,
            prepared: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Change the user thumbnails are prepared for.
    ///
    /// Settings and metadata chosen for the previous user are forgotten;
    /// loaded pixel sets are kept.
    pub fn set_target_user(&mut self, user_id: UserId) {
        if user_id == self.target_user {
            return;
        }
        debug!(from = %self.target_user, to = %user_id, "Switching thumbnail target user");
        self.target_user = user_id;
        for entry in self.prepared.values_mut() {
            entry.settings = None;
        }
        self.metadata.clear();
    }

    /// The user thumbnails are prepared for.
    pub fn target_user(&self) -> UserId {
        self.target_user
    }

    // ── Rendering settings ──────────────────────────────────────────

    /// Prepare rendering settings for a batch of pixel sets.
    ///
    /// Pixel sets without settings after this call are not an error; see
    /// [`ensure_settings_exist`](Self::ensure_settings_exist).
    pub async fn prepare_settings(&mut self, pixels_ids: &[PixelsId]) -> AppResult<()> {
        let ids = unique(pixels_ids);
        if ids.is_empty() {
            debug!("No pixel sets to prepare rendering settings for");
            return Ok(());
        }

        self.load_pixels(&ids).await?;

        let owned = self
            .persistence
            .find_settings(OwnerSelector::User(self.target_user), &ids)
            .await?;
        debug!(
            requested = ids.len(),
            found = owned.len(),
            owner_id = %self.target_user,
            "Loaded rendering settings"
        );
        self.record_settings(owned);

        let missing = self.pixels_ids_without_settings(&ids);
        if !missing.is_empty() && self.is_extended_critical(&missing) {
            let fallback = self
                .persistence
                .find_settings(OwnerSelector::PixelsOwner, &missing)
                .await?;
            debug!(
                missing = missing.len(),
                found = fallback.len(),
                "Using pixel set owners' rendering settings"
            );
            self.record_settings(fallback);
        }
        Ok(())
    }

    /// Prepare rendering settings for every pixel set of the given images.
    ///
    /// Returns the pixel sets the images resolved to.
    pub async fn prepare_settings_by_image_ids(
        &mut self,
        image_ids: &[ImageId],
    ) -> AppResult<Vec<PixelsId>> {
        if image_ids.is_empty() {
            debug!("No images to prepare rendering settings for");
            return Ok(Vec::new());
        }

        let pixels = self.persistence.find_pixels_by_images(image_ids).await?;
        let ids: Vec<PixelsId> = pixels.iter().map(|p| p.id).collect();
        for p in pixels {
            self.insert_pixels(p);
        }
        self.prepare_settings(&ids).await?;
        Ok(ids)
    }

    /// Attach one explicit rendering settings record to a pixel set.
    pub async fn prepare_settings_explicit(
        &mut self,
        pixels_id: PixelsId,
        settings_id: RenderingSettingsId,
    ) -> AppResult<()> {
        let settings = self
            .persistence
            .find_settings_by_id(settings_id)
            .await?
            .ok_or_else(|| {
                AppError::resource(format!("Rendering settings {settings_id} not found"))
            })?;
        if settings.pixels_id != pixels_id {
            return Err(AppError::validation(format!(
                "Rendering settings {settings_id} belong to pixel set {}, not {pixels_id}",
                settings.pixels_id
            )));
        }

        self.load_pixels(&[pixels_id]).await?;
        self.record_settings(vec![settings]);
        Ok(())
    }

    /// Create default settings for pixel sets that have none.
    ///
    /// Nothing is created when the session may not write for those pixel
    /// sets. Returns the pixel sets that gained settings.
    pub async fn ensure_settings_exist(
        &mut self,
        pixels_ids: &[PixelsId],
    ) -> AppResult<Vec<PixelsId>> {
        let ids = unique(pixels_ids);
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.load_pixels(&ids).await?;

        let missing = self.pixels_ids_without_settings(&ids);
        if missing.is_empty() {
            return Ok(Vec::new());
        }
        if self.is_extended_critical(&missing) {
            warn!(
                count = missing.len(),
                "Not creating rendering settings: session may not write for these pixel sets"
            );
            return Ok(Vec::new());
        }

        let pixels: Vec<Pixels> = missing
            .iter()
            .filter_map(|id| self.prepared.get(id))
            .map(|entry| entry.pixels.clone())
            .collect();
        let created = self
            .factory
            .reset_default_settings(self.target_user, &pixels)
            .await?;
        if created.len() < missing.len() {
            debug!(
                created = created.len(),
                missing = missing.len(),
                "Some rendering settings already existed, re-reading"
            );
        }

        // Rows skipped on conflict were written by someone else; the re-read decides.
        self.prepare_settings(&missing).await?;
        Ok(missing
            .into_iter()
            .filter(|id| self.has_settings(*id))
            .collect())
    }

    // ── Thumbnail metadata ──────────────────────────────────────────

    /// Prepare metadata sized by longest side, creating missing rows when the
    /// session may write them.
    pub async fn prepare_metadata_by_longest_side(
        &mut self,
        pixels_ids: &[PixelsId],
        longest_side: u32,
    ) -> AppResult<()> {
        let longest = dimensions::validate_longest_side(longest_side, self.config.max_longest_side)?;
        let ids = unique(pixels_ids);
        if ids.is_empty() {
            debug!("No pixel sets to prepare thumbnail metadata for");
            return Ok(());
        }
        self.load_pixels(&ids).await?;

        let pools = dimensions::pool_by(self.loaded(&ids), |p| {
            dimensions::calculate_xy_widths(p, longest)
        });
        self.prepare_pools(pools, true).await
    }

    /// Prepare metadata at fixed dimensions.
    ///
    /// With `create_missing` unset, absent rows are left unprepared even
    /// when the session could write them.
    pub async fn prepare_metadata(
        &mut self,
        pixels_ids: &[PixelsId],
        size: Dimensions,
        create_missing: bool,
    ) -> AppResult<()> {
        let ids = unique(pixels_ids);
        if ids.is_empty() {
            debug!("No pixel sets to prepare thumbnail metadata for");
            return Ok(());
        }
        self.load_pixels(&ids).await?;

        for p in self.loaded(&ids) {
            dimensions::validate_fixed(p, size)?;
        }

        let pools = dimensions::pool_by(self.loaded(&ids), |_| size);
        self.prepare_pools(pools, create_missing).await
    }

    /// Dimension pools a longest-side request for loaded pixel sets would use.
    pub fn dimension_pools(
        &self,
        pixels_ids: &[PixelsId],
        longest_side: u32,
    ) -> AppResult<DimensionPools> {
        let longest = dimensions::validate_longest_side(longest_side, self.config.max_longest_side)?;
        Ok(dimensions::pool_by(self.loaded(pixels_ids), |p| {
            dimensions::calculate_xy_widths(p, longest)
        }))
    }

    async fn prepare_pools(&mut self, pools: DimensionPools, create_missing: bool) -> AppResult<()> {
        for (size, ids) in pools {
            let owned = self
                .persistence
                .find_metadata(OwnerSelector::User(self.target_user), size, &ids)
                .await?;
            debug!(
                width = size.width,
                height = size.height,
                requested = ids.len(),
                found = owned.len(),
                "Loaded thumbnail metadata pool"
            );
            self.record_metadata(owned);

            let missing = self.missing_metadata(size, &ids);
            if missing.is_empty() {
                continue;
            }
            for id in &missing {
                self.metadata.remove(id);
            }

            if self.is_extended_critical(&missing) {
                let fallback = self
                    .persistence
                    .find_metadata(OwnerSelector::PixelsOwner, size, &missing)
                    .await?;
                debug!(
                    width = size.width,
                    height = size.height,
                    missing = missing.len(),
                    found = fallback.len(),
                    "Using pixel set owners' thumbnail metadata"
                );
                self.record_metadata(fallback);
                continue;
            }
            if !create_missing {
                continue;
            }

            let rows: Vec<NewThumbnail> = missing
                .iter()
                .map(|&pixels_id| NewThumbnail {
                    pixels_id,
                    owner_id: self.target_user,
                    size_x: size.width,
                    size_y: size.height,
                    mime_type: self.config.default_mime_type.clone(),
                })
                .collect();
            let created = self.persistence.insert_metadata(&rows).await?;
            info!(
                width = size.width,
                height = size.height,
                requested = rows.len(),
                created = created.len(),
                owner_id = %self.target_user,
                "Created thumbnail metadata"
            );

            // Rows lost to a concurrent insert are picked up here as well.
            let fresh = self
                .persistence
                .find_metadata(OwnerSelector::User(self.target_user), size, &missing)
                .await?;
            self.record_metadata(fresh);
        }
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Whether rendering settings are prepared for the pixel set.
    pub fn has_settings(&self, pixels_id: PixelsId) -> bool {
        self.settings(pixels_id).is_some()
    }

    /// Whether thumbnail metadata is prepared for the pixel set.
    pub fn has_metadata(&self, pixels_id: PixelsId) -> bool {
        self.metadata.contains_key(&pixels_id)
    }

    /// The loaded pixel set.
    pub fn pixels(&self, pixels_id: PixelsId) -> Option<&Pixels> {
        self.prepared.get(&pixels_id).map(|entry| &entry.pixels)
    }

    /// The rendering settings chosen for the pixel set.
    pub fn settings(&self, pixels_id: PixelsId) -> Option<&RenderingSettings> {
        self.prepared
            .get(&pixels_id)
            .and_then(|entry| entry.settings.as_ref())
    }

    /// The prepared thumbnail metadata.
    ///
    /// Fails with `NoThumbnail` when none is prepared; the caller should
    /// render directly without caching.
    pub fn metadata(&self, pixels_id: PixelsId) -> AppResult<&ThumbnailMetadata> {
        self.metadata.get(&pixels_id).ok_or_else(|| {
            AppError::no_thumbnail(format!("No thumbnail metadata for pixel set {pixels_id}"))
        })
    }

    /// When the chosen rendering settings were last modified.
    pub fn settings_last_modified(&self, pixels_id: PixelsId) -> Option<DateTime<Utc>> {
        self.settings(pixels_id).map(|s| s.updated_at)
    }

    /// When the prepared thumbnail metadata was last modified.
    pub fn metadata_last_modified(&self, pixels_id: PixelsId) -> Option<DateTime<Utc>> {
        self.metadata.get(&pixels_id).map(|m| m.updated_at)
    }

    /// Whether the prepared thumbnail may be stale.
    ///
    /// True when there is no metadata, no settings, or the settings were
    /// modified after the metadata.
    pub fn is_dirty(&self, pixels_id: PixelsId) -> bool {
        match (
            self.metadata_last_modified(pixels_id),
            self.settings_last_modified(pixels_id),
        ) {
            (Some(metadata), Some(settings)) => settings > metadata,
            _ => true,
        }
    }

    /// Whether the stored bytes of the prepared thumbnail may be served.
    ///
    /// Fails with `Resource` when the metadata promises bytes that do not
    /// exist and the session may not produce them.
    pub async fn is_thumbnail_cached(&self, pixels_id: PixelsId) -> AppResult<bool> {
        let Some(metadata) = self.metadata.get(&pixels_id) else {
            return Ok(false);
        };

        let session_user = self.oracle.effective_user_id();
        let facts = CacheFacts {
            dirty: self.is_dirty(pixels_id),
            exists_on_disk: self.store.thumbnail_exists(metadata).await?,
            critical: self.is_extended_critical(&[pixels_id]),
            is_mine: metadata.owner_id == session_user,
            session_is_target: session_user == self.target_user,
            target_is_owner: self.target_user == metadata.owner_id,
        };

        match cache_policy::decide(&facts) {
            CacheVerdict::Fresh => Ok(true),
            CacheVerdict::StaleAccepted => {
                warn!(
                    pixels_id = %pixels_id,
                    thumbnail_id = %metadata.id,
                    owner_id = %metadata.owner_id,
                    "Serving stale thumbnail; session cannot regenerate it"
                );
                Ok(true)
            }
            CacheVerdict::Regenerate => Ok(false),
            CacheVerdict::Unwritable => Err(AppError::resource(format!(
                "Thumbnail {} for pixel set {pixels_id} has no bytes and the session may not create them",
                metadata.id
            ))),
        }
    }

    /// Whether the session must not write data for any of the pixel sets.
    ///
    /// Pixel sets not loaded in this context are ignored.
    pub fn is_extended_critical(&self, pixels_ids: &[PixelsId]) -> bool {
        criticality::is_extended_critical(self.oracle.as_ref(), self.loaded(pixels_ids))
    }

    /// Requested pixel sets that have no rendering settings.
    pub fn pixels_ids_without_settings(&self, pixels_ids: &[PixelsId]) -> Vec<PixelsId> {
        unique(pixels_ids)
            .into_iter()
            .filter(|id| !self.has_settings(*id))
            .collect()
    }

    /// Requested pixel sets that have no thumbnail metadata.
    pub fn pixels_ids_without_metadata(&self, pixels_ids: &[PixelsId]) -> Vec<PixelsId> {
        unique(pixels_ids)
            .into_iter()
            .filter(|id| !self.has_metadata(*id))
            .collect()
    }

    // ── State ───────────────────────────────────────────────────────

    /// Load pixel sets not yet in the context.
    ///
    /// Resolved pixel sets are kept even when others fail to resolve.
    async fn load_pixels(&mut self, ids: &[PixelsId]) -> AppResult<()> {
        let unknown: Vec<PixelsId> = ids
            .iter()
            .copied()
            .filter(|id| !self.prepared.contains_key(id))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }

        for p in self.persistence.find_pixels(&unknown).await? {
            self.insert_pixels(p);
        }

        let unresolved: Vec<String> = unknown
            .iter()
            .filter(|id| !self.prepared.contains_key(id))
            .map(ToString::to_string)
            .collect();
        if unresolved.is_empty() {
            Ok(())
        } else {
            Err(AppError::resource(format!(
                "Pixel sets not found: {}",
                unresolved.join(", ")
            )))
        }
    }

    fn insert_pixels(&mut self, pixels: Pixels) {
        self.prepared
            .entry(pixels.id)
            .or_insert(PreparedPixels {
                pixels,
                settings: None,
            });
    }

    fn loaded<'a>(&'a self, ids: &'a [PixelsId]) -> impl Iterator<Item = &'a Pixels> + 'a {
        ids.iter()
            .filter_map(|id| self.prepared.get(id))
            .map(|entry| &entry.pixels)
    }

    fn record_settings(&mut self, rows: Vec<RenderingSettings>) {
        for settings in rows {
            match self.prepared.get_mut(&settings.pixels_id) {
                Some(entry) => entry.settings = Some(settings),
                None => debug!(
                    pixels_id = %settings.pixels_id,
                    "Ignoring rendering settings for a pixel set not in context"
                ),
            }
        }
    }

    fn record_metadata(&mut self, rows: Vec<ThumbnailMetadata>) {
        for metadata in rows {
            self.metadata.insert(metadata.pixels_id, metadata);
        }
    }

    /// Ids of `ids` without metadata of exactly `size`.
    fn missing_metadata(&self, size: Dimensions, ids: &[PixelsId]) -> Vec<PixelsId> {
        ids.iter()
            .copied()
            .filter(|id| {
                self.metadata
                    .get(id)
                    .is_none_or(|m| m.dimensions() != size)
            })
            .collect()
    }
}

/// Deduplicate ids, keeping first-seen order.
fn unique(ids: &[PixelsId]) -> Vec<PixelsId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_keeps_order() {
        let a = PixelsId::new();
        let b = PixelsId::new();
        assert_eq!(unique(&[a, b, a, b, a]), vec![a, b]);
        assert!(unique(&[]).is_empty());
    }
}
