//! Shared fixtures for thumbnail preparation tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{Duration, Utc};
use tempfile::TempDir;

use thumbhub_auth::{PermissionOracle, SecurityContext, SessionSecurity};
use thumbhub_core::config::ThumbnailConfig;
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{GroupId, ImageId, PixelsId, RenderingSettingsId, ShareId, UserId};
use thumbhub_database::MemoryThumbnailPersistence;
use thumbhub_entity::group::GroupPermissions;
use thumbhub_entity::pixels::Pixels;
use thumbhub_entity::rendering::{RenderingModel, RenderingSettings};
use thumbhub_entity::thumbnail::{Dimensions, ThumbnailMetadata};
use thumbhub_entity::user::UserRole;
use thumbhub_service::thumbnail::{
    PersistedSettingsFactory, ThumbnailContext, ThumbnailRenderer, ThumbnailService,
};
use thumbhub_storage::{LocalStorageProvider, ThumbnailStore};

/// In-memory persistence plus a thumbnail store in a temporary directory.
pub struct Fixture {
    pub persistence: MemoryThumbnailPersistence,
    pub store: ThumbnailStore,
    pub config: ThumbnailConfig,
    _dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let provider = LocalStorageProvider::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        Self {
            persistence: MemoryThumbnailPersistence::new(),
            store: ThumbnailStore::new(Arc::new(provider), "thumbnails"),
            config: ThumbnailConfig::default(),
            _dir: dir,
        }
    }

    /// A context for `target` under the given session.
    pub fn context(&self, session: &Arc<SessionSecurity>, target: UserId) -> ThumbnailContext {
        let persistence = Arc::new(self.persistence.clone());
        ThumbnailContext::new(
            persistence.clone(),
            session.clone() as Arc<dyn PermissionOracle>,
            Arc::new(PersistedSettingsFactory::new(persistence)),
            self.store.clone(),
            self.config.clone(),
            target,
        )
    }

    /// A thumbnail service rendering through `renderer`.
    pub fn service(&self, renderer: Arc<CountingRenderer>) -> ThumbnailService {
        let persistence = Arc::new(self.persistence.clone());
        ThumbnailService::new(
            persistence.clone(),
            Arc::new(PersistedSettingsFactory::new(persistence)),
            self.store.clone(),
            renderer,
            self.config.clone(),
        )
    }

    /// Register a pixel set.
    pub async fn pixels(&self, owner_id: UserId, group_id: GroupId, size_x: i32, size_y: i32) -> Pixels {
        let pixels = Pixels {
            id: PixelsId::new(),
            image_id: ImageId::new(),
            owner_id,
            group_id,
            size_x,
            size_y,
            size_z: 5,
            size_c: 1,
            size_t: 1,
        };
        self.persistence.add_pixels(pixels.clone()).await;
        pixels
    }

    /// Register rendering settings modified an hour ago.
    pub async fn settings(&self, pixels: &Pixels, owner_id: UserId) -> RenderingSettings {
        let settings = RenderingSettings {
            id: RenderingSettingsId::new(),
            pixels_id: pixels.id,
            owner_id,
            model: RenderingModel::Greyscale,
            default_z: 2,
            default_t: 0,
            updated_at: Utc::now() - Duration::hours(1),
        };
        self.persistence.add_settings(settings.clone()).await;
        settings
    }

    /// Store thumbnail bytes for metadata.
    pub async fn write_bytes(&self, metadata: &ThumbnailMetadata) {
        self.store
            .write(metadata, Bytes::from_static(b"\xff\xd8\xff\xe0"))
            .await
            .unwrap();
    }

    /// Move a settings record's modification time past the metadata's.
    pub async fn modify_settings_after(&self, settings: &RenderingSettings, metadata: &ThumbnailMetadata) {
        let at = metadata.updated_at + Duration::seconds(1);
        assert!(self.persistence.touch_settings(settings.id, at).await);
    }

    /// Metadata rows owned by `owner_id`.
    pub async fn metadata_owned_by(&self, owner_id: UserId) -> Vec<ThumbnailMetadata> {
        self.persistence
            .metadata_rows()
            .await
            .into_iter()
            .filter(|m| m.owner_id == owner_id)
            .collect()
    }
}

/// A regular user working in `group_id`.
pub fn member(user_id: UserId, group_id: GroupId, permissions: GroupPermissions) -> Arc<SessionSecurity> {
    Arc::new(SessionSecurity::new(SecurityContext {
        user_id,
        role: UserRole::User,
        group_id,
        group_permissions: permissions,
        share_id: None,
        led_groups: Vec::new(),
    }))
}

/// The leader of `group_id`.
pub fn leader(user_id: UserId, group_id: GroupId, permissions: GroupPermissions) -> Arc<SessionSecurity> {
    Arc::new(SessionSecurity::new(SecurityContext {
        user_id,
        role: UserRole::User,
        group_id,
        group_permissions: permissions,
        share_id: None,
        led_groups: vec![group_id],
    }))
}

/// A member session opened through a share.
pub fn shared(user_id: UserId, group_id: GroupId) -> Arc<SessionSecurity> {
    Arc::new(SessionSecurity::new(SecurityContext {
        user_id,
        role: UserRole::User,
        group_id,
        group_permissions: GroupPermissions::Private,
        share_id: Some(ShareId::new()),
        led_groups: Vec::new(),
    }))
}

/// Renderer producing a fixed payload and counting calls.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    calls: AtomicUsize,
}

impl CountingRenderer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThumbnailRenderer for CountingRenderer {
    async fn render(
        &self,
        _pixels: &Pixels,
        _settings: &RenderingSettings,
        dimensions: Dimensions,
    ) -> AppResult<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(format!("thumbnail {dimensions}")))
    }
}
