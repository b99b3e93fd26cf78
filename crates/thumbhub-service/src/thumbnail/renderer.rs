//! Rendering engine contract.

use async_trait::async_trait;
use bytes::Bytes;

use thumbhub_core::result::AppResult;
use thumbhub_entity::pixels::Pixels;
use thumbhub_entity::rendering::RenderingSettings;
use thumbhub_entity::thumbnail::Dimensions;

/// Produces compressed thumbnail bytes from a pixel set and its settings.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync + 'static {
    /// Render `pixels` with `settings` at exactly `dimensions`.
    async fn render(
        &self,
        pixels: &Pixels,
        settings: &RenderingSettings,
        dimensions: Dimensions,
    ) -> AppResult<Bytes>;
}
