//! Pixel set entity model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use thumbhub_core::types::{GroupId, ImageId, PixelsId, UserId};

/// Raster descriptor of a source image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Pixels {
    /// Unique pixel set identifier.
    pub id: PixelsId,
    /// The image this pixel set belongs to.
    pub image_id: ImageId,
    /// The user owning the pixel set.
    pub owner_id: UserId,
    /// The group the pixel set lives in.
    pub group_id: GroupId,
    /// Width in pixels.
    pub size_x: i32,
    /// Height in pixels.
    pub size_y: i32,
    /// Number of z-sections.
    pub size_z: i32,
    /// Number of channels.
    pub size_c: i32,
    /// Number of timepoints.
    pub size_t: i32,
}

impl Pixels {
    /// Whether the raster has a usable, non-empty plane.
    pub fn has_plane(&self) -> bool {
        self.size_x > 0 && self.size_y > 0
    }
}
