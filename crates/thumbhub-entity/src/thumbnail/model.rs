//! Thumbnail metadata entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use thumbhub_core::types::{PixelsId, ThumbnailId, UserId};

use super::dimensions::Dimensions;

/// Cache descriptor for a compressed thumbnail held in the thumbnail store.
///
/// One row per `(pixels_id, owner_id, size_x, size_y)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ThumbnailMetadata {
    /// Unique thumbnail identifier.
    pub id: ThumbnailId,
    /// The pixel set the thumbnail is derived from.
    pub pixels_id: PixelsId,
    /// The user owning this metadata.
    pub owner_id: UserId,
    /// Thumbnail width.
    pub size_x: i32,
    /// Thumbnail height.
    pub size_y: i32,
    /// MIME type of the stored bytes.
    pub mime_type: String,
    /// When the metadata was last modified.
    pub updated_at: DateTime<Utc>,
}

impl ThumbnailMetadata {
    /// Thumbnail dimensions.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.size_x, self.size_y)
    }

    /// File extension matching the MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        }
    }
}

/// Data required to create a thumbnail metadata row.
///
/// Only the pixel set id is carried; the pixel set itself is not loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewThumbnail {
    /// The pixel set.
    pub pixels_id: PixelsId,
    /// The owner of the new row.
    pub owner_id: UserId,
    /// Thumbnail width.
    pub size_x: i32,
    /// Thumbnail height.
    pub size_y: i32,
    /// MIME type of the bytes that will be stored.
    pub mime_type: String,
}
