//! Rendering settings entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use thumbhub_core::types::{PixelsId, RenderingSettingsId, UserId};

use crate::pixels::Pixels;

/// Colour model a rendering settings record renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rendering_model", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RenderingModel {
    /// Single-channel greyscale.
    Greyscale,
    /// Additive RGB over all active channels.
    Rgb,
}

/// One user's visualization configuration for a pixel set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RenderingSettings {
    /// Unique settings identifier.
    pub id: RenderingSettingsId,
    /// The pixel set these settings apply to.
    pub pixels_id: PixelsId,
    /// The user owning these settings.
    pub owner_id: UserId,
    /// Colour model.
    pub model: RenderingModel,
    /// Default z-section.
    pub default_z: i32,
    /// Default timepoint.
    pub default_t: i32,
    /// When the settings were last modified.
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a new rendering settings record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRenderingSettings {
    /// The pixel set.
    pub pixels_id: PixelsId,
    /// The owner.
    pub owner_id: UserId,
    /// Colour model.
    pub model: RenderingModel,
    /// Default z-section.
    pub default_z: i32,
    /// Default timepoint.
    pub default_t: i32,
}

impl NewRenderingSettings {
    /// Default settings for a pixel set: middle z-section, first timepoint,
    /// RGB when there is more than one channel.
    pub fn defaults_for(pixels: &Pixels, owner_id: UserId) -> Self {
        let model = if pixels.size_c > 1 {
            RenderingModel::Rgb
        } else {
            RenderingModel::Greyscale
        };
        Self {
            pixels_id: pixels.id,
            owner_id,
            model,
            default_z: (pixels.size_z / 2).max(0),
            default_t: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thumbhub_core::types::{GroupId, ImageId};

    fn pixels(size_z: i32, size_c: i32) -> Pixels {
        Pixels {
            id: PixelsId::new(),
            image_id: ImageId::new(),
            owner_id: UserId::new(),
            group_id: GroupId::new(),
            size_x: 512,
            size_y: 512,
            size_z,
            size_c,
            size_t: 1,
        }
    }

    #[test]
    fn test_defaults_pick_middle_section() {
        let p = pixels(9, 1);
        let owner = UserId::new();
        let settings = NewRenderingSettings::defaults_for(&p, owner);
        assert_eq!(settings.default_z, 4);
        assert_eq!(settings.default_t, 0);
        assert_eq!(settings.owner_id, owner);
        assert_eq!(settings.model, RenderingModel::Greyscale);
    }

    #[test]
    fn test_defaults_use_rgb_for_multichannel() {
        let settings = NewRenderingSettings::defaults_for(&pixels(1, 3), UserId::new());
        assert_eq!(settings.model, RenderingModel::Rgb);
        assert_eq!(settings.default_z, 0);
    }
}
