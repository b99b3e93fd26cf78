//! Thumbnail preparation configuration.

use serde::{Deserialize, Serialize};

/// Limits and defaults applied while preparing thumbnail metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailConfig {
    /// Longest side used when a caller does not request one.
    #[serde(default = "default_longest_side")]
    pub default_longest_side: u32,
    /// Largest longest side a caller may request.
    #[serde(default = "default_max_longest_side")]
    pub max_longest_side: u32,
    /// MIME type recorded on newly created thumbnail metadata.
    #[serde(default = "default_mime_type")]
    pub default_mime_type: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            default_longest_side: default_longest_side(),
            max_longest_side: default_max_longest_side(),
            default_mime_type: default_mime_type(),
        }
    }
}

fn default_longest_side() -> u32 {
    96
}

fn default_max_longest_side() -> u32 {
    1024
}

fn default_mime_type() -> String {
    "image/jpeg".to_string()
}
