//! Thumbnail byte storage configuration.

use serde::{Deserialize, Serialize};

/// Where compressed thumbnail bytes live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the local storage provider.
    #[serde(default = "default_root")]
    pub root: String,
    /// Directory (relative to `root`) holding thumbnail bytes.
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            thumbnail_dir: default_thumbnail_dir(),
        }
    }
}

fn default_root() -> String {
    "./data/storage".to_string()
}

fn default_thumbnail_dir() -> String {
    "thumbnails".to_string()
}
