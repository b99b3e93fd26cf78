//! Thumbnail metadata domain entities.

pub mod dimensions;
pub mod model;

pub use dimensions::Dimensions;
pub use model::{NewThumbnail, ThumbnailMetadata};
