//! Thumbnail preparation: dimension pooling, cache validity, permission
//! fallback, and the per-request [`ThumbnailContext`].

pub mod cache_policy;
pub mod context;
pub mod criticality;
pub mod dimensions;
pub mod renderer;
pub mod service;
pub mod settings_factory;

pub use cache_policy::{CacheFacts, CacheVerdict};
pub use context::ThumbnailContext;
pub use dimensions::{DimensionPools, calculate_xy_widths};
pub use renderer::ThumbnailRenderer;
pub use service::ThumbnailService;
pub use settings_factory::{PersistedSettingsFactory, RenderingSettingsFactory};
