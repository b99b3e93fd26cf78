//! # thumbhub-service
//!
//! Thumbnail preparation for ThumbHub. The [`ThumbnailContext`] is a
//! short-lived, per-request object that batches rendering-settings and
//! thumbnail-metadata preparation for many pixel sets at once, decides
//! whether cached bytes may be served, and falls back to the pixel set
//! owner's records when the session may not write its own.
//!
//! Collaborators are injected at construction time via `Arc` references.

pub mod context;
pub mod thumbnail;

pub use context::RequestContext;
pub use thumbnail::{
    CacheFacts, CacheVerdict, PersistedSettingsFactory, RenderingSettingsFactory,
    ThumbnailContext, ThumbnailRenderer, ThumbnailService,
};
