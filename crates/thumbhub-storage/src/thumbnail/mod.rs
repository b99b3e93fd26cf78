//! Disk-backed thumbnail byte storage.

pub mod store;

pub use store::ThumbnailStore;
