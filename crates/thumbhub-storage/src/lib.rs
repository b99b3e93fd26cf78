//! # thumbhub-storage
//!
//! Storage provider implementations and the disk thumbnail store that maps
//! thumbnail metadata records to their compressed bytes.

pub mod providers;
pub mod thumbnail;

pub use providers::LocalStorageProvider;
pub use thumbnail::ThumbnailStore;
