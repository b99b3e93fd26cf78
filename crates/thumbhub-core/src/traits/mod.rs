//! Core traits defined in `thumbhub-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageProvider;
