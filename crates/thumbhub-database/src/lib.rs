//! # thumbhub-database
//!
//! The persistence contract used by thumbnail preparation, its PostgreSQL
//! implementation built on per-entity repositories, and an in-memory
//! implementation for single-node use and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod persistence;
pub mod repositories;

pub use connection::DatabasePool;
pub use memory::MemoryThumbnailPersistence;
pub use persistence::{PgThumbnailPersistence, ThumbnailPersistence};
