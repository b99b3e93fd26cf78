//! # thumbhub-entity
//!
//! Domain entity models for ThumbHub. Every struct in this crate represents
//! a database table row or a domain value object. Row structs derive
//! `sqlx::FromRow`; identifiers are the typed ids from `thumbhub-core`.

pub mod group;
pub mod ownership;
pub mod pixels;
pub mod rendering;
pub mod thumbnail;
pub mod user;

pub use ownership::OwnerSelector;
