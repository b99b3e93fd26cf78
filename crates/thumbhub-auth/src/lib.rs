//! # thumbhub-auth
//!
//! Decides whether the current session may write derived data on behalf of
//! other users. The [`PermissionOracle`] contract is consumed by thumbnail
//! preparation; [`SessionSecurity`] implements it from a loaded session.

pub mod security;

pub use security::{PermissionOracle, SecurityContext, SessionSecurity};
