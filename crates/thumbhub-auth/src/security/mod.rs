//! Session security: the permission oracle and its session-backed implementation.

pub mod oracle;
pub mod session;

pub use oracle::PermissionOracle;
pub use session::{SecurityContext, SessionSecurity};
