//! Group domain entities.

pub mod model;
pub mod permissions;

pub use model::Group;
pub use permissions::GroupPermissions;
