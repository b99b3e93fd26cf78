//! Ownership selector shared by every bulk query.

use serde::{Deserialize, Serialize};

use thumbhub_core::types::UserId;

/// Whose rows a bulk query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "user_id")]
pub enum OwnerSelector {
    /// Rows owned by this user.
    User(UserId),
    /// For each pixel set, rows owned by the pixel set's own owner.
    PixelsOwner,
}

impl OwnerSelector {
    /// Return the explicit owner, if any.
    pub fn user(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::PixelsOwner => None,
        }
    }
}
