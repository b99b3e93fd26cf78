//! Group entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use thumbhub_core::types::GroupId;

use super::permissions::GroupPermissions;

/// A collaboration group data is owned within.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Group {
    /// Unique group identifier.
    pub id: GroupId,
    /// Group name.
    pub name: String,
    /// Permission level applied to data in the group.
    pub permissions: GroupPermissions,
    /// When the group was created.
    pub created_at: DateTime<Utc>,
}
