//! Group repository implementation.

use sqlx::PgPool;

use thumbhub_core::error::{AppError, ErrorKind};
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{GroupId, UserId};
use thumbhub_entity::group::Group;

/// Repository for groups and group leadership.
#[derive(Debug, Clone)]
pub struct GroupRepository {
    pool: PgPool,
}

impl GroupRepository {
    /// Create a new group repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: GroupId) -> AppResult<Option<Group>> {
        sqlx::query_as::<_, Group>("SELECT * FROM groups WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find group", e))
    }

    /// IDs of every group the user leads.
    pub async fn find_led_group_ids(&self, user_id: UserId) -> AppResult<Vec<GroupId>> {
        sqlx::query_scalar::<_, GroupId>("SELECT group_id FROM group_leaders WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to load group leadership", e)
            })
    }
}
