//! Session-backed permission oracle.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use thumbhub_core::error::AppError;
use thumbhub_core::result::AppResult;
use thumbhub_core::types::{GroupId, ShareId, UserId};
use thumbhub_database::DatabasePool;
use thumbhub_database::repositories::{GroupRepository, UserRepository};
use thumbhub_entity::group::GroupPermissions;
use thumbhub_entity::user::UserRole;

use super::oracle::PermissionOracle;

/// Everything known about a session's security standing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityContext {
    /// The user the session acts as.
    pub user_id: UserId,
    /// The user's system role.
    pub role: UserRole,
    /// The session's current group.
    pub group_id: GroupId,
    /// Permission level of the current group.
    pub group_permissions: GroupPermissions,
    /// Share the session was opened through.
    pub share_id: Option<ShareId>,
    /// Groups the user leads.
    pub led_groups: Vec<GroupId>,
}

/// [`PermissionOracle`] answering from a [`SecurityContext`].
///
/// A session is graph-critical when its group lets members read each other's
/// data and the user has no standing over the group (neither administrator
/// nor group leader): it may see other users' data but must not create data
/// on their behalf.
#[derive(Debug, Clone)]
pub struct SessionSecurity {
    context: SecurityContext,
    led_groups: HashSet<GroupId>,
}

impl SessionSecurity {
    /// Build the oracle from an already resolved context.
    pub fn new(context: SecurityContext) -> Self {
        let led_groups = context.led_groups.iter().copied().collect();
        Self {
            context,
            led_groups,
        }
    }

    /// Resolve the security context of `user_id` from the database.
    ///
    /// Without an explicit `group_id` the user's default group is used.
    pub async fn load(
        db: &DatabasePool,
        user_id: UserId,
        group_id: Option<GroupId>,
        share_id: Option<ShareId>,
    ) -> AppResult<Self> {
        let users = UserRepository::new(db.pool().clone());
        let groups = GroupRepository::new(db.pool().clone());

        let user = users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))?;
        let group_id = group_id.unwrap_or(user.default_group_id);
        let group = groups
            .find_by_id(group_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Group {group_id} not found")))?;
        let led_groups = groups.find_led_group_ids(user_id).await?;

        debug!(
            user_id = %user_id,
            group_id = %group_id,
            permissions = %group.permissions,
            leader = led_groups.contains(&group_id),
            "Loaded session security context"
        );

        Ok(Self::new(SecurityContext {
            user_id,
            role: user.role,
            group_id,
            group_permissions: group.permissions,
            share_id,
            led_groups,
        }))
    }

    /// The underlying context.
    pub fn context(&self) -> &SecurityContext {
        &self.context
    }
}

impl PermissionOracle for SessionSecurity {
    fn is_graph_critical(&self) -> bool {
        if self.is_administrator() || self.led_groups.contains(&self.context.group_id) {
            return false;
        }
        self.context.group_permissions.is_group_readable()
    }

    fn current_group_permissions(&self) -> GroupPermissions {
        self.context.group_permissions
    }

    fn current_share_id(&self) -> Option<ShareId> {
        self.context.share_id
    }

    fn effective_user_id(&self) -> UserId {
        self.context.user_id
    }

    fn is_administrator(&self) -> bool {
        self.context.role.is_admin()
    }

    fn is_group_leader(&self, group_ids: &[GroupId]) -> bool {
        group_ids.iter().any(|id| self.led_groups.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(role: UserRole, permissions: GroupPermissions) -> SecurityContext {
        SecurityContext {
            user_id: UserId::new(),
            role,
            group_id: GroupId::new(),
            group_permissions: permissions,
            share_id: None,
            led_groups: Vec::new(),
        }
    }

    #[test]
    fn test_member_of_readable_group_is_critical() {
        let security = SessionSecurity::new(context(UserRole::User, GroupPermissions::ReadOnly));
        assert!(security.is_graph_critical());

        let security =
            SessionSecurity::new(context(UserRole::User, GroupPermissions::ReadAnnotate));
        assert!(security.is_graph_critical());
    }

    #[test]
    fn test_private_group_is_not_critical() {
        let security = SessionSecurity::new(context(UserRole::User, GroupPermissions::Private));
        assert!(!security.is_graph_critical());
    }

    #[test]
    fn test_admin_and_leader_are_not_critical() {
        let admin = SessionSecurity::new(context(UserRole::Admin, GroupPermissions::ReadOnly));
        assert!(!admin.is_graph_critical());
        assert!(admin.is_administrator());

        let mut ctx = context(UserRole::User, GroupPermissions::ReadOnly);
        ctx.led_groups.push(ctx.group_id);
        let leader = SessionSecurity::new(ctx);
        assert!(!leader.is_graph_critical());
    }

    #[test]
    fn test_group_leader_matches_any_group() {
        let mut ctx = context(UserRole::User, GroupPermissions::ReadOnly);
        let led = GroupId::new();
        ctx.led_groups.push(led);
        let security = SessionSecurity::new(ctx);

        assert!(security.is_group_leader(&[GroupId::new(), led]));
        assert!(!security.is_group_leader(&[GroupId::new()]));
        assert!(!security.is_group_leader(&[]));
    }

    #[test]
    fn test_share_is_reported() {
        let mut ctx = context(UserRole::User, GroupPermissions::Private);
        let share = ShareId::new();
        ctx.share_id = Some(share);
        let security = SessionSecurity::new(ctx);

        assert_eq!(security.current_share_id(), Some(share));
        assert_eq!(
            security.effective_user_id(),
            security.context().user_id
        );
    }
}
