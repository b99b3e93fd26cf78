//! Permission oracle contract.

use std::fmt;

use thumbhub_core::types::{GroupId, ShareId, UserId};
use thumbhub_entity::group::GroupPermissions;

/// Answers permission questions about the current session.
///
/// All answers are fixed for the lifetime of a session, so the methods are
/// synchronous and never touch persistence.
pub trait PermissionOracle: Send + Sync + fmt::Debug + 'static {
    /// Whether the session is write-restricted for data owned by others.
    fn is_graph_critical(&self) -> bool;

    /// Permission level of the session's current group.
    fn current_group_permissions(&self) -> GroupPermissions;

    /// Share the session was opened through, if any.
    fn current_share_id(&self) -> Option<ShareId>;

    /// The user the session acts as.
    fn effective_user_id(&self) -> UserId;

    /// Whether the session user is a system administrator.
    fn is_administrator(&self) -> bool;

    /// Whether the session user leads any of `group_ids`.
    fn is_group_leader(&self, group_ids: &[GroupId]) -> bool;
}
