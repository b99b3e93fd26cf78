//! Request context identifying the acting user and session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thumbhub_core::types::{SessionId, UserId};

/// Context for the current request.
///
/// Identifies *who* is acting. What they may do is answered by the
/// session's `PermissionOracle`, passed alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub user_id: UserId,
    /// The current session ID.
    pub session_id: SessionId,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: UserId, session_id: SessionId) -> Self {
        Self {
            user_id,
            session_id,
            request_time: Utc::now(),
        }
    }
}
