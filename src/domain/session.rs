//! Visitor session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FollowupId, SessionId, VisitorContext};

/// One visit to a follow-up page.
///
/// Created by "start session", closed at most once by "end session". Once
/// `page_duration` is set it is never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// System-generated identifier.
    pub id: SessionId,
    /// Follow-up being visited.
    pub followup_id: FollowupId,
    /// Creation time.
    pub session_start: DateTime<Utc>,
    /// Close time, once ended.
    pub session_end: Option<DateTime<Utc>>,
    /// Whole seconds between start and end, once ended.
    pub page_duration: Option<i64>,
    /// Visitor context captured at start.
    #[serde(flatten)]
    pub context: VisitorContext,
}

impl Session {
    /// Returns `true` once the session has been closed.
    #[must_use]
    pub const fn is_ended(&self) -> bool {
        self.session_end.is_some()
    }

    /// Whole seconds elapsed from `session_start` to `end`, floored and
    /// clamped at zero.
    #[must_use]
    pub fn duration_until(&self, end: DateTime<Utc>) -> i64 {
        (end - self.session_start).num_milliseconds().max(0) / 1000
    }
}

/// A session ready to be persisted. The store assigns `id` and
/// `session_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    /// Follow-up being visited.
    pub followup_id: FollowupId,
    /// Visitor context.
    pub context: VisitorContext,
}
