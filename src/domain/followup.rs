//! Read-only view of the follow-up pages this service measures.
//!
//! Follow-ups are owned by an external collaborator. This crate only needs
//! enough of them to check publication status and ownership, and to label
//! reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::FollowupId;

/// Publication state of a follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FollowupStatus {
    /// Not yet visible to visitors.
    Draft,
    /// Publicly reachable by slug.
    Published,
}

impl FollowupStatus {
    /// Returns the storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
        }
    }
}

/// The subset of a follow-up this service reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowupRef {
    /// Follow-up identifier.
    pub id: FollowupId,
    /// Owning user.
    pub user_id: String,
    /// Publication state.
    pub status: FollowupStatus,
    /// Public slug.
    pub slug: String,
    /// Page title.
    pub title: String,
    /// Name of the recipient company, if linked.
    #[serde(default)]
    pub company_name: Option<String>,
    /// Creation time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl FollowupRef {
    /// Returns `true` if visitors may interact with this follow-up.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == FollowupStatus::Published
    }

    /// Returns `true` if `user_id` owns this follow-up.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    /// Short label used when decorating notification history.
    #[must_use]
    pub fn brief(&self) -> FollowupBrief {
        FollowupBrief {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Identifying summary of a follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowupBrief {
    /// Follow-up identifier.
    pub id: FollowupId,
    /// Page title.
    pub title: String,
    /// Public slug.
    pub slug: String,
}
