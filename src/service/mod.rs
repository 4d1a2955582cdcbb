//! Service layer: business logic orchestration.
//!
//! Services are constructed once from the shared [`Stores`](crate::persistence::Stores)
//! handles and are cheap to clone. Owner-facing reads go through
//! [`owned_followup`], which reports foreign follow-ups exactly like
//! missing ones.

pub mod aggregate;
pub mod analytics_service;
pub mod confirmation_service;
pub mod delivery;
pub mod notification_service;
pub mod revisit;
pub mod tracking_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use analytics_service::AnalyticsService;
pub use confirmation_service::{ConfirmationService, ConfirmationSubmission};
pub use delivery::{LogChannel, NotificationChannel, OutboundNotification};
pub use notification_service::{Decision, NotificationService, NotificationSettings, SuppressReason};
pub use revisit::RevisitDetector;
pub use tracking_service::{EventSubmission, TrackingService};

use crate::domain::{FollowupId, FollowupRef};
use crate::error::EngagementError;
use crate::persistence::FollowupDirectory;

/// Loads a follow-up on behalf of `user_id`.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if the follow-up does not exist or
/// belongs to someone else, or a store error.
pub async fn owned_followup(
    directory: &dyn FollowupDirectory,
    followup_id: FollowupId,
    user_id: &str,
) -> Result<FollowupRef, EngagementError> {
    directory
        .find_by_id(followup_id)
        .await?
        .filter(|f| f.is_owned_by(user_id))
        .ok_or_else(EngagementError::followup_not_found)
}
