//! Confirmation register: visitor feedback writes and owner metrics.

use std::sync::Arc;

use super::aggregate;
use super::owned_followup;
use crate::domain::{
    Confirmation, ConfirmationMetrics, ConfirmationType, FollowupId, NewConfirmation, SessionId,
};
use crate::error::EngagementError;
use crate::persistence::{ConfirmationStore, FollowupDirectory, Stores};

/// Confirmations included in [`ConfirmationMetrics::recent_confirmations`].
pub const RECENT_CONFIRMATIONS: usize = 10;

/// Feedback as submitted by a visitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationSubmission {
    /// Submitting session, if the visitor has one.
    pub session_id: Option<SessionId>,
    /// Answer given.
    pub kind: ConfirmationType,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// Stores visitor confirmations and reports on them.
///
/// There is no duplicate check: the same session may answer the same
/// prompt repeatedly.
#[derive(Debug, Clone)]
pub struct ConfirmationService {
    followups: Arc<dyn FollowupDirectory>,
    confirmations: Arc<dyn ConfirmationStore>,
}

impl ConfirmationService {
    /// Creates a new `ConfirmationService`.
    #[must_use]
    pub fn new(stores: &Stores) -> Self {
        Self {
            followups: Arc::clone(&stores.followups),
            confirmations: Arc::clone(&stores.confirmations),
        }
    }

    /// Records feedback against the published follow-up with `slug`.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if no published follow-up has
    /// that slug, or a store error.
    pub async fn create_confirmation(
        &self,
        slug: &str,
        submission: ConfirmationSubmission,
    ) -> Result<Confirmation, EngagementError> {
        let followup = self
            .followups
            .find_published_by_slug(slug)
            .await?
            .ok_or_else(EngagementError::followup_not_found)?;

        let confirmation = self
            .confirmations
            .insert_confirmation(NewConfirmation {
                followup_id: followup.id,
                session_id: submission.session_id,
                kind: submission.kind,
                comment: submission.comment,
            })
            .await?;
        tracing::info!(
            followup_id = %followup.id,
            kind = %confirmation.kind,
            "confirmation recorded"
        );
        Ok(confirmation)
    }

    /// All confirmations of an owned follow-up, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the follow-up does not exist
    /// or is not owned by `user_id`, or a store error.
    pub async fn confirmations(
        &self,
        followup_id: FollowupId,
        user_id: &str,
    ) -> Result<Vec<Confirmation>, EngagementError> {
        owned_followup(self.followups.as_ref(), followup_id, user_id).await?;
        self.confirmations
            .list_confirmations(followup_id, None)
            .await
    }

    /// Rates and counts over an owned follow-up's confirmations.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the follow-up does not exist
    /// or is not owned by `user_id`, or a store error.
    pub async fn confirmation_metrics(
        &self,
        followup_id: FollowupId,
        user_id: &str,
    ) -> Result<ConfirmationMetrics, EngagementError> {
        owned_followup(self.followups.as_ref(), followup_id, user_id).await?;
        let (counts, recent) = tokio::try_join!(
            self.confirmations.count_confirmations_by_type(followup_id),
            self.confirmations
                .list_confirmations(followup_id, Some(RECENT_CONFIRMATIONS)),
        )?;
        Ok(aggregate::confirmation_metrics(&counts, recent))
    }
}
