//! Confirmation DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use super::common_dto::check_len;
use crate::domain::{ConfirmationType, SessionId};
use crate::error::EngagementError;
use crate::service::ConfirmationSubmission;

/// Longest accepted confirmation comment.
pub const MAX_COMMENT_LEN: usize = 1000;
/// Longest accepted public slug.
pub const MAX_SLUG_LEN: usize = 100;

/// Request body for `POST /api/confirmations/{slug}`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateConfirmationRequest {
    /// Answer given.
    #[serde(rename = "type")]
    pub kind: ConfirmationType,
    /// Session of the visitor, if any.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl CreateConfirmationRequest {
    /// Validates the comment length and converts to a service submission.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::Validation`] if the comment is too long.
    pub fn into_submission(self) -> Result<ConfirmationSubmission, EngagementError> {
        check_len("comment", self.comment.as_deref(), MAX_COMMENT_LEN)?;
        Ok(ConfirmationSubmission {
            session_id: self.session_id,
            kind: self.kind,
            comment: self.comment,
        })
    }
}

/// Checks a public slug taken from the path.
///
/// # Errors
///
/// Returns [`EngagementError::Validation`] unless the slug has 1 to 100
/// characters.
pub fn validate_slug(slug: &str) -> Result<(), EngagementError> {
    if slug.is_empty() {
        return Err(EngagementError::Validation("slug must not be empty".to_string()));
    }
    check_len("slug", Some(slug), MAX_SLUG_LEN)
}
