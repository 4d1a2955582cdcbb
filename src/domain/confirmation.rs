//! One-click visitor feedback ("confirmations").

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FollowupId, SessionId};
use crate::error::EngagementError;

/// Feedback prompt answer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationType {
    /// "Is this recap accurate?" answered yes.
    RecapAccurate,
    /// "Is this recap accurate?" answered no.
    RecapInaccurate,
    /// "Does this resonate?" answered yes.
    ValuePropClear,
    /// "Does this resonate?" answered "tell me more".
    ValuePropUnclear,
    /// Visitor declared interest.
    Interested,
    /// Visitor clicked through to schedule a call.
    ScheduleCall,
}

impl ConfirmationType {
    /// Every confirmation type, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::RecapAccurate,
        Self::RecapInaccurate,
        Self::ValuePropClear,
        Self::ValuePropUnclear,
        Self::Interested,
        Self::ScheduleCall,
    ];

    /// Returns the wire/storage name (e.g. `"RECAP_ACCURATE"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RecapAccurate => "RECAP_ACCURATE",
            Self::RecapInaccurate => "RECAP_INACCURATE",
            Self::ValuePropClear => "VALUE_PROP_CLEAR",
            Self::ValuePropUnclear => "VALUE_PROP_UNCLEAR",
            Self::Interested => "INTERESTED",
            Self::ScheduleCall => "SCHEDULE_CALL",
        }
    }
}

impl fmt::Display for ConfirmationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfirmationType {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EngagementError::Validation(format!("unknown confirmation type: {s}")))
    }
}

/// A persisted confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Confirmation {
    /// System-generated identifier.
    pub id: uuid::Uuid,
    /// Follow-up the feedback is about.
    pub followup_id: FollowupId,
    /// Submitting session; `None` for anonymous feedback.
    pub session_id: Option<SessionId>,
    /// Answer given.
    #[serde(rename = "type")]
    pub kind: ConfirmationType,
    /// Creation time.
    pub confirmed_at: DateTime<Utc>,
    /// Optional free-text comment.
    pub comment: Option<String>,
}

/// A confirmation ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConfirmation {
    /// Follow-up the feedback is about.
    pub followup_id: FollowupId,
    /// Submitting session, if known.
    pub session_id: Option<SessionId>,
    /// Answer given.
    pub kind: ConfirmationType,
    /// Optional free-text comment.
    pub comment: Option<String>,
}
