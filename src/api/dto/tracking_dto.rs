//! Visitor-facing tracking DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use super::common_dto::validate_context;
use crate::domain::{EventType, FollowupId, SessionId, VisitorContext};
use crate::error::EngagementError;
use crate::service::EventSubmission;

/// Request body for `POST /api/analytics/events`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    /// Follow-up the event belongs to.
    pub followup_id: FollowupId,
    /// Client-side session identifier.
    pub session_id: SessionId,
    /// Interaction kind.
    pub event_type: EventType,
    /// Payload object; keys depend on the event type.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub event_data: Option<serde_json::Value>,
    /// Device, browser and location.
    #[serde(flatten)]
    pub context: VisitorContext,
}

impl TrackEventRequest {
    /// Validates field lengths and converts to a service submission.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::Validation`] if a context field is too long
    /// or `eventData` is not a JSON object.
    pub fn into_submission(self) -> Result<EventSubmission, EngagementError> {
        validate_context(&self.context)?;
        if self.event_data.as_ref().is_some_and(|data| !data.is_object()) {
            return Err(EngagementError::Validation(
                "eventData must be an object".to_string(),
            ));
        }
        Ok(EventSubmission {
            followup_id: self.followup_id,
            session_id: self.session_id,
            event_type: self.event_type,
            event_data: self.event_data,
            context: self.context,
        })
    }
}

/// Request body for `POST /api/analytics/sessions/start`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    /// Follow-up being visited.
    pub followup_id: FollowupId,
    /// Device, browser and location.
    #[serde(flatten)]
    pub context: VisitorContext,
}

impl StartSessionRequest {
    /// Checks field lengths.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::Validation`] if a context field is too long.
    pub fn validate(&self) -> Result<(), EngagementError> {
        validate_context(&self.context)
    }
}

/// Request body for `POST /api/analytics/sessions/end`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndSessionRequest {
    /// Session to close.
    pub session_id: SessionId,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::DeviceType;
    use serde_json::json;

    #[test]
    fn flat_context_fields_are_collected() {
        let body = json!({
            "followupId": FollowupId::new(),
            "sessionId": SessionId::new(),
            "eventType": "LINK_CLICK",
            "eventData": {"url": "https://example.com"},
            "deviceType": "TABLET",
            "browser": "Chrome",
            "locationCity": "Porto"
        });
        let Ok(request) = serde_json::from_value::<TrackEventRequest>(body) else {
            panic!("request should parse");
        };
        let Ok(submission) = request.into_submission() else {
            panic!("request should validate");
        };
        assert_eq!(submission.event_type, EventType::LinkClick);
        assert_eq!(submission.context.device_type, Some(DeviceType::Tablet));
        assert_eq!(submission.context.location_city.as_deref(), Some("Porto"));
        assert_eq!(submission.context.location_country, None);
    }

    #[test]
    fn non_object_payload_fails_validation() {
        for data in [json!(["intro"]), json!("intro"), json!(5)] {
            let body = json!({
                "followupId": FollowupId::new(),
                "sessionId": SessionId::new(),
                "eventType": "SECTION_TIME",
                "eventData": data
            });
            let Ok(request) = serde_json::from_value::<TrackEventRequest>(body) else {
                panic!("request should parse");
            };
            assert!(matches!(
                request.into_submission(),
                Err(EngagementError::Validation(_))
            ));
        }
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let body = json!({
            "followupId": FollowupId::new(),
            "sessionId": SessionId::new(),
            "eventType": "HOVER"
        });
        assert!(serde_json::from_value::<TrackEventRequest>(body).is_err());
    }

    #[test]
    fn long_browser_fails_validation() {
        let request = StartSessionRequest {
            followup_id: FollowupId::new(),
            context: VisitorContext {
                browser: Some("b".repeat(51)),
                ..VisitorContext::default()
            },
        };
        assert!(request.validate().is_err());
    }
}
