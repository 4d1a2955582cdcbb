//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use crate::api::dto::{
    CreateConfirmationRequest, EndSessionRequest, StartSessionRequest, TrackEventRequest,
};
use crate::api::handlers::{analytics, confirmation, notification, system, tracking};
use crate::domain::{
    AnalyticsSummary, Confirmation, ConfirmationMetrics, ConfirmationType,
    DetailedFollowupAnalytics, DeviceBreakdown, DeviceType, Event, EventType, FeedbackBreakdown,
    FeedbackTally, FollowupAnalytics, FollowupBrief, InterestSignals, LinkClickCount,
    LocationCount, Notification, NotificationPreference, NotificationType,
    NotificationWithFollowup, OwnerSummary, PreferenceUpdate, SectionEngagement, Session,
    TopFollowup, VisitorContext,
};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI documentation for the engagement API.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "followup-pulse",
        description = "Engagement analytics and owner notifications for published follow-up pages."
    ),
    paths(
        tracking::track_event,
        tracking::start_session,
        tracking::end_session,
        analytics::followup_analytics,
        analytics::detailed_followup_analytics,
        analytics::analytics_summary,
        analytics::owner_summary,
        confirmation::create_confirmation,
        confirmation::list_confirmations,
        confirmation::confirmation_metrics,
        notification::get_preferences,
        notification::update_preferences,
        notification::followup_notifications,
        notification::user_notifications,
        system::health_handler,
    ),
    components(schemas(
        TrackEventRequest, StartSessionRequest, EndSessionRequest, CreateConfirmationRequest,
        Event, EventType, DeviceType, VisitorContext, Session,
        Confirmation, ConfirmationType, ConfirmationMetrics,
        FollowupAnalytics, DetailedFollowupAnalytics, OwnerSummary, AnalyticsSummary,
        TopFollowup, DeviceBreakdown, LocationCount, FeedbackBreakdown, FeedbackTally,
        SectionEngagement, LinkClickCount, InterestSignals,
        NotificationPreference, PreferenceUpdate, Notification, NotificationType,
        NotificationWithFollowup, FollowupBrief,
        ErrorResponse, ErrorBody,
    )),
    tags(
        (name = "Tracking", description = "Public visitor event and session ingestion"),
        (name = "Analytics", description = "Owner analytics reports"),
        (name = "Confirmations", description = "Visitor feedback"),
        (name = "Notifications", description = "Owner notification preferences and history"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;
