//! Notification handlers: preferences and history.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{HistoryQuery, validate_preference_update};
use crate::api::extract::OwnerId;
use crate::app_state::AppState;
use crate::domain::{
    FollowupId, Notification, NotificationPreference, NotificationWithFollowup, PreferenceUpdate,
};
use crate::error::{EngagementError, ErrorResponse};

/// `GET /api/notifications/preferences` — Current preferences.
///
/// Creates the defaults on first read.
///
/// # Errors
///
/// Returns [`EngagementError::Unauthorized`] without an owner identity.
#[utoipa::path(
    get,
    path = "/api/notifications/preferences",
    tag = "Notifications",
    summary = "Get notification preferences",
    params(
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
    ),
    responses(
        (status = 200, description = "Preferences", body = NotificationPreference),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
    )
)]
pub async fn get_preferences(
    State(state): State<AppState>,
    owner: OwnerId,
) -> Result<Json<NotificationPreference>, EngagementError> {
    Ok(Json(state.notifications.preferences(owner.as_str()).await?))
}

/// `PUT /api/notifications/preferences` — Partially update preferences.
///
/// # Errors
///
/// Returns [`EngagementError::Validation`] for a malformed `notifyEmail`.
#[utoipa::path(
    put,
    path = "/api/notifications/preferences",
    tag = "Notifications",
    summary = "Update notification preferences",
    description = "Absent fields are left unchanged; `notifyEmail: null` clears the override address.",
    params(
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
    ),
    request_body = PreferenceUpdate,
    responses(
        (status = 200, description = "Updated preferences", body = NotificationPreference),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
    )
)]
pub async fn update_preferences(
    State(state): State<AppState>,
    owner: OwnerId,
    Json(update): Json<PreferenceUpdate>,
) -> Result<Json<NotificationPreference>, EngagementError> {
    validate_preference_update(&update)?;
    let preference = state
        .notifications
        .update_preferences(owner.as_str(), &update)
        .await?;
    Ok(Json(preference))
}

/// `GET /api/notifications/followups/{id}` — Notifications about one follow-up.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if the follow-up is missing or not
/// owned by the caller.
#[utoipa::path(
    get,
    path = "/api/notifications/followups/{id}",
    tag = "Notifications",
    summary = "Notifications for a follow-up",
    params(
        ("id" = uuid::Uuid, Path, description = "Follow-up UUID"),
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
    ),
    responses(
        (status = 200, description = "Notifications, newest first", body = Vec<Notification>),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn followup_notifications(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<FollowupId>,
) -> Result<Json<Vec<Notification>>, EngagementError> {
    let notifications = state
        .notifications
        .notifications_by_followup(id, owner.as_str())
        .await?;
    Ok(Json(notifications))
}

/// `GET /api/notifications` — The caller's notification history.
///
/// # Errors
///
/// Returns [`EngagementError::Unauthorized`] without an owner identity.
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    summary = "Notification history",
    params(
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "Notifications with their follow-ups", body = Vec<NotificationWithFollowup>),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
    )
)]
pub async fn user_notifications(
    State(state): State<AppState>,
    owner: OwnerId,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<NotificationWithFollowup>>, EngagementError> {
    let history = state
        .notifications
        .notifications_by_user(owner.as_str(), query.limit)
        .await?;
    Ok(Json(history))
}

/// Notification routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(user_notifications))
        .route(
            "/preferences",
            get(get_preferences).put(update_preferences),
        )
        .route("/followups/{id}", get(followup_notifications))
}
