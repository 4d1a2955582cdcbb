//! Owner analytics handlers.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::TimeRangeQuery;
use crate::api::extract::OwnerId;
use crate::app_state::AppState;
use crate::domain::{
    AnalyticsSummary, DetailedFollowupAnalytics, FollowupAnalytics, FollowupId, OwnerSummary,
};
use crate::error::{EngagementError, ErrorResponse};

/// `GET /api/analytics/followups/{id}` — Windowed statistics for one follow-up.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if the follow-up is missing or not
/// owned by the caller.
#[utoipa::path(
    get,
    path = "/api/analytics/followups/{id}",
    tag = "Analytics",
    summary = "Follow-up analytics",
    params(
        ("id" = uuid::Uuid, Path, description = "Follow-up UUID"),
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
        TimeRangeQuery,
    ),
    responses(
        (status = 200, description = "Follow-up analytics", body = FollowupAnalytics),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn followup_analytics(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<FollowupId>,
    Query(query): Query<TimeRangeQuery>,
) -> Result<Json<FollowupAnalytics>, EngagementError> {
    let report = state
        .analytics
        .followup_analytics(id, owner.as_str(), query.time_range)
        .await?;
    Ok(Json(report))
}

/// `GET /api/analytics/followups/{id}/detailed` — All-time engagement detail.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if the follow-up is missing or not
/// owned by the caller.
#[utoipa::path(
    get,
    path = "/api/analytics/followups/{id}/detailed",
    tag = "Analytics",
    summary = "Detailed follow-up analytics",
    description = "Feedback, section dwell time, link clicks, interest signals, devices and locations for one follow-up.",
    params(
        ("id" = uuid::Uuid, Path, description = "Follow-up UUID"),
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
    ),
    responses(
        (status = 200, description = "Detailed analytics", body = DetailedFollowupAnalytics),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn detailed_followup_analytics(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<FollowupId>,
) -> Result<Json<DetailedFollowupAnalytics>, EngagementError> {
    let report = state
        .analytics
        .detailed_followup_analytics(id, owner.as_str())
        .await?;
    Ok(Json(report))
}

/// `GET /api/analytics/summary` — All-time summary across the owner's follow-ups.
///
/// # Errors
///
/// Returns [`EngagementError::Unauthorized`] without an owner identity.
#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = "Analytics",
    summary = "Analytics summary",
    params(
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
    ),
    responses(
        (status = 200, description = "Owner summary", body = AnalyticsSummary),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
    )
)]
pub async fn analytics_summary(
    State(state): State<AppState>,
    owner: OwnerId,
) -> Result<Json<AnalyticsSummary>, EngagementError> {
    Ok(Json(state.analytics.analytics_summary(owner.as_str()).await?))
}

/// `GET /api/analytics/summary/detailed` — Windowed summary with top performers.
///
/// # Errors
///
/// Returns [`EngagementError::Unauthorized`] without an owner identity.
#[utoipa::path(
    get,
    path = "/api/analytics/summary/detailed",
    tag = "Analytics",
    summary = "Windowed owner summary",
    params(
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
        TimeRangeQuery,
    ),
    responses(
        (status = 200, description = "Owner summary", body = OwnerSummary),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
    )
)]
pub async fn owner_summary(
    State(state): State<AppState>,
    owner: OwnerId,
    Query(query): Query<TimeRangeQuery>,
) -> Result<Json<OwnerSummary>, EngagementError> {
    let summary = state
        .analytics
        .owner_summary(owner.as_str(), query.time_range)
        .await?;
    Ok(Json(summary))
}

/// Owner analytics routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/followups/{id}", get(followup_analytics))
        .route("/followups/{id}/detailed", get(detailed_followup_analytics))
        .route("/summary", get(analytics_summary))
        .route("/summary/detailed", get(owner_summary))
}
