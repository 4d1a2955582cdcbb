//! Visitor tracking handlers: events and session lifecycle.
//!
//! These endpoints are public; they only accept writes for published
//! follow-ups.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{EndSessionRequest, StartSessionRequest, TrackEventRequest};
use crate::api::extract::ClientOrigin;
use crate::app_state::AppState;
use crate::domain::{Event, Session};
use crate::error::{EngagementError, ErrorResponse};

/// `POST /api/analytics/events` — Record a visitor event.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] for an unknown or unpublished
/// follow-up and [`EngagementError::Validation`] for oversized fields.
#[utoipa::path(
    post,
    path = "/api/analytics/events",
    tag = "Tracking",
    summary = "Track a visitor event",
    description = "Stores an event against a published follow-up. Page views also trigger the owner notification pipeline in the background.",
    request_body = TrackEventRequest,
    responses(
        (status = 201, description = "Event recorded", body = Event),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn track_event(
    State(state): State<AppState>,
    origin: ClientOrigin,
    Json(req): Json<TrackEventRequest>,
) -> Result<impl IntoResponse, EngagementError> {
    let submission = req.into_submission()?;
    let event = state
        .tracking
        .track_event(submission, origin.as_str())
        .await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// `POST /api/analytics/sessions/start` — Open a visitor session.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] for an unknown or unpublished
/// follow-up.
#[utoipa::path(
    post,
    path = "/api/analytics/sessions/start",
    tag = "Tracking",
    summary = "Start a session",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = Session),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, EngagementError> {
    req.validate()?;
    let session = state
        .tracking
        .start_session(req.followup_id, req.context)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/analytics/sessions/end` — Close a visitor session.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if the session does not exist.
#[utoipa::path(
    post,
    path = "/api/analytics/sessions/end",
    tag = "Tracking",
    summary = "End a session",
    description = "Records the session duration. Ending an already ended session returns it unchanged.",
    request_body = EndSessionRequest,
    responses(
        (status = 200, description = "Session ended", body = Session),
        (status = 404, description = "Session not found", body = ErrorResponse),
    )
)]
pub async fn end_session(
    State(state): State<AppState>,
    Json(req): Json<EndSessionRequest>,
) -> Result<Json<Session>, EngagementError> {
    Ok(Json(state.tracking.end_session(req.session_id).await?))
}

/// Tracking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(track_event))
        .route("/sessions/start", post(start_session))
        .route("/sessions/end", post(end_session))
}
