//! Confirmation handlers: public feedback submission and owner reports.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CreateConfirmationRequest, validate_slug};
use crate::api::extract::OwnerId;
use crate::app_state::AppState;
use crate::domain::{Confirmation, ConfirmationMetrics, FollowupId};
use crate::error::{EngagementError, ErrorResponse};

/// `POST /api/confirmations/{slug}` — Submit visitor feedback.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if no published follow-up has the
/// slug, or [`EngagementError::Validation`] for a bad slug or comment.
#[utoipa::path(
    post,
    path = "/api/confirmations/{slug}",
    tag = "Confirmations",
    summary = "Submit a confirmation",
    params(
        ("slug" = String, Path, description = "Public follow-up slug"),
    ),
    request_body = CreateConfirmationRequest,
    responses(
        (status = 201, description = "Confirmation recorded", body = Confirmation),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn create_confirmation(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<CreateConfirmationRequest>,
) -> Result<impl IntoResponse, EngagementError> {
    validate_slug(&slug)?;
    let confirmation = state
        .confirmations
        .create_confirmation(&slug, req.into_submission()?)
        .await?;
    Ok((StatusCode::CREATED, Json(confirmation)))
}

/// `GET /api/confirmations/followup/{id}` — List confirmations, newest first.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if the follow-up is missing or not
/// owned by the caller.
#[utoipa::path(
    get,
    path = "/api/confirmations/followup/{id}",
    tag = "Confirmations",
    summary = "List confirmations",
    params(
        ("id" = uuid::Uuid, Path, description = "Follow-up UUID"),
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
    ),
    responses(
        (status = 200, description = "Confirmations", body = Vec<Confirmation>),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn list_confirmations(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<FollowupId>,
) -> Result<Json<Vec<Confirmation>>, EngagementError> {
    Ok(Json(
        state.confirmations.confirmations(id, owner.as_str()).await?,
    ))
}

/// `GET /api/confirmations/followup/{id}/metrics` — Feedback rates.
///
/// # Errors
///
/// Returns [`EngagementError::NotFound`] if the follow-up is missing or not
/// owned by the caller.
#[utoipa::path(
    get,
    path = "/api/confirmations/followup/{id}/metrics",
    tag = "Confirmations",
    summary = "Confirmation metrics",
    description = "Counts by type, recap accuracy, value-proposition resonance and interest rates, plus the 10 newest confirmations.",
    params(
        ("id" = uuid::Uuid, Path, description = "Follow-up UUID"),
        ("x-user-id" = String, Header, description = "Authenticated owner id"),
    ),
    responses(
        (status = 200, description = "Confirmation metrics", body = ConfirmationMetrics),
        (status = 401, description = "Missing owner identity", body = ErrorResponse),
        (status = 404, description = "Follow-up not found", body = ErrorResponse),
    )
)]
pub async fn confirmation_metrics(
    State(state): State<AppState>,
    owner: OwnerId,
    Path(id): Path<FollowupId>,
) -> Result<Json<ConfirmationMetrics>, EngagementError> {
    let metrics = state
        .confirmations
        .confirmation_metrics(id, owner.as_str())
        .await?;
    Ok(Json(metrics))
}

/// Confirmation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/{slug}", post(create_confirmation))
        .route("/followup/{id}", get(list_confirmations))
        .route("/followup/{id}/metrics", get(confirmation_metrics))
}
