//! REST endpoint handlers organized by resource.

pub mod analytics;
pub mod confirmation;
pub mod notification;
pub mod system;
pub mod tracking;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest(
            "/analytics",
            tracking::routes().merge(analytics::routes()),
        )
        .nest("/confirmations", confirmation::routes())
        .nest("/notifications", notification::routes())
}
