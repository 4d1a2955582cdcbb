//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::{AnalyticsService, ConfirmationService, NotificationService, TrackingService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Event ingestion and sessions.
    pub tracking: Arc<TrackingService>,
    /// Owner analytics.
    pub analytics: Arc<AnalyticsService>,
    /// Visitor feedback.
    pub confirmations: Arc<ConfirmationService>,
    /// Preferences and notification history.
    pub notifications: Arc<NotificationService>,
}
