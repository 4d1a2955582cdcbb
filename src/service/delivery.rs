//! Delivery channel seam for owner notifications.
//!
//! The notification pipeline composes an [`OutboundNotification`] and hands
//! it to a [`NotificationChannel`]. The bundled [`LogChannel`] writes the
//! message to the log; a mail transport plugs in behind the same trait.

use std::fmt::Write as _;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{FollowupRef, NotificationType, VisitorContext};
use crate::error::EngagementError;

/// A fully composed message ready for a delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundNotification {
    /// Recipient address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl OutboundNotification {
    /// Composes the message for a view of `followup` by `viewer`.
    #[must_use]
    pub fn compose(
        recipient: &str,
        kind: NotificationType,
        followup: &FollowupRef,
        viewer: &VisitorContext,
        viewed_at: DateTime<Utc>,
        dashboard_base_url: &str,
    ) -> Self {
        let (subject_prefix, lead) = match kind {
            NotificationType::FirstView => ("New view on", "Someone just viewed"),
            NotificationType::Revisit => {
                ("Someone revisited", "A prospect has returned to view")
            }
        };
        let location = match (&viewer.location_city, &viewer.location_country) {
            (Some(city), Some(country)) => format!("{city}, {country}"),
            (Some(city), None) => city.clone(),
            _ => "Unknown location".to_string(),
        };
        let device = viewer
            .device_type
            .map_or("Unknown", |d| d.as_str());
        let browser = viewer.browser.as_deref().unwrap_or("Unknown");

        let mut body = String::new();
        let _ = writeln!(body, "{lead} your follow-up page!");
        let _ = writeln!(body);
        let _ = writeln!(body, "Follow-up: {}", followup.title);
        let _ = writeln!(body, "Time: {}", viewed_at.format("%Y-%m-%d %H:%M:%S UTC"));
        let _ = writeln!(body, "Device: {device}");
        let _ = writeln!(body, "Browser: {browser}");
        let _ = writeln!(body, "Location: {location}");
        let _ = writeln!(body);
        let _ = write!(
            body,
            "View analytics: {}/follow-ups/{}",
            dashboard_base_url.trim_end_matches('/'),
            followup.id
        );

        Self {
            recipient: recipient.to_string(),
            subject: format!("{subject_prefix} your follow-up: \"{}\"", followup.title),
            body,
        }
    }
}

/// Transport that accepts composed notifications.
#[async_trait]
pub trait NotificationChannel: Send + Sync + std::fmt::Debug {
    /// Hands a message to the transport.
    ///
    /// `Ok` means the transport accepted it; the record is then marked
    /// delivered.
    async fn deliver(&self, message: &OutboundNotification) -> Result<(), EngagementError>;
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn deliver(&self, message: &OutboundNotification) -> Result<(), EngagementError> {
        tracing::info!(
            recipient = %message.recipient,
            subject = %message.subject,
            body = %message.body,
            "notification delivered to log"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DeviceType, FollowupId, FollowupStatus};

    fn followup() -> FollowupRef {
        FollowupRef {
            id: FollowupId::new(),
            user_id: "owner-1".to_string(),
            status: FollowupStatus::Published,
            slug: "acme-kickoff".to_string(),
            title: "Acme kickoff".to_string(),
            company_name: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn first_view_message() {
        let f = followup();
        let viewer = VisitorContext {
            device_type: Some(DeviceType::Mobile),
            browser: Some("Firefox".to_string()),
            location_city: Some("Lisbon".to_string()),
            location_country: Some("Portugal".to_string()),
        };
        let message = OutboundNotification::compose(
            "me@example.com",
            NotificationType::FirstView,
            &f,
            &viewer,
            Utc::now(),
            "https://app.example/",
        );
        assert_eq!(message.recipient, "me@example.com");
        assert_eq!(message.subject, "New view on your follow-up: \"Acme kickoff\"");
        assert!(message.body.starts_with("Someone just viewed"));
        assert!(message.body.contains("Device: MOBILE"));
        assert!(message.body.contains("Browser: Firefox"));
        assert!(message.body.contains("Location: Lisbon, Portugal"));
        assert!(
            message
                .body
                .contains(&format!("https://app.example/follow-ups/{}", f.id))
        );
    }

    #[test]
    fn revisit_message_with_unknown_viewer() {
        let message = OutboundNotification::compose(
            "me@example.com",
            NotificationType::Revisit,
            &followup(),
            &VisitorContext::default(),
            Utc::now(),
            "http://localhost:5173",
        );
        assert_eq!(
            message.subject,
            "Someone revisited your follow-up: \"Acme kickoff\""
        );
        assert!(message.body.contains("Device: Unknown"));
        assert!(message.body.contains("Location: Unknown location"));
    }

    #[tokio::test]
    async fn log_channel_accepts_everything() {
        let message = OutboundNotification::compose(
            "me@example.com",
            NotificationType::FirstView,
            &followup(),
            &VisitorContext::default(),
            Utc::now(),
            "http://localhost:5173",
        );
        assert!(LogChannel.deliver(&message).await.is_ok());
    }
}
