//! Database rows and their conversion into domain records.
//!
//! Enumerations are stored as their wire names (`PAGE_VIEW`, `MOBILE`, ...)
//! in `TEXT` columns; an unknown name read back from the database is
//! reported as a store error.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Confirmation, Event, FollowupId, FollowupRef, FollowupStatus, IpHash, Notification,
    NotificationPreference, Session, SessionId, VisitorContext,
};
use crate::error::EngagementError;

fn parse<T>(column: &str, raw: &str) -> Result<T, EngagementError>
where
    T: std::str::FromStr,
{
    raw.parse()
        .map_err(|_| EngagementError::Store(format!("invalid {column} value in database: {raw}")))
}

fn parse_opt<T>(column: &str, raw: Option<&str>) -> Result<Option<T>, EngagementError>
where
    T: std::str::FromStr,
{
    raw.map(|r| parse(column, r)).transpose()
}

/// A row of the `followups` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowupRow {
    /// Follow-up ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// `DRAFT` or `PUBLISHED`.
    pub status: String,
    /// Public slug.
    pub slug: String,
    /// Page title.
    pub title: String,
    /// Recipient company.
    pub company_name: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<FollowupRow> for FollowupRef {
    type Error = EngagementError;

    fn try_from(row: FollowupRow) -> Result<Self, Self::Error> {
        let status = match row.status.as_str() {
            "DRAFT" => FollowupStatus::Draft,
            "PUBLISHED" => FollowupStatus::Published,
            other => {
                return Err(EngagementError::Store(format!(
                    "invalid status value in database: {other}"
                )));
            }
        };
        Ok(Self {
            id: FollowupId::from_uuid(row.id),
            user_id: row.user_id,
            status,
            slug: row.slug,
            title: row.title,
            company_name: row.company_name,
            created_at: row.created_at,
        })
    }
}

/// A row of the `analytics_events` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    /// Event ID.
    pub id: Uuid,
    /// Follow-up ID.
    pub followup_id: Uuid,
    /// Session ID.
    pub session_id: Uuid,
    /// Event type name.
    pub event_type: String,
    /// JSONB payload.
    pub event_data: Option<serde_json::Value>,
    /// Device type name.
    pub device_type: Option<String>,
    /// Browser.
    pub browser: Option<String>,
    /// City.
    pub location_city: Option<String>,
    /// Country.
    pub location_country: Option<String>,
    /// Hashed origin.
    pub ip_hash: String,
    /// Write time.
    pub occurred_at: DateTime<Utc>,
}

impl TryFrom<EventRow> for Event {
    type Error = EngagementError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            followup_id: FollowupId::from_uuid(row.followup_id),
            session_id: SessionId::from_uuid(row.session_id),
            event_type: parse("event_type", &row.event_type)?,
            event_data: row.event_data,
            context: VisitorContext {
                device_type: parse_opt("device_type", row.device_type.as_deref())?,
                browser: row.browser,
                location_city: row.location_city,
                location_country: row.location_country,
            },
            ip_hash: IpHash::from_digest(row.ip_hash),
            timestamp: row.occurred_at,
        })
    }
}

/// A row of the `analytics_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    /// Session ID.
    pub id: Uuid,
    /// Follow-up ID.
    pub followup_id: Uuid,
    /// Start time.
    pub session_start: DateTime<Utc>,
    /// End time.
    pub session_end: Option<DateTime<Utc>>,
    /// Duration in seconds.
    pub page_duration: Option<i64>,
    /// Device type name.
    pub device_type: Option<String>,
    /// Browser.
    pub browser: Option<String>,
    /// City.
    pub location_city: Option<String>,
    /// Country.
    pub location_country: Option<String>,
}

impl TryFrom<SessionRow> for Session {
    type Error = EngagementError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SessionId::from_uuid(row.id),
            followup_id: FollowupId::from_uuid(row.followup_id),
            session_start: row.session_start,
            session_end: row.session_end,
            page_duration: row.page_duration,
            context: VisitorContext {
                device_type: parse_opt("device_type", row.device_type.as_deref())?,
                browser: row.browser,
                location_city: row.location_city,
                location_country: row.location_country,
            },
        })
    }
}

/// A row of the `followup_confirmations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConfirmationRow {
    /// Confirmation ID.
    pub id: Uuid,
    /// Follow-up ID.
    pub followup_id: Uuid,
    /// Submitting session.
    pub session_id: Option<Uuid>,
    /// Confirmation type name.
    pub confirmation_type: String,
    /// Creation time.
    pub confirmed_at: DateTime<Utc>,
    /// Free-text comment.
    pub comment: Option<String>,
}

impl TryFrom<ConfirmationRow> for Confirmation {
    type Error = EngagementError;

    fn try_from(row: ConfirmationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            followup_id: FollowupId::from_uuid(row.followup_id),
            session_id: row.session_id.map(SessionId::from_uuid),
            kind: parse("confirmation_type", &row.confirmation_type)?,
            confirmed_at: row.confirmed_at,
            comment: row.comment,
        })
    }
}

/// A row of the `notification_preferences` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PreferenceRow {
    /// Row ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: String,
    /// Master switch.
    pub email_notifications: bool,
    /// First view switch.
    pub notify_on_first_view: bool,
    /// Revisit switch.
    pub notify_on_revisit: bool,
    /// Recipient override.
    pub notify_email: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update.
    pub updated_at: DateTime<Utc>,
}

impl From<PreferenceRow> for NotificationPreference {
    fn from(row: PreferenceRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            email_notifications: row.email_notifications,
            notify_on_first_view: row.notify_on_first_view,
            notify_on_revisit: row.notify_on_revisit,
            notify_email: row.notify_email,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A row of the `notifications` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    /// Notification ID.
    pub id: Uuid,
    /// Follow-up ID.
    pub followup_id: Uuid,
    /// Notified user.
    pub user_id: String,
    /// `FIRST_VIEW` or `REVISIT`.
    pub notification_type: String,
    /// Decision time.
    pub sent_at: DateTime<Utc>,
    /// Viewer hash.
    pub viewer_ip_hash: Option<String>,
    /// Viewer device type name.
    pub viewer_device_type: Option<String>,
    /// Viewer browser.
    pub viewer_browser: Option<String>,
    /// Viewer city.
    pub viewer_location_city: Option<String>,
    /// Viewer country.
    pub viewer_location_country: Option<String>,
    /// Triggering session.
    pub viewer_session_id: Option<Uuid>,
    /// Delivery accepted.
    pub delivered: bool,
    /// Delivery failure.
    pub error: Option<String>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = EngagementError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            followup_id: FollowupId::from_uuid(row.followup_id),
            user_id: row.user_id,
            kind: parse("notification_type", &row.notification_type)?,
            sent_at: row.sent_at,
            viewer_ip_hash: row.viewer_ip_hash.map(IpHash::from_digest),
            viewer_device_type: parse_opt("viewer_device_type", row.viewer_device_type.as_deref())?,
            viewer_browser: row.viewer_browser,
            viewer_location_city: row.viewer_location_city,
            viewer_location_country: row.viewer_location_country,
            viewer_session_id: row.viewer_session_id.map(SessionId::from_uuid),
            delivered: row.delivered,
            error: row.error,
        })
    }
}
