//! Owner notification records and preferences.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::{FollowupBrief, FollowupId, IpHash, SessionId, VisitorContext};
use crate::error::EngagementError;

/// Why the owner is being notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// The hashed identity had never viewed the follow-up before.
    FirstView,
    /// The hashed identity viewed the follow-up in an earlier session.
    Revisit,
}

impl NotificationType {
    /// Returns the wire/storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstView => "FIRST_VIEW",
            Self::Revisit => "REVISIT",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIRST_VIEW" => Ok(Self::FirstView),
            "REVISIT" => Ok(Self::Revisit),
            other => Err(EngagementError::Validation(format!(
                "unknown notification type: {other}"
            ))),
        }
    }
}

/// Per-owner notification settings, created lazily with defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    /// System-generated identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub user_id: String,
    /// Master switch.
    pub email_notifications: bool,
    /// Notify when a new identity views a follow-up.
    pub notify_on_first_view: bool,
    /// Notify when a known identity comes back.
    pub notify_on_revisit: bool,
    /// Override recipient address.
    pub notify_email: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    /// Default preference row for a user who has never stored one.
    #[must_use]
    pub fn defaults_for(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            user_id: user_id.to_string(),
            email_notifications: true,
            notify_on_first_view: true,
            notify_on_revisit: true,
            notify_email: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a notification of `kind` is wanted at all.
    #[must_use]
    pub const fn allows(&self, kind: NotificationType) -> bool {
        self.email_notifications
            && match kind {
                NotificationType::FirstView => self.notify_on_first_view,
                NotificationType::Revisit => self.notify_on_revisit,
            }
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, update: &PreferenceUpdate) {
        if let Some(v) = update.email_notifications {
            self.email_notifications = v;
        }
        if let Some(v) = update.notify_on_first_view {
            self.notify_on_first_view = v;
        }
        if let Some(v) = update.notify_on_revisit {
            self.notify_on_revisit = v;
        }
        if let Some(email) = &update.notify_email {
            self.notify_email.clone_from(email);
        }
        self.updated_at = Utc::now();
    }
}

/// Partial preference update. Absent fields are left untouched;
/// `notifyEmail: null` clears the override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceUpdate {
    /// New master switch.
    #[serde(default)]
    pub email_notifications: Option<bool>,
    /// New first-view switch.
    #[serde(default)]
    pub notify_on_first_view: Option<bool>,
    /// New revisit switch.
    #[serde(default)]
    pub notify_on_revisit: Option<bool>,
    /// `Some(None)` clears the override, `None` leaves it.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub notify_email: Option<Option<String>>,
}

/// Distinguishes an explicit `null` from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A persisted notification decision that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// System-generated identifier.
    pub id: uuid::Uuid,
    /// Follow-up that was viewed.
    pub followup_id: FollowupId,
    /// Owner who was notified.
    pub user_id: String,
    /// First view or revisit.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Decision time.
    pub sent_at: DateTime<Utc>,
    /// Hashed identity of the viewer.
    pub viewer_ip_hash: Option<IpHash>,
    /// Viewer device class.
    pub viewer_device_type: Option<super::DeviceType>,
    /// Viewer browser.
    pub viewer_browser: Option<String>,
    /// Viewer city.
    pub viewer_location_city: Option<String>,
    /// Viewer country.
    pub viewer_location_country: Option<String>,
    /// Session that triggered the notification.
    pub viewer_session_id: Option<SessionId>,
    /// Whether the delivery channel accepted the message.
    pub delivered: bool,
    /// Delivery failure message, if any.
    pub error: Option<String>,
}

/// A notification ready to be persisted (undelivered).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    /// Follow-up that was viewed.
    pub followup_id: FollowupId,
    /// Owner being notified.
    pub user_id: String,
    /// First view or revisit.
    pub kind: NotificationType,
    /// Hashed identity of the viewer.
    pub viewer_ip_hash: IpHash,
    /// Viewer context snapshot.
    pub viewer: VisitorContext,
    /// Session that triggered the notification.
    pub viewer_session_id: SessionId,
}

/// Outcome of revisit detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevisitInfo {
    /// At least one earlier distinct session exists for this identity.
    pub is_revisit: bool,
    /// Number of earlier distinct sessions.
    pub previous_visit_count: u64,
    /// Latest page view among the earlier sessions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_visit_at: Option<DateTime<Utc>>,
}

impl RevisitInfo {
    /// Classification used by the notification decision.
    #[must_use]
    pub const fn notification_type(&self) -> NotificationType {
        if self.is_revisit {
            NotificationType::Revisit
        } else {
            NotificationType::FirstView
        }
    }
}

/// A notification decorated with its follow-up, for the owner's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationWithFollowup {
    /// The notification record.
    #[serde(flatten)]
    pub notification: Notification,
    /// Follow-up summary; `None` if it no longer exists.
    pub followup: Option<FollowupBrief>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let prefs = NotificationPreference::defaults_for("user-1");
        assert!(prefs.email_notifications);
        assert!(prefs.notify_on_first_view);
        assert!(prefs.notify_on_revisit);
        assert_eq!(prefs.notify_email, None);
        assert!(prefs.allows(NotificationType::FirstView));
        assert!(prefs.allows(NotificationType::Revisit));
    }

    #[test]
    fn master_switch_overrides_kind_switches() {
        let mut prefs = NotificationPreference::defaults_for("user-1");
        prefs.apply(&PreferenceUpdate {
            email_notifications: Some(false),
            ..PreferenceUpdate::default()
        });
        assert!(!prefs.allows(NotificationType::FirstView));
        assert!(prefs.notify_on_first_view);
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let Ok(clear) = serde_json::from_str::<PreferenceUpdate>(r#"{"notifyEmail": null}"#)
        else {
            panic!("null notifyEmail should parse");
        };
        assert_eq!(clear.notify_email, Some(None));

        let Ok(untouched) = serde_json::from_str::<PreferenceUpdate>(r#"{"notifyOnRevisit": false}"#)
        else {
            panic!("partial update should parse");
        };
        assert_eq!(untouched.notify_email, None);
        assert_eq!(untouched.notify_on_revisit, Some(false));

        let mut prefs = NotificationPreference::defaults_for("user-1");
        prefs.notify_email = Some("me@example.com".to_string());
        prefs.apply(&untouched);
        assert_eq!(prefs.notify_email.as_deref(), Some("me@example.com"));
        prefs.apply(&clear);
        assert_eq!(prefs.notify_email, None);
    }

    #[test]
    fn revisit_info_classifies() {
        let first = RevisitInfo {
            is_revisit: false,
            previous_visit_count: 0,
            last_visit_at: None,
        };
        assert_eq!(first.notification_type(), NotificationType::FirstView);
        let again = RevisitInfo {
            is_revisit: true,
            previous_visit_count: 2,
            last_visit_at: Some(Utc::now()),
        };
        assert_eq!(again.notification_type(), NotificationType::Revisit);
    }
}
