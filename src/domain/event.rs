//! Visitor events and their type-specific payloads.
//!
//! An [`Event`] is an immutable fact about one visitor interaction. The
//! payload is persisted exactly as submitted; consumers read it through
//! [`EventPayload::decode`], which turns every absent or malformed key into
//! `None` instead of failing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{FollowupId, IpHash, SessionId};
use crate::error::EngagementError;

/// Kind of visitor interaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// The follow-up page was loaded.
    PageView,
    /// A section scrolled into view.
    SectionView,
    /// Dwell time spent in a section.
    SectionTime,
    /// Scroll depth reached on the page.
    ScrollDepth,
    /// An attached file was downloaded.
    FileDownload,
    /// A link on the page was clicked.
    LinkClick,
    /// A contact email address was copied.
    CopyEmail,
    /// A contact phone number was copied.
    CopyPhone,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::PageView,
        Self::SectionView,
        Self::SectionTime,
        Self::ScrollDepth,
        Self::FileDownload,
        Self::LinkClick,
        Self::CopyEmail,
        Self::CopyPhone,
    ];

    /// Event types counted as an "engagement" in the windowed owner summary.
    pub const ENGAGEMENTS: [Self; 4] = [
        Self::FileDownload,
        Self::LinkClick,
        Self::CopyEmail,
        Self::CopyPhone,
    ];

    /// Engagement set used by the simplified all-time owner summary, which
    /// also counts section dwell events.
    pub const ENGAGEMENTS_WITH_DWELL: [Self; 5] = [
        Self::FileDownload,
        Self::LinkClick,
        Self::CopyEmail,
        Self::CopyPhone,
        Self::SectionTime,
    ];

    /// Returns the wire/storage name (e.g. `"PAGE_VIEW"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PageView => "PAGE_VIEW",
            Self::SectionView => "SECTION_VIEW",
            Self::SectionTime => "SECTION_TIME",
            Self::ScrollDepth => "SCROLL_DEPTH",
            Self::FileDownload => "FILE_DOWNLOAD",
            Self::LinkClick => "LINK_CLICK",
            Self::CopyEmail => "COPY_EMAIL",
            Self::CopyPhone => "COPY_PHONE",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| EngagementError::Validation(format!("unknown event type: {s}")))
    }
}

/// Device class reported by the visitor's client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceType {
    /// Phone-sized device.
    Mobile,
    /// Tablet-sized device.
    Tablet,
    /// Desktop or laptop.
    Desktop,
}

impl DeviceType {
    /// Returns the wire/storage name (e.g. `"MOBILE"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mobile => "MOBILE",
            Self::Tablet => "TABLET",
            Self::Desktop => "DESKTOP",
        }
    }
}

impl FromStr for DeviceType {
    type Err = EngagementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MOBILE" => Ok(Self::Mobile),
            "TABLET" => Ok(Self::Tablet),
            "DESKTOP" => Ok(Self::Desktop),
            other => Err(EngagementError::Validation(format!(
                "unknown device type: {other}"
            ))),
        }
    }
}

/// Device, browser and location context captured with events, sessions
/// and notification snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorContext {
    /// Device class, when the client reported one.
    pub device_type: Option<DeviceType>,
    /// Browser name.
    pub browser: Option<String>,
    /// City resolved for the visitor.
    pub location_city: Option<String>,
    /// Country resolved for the visitor.
    pub location_country: Option<String>,
}

/// A persisted visitor event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// System-generated identifier.
    pub id: uuid::Uuid,
    /// Follow-up the event belongs to.
    pub followup_id: FollowupId,
    /// Session the event belongs to.
    pub session_id: SessionId,
    /// Interaction kind.
    pub event_type: EventType,
    /// Raw payload as submitted by the client.
    #[schema(value_type = Option<Object>)]
    pub event_data: Option<serde_json::Value>,
    /// Visitor context.
    #[serde(flatten)]
    pub context: VisitorContext,
    /// Digest of the originating network address.
    pub ip_hash: IpHash,
    /// Write time; used for all windowing.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Decodes the payload according to the event type.
    #[must_use]
    pub fn payload(&self) -> EventPayload {
        EventPayload::decode(self.event_type, self.event_data.as_ref())
    }
}

/// An event ready to be persisted. The store assigns `id` and `timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    /// Follow-up the event belongs to.
    pub followup_id: FollowupId,
    /// Session the event belongs to.
    pub session_id: SessionId,
    /// Interaction kind.
    pub event_type: EventType,
    /// Raw payload.
    pub event_data: Option<serde_json::Value>,
    /// Visitor context.
    pub context: VisitorContext,
    /// Digest of the originating network address.
    pub ip_hash: IpHash,
}

/// Typed view over an event payload, one variant per [`EventType`].
///
/// Every field is optional: a missing key, a `null`, or a value of the
/// wrong JSON type all decode to `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// `PAGE_VIEW` carries no payload.
    PageView,
    /// `SECTION_VIEW`.
    SectionView {
        /// Section identifier (e.g. `"meeting-recap"`).
        section_id: Option<String>,
        /// Section kind (e.g. `"recap"`).
        section_type: Option<String>,
        /// Section heading.
        section_title: Option<String>,
    },
    /// `SECTION_TIME`.
    SectionTime {
        /// Section key: `sectionName`, falling back to `sectionId`.
        section: Option<String>,
        /// Dwell time in milliseconds: `timeSpentMs`, falling back to `duration`.
        time_spent_ms: Option<u64>,
    },
    /// `SCROLL_DEPTH`.
    ScrollDepth {
        /// Current scroll depth, 0–100.
        scroll_depth_percent: Option<f64>,
        /// Deepest scroll reached, 0–100.
        max_scroll_depth_percent: Option<f64>,
    },
    /// `FILE_DOWNLOAD`.
    FileDownload {
        /// Downloaded file identifier.
        file_id: Option<String>,
        /// Downloaded file name.
        filename: Option<String>,
    },
    /// `LINK_CLICK`.
    LinkClick {
        /// Target URL.
        url: Option<String>,
        /// Anchor text.
        link_text: Option<String>,
        /// Section the link was in.
        section_id: Option<String>,
    },
    /// `COPY_EMAIL`.
    CopyEmail {
        /// Copied value.
        value: Option<String>,
        /// Contact the value belongs to.
        contact_id: Option<String>,
    },
    /// `COPY_PHONE`.
    CopyPhone {
        /// Copied value.
        value: Option<String>,
        /// Contact the value belongs to.
        contact_id: Option<String>,
    },
}

impl EventPayload {
    /// Decodes a raw payload for the given event type.
    #[must_use]
    pub fn decode(event_type: EventType, data: Option<&serde_json::Value>) -> Self {
        match event_type {
            EventType::PageView => Self::PageView,
            EventType::SectionView => Self::SectionView {
                section_id: text(data, "sectionId"),
                section_type: text(data, "sectionType"),
                section_title: text(data, "sectionTitle"),
            },
            EventType::SectionTime => Self::SectionTime {
                section: text(data, "sectionName").or_else(|| text(data, "sectionId")),
                time_spent_ms: millis(data, "timeSpentMs").or_else(|| millis(data, "duration")),
            },
            EventType::ScrollDepth => Self::ScrollDepth {
                scroll_depth_percent: number(data, "scrollDepthPercent"),
                max_scroll_depth_percent: number(data, "maxScrollDepthPercent"),
            },
            EventType::FileDownload => Self::FileDownload {
                file_id: text(data, "fileId"),
                filename: text(data, "filename"),
            },
            EventType::LinkClick => Self::LinkClick {
                url: text(data, "url"),
                link_text: text(data, "linkText"),
                section_id: text(data, "sectionId"),
            },
            EventType::CopyEmail => Self::CopyEmail {
                value: text(data, "value"),
                contact_id: text(data, "contactId"),
            },
            EventType::CopyPhone => Self::CopyPhone {
                value: text(data, "value"),
                contact_id: text(data, "contactId"),
            },
        }
    }
}

/// Non-empty string field.
fn text(data: Option<&serde_json::Value>, key: &str) -> Option<String> {
    data?
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Finite numeric field.
fn number(data: Option<&serde_json::Value>, key: &str) -> Option<f64> {
    data?.get(key)?.as_f64().filter(|n| n.is_finite())
}

/// Non-negative millisecond count; fractional values are truncated.
fn millis(data: Option<&serde_json::Value>, key: &str) -> Option<u64> {
    let value = data?.get(key)?;
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let ms = n.trunc() as u64;
                ms
            })
    })
}
