//! Read models returned by the aggregation and feedback operations.
//!
//! These are plain serializable shapes; all arithmetic that fills them lives
//! in [`crate::service::aggregate`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{Confirmation, ConfirmationType, FollowupId, Session};

/// Page views per device class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceBreakdown {
    /// Views from phones.
    pub mobile: u64,
    /// Views from tablets.
    pub tablet: u64,
    /// Views from desktops.
    pub desktop: u64,
}

/// Event count for one city/country pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LocationCount {
    /// City name.
    pub city: String,
    /// Country name.
    pub country: String,
    /// Number of located events.
    pub count: u64,
}

/// Windowed statistics for one follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowupAnalytics {
    /// Follow-up the figures belong to.
    pub followup_id: FollowupId,
    /// Page views in the window.
    pub total_views: u64,
    /// Distinct sessions with a page view in the window.
    pub unique_visitors: u64,
    /// Sum of known session durations, in seconds.
    pub total_duration: i64,
    /// Mean known session duration, floored, in seconds.
    pub average_duration: i64,
    /// File download events.
    pub file_downloads: u64,
    /// Link click events.
    pub link_clicks: u64,
    /// Email copy events.
    pub email_copies: u64,
    /// Phone copy events.
    pub phone_copies: u64,
    /// Page views per device.
    pub device_breakdown: DeviceBreakdown,
    /// Up to five locations, ordered by city name.
    pub top_locations: Vec<LocationCount>,
    /// Newest sessions started in the window.
    pub recent_sessions: Vec<Session>,
}

/// One entry of the owner's best-performing follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TopFollowup {
    /// Follow-up identifier.
    pub followup_id: FollowupId,
    /// Page title.
    pub title: String,
    /// Recipient company, if linked.
    pub company_name: Option<String>,
    /// Events in the window.
    pub views: u64,
    /// Engagement events in the window.
    pub engagements: u64,
}

/// Windowed statistics across all of an owner's follow-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    /// Follow-ups of any status.
    pub total_followups: u64,
    /// Published follow-ups.
    pub published_followups: u64,
    /// Events in the window across all follow-ups.
    pub total_views: u64,
    /// Engagement events in the window.
    pub total_engagements: u64,
    /// `round(engagements / views * 100)`, 0 without views.
    pub average_engagement_rate: u64,
    /// Up to five published follow-ups by windowed event count.
    pub top_performing_followups: Vec<TopFollowup>,
}

/// Positive/negative tally for one feedback prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeedbackTally {
    /// Affirmative answers.
    pub positive: u64,
    /// Negative answers.
    pub negative: u64,
    /// Sum of both.
    pub total: u64,
}

impl FeedbackTally {
    /// Builds a tally from the two answer counts.
    #[must_use]
    pub const fn new(positive: u64, negative: u64) -> Self {
        Self {
            positive,
            negative,
            total: positive + negative,
        }
    }
}

/// Feedback prompts answered on a follow-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackBreakdown {
    /// Recap accuracy prompt.
    pub recap: FeedbackTally,
    /// Value proposition prompt.
    pub value_proposition: FeedbackTally,
}

/// Dwell time accumulated for one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SectionEngagement {
    /// Section key from the payload.
    pub section_name: String,
    /// Accumulated dwell time in milliseconds.
    pub total_time_spent: u64,
    /// Number of dwell events.
    pub view_count: u64,
}

/// Click count for one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct LinkClickCount {
    /// Target URL.
    pub url: String,
    /// Number of clicks.
    pub count: u64,
}

/// Explicit interest expressed through confirmations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InterestSignals {
    /// `INTERESTED` confirmations.
    pub interested_count: u64,
    /// `SCHEDULE_CALL` confirmations.
    pub schedule_call_count: u64,
    /// Sum of both.
    pub total_interest: u64,
}

/// All-time engagement detail for one follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailedFollowupAnalytics {
    /// Follow-up the figures belong to.
    pub followup_id: FollowupId,
    /// Distinct sessions with a page view.
    pub unique_visitors: u64,
    /// Page views.
    pub total_page_views: u64,
    /// Mean known session duration, rounded, in seconds.
    pub average_time_on_page: i64,
    /// Feedback prompt tallies.
    pub feedback: FeedbackBreakdown,
    /// Dwell time per section, first-seen order.
    pub section_engagement: Vec<SectionEngagement>,
    /// Clicks per URL, most clicked first.
    pub link_clicks: Vec<LinkClickCount>,
    /// Interest confirmations.
    pub interest_signals: InterestSignals,
    /// Page views per device.
    pub device_breakdown: DeviceBreakdown,
    /// Up to five locations, ordered by city name.
    pub top_locations: Vec<LocationCount>,
}

/// All-time owner summary shown on the dashboard landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Published plus draft follow-ups.
    pub total_followups: u64,
    /// Published follow-ups.
    pub published_followups: u64,
    /// Draft follow-ups.
    pub draft_followups: u64,
    /// Creation time of the newest follow-up.
    pub most_recent_followup_date: Option<DateTime<Utc>>,
    /// Page views.
    pub total_views: u64,
    /// Distinct sessions with a page view.
    pub total_unique_visitors: u64,
    /// Engagement events, dwell events included.
    pub total_engagements: u64,
    /// `round(engagements / views * 100)`, 0 without views.
    pub average_engagement_rate: u64,
}

/// Confirmation statistics for one follow-up.
///
/// Rates are `None` when their denominator is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationMetrics {
    /// Sum of `by_type`.
    pub total: u64,
    /// Count per confirmation type; every type is present.
    pub by_type: BTreeMap<ConfirmationType, u64>,
    /// Accurate share of recap answers, 0–100.
    pub recap_accuracy_rate: Option<u64>,
    /// Clear share of value proposition answers, 0–100.
    pub value_prop_resonance_rate: Option<u64>,
    /// Interest share of all confirmations, 0–100.
    pub interest_rate: Option<u64>,
    /// Newest confirmations.
    pub recent_confirmations: Vec<Confirmation>,
}
