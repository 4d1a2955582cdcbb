//! Domain layer: identifiers, records, report shapes, and the page-view
//! queue.
//!
//! Nothing in this module performs I/O. Records are produced by the
//! [`crate::persistence`] stores and consumed by the [`crate::service`]
//! layer.

pub mod confirmation;
pub mod event;
pub mod followup;
pub mod ids;
pub mod ip_hash;
pub mod notification;
pub mod page_view_queue;
pub mod report;
pub mod session;
pub mod time_range;

pub use confirmation::{Confirmation, ConfirmationType, NewConfirmation};
pub use event::{DeviceType, Event, EventPayload, EventType, NewEvent, VisitorContext};
pub use followup::{FollowupBrief, FollowupRef, FollowupStatus};
pub use ids::{FollowupId, SessionId};
pub use ip_hash::IpHash;
pub use notification::{
    NewNotification, Notification, NotificationPreference, NotificationType,
    NotificationWithFollowup, PreferenceUpdate, RevisitInfo,
};
pub use page_view_queue::{PageView, PageViewDispatcher, PageViewHandler};
pub use report::{
    AnalyticsSummary, ConfirmationMetrics, DetailedFollowupAnalytics, DeviceBreakdown,
    FeedbackBreakdown, FeedbackTally, FollowupAnalytics, InterestSignals, LinkClickCount,
    LocationCount, OwnerSummary, SectionEngagement, TopFollowup,
};
pub use session::{NewSession, Session};
pub use time_range::TimeRange;
