//! Event filter shared by every [`super::EventStore`] read.

use chrono::{DateTime, Utc};

use crate::domain::{Event, EventType, FollowupId, IpHash, SessionId};

/// Conjunction of event filters.
///
/// An empty `followup_ids` set matches nothing; an empty `event_types` set
/// matches every type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Follow-ups to include.
    pub followup_ids: Vec<FollowupId>,
    /// Event types to include; empty means all.
    pub event_types: Vec<EventType>,
    /// Inclusive lower bound on `timestamp`.
    pub since: Option<DateTime<Utc>>,
    /// Only events from this hashed identity.
    pub ip_hash: Option<IpHash>,
    /// Skip events of this session.
    pub exclude_session: Option<SessionId>,
    /// Only events with both city and country present.
    pub located_only: bool,
}

impl EventQuery {
    /// Events of a single follow-up.
    #[must_use]
    pub fn for_followup(id: FollowupId) -> Self {
        Self {
            followup_ids: vec![id],
            ..Self::default()
        }
    }

    /// Events of any of the given follow-ups.
    #[must_use]
    pub fn for_followups(ids: impl IntoIterator<Item = FollowupId>) -> Self {
        Self {
            followup_ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Restricts to one event type.
    #[must_use]
    pub fn of_type(mut self, event_type: EventType) -> Self {
        self.event_types = vec![event_type];
        self
    }

    /// Restricts to a set of event types.
    #[must_use]
    pub fn of_types(mut self, event_types: &[EventType]) -> Self {
        self.event_types = event_types.to_vec();
        self
    }

    /// Restricts to events written at or after `since`.
    #[must_use]
    pub const fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Restricts to one hashed identity.
    #[must_use]
    pub fn with_ip_hash(mut self, ip_hash: IpHash) -> Self {
        self.ip_hash = Some(ip_hash);
        self
    }

    /// Skips events of `session`.
    #[must_use]
    pub const fn excluding_session(mut self, session: SessionId) -> Self {
        self.exclude_session = Some(session);
        self
    }

    /// Restricts to events carrying both city and country.
    #[must_use]
    pub const fn located(mut self) -> Self {
        self.located_only = true;
        self
    }

    /// In-process evaluation of the filter.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        self.followup_ids.contains(&event.followup_id)
            && (self.event_types.is_empty() || self.event_types.contains(&event.event_type))
            && self.since.is_none_or(|since| event.timestamp >= since)
            && self.ip_hash.as_ref().is_none_or(|h| *h == event.ip_hash)
            && self.exclude_session != Some(event.session_id)
            && (!self.located_only
                || (event.context.location_city.is_some()
                    && event.context.location_country.is_some()))
    }
}
