//! Revisit detection by hashed network origin.

use std::sync::Arc;

use crate::domain::{EventType, FollowupId, IpHash, RevisitInfo, SessionId};
use crate::error::EngagementError;
use crate::persistence::{EventQuery, EventStore};

/// Classifies a page view as a first view or a revisit.
///
/// Visitors are identified only by the hash of their network origin, so
/// viewers sharing an address (offices, NAT) count as the same visitor.
#[derive(Debug, Clone)]
pub struct RevisitDetector {
    events: Arc<dyn EventStore>,
}

impl RevisitDetector {
    /// Creates a new `RevisitDetector`.
    #[must_use]
    pub const fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Looks for earlier sessions that viewed `followup_id` from the same
    /// hashed origin.
    ///
    /// # Errors
    ///
    /// Returns a store error if the lookup fails.
    pub async fn check_revisit(
        &self,
        followup_id: FollowupId,
        ip_hash: &IpHash,
        current_session: SessionId,
    ) -> Result<RevisitInfo, EngagementError> {
        let query = EventQuery::for_followup(followup_id)
            .of_type(EventType::PageView)
            .with_ip_hash(ip_hash.clone())
            .excluding_session(current_session);
        let prior = self.events.distinct_sessions(&query).await?;

        Ok(RevisitInfo {
            is_revisit: !prior.is_empty(),
            previous_visit_count: prior.len() as u64,
            last_visit_at: prior.first().map(|s| s.last_seen),
        })
    }
}
