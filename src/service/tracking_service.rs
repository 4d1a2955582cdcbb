//! Event ingestion and session lifecycle.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    Event, EventType, FollowupId, IpHash, NewEvent, NewSession, PageView, PageViewDispatcher,
    Session, SessionId, VisitorContext,
};
use crate::error::EngagementError;
use crate::persistence::{EventStore, FollowupDirectory, SessionStore, Stores};

/// A visitor event as submitted, before identity hashing.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSubmission {
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
}

/// Public, unauthenticated write path for visitor activity.
///
/// Every write first checks that the follow-up is published; anything
/// else is reported as not found. Page views are handed to the
/// [`PageViewDispatcher`] after the event is stored.
#[derive(Debug, Clone)]
pub struct TrackingService {
    followups: Arc<dyn FollowupDirectory>,
    events: Arc<dyn EventStore>,
    sessions: Arc<dyn SessionStore>,
    page_views: PageViewDispatcher,
}

impl TrackingService {
    /// Creates a new `TrackingService`.
    #[must_use]
    pub fn new(stores: &Stores, page_views: PageViewDispatcher) -> Self {
        Self {
            followups: Arc::clone(&stores.followups),
            events: Arc::clone(&stores.events),
            sessions: Arc::clone(&stores.sessions),
            page_views,
        }
    }

    /// Records a visitor event originating from network address `origin`.
    ///
    /// Only the hash of `origin` is stored. For `PAGE_VIEW` events the
    /// notification pipeline is triggered without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the follow-up is missing or
    /// unpublished, or a store error if the write fails.
    pub async fn track_event(
        &self,
        submission: EventSubmission,
        origin: &str,
    ) -> Result<Event, EngagementError> {
        self.followups
            .find_published_by_id(submission.followup_id)
            .await?
            .ok_or_else(EngagementError::followup_not_found)?;

        let event = self
            .events
            .insert_event(NewEvent {
                followup_id: submission.followup_id,
                session_id: submission.session_id,
                event_type: submission.event_type,
                event_data: submission.event_data,
                context: submission.context,
                ip_hash: IpHash::from_address(origin),
            })
            .await?;

        tracing::debug!(
            followup_id = %event.followup_id,
            session_id = %event.session_id,
            event_type = %event.event_type,
            "event tracked"
        );

        if event.event_type == EventType::PageView {
            self.page_views.dispatch(PageView {
                followup_id: event.followup_id,
                session_id: event.session_id,
                ip_hash: event.ip_hash.clone(),
                context: event.context.clone(),
            });
        }

        Ok(event)
    }

    /// Opens a session on a published follow-up.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the follow-up is missing or
    /// unpublished, or a store error if the write fails.
    pub async fn start_session(
        &self,
        followup_id: FollowupId,
        context: VisitorContext,
    ) -> Result<Session, EngagementError> {
        self.followups
            .find_published_by_id(followup_id)
            .await?
            .ok_or_else(EngagementError::followup_not_found)?;

        let session = self
            .sessions
            .insert_session(NewSession {
                followup_id,
                context,
            })
            .await?;
        tracing::debug!(%followup_id, session_id = %session.id, "session started");
        Ok(session)
    }

    /// Closes a session, recording its duration in whole seconds.
    ///
    /// Ending an already ended session returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the session does not exist,
    /// or a store error if the write fails.
    pub async fn end_session(&self, session_id: SessionId) -> Result<Session, EngagementError> {
        let session = self
            .sessions
            .find_session(session_id)
            .await?
            .ok_or_else(EngagementError::session_not_found)?;
        if session.is_ended() {
            return Ok(session);
        }

        let ended_at = Utc::now();
        let duration = session.duration_until(ended_at);
        match self
            .sessions
            .close_session(session_id, ended_at, duration)
            .await?
        {
            Some(closed) => {
                tracing::debug!(%session_id, page_duration = duration, "session ended");
                Ok(closed)
            }
            // Closed concurrently; the first close wins.
            None => self
                .sessions
                .find_session(session_id)
                .await?
                .ok_or_else(EngagementError::session_not_found),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{FollowupStatus, NotificationType, PageViewHandler};
    use crate::persistence::EventQuery;
    use crate::service::{LogChannel, NotificationService, NotificationSettings};
    use crate::service::test_support::{Fixture, OWNER};

    fn submission(followup_id: FollowupId, event_type: EventType) -> EventSubmission {
        EventSubmission {
            followup_id,
            session_id: SessionId::new(),
            event_type,
            event_data: None,
            context: VisitorContext::default(),
        }
    }

    #[tokio::test]
    async fn page_view_is_stored_hashed_and_dispatched() {
        let fx = Fixture::new();
        let (dispatcher, mut rx) = PageViewDispatcher::channel(8);
        let service = TrackingService::new(&fx.stores, dispatcher);
        let followup = fx.followup(OWNER, FollowupStatus::Published).await;

        let Ok(event) = service
            .track_event(submission(followup.id, EventType::PageView), "203.0.113.9")
            .await
        else {
            panic!("tracking should succeed");
        };
        assert_eq!(event.ip_hash, IpHash::from_address("203.0.113.9"));
        assert_ne!(event.ip_hash.as_str(), "203.0.113.9");

        let Ok(job) = rx.try_recv() else {
            panic!("page view should be queued");
        };
        assert_eq!(job.session_id, event.session_id);
        assert_eq!(job.ip_hash, event.ip_hash);
    }

    #[tokio::test]
    async fn page_view_reaches_owner_through_worker() {
        let fx = Fixture::new();
        let notifications = Arc::new(NotificationService::new(
            &fx.stores,
            Arc::new(LogChannel),
            NotificationSettings::default(),
        ));
        let (dispatcher, worker) = PageViewDispatcher::spawn(
            8,
            Arc::clone(&notifications) as Arc<dyn PageViewHandler>,
        );
        let service = TrackingService::new(&fx.stores, dispatcher);
        let followup = fx.followup(OWNER, FollowupStatus::Published).await;

        let Ok(event) = service
            .track_event(submission(followup.id, EventType::PageView), "203.0.113.9")
            .await
        else {
            panic!("tracking should succeed");
        };

        drop(service);
        let Ok(()) = worker.await else {
            panic!("worker should drain and stop");
        };

        let Ok(history) = notifications
            .notifications_by_followup(followup.id, OWNER)
            .await
        else {
            panic!("history should load");
        };
        let [notification] = history.as_slice() else {
            panic!("expected one notification");
        };
        assert_eq!(notification.kind, NotificationType::FirstView);
        assert_eq!(notification.viewer_session_id, Some(event.session_id));
        assert!(notification.delivered);
    }

    #[tokio::test]
    async fn other_events_are_not_dispatched() {
        let fx = Fixture::new();
        let (dispatcher, mut rx) = PageViewDispatcher::channel(8);
        let service = TrackingService::new(&fx.stores, dispatcher);
        let followup = fx.followup(OWNER, FollowupStatus::Published).await;

        let result = service
            .track_event(submission(followup.id, EventType::LinkClick), "203.0.113.9")
            .await;
        assert!(result.is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn draft_followup_rejects_event_and_stores_nothing() {
        let fx = Fixture::new();
        let (dispatcher, mut rx) = PageViewDispatcher::channel(8);
        let service = TrackingService::new(&fx.stores, dispatcher);
        let draft = fx.followup(OWNER, FollowupStatus::Draft).await;

        let Err(err) = service
            .track_event(submission(draft.id, EventType::PageView), "203.0.113.9")
            .await
        else {
            panic!("draft follow-up must reject events");
        };
        assert_eq!(err, EngagementError::followup_not_found());

        let Ok(stored) = fx
            .stores
            .events
            .count_events(&EventQuery::for_followup(draft.id))
            .await
        else {
            panic!("count failed");
        };
        assert_eq!(stored, 0);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unknown_followup_is_not_found() {
        let fx = Fixture::new();
        let (dispatcher, _rx) = PageViewDispatcher::channel(8);
        let service = TrackingService::new(&fx.stores, dispatcher);
        let result = service
            .track_event(submission(FollowupId::new(), EventType::PageView), "x")
            .await;
        assert_eq!(result.err(), Some(EngagementError::followup_not_found()));
        let result = service
            .start_session(FollowupId::new(), VisitorContext::default())
            .await;
        assert_eq!(result.err(), Some(EngagementError::followup_not_found()));
    }

    #[tokio::test]
    async fn end_session_computes_duration_once() {
        let fx = Fixture::new();
        let (dispatcher, _rx) = PageViewDispatcher::channel(8);
        let service = TrackingService::new(&fx.stores, dispatcher);
        let followup = fx.followup(OWNER, FollowupStatus::Published).await;

        let Ok(session) = service
            .start_session(followup.id, VisitorContext::default())
            .await
        else {
            panic!("start should succeed");
        };
        fx.memory
            .backdate_session(session.id, chrono::Duration::seconds(42))
            .await;

        let Ok(first) = service.end_session(session.id).await else {
            panic!("end should succeed");
        };
        assert_eq!(first.page_duration, Some(42));
        assert!(first.is_ended());

        fx.memory
            .backdate_session(session.id, chrono::Duration::seconds(100))
            .await;
        let Ok(second) = service.end_session(session.id).await else {
            panic!("second end should succeed");
        };
        assert_eq!(second.page_duration, Some(42));
        assert_eq!(second.session_end, first.session_end);
    }

    #[tokio::test]
    async fn end_unknown_session_is_not_found() {
        let fx = Fixture::new();
        let (dispatcher, _rx) = PageViewDispatcher::channel(8);
        let service = TrackingService::new(&fx.stores, dispatcher);
        let result = service.end_session(SessionId::new()).await;
        assert_eq!(result.err(), Some(EngagementError::session_not_found()));
    }
}
