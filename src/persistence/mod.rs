//! Persistence layer: store interfaces and their backends.
//!
//! Each record family is reached through its own async trait so services
//! depend only on the primitives they use (insert, count, distinct,
//! group-by, time-range filter). Two backends implement every trait:
//!
//! - [`memory::MemoryStore`] keeps everything in process behind
//!   `tokio::sync::RwLock`s (tests, local runs).
//! - [`postgres::PostgresStore`] runs against PostgreSQL via `sqlx`.
//!
//! [`Stores`] bundles one handle per trait; it is built once at start-up
//! and injected into the services.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod query;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Confirmation, ConfirmationType, DeviceType, Event, EventType, FollowupId, FollowupRef,
    FollowupStatus, LocationCount, NewConfirmation, NewEvent, NewNotification, NewSession,
    Notification, NotificationPreference, Session, SessionId,
};
use crate::error::EngagementError;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use query::EventQuery;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, EngagementError>;

/// A distinct session seen in the event log, with its latest matching event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSighting {
    /// Session identifier.
    pub session_id: SessionId,
    /// Timestamp of the session's latest matching event.
    pub last_seen: DateTime<Utc>,
}

/// Lookup interface onto the external follow-up collaborator.
#[async_trait]
pub trait FollowupDirectory: Send + Sync + fmt::Debug {
    /// Finds a follow-up regardless of status.
    async fn find_by_id(&self, id: FollowupId) -> StoreResult<Option<FollowupRef>>;

    /// Finds a follow-up only if it is published.
    async fn find_published_by_id(&self, id: FollowupId) -> StoreResult<Option<FollowupRef>> {
        Ok(self.find_by_id(id).await?.filter(FollowupRef::is_published))
    }

    /// Finds a published follow-up by its public slug.
    async fn find_published_by_slug(&self, slug: &str) -> StoreResult<Option<FollowupRef>>;

    /// Lists an owner's follow-ups, newest first, optionally by status.
    async fn find_many_by_owner(
        &self,
        user_id: &str,
        status: Option<FollowupStatus>,
    ) -> StoreResult<Vec<FollowupRef>>;
}

/// Append-only visitor event log.
#[async_trait]
pub trait EventStore: Send + Sync + fmt::Debug {
    /// Persists an event, assigning its id and timestamp.
    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event>;

    /// Counts matching events.
    async fn count_events(&self, query: &EventQuery) -> StoreResult<u64>;

    /// Lists matching events, oldest first.
    async fn list_events(&self, query: &EventQuery) -> StoreResult<Vec<Event>>;

    /// Counts distinct sessions among matching events.
    async fn count_distinct_sessions(&self, query: &EventQuery) -> StoreResult<u64>;

    /// Distinct sessions among matching events, most recently seen first.
    async fn distinct_sessions(&self, query: &EventQuery) -> StoreResult<Vec<SessionSighting>>;

    /// Matching events grouped by type.
    async fn count_by_type(&self, query: &EventQuery) -> StoreResult<BTreeMap<EventType, u64>>;

    /// Matching events grouped by device; events without a device are
    /// not counted.
    async fn count_by_device(&self, query: &EventQuery)
    -> StoreResult<BTreeMap<DeviceType, u64>>;

    /// Matching events grouped by follow-up.
    async fn count_by_followup(
        &self,
        query: &EventQuery,
    ) -> StoreResult<HashMap<FollowupId, u64>>;

    /// Located events grouped by city and country, ordered by city then
    /// country ascending, at most `limit` groups.
    async fn top_locations(
        &self,
        query: &EventQuery,
        limit: usize,
    ) -> StoreResult<Vec<LocationCount>>;
}

/// Mutable visit records.
#[async_trait]
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// Opens a session, assigning its id and start time.
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session>;

    /// Finds a session by id.
    async fn find_session(&self, id: SessionId) -> StoreResult<Option<Session>>;

    /// Sets end time and duration if the session is still open.
    ///
    /// Returns the closed session, or `None` if it does not exist or was
    /// already closed.
    async fn close_session(
        &self,
        id: SessionId,
        ended_at: DateTime<Utc>,
        page_duration: i64,
    ) -> StoreResult<Option<Session>>;

    /// Sessions of a follow-up started at or after `since`, newest first.
    async fn recent_sessions(
        &self,
        followup_id: FollowupId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Session>>;

    /// Known `page_duration` values of a follow-up's sessions, optionally
    /// only those started at or after `since`.
    async fn known_durations(
        &self,
        followup_id: FollowupId,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<i64>>;
}

/// Visitor feedback records.
#[async_trait]
pub trait ConfirmationStore: Send + Sync + fmt::Debug {
    /// Persists a confirmation, assigning its id and time.
    async fn insert_confirmation(&self, confirmation: NewConfirmation)
    -> StoreResult<Confirmation>;

    /// Confirmations of a follow-up, newest first.
    async fn list_confirmations(
        &self,
        followup_id: FollowupId,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Confirmation>>;

    /// Confirmations of a follow-up grouped by type; absent types are
    /// omitted.
    async fn count_confirmations_by_type(
        &self,
        followup_id: FollowupId,
    ) -> StoreResult<BTreeMap<ConfirmationType, u64>>;
}

/// Owner notification preferences, one row per user.
#[async_trait]
pub trait PreferenceStore: Send + Sync + fmt::Debug {
    /// Finds a user's stored preference.
    async fn find_preference(&self, user_id: &str) -> StoreResult<Option<NotificationPreference>>;

    /// Stores the default preference for `user_id`.
    ///
    /// Fails with [`EngagementError::Conflict`] if the user already has one.
    async fn insert_default_preference(&self, user_id: &str)
    -> StoreResult<NotificationPreference>;

    /// Overwrites a stored preference.
    async fn update_preference(
        &self,
        preference: &NotificationPreference,
    ) -> StoreResult<NotificationPreference>;
}

/// Notification records.
#[async_trait]
pub trait NotificationStore: Send + Sync + fmt::Debug {
    /// Persists an undelivered notification.
    ///
    /// Fails with [`EngagementError::Conflict`] if one already exists for
    /// the same follow-up, user and viewer session.
    async fn insert_notification(&self, notification: NewNotification)
    -> StoreResult<Notification>;

    /// Marks a notification as accepted by the delivery channel.
    async fn mark_delivered(&self, id: uuid::Uuid) -> StoreResult<()>;

    /// Records a delivery failure.
    async fn mark_delivery_failed(&self, id: uuid::Uuid, error: &str) -> StoreResult<()>;

    /// Whether a notification exists for the triple.
    async fn notification_exists(
        &self,
        followup_id: FollowupId,
        user_id: &str,
        viewer_session_id: SessionId,
    ) -> StoreResult<bool>;

    /// Notifications sent to `user_id` about `followup_id` at or after
    /// `since`.
    async fn count_notifications_since(
        &self,
        followup_id: FollowupId,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<u64>;

    /// Notifications about a follow-up, newest first.
    async fn notifications_for_followup(
        &self,
        followup_id: FollowupId,
    ) -> StoreResult<Vec<Notification>>;

    /// Notifications sent to a user, newest first.
    async fn notifications_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<Notification>>;
}

/// One shared handle per store interface.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Follow-up lookups.
    pub followups: Arc<dyn FollowupDirectory>,
    /// Event log.
    pub events: Arc<dyn EventStore>,
    /// Sessions.
    pub sessions: Arc<dyn SessionStore>,
    /// Confirmations.
    pub confirmations: Arc<dyn ConfirmationStore>,
    /// Preferences.
    pub preferences: Arc<dyn PreferenceStore>,
    /// Notifications.
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    /// Uses one backend for every interface.
    #[must_use]
    pub fn from_backend<S>(backend: &Arc<S>) -> Self
    where
        S: FollowupDirectory
            + EventStore
            + SessionStore
            + ConfirmationStore
            + PreferenceStore
            + NotificationStore
            + 'static,
    {
        Self {
            followups: Arc::clone(backend) as Arc<dyn FollowupDirectory>,
            events: Arc::clone(backend) as Arc<dyn EventStore>,
            sessions: Arc::clone(backend) as Arc<dyn SessionStore>,
            confirmations: Arc::clone(backend) as Arc<dyn ConfirmationStore>,
            preferences: Arc::clone(backend) as Arc<dyn PreferenceStore>,
            notifications: Arc::clone(backend) as Arc<dyn NotificationStore>,
        }
    }
}
