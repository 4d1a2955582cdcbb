//! In-process store backend.
//!
//! Every record family lives in its own [`tokio::sync::RwLock`]ed
//! collection, so aggregation reads never block writers of another family.
//! The notification and preference collections enforce the same uniqueness
//! rules as the PostgreSQL schema.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    ConfirmationStore, EventQuery, EventStore, FollowupDirectory, NotificationStore,
    PreferenceStore, SessionSighting, SessionStore, StoreResult,
};
use crate::domain::{
    Confirmation, ConfirmationType, DeviceType, Event, EventType, FollowupId, FollowupRef,
    FollowupStatus, LocationCount, NewConfirmation, NewEvent, NewNotification, NewSession,
    Notification, NotificationPreference, Session, SessionId,
};
use crate::error::EngagementError;

/// Store backend holding all records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    followups: RwLock<HashMap<FollowupId, FollowupRef>>,
    events: RwLock<Vec<Event>>,
    sessions: RwLock<HashMap<SessionId, Session>>,
    confirmations: RwLock<Vec<Confirmation>>,
    preferences: RwLock<HashMap<String, NotificationPreference>>,
    notifications: RwLock<Vec<Notification>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a follow-up in the directory.
    pub async fn upsert_followup(&self, followup: FollowupRef) {
        self.followups.write().await.insert(followup.id, followup);
    }

    /// Loads a batch of follow-ups, returning how many were new.
    pub async fn seed_followups(&self, followups: impl IntoIterator<Item = FollowupRef>) -> usize {
        let mut map = self.followups.write().await;
        let before = map.len();
        for followup in followups {
            map.insert(followup.id, followup);
        }
        map.len().saturating_sub(before)
    }

    /// Shifts the timestamps of a follow-up's events into the past.
    #[cfg(test)]
    pub(crate) async fn backdate_events(&self, followup_id: FollowupId, by: chrono::Duration) {
        for event in self.events.write().await.iter_mut() {
            if event.followup_id == followup_id {
                event.timestamp -= by;
            }
        }
    }

    /// Shifts a session's start into the past.
    #[cfg(test)]
    pub(crate) async fn backdate_session(&self, id: SessionId, by: chrono::Duration) {
        if let Some(session) = self.sessions.write().await.get_mut(&id) {
            session.session_start -= by;
        }
    }

    /// Shifts the send time of a follow-up's notifications into the past.
    #[cfg(test)]
    pub(crate) async fn backdate_notifications(
        &self,
        followup_id: FollowupId,
        by: chrono::Duration,
    ) {
        for notification in self.notifications.write().await.iter_mut() {
            if notification.followup_id == followup_id {
                notification.sent_at -= by;
            }
        }
    }
}

#[async_trait]
impl FollowupDirectory for MemoryStore {
    async fn find_by_id(&self, id: FollowupId) -> StoreResult<Option<FollowupRef>> {
        Ok(self.followups.read().await.get(&id).cloned())
    }

    async fn find_published_by_slug(&self, slug: &str) -> StoreResult<Option<FollowupRef>> {
        Ok(self
            .followups
            .read()
            .await
            .values()
            .find(|f| f.slug == slug && f.is_published())
            .cloned())
    }

    async fn find_many_by_owner(
        &self,
        user_id: &str,
        status: Option<FollowupStatus>,
    ) -> StoreResult<Vec<FollowupRef>> {
        let mut owned: Vec<FollowupRef> = self
            .followups
            .read()
            .await
            .values()
            .filter(|f| f.is_owned_by(user_id) && status.is_none_or(|s| f.status == s))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event> {
        let stored = Event {
            id: uuid::Uuid::new_v4(),
            followup_id: event.followup_id,
            session_id: event.session_id,
            event_type: event.event_type,
            event_data: event.event_data,
            context: event.context,
            ip_hash: event.ip_hash,
            timestamp: Utc::now(),
        };
        self.events.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn count_events(&self, query: &EventQuery) -> StoreResult<u64> {
        let events = self.events.read().await;
        Ok(events.iter().filter(|e| query.matches(e)).count() as u64)
    }

    async fn list_events(&self, query: &EventQuery) -> StoreResult<Vec<Event>> {
        let events = self.events.read().await;
        let mut matching: Vec<Event> = events.iter().filter(|e| query.matches(e)).cloned().collect();
        matching.sort_by_key(|e| e.timestamp);
        Ok(matching)
    }

    async fn count_distinct_sessions(&self, query: &EventQuery) -> StoreResult<u64> {
        Ok(self.distinct_sessions(query).await?.len() as u64)
    }

    async fn distinct_sessions(&self, query: &EventQuery) -> StoreResult<Vec<SessionSighting>> {
        let events = self.events.read().await;
        let mut latest: HashMap<SessionId, DateTime<Utc>> = HashMap::new();
        for event in events.iter().filter(|e| query.matches(e)) {
            latest
                .entry(event.session_id)
                .and_modify(|seen| *seen = (*seen).max(event.timestamp))
                .or_insert(event.timestamp);
        }
        let mut sightings: Vec<SessionSighting> = latest
            .into_iter()
            .map(|(session_id, last_seen)| SessionSighting {
                session_id,
                last_seen,
            })
            .collect();
        sightings.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        Ok(sightings)
    }

    async fn count_by_type(&self, query: &EventQuery) -> StoreResult<BTreeMap<EventType, u64>> {
        let events = self.events.read().await;
        let mut counts = BTreeMap::new();
        for event in events.iter().filter(|e| query.matches(e)) {
            *counts.entry(event.event_type).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_by_device(
        &self,
        query: &EventQuery,
    ) -> StoreResult<BTreeMap<DeviceType, u64>> {
        let events = self.events.read().await;
        let mut counts = BTreeMap::new();
        for event in events.iter().filter(|e| query.matches(e)) {
            if let Some(device) = event.context.device_type {
                *counts.entry(device).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    async fn count_by_followup(
        &self,
        query: &EventQuery,
    ) -> StoreResult<HashMap<FollowupId, u64>> {
        let events = self.events.read().await;
        let mut counts = HashMap::new();
        for event in events.iter().filter(|e| query.matches(e)) {
            *counts.entry(event.followup_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn top_locations(
        &self,
        query: &EventQuery,
        limit: usize,
    ) -> StoreResult<Vec<LocationCount>> {
        let events = self.events.read().await;
        let mut groups: BTreeMap<(String, String), u64> = BTreeMap::new();
        for event in events.iter().filter(|e| query.matches(e)) {
            if let (Some(city), Some(country)) = (
                &event.context.location_city,
                &event.context.location_country,
            ) {
                *groups.entry((city.clone(), country.clone())).or_insert(0) += 1;
            }
        }
        Ok(groups
            .into_iter()
            .take(limit)
            .map(|((city, country), count)| LocationCount {
                city,
                country,
                count,
            })
            .collect())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        let stored = Session {
            id: SessionId::new(),
            followup_id: session.followup_id,
            session_start: Utc::now(),
            session_end: None,
            page_duration: None,
            context: session.context,
        };
        self.sessions.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn close_session(
        &self,
        id: SessionId,
        ended_at: DateTime<Utc>,
        page_duration: i64,
    ) -> StoreResult<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(&id) else {
            return Ok(None);
        };
        if session.is_ended() {
            return Ok(None);
        }
        session.session_end = Some(ended_at);
        session.page_duration = Some(page_duration);
        Ok(Some(session.clone()))
    }

    async fn recent_sessions(
        &self,
        followup_id: FollowupId,
        since: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<Session>> {
        let mut matching: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.followup_id == followup_id && s.session_start >= since)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.session_start.cmp(&a.session_start));
        matching.truncate(limit);
        Ok(matching)
    }

    async fn known_durations(
        &self,
        followup_id: FollowupId,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<i64>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.followup_id == followup_id)
            .filter(|s| since.is_none_or(|since| s.session_start >= since))
            .filter_map(|s| s.page_duration)
            .collect())
    }
}

#[async_trait]
impl ConfirmationStore for MemoryStore {
    async fn insert_confirmation(
        &self,
        confirmation: NewConfirmation,
    ) -> StoreResult<Confirmation> {
        let stored = Confirmation {
            id: uuid::Uuid::new_v4(),
            followup_id: confirmation.followup_id,
            session_id: confirmation.session_id,
            kind: confirmation.kind,
            confirmed_at: Utc::now(),
            comment: confirmation.comment,
        };
        self.confirmations.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_confirmations(
        &self,
        followup_id: FollowupId,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Confirmation>> {
        let confirmations = self.confirmations.read().await;
        // Insertion order is chronological; newest first is the reverse.
        Ok(confirmations
            .iter()
            .rev()
            .filter(|c| c.followup_id == followup_id)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn count_confirmations_by_type(
        &self,
        followup_id: FollowupId,
    ) -> StoreResult<BTreeMap<ConfirmationType, u64>> {
        let confirmations = self.confirmations.read().await;
        let mut counts = BTreeMap::new();
        for confirmation in confirmations.iter().filter(|c| c.followup_id == followup_id) {
            *counts.entry(confirmation.kind).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl PreferenceStore for MemoryStore {
    async fn find_preference(&self, user_id: &str) -> StoreResult<Option<NotificationPreference>> {
        Ok(self.preferences.read().await.get(user_id).cloned())
    }

    async fn insert_default_preference(
        &self,
        user_id: &str,
    ) -> StoreResult<NotificationPreference> {
        let mut preferences = self.preferences.write().await;
        if preferences.contains_key(user_id) {
            return Err(EngagementError::Conflict(format!(
                "preferences for {user_id} already exist"
            )));
        }
        let created = NotificationPreference::defaults_for(user_id);
        preferences.insert(user_id.to_string(), created.clone());
        Ok(created)
    }

    async fn update_preference(
        &self,
        preference: &NotificationPreference,
    ) -> StoreResult<NotificationPreference> {
        let mut preferences = self.preferences.write().await;
        let Some(stored) = preferences.get_mut(&preference.user_id) else {
            return Err(EngagementError::NotFound {
                resource: "notification preference",
            });
        };
        stored.clone_from(preference);
        Ok(stored.clone())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        let mut notifications = self.notifications.write().await;
        let duplicate = notifications.iter().any(|n| {
            n.followup_id == notification.followup_id
                && n.user_id == notification.user_id
                && n.viewer_session_id == Some(notification.viewer_session_id)
        });
        if duplicate {
            return Err(EngagementError::Conflict(
                "notification already recorded for this viewer session".to_string(),
            ));
        }
        let stored = Notification {
            id: uuid::Uuid::new_v4(),
            followup_id: notification.followup_id,
            user_id: notification.user_id,
            kind: notification.kind,
            sent_at: Utc::now(),
            viewer_ip_hash: Some(notification.viewer_ip_hash),
            viewer_device_type: notification.viewer.device_type,
            viewer_browser: notification.viewer.browser,
            viewer_location_city: notification.viewer.location_city,
            viewer_location_country: notification.viewer.location_country,
            viewer_session_id: Some(notification.viewer_session_id),
            delivered: false,
            error: None,
        };
        notifications.push(stored.clone());
        Ok(stored)
    }

    async fn mark_delivered(&self, id: uuid::Uuid) -> StoreResult<()> {
        if let Some(n) = self.notifications.write().await.iter_mut().find(|n| n.id == id) {
            n.delivered = true;
            n.error = None;
        }
        Ok(())
    }

    async fn mark_delivery_failed(&self, id: uuid::Uuid, error: &str) -> StoreResult<()> {
        if let Some(n) = self.notifications.write().await.iter_mut().find(|n| n.id == id) {
            n.delivered = false;
            n.error = Some(error.to_string());
        }
        Ok(())
    }

    async fn notification_exists(
        &self,
        followup_id: FollowupId,
        user_id: &str,
        viewer_session_id: SessionId,
    ) -> StoreResult<bool> {
        Ok(self.notifications.read().await.iter().any(|n| {
            n.followup_id == followup_id
                && n.user_id == user_id
                && n.viewer_session_id == Some(viewer_session_id)
        }))
    }

    async fn count_notifications_since(
        &self,
        followup_id: FollowupId,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let notifications = self.notifications.read().await;
        Ok(notifications
            .iter()
            .filter(|n| n.followup_id == followup_id && n.user_id == user_id && n.sent_at >= since)
            .count() as u64)
    }

    async fn notifications_for_followup(
        &self,
        followup_id: FollowupId,
    ) -> StoreResult<Vec<Notification>> {
        let mut matching: Vec<Notification> = self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.followup_id == followup_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        Ok(matching)
    }

    async fn notifications_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> StoreResult<Vec<Notification>> {
        let mut matching: Vec<Notification> = self
            .notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
        matching.truncate(limit);
        Ok(matching)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{IpHash, NotificationType, VisitorContext};

    fn located(city: &str, country: &str) -> VisitorContext {
        VisitorContext {
            location_city: Some(city.to_string()),
            location_country: Some(country.to_string()),
            ..VisitorContext::default()
        }
    }

    async fn insert(store: &MemoryStore, followup_id: FollowupId, context: VisitorContext) {
        let result = store
            .insert_event(NewEvent {
                followup_id,
                session_id: SessionId::new(),
                event_type: EventType::PageView,
                event_data: None,
                context,
                ip_hash: IpHash::from_address("192.0.2.1"),
            })
            .await;
        let Ok(_) = result else {
            panic!("insert failed");
        };
    }

    #[tokio::test]
    async fn top_locations_sorted_by_city_not_count() {
        let store = MemoryStore::new();
        let id = FollowupId::new();
        for _ in 0..3 {
            insert(&store, id, located("Zurich", "Switzerland")).await;
        }
        insert(&store, id, located("Austin", "USA")).await;
        insert(&store, id, VisitorContext::default()).await;

        let Ok(top) = store
            .top_locations(&EventQuery::for_followup(id).located(), 5)
            .await
        else {
            panic!("query failed");
        };
        let cities: Vec<&str> = top.iter().map(|l| l.city.as_str()).collect();
        assert_eq!(cities, vec!["Austin", "Zurich"]);
        assert_eq!(top.last().map(|l| l.count), Some(3));
    }

    #[tokio::test]
    async fn close_session_only_once() {
        let store = MemoryStore::new();
        let Ok(session) = store
            .insert_session(NewSession {
                followup_id: FollowupId::new(),
                context: VisitorContext::default(),
            })
            .await
        else {
            panic!("insert failed");
        };
        let now = Utc::now();
        let Ok(Some(closed)) = store.close_session(session.id, now, 12).await else {
            panic!("first close should succeed");
        };
        assert_eq!(closed.page_duration, Some(12));
        let Ok(second) = store.close_session(session.id, now, 99).await else {
            panic!("second close errored");
        };
        assert!(second.is_none());
        let Ok(Some(stored)) = store.find_session(session.id).await else {
            panic!("session vanished");
        };
        assert_eq!(stored.page_duration, Some(12));
    }

    #[tokio::test]
    async fn default_preference_is_unique() {
        let store = MemoryStore::new();
        assert!(store.insert_default_preference("user-1").await.is_ok());
        let Err(EngagementError::Conflict(_)) = store.insert_default_preference("user-1").await
        else {
            panic!("expected conflict");
        };
    }

    #[tokio::test]
    async fn notification_triple_is_unique() {
        let store = MemoryStore::new();
        let new = NewNotification {
            followup_id: FollowupId::new(),
            user_id: "user-1".to_string(),
            kind: NotificationType::FirstView,
            viewer_ip_hash: IpHash::from_address("192.0.2.1"),
            viewer: VisitorContext::default(),
            viewer_session_id: SessionId::new(),
        };
        assert!(store.insert_notification(new.clone()).await.is_ok());
        let Err(EngagementError::Conflict(_)) = store.insert_notification(new).await else {
            panic!("expected conflict");
        };
    }

    #[tokio::test]
    async fn distinct_sessions_newest_first() {
        let store = MemoryStore::new();
        let id = FollowupId::new();
        insert(&store, id, VisitorContext::default()).await;
        store.backdate_events(id, chrono::Duration::hours(1)).await;
        insert(&store, id, VisitorContext::default()).await;

        let Ok(sightings) = store.distinct_sessions(&EventQuery::for_followup(id)).await else {
            panic!("query failed");
        };
        assert_eq!(sightings.len(), 2);
        let [newer, older] = sightings.as_slice() else {
            panic!("expected two sightings");
        };
        assert!(newer.last_seen > older.last_seen);
    }
}
