//! Owner notifications: preferences, the per-page-view decision and history.
//!
//! Each queued [`PageView`] runs through [`NotificationService::evaluate_page_view`]:
//!
//! 1. load (or lazily create) the owner's preference; master switch off
//!    suppresses,
//! 2. classify the view with the [`RevisitDetector`]; a disabled kind
//!    suppresses,
//! 3. an existing notification for the same viewer session suppresses,
//! 4. any notification for the follow-up inside the trailing throttle
//!    window suppresses,
//! 5. otherwise the record is written and handed to the delivery channel.
//!
//! [`NotificationService::process_page_view`] wraps this for the detached
//! worker and never returns an error.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use super::delivery::{NotificationChannel, OutboundNotification};
use super::owned_followup;
use super::revisit::RevisitDetector;
use crate::domain::{
    FollowupBrief, FollowupId, NewNotification, Notification, NotificationPreference,
    NotificationWithFollowup, PageView, PageViewHandler, PreferenceUpdate,
};
use crate::error::EngagementError;
use crate::persistence::{FollowupDirectory, NotificationStore, PreferenceStore, Stores};

/// History entries returned when the caller gives no limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Upper bound on a single history page.
pub const MAX_HISTORY_LIMIT: usize = 200;

/// Tunables for the notification pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    /// Trailing window in which a follow-up notifies its owner at most once.
    pub throttle: chrono::Duration,
    /// Recipient used when the preference has no override address.
    pub fallback_email: String,
    /// Base URL of the owner dashboard, used for the analytics link.
    pub dashboard_base_url: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            throttle: chrono::Duration::minutes(60),
            fallback_email: "owner@example.com".to_string(),
            dashboard_base_url: "http://localhost:5173".to_string(),
        }
    }
}

/// Why a page view produced no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The follow-up no longer exists.
    FollowupMissing,
    /// The owner turned email notifications off.
    NotificationsDisabled,
    /// The owner does not want this kind of notification.
    KindDisabled,
    /// This viewer session was already notified about.
    AlreadyNotified,
    /// The follow-up notified its owner within the throttle window.
    Throttled,
}

impl SuppressReason {
    /// Log label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FollowupMissing => "followup_missing",
            Self::NotificationsDisabled => "notifications_disabled",
            Self::KindDisabled => "kind_disabled",
            Self::AlreadyNotified => "already_notified",
            Self::Throttled => "throttled",
        }
    }
}

impl fmt::Display for SuppressReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one page view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// A notification was recorded and handed to the channel.
    Sent(Notification),
    /// No notification.
    Suppressed(SuppressReason),
}

/// Preferences, notification decisions and notification history.
#[derive(Debug, Clone)]
pub struct NotificationService {
    followups: Arc<dyn FollowupDirectory>,
    preferences: Arc<dyn PreferenceStore>,
    notifications: Arc<dyn NotificationStore>,
    revisits: RevisitDetector,
    channel: Arc<dyn NotificationChannel>,
    settings: NotificationSettings,
}

impl NotificationService {
    /// Creates a new `NotificationService`.
    #[must_use]
    pub fn new(
        stores: &Stores,
        channel: Arc<dyn NotificationChannel>,
        settings: NotificationSettings,
    ) -> Self {
        Self {
            followups: Arc::clone(&stores.followups),
            preferences: Arc::clone(&stores.preferences),
            notifications: Arc::clone(&stores.notifications),
            revisits: RevisitDetector::new(Arc::clone(&stores.events)),
            channel,
            settings,
        }
    }

    /// Returns the owner's preference, creating the defaults on first read.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read or the insert fails.
    pub async fn preferences(
        &self,
        user_id: &str,
    ) -> Result<NotificationPreference, EngagementError> {
        if let Some(existing) = self.preferences.find_preference(user_id).await? {
            return Ok(existing);
        }
        match self.preferences.insert_default_preference(user_id).await {
            Ok(created) => {
                tracing::debug!(user_id, "default notification preferences created");
                Ok(created)
            }
            // A concurrent first read created the row.
            Err(EngagementError::Conflict(_)) => self
                .preferences
                .find_preference(user_id)
                .await?
                .ok_or_else(|| {
                    EngagementError::Internal("preference vanished after conflict".to_string())
                }),
            Err(err) => Err(err),
        }
    }

    /// Applies a partial update to the owner's preference.
    ///
    /// # Errors
    ///
    /// Returns a store error if the read or the write fails.
    pub async fn update_preferences(
        &self,
        user_id: &str,
        update: &PreferenceUpdate,
    ) -> Result<NotificationPreference, EngagementError> {
        let mut preference = self.preferences(user_id).await?;
        preference.apply(update);
        let stored = self.preferences.update_preference(&preference).await?;
        tracing::info!(user_id, "notification preferences updated");
        Ok(stored)
    }

    /// Runs the decision pipeline for one page view.
    ///
    /// # Errors
    ///
    /// Returns a store error from any step. Delivery failures are recorded
    /// on the notification instead.
    pub async fn evaluate_page_view(&self, view: &PageView) -> Result<Decision, EngagementError> {
        let Some(followup) = self.followups.find_by_id(view.followup_id).await? else {
            return Ok(Decision::Suppressed(SuppressReason::FollowupMissing));
        };
        let owner = followup.user_id.as_str();

        let preference = self.preferences(owner).await?;
        if !preference.email_notifications {
            return Ok(Decision::Suppressed(SuppressReason::NotificationsDisabled));
        }

        let revisit = self
            .revisits
            .check_revisit(view.followup_id, &view.ip_hash, view.session_id)
            .await?;
        let kind = revisit.notification_type();
        if !preference.allows(kind) {
            return Ok(Decision::Suppressed(SuppressReason::KindDisabled));
        }

        if self
            .notifications
            .notification_exists(view.followup_id, owner, view.session_id)
            .await?
        {
            return Ok(Decision::Suppressed(SuppressReason::AlreadyNotified));
        }

        let window_start = Utc::now() - self.settings.throttle;
        if self
            .notifications
            .count_notifications_since(view.followup_id, owner, window_start)
            .await?
            > 0
        {
            return Ok(Decision::Suppressed(SuppressReason::Throttled));
        }

        let mut notification = match self
            .notifications
            .insert_notification(NewNotification {
                followup_id: view.followup_id,
                user_id: owner.to_string(),
                kind,
                viewer_ip_hash: view.ip_hash.clone(),
                viewer: view.context.clone(),
                viewer_session_id: view.session_id,
            })
            .await
        {
            Ok(notification) => notification,
            // Lost the race against a concurrent view from the same session.
            Err(EngagementError::Conflict(_)) => {
                return Ok(Decision::Suppressed(SuppressReason::AlreadyNotified));
            }
            Err(err) => return Err(err),
        };

        let recipient = preference
            .notify_email
            .as_deref()
            .unwrap_or(&self.settings.fallback_email);
        let message = OutboundNotification::compose(
            recipient,
            kind,
            &followup,
            &view.context,
            notification.sent_at,
            &self.settings.dashboard_base_url,
        );
        match self.channel.deliver(&message).await {
            Ok(()) => {
                self.notifications.mark_delivered(notification.id).await?;
                notification.delivered = true;
            }
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(
                    notification_id = %notification.id,
                    error = %reason,
                    "notification delivery failed"
                );
                self.notifications
                    .mark_delivery_failed(notification.id, &reason)
                    .await?;
                notification.error = Some(reason);
            }
        }
        Ok(Decision::Sent(notification))
    }

    /// Evaluates a page view, logging instead of returning failures.
    pub async fn process_page_view(&self, view: &PageView) {
        match self.evaluate_page_view(view).await {
            Ok(Decision::Sent(notification)) => tracing::info!(
                followup_id = %view.followup_id,
                session_id = %view.session_id,
                kind = %notification.kind,
                delivered = notification.delivered,
                decision = "sent",
                "owner notified"
            ),
            Ok(Decision::Suppressed(reason)) => tracing::debug!(
                followup_id = %view.followup_id,
                session_id = %view.session_id,
                decision = %reason,
                "notification suppressed"
            ),
            Err(err) => tracing::error!(
                followup_id = %view.followup_id,
                session_id = %view.session_id,
                error = %err,
                "notification pipeline failed"
            ),
        }
    }

    /// Notifications about an owned follow-up, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the follow-up does not exist
    /// or is not owned by `user_id`, or a store error.
    pub async fn notifications_by_followup(
        &self,
        followup_id: FollowupId,
        user_id: &str,
    ) -> Result<Vec<Notification>, EngagementError> {
        owned_followup(self.followups.as_ref(), followup_id, user_id).await?;
        self.notifications
            .notifications_for_followup(followup_id)
            .await
    }

    /// The owner's most recent notifications, each with its follow-up.
    ///
    /// `limit` defaults to [`DEFAULT_HISTORY_LIMIT`] and is clamped to
    /// `1..=MAX_HISTORY_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns a store error if a read fails.
    pub async fn notifications_by_user(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> Result<Vec<NotificationWithFollowup>, EngagementError> {
        let limit = limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let notifications = self
            .notifications
            .notifications_for_user(user_id, limit)
            .await?;

        let mut briefs: HashMap<FollowupId, Option<FollowupBrief>> = HashMap::new();
        let mut history = Vec::with_capacity(notifications.len());
        for notification in notifications {
            let followup = match briefs.get(&notification.followup_id) {
                Some(brief) => brief.clone(),
                None => {
                    let brief = self
                        .followups
                        .find_by_id(notification.followup_id)
                        .await?
                        .map(|f| f.brief());
                    briefs.insert(notification.followup_id, brief.clone());
                    brief
                }
            };
            history.push(NotificationWithFollowup {
                notification,
                followup,
            });
        }
        Ok(history)
    }
}

#[async_trait]
impl PageViewHandler for NotificationService {
    async fn handle(&self, view: PageView) {
        self.process_page_view(&view).await;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{
        DeviceType, EventType, FollowupRef, FollowupStatus, IpHash, NotificationType, SessionId,
        VisitorContext,
    };
    use crate::persistence::{MemoryStore, StoreResult};
    use crate::service::test_support::{Fixture, OWNER, STRANGER};
    use chrono::DateTime;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex;

    #[derive(Debug, Default)]
    struct Outbox {
        sent: Mutex<Vec<OutboundNotification>>,
    }

    #[async_trait]
    impl NotificationChannel for Outbox {
        async fn deliver(&self, message: &OutboundNotification) -> Result<(), EngagementError> {
            self.sent.lock().await.push(message.clone());
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Refusing;

    #[async_trait]
    impl NotificationChannel for Refusing {
        async fn deliver(&self, _: &OutboundNotification) -> Result<(), EngagementError> {
            Err(EngagementError::Internal("smtp unavailable".to_string()))
        }
    }

    fn service(fx: &Fixture, channel: Arc<dyn NotificationChannel>) -> NotificationService {
        NotificationService::new(&fx.stores, channel, NotificationSettings::default())
    }

    /// Stores a page view event and returns the matching queue job.
    async fn view(fx: &Fixture, followup: &FollowupRef, session_id: SessionId) -> PageView {
        let context = VisitorContext {
            device_type: Some(DeviceType::Desktop),
            browser: Some("Safari".to_string()),
            ..VisitorContext::default()
        };
        let event = fx
            .event(followup.id, session_id, EventType::PageView, None, context)
            .await;
        PageView {
            followup_id: event.followup_id,
            session_id: event.session_id,
            ip_hash: event.ip_hash,
            context: event.context,
        }
    }

    async fn decide(service: &NotificationService, view: &PageView) -> Decision {
        let Ok(decision) = service.evaluate_page_view(view).await else {
            panic!("evaluation should succeed");
        };
        decision
    }

    #[tokio::test]
    async fn first_read_creates_defaults() {
        let fx = Fixture::new();
        let service = service(&fx, Arc::new(Outbox::default()));

        let Ok(preference) = service.preferences(OWNER).await else {
            panic!("preferences should load");
        };
        assert!(preference.email_notifications);
        assert!(preference.notify_on_first_view);
        assert!(preference.notify_on_revisit);
        assert_eq!(preference.notify_email, None);

        let Ok(again) = service.preferences(OWNER).await else {
            panic!("preferences should load");
        };
        assert_eq!(again.id, preference.id);
    }

    #[tokio::test]
    async fn update_touches_only_given_fields() {
        let fx = Fixture::new();
        let service = service(&fx, Arc::new(Outbox::default()));
        let update = PreferenceUpdate {
            notify_on_revisit: Some(false),
            notify_email: Some(Some("me@example.com".to_string())),
            ..PreferenceUpdate::default()
        };

        let Ok(updated) = service.update_preferences(OWNER, &update).await else {
            panic!("update should succeed");
        };
        assert!(updated.email_notifications);
        assert!(!updated.notify_on_revisit);
        assert_eq!(updated.notify_email.as_deref(), Some("me@example.com"));

        let clear = PreferenceUpdate {
            notify_email: Some(None),
            ..PreferenceUpdate::default()
        };
        let Ok(cleared) = service.update_preferences(OWNER, &clear).await else {
            panic!("update should succeed");
        };
        assert_eq!(cleared.notify_email, None);
        assert!(!cleared.notify_on_revisit);
    }

    #[tokio::test]
    async fn first_view_notifies_owner_once() {
        let fx = Fixture::new();
        let outbox = Arc::new(Outbox::default());
        let service = service(&fx, Arc::clone(&outbox) as Arc<dyn NotificationChannel>);
        let f = fx.followup(OWNER, FollowupStatus::Published).await;
        let job = view(&fx, &f, SessionId::new()).await;

        let Decision::Sent(notification) = decide(&service, &job).await else {
            panic!("first view should notify");
        };
        assert_eq!(notification.kind, NotificationType::FirstView);
        assert_eq!(notification.user_id, OWNER);
        assert!(notification.delivered);
        assert_eq!(notification.viewer_browser.as_deref(), Some("Safari"));

        let sent = outbox.sent.lock().await;
        let [message] = sent.as_slice() else {
            panic!("expected one message");
        };
        assert_eq!(message.recipient, "owner@example.com");
        assert!(message.subject.starts_with("New view on"));
        drop(sent);

        assert_eq!(
            decide(&service, &job).await,
            Decision::Suppressed(SuppressReason::AlreadyNotified)
        );
    }

    #[tokio::test]
    async fn second_session_inside_window_is_throttled() {
        let fx = Fixture::new();
        let service = service(&fx, Arc::new(Outbox::default()));
        let f = fx.followup(OWNER, FollowupStatus::Published).await;

        let first = view(&fx, &f, SessionId::new()).await;
        assert!(matches!(decide(&service, &first).await, Decision::Sent(_)));

        let second = view(&fx, &f, SessionId::new()).await;
        assert_eq!(
            decide(&service, &second).await,
            Decision::Suppressed(SuppressReason::Throttled)
        );

        fx.memory
            .backdate_notifications(f.id, chrono::Duration::minutes(61))
            .await;
        let third = view(&fx, &f, SessionId::new()).await;
        let Decision::Sent(revisit) = decide(&service, &third).await else {
            panic!("throttle window should have passed");
        };
        assert_eq!(revisit.kind, NotificationType::Revisit);
    }

    #[tokio::test]
    async fn disabled_preferences_suppress() {
        let fx = Fixture::new();
        let service = service(&fx, Arc::new(Outbox::default()));
        let f = fx.followup(OWNER, FollowupStatus::Published).await;

        let off = PreferenceUpdate {
            notify_on_first_view: Some(false),
            ..PreferenceUpdate::default()
        };
        assert!(service.update_preferences(OWNER, &off).await.is_ok());
        let job = view(&fx, &f, SessionId::new()).await;
        assert_eq!(
            decide(&service, &job).await,
            Decision::Suppressed(SuppressReason::KindDisabled)
        );

        let master_off = PreferenceUpdate {
            email_notifications: Some(false),
            notify_on_first_view: Some(true),
            ..PreferenceUpdate::default()
        };
        assert!(service.update_preferences(OWNER, &master_off).await.is_ok());
        assert_eq!(
            decide(&service, &job).await,
            Decision::Suppressed(SuppressReason::NotificationsDisabled)
        );
    }

    #[tokio::test]
    async fn missing_followup_is_suppressed() {
        let fx = Fixture::new();
        let service = service(&fx, Arc::new(Outbox::default()));
        let job = PageView {
            followup_id: FollowupId::new(),
            session_id: SessionId::new(),
            ip_hash: IpHash::from_address("192.0.2.4"),
            context: VisitorContext::default(),
        };
        assert_eq!(
            decide(&service, &job).await,
            Decision::Suppressed(SuppressReason::FollowupMissing)
        );
    }

    #[tokio::test]
    async fn delivery_failure_is_recorded_not_raised() {
        let fx = Fixture::new();
        let service = service(&fx, Arc::new(Refusing));
        let f = fx.followup(OWNER, FollowupStatus::Published).await;
        let job = view(&fx, &f, SessionId::new()).await;

        let Decision::Sent(notification) = decide(&service, &job).await else {
            panic!("record should still be written");
        };
        assert!(!notification.delivered);
        assert!(notification.error.is_some());

        service.process_page_view(&job).await;
        let Ok(history) = service.notifications_by_followup(f.id, OWNER).await else {
            panic!("history should load");
        };
        let [stored] = history.as_slice() else {
            panic!("expected one notification");
        };
        assert!(!stored.delivered);
        assert_eq!(stored.error, notification.error);
    }

    #[tokio::test]
    async fn history_is_owned_and_decorated() {
        let fx = Fixture::new();
        let service = service(&fx, Arc::new(Outbox::default()));
        let f = fx
            .followup_titled(OWNER, FollowupStatus::Published, "Kickoff recap")
            .await;
        let job = view(&fx, &f, SessionId::new()).await;
        service.handle(job).await;

        assert_eq!(
            service.notifications_by_followup(f.id, STRANGER).await.err(),
            Some(EngagementError::followup_not_found())
        );

        let Ok(history) = service.notifications_by_user(OWNER, Some(0)).await else {
            panic!("history should load");
        };
        let [entry] = history.as_slice() else {
            panic!("expected one entry");
        };
        assert_eq!(
            entry.followup.as_ref().map(|b| b.title.as_str()),
            Some("Kickoff recap")
        );
        let Ok(none) = service.notifications_by_user(STRANGER, None).await else {
            panic!("history should load");
        };
        assert!(none.is_empty());
    }

    /// Notification store whose existence check always misses, as a read
    /// racing a concurrent insert would.
    #[derive(Debug)]
    struct StaleExistence(Arc<MemoryStore>);

    #[async_trait]
    impl NotificationStore for StaleExistence {
        async fn insert_notification(&self, n: NewNotification) -> StoreResult<Notification> {
            self.0.insert_notification(n).await
        }

        async fn mark_delivered(&self, id: uuid::Uuid) -> StoreResult<()> {
            self.0.mark_delivered(id).await
        }

        async fn mark_delivery_failed(&self, id: uuid::Uuid, error: &str) -> StoreResult<()> {
            self.0.mark_delivery_failed(id, error).await
        }

        async fn notification_exists(
            &self,
            _: FollowupId,
            _: &str,
            _: SessionId,
        ) -> StoreResult<bool> {
            Ok(false)
        }

        async fn count_notifications_since(
            &self,
            followup_id: FollowupId,
            user_id: &str,
            since: DateTime<Utc>,
        ) -> StoreResult<u64> {
            self.0
                .count_notifications_since(followup_id, user_id, since)
                .await
        }

        async fn notifications_for_followup(
            &self,
            followup_id: FollowupId,
        ) -> StoreResult<Vec<Notification>> {
            self.0.notifications_for_followup(followup_id).await
        }

        async fn notifications_for_user(
            &self,
            user_id: &str,
            limit: usize,
        ) -> StoreResult<Vec<Notification>> {
            self.0.notifications_for_user(user_id, limit).await
        }
    }

    /// Preference store whose first lookup misses a row another writer
    /// already created.
    #[derive(Debug)]
    struct LateFirstRead {
        inner: Arc<MemoryStore>,
        missed: AtomicBool,
    }

    #[async_trait]
    impl PreferenceStore for LateFirstRead {
        async fn find_preference(
            &self,
            user_id: &str,
        ) -> StoreResult<Option<NotificationPreference>> {
            if !self.missed.swap(true, Ordering::SeqCst) {
                return Ok(None);
            }
            self.inner.find_preference(user_id).await
        }

        async fn insert_default_preference(
            &self,
            user_id: &str,
        ) -> StoreResult<NotificationPreference> {
            self.inner.insert_default_preference(user_id).await
        }

        async fn update_preference(
            &self,
            preference: &NotificationPreference,
        ) -> StoreResult<NotificationPreference> {
            self.inner.update_preference(preference).await
        }
    }

    fn unthrottled() -> NotificationSettings {
        NotificationSettings {
            throttle: chrono::Duration::zero(),
            ..NotificationSettings::default()
        }
    }

    #[tokio::test]
    async fn duplicate_insert_is_already_notified() {
        let fx = Fixture::new();
        let mut stores = fx.stores.clone();
        stores.notifications = Arc::new(StaleExistence(Arc::clone(&fx.memory)));
        let service = NotificationService::new(&stores, Arc::new(Outbox::default()), unthrottled());
        let f = fx.followup(OWNER, FollowupStatus::Published).await;
        let job = view(&fx, &f, SessionId::new()).await;

        assert!(matches!(decide(&service, &job).await, Decision::Sent(_)));
        assert_eq!(
            decide(&service, &job).await,
            Decision::Suppressed(SuppressReason::AlreadyNotified)
        );
        let Ok(history) = service.notifications_by_followup(f.id, OWNER).await else {
            panic!("history should load");
        };
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn default_preference_conflict_rereads_stored_row() {
        let fx = Fixture::new();
        let Ok(winner) = fx.memory.insert_default_preference(OWNER).await else {
            panic!("defaults should insert");
        };
        let mut stores = fx.stores.clone();
        stores.preferences = Arc::new(LateFirstRead {
            inner: Arc::clone(&fx.memory),
            missed: AtomicBool::new(false),
        });
        let service = NotificationService::new(
            &stores,
            Arc::new(Outbox::default()),
            NotificationSettings::default(),
        );

        let Ok(preference) = service.preferences(OWNER).await else {
            panic!("conflict should resolve to the stored row");
        };
        assert_eq!(preference.id, winner.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_views_from_one_session_notify_once() {
        let fx = Fixture::new();
        let service = Arc::new(NotificationService::new(
            &fx.stores,
            Arc::new(Outbox::default()),
            unthrottled(),
        ));
        let f = fx.followup(OWNER, FollowupStatus::Published).await;

        for _ in 0..20 {
            let job = view(&fx, &f, SessionId::new()).await;
            let first = tokio::spawn({
                let (service, job) = (Arc::clone(&service), job.clone());
                async move { service.evaluate_page_view(&job).await }
            });
            let second = tokio::spawn({
                let (service, job) = (Arc::clone(&service), job.clone());
                async move { service.evaluate_page_view(&job).await }
            });
            let (Ok(Ok(a)), Ok(Ok(b))) = (first.await, second.await) else {
                panic!("both evaluations should finish");
            };
            let sent = [&a, &b]
                .iter()
                .filter(|d| matches!(d, Decision::Sent(_)))
                .count();
            assert_eq!(sent, 1);
            assert!(
                [a, b].contains(&Decision::Suppressed(SuppressReason::AlreadyNotified)),
                "the losing view should be reported as already notified"
            );
        }

        let Ok(history) = service.notifications_by_followup(f.id, OWNER).await else {
            panic!("history should load");
        };
        assert_eq!(history.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_reads_share_one_preference() {
        let fx = Fixture::new();
        let service = Arc::new(service(&fx, Arc::new(Outbox::default())));

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.preferences(OWNER).await }
        });
        let second = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.preferences(OWNER).await }
        });
        let (Ok(Ok(a)), Ok(Ok(b))) = (first.await, second.await) else {
            panic!("both reads should succeed");
        };
        assert_eq!(a.id, b.id);
    }
}
