//! PostgreSQL store backend.
//!
//! Every trait method is a single statement. Event reads share one dynamic
//! `WHERE` clause built from an [`EventQuery`] by [`push_event_filters`].
//! Uniqueness violations surface as [`EngagementError::Conflict`] through
//! the `From<sqlx::Error>` conversion.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{
    ConfirmationRow, EventRow, FollowupRow, NotificationRow, PreferenceRow, SessionRow,
};
use super::{
    ConfirmationStore, EventQuery, EventStore, FollowupDirectory, NotificationStore,
    PreferenceStore, SessionSighting, SessionStore, StoreResult,
};
use crate::config::PulseConfig;
use crate::domain::{
    Confirmation, ConfirmationType, DeviceType, Event, EventType, FollowupId, FollowupRef,
    FollowupStatus, LocationCount, NewConfirmation, NewEvent, NewNotification, NewSession,
    Notification, NotificationPreference, Session, SessionId,
};
use crate::error::EngagementError;

const FOLLOWUP_COLUMNS: &str = "id, user_id, status, slug, title, company_name, created_at";

const EVENT_COLUMNS: &str = "id, followup_id, session_id, event_type, event_data, device_type, \
     browser, location_city, location_country, ip_hash, occurred_at";

const SESSION_COLUMNS: &str = "id, followup_id, session_start, session_end, page_duration, \
     device_type, browser, location_city, location_country";

const CONFIRMATION_COLUMNS: &str =
    "id, followup_id, session_id, confirmation_type, confirmed_at, comment";

const PREFERENCE_COLUMNS: &str = "id, user_id, email_notifications, notify_on_first_view, \
     notify_on_revisit, notify_email, created_at, updated_at";

const NOTIFICATION_COLUMNS: &str = "id, followup_id, user_id, notification_type, sent_at, \
     viewer_ip_hash, viewer_device_type, viewer_browser, viewer_location_city, \
     viewer_location_country, viewer_session_id, delivered, error";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::Store`] if the database is unreachable.
    pub async fn connect(config: &PulseConfig) -> Result<Self, EngagementError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded migrations under `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::Store`] if a migration fails.
    pub async fn run_migrations(&self) -> Result<(), EngagementError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EngagementError::Store(e.to_string()))
    }
}

/// Appends the `WHERE` clause for `query` to `builder`.
fn push_event_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &EventQuery) {
    let ids: Vec<Uuid> = query.followup_ids.iter().map(|id| *id.as_uuid()).collect();
    builder.push(" WHERE followup_id = ANY(").push_bind(ids).push(")");
    if !query.event_types.is_empty() {
        let types: Vec<String> = query
            .event_types
            .iter()
            .map(|t| t.as_str().to_string())
            .collect();
        builder.push(" AND event_type = ANY(").push_bind(types).push(")");
    }
    if let Some(since) = query.since {
        builder.push(" AND occurred_at >= ").push_bind(since);
    }
    if let Some(hash) = &query.ip_hash {
        builder
            .push(" AND ip_hash = ")
            .push_bind(hash.as_str().to_string());
    }
    if let Some(session) = query.exclude_session {
        builder
            .push(" AND session_id <> ")
            .push_bind(*session.as_uuid());
    }
    if query.located_only {
        builder.push(" AND location_city IS NOT NULL AND location_country IS NOT NULL");
    }
}

fn count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

fn limit(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl FollowupDirectory for PostgresStore {
    async fn find_by_id(&self, id: FollowupId) -> StoreResult<Option<FollowupRef>> {
        let row = sqlx::query_as::<_, FollowupRow>(&format!(
            "SELECT {FOLLOWUP_COLUMNS} FROM followups WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(FollowupRef::try_from).transpose()
    }

    async fn find_published_by_slug(&self, slug: &str) -> StoreResult<Option<FollowupRef>> {
        let row = sqlx::query_as::<_, FollowupRow>(&format!(
            "SELECT {FOLLOWUP_COLUMNS} FROM followups WHERE slug = $1 AND status = 'PUBLISHED'"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.map(FollowupRef::try_from).transpose()
    }

    async fn find_many_by_owner(
        &self,
        user_id: &str,
        status: Option<FollowupStatus>,
    ) -> StoreResult<Vec<FollowupRef>> {
        let rows = sqlx::query_as::<_, FollowupRow>(&format!(
            "SELECT {FOLLOWUP_COLUMNS} FROM followups \
             WHERE user_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .bind(status.map(FollowupStatus::as_str))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(FollowupRef::try_from).collect()
    }
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn insert_event(&self, event: NewEvent) -> StoreResult<Event> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO analytics_events \
             (id, followup_id, session_id, event_type, event_data, device_type, browser, \
              location_city, location_country, ip_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {EVENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(*event.followup_id.as_uuid())
        .bind(*event.session_id.as_uuid())
        .bind(event.event_type.as_str())
        .bind(event.event_data)
        .bind(event.context.device_type.map(DeviceType::as_str))
        .bind(event.context.browser)
        .bind(event.context.location_city)
        .bind(event.context.location_country)
        .bind(event.ip_hash.as_str())
        .fetch_one(&self.pool)
        .await?;
        Event::try_from(row)
    }

    async fn count_events(&self, query: &EventQuery) -> StoreResult<u64> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM analytics_events");
        push_event_filters(&mut builder, query);
        let n = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count(n))
    }

    async fn list_events(&self, query: &EventQuery) -> StoreResult<Vec<Event>> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM analytics_events"));
        push_event_filters(&mut builder, query);
        builder.push(" ORDER BY occurred_at ASC");
        let rows = builder
            .build_query_as::<EventRow>()
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(Event::try_from).collect()
    }

    async fn count_distinct_sessions(&self, query: &EventQuery) -> StoreResult<u64> {
        let mut builder =
            QueryBuilder::new("SELECT COUNT(DISTINCT session_id) FROM analytics_events");
        push_event_filters(&mut builder, query);
        let n = builder.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count(n))
    }

    async fn distinct_sessions(&self, query: &EventQuery) -> StoreResult<Vec<SessionSighting>> {
        let mut builder = QueryBuilder::new(
            "SELECT session_id, MAX(occurred_at) AS last_seen FROM analytics_events",
        );
        push_event_filters(&mut builder, query);
        builder.push(" GROUP BY session_id ORDER BY last_seen DESC");
        let rows = builder
            .build_query_as::<(Uuid, DateTime<Utc>)>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(session_id, last_seen)| SessionSighting {
                session_id: SessionId::from_uuid(session_id),
                last_seen,
            })
            .collect())
    }

    async fn count_by_type(&self, query: &EventQuery) -> StoreResult<BTreeMap<EventType, u64>> {
        let mut builder = QueryBuilder::new("SELECT event_type, COUNT(*) FROM analytics_events");
        push_event_filters(&mut builder, query);
        builder.push(" GROUP BY event_type");
        let rows = builder.build_query_as::<(String, i64)>().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|(raw, n)| {
                raw.parse::<EventType>()
                    .map(|t| (t, count(n)))
                    .map_err(store_err)
            })
            .collect()
    }

    async fn count_by_device(
        &self,
        query: &EventQuery,
    ) -> StoreResult<BTreeMap<DeviceType, u64>> {
        let mut builder = QueryBuilder::new("SELECT device_type, COUNT(*) FROM analytics_events");
        push_event_filters(&mut builder, query);
        builder.push(" AND device_type IS NOT NULL GROUP BY device_type");
        let rows = builder.build_query_as::<(String, i64)>().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|(raw, n)| {
                raw.parse::<DeviceType>()
                    .map(|t| (t, count(n)))
                    .map_err(store_err)
            })
            .collect()
    }

    async fn count_by_followup(
        &self,
        query: &EventQuery,
    ) -> StoreResult<HashMap<FollowupId, u64>> {
        let mut builder = QueryBuilder::new("SELECT followup_id, COUNT(*) FROM analytics_events");
        push_event_filters(&mut builder, query);
        builder.push(" GROUP BY followup_id");
        let rows = builder.build_query_as::<(Uuid, i64)>().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(id, n)| (FollowupId::from_uuid(id), count(n)))
            .collect())
    }

    async fn top_locations(
        &self,
        query: &EventQuery,
        max: usize,
    ) -> StoreResult<Vec<LocationCount>> {
        let mut builder = QueryBuilder::new(
            "SELECT location_city, location_country, COUNT(*) FROM analytics_events",
        );
        push_event_filters(&mut builder, query);
        builder
            .push(
                " AND location_city IS NOT NULL AND location_country IS NOT NULL \
                 GROUP BY location_city, location_country \
                 ORDER BY location_city ASC, location_country ASC LIMIT ",
            )
            .push_bind(limit(max));
        let rows = builder
            .build_query_as::<(String, String, i64)>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(city, country, n)| LocationCount {
                city,
                country,
                count: count(n),
            })
            .collect())
    }
}

fn store_err(err: EngagementError) -> EngagementError {
    match err {
        EngagementError::Validation(msg) => EngagementError::Store(msg),
        other => other,
    }
}

#[async_trait]
impl SessionStore for PostgresStore {
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "INSERT INTO analytics_sessions \
             (id, followup_id, session_start, device_type, browser, location_city, location_country) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(*session.followup_id.as_uuid())
        .bind(Utc::now())
        .bind(session.context.device_type.map(DeviceType::as_str))
        .bind(session.context.browser)
        .bind(session.context.location_city)
        .bind(session.context.location_country)
        .fetch_one(&self.pool)
        .await?;
        Session::try_from(row)
    }

    async fn find_session(&self, id: SessionId) -> StoreResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM analytics_sessions WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Session::try_from).transpose()
    }

    async fn close_session(
        &self,
        id: SessionId,
        ended_at: DateTime<Utc>,
        page_duration: i64,
    ) -> StoreResult<Option<Session>> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "UPDATE analytics_sessions SET session_end = $2, page_duration = $3 \
             WHERE id = $1 AND session_end IS NULL RETURNING {SESSION_COLUMNS}"
        ))
        .bind(*id.as_uuid())
        .bind(ended_at)
        .bind(page_duration)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Session::try_from).transpose()
    }

    async fn recent_sessions(
        &self,
        followup_id: FollowupId,
        since: DateTime<Utc>,
        max: usize,
    ) -> StoreResult<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM analytics_sessions \
             WHERE followup_id = $1 AND session_start >= $2 \
             ORDER BY session_start DESC LIMIT $3"
        ))
        .bind(*followup_id.as_uuid())
        .bind(since)
        .bind(limit(max))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Session::try_from).collect()
    }

    async fn known_durations(
        &self,
        followup_id: FollowupId,
        since: Option<DateTime<Utc>>,
    ) -> StoreResult<Vec<i64>> {
        let durations = sqlx::query_scalar::<_, i64>(
            "SELECT page_duration FROM analytics_sessions \
             WHERE followup_id = $1 AND page_duration IS NOT NULL \
             AND ($2::timestamptz IS NULL OR session_start >= $2)",
        )
        .bind(*followup_id.as_uuid())
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(durations)
    }
}

#[async_trait]
impl ConfirmationStore for PostgresStore {
    async fn insert_confirmation(
        &self,
        confirmation: NewConfirmation,
    ) -> StoreResult<Confirmation> {
        let row = sqlx::query_as::<_, ConfirmationRow>(&format!(
            "INSERT INTO followup_confirmations \
             (id, followup_id, session_id, confirmation_type, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {CONFIRMATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(*confirmation.followup_id.as_uuid())
        .bind(confirmation.session_id.map(|s| *s.as_uuid()))
        .bind(confirmation.kind.as_str())
        .bind(confirmation.comment)
        .fetch_one(&self.pool)
        .await?;
        Confirmation::try_from(row)
    }

    async fn list_confirmations(
        &self,
        followup_id: FollowupId,
        max: Option<usize>,
    ) -> StoreResult<Vec<Confirmation>> {
        // LIMIT NULL is "no limit" in PostgreSQL.
        let rows = sqlx::query_as::<_, ConfirmationRow>(&format!(
            "SELECT {CONFIRMATION_COLUMNS} FROM followup_confirmations \
             WHERE followup_id = $1 ORDER BY confirmed_at DESC LIMIT $2"
        ))
        .bind(*followup_id.as_uuid())
        .bind(max.map(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Confirmation::try_from).collect()
    }

    async fn count_confirmations_by_type(
        &self,
        followup_id: FollowupId,
    ) -> StoreResult<BTreeMap<ConfirmationType, u64>> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT confirmation_type, COUNT(*) FROM followup_confirmations \
             WHERE followup_id = $1 GROUP BY confirmation_type",
        )
        .bind(*followup_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|(raw, n)| {
                raw.parse::<ConfirmationType>()
                    .map(|t| (t, count(n)))
                    .map_err(store_err)
            })
            .collect()
    }
}

#[async_trait]
impl PreferenceStore for PostgresStore {
    async fn find_preference(&self, user_id: &str) -> StoreResult<Option<NotificationPreference>> {
        let row = sqlx::query_as::<_, PreferenceRow>(&format!(
            "SELECT {PREFERENCE_COLUMNS} FROM notification_preferences WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(NotificationPreference::from))
    }

    async fn insert_default_preference(
        &self,
        user_id: &str,
    ) -> StoreResult<NotificationPreference> {
        let defaults = NotificationPreference::defaults_for(user_id);
        let row = sqlx::query_as::<_, PreferenceRow>(&format!(
            "INSERT INTO notification_preferences \
             (id, user_id, email_notifications, notify_on_first_view, notify_on_revisit, \
              notify_email, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PREFERENCE_COLUMNS}"
        ))
        .bind(defaults.id)
        .bind(&defaults.user_id)
        .bind(defaults.email_notifications)
        .bind(defaults.notify_on_first_view)
        .bind(defaults.notify_on_revisit)
        .bind(&defaults.notify_email)
        .bind(defaults.created_at)
        .bind(defaults.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn update_preference(
        &self,
        preference: &NotificationPreference,
    ) -> StoreResult<NotificationPreference> {
        let row = sqlx::query_as::<_, PreferenceRow>(&format!(
            "UPDATE notification_preferences SET email_notifications = $2, \
             notify_on_first_view = $3, notify_on_revisit = $4, notify_email = $5, \
             updated_at = $6 WHERE user_id = $1 RETURNING {PREFERENCE_COLUMNS}"
        ))
        .bind(&preference.user_id)
        .bind(preference.email_notifications)
        .bind(preference.notify_on_first_view)
        .bind(preference.notify_on_revisit)
        .bind(&preference.notify_email)
        .bind(preference.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(NotificationPreference::from)
            .ok_or(EngagementError::NotFound {
                resource: "notification preference",
            })
    }
}

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "INSERT INTO notifications \
             (id, followup_id, user_id, notification_type, viewer_ip_hash, viewer_device_type, \
              viewer_browser, viewer_location_city, viewer_location_country, viewer_session_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(*notification.followup_id.as_uuid())
        .bind(&notification.user_id)
        .bind(notification.kind.as_str())
        .bind(notification.viewer_ip_hash.as_str())
        .bind(notification.viewer.device_type.map(DeviceType::as_str))
        .bind(notification.viewer.browser)
        .bind(notification.viewer.location_city)
        .bind(notification.viewer.location_country)
        .bind(*notification.viewer_session_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Notification::try_from(row)
    }

    async fn mark_delivered(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE notifications SET delivered = TRUE, error = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_delivery_failed(&self, id: Uuid, error: &str) -> StoreResult<()> {
        sqlx::query("UPDATE notifications SET delivered = FALSE, error = $2 WHERE id = $1")
            .bind(id)
            .bind(error)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn notification_exists(
        &self,
        followup_id: FollowupId,
        user_id: &str,
        viewer_session_id: SessionId,
    ) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM notifications \
             WHERE followup_id = $1 AND user_id = $2 AND viewer_session_id = $3)",
        )
        .bind(*followup_id.as_uuid())
        .bind(user_id)
        .bind(*viewer_session_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn count_notifications_since(
        &self,
        followup_id: FollowupId,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let n = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications \
             WHERE followup_id = $1 AND user_id = $2 AND sent_at >= $3",
        )
        .bind(*followup_id.as_uuid())
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        Ok(count(n))
    }

    async fn notifications_for_followup(
        &self,
        followup_id: FollowupId,
    ) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE followup_id = $1 ORDER BY sent_at DESC"
        ))
        .bind(*followup_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn notifications_for_user(
        &self,
        user_id: &str,
        max: usize,
    ) -> StoreResult<Vec<Notification>> {
        let rows = sqlx::query_as::<_, NotificationRow>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE user_id = $1 ORDER BY sent_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit(max))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Notification::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IpHash;

    #[test]
    fn event_filters_render_every_clause() {
        let query = EventQuery::for_followup(FollowupId::new())
            .of_types(&EventType::ENGAGEMENTS)
            .since(Utc::now())
            .with_ip_hash(IpHash::from_address("192.0.2.1"))
            .excluding_session(SessionId::new())
            .located();
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM analytics_events");
        push_event_filters(&mut builder, &query);
        let sql = builder.sql();
        assert!(sql.contains("followup_id = ANY($1)"));
        assert!(sql.contains("event_type = ANY($2)"));
        assert!(sql.contains("occurred_at >= $3"));
        assert!(sql.contains("ip_hash = $4"));
        assert!(sql.contains("session_id <> $5"));
        assert!(sql.ends_with("location_country IS NOT NULL"));
    }

    #[test]
    fn minimal_filter_only_scopes_followups() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM analytics_events");
        push_event_filters(&mut builder, &EventQuery::for_followup(FollowupId::new()));
        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM analytics_events WHERE followup_id = ANY($1)"
        );
    }

    #[test]
    fn negative_counts_clamp_to_zero() {
        assert_eq!(count(-1), 0);
        assert_eq!(count(7), 7);
        assert_eq!(limit(usize::MAX), i64::MAX);
    }
}
