//! Aggregation engine: owner-facing analytics read models.
//!
//! Every operation checks ownership first and answers a foreign follow-up
//! exactly like a missing one. Independent store reads run concurrently
//! with `tokio::try_join!`; the arithmetic lives in [`super::aggregate`].

use std::sync::Arc;

use chrono::Utc;

use super::aggregate;
use super::owned_followup;
use crate::domain::{
    AnalyticsSummary, DetailedFollowupAnalytics, EventType, FollowupAnalytics, FollowupId,
    FollowupStatus, OwnerSummary, TimeRange, TopFollowup,
};
use crate::error::EngagementError;
use crate::persistence::{
    ConfirmationStore, EventQuery, EventStore, FollowupDirectory, SessionStore, Stores,
};

/// Sessions listed in [`FollowupAnalytics::recent_sessions`].
pub const RECENT_SESSIONS: usize = 10;
/// Location groups listed in top-location reports.
pub const TOP_LOCATIONS: usize = 5;
/// Entries in [`OwnerSummary::top_performing_followups`].
pub const TOP_FOLLOWUPS: usize = 5;

/// Read-only analytics over events, sessions and confirmations.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    followups: Arc<dyn FollowupDirectory>,
    events: Arc<dyn EventStore>,
    sessions: Arc<dyn SessionStore>,
    confirmations: Arc<dyn ConfirmationStore>,
}

impl AnalyticsService {
    /// Creates a new `AnalyticsService`.
    #[must_use]
    pub fn new(stores: &Stores) -> Self {
        Self {
            followups: Arc::clone(&stores.followups),
            events: Arc::clone(&stores.events),
            sessions: Arc::clone(&stores.sessions),
            confirmations: Arc::clone(&stores.confirmations),
        }
    }

    /// Windowed statistics for one follow-up.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the follow-up does not exist
    /// or is not owned by `user_id`, or a store error.
    pub async fn followup_analytics(
        &self,
        followup_id: FollowupId,
        user_id: &str,
        range: TimeRange,
    ) -> Result<FollowupAnalytics, EngagementError> {
        owned_followup(self.followups.as_ref(), followup_id, user_id).await?;
        let since = range.start(Utc::now());

        let window = EventQuery::for_followup(followup_id).since(since);
        let views = window.clone().of_type(EventType::PageView);
        let located = window.clone().located();

        let (total_views, unique_visitors, by_type, devices, top_locations, recent_sessions, durations) =
            tokio::try_join!(
                self.events.count_events(&views),
                self.events.count_distinct_sessions(&views),
                self.events.count_by_type(&window),
                self.events.count_by_device(&views),
                self.events.top_locations(&located, TOP_LOCATIONS),
                self.sessions
                    .recent_sessions(followup_id, since, RECENT_SESSIONS),
                self.sessions.known_durations(followup_id, Some(since)),
            )?;

        let of_type = |t: EventType| by_type.get(&t).copied().unwrap_or(0);
        let (total_duration, average_duration) = aggregate::duration_totals(&durations);

        tracing::debug!(%followup_id, range = range.as_str(), total_views, "followup analytics computed");

        Ok(FollowupAnalytics {
            followup_id,
            total_views,
            unique_visitors,
            total_duration,
            average_duration,
            file_downloads: of_type(EventType::FileDownload),
            link_clicks: of_type(EventType::LinkClick),
            email_copies: of_type(EventType::CopyEmail),
            phone_copies: of_type(EventType::CopyPhone),
            device_breakdown: aggregate::device_breakdown(&devices),
            top_locations,
            recent_sessions,
        })
    }

    /// Windowed statistics across all of an owner's follow-ups.
    ///
    /// # Errors
    ///
    /// Returns a store error if a read fails.
    pub async fn owner_summary(
        &self,
        user_id: &str,
        range: TimeRange,
    ) -> Result<OwnerSummary, EngagementError> {
        let followups = self.followups.find_many_by_owner(user_id, None).await?;
        let since = range.start(Utc::now());

        let window = EventQuery::for_followups(followups.iter().map(|f| f.id)).since(since);
        let engaged = window.clone().of_types(&EventType::ENGAGEMENTS);
        let (events_by_followup, engagements_by_followup) = tokio::try_join!(
            self.events.count_by_followup(&window),
            self.events.count_by_followup(&engaged),
        )?;

        let total_views: u64 = events_by_followup.values().sum();
        let total_engagements: u64 = engagements_by_followup.values().sum();

        // `followups` is newest first, so a stable sort by views keeps the
        // newer follow-up ahead on ties.
        let mut published: Vec<_> = followups.iter().filter(|f| f.is_published()).collect();
        published.sort_by_key(|f| {
            std::cmp::Reverse(events_by_followup.get(&f.id).copied().unwrap_or(0))
        });
        let top_performing_followups = published
            .iter()
            .take(TOP_FOLLOWUPS)
            .map(|f| TopFollowup {
                followup_id: f.id,
                title: f.title.clone(),
                company_name: f.company_name.clone(),
                views: events_by_followup.get(&f.id).copied().unwrap_or(0),
                engagements: engagements_by_followup.get(&f.id).copied().unwrap_or(0),
            })
            .collect();

        Ok(OwnerSummary {
            total_followups: followups.len() as u64,
            published_followups: published.len() as u64,
            total_views,
            total_engagements,
            average_engagement_rate: aggregate::engagement_rate(total_engagements, total_views),
            top_performing_followups,
        })
    }

    /// All-time engagement detail for one follow-up.
    ///
    /// # Errors
    ///
    /// Returns [`EngagementError::NotFound`] if the follow-up does not exist
    /// or is not owned by `user_id`, or a store error.
    pub async fn detailed_followup_analytics(
        &self,
        followup_id: FollowupId,
        user_id: &str,
    ) -> Result<DetailedFollowupAnalytics, EngagementError> {
        owned_followup(self.followups.as_ref(), followup_id, user_id).await?;

        let all = EventQuery::for_followup(followup_id);
        let views = all.clone().of_type(EventType::PageView);
        let dwell = all.clone().of_type(EventType::SectionTime);
        let clicks = all.clone().of_type(EventType::LinkClick);
        let located = all.located();

        let (
            unique_visitors,
            total_page_views,
            durations,
            confirmations,
            dwell_events,
            click_events,
            devices,
            top_locations,
        ) = tokio::try_join!(
            self.events.count_distinct_sessions(&views),
            self.events.count_events(&views),
            self.sessions.known_durations(followup_id, None),
            self.confirmations.count_confirmations_by_type(followup_id),
            self.events.list_events(&dwell),
            self.events.list_events(&clicks),
            self.events.count_by_device(&views),
            self.events.top_locations(&located, TOP_LOCATIONS),
        )?;

        Ok(DetailedFollowupAnalytics {
            followup_id,
            unique_visitors,
            total_page_views,
            average_time_on_page: aggregate::rounded_mean(&durations),
            feedback: aggregate::feedback_breakdown(&confirmations),
            section_engagement: aggregate::section_engagement(&dwell_events),
            link_clicks: aggregate::link_click_counts(&click_events),
            interest_signals: aggregate::interest_signals(&confirmations),
            device_breakdown: aggregate::device_breakdown(&devices),
            top_locations,
        })
    }

    /// All-time landing-page summary for an owner.
    ///
    /// # Errors
    ///
    /// Returns a store error if a read fails.
    pub async fn analytics_summary(
        &self,
        user_id: &str,
    ) -> Result<AnalyticsSummary, EngagementError> {
        let followups = self.followups.find_many_by_owner(user_id, None).await?;
        let count_status = |status: FollowupStatus| {
            followups.iter().filter(|f| f.status == status).count() as u64
        };
        let published_followups = count_status(FollowupStatus::Published);
        let draft_followups = count_status(FollowupStatus::Draft);

        let all = EventQuery::for_followups(followups.iter().map(|f| f.id));
        let views = all.clone().of_type(EventType::PageView);
        let engaged = all.of_types(&EventType::ENGAGEMENTS_WITH_DWELL);
        let (total_views, total_unique_visitors, total_engagements) = tokio::try_join!(
            self.events.count_events(&views),
            self.events.count_distinct_sessions(&views),
            self.events.count_events(&engaged),
        )?;

        Ok(AnalyticsSummary {
            total_followups: published_followups + draft_followups,
            published_followups,
            draft_followups,
            most_recent_followup_date: followups.iter().map(|f| f.created_at).max(),
            total_views,
            total_unique_visitors,
            total_engagements,
            average_engagement_rate: aggregate::engagement_rate(total_engagements, total_views),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{
        ConfirmationType, DeviceType, NewConfirmation, SessionId, VisitorContext,
    };
    use crate::service::test_support::{Fixture, OWNER, STRANGER};
    use serde_json::json;

    fn device(device: DeviceType) -> VisitorContext {
        VisitorContext {
            device_type: Some(device),
            ..VisitorContext::default()
        }
    }

    fn place(city: &str, country: &str) -> VisitorContext {
        VisitorContext {
            location_city: Some(city.to_string()),
            location_country: Some(country.to_string()),
            ..VisitorContext::default()
        }
    }

    #[tokio::test]
    async fn followup_analytics_counts_views_and_engagements() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let f = fx.followup(OWNER, FollowupStatus::Published).await;
        let s1 = SessionId::new();
        let s2 = SessionId::new();

        fx.event(f.id, s1, EventType::PageView, None, device(DeviceType::Mobile)).await;
        fx.event(f.id, s1, EventType::PageView, None, device(DeviceType::Mobile)).await;
        fx.event(f.id, s2, EventType::PageView, None, device(DeviceType::Desktop)).await;
        fx.event(f.id, s2, EventType::LinkClick, None, device(DeviceType::Tablet)).await;
        fx.event(f.id, s2, EventType::CopyEmail, None, VisitorContext::default()).await;
        fx.ended_session(f.id, 10).await;
        fx.ended_session(f.id, 15).await;

        let Ok(report) = service
            .followup_analytics(f.id, OWNER, TimeRange::Month)
            .await
        else {
            panic!("analytics should succeed");
        };
        assert_eq!(report.total_views, 3);
        assert_eq!(report.unique_visitors, 2);
        assert_eq!(report.link_clicks, 1);
        assert_eq!(report.email_copies, 1);
        assert_eq!(report.file_downloads, 0);
        assert_eq!(report.total_duration, 25);
        assert_eq!(report.average_duration, 12);
        assert_eq!(report.recent_sessions.len(), 2);
        // device breakdown only counts page views
        assert_eq!(report.device_breakdown.mobile, 2);
        assert_eq!(report.device_breakdown.desktop, 1);
        assert_eq!(report.device_breakdown.tablet, 0);
    }

    #[tokio::test]
    async fn top_locations_keep_city_order_quirk() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let f = fx.followup(OWNER, FollowupStatus::Published).await;
        let s = SessionId::new();
        for _ in 0..4 {
            fx.event(f.id, s, EventType::PageView, None, place("Zagreb", "Croatia")).await;
        }
        for city in ["Berlin", "Austin", "Cairo", "Dublin", "Essen", "Faro"] {
            fx.event(f.id, s, EventType::SectionView, None, place(city, "X")).await;
        }

        let Ok(report) = service
            .followup_analytics(f.id, OWNER, TimeRange::All)
            .await
        else {
            panic!("analytics should succeed");
        };
        let cities: Vec<&str> = report.top_locations.iter().map(|l| l.city.as_str()).collect();
        // Ordered by city name, not by count: the busiest city drops out.
        assert_eq!(cities, vec!["Austin", "Berlin", "Cairo", "Dublin", "Essen"]);
    }

    #[tokio::test]
    async fn window_excludes_older_events() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let f = fx.followup(OWNER, FollowupStatus::Published).await;
        fx.event(f.id, SessionId::new(), EventType::PageView, None, VisitorContext::default())
            .await;
        fx.memory.backdate_events(f.id, chrono::Duration::days(2)).await;
        fx.event(f.id, SessionId::new(), EventType::PageView, None, VisitorContext::default())
            .await;

        let Ok(day) = service.followup_analytics(f.id, OWNER, TimeRange::Day).await else {
            panic!("analytics should succeed");
        };
        let Ok(week) = service.followup_analytics(f.id, OWNER, TimeRange::Week).await else {
            panic!("analytics should succeed");
        };
        assert_eq!(day.total_views, 1);
        assert_eq!(week.total_views, 2);
    }

    #[tokio::test]
    async fn foreign_followup_reads_as_missing() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let f = fx.followup(OWNER, FollowupStatus::Published).await;

        let foreign = service
            .followup_analytics(f.id, STRANGER, TimeRange::Month)
            .await;
        let missing = service
            .followup_analytics(FollowupId::new(), STRANGER, TimeRange::Month)
            .await;
        assert_eq!(foreign.err(), Some(EngagementError::followup_not_found()));
        assert_eq!(missing.err(), Some(EngagementError::followup_not_found()));
        assert_eq!(
            service.detailed_followup_analytics(f.id, STRANGER).await.err(),
            Some(EngagementError::followup_not_found())
        );
    }

    #[tokio::test]
    async fn owner_summary_rates_and_ranks() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let quiet = fx
            .followup_titled(OWNER, FollowupStatus::Published, "Quiet")
            .await;
        let busy = fx
            .followup_titled(OWNER, FollowupStatus::Published, "Busy")
            .await;
        let draft = fx.followup(OWNER, FollowupStatus::Draft).await;
        fx.followup(STRANGER, FollowupStatus::Published).await;

        let s = SessionId::new();
        fx.event(quiet.id, s, EventType::PageView, None, VisitorContext::default()).await;
        for t in [
            EventType::PageView,
            EventType::PageView,
            EventType::LinkClick,
            EventType::SectionTime,
        ] {
            fx.event(busy.id, s, t, None, VisitorContext::default()).await;
        }
        fx.event(draft.id, s, EventType::FileDownload, None, VisitorContext::default()).await;

        let Ok(summary) = service.owner_summary(OWNER, TimeRange::Month).await else {
            panic!("summary should succeed");
        };
        assert_eq!(summary.total_followups, 3);
        assert_eq!(summary.published_followups, 2);
        // every event counts toward views in this summary
        assert_eq!(summary.total_views, 6);
        assert_eq!(summary.total_engagements, 2);
        assert_eq!(summary.average_engagement_rate, 33);
        let titles: Vec<&str> = summary
            .top_performing_followups
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Busy", "Quiet"]);
        let Some(top) = summary.top_performing_followups.first() else {
            panic!("expected a top follow-up");
        };
        assert_eq!(top.views, 4);
        assert_eq!(top.engagements, 1);
        assert_eq!(top.company_name.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn owner_without_followups_gets_zeroes() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let Ok(summary) = service.owner_summary(OWNER, TimeRange::All).await else {
            panic!("summary should succeed");
        };
        assert_eq!(summary.total_views, 0);
        assert_eq!(summary.average_engagement_rate, 0);
        assert!(summary.top_performing_followups.is_empty());

        let Ok(landing) = service.analytics_summary(OWNER).await else {
            panic!("summary should succeed");
        };
        assert_eq!(landing.total_followups, 0);
        assert_eq!(landing.most_recent_followup_date, None);
    }

    #[tokio::test]
    async fn detailed_analytics_combines_events_and_feedback() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let f = fx.followup(OWNER, FollowupStatus::Published).await;
        let s = SessionId::new();

        fx.event(f.id, s, EventType::PageView, None, VisitorContext::default()).await;
        fx.event(
            f.id,
            s,
            EventType::SectionTime,
            Some(json!({"sectionName": "intro", "duration": 5000})),
            VisitorContext::default(),
        )
        .await;
        fx.event(
            f.id,
            s,
            EventType::SectionTime,
            Some(json!({"sectionName": "intro", "duration": 3000})),
            VisitorContext::default(),
        )
        .await;
        fx.event(
            f.id,
            s,
            EventType::LinkClick,
            Some(json!({"url": "https://cal.example/book"})),
            VisitorContext::default(),
        )
        .await;
        fx.ended_session(f.id, 10).await;
        fx.ended_session(f.id, 15).await;
        for kind in [
            ConfirmationType::RecapAccurate,
            ConfirmationType::RecapAccurate,
            ConfirmationType::RecapInaccurate,
            ConfirmationType::ScheduleCall,
        ] {
            let result = fx
                .stores
                .confirmations
                .insert_confirmation(NewConfirmation {
                    followup_id: f.id,
                    session_id: None,
                    kind,
                    comment: None,
                })
                .await;
            assert!(result.is_ok());
        }

        let Ok(detail) = service.detailed_followup_analytics(f.id, OWNER).await else {
            panic!("detail should succeed");
        };
        assert_eq!(detail.unique_visitors, 1);
        assert_eq!(detail.total_page_views, 1);
        assert_eq!(detail.average_time_on_page, 13);
        assert_eq!(detail.feedback.recap.positive, 2);
        assert_eq!(detail.feedback.recap.total, 3);
        assert_eq!(detail.feedback.value_proposition.total, 0);
        assert_eq!(detail.interest_signals.schedule_call_count, 1);
        assert_eq!(detail.interest_signals.total_interest, 1);
        let [section] = detail.section_engagement.as_slice() else {
            panic!("expected one section");
        };
        assert_eq!(section.section_name, "intro");
        assert_eq!(section.total_time_spent, 8000);
        assert_eq!(section.view_count, 2);
        assert_eq!(detail.link_clicks.len(), 1);
    }

    #[tokio::test]
    async fn analytics_summary_counts_dwell_as_engagement() {
        let fx = Fixture::new();
        let service = AnalyticsService::new(&fx.stores);
        let published = fx.followup(OWNER, FollowupStatus::Published).await;
        fx.followup(OWNER, FollowupStatus::Draft).await;
        let s1 = SessionId::new();
        let s2 = SessionId::new();
        for s in [s1, s1, s2, s2] {
            fx.event(published.id, s, EventType::PageView, None, VisitorContext::default())
                .await;
        }
        fx.event(published.id, s1, EventType::SectionTime, None, VisitorContext::default())
            .await;
        fx.event(published.id, s2, EventType::CopyPhone, None, VisitorContext::default())
            .await;

        let Ok(summary) = service.analytics_summary(OWNER).await else {
            panic!("summary should succeed");
        };
        assert_eq!(summary.total_followups, 2);
        assert_eq!(summary.published_followups, 1);
        assert_eq!(summary.draft_followups, 1);
        assert_eq!(summary.total_views, 4);
        assert_eq!(summary.total_unique_visitors, 2);
        assert_eq!(summary.total_engagements, 2);
        assert_eq!(summary.average_engagement_rate, 50);
        assert!(summary.most_recent_followup_date.is_some());
    }
}
