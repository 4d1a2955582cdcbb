//! Shared fixtures for service tests.

#![allow(clippy::panic)]

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{
    Event, EventType, FollowupId, FollowupRef, FollowupStatus, IpHash, NewEvent, NewSession,
    Session, SessionId, VisitorContext,
};
use crate::persistence::{MemoryStore, Stores};

pub(crate) const OWNER: &str = "owner-1";
pub(crate) const STRANGER: &str = "owner-2";

pub(crate) struct Fixture {
    pub(crate) memory: Arc<MemoryStore>,
    pub(crate) stores: Stores,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let memory = Arc::new(MemoryStore::new());
        let stores = Stores::from_backend(&memory);
        Self { memory, stores }
    }

    pub(crate) async fn followup(&self, owner: &str, status: FollowupStatus) -> FollowupRef {
        let id = FollowupId::new();
        self.followup_titled(owner, status, &format!("Follow-up {id}"))
            .await
    }

    pub(crate) async fn followup_titled(
        &self,
        owner: &str,
        status: FollowupStatus,
        title: &str,
    ) -> FollowupRef {
        let id = FollowupId::new();
        let followup = FollowupRef {
            id,
            user_id: owner.to_string(),
            status,
            slug: format!("f-{id}"),
            title: title.to_string(),
            company_name: Some("Acme".to_string()),
            created_at: Utc::now(),
        };
        self.memory.upsert_followup(followup.clone()).await;
        followup
    }

    pub(crate) async fn event(
        &self,
        followup_id: FollowupId,
        session_id: SessionId,
        event_type: EventType,
        event_data: Option<serde_json::Value>,
        context: VisitorContext,
    ) -> Event {
        let result = self
            .stores
            .events
            .insert_event(NewEvent {
                followup_id,
                session_id,
                event_type,
                event_data,
                context,
                ip_hash: IpHash::from_address("198.51.100.20"),
            })
            .await;
        let Ok(event) = result else {
            panic!("event insert failed");
        };
        event
    }

    pub(crate) async fn ended_session(&self, followup_id: FollowupId, seconds: i64) -> Session {
        let Ok(session) = self
            .stores
            .sessions
            .insert_session(NewSession {
                followup_id,
                context: VisitorContext::default(),
            })
            .await
        else {
            panic!("session insert failed");
        };
        let Ok(Some(closed)) = self
            .stores
            .sessions
            .close_session(session.id, Utc::now(), seconds)
            .await
        else {
            panic!("session close failed");
        };
        closed
    }
}
