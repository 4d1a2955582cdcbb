//! Detached hand-off of page views to the notification pipeline.
//!
//! [`PageViewDispatcher`] wraps a bounded [`tokio::sync::mpsc`] channel.
//! Event ingestion enqueues a [`PageView`] with `try_send` and returns
//! immediately; a single worker task drains the queue and feeds each job to
//! a [`PageViewHandler`]. A full or closed queue drops the job with a
//! warning: notification is best effort.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{FollowupId, IpHash, SessionId, VisitorContext};

/// A persisted `PAGE_VIEW` awaiting notification processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    /// Follow-up that was viewed.
    pub followup_id: FollowupId,
    /// Viewing session.
    pub session_id: SessionId,
    /// Hashed viewer identity.
    pub ip_hash: IpHash,
    /// Viewer context from the event.
    pub context: VisitorContext,
}

/// Consumer of queued page views.
///
/// Implementations must absorb their own failures; the worker never sees
/// them.
#[async_trait]
pub trait PageViewHandler: Send + Sync {
    /// Processes one page view.
    async fn handle(&self, view: PageView);
}

/// Sending half of the page-view queue.
#[derive(Debug, Clone)]
pub struct PageViewDispatcher {
    sender: mpsc::Sender<PageView>,
}

impl PageViewDispatcher {
    /// Creates a dispatcher and the receiver a worker should drain.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PageView>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Creates a dispatcher and spawns the worker that feeds `handler`.
    ///
    /// The worker exits once every dispatcher clone has been dropped and
    /// the queue is drained.
    #[must_use]
    pub fn spawn(capacity: usize, handler: Arc<dyn PageViewHandler>) -> (Self, JoinHandle<()>) {
        let (dispatcher, mut receiver) = Self::channel(capacity);
        let worker = tokio::spawn(async move {
            while let Some(view) = receiver.recv().await {
                handler.handle(view).await;
            }
            tracing::debug!("page view queue closed");
        });
        (dispatcher, worker)
    }

    /// Enqueues a page view without waiting.
    ///
    /// Returns `false` if the job was dropped.
    pub fn dispatch(&self, view: PageView) -> bool {
        match self.sender.try_send(view) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(view)) => {
                tracing::warn!(
                    followup_id = %view.followup_id,
                    session_id = %view.session_id,
                    "page view queue full, notification skipped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(view)) => {
                tracing::warn!(
                    followup_id = %view.followup_id,
                    session_id = %view.session_id,
                    "page view queue closed, notification skipped"
                );
                false
            }
        }
    }
}
