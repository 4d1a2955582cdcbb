//! # followup-pulse
//!
//! Engagement tracking, analytics aggregation and owner notifications for
//! published follow-up pages.
//!
//! Visitors of a published follow-up produce events, sessions and one-click
//! confirmations through public endpoints. Owners read windowed and
//! all-time analytics over that activity, and are notified about first
//! views and revisits according to their preferences.
//!
//! ## Architecture
//!
//! ```text
//! Clients (visitors, owner dashboard)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── TrackingService ──► PageViewDispatcher (domain/) ──► NotificationService
//!     ├── AnalyticsService / ConfirmationService (service/)
//!     │
//!     ├── Store traits (persistence/)
//!     │
//!     └── MemoryStore | PostgreSQL
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
