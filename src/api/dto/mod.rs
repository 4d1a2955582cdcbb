//! Data Transfer Objects for REST request parsing and validation.
//!
//! Responses reuse the domain records and report types directly; only
//! request bodies and query strings live here.

pub mod analytics_dto;
pub mod common_dto;
pub mod confirmation_dto;
pub mod notification_dto;
pub mod tracking_dto;

pub use analytics_dto::*;
pub use common_dto::*;
pub use confirmation_dto::*;
pub use notification_dto::*;
pub use tracking_dto::*;
