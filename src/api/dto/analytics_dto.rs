//! Query parameters for the owner analytics endpoints.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::TimeRange;

/// `?timeRange=` selector; defaults to the trailing 30 days.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct TimeRangeQuery {
    /// One of `24h`, `7d`, `30d`, `90d`, `all`.
    #[serde(default)]
    #[param(value_type = Option<String>, example = "30d")]
    pub time_range: TimeRange,
}
