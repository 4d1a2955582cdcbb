//! Relative aggregation windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Window selector accepted by the windowed aggregation operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TimeRange {
    /// Trailing 24 hours.
    #[serde(rename = "24h")]
    Day,
    /// Trailing 7 days.
    #[serde(rename = "7d")]
    Week,
    /// Trailing 30 days.
    #[default]
    #[serde(rename = "30d")]
    Month,
    /// Trailing 90 days.
    #[serde(rename = "90d")]
    Quarter,
    /// Everything since the epoch.
    #[serde(rename = "all")]
    All,
}

impl TimeRange {
    /// Inclusive lower bound of the window ending at `now`.
    #[must_use]
    pub fn start(self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Day => now - Duration::hours(24),
            Self::Week => now - Duration::days(7),
            Self::Month => now - Duration::days(30),
            Self::Quarter => now - Duration::days(90),
            Self::All => DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// Wire name (e.g. `"7d"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "24h",
            Self::Week => "7d",
            Self::Month => "30d",
            Self::Quarter => "90d",
            Self::All => "all",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_thirty_days() {
        assert_eq!(TimeRange::default(), TimeRange::Month);
    }

    #[test]
    fn start_offsets() {
        let now = Utc::now();
        assert_eq!(now - TimeRange::Day.start(now), Duration::hours(24));
        assert_eq!(now - TimeRange::Week.start(now), Duration::days(7));
        assert_eq!(now - TimeRange::Quarter.start(now), Duration::days(90));
        assert_eq!(TimeRange::All.start(now).timestamp(), 0);
    }

    #[test]
    fn parses_wire_names() {
        for range in [
            TimeRange::Day,
            TimeRange::Week,
            TimeRange::Month,
            TimeRange::Quarter,
            TimeRange::All,
        ] {
            let json = format!("\"{}\"", range.as_str());
            let parsed: Result<TimeRange, _> = serde_json::from_str(&json);
            assert_eq!(parsed.ok(), Some(range));
        }
        assert!(serde_json::from_str::<TimeRange>("\"1y\"").is_err());
    }
}
