//! Shared request validation helpers.

use crate::domain::VisitorContext;
use crate::error::EngagementError;

/// Longest accepted browser name.
pub const MAX_BROWSER_LEN: usize = 50;
/// Longest accepted city or country name.
pub const MAX_LOCATION_LEN: usize = 100;

/// Rejects a string field longer than `max` characters.
///
/// # Errors
///
/// Returns [`EngagementError::Validation`] naming `field`.
pub fn check_len(field: &str, value: Option<&str>, max: usize) -> Result<(), EngagementError> {
    match value {
        Some(v) if v.chars().count() > max => Err(EngagementError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Checks the visitor context sent with events and sessions.
///
/// # Errors
///
/// Returns [`EngagementError::Validation`] if a field is too long.
pub fn validate_context(context: &VisitorContext) -> Result<(), EngagementError> {
    check_len("browser", context.browser.as_deref(), MAX_BROWSER_LEN)?;
    check_len(
        "locationCity",
        context.location_city.as_deref(),
        MAX_LOCATION_LEN,
    )?;
    check_len(
        "locationCountry",
        context.location_country.as_deref(),
        MAX_LOCATION_LEN,
    )
}
