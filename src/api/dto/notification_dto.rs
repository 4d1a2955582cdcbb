//! Notification DTOs.

use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::PreferenceUpdate;
use crate::error::EngagementError;

/// `?limit=` for the notification history.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Maximum entries, 1 to 200; defaults to 50.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Checks a preference update before it is applied.
///
/// # Errors
///
/// Returns [`EngagementError::Validation`] if `notifyEmail` is set to a
/// value that is not an email address.
pub fn validate_preference_update(update: &PreferenceUpdate) -> Result<(), EngagementError> {
    match &update.notify_email {
        Some(Some(email)) if !is_email_address(email) => Err(EngagementError::Validation(
            "notifyEmail must be an email address".to_string(),
        )),
        _ => Ok(()),
    }
}

/// `local@domain.tld` with a non-empty local part, one `@`, no whitespace,
/// and a dotted domain whose labels are non-empty.
fn is_email_address(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !raw.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
