//! Error taxonomy for the reminder workflow
//!
//! Every variant is contained to the request or reminder in flight. Command
//! handlers surface `Parse`/`InvalidReminder` to the user, the poller logs the
//! rest and retries on the next tick.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("could not parse time `{0}`")]
    Parse(String),
    #[error("invalid reminder: {0}")]
    InvalidReminder(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlite::Error),
    #[error("recipient {owner} unreachable: {reason}")]
    RecipientUnreachable { owner: String, reason: String },
    #[error("delivery to {owner} failed: {reason}")]
    DeliveryFailed { owner: String, reason: String },
    #[error("push transport error: {0}")]
    Transport(String),
}

impl ReminderError {
    /// Whether the poller should leave the reminder unsent for the next tick
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReminderError::Storage(_)
                | ReminderError::RecipientUnreachable { .. }
                | ReminderError::DeliveryFailed { .. }
                | ReminderError::Transport(_)
        )
    }

    /// Whether the error should be shown to the user who issued a command
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ReminderError::Parse(_) | ReminderError::InvalidReminder(_)
        )
    }
}

impl From<reqwest::Error> for ReminderError {
    fn from(err: reqwest::Error) -> Self {
        ReminderError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_errors_are_retryable() {
        let unreachable = ReminderError::RecipientUnreachable {
            owner: "U1".to_string(),
            reason: "unknown user".to_string(),
        };
        let failed = ReminderError::DeliveryFailed {
            owner: "U1".to_string(),
            reason: "dm closed".to_string(),
        };
        assert!(unreachable.is_retryable());
        assert!(failed.is_retryable());
        assert!(!unreachable.is_user_facing());
    }

    #[test]
    fn test_parse_error_is_user_facing() {
        let err = ReminderError::Parse("whenever".to_string());
        assert!(err.is_user_facing());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "could not parse time `whenever`");
    }

    #[test]
    fn test_display_includes_owner() {
        let err = ReminderError::DeliveryFailed {
            owner: "42".to_string(),
            reason: "timed out".to_string(),
        };
        assert_eq!(err.to_string(), "delivery to 42 failed: timed out");
    }
}
