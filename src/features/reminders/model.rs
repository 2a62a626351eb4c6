//! Reminder records

use chrono::{DateTime, Utc};

use crate::core::ReminderError;

/// Longest reminder text accepted, so the delivered DM fits one message
pub const MAX_MESSAGE_LEN: usize = 1500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: i64,
    /// Discord user id of the recipient
    pub owner: String,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
    pub message: String,
    pub remind_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub sent: bool,
    /// Per-owner sequence number shown to users as `#N`
    pub list_id: i64,
}

impl Reminder {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.sent && self.remind_at <= now
    }
}

/// A reminder as requested by a user, before it has an id or list number
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: String,
    pub message: String,
    pub remind_at: DateTime<Utc>,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
}

impl NewReminder {
    pub fn new(owner: impl Into<String>, message: impl Into<String>, remind_at: DateTime<Utc>) -> Self {
        Self {
            owner: owner.into(),
            message: message.into(),
            remind_at,
            channel_id: None,
            guild_id: None,
        }
    }

    /// Attach the channel and guild the request came from
    pub fn with_origin(mut self, channel_id: Option<String>, guild_id: Option<String>) -> Self {
        self.channel_id = channel_id;
        self.guild_id = guild_id;
        self
    }

    pub fn validate(&self) -> Result<(), ReminderError> {
        if self.owner.trim().is_empty() {
            return Err(ReminderError::InvalidReminder("owner is empty".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(ReminderError::InvalidReminder(
                "reminder message is empty".to_string(),
            ));
        }
        if self.message.chars().count() > MAX_MESSAGE_LEN {
            return Err(ReminderError::InvalidReminder(format!(
                "reminder message is longer than {MAX_MESSAGE_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample(remind_at: DateTime<Utc>, sent: bool) -> Reminder {
        Reminder {
            id: 1,
            owner: "U1".to_string(),
            channel_id: None,
            guild_id: None,
            message: "drink water".to_string(),
            remind_at,
            created_at: remind_at - Duration::hours(1),
            sent,
            list_id: 1,
        }
    }

    #[test]
    fn test_is_due() {
        let now = Utc::now();
        assert!(sample(now - Duration::seconds(1), false).is_due(now));
        assert!(sample(now, false).is_due(now));
        assert!(!sample(now + Duration::seconds(1), false).is_due(now));
        assert!(!sample(now - Duration::seconds(1), true).is_due(now));
    }

    #[test]
    fn test_validate_rejects_blank_message() {
        let req = NewReminder::new("U1", "   ", Utc::now());
        assert!(matches!(req.validate(), Err(ReminderError::InvalidReminder(_))));
    }

    #[test]
    fn test_validate_rejects_blank_owner() {
        let req = NewReminder::new("", "drink water", Utc::now());
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_message() {
        let req = NewReminder::new("U1", "x".repeat(MAX_MESSAGE_LEN + 1), Utc::now());
        assert!(req.validate().is_err());
        let req = NewReminder::new("U1", "x".repeat(MAX_MESSAGE_LEN), Utc::now());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_with_origin() {
        let req = NewReminder::new("U1", "stretch", Utc::now())
            .with_origin(Some("C1".to_string()), Some("G1".to_string()));
        assert_eq!(req.channel_id.as_deref(), Some("C1"));
        assert_eq!(req.guild_id.as_deref(), Some("G1"));
    }
}
