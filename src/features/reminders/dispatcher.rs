//! Reminder delivery
//!
//! Resolves the owner on Discord, sends the reminder as a DM, then fires the
//! optional push notification. Only the DM decides whether delivery succeeded.

use async_trait::async_trait;
use log::{debug, warn};
use serenity::http::{Http, HttpError};
use serenity::model::id::UserId;
use std::sync::Arc;

use crate::core::{truncate_for_message, ReminderError};
use crate::features::notifications::PushNotifier;

/// A user the chat platform confirmed it can reach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub id: u64,
    pub name: String,
}

/// The chat platform as seen by the dispatcher
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn resolve_user(&self, owner: &str) -> Result<Recipient, ReminderError>;
    async fn send_direct_message(&self, recipient: &Recipient, text: &str)
        -> Result<(), ReminderError>;
}

/// Discord over serenity's HTTP client
#[derive(Clone)]
pub struct SerenityChat {
    http: Arc<Http>,
}

impl SerenityChat {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn is_not_found(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(http_err) => matches!(
            http_err.as_ref(),
            HttpError::UnsuccessfulRequest(response) if response.status_code.as_u16() == 404
        ),
        _ => false,
    }
}

#[async_trait]
impl ChatPlatform for SerenityChat {
    async fn resolve_user(&self, owner: &str) -> Result<Recipient, ReminderError> {
        let id = owner
            .parse::<u64>()
            .map_err(|_| ReminderError::RecipientUnreachable {
                owner: owner.to_string(),
                reason: "not a Discord user id".to_string(),
            })?;

        match self.http.get_user(id).await {
            Ok(user) => Ok(Recipient {
                id: user.id.0,
                name: user.name,
            }),
            Err(e) => {
                let reason = if is_not_found(&e) {
                    "user not found".to_string()
                } else {
                    format!("http error fetching user: {e}")
                };
                Err(ReminderError::RecipientUnreachable {
                    owner: owner.to_string(),
                    reason,
                })
            }
        }
    }

    async fn send_direct_message(
        &self,
        recipient: &Recipient,
        text: &str,
    ) -> Result<(), ReminderError> {
        let failed = |e: serenity::Error| ReminderError::DeliveryFailed {
            owner: recipient.id.to_string(),
            reason: e.to_string(),
        };

        let dm = UserId(recipient.id)
            .create_dm_channel(&*self.http)
            .await
            .map_err(failed)?;
        dm.send_message(&*self.http, |m| m.content(text))
            .await
            .map_err(failed)?;
        Ok(())
    }
}

/// What happened on the push side channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Sent,
    Failed(String),
    Disabled,
}

/// Result of a successful delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub recipient: Recipient,
    pub push: PushOutcome,
}

struct PushChannel {
    notifier: Arc<dyn PushNotifier>,
    topic: String,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    chat: Arc<dyn ChatPlatform>,
    push: Option<Arc<PushChannel>>,
}

impl NotificationDispatcher {
    pub fn new(chat: Arc<dyn ChatPlatform>) -> Self {
        Self { chat, push: None }
    }

    /// Also publish every delivered reminder to `topic`
    pub fn with_push(mut self, notifier: Arc<dyn PushNotifier>, topic: impl Into<String>) -> Self {
        self.push = Some(Arc::new(PushChannel {
            notifier,
            topic: topic.into(),
        }));
        self
    }

    /// Text of the direct message for a reminder
    pub fn format_message(message: &str) -> String {
        truncate_for_message(&format!("⏰ Reminder: {message}"))
    }

    pub async fn deliver(&self, owner: &str, message: &str) -> Result<DeliveryReport, ReminderError> {
        let recipient = self.chat.resolve_user(owner).await?;

        self.chat
            .send_direct_message(&recipient, &Self::format_message(message))
            .await?;
        debug!("Sent reminder DM to {} ({})", recipient.name, recipient.id);

        let push = match &self.push {
            Some(channel) => match channel.notifier.send(&channel.topic, message).await {
                Ok(()) => PushOutcome::Sent,
                Err(e) => {
                    warn!("Push notification for {owner} failed (reminder still delivered): {e}");
                    PushOutcome::Failed(e.to_string())
                }
            },
            None => PushOutcome::Disabled,
        };

        Ok(DeliveryReport { recipient, push })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes shared by dispatcher and scheduler tests

    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct FakeChat {
        pub unknown_users: Mutex<HashSet<String>>,
        pub failing_dms: Mutex<HashSet<String>>,
        pub sent: Mutex<Vec<(String, String)>>,
        pub resolve_calls: Mutex<usize>,
    }

    impl FakeChat {
        pub fn with_unknown(owner: &str) -> Self {
            let chat = Self::default();
            chat.unknown_users.lock().unwrap().insert(owner.to_string());
            chat
        }

        pub fn with_failing_dm(owner: &str) -> Self {
            let chat = Self::default();
            chat.failing_dms.lock().unwrap().insert(owner.to_string());
            chat
        }

        pub fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatPlatform for FakeChat {
        async fn resolve_user(&self, owner: &str) -> Result<Recipient, ReminderError> {
            *self.resolve_calls.lock().unwrap() += 1;
            if self.unknown_users.lock().unwrap().contains(owner) {
                return Err(ReminderError::RecipientUnreachable {
                    owner: owner.to_string(),
                    reason: "user not found".to_string(),
                });
            }
            let id = owner.trim_start_matches('U').parse().unwrap_or(0);
            Ok(Recipient {
                id,
                name: owner.to_string(),
            })
        }

        async fn send_direct_message(
            &self,
            recipient: &Recipient,
            text: &str,
        ) -> Result<(), ReminderError> {
            if self.failing_dms.lock().unwrap().contains(&recipient.name) {
                return Err(ReminderError::DeliveryFailed {
                    owner: recipient.name.clone(),
                    reason: "cannot send messages to this user".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((recipient.name.clone(), text.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakePush {
        pub fail: bool,
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl PushNotifier for FakePush {
        async fn send(&self, topic: &str, text: &str) -> Result<(), ReminderError> {
            if self.fail {
                return Err(ReminderError::Transport("connection refused".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((topic.to_string(), text.to_string()));
            Ok(())
        }
    }
}
