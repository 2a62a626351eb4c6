//! ntfy.sh publisher
//!
//! Publishes by `POST {url}/{topic}` with the reminder text as the body.

use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use super::PushNotifier;
use crate::core::config::NtfyConfig;
use crate::core::ReminderError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct NtfyClient {
    http: reqwest::Client,
    url: String,
    credentials: Option<(String, String)>,
}

impl NtfyClient {
    pub fn new(config: &NtfyConfig) -> Result<Self, ReminderError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };
        Ok(Self {
            http,
            url: config.url.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

#[async_trait]
impl PushNotifier for NtfyClient {
    async fn send(&self, topic: &str, text: &str) -> Result<(), ReminderError> {
        let topic = topic.trim_matches('/');
        let mut request = self
            .http
            .post(format!("{}/{topic}", self.url))
            .header("Title", "Reminder")
            .body(text.to_string());
        if let Some((user, pass)) = &self.credentials {
            request = request.basic_auth(user, Some(pass));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ReminderError::Transport(format!(
                "ntfy returned {status} for topic {topic}"
            )));
        }

        debug!("Published push notification to ntfy topic {topic}");
        Ok(())
    }
}
