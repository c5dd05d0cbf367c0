use serde::Serialize;
use tracing::{debug, trace};

use super::recipient::Recipient;
use crate::error::PluginError;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Serialize, Debug)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_thread_id: Option<&'a str>,
}

/// Delivers one message to one recipient
pub trait MessageSender {
    async fn send(&self, recipient: &Recipient, text: &str) -> Result<(), PluginError>;
}

/// Bot API client posting Markdown messages
pub struct TelegramClient {
    client: reqwest::Client,
    endpoint: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), token),
        }
    }
}

impl MessageSender for TelegramClient {
    async fn send(&self, recipient: &Recipient, text: &str) -> Result<(), PluginError> {
        let request = SendMessage {
            chat_id: &recipient.chat_id,
            text,
            parse_mode: "Markdown",
            message_thread_id: recipient.thread_id.as_deref(),
        };
        trace!("Sending {} chars to {}", text.len(), recipient);

        let transport = |message: String| PluginError::Transport {
            recipient: recipient.to_string(),
            message,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            // without_url keeps the bot token out of the error text
            .map_err(|e| transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(transport(format!("HTTP {}: {}", status, body)));
        }

        debug!("Delivered message to {}", recipient);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_json_with_thread() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "12345",
                "text": "hello",
                "parse_mode": "Markdown",
                "message_thread_id": "67"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new(&server.uri(), "TOKEN");
        client
            .send(&Recipient::parse("12345/67"), "hello")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_omits_absent_thread() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": "12345",
                "text": "hello",
                "parse_mode": "Markdown"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new(&format!("{}/", server.uri()), "TOKEN");
        client.send(&Recipient::parse("12345/"), "hello").await.unwrap();
    }

    #[tokio::test]
    async fn test_send_rejected_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
            .mount(&server)
            .await;

        let client = TelegramClient::new(&server.uri(), "TOKEN");
        let err = client
            .send(&Recipient::parse("999"), "hello")
            .await
            .unwrap_err();
        match err {
            PluginError::Transport { recipient, message } => {
                assert_eq!(recipient, "999");
                assert!(message.contains("chat not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
