//! Thin REST client for the email delivery provider.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ApiError;

const PROVIDER: &str = "resend";
const API_BASE: &str = "https://api.resend.com";

/// A file forwarded along with a notification.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

/// An email to be delivered by the provider.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub reply_to: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl OutboundMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            subject: subject.into(),
            html: html.into(),
            reply_to: None,
            attachments: Vec::new(),
        }
    }

    /// Set the reply-to address (typically the form submitter).
    pub fn reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = Some(address.into());
        self
    }

    /// Attach files to the message.
    pub fn attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Delivery receipt from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct SentMessage {
    pub id: String,
}

/// Provider error body: `{"statusCode": ..., "message": ..., "name": ...}`.
#[derive(Debug, Deserialize)]
struct ProviderError {
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct MailClient {
    http: Client,
    api_key: String,
    from: String,
    base_url: String,
}

impl MailClient {
    pub fn new(
        api_key: impl Into<String>,
        from: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            from: from.into(),
            base_url: API_BASE.to_string(),
        })
    }

    /// Send a message and return the provider's delivery id.
    pub async fn send(&self, message: &OutboundMessage) -> Result<SentMessage, ApiError> {
        let body = build_send_body(&self.from, message);

        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "mail_request_failed");
                ApiError::upstream(PROVIDER, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ProviderError>(&text) {
                Ok(err) if !err.message.is_empty() => err.message,
                _ => format!("HTTP {status}"),
            };
            warn!(
                status_code = status.as_u16(),
                message = %message,
                "mail_error_response"
            );
            return Err(ApiError::upstream(PROVIDER, message));
        }

        let sent: SentMessage = response
            .json()
            .await
            .map_err(|e| ApiError::upstream(PROVIDER, format!("invalid response body: {e}")))?;

        info!(
            message_id = %sent.id,
            recipient_count = message.to.len(),
            attachment_count = message.attachments.len(),
            "mail_sent"
        );

        Ok(sent)
    }
}

/// JSON body for the provider's send endpoint. Attachment content is
/// base64 as the provider requires.
fn build_send_body(from: &str, message: &OutboundMessage) -> Value {
    let mut body = json!({
        "from": from,
        "to": message.to,
        "subject": message.subject,
        "html": message.html,
    });

    if let Some(reply_to) = &message.reply_to {
        body["reply_to"] = json!(reply_to);
    }

    if !message.attachments.is_empty() {
        body["attachments"] = message
            .attachments
            .iter()
            .map(|a| {
                json!({
                    "filename": a.filename,
                    "content": BASE64.encode(&a.content),
                })
            })
            .collect::<Vec<_>>()
            .into();
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_send_body_minimal() {
        let message = OutboundMessage::new("inbox@example.com", "Hello", "<p>Hi</p>");
        let body = build_send_body("Payfront <noreply@payfront.dev>", &message);

        assert_eq!(body["from"], "Payfront <noreply@payfront.dev>");
        assert_eq!(body["to"][0], "inbox@example.com");
        assert_eq!(body["subject"], "Hello");
        assert_eq!(body["html"], "<p>Hi</p>");
        assert!(body.get("reply_to").is_none());
        assert!(body.get("attachments").is_none());
    }

    #[test]
    fn test_build_send_body_with_reply_to_and_attachments() {
        let message = OutboundMessage::new("inbox@example.com", "Quote", "<p>Quote</p>")
            .reply_to("customer@example.com")
            .attachments(vec![Attachment {
                filename: "brief.pdf".to_string(),
                content: b"hello".to_vec(),
            }]);

        let body = build_send_body("noreply@payfront.dev", &message);

        assert_eq!(body["reply_to"], "customer@example.com");
        assert_eq!(body["attachments"][0]["filename"], "brief.pdf");
        // "hello" in base64
        assert_eq!(body["attachments"][0]["content"], "aGVsbG8=");
    }
}
