//! Handlers registered with the event dispatcher at startup.
//!
//! Each handler receives the `data.object` payload of one verified
//! event. Errors returned here are logged by the dispatcher and never
//! surfaced to the webhook origin.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use crate::mail::{templates, MailClient, OutboundMessage};

use super::dispatcher::EventHandler;

/// Fulfills a completed checkout: logs the paid session and emails an
/// internal notification.
pub struct CheckoutCompletedHandler {
    mailer: MailClient,
    recipient: String,
}

impl CheckoutCompletedHandler {
    pub fn new(mailer: MailClient, recipient: impl Into<String>) -> Self {
        Self {
            mailer,
            recipient: recipient.into(),
        }
    }
}

#[async_trait]
impl EventHandler for CheckoutCompletedHandler {
    async fn handle(&self, data: &Value) -> anyhow::Result<()> {
        let session_id = data
            .get("id")
            .and_then(Value::as_str)
            .context("checkout session is missing an id")?;

        let amount_total = data.get("amount_total").and_then(Value::as_i64);
        let currency = data.get("currency").and_then(Value::as_str);
        let customer_email = data
            .get("customer_details")
            .and_then(|d| d.get("email"))
            .and_then(Value::as_str);

        info!(
            session_id = session_id,
            amount_total = amount_total,
            currency = currency,
            "checkout_session_completed"
        );

        let (subject, html) =
            templates::render_payment_notification(session_id, amount_total, currency, customer_email);

        self.mailer
            .send(&OutboundMessage::new(self.recipient.clone(), subject, html))
            .await
            .context("payment notification send failed")?;

        Ok(())
    }
}

/// Logs successful payment intents.
pub struct PaymentSucceededHandler;

#[async_trait]
impl EventHandler for PaymentSucceededHandler {
    async fn handle(&self, data: &Value) -> anyhow::Result<()> {
        info!(
            payment_intent_id = data.get("id").and_then(serde_json::Value::as_str),
            amount = data.get("amount").and_then(serde_json::Value::as_i64),
            currency = data.get("currency").and_then(serde_json::Value::as_str),
            "payment_intent_succeeded"
        );
        Ok(())
    }
}

/// Logs failed payment intents with the provider's failure message.
pub struct PaymentFailedHandler;

#[async_trait]
impl EventHandler for PaymentFailedHandler {
    async fn handle(&self, data: &Value) -> anyhow::Result<()> {
        let failure_message = data
            .get("last_payment_error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str);

        warn!(
            payment_intent_id = data.get("id").and_then(serde_json::Value::as_str),
            failure_message = failure_message,
            "payment_intent_failed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_payment_succeeded_handler_accepts_partial_objects() {
        let handler = PaymentSucceededHandler;
        assert!(handler.handle(&json!({})).await.is_ok());
        assert!(handler
            .handle(&json!({"id": "pi_1", "amount": 4900, "currency": "usd"}))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_payment_failed_handler_accepts_partial_objects() {
        let handler = PaymentFailedHandler;
        assert!(handler.handle(&json!({"id": "pi_1"})).await.is_ok());
        assert!(handler
            .handle(&json!({
                "id": "pi_1",
                "last_payment_error": {"message": "card declined"}
            }))
            .await
            .is_ok());
    }
}
