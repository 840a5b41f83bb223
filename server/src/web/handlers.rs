//! HTTP route handlers.
//!
//! Every route is a stateless shim: validate a couple of required
//! fields, shape a provider payload, call the provider, return its
//! result. The webhook route is the one exception — it hands the raw
//! body bytes and signature header to the event dispatcher untouched.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::mail::{templates, Attachment, ContactForm, MailClient, OutboundMessage, QuoteForm};
use crate::payments::{
    CheckoutMode, CheckoutSessionRequest, PaymentIntentRequest, PaymentsClient,
};
use crate::webhook::EventDispatcher;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub payments: PaymentsClient,
    pub mailer: MailClient,
    pub dispatcher: Arc<EventDispatcher>,
}

impl AppState {
    pub fn new(
        config: Config,
        payments: PaymentsClient,
        mailer: MailClient,
        dispatcher: Arc<EventDispatcher>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            payments,
            mailer,
            dispatcher,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Service banner for the root path.
pub async fn index() -> &'static str {
    "Payfront API server is running"
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Checkout Session
// =============================================================================

/// Checkout session request from the frontend.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionForm {
    #[serde(default)]
    pub price_id: String,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
}

/// Create a hosted checkout session and return its id.
pub async fn create_checkout_session(
    State(state): State<AppState>,
    Json(form): Json<CheckoutSessionForm>,
) -> Result<impl IntoResponse, ApiError> {
    if form.price_id.trim().is_empty() {
        return Err(ApiError::validation("Price ID is required"));
    }

    let mode = CheckoutMode::parse(form.mode.as_deref());

    info!(
        price_id = %form.price_id,
        mode = mode.as_str(),
        "checkout_session_requested"
    );

    let session = state
        .payments
        .create_checkout_session(&CheckoutSessionRequest {
            price_id: form.price_id,
            mode,
            product_name: form.product_name,
            product_description: form.product_description,
        })
        .await?;

    Ok(Json(json!({ "id": session.id })))
}

// =============================================================================
// Payment Intent
// =============================================================================

/// Payment intent request from the frontend.
#[derive(Debug, Deserialize)]
pub struct PaymentIntentForm {
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Create a payment intent and return its client secret.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    Json(form): Json<PaymentIntentForm>,
) -> Result<impl IntoResponse, ApiError> {
    let amount = match form.amount {
        Some(amount) if amount > 0 => amount,
        _ => return Err(ApiError::validation("Valid amount is required")),
    };

    let currency = form
        .currency
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "usd".to_string());

    info!(amount = amount, currency = %currency, "payment_intent_requested");

    let intent = state
        .payments
        .create_payment_intent(&PaymentIntentRequest {
            amount,
            currency,
            description: form.description,
        })
        .await?;

    Ok(Json(json!({ "clientSecret": intent.client_secret })))
}

// =============================================================================
// Webhook
// =============================================================================

/// Receive a signed provider event.
///
/// The body must stay untouched: verification runs over the exact bytes
/// received, so this handler never parses before dispatching.
pub async fn provider_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::validation("Missing Stripe-Signature header"))?;

    let outcome = state.dispatcher.dispatch(&body, signature).await?;

    info!(outcome = ?outcome, "webhook_acknowledged");

    Ok(Json(json!({ "received": true })))
}

// =============================================================================
// Contact Form
// =============================================================================

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn validate_contact_form(form: &ContactForm) -> Result<(), ApiError> {
    if blank(&form.name) || blank(&form.email) || blank(&form.message) {
        return Err(ApiError::validation("Name, email, and message are required"));
    }
    Ok(())
}

/// Forward a contact form submission to the site inbox.
pub async fn contact(
    State(state): State<AppState>,
    Json(form): Json<ContactForm>,
) -> Result<impl IntoResponse, ApiError> {
    validate_contact_form(&form)?;

    info!(from = %form.email, "contact_form_received");

    let (subject, html) = templates::render_contact_notification(&form);
    let message = OutboundMessage::new(state.config.contact_recipient.clone(), subject, html)
        .reply_to(form.email.clone());

    state.mailer.send(&message).await?;

    info!(from = %form.email, "contact_notification_sent");

    Ok(Json(json!({ "sent": true })))
}

// =============================================================================
// Quote Form
// =============================================================================

const MAX_ATTACHMENTS: usize = 5;
const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;

fn validate_quote_form(form: &QuoteForm) -> Result<(), ApiError> {
    if blank(&form.name) || blank(&form.email) || blank(&form.details) {
        return Err(ApiError::validation(
            "Name, email, and project details are required",
        ));
    }
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Forward a quote request (multipart, with optional attachments) to
/// the site inbox and acknowledge the requester.
pub async fn quote(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = QuoteForm::default();
    let mut attachments: Vec<Attachment> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart payload: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == "attachments" {
            if attachments.len() >= MAX_ATTACHMENTS {
                return Err(ApiError::validation(format!(
                    "Too many attachments (max {MAX_ATTACHMENTS})"
                )));
            }

            let filename = field.file_name().unwrap_or("attachment").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Invalid attachment: {e}")))?;

            if data.len() > MAX_ATTACHMENT_BYTES {
                return Err(ApiError::validation("Attachment too large (max 5 MB)"));
            }

            if !data.is_empty() {
                attachments.push(Attachment {
                    filename,
                    content: data.to_vec(),
                });
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::validation(format!("Invalid field {name}: {e}")))?;

        match name.as_str() {
            "name" => form.name = value,
            "email" => form.email = value,
            "company" => form.company = non_empty(value),
            "projectType" => form.project_type = non_empty(value),
            "budget" => form.budget = non_empty(value),
            "details" => form.details = value,
            _ => {}
        }
    }

    validate_quote_form(&form)?;

    info!(
        from = %form.email,
        attachment_count = attachments.len(),
        "quote_form_received"
    );

    let attachment_names: Vec<String> = attachments.iter().map(|a| a.filename.clone()).collect();

    let (subject, html) = templates::render_quote_notification(&form, &attachment_names);
    let notification = OutboundMessage::new(state.config.contact_recipient.clone(), subject, html)
        .reply_to(form.email.clone())
        .attachments(attachments);

    let (confirm_subject, confirm_html) = templates::render_quote_confirmation(&form);
    let confirmation = OutboundMessage::new(form.email.clone(), confirm_subject, confirm_html);

    let (notify_result, confirm_result) = futures::future::join(
        state.mailer.send(&notification),
        state.mailer.send(&confirmation),
    )
    .await;

    // The acknowledgment is best-effort; the inbox notification is not.
    if let Err(e) = confirm_result {
        warn!(to = %form.email, error = %e, "quote_confirmation_failed");
    }
    notify_result?;

    info!(from = %form.email, "quote_notification_sent");

    Ok(Json(json!({ "sent": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            phone: None,
            company: None,
        }
    }

    #[test]
    fn test_validate_contact_form() {
        assert!(validate_contact_form(&contact("Alice", "a@example.com", "Hi")).is_ok());
        assert!(validate_contact_form(&contact("", "a@example.com", "Hi")).is_err());
        assert!(validate_contact_form(&contact("Alice", "   ", "Hi")).is_err());
        assert!(validate_contact_form(&contact("Alice", "a@example.com", "")).is_err());
    }

    #[test]
    fn test_validate_quote_form() {
        let mut form = QuoteForm {
            name: "Bob".to_string(),
            email: "b@example.com".to_string(),
            details: "Redesign".to_string(),
            ..Default::default()
        };
        assert!(validate_quote_form(&form).is_ok());

        form.details = " ".to_string();
        assert!(validate_quote_form(&form).is_err());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("Acme".to_string()), Some("Acme".to_string()));
        assert_eq!(non_empty("  ".to_string()), None);
        assert_eq!(non_empty(String::new()), None);
    }

    #[test]
    fn test_checkout_form_deserializes_camel_case() {
        let form: CheckoutSessionForm = serde_json::from_str(
            r#"{"priceId":"price_123","productName":"Starter","mode":"subscription"}"#,
        )
        .unwrap();

        assert_eq!(form.price_id, "price_123");
        assert_eq!(form.product_name.as_deref(), Some("Starter"));
        assert_eq!(form.mode.as_deref(), Some("subscription"));
    }

    #[test]
    fn test_payment_intent_form_defaults() {
        let form: PaymentIntentForm = serde_json::from_str(r#"{"amount":4900}"#).unwrap();
        assert_eq!(form.amount, Some(4900));
        assert!(form.currency.is_none());
        assert!(form.description.is_none());
    }
}
