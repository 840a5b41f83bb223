//! Thin REST client for the payment provider.
//!
//! The provider speaks form-encoded requests with bearer auth. This
//! client shapes the two payloads the frontend needs (hosted checkout
//! sessions and payment intents) and maps the provider's error envelope
//! onto [`ApiError::Upstream`]. No retries: the frontend owns the user
//! feedback loop and the provider call is already idempotent per
//! request.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ApiError;

use super::types::{
    CheckoutSession, CheckoutSessionRequest, PaymentIntent, PaymentIntentRequest,
    ProviderErrorEnvelope,
};

const PROVIDER: &str = "stripe";
const API_BASE: &str = "https://api.stripe.com";

/// Placeholder the provider substitutes with the real session id on redirect.
const SESSION_ID_TEMPLATE: &str = "{CHECKOUT_SESSION_ID}";

#[derive(Clone)]
pub struct PaymentsClient {
    http: Client,
    secret_key: String,
    base_url: String,
    success_url: String,
    cancel_url: String,
}

impl PaymentsClient {
    /// Create a client from the API key and the frontend origin the
    /// checkout flow redirects back to.
    pub fn new(
        secret_key: impl Into<String>,
        client_url: &Url,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let secret_key = secret_key.into();

        if !secret_key.starts_with("sk_") && !secret_key.starts_with("rk_") {
            warn!("payments_key_unexpected_prefix");
        }

        let success_url = format!(
            "{}?session_id={}",
            client_url.join("payment-success")?,
            SESSION_ID_TEMPLATE
        );
        let cancel_url = client_url.join("pricing")?.to_string();

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            secret_key,
            base_url: API_BASE.to_string(),
            success_url,
            cancel_url,
        })
    }

    /// Whether the configured key targets the provider's live mode.
    pub fn is_live_mode(&self) -> bool {
        self.secret_key.starts_with("sk_live_")
    }

    /// Create a hosted checkout session.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, ApiError> {
        let params = checkout_session_params(request, &self.success_url, &self.cancel_url);
        let session: CheckoutSession = self.post_form("/v1/checkout/sessions", &params).await?;

        info!(
            session_id = %session.id,
            mode = request.mode.as_str(),
            "checkout_session_created"
        );

        Ok(session)
    }

    /// Create a payment intent with automatic payment methods.
    pub async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, ApiError> {
        let params = payment_intent_params(request);
        let intent: PaymentIntent = self.post_form("/v1/payment_intents", &params).await?;

        info!(
            payment_intent_id = %intent.id,
            amount = request.amount,
            currency = %request.currency,
            "payment_intent_created"
        );

        Ok(intent)
    }

    /// POST a form-encoded body and decode the JSON response or the
    /// provider's error envelope.
    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.secret_key)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                warn!(path = path, error = %e, "payments_request_failed");
                ApiError::upstream(PROVIDER, e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = decode_provider_error(response).await;
            warn!(
                path = path,
                status_code = status.as_u16(),
                message = %message,
                "payments_error_response"
            );
            return Err(ApiError::upstream(PROVIDER, message));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::upstream(PROVIDER, format!("invalid response body: {e}")))
    }
}

/// Pull the human-readable message out of the provider's error
/// envelope, falling back to the HTTP status.
async fn decode_provider_error(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    match serde_json::from_str::<ProviderErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.message.is_empty() => {
            if !envelope.error.kind.is_empty() {
                debug!(kind = %envelope.error.kind, "payments_provider_error_kind");
            }
            envelope.error.message
        }
        _ => format!("HTTP {status}"),
    }
}

/// Form parameters for a checkout session.
fn checkout_session_params(
    request: &CheckoutSessionRequest,
    success_url: &str,
    cancel_url: &str,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("payment_method_types[0]".to_string(), "card".to_string()),
        ("line_items[0][price]".to_string(), request.price_id.clone()),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("mode".to_string(), request.mode.as_str().to_string()),
        ("success_url".to_string(), success_url.to_string()),
        ("cancel_url".to_string(), cancel_url.to_string()),
    ];

    if let Some(name) = &request.product_name {
        params.push(("metadata[product_name]".to_string(), name.clone()));
    }
    if let Some(description) = &request.product_description {
        params.push(("metadata[product_description]".to_string(), description.clone()));
    }

    params
}

/// Form parameters for a payment intent.
fn payment_intent_params(request: &PaymentIntentRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.clone()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];

    if let Some(description) = &request.description {
        params.push(("description".to_string(), description.clone()));
    }

    params
}
