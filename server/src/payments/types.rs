//! Request and response types for the payment provider API.

use serde::Deserialize;

/// Checkout flow requested by the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    /// One-time payment
    Payment,
    /// Recurring subscription
    Subscription,
}

impl CheckoutMode {
    /// Interpret the frontend's `mode` field. Anything other than
    /// `"subscription"` falls back to a one-time payment.
    pub fn parse(mode: Option<&str>) -> Self {
        match mode {
            Some("subscription") => CheckoutMode::Subscription,
            _ => CheckoutMode::Payment,
        }
    }

    /// Wire value for the provider's `mode` parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        }
    }
}

/// Inputs for creating a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    /// Provider price identifier (`price_...`)
    pub price_id: String,
    pub mode: CheckoutMode,
    /// Product name carried through session metadata
    pub product_name: Option<String>,
    /// Product description carried through session metadata
    pub product_description: Option<String>,
}

/// Inputs for creating a payment intent.
#[derive(Debug, Clone)]
pub struct PaymentIntentRequest {
    /// Amount in the currency's smallest unit (cents)
    pub amount: i64,
    /// ISO currency code, lowercase
    pub currency: String,
    pub description: Option<String>,
}

/// Hosted checkout session returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page URL
    #[serde(default)]
    pub url: Option<String>,
}

/// Payment intent returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Secret the frontend uses to confirm the payment
    pub client_secret: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// The provider's error envelope: `{"error": {"message", "type"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderErrorEnvelope {
    pub error: ProviderError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderError {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}
