//! Payment provider integration.
//!
//! A thin, stateless client over the provider's REST API: hosted
//! checkout sessions and payment intents. Webhook verification lives in
//! [`crate::webhook`]; nothing here holds cross-request state.

pub mod client;
pub mod types;

pub use client::PaymentsClient;
pub use types::{
    CheckoutMode, CheckoutSession, CheckoutSessionRequest, PaymentIntent, PaymentIntentRequest,
};
