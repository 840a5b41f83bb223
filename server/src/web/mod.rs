//! Web server module.
//!
//! Thin route handlers over the provider clients plus the shared
//! application state. Router assembly and lifecycle live in the binary.

pub mod handlers;

pub use handlers::{
    contact, create_checkout_session, create_payment_intent, health, index, provider_webhook,
    quote, AppState, CheckoutSessionForm, HealthResponse, PaymentIntentForm,
};
