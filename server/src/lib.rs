//! Payfront - payments and notification gateway.
//!
//! A small HTTP backend that bridges a website frontend to two external
//! providers: payments (checkout sessions, payment intents, signed
//! webhooks) and email delivery (contact and quote form notifications).
//!
//! ## Architecture
//!
//! ```text
//! Frontend → Web Server → PaymentsClient / MailClient → providers
//! Provider → /api/webhook → EventDispatcher → registered handlers
//! ```
//!
//! Every route is request-scoped and stateless; the only shared state
//! is read-only configuration and the provider clients.

pub mod config;
pub mod error;
pub mod mail;
pub mod payments;
pub mod web;
pub mod webhook;

// Re-export commonly used types
pub use config::Config;
pub use error::ApiError;
pub use mail::{MailClient, OutboundMessage};
pub use payments::PaymentsClient;
pub use web::AppState;
pub use webhook::{DispatchOutcome, EventDispatcher, EventHandler, VerifiedEvent};
