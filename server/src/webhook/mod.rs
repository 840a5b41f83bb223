//! Signed webhook verification and event dispatch.
//!
//! The payment provider pushes events as signed envelopes: the raw
//! request bytes plus an HMAC signature header. [`signature`] proves an
//! envelope authentic and is the only producer of [`VerifiedEvent`];
//! [`dispatcher`] routes each verified event to at most one registered
//! handler. No state survives a dispatch call.

pub mod dispatcher;
pub mod handlers;
pub mod signature;

pub use dispatcher::{DispatchOutcome, EventDispatcher, EventHandler};
pub use handlers::{CheckoutCompletedHandler, PaymentFailedHandler, PaymentSucceededHandler};
pub use signature::{verify_event, SignatureError, VerifiedEvent};
