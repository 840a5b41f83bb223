//! Email delivery integration.
//!
//! A stateless client over the delivery provider's REST API plus the
//! HTML templates for form notifications. Nothing here queues or
//! retries; a failed send surfaces to the caller that requested it.

pub mod client;
pub mod templates;

pub use client::{Attachment, MailClient, OutboundMessage, SentMessage};
pub use templates::{ContactForm, QuoteForm};
