//! Verified event dispatch.
//!
//! The dispatcher owns the webhook signing secret and a registry of
//! per-type handlers populated at startup. Each call to
//! [`EventDispatcher::dispatch`] verifies the envelope and invokes at
//! most one handler. Handler failures are logged and swallowed: the
//! upstream contract expects an acknowledgment for any authentic
//! envelope, whatever the handler did with it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info};

use super::signature::{verify_event, SignatureError};

/// A registered callback for one event type.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle the `data.object` payload of a verified event.
    async fn handle(&self, data: &Value) -> anyhow::Result<()>;
}

/// What dispatch did with a verified envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A handler was invoked for the event type (whether or not it succeeded).
    Handled,
    /// No handler is registered for the event type.
    Ignored,
}

/// Routes verified events to handlers keyed by event type.
pub struct EventDispatcher {
    secret: String,
    tolerance: Duration,
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Create a dispatcher with no registered handlers.
    pub fn new(secret: impl Into<String>, tolerance: Duration) -> Self {
        Self {
            secret: secret.into(),
            tolerance,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an event type. Replaces any previous
    /// handler for the same type.
    pub fn register(&mut self, event_type: impl Into<String>, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(event_type.into(), handler);
    }

    /// Event types with a registered handler.
    pub fn registered_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Verify a signed envelope and route it to its handler.
    ///
    /// `raw_body` must be the unmodified bytes received on the wire;
    /// verification is a function of the exact bytes. On verification
    /// failure no handler runs and the caller must answer with a client
    /// error. On success the envelope is acknowledged regardless of the
    /// handler outcome.
    pub async fn dispatch(
        &self,
        raw_body: &[u8],
        signature: &str,
    ) -> Result<DispatchOutcome, SignatureError> {
        let event = verify_event(raw_body, signature, &self.secret, self.tolerance)?;

        info!(
            event_id = %event.id(),
            event_type = %event.event_type(),
            "webhook_event_verified"
        );

        match self.handlers.get(event.event_type()) {
            Some(handler) => {
                if let Err(e) = handler.handle(event.object()).await {
                    // Handler failures never fail dispatch
                    error!(
                        event_id = %event.id(),
                        event_type = %event.event_type(),
                        error = %e,
                        "webhook_handler_failed"
                    );
                }
                Ok(DispatchOutcome::Handled)
            }
            None => {
                info!(event_type = %event.event_type(), "webhook_event_unhandled");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }
}
