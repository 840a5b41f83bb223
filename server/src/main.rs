//! Payfront API server.
//!
//! Binds the HTTP routes, wires the provider clients into shared state,
//! registers the webhook event handlers, and runs until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use payfront::web::{
    contact, create_checkout_session, create_payment_intent, health, index, provider_webhook,
    quote, AppState,
};
use payfront::webhook::{
    CheckoutCompletedHandler, EventDispatcher, PaymentFailedHandler, PaymentSucceededHandler,
};
use payfront::{Config, MailClient, PaymentsClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("server_starting");

    // Load configuration
    let config = Config::from_env()?;
    let timeout = Duration::from_millis(config.request_timeout_ms);

    // Create provider clients
    let payments =
        PaymentsClient::new(config.stripe_secret_key.as_str(), &config.client_url, timeout)?;
    let mailer = MailClient::new(
        config.resend_api_key.as_str(),
        config.mail_from.as_str(),
        timeout,
    )?;

    info!(
        port = config.port,
        client_url = %config.client_url,
        live_mode = payments.is_live_mode(),
        "config_loaded"
    );

    // Register webhook event handlers
    let mut dispatcher = EventDispatcher::new(
        config.stripe_webhook_secret.as_str(),
        Duration::from_secs(config.webhook_tolerance_secs),
    );
    dispatcher.register(
        "checkout.session.completed",
        Arc::new(CheckoutCompletedHandler::new(
            mailer.clone(),
            config.contact_recipient.clone(),
        )),
    );
    dispatcher.register("payment_intent.succeeded", Arc::new(PaymentSucceededHandler));
    dispatcher.register(
        "payment_intent.payment_failed",
        Arc::new(PaymentFailedHandler),
    );

    info!(
        registered_types = ?dispatcher.registered_types().collect::<Vec<_>>(),
        "webhook_handlers_registered"
    );

    // Allow the frontend origin only
    let origin = config.client_url.origin().ascii_serialization();
    let cors = CorsLayer::new()
        .allow_origin(
            origin
                .parse::<HeaderValue>()
                .context("CLIENT_URL origin is not a valid header value")?,
        )
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let port = config.port;
    let state = AppState::new(config, payments, mailer, Arc::new(dispatcher));

    // Build the router
    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/create-checkout-session", post(create_checkout_session))
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/webhook", post(provider_webhook))
        .route("/api/contact", post(contact))
        .route("/api/quote", post(quote))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("server_shutting_down");
}
