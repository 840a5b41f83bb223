//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup. Provider secrets are
//! required and fail startup with a contextual error; everything else
//! falls back to a sensible default.

use std::env;

use anyhow::{Context, Result};
use url::Url;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Frontend origin; base for checkout redirect URLs and CORS
    pub client_url: Url,

    /// Payment provider API key (sk_test_... / sk_live_...)
    pub stripe_secret_key: String,

    /// Shared signing secret for webhook verification
    pub stripe_webhook_secret: String,

    /// Email provider API key
    pub resend_api_key: String,

    /// Sender address for outbound notifications
    pub mail_from: String,

    /// Inbox receiving contact and quote notifications
    pub contact_recipient: String,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Maximum age in seconds for signed webhook timestamps
    pub webhook_tolerance_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let client_url = env::var("CLIENT_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());
        let client_url = Url::parse(&client_url)
            .with_context(|| format!("CLIENT_URL is not a valid URL: {client_url}"))?;

        Ok(Config {
            port: parse_u64("PORT", 4000) as u16,

            client_url,

            stripe_secret_key: require("STRIPE_SECRET_KEY")?,

            stripe_webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,

            resend_api_key: require("RESEND_API_KEY")?,

            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Payfront <noreply@payfront.dev>".to_string()),

            contact_recipient: require("CONTACT_RECIPIENT")?,

            request_timeout_ms: parse_u64("REQUEST_TIMEOUT_MS", 8000),

            webhook_tolerance_secs: parse_u64("WEBHOOK_TOLERANCE_SECS", 300),
        })
    }
}

/// Read a required environment variable.
fn require(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("Missing required environment variable {name}"))?;
    if value.trim().is_empty() {
        anyhow::bail!("Environment variable {name} is set but empty");
    }
    Ok(value)
}

/// Parse an integer environment variable, falling back to a default.
fn parse_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u64_valid() {
        env::set_var("TEST_PARSE_U64", "9100");
        assert_eq!(parse_u64("TEST_PARSE_U64", 4000), 9100);
        env::remove_var("TEST_PARSE_U64");
    }

    #[test]
    fn test_parse_u64_default() {
        assert_eq!(parse_u64("NONEXISTENT_VAR", 4000), 4000);
    }

    #[test]
    fn test_parse_u64_garbage_falls_back() {
        env::set_var("TEST_PARSE_U64_GARBAGE", "not-a-number");
        assert_eq!(parse_u64("TEST_PARSE_U64_GARBAGE", 300), 300);
        env::remove_var("TEST_PARSE_U64_GARBAGE");
    }

    #[test]
    fn test_require_missing() {
        assert!(require("NONEXISTENT_SECRET").is_err());
    }

    #[test]
    fn test_require_empty() {
        env::set_var("TEST_EMPTY_SECRET", "   ");
        assert!(require("TEST_EMPTY_SECRET").is_err());
        env::remove_var("TEST_EMPTY_SECRET");
    }
}
