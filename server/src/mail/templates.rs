//! Notification email rendering.
//!
//! Every user-supplied value is HTML-escaped before interpolation.
//! Subjects are plain text and left unescaped.

use serde::Deserialize;

/// Contact form submission from the website.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

/// Quote request assembled from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct QuoteForm {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub project_type: Option<String>,
    pub budget: Option<String>,
    pub details: String,
}

/// Escape text for interpolation into an HTML body.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a labeled row, skipping absent values.
fn optional_row(label: &str, value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => {
            format!("<p><strong>{}:</strong> {}</p>", label, escape_html(v))
        }
        _ => String::new(),
    }
}

/// Notification to the site inbox for a contact form submission.
pub fn render_contact_notification(form: &ContactForm) -> (String, String) {
    let subject = format!("New contact form submission from {}", form.name);

    let html = format!(
        "<h2>New contact form submission</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         {}{}\
         <h3>Message</h3>\
         <p>{}</p>",
        escape_html(&form.name),
        escape_html(&form.email),
        optional_row("Phone", form.phone.as_deref()),
        optional_row("Company", form.company.as_deref()),
        escape_html(&form.message).replace('\n', "<br>"),
    );

    (subject, html)
}

/// Notification to the site inbox for a quote request.
pub fn render_quote_notification(form: &QuoteForm, attachment_names: &[String]) -> (String, String) {
    let subject = format!("New quote request from {}", form.name);

    let attachments_html = if attachment_names.is_empty() {
        String::new()
    } else {
        let items: String = attachment_names
            .iter()
            .map(|name| format!("<li>{}</li>", escape_html(name)))
            .collect();
        format!("<h3>Attachments</h3><ul>{}</ul>", items)
    };

    let html = format!(
        "<h2>New quote request</h2>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         {}{}{}\
         <h3>Project details</h3>\
         <p>{}</p>\
         {}",
        escape_html(&form.name),
        escape_html(&form.email),
        optional_row("Company", form.company.as_deref()),
        optional_row("Project type", form.project_type.as_deref()),
        optional_row("Budget", form.budget.as_deref()),
        escape_html(&form.details).replace('\n', "<br>"),
        attachments_html,
    );

    (subject, html)
}

/// Acknowledgment sent back to the quote requester.
pub fn render_quote_confirmation(form: &QuoteForm) -> (String, String) {
    let subject = "We received your quote request".to_string();

    let html = format!(
        "<h2>Thanks, {}!</h2>\
         <p>We received your quote request and will get back to you within \
         two business days.</p>\
         <p>For reference, here is what you sent us:</p>\
         <p>{}</p>",
        escape_html(&form.name),
        escape_html(&form.details).replace('\n', "<br>"),
    );

    (subject, html)
}

/// Internal notification for a completed checkout session.
pub fn render_payment_notification(
    session_id: &str,
    amount_total: Option<i64>,
    currency: Option<&str>,
    customer_email: Option<&str>,
) -> (String, String) {
    let subject = format!("Payment received for session {}", session_id);

    let amount_row = match (amount_total, currency) {
        (Some(cents), Some(code)) => format!(
            "<p><strong>Amount:</strong> {}.{:02} {}</p>",
            cents / 100,
            cents.rem_euclid(100),
            escape_html(&code.to_uppercase()),
        ),
        _ => String::new(),
    };

    let html = format!(
        "<h2>Payment received</h2>\
         <p><strong>Session:</strong> {}</p>\
         {}{}",
        escape_html(session_id),
        amount_row,
        optional_row("Customer", customer_email),
    );

    (subject, html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("it's"), "it&#39;s");
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn test_contact_notification_escapes_user_input() {
        let form = ContactForm {
            name: "<b>Mallory</b>".to_string(),
            email: "mallory@example.com".to_string(),
            message: "Hello & goodbye".to_string(),
            phone: None,
            company: None,
        };

        let (subject, html) = render_contact_notification(&form);
        assert!(subject.contains("<b>Mallory</b>"));
        assert!(html.contains("&lt;b&gt;Mallory&lt;/b&gt;"));
        assert!(html.contains("Hello &amp; goodbye"));
        assert!(!html.contains("<b>Mallory</b>"));
    }

    #[test]
    fn test_contact_notification_skips_empty_optionals() {
        let form = ContactForm {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            message: "Hi".to_string(),
            phone: Some("  ".to_string()),
            company: None,
        };

        let (_, html) = render_contact_notification(&form);
        assert!(!html.contains("Phone"));
        assert!(!html.contains("Company"));
    }

    #[test]
    fn test_contact_notification_preserves_line_breaks() {
        let form = ContactForm {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            message: "line one\nline two".to_string(),
            phone: None,
            company: None,
        };

        let (_, html) = render_contact_notification(&form);
        assert!(html.contains("line one<br>line two"));
    }

    #[test]
    fn test_quote_notification_lists_attachments() {
        let form = QuoteForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            company: Some("Acme".to_string()),
            project_type: Some("Redesign".to_string()),
            budget: Some("$10k".to_string()),
            details: "Full site overhaul".to_string(),
        };

        let (subject, html) =
            render_quote_notification(&form, &["brief.pdf".to_string(), "logo.png".to_string()]);

        assert_eq!(subject, "New quote request from Bob");
        assert!(html.contains("<li>brief.pdf</li>"));
        assert!(html.contains("<li>logo.png</li>"));
        assert!(html.contains("Acme"));
        assert!(html.contains("Redesign"));
    }

    #[test]
    fn test_quote_notification_without_attachments() {
        let form = QuoteForm {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            details: "Small fix".to_string(),
            ..Default::default()
        };

        let (_, html) = render_quote_notification(&form, &[]);
        assert!(!html.contains("Attachments"));
    }

    #[test]
    fn test_payment_notification_formats_amount() {
        let (subject, html) =
            render_payment_notification("sess_123", Some(4905), Some("usd"), Some("c@example.com"));

        assert!(subject.contains("sess_123"));
        assert!(html.contains("49.05 USD"));
        assert!(html.contains("c@example.com"));
    }

    #[test]
    fn test_payment_notification_without_amount() {
        let (_, html) = render_payment_notification("sess_123", None, None, None);
        assert!(!html.contains("Amount"));
        assert!(!html.contains("Customer"));
    }
}
