//! Outbound license delivery.
//!
//! The active [`EmailSettings`] row is read at send time, so activating a
//! different configuration takes effect on the next message without a
//! restart. Supported providers:
//! 1. Resend API (`password` holds the API key)
//! 2. Mailgun messages API (`host` is the sending domain)
//! 3. SendGrid v3 mail API
//! 4. POST to a webhook URL (for DIY delivery)
//! 5. Log only (delivery disabled)

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::db::{Gateway, queries};
use crate::error::{AppError, Result};
use crate::models::{EmailProvider, EmailSettings};

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const MAILGUN_API_BASE: &str = "https://api.mailgun.net/v3";
const SENDGRID_API_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Delivery seam used by provisioning and the admin resend/test operations.
///
/// Implementations are called from blocking context.
pub trait Notifier: Send + Sync {
    fn send_license_key(&self, to: &str, license_key: &str, product_name: &str) -> Result<()>;

    fn send_test(&self, to: &str) -> Result<()>;
}

/// A rendered message, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub event: &'static str,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
    pub license_key: Option<String>,
    pub product_name: Option<String>,
}

impl Message {
    pub fn license_key(to: &str, license_key: &str, product_name: &str) -> Self {
        let subject = format!("Your license key for {}", product_name);
        let text = format!(
            "Thank you for purchasing {}.\n\nYour license key:\n\n{}\n\nKeep this email for your records.",
            product_name, license_key
        );
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
<h2 style="color: #333;">Your license key for {}</h2>
<p>Thank you for purchasing <strong>{}</strong>.</p>
<div style="background: #f5f5f5; padding: 20px; border-radius: 8px; text-align: center;">
<code style="font-size: 20px; font-weight: bold; letter-spacing: 2px; color: #333;">{}</code>
</div>
<p style="color: #999; font-size: 12px;">Keep this email for your records.</p>
</body>
</html>"#,
            product_name, product_name, license_key
        );
        Self {
            event: "license_key_issued",
            to: to.to_string(),
            subject,
            text,
            html,
            license_key: Some(license_key.to_string()),
            product_name: Some(product_name.to_string()),
        }
    }

    pub fn test(to: &str) -> Self {
        let text = "This is a test message. Your email settings are working.".to_string();
        Self {
            event: "test_email",
            to: to.to_string(),
            subject: "Test email".to_string(),
            html: format!("<p>{}</p>", text),
            text,
            license_key: None,
            product_name: None,
        }
    }
}

/// `"Name <addr>"` when a display name is configured.
fn from_header(settings: &EmailSettings, default_from_email: &str) -> String {
    let email = match settings.from_email.trim() {
        "" => default_from_email,
        e => e,
    };
    match settings.from_name.trim() {
        "" => email.to_string(),
        name => format!("{} <{}>", name, email),
    }
}

#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: String,
    to: Vec<&'a str>,
    subject: &'a str,
    text: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    #[allow(dead_code)]
    id: String,
}

#[derive(Debug, Serialize)]
struct SendGridAddress<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization<'a> {
    to: Vec<SendGridAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct SendGridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridRequest<'a> {
    personalizations: Vec<SendGridPersonalization<'a>>,
    from: SendGridAddress<'a>,
    subject: &'a str,
    content: Vec<SendGridContent<'a>>,
}

impl<'a> SendGridRequest<'a> {
    fn new(from_email: &'a str, from_name: &'a str, message: &'a Message) -> Self {
        let from_name = from_name.trim();
        Self {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress {
                    email: &message.to,
                    name: None,
                }],
            }],
            from: SendGridAddress {
                email: from_email,
                name: (!from_name.is_empty()).then_some(from_name),
            },
            subject: &message.subject,
            // SendGrid requires text/plain before text/html.
            content: vec![
                SendGridContent {
                    content_type: "text/plain",
                    value: &message.text,
                },
                SendGridContent {
                    content_type: "text/html",
                    value: &message.html,
                },
            ],
        }
    }
}

/// Form fields for the Mailgun messages endpoint.
fn mailgun_form<'a>(from: &'a str, message: &'a Message) -> [(&'static str, &'a str); 5] {
    [
        ("from", from),
        ("to", message.to.as_str()),
        ("subject", message.subject.as_str()),
        ("text", message.text.as_str()),
        ("html", message.html.as_str()),
    ]
}

/// Payload POSTed to a webhook provider.
#[derive(Debug, Serialize)]
pub struct WebhookPayload<'a> {
    pub event: &'static str,
    pub email: &'a str,
    pub from: String,
    pub subject: &'a str,
    pub license_key: Option<&'a str>,
    pub product_name: Option<&'a str>,
    pub sent_at: i64,
}

/// [`Notifier`] backed by the stored email settings.
#[derive(Clone)]
pub struct EmailService {
    db: Gateway,
    default_from_email: String,
    http_client: Client,
}

impl EmailService {
    pub fn new(db: Gateway, default_from_email: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            db,
            default_from_email,
            http_client,
        })
    }

    fn deliver(&self, message: &Message) -> Result<()> {
        let settings = self
            .db
            .read(queries::get_active_email_settings)?
            .ok_or_else(|| AppError::Notification("No active email settings".into()))?;

        match settings.provider {
            EmailProvider::Resend => self.send_via_resend(&settings, message),
            EmailProvider::Mailgun => self.send_via_mailgun(&settings, message),
            EmailProvider::SendGrid => self.send_via_sendgrid(&settings, message),
            EmailProvider::Webhook => self.call_webhook(&settings, message),
            EmailProvider::Log => {
                tracing::info!(
                    to = %message.to,
                    event = message.event,
                    subject = %message.subject,
                    "email delivery disabled, message logged only"
                );
                Ok(())
            }
            EmailProvider::Smtp => Err(AppError::Notification(format!(
                "Unsupported provider: {}",
                settings.provider.as_ref()
            ))),
        }
    }

    fn send_via_resend(&self, settings: &EmailSettings, message: &Message) -> Result<()> {
        if settings.password.is_empty() {
            return Err(AppError::Notification("Resend API key is not configured".into()));
        }

        let request = ResendEmailRequest {
            from: from_header(settings, &self.default_from_email),
            to: vec![&message.to],
            subject: &message.subject,
            text: &message.text,
            html: &message.html,
        };

        let response = self
            .http_client
            .post(RESEND_API_URL)
            .bearer_auth(&settings.password)
            .json(&request)
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to send request to Resend API");
                AppError::Notification(format!("Email service error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Resend API returned error");
            return Err(AppError::Notification(format!(
                "Email service error: {} - {}",
                status, body
            )));
        }

        let _result: ResendEmailResponse = response.json().map_err(|e| {
            tracing::error!(error = %e, "Failed to parse Resend API response");
            AppError::Notification("Email service response error".into())
        })?;

        tracing::info!(to = %message.to, event = message.event, "email sent via Resend");
        Ok(())
    }

    fn send_via_mailgun(&self, settings: &EmailSettings, message: &Message) -> Result<()> {
        let domain = settings.host.trim();
        if settings.password.is_empty() || domain.is_empty() {
            return Err(AppError::Notification(
                "Mailgun API key and sending domain are required".into(),
            ));
        }

        let from = from_header(settings, &self.default_from_email);
        let response = self
            .http_client
            .post(format!("{}/{}/messages", MAILGUN_API_BASE, domain))
            .basic_auth("api", Some(&settings.password))
            .form(&mailgun_form(&from, message))
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to send request to Mailgun API");
                AppError::Notification(format!("Email service error: {}", e))
            })?;
        ensure_success("Mailgun", response)?;

        tracing::info!(to = %message.to, event = message.event, "email sent via Mailgun");
        Ok(())
    }

    fn send_via_sendgrid(&self, settings: &EmailSettings, message: &Message) -> Result<()> {
        if settings.password.is_empty() {
            return Err(AppError::Notification("SendGrid API key is not configured".into()));
        }

        let from_email = match settings.from_email.trim() {
            "" => self.default_from_email.as_str(),
            e => e,
        };
        let request = SendGridRequest::new(from_email, &settings.from_name, message);

        let response = self
            .http_client
            .post(SENDGRID_API_URL)
            .bearer_auth(&settings.password)
            .json(&request)
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to send request to SendGrid API");
                AppError::Notification(format!("Email service error: {}", e))
            })?;
        ensure_success("SendGrid", response)?;

        tracing::info!(to = %message.to, event = message.event, "email sent via SendGrid");
        Ok(())
    }

    fn call_webhook(&self, settings: &EmailSettings, message: &Message) -> Result<()> {
        let webhook_url = settings.host.trim();
        let payload = WebhookPayload {
            event: message.event,
            email: &message.to,
            from: from_header(settings, &self.default_from_email),
            subject: &message.subject,
            license_key: message.license_key.as_deref(),
            product_name: message.product_name.as_deref(),
            sent_at: crate::util::now(),
        };

        let response = self
            .http_client
            .post(webhook_url)
            .header("X-Keyward-Event", message.event)
            .json(&payload)
            .send()
            .map_err(|e| {
                tracing::error!(error = %e, webhook_url = %webhook_url, "Failed to call email webhook");
                AppError::Notification(format!("Webhook call failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, webhook_url = %webhook_url, "Email webhook returned error");
            return Err(AppError::Notification(format!(
                "Webhook returned {}",
                status
            )));
        }

        tracing::info!(webhook_url = %webhook_url, event = message.event, "email webhook called");
        Ok(())
    }
}

fn ensure_success(provider: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::error!(provider, status = %status, body = %body, "email API returned error");
    Err(AppError::Notification(format!(
        "Email service error: {} - {}",
        status, body
    )))
}

impl Notifier for EmailService {
    fn send_license_key(&self, to: &str, license_key: &str, product_name: &str) -> Result<()> {
        self.deliver(&Message::license_key(to, license_key, product_name))
    }

    fn send_test(&self, to: &str) -> Result<()> {
        self.deliver(&Message::test(to))
    }
}
