use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EmailProvider {
    /// Resend HTTP API (`password` holds the API key)
    Resend,
    /// POST a JSON delivery payload to `host` (a URL)
    Webhook,
    /// Mailgun messages API (`host` holds the sending domain, `password` the API key)
    Mailgun,
    /// SendGrid v3 mail API (`password` holds the API key)
    SendGrid,
    /// Log the delivery only
    Log,
    /// Accepted for stored configuration; not deliverable by this server
    Smtp,
}

/// Outbound notification configuration. At most one row is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub id: String,
    pub provider: EmailProvider,
    pub host: String,
    pub port: u16,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub encryption: String,
    pub from_email: String,
    pub from_name: String,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating (`id == None`) or updating an email settings row.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveEmailSettings {
    #[serde(default)]
    pub id: Option<String>,
    pub provider: EmailProvider,
    #[serde(default)]
    pub host: String,
    /// Raw form value; validated into a `u16`
    #[serde(default = "default_port")]
    pub port: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_encryption")]
    pub encryption: String,
    pub from_email: String,
    #[serde(default)]
    pub from_name: String,
    #[serde(default)]
    pub is_active: bool,
}

fn default_port() -> i64 {
    587
}

fn default_encryption() -> String {
    "tls".to_string()
}

impl SaveEmailSettings {
    /// Port in 1..=65535, whatever the provider.
    pub fn validated_port(&self) -> Result<u16> {
        match u16::try_from(self.port) {
            Ok(port) if port > 0 => Ok(port),
            _ => Err(AppError::Validation(format!("Invalid port: {}", self.port))),
        }
    }

    pub fn validate(&self) -> Result<u16> {
        if self.from_email.trim().is_empty() {
            return Err(AppError::Validation("From email is required".into()));
        }
        if self.provider == EmailProvider::Webhook && self.host.trim().is_empty() {
            return Err(AppError::Validation("Webhook URL is required".into()));
        }
        self.validated_port()
    }
}
