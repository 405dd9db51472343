use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    /// Unique; the sole identity key for find-or-create
    pub email: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCustomer {
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub company: String,
}

impl CreateCustomer {
    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomer {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

pub fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation(format!("Invalid email: {}", email)));
    }
    Ok(())
}

/// "First Last" when either part is present, else the local part of the email.
pub fn display_name(first_name: &str, last_name: &str, email: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    let full = full.trim();
    if !full.is_empty() {
        return full.to_string();
    }
    email_local_part(email).to_string()
}

pub fn email_local_part(email: &str) -> &str {
    match email.find('@') {
        Some(at) if at > 0 => &email[..at],
        _ => email,
    }
}
